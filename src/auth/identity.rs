//! Identity provider client (Supabase-compatible auth REST API)

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::error::ApiError;
use crate::config::IdentityConfig;

const SERVICE_NAME: &str = "identity";

/// What the identity provider knows about the current caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentitySession {
    pub access_token: Option<String>,
    pub user_id: Option<String>,
    pub email: Option<String>,
}

impl IdentitySession {
    /// Token, user id and email all present and non-empty
    pub fn is_complete(&self) -> bool {
        [&self.access_token, &self.user_id, &self.email]
            .iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.is_empty()))
    }
}

/// Issues and validates sessions
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the session behind `token`. `Ok(None)` means no valid session.
    async fn current_session(&self, token: Option<&str>)
        -> Result<Option<IdentitySession>, ApiError>;

    /// Exchange email and password for a session
    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentitySession, ApiError>;

    /// Revoke `token`
    async fn sign_out(&self, token: &str) -> Result<(), ApiError>;
}

/// Supabase auth endpoints under `{url}/auth/v1`
pub struct SupabaseIdentity {
    base_url: String,
    anon_key: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    user: Option<UserResponse>,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

impl SupabaseIdentity {
    pub fn new(base_url: impl Into<String>, anon_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key,
            client: Client::new(),
        }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        let anon_key = config.anon_key();
        if anon_key.is_none() {
            warn!(
                env = %config.anon_key_env,
                "identity anon key not set; requests may be rejected"
            );
        }
        Self::new(config.url.clone(), anon_key)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    fn with_key(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.anon_key {
            Some(key) => builder.header("apikey", key),
            None => builder,
        }
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(SERVICE_NAME, status.as_u16(), &body))
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn current_session(
        &self,
        token: Option<&str>,
    ) -> Result<Option<IdentitySession>, ApiError> {
        let Some(token) = token else {
            return Ok(None);
        };

        let response = self
            .with_key(self.client.get(self.endpoint("/user")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ApiError::network(SERVICE_NAME, e.to_string()))?;

        // An expired or revoked token is "no session", not a failure
        if matches!(response.status().as_u16(), 401 | 403) {
            debug!("identity provider rejected cached token");
            return Ok(None);
        }

        let user: UserResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::parse(SERVICE_NAME, e.to_string()))?;

        Ok(Some(IdentitySession {
            access_token: Some(token.to_string()),
            user_id: user.id,
            email: user.email,
        }))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentitySession, ApiError> {
        let response = self
            .with_key(self.client.post(self.endpoint("/token")))
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .map_err(|e| ApiError::network(SERVICE_NAME, e.to_string()))?;

        let grant: TokenResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::parse(SERVICE_NAME, e.to_string()))?;

        let user = grant.user.unwrap_or(UserResponse {
            id: None,
            email: None,
        });
        Ok(IdentitySession {
            access_token: grant.access_token,
            user_id: user.id,
            email: user.email,
        })
    }

    async fn sign_out(&self, token: &str) -> Result<(), ApiError> {
        let response = self
            .with_key(self.client.post(self.endpoint("/logout")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ApiError::network(SERVICE_NAME, e.to_string()))?;
        Self::check(response).await.map(|_| ())
    }
}
