//! Subscription status lookup

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::error::ApiError;
use crate::api::{AuthContext, BackendClient};
use crate::config::{BillingConfig, BillingMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub status: String,
    pub customer_id: Option<String>,
}

impl Subscription {
    /// Only an `active` subscription counts as paid
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

#[async_trait]
pub trait SubscriptionProvider: Send + Sync {
    async fn subscription(&self, auth: &AuthContext) -> Result<Subscription, ApiError>;
}

/// Reports a fixed status without any network call
pub struct StaticBilling {
    subscription: Subscription,
}

impl StaticBilling {
    pub fn new(status: impl Into<String>, customer_id: Option<String>) -> Self {
        Self {
            subscription: Subscription {
                status: status.into(),
                customer_id,
            },
        }
    }
}

#[async_trait]
impl SubscriptionProvider for StaticBilling {
    async fn subscription(&self, _auth: &AuthContext) -> Result<Subscription, ApiError> {
        Ok(self.subscription.clone())
    }
}

/// Asks the backend's subscription endpoint
pub struct BackendBilling {
    client: Arc<BackendClient>,
}

impl BackendBilling {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SubscriptionProvider for BackendBilling {
    async fn subscription(&self, auth: &AuthContext) -> Result<Subscription, ApiError> {
        let status = self.client.subscription_status(auth).await?;
        Ok(Subscription {
            status: status.status,
            customer_id: status.customer_id,
        })
    }
}

/// Pick the billing source named in configuration
pub fn from_config(
    config: &BillingConfig,
    client: Arc<BackendClient>,
) -> Arc<dyn SubscriptionProvider> {
    match config.mode {
        BillingMode::Static => Arc::new(StaticBilling::new(
            config.default_status.clone(),
            config.default_customer_id.clone(),
        )),
        BillingMode::Backend => Arc::new(BackendBilling::new(client)),
    }
}
