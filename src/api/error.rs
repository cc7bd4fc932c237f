//! API error types shared by the backend, identity and billing clients

use thiserror::Error;

/// Errors that can occur when talking to an external service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 401 - token missing, invalid or expired
    #[error("{service}: Unauthorized (401) - {message}")]
    Unauthorized { service: String, message: String },

    /// 403 - signed in but not allowed
    #[error("{service}: Forbidden (403) - {message}")]
    Forbidden { service: String, message: String },

    /// 404
    #[error("{service}: Not found (404) - {message}")]
    NotFound { service: String, message: String },

    /// 422 - request rejected by validation, usually a missing `user_id`
    #[error("{service}: Unprocessable (422) - {message}")]
    Unprocessable { service: String, message: String },

    /// Other non-success statuses, or an error payload inside a 2xx body
    #[error("{service}: HTTP {status} - {message}")]
    HttpError {
        service: String,
        status: u16,
        message: String,
    },

    /// Connection, TLS or timeout failure
    #[error("{service}: Network error - {message}")]
    NetworkError { service: String, message: String },

    /// Response body did not match the expected shape
    #[error("{service}: Parse error - {message}")]
    ParseError { service: String, message: String },

    /// The operation needs a signed-in user and there is none
    #[error("Not signed in")]
    NotSignedIn,
}

impl ApiError {
    /// Map a non-success status and its body to the matching variant
    pub fn from_status(service: impl Into<String>, status: u16, body: &str) -> Self {
        let service = service.into();
        let message = extract_message(body);
        match status {
            401 => ApiError::Unauthorized { service, message },
            403 => ApiError::Forbidden { service, message },
            404 => ApiError::NotFound { service, message },
            422 => ApiError::Unprocessable { service, message },
            _ => ApiError::HttpError {
                service,
                status,
                message,
            },
        }
    }

    pub fn network(service: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::NetworkError {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn parse(service: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ParseError {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn http(service: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        ApiError::HttpError {
            service: service.into(),
            status,
            message: message.into(),
        }
    }

    /// Check if this is an authentication error (401 or 403)
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized { .. } | ApiError::Forbidden { .. } | ApiError::NotSignedIn
        )
    }

    /// 422 from the backend, which it returns when the caller is not identified
    pub fn is_unprocessable(&self) -> bool {
        matches!(self, ApiError::Unprocessable { .. })
    }

    /// HTTP status carried by this error, if it came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Unprocessable { .. } => Some(422),
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the service name for this error
    pub fn service_name(&self) -> &str {
        match self {
            ApiError::Unauthorized { service, .. }
            | ApiError::Forbidden { service, .. }
            | ApiError::NotFound { service, .. }
            | ApiError::Unprocessable { service, .. }
            | ApiError::HttpError { service, .. }
            | ApiError::NetworkError { service, .. }
            | ApiError::ParseError { service, .. } => service,
            ApiError::NotSignedIn => "session",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::parse("http", err.to_string())
        } else {
            ApiError::network("http", err.to_string())
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"detail": "..."}`, validation lists
/// `{"detail": [{"msg": "..."}]}`, `{"message": "..."}`, `{"error": "..."}`
/// and the `error_description` field of OAuth-style errors. Anything else is
/// returned trimmed.
pub fn extract_message(body: &str) -> String {
    let trimmed = body.trim();
    let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        return trimmed.to_string();
    };

    let from_detail = match value.get("detail") {
        Some(serde_json::Value::String(detail)) => Some(detail.clone()),
        Some(serde_json::Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    };

    from_detail
        .or_else(|| {
            ["error_description", "message", "msg", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(serde_json::Value::as_str))
                .map(str::to_string)
        })
        .unwrap_or_else(|| trimmed.to_string())
}
