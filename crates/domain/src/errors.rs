//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Cadence
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum CadenceError {
    /// The tenant has no stored calendar credential.
    #[error("Calendar not connected: {0}")]
    NotConnected(String),

    /// Token refresh was rejected or the credential needs reconnecting.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Non-2xx answer from the calendar or OAuth provider.
    #[error("Remote API error ({status}): {body}")]
    RemoteApi { status: u16, body: String },

    /// Transport level failure (timeout, connection refused, ...).
    #[error("Network error: {0}")]
    Network(String),

    /// Local store read/write failure.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Another sync pass already holds the tenant.
    #[error("Sync already in progress: {0}")]
    SyncInProgress(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CadenceError {
    /// Shorthand for a remote API failure.
    pub fn remote_api(status: u16, body: impl Into<String>) -> Self {
        Self::RemoteApi { status, body: body.into() }
    }

    /// Errors that end the pass for the whole tenant rather than one event.
    #[must_use]
    pub fn is_tenant_fatal(&self) -> bool {
        matches!(self, Self::NotConnected(_) | Self::Auth(_) | Self::SyncInProgress(_))
    }

    /// Stable label for logs and summaries.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotConnected(_) => "not_connected",
            Self::Auth(_) => "auth",
            Self::RemoteApi { .. } => "remote_api",
            Self::Network(_) => "network",
            Self::Persistence(_) => "persistence",
            Self::Config(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::SyncInProgress(_) => "sync_in_progress",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for Cadence operations
pub type Result<T> = std::result::Result<T, CadenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_api_display_includes_status_and_body() {
        let err = CadenceError::remote_api(404, "Not Found");
        assert_eq!(err.to_string(), "Remote API error (404): Not Found");
        assert_eq!(err.label(), "remote_api");
    }

    #[test]
    fn tenant_fatal_classification() {
        assert!(CadenceError::NotConnected("t1".into()).is_tenant_fatal());
        assert!(CadenceError::Auth("revoked".into()).is_tenant_fatal());
        assert!(!CadenceError::remote_api(500, "boom").is_tenant_fatal());
        assert!(!CadenceError::Persistence("locked".into()).is_tenant_fatal());
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(CadenceError::Auth("expired".into())).unwrap();
        assert_eq!(json["type"], "Auth");
        assert_eq!(json["message"], "expired");
    }
}
