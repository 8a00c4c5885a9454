//! Shared helpers for `cadence-infra` integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use cadence_domain::{AccessGrant, CalendarApiConfig, OAuthConfig};
use cadence_infra::database::DbManager;
use tempfile::TempDir;

/// Temporary database that keeps the underlying file alive for the duration
/// of a test.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let manager = DbManager::new(temp_dir.path().join("cadence-test.db"), 4)
            .expect("db manager should be created");
        manager.run_migrations().expect("schema migrations should apply");
        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }
}

pub fn calendar_config(base_url: &str) -> CalendarApiConfig {
    CalendarApiConfig {
        base_url: base_url.to_string(),
        time_zone: "America/Sao_Paulo".to_string(),
        request_timeout_seconds: 5,
    }
}

pub fn oauth_config(token_endpoint: &str) -> OAuthConfig {
    OAuthConfig {
        client_id: "client-123".to_string(),
        client_secret: "secret-456".to_string(),
        token_endpoint: token_endpoint.to_string(),
        refresh_threshold_seconds: 300,
        request_timeout_seconds: 5,
    }
}

pub fn grant(token: &str) -> AccessGrant {
    AccessGrant { access_token: token.to_string(), calendar_id: "primary".to_string() }
}
