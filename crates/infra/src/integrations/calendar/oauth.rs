//! Refresh-token exchange against an OAuth2 token endpoint.
//!
//! Only the `refresh_token` grant is implemented here. The initial
//! authorization-code flow happens outside this service; its result is
//! handed to `connect_calendar`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use cadence_core::OAuthTokenClient;
use cadence_domain::constants::DEFAULT_TOKEN_LIFETIME_SECS;
use cadence_domain::{CadenceError, OAuthConfig, Result, TokenGrant};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::http::HttpClient;

/// Google-compatible OAuth token client.
pub struct GoogleOAuthClient {
    http: HttpClient,
    token_endpoint: Url,
    client_id: String,
    client_secret: String,
}

impl fmt::Debug for GoogleOAuthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleOAuthClient")
            .field("token_endpoint", &self.token_endpoint.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl GoogleOAuthClient {
    pub fn new(config: &OAuthConfig) -> Result<Self> {
        if config.client_id.trim().is_empty() {
            return Err(CadenceError::Config("OAuth client id is not configured".into()));
        }
        let token_endpoint = Url::parse(&config.token_endpoint).map_err(|err| {
            CadenceError::Config(format!(
                "invalid OAuth token endpoint '{}': {err}",
                config.token_endpoint
            ))
        })?;

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            token_endpoint,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }
}

#[async_trait]
impl OAuthTokenClient for GoogleOAuthClient {
    #[instrument(skip(self, refresh_token))]
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenGrant> {
        let request = self.http.request(Method::POST, self.token_endpoint.clone()).form(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ]);

        let response = self.http.send(request).await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed: Option<TokenResponse> = serde_json::from_str(&body).ok();

        if let Some(error) = parsed.as_ref().and_then(|p| p.error.as_deref()) {
            let description =
                parsed.as_ref().and_then(|p| p.error_description.as_deref()).unwrap_or_default();
            warn!(%status, error, "token endpoint rejected refresh");
            return Err(CadenceError::Auth(format_rejection(error, description)));
        }

        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            warn!(%status, "token endpoint rejected refresh");
            return Err(CadenceError::Auth(format!("token refresh rejected ({status}): {body}")));
        }

        if !status.is_success() {
            return Err(CadenceError::remote_api(status.as_u16(), body));
        }

        let parsed = parsed.ok_or_else(|| {
            CadenceError::Internal("token endpoint returned an unreadable body".into())
        })?;
        let access_token = parsed
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| CadenceError::Internal("token response missing access_token".into()))?;

        debug!(rotated = parsed.refresh_token.is_some(), "access token refreshed");
        Ok(TokenGrant {
            access_token,
            expires_in: parsed.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS),
            refresh_token: parsed.refresh_token.filter(|token| !token.is_empty()),
        })
    }
}

fn format_rejection(error: &str, description: &str) -> String {
    if description.is_empty() {
        error.to_string()
    } else {
        format!("{error}: {description}")
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}
