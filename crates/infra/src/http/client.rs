//! Single-shot HTTP transport shared by the calendar and OAuth adapters.
//!
//! Nothing here retries. A failed call surfaces to the sync pass, and the next
//! scheduled run is the retry.

use std::time::{Duration, Instant};

use cadence_domain::{CadenceError, Result};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use crate::errors::InfraError;

/// User agent sent on every provider request.
pub const DEFAULT_USER_AGENT: &str = concat!("cadence/", env!("CARGO_PKG_VERSION"));

/// HTTP client with a request timeout and a fixed user agent.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the request exactly once.
    ///
    /// Any HTTP status comes back as `Ok`; status handling belongs to the
    /// adapter. Transport failures map to `Network`.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder.build().map_err(|err| CadenceError::from(InfraError::from(err)))?;
        let method = request.method().clone();
        let url = request.url().clone();
        let started = Instant::now();
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(
                    %method,
                    %url,
                    status = %response.status(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "received HTTP response"
                );
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(InfraError::from(err).into())
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30), user_agent: DEFAULT_USER_AGENT.to_string() }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .no_proxy()
            .build()
            .map_err(|err| CadenceError::from(InfraError::from(err)))?;

        Ok(HttpClient { client })
    }
}
