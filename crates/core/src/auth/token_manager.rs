//! Token manager with automatic refresh
//!
//! Hands out valid access tokens per tenant:
//! - Credential lookup through [`CredentialRepository`]
//! - Refresh before expiry (configurable threshold, default 5 min)
//! - One refresh in flight per tenant; concurrent callers reuse its result
//! - Rejected refresh tokens flag the credential for reconnection

use std::sync::Arc;

use cadence_domain::{AccessGrant, CadenceError, OAuthCredential, Result, TenantId};
use chrono::Duration;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::calendar_ports::OAuthTokenClient;
use crate::sync::ports::CredentialRepository;
use crate::utils::clock::Clock;

/// Token manager shared by every sync pass
///
/// The repository is the source of truth; nothing is cached in memory apart
/// from the per-tenant refresh locks.
pub struct TokenManager {
    credentials: Arc<dyn CredentialRepository>,
    oauth_client: Arc<dyn OAuthTokenClient>,
    clock: Arc<dyn Clock>,
    refresh_threshold_seconds: i64,
    refresh_locks: DashMap<TenantId, Arc<Mutex<()>>>,
}

impl TokenManager {
    /// Create a new token manager
    ///
    /// # Arguments
    /// * `credentials` - credential store
    /// * `oauth_client` - token endpoint client used for refresh
    /// * `clock` - source of "now" for expiry checks
    /// * `refresh_threshold_seconds` - refresh tokens this many seconds before
    ///   expiry (default: 300 = 5 min)
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialRepository>,
        oauth_client: Arc<dyn OAuthTokenClient>,
        clock: Arc<dyn Clock>,
        refresh_threshold_seconds: i64,
    ) -> Self {
        Self {
            credentials,
            oauth_client,
            clock,
            refresh_threshold_seconds,
            refresh_locks: DashMap::new(),
        }
    }

    /// Get a usable access token for the tenant, refreshing first when the
    /// stored one expires within the threshold.
    ///
    /// # Errors
    /// - `NotConnected` when the tenant has no credential
    /// - `Auth` when the credential awaits reconnection or the provider
    ///   rejects the refresh token (the credential is flagged in that case)
    /// - `Network` when the token endpoint is unreachable; the credential is
    ///   left untouched so the next pass retries
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn get_valid_access_token(&self, tenant_id: &TenantId) -> Result<AccessGrant> {
        let credential = self.load_usable(tenant_id).await?;
        if !self.needs_refresh(&credential) {
            return Ok(grant_for(&credential));
        }

        let lock = self.refresh_lock(tenant_id);
        let result = {
            let _guard = lock.lock().await;
            self.refresh_if_still_needed(tenant_id).await
        };

        drop(lock);
        self.refresh_locks.remove_if(tenant_id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    async fn refresh_if_still_needed(&self, tenant_id: &TenantId) -> Result<AccessGrant> {
        // A concurrent caller may have refreshed while we waited.
        let credential = self.load_usable(tenant_id).await?;
        if !self.needs_refresh(&credential) {
            debug!("Token already refreshed by concurrent caller");
            return Ok(grant_for(&credential));
        }

        self.refresh(credential).await
    }

    /// Store tokens obtained from a completed consent flow
    ///
    /// Reconnecting clears `needs_reconnect` and keeps the previous sync
    /// settings when the tenant was connected before.
    ///
    /// # Errors
    /// Returns error if the credential store fails
    pub async fn store_credential(&self, mut credential: OAuthCredential) -> Result<()> {
        if let Some(previous) = self.credentials.get_credential(&credential.tenant_id).await? {
            credential.last_synced_at = credential.last_synced_at.or(previous.last_synced_at);
        }
        credential.needs_reconnect = false;
        self.credentials.save_credential(&credential).await?;
        info!(tenant_id = %credential.tenant_id, "Calendar credential stored");
        Ok(())
    }

    /// Remove a tenant's credential (disconnect)
    ///
    /// # Errors
    /// Returns error if the credential store fails
    pub async fn clear_credential(&self, tenant_id: &TenantId) -> Result<bool> {
        let removed = self.credentials.delete_credential(tenant_id).await?;
        self.refresh_locks.remove(tenant_id);
        if removed {
            info!(tenant_id = %tenant_id, "Calendar credential cleared");
        }
        Ok(removed)
    }

    /// Get the refresh threshold in seconds
    #[must_use]
    pub fn refresh_threshold(&self) -> i64 {
        self.refresh_threshold_seconds
    }

    async fn load_usable(&self, tenant_id: &TenantId) -> Result<OAuthCredential> {
        let credential = self
            .credentials
            .get_credential(tenant_id)
            .await?
            .ok_or_else(|| CadenceError::NotConnected(tenant_id.to_string()))?;

        if credential.needs_reconnect {
            return Err(CadenceError::Auth(format!(
                "calendar access for tenant {tenant_id} was revoked; reconnect required"
            )));
        }

        Ok(credential)
    }

    fn needs_refresh(&self, credential: &OAuthCredential) -> bool {
        credential
            .needs_refresh(self.clock.now(), Duration::seconds(self.refresh_threshold_seconds))
    }

    fn refresh_lock(&self, tenant_id: &TenantId) -> Arc<Mutex<()>> {
        self.refresh_locks.entry(tenant_id.clone()).or_default().clone()
    }

    async fn refresh(&self, mut credential: OAuthCredential) -> Result<AccessGrant> {
        let tenant_id = credential.tenant_id.clone();

        match self.oauth_client.refresh_access_token(&credential.refresh_token).await {
            Ok(grant) => {
                let Some(expires_at) =
                    OAuthCredential::expiry_after(self.clock.now(), grant.expires_in.max(0))
                else {
                    warn!(tenant_id = %tenant_id, expires_in = grant.expires_in, "Token endpoint returned an unusable lifetime");
                    return Err(CadenceError::Auth(format!(
                        "token endpoint returned an out-of-range lifetime ({}s) for tenant {tenant_id}",
                        grant.expires_in
                    )));
                };
                credential.access_token = grant.access_token;
                credential.expires_at = expires_at;
                if let Some(rotated) = grant.refresh_token.filter(|token| !token.is_empty()) {
                    credential.refresh_token = rotated;
                }
                self.credentials.save_credential(&credential).await?;
                info!(tenant_id = %tenant_id, expires_at = %credential.expires_at, "Access token refreshed");
                Ok(grant_for(&credential))
            }
            Err(err) if is_rejection(&err) => {
                warn!(tenant_id = %tenant_id, error = %err, "Refresh token rejected; flagging for reconnect");
                credential.needs_reconnect = true;
                if let Err(save_err) = self.credentials.save_credential(&credential).await {
                    warn!(tenant_id = %tenant_id, error = %save_err, "Failed to flag credential for reconnect");
                }
                Err(CadenceError::Auth(format!("refresh token rejected for tenant {tenant_id}: {err}")))
            }
            Err(err) => {
                warn!(tenant_id = %tenant_id, error = %err, "Token refresh failed; will retry next pass");
                Err(err)
            }
        }
    }
}

fn grant_for(credential: &OAuthCredential) -> AccessGrant {
    AccessGrant {
        access_token: credential.access_token.clone(),
        calendar_id: credential.calendar_id.clone(),
    }
}

/// Provider answered and refused the refresh token.
fn is_rejection(err: &CadenceError) -> bool {
    match err {
        CadenceError::Auth(_) => true,
        CadenceError::RemoteApi { status, .. } => (400..500).contains(status),
        _ => false,
    }
}
