//! Calendar provider port interfaces
//!
//! The reconciliation engine only ever talks to a remote calendar and the
//! OAuth token endpoint through these traits. Concrete HTTP adapters live in
//! `cadence-infra`.

use async_trait::async_trait;
use cadence_domain::{AccessGrant, EventDraft, RemoteEvent, Result, TimeWindow, TokenGrant};

/// Operations against a tenant's remote calendar
///
/// Every call authenticates with the [`AccessGrant`] handed out by the token
/// manager; implementations never refresh tokens themselves.
#[async_trait]
pub trait RemoteCalendar: Send + Sync {
    /// List events overlapping `window`, following pagination to the end.
    ///
    /// Recurring series are expanded into single instances.
    async fn list_events(&self, grant: &AccessGrant, window: &TimeWindow)
        -> Result<Vec<RemoteEvent>>;

    /// Create an event and return the identifier assigned by the provider.
    async fn create_event(&self, grant: &AccessGrant, draft: &EventDraft) -> Result<String>;

    /// Replace the content of an existing event.
    async fn update_event(
        &self,
        grant: &AccessGrant,
        event_id: &str,
        draft: &EventDraft,
    ) -> Result<()>;
}

/// Exchange of a refresh token for a new access token
#[async_trait]
pub trait OAuthTokenClient: Send + Sync {
    /// Provider rejections surface as `CadenceError::Auth`; transport
    /// problems as `CadenceError::Network`.
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenGrant>;
}
