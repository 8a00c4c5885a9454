use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use cadence_core::{OAuthTokenClient, RemoteCalendar};
use cadence_domain::{
    AccessGrant, CadenceError, EventDraft, EventTime, RemoteEvent, Result as DomainResult,
    TimeWindow, TokenGrant,
};
use chrono::{DateTime, Utc};

/// In-memory calendar provider.
///
/// Events are stored per access token so one instance can serve several
/// tenants. Created events become visible to later `list_events` calls, the
/// way a real provider echoes our own writes back.
#[derive(Default)]
pub struct MockRemoteCalendar {
    events: Mutex<HashMap<String, Vec<RemoteEvent>>>,
    created: Mutex<Vec<(String, EventDraft)>>,
    updated: Mutex<Vec<(String, EventDraft)>>,
    list_calls: AtomicUsize,
    next_id: AtomicUsize,
    failing_summaries: Mutex<HashSet<String>>,
    list_error: Mutex<Option<CadenceError>>,
    list_delay: Mutex<Option<StdDuration>>,
}

impl MockRemoteCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an event visible to `access_token`.
    pub fn insert_event(&self, access_token: &str, event: RemoteEvent) {
        let mut events = self.events.lock().unwrap();
        let list = events.entry(access_token.to_string()).or_default();
        list.retain(|existing| existing.id != event.id);
        list.push(event);
    }

    /// Replace everything visible to `access_token`.
    pub fn set_events(&self, access_token: &str, events: Vec<RemoteEvent>) {
        self.events.lock().unwrap().insert(access_token.to_string(), events);
    }

    pub fn remove_event(&self, access_token: &str, id: &str) {
        if let Some(list) = self.events.lock().unwrap().get_mut(access_token) {
            list.retain(|event| event.id != id);
        }
    }

    /// Create/update calls whose summary equals `summary` fail with a 500.
    pub fn fail_summary(&self, summary: &str) {
        self.failing_summaries.lock().unwrap().insert(summary.to_string());
    }

    pub fn fail_list_with(&self, error: CadenceError) {
        *self.list_error.lock().unwrap() = Some(error);
    }

    pub fn delay_list(&self, delay: StdDuration) {
        *self.list_delay.lock().unwrap() = Some(delay);
    }

    pub fn created(&self) -> Vec<(String, EventDraft)> {
        self.created.lock().unwrap().clone()
    }

    pub fn updated(&self) -> Vec<(String, EventDraft)> {
        self.updated.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self, draft: &EventDraft) -> DomainResult<()> {
        if self.failing_summaries.lock().unwrap().contains(&draft.summary) {
            return Err(CadenceError::remote_api(500, "backend error"));
        }
        Ok(())
    }
}

pub fn timed_event(id: &str, summary: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> RemoteEvent {
    RemoteEvent {
        id: id.to_string(),
        summary: Some(summary.to_string()),
        description: None,
        start: EventTime::DateTime(start),
        end: EventTime::DateTime(end),
        color_id: None,
    }
}

fn draft_event(id: &str, draft: &EventDraft) -> RemoteEvent {
    RemoteEvent {
        id: id.to_string(),
        summary: Some(draft.summary.clone()),
        description: draft.description.clone(),
        start: EventTime::DateTime(draft.starts_at),
        end: EventTime::DateTime(draft.ends_at),
        color_id: None,
    }
}

#[async_trait]
impl RemoteCalendar for MockRemoteCalendar {
    async fn list_events(
        &self,
        grant: &AccessGrant,
        _window: &TimeWindow,
    ) -> DomainResult<Vec<RemoteEvent>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.list_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.events.lock().unwrap().get(&grant.access_token).cloned().unwrap_or_default())
    }

    async fn create_event(&self, grant: &AccessGrant, draft: &EventDraft) -> DomainResult<String> {
        self.check_failure(draft)?;
        let id = format!("remote-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.created.lock().unwrap().push((id.clone(), draft.clone()));
        self.insert_event(&grant.access_token, draft_event(&id, draft));
        Ok(id)
    }

    async fn update_event(
        &self,
        grant: &AccessGrant,
        event_id: &str,
        draft: &EventDraft,
    ) -> DomainResult<()> {
        self.check_failure(draft)?;
        self.updated.lock().unwrap().push((event_id.to_string(), draft.clone()));
        self.insert_event(&grant.access_token, draft_event(event_id, draft));
        Ok(())
    }
}

/// Scripted OAuth token endpoint.
pub struct MockOAuthClient {
    response: Mutex<DomainResult<TokenGrant>>,
    calls: AtomicUsize,
    delay: Mutex<Option<StdDuration>>,
}

impl MockOAuthClient {
    /// Answers every refresh with `refreshed-token`, valid for an hour.
    pub fn new() -> Self {
        Self {
            response: Mutex::new(Ok(TokenGrant {
                access_token: "refreshed-token".to_string(),
                expires_in: 3600,
                refresh_token: None,
            })),
            calls: AtomicUsize::new(0),
            delay: Mutex::new(None),
        }
    }

    pub fn respond_with(&self, response: DomainResult<TokenGrant>) {
        *self.response.lock().unwrap() = response;
    }

    pub fn delay(&self, delay: StdDuration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OAuthTokenClient for MockOAuthClient {
    async fn refresh_access_token(&self, _refresh_token: &str) -> DomainResult<TokenGrant> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.response.lock().unwrap().clone()
    }
}
