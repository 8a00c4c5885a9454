//! Google Calendar v3 implementation of the `RemoteCalendar` port

use std::time::Duration;

use async_trait::async_trait;
use cadence_core::RemoteCalendar;
use cadence_domain::{
    AccessGrant, CadenceError, CalendarApiConfig, EventDraft, EventTime, RemoteEvent, Result,
    TimeWindow,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::{Method, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::errors::InfraError;
use crate::http::HttpClient;

const PAGE_SIZE: &str = "250";

/// HTTP client for the Google Calendar events collection.
///
/// Requests are sent once; retry policy belongs to the caller (the next
/// scheduled pass).
pub struct GoogleCalendarClient {
    http: HttpClient,
    base_url: Url,
}

impl GoogleCalendarClient {
    pub fn new(config: &CalendarApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|err| {
            CadenceError::Config(format!("invalid calendar base url '{}': {err}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CadenceError::Config(format!(
                "calendar base url '{}' cannot carry a path",
                config.base_url
            )));
        }

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self { http, base_url })
    }

    fn events_url(&self, calendar_id: &str, event_id: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                CadenceError::Config("calendar base url cannot carry a path".into())
            })?;
            segments.pop_if_empty().extend(["calendars", calendar_id, "events"]);
            if let Some(event_id) = event_id {
                segments.push(event_id);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl RemoteCalendar for GoogleCalendarClient {
    #[instrument(skip(self, grant), fields(calendar_id = %grant.calendar_id))]
    async fn list_events(
        &self,
        grant: &AccessGrant,
        window: &TimeWindow,
    ) -> Result<Vec<RemoteEvent>> {
        let url = self.events_url(&grant.calendar_id, None)?;
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut query = vec![
                ("timeMin", rfc3339(window.start)),
                ("timeMax", rfc3339(window.end)),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", PAGE_SIZE.to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let request = self
                .http
                .request(Method::GET, url.clone())
                .bearer_auth(&grant.access_token)
                .query(&query);
            let response = ensure_success(self.http.send(request).await?).await?;
            let page: GoogleEventsPage = response.json().await.map_err(http_error)?;
            pages += 1;

            for item in page.items {
                if item.status.as_deref() == Some("cancelled") {
                    continue;
                }
                let id = item.id.clone();
                match item.into_remote_event() {
                    Some(event) => events.push(event),
                    None => warn!(event_id = %id, "skipping remote event with unreadable start/end"),
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(pages, count = events.len(), "listed remote events");
        Ok(events)
    }

    #[instrument(skip(self, grant, draft), fields(calendar_id = %grant.calendar_id))]
    async fn create_event(&self, grant: &AccessGrant, draft: &EventDraft) -> Result<String> {
        let url = self.events_url(&grant.calendar_id, None)?;
        let request = self
            .http
            .request(Method::POST, url)
            .bearer_auth(&grant.access_token)
            .json(&GoogleEventBody::from_draft(draft));

        let response = ensure_success(self.http.send(request).await?).await?;
        let created: CreatedEvent = response.json().await.map_err(http_error)?;
        if created.id.trim().is_empty() {
            return Err(CadenceError::Internal("provider returned an empty event id".into()));
        }

        debug!(event_id = %created.id, "created remote event");
        Ok(created.id)
    }

    #[instrument(skip(self, grant, draft), fields(calendar_id = %grant.calendar_id, event_id = %event_id))]
    async fn update_event(
        &self,
        grant: &AccessGrant,
        event_id: &str,
        draft: &EventDraft,
    ) -> Result<()> {
        let url = self.events_url(&grant.calendar_id, Some(event_id))?;
        let request = self
            .http
            .request(Method::PUT, url)
            .bearer_auth(&grant.access_token)
            .json(&GoogleEventBody::from_draft(draft));

        ensure_success(self.http.send(request).await?).await?;
        debug!("updated remote event");
        Ok(())
    }
}

/// Turn a non-2xx response into `RemoteApi` carrying the response body.
pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CadenceError::remote_api(status.as_u16(), body))
}

fn http_error(err: reqwest::Error) -> CadenceError {
    InfraError::from(err).into()
}

fn rfc3339(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventsPage {
    #[serde(default)]
    items: Vec<GoogleEvent>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEvent {
    id: String,
    status: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    start: GoogleEventTime,
    end: GoogleEventTime,
    color_id: Option<String>,
}

impl GoogleEvent {
    fn into_remote_event(self) -> Option<RemoteEvent> {
        Some(RemoteEvent {
            start: self.start.parse()?,
            end: self.end.parse()?,
            id: self.id,
            summary: self.summary,
            description: self.description,
            color_id: self.color_id,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventTime {
    date_time: Option<String>,
    date: Option<String>,
}

impl GoogleEventTime {
    fn parse(&self) -> Option<EventTime> {
        if let Some(raw) = &self.date_time {
            return DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|instant| EventTime::DateTime(instant.with_timezone(&Utc)));
        }
        self.date
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
            .map(EventTime::Date)
    }
}

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    id: String,
}

#[derive(Debug, Serialize)]
struct GoogleEventBody<'a> {
    summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    start: GoogleDateTimeBody<'a>,
    end: GoogleDateTimeBody<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attendees: Vec<GoogleAttendee<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleDateTimeBody<'a> {
    date_time: String,
    time_zone: &'a str,
}

#[derive(Debug, Serialize)]
struct GoogleAttendee<'a> {
    email: &'a str,
}

impl<'a> GoogleEventBody<'a> {
    fn from_draft(draft: &'a EventDraft) -> Self {
        Self {
            summary: &draft.summary,
            description: draft.description.as_deref(),
            start: GoogleDateTimeBody {
                date_time: rfc3339(draft.starts_at),
                time_zone: &draft.time_zone,
            },
            end: GoogleDateTimeBody { date_time: rfc3339(draft.ends_at), time_zone: &draft.time_zone },
            attendees: draft
                .attendee_email
                .as_deref()
                .map(|email| vec![GoogleAttendee { email }])
                .unwrap_or_default(),
        }
    }
}
