//! HTTP-level coverage for the Google Calendar adapter against a mock server.

mod support;

use cadence_core::RemoteCalendar;
use cadence_domain::{CadenceError, EventDraft, EventTime, TimeWindow};
use cadence_infra::integrations::GoogleCalendarClient;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;
use support::{calendar_config, grant};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn window() -> TimeWindow {
    TimeWindow::starting_at(Utc.with_ymd_and_hms(2025, 6, 9, 8, 0, 0).unwrap(), 30)
}

fn draft() -> EventDraft {
    EventDraft {
        summary: "Session — Ana Silva".into(),
        description: Some("Bring exams".into()),
        starts_at: Utc.with_ymd_and_hms(2025, 6, 10, 13, 0, 0).unwrap(),
        ends_at: Utc.with_ymd_and_hms(2025, 6, 10, 13, 50, 0).unwrap(),
        time_zone: "America/Sao_Paulo".into(),
        attendee_email: Some("ana@example.com".into()),
    }
}

#[tokio::test]
async fn list_follows_pagination_and_parses_both_time_kinds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(header("authorization", "Bearer token-a"))
        .and(query_param("singleEvents", "true"))
        .and(query_param("orderBy", "startTime"))
        .and(query_param("timeMin", "2025-06-09T08:00:00Z"))
        .and(query_param("timeMax", "2025-07-09T08:00:00Z"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "holiday",
                "summary": "Vacation",
                "start": { "date": "2025-06-20" },
                "end": { "date": "2025-06-21" }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "id": "standup",
                    "summary": "Daily standup",
                    "colorId": "5",
                    "start": { "dateTime": "2025-06-10T09:00:00-03:00" },
                    "end": { "dateTime": "2025-06-10T09:15:00-03:00" }
                },
                {
                    "id": "gone",
                    "status": "cancelled",
                    "start": { "dateTime": "2025-06-11T09:00:00Z" },
                    "end": { "dateTime": "2025-06-11T10:00:00Z" }
                }
            ],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GoogleCalendarClient::new(&calendar_config(&server.uri())).unwrap();
    let events = client.list_events(&grant("token-a"), &window()).await.unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].id, "standup");
    assert_eq!(events[0].color_id.as_deref(), Some("5"));
    assert_eq!(
        events[0].start,
        EventTime::DateTime(Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap())
    );
    assert_eq!(events[1].id, "holiday");
    assert_eq!(events[1].start, EventTime::Date(NaiveDate::from_ymd_opt(2025, 6, 20).unwrap()));
    assert!(events[1].is_all_day());
}

#[tokio::test]
async fn create_posts_full_body_and_returns_provider_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .and(header("authorization", "Bearer token-a"))
        .and(body_partial_json(json!({
            "summary": "Session — Ana Silva",
            "description": "Bring exams",
            "start": { "dateTime": "2025-06-10T13:00:00Z", "timeZone": "America/Sao_Paulo" },
            "end": { "dateTime": "2025-06-10T13:50:00Z", "timeZone": "America/Sao_Paulo" },
            "attendees": [{ "email": "ana@example.com" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "evt-123" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GoogleCalendarClient::new(&calendar_config(&server.uri())).unwrap();
    let id = client.create_event(&grant("token-a"), &draft()).await.unwrap();

    assert_eq!(id, "evt-123");
}

#[tokio::test]
async fn update_puts_to_the_event_path() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/calendars/primary/events/evt-123"))
        .and(body_partial_json(json!({ "summary": "Session — Ana Silva" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "evt-123" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GoogleCalendarClient::new(&calendar_config(&server.uri())).unwrap();
    client.update_event(&grant("token-a"), "evt-123", &draft()).await.unwrap();
}

#[tokio::test]
async fn non_success_status_surfaces_status_and_body_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(404).set_body_string("event not found"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let client = GoogleCalendarClient::new(&calendar_config(&server.uri())).unwrap();

    let err = client.update_event(&grant("token-a"), "missing", &draft()).await.unwrap_err();
    assert_eq!(err, CadenceError::remote_api(404, "event not found"));

    let err = client.list_events(&grant("token-a"), &window()).await.unwrap_err();
    assert_eq!(err, CadenceError::remote_api(503, "backend unavailable"));
}

#[tokio::test]
async fn invalid_base_url_is_a_config_error() {
    let result = GoogleCalendarClient::new(&calendar_config("not a url"));
    assert!(matches!(result, Err(CadenceError::Config(_))));
}
