//! Google Calendar integration
//!
//! Adapters for the `RemoteCalendar` and `OAuthTokenClient` ports.

pub mod google;
pub mod oauth;

pub use google::GoogleCalendarClient;
pub use oauth::GoogleOAuthClient;
