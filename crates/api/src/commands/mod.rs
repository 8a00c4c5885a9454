//! Commands exposed by the trigger surface

pub mod calendar;

pub use calendar::{
    calendar_status, connect_calendar, disconnect_calendar, run_scheduled_sync,
    set_sync_enabled, sync_calendar_now, ConnectCalendarRequest,
};
