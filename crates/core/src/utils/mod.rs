//! Shared utilities for core services

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};
