//! # Cadence Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite persistence for credentials, appointments and pulled events
//! - Google Calendar and OAuth token HTTP adapters
//! - Configuration loading
//! - The cron-driven sync scheduler
//!
//! ## Architecture
//! - Implements traits defined in `cadence-core`
//! - Contains all "impure" code (I/O, HTTP, SQLite)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod scheduling;

// Re-export commonly used items
pub use database::*;
pub use errors::InfraError;
pub use http::*;
pub use integrations::*;
