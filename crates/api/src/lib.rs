//! # Cadence API
//!
//! Trigger surface for calendar synchronization.
//!
//! This crate contains:
//! - Commands (scheduled batch, on-demand tenant sync, connection management)
//! - Application context (dependency injection)
//! - The `cadence` binary entry point
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use commands::*;
pub use context::*;
