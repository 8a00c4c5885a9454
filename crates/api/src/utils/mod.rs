//! Utility helpers for the trigger surface

pub mod logging;
