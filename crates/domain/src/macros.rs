//! Macro for implementing Display and FromStr for stored enums
//!
//! Appointment statuses and event tags are persisted as lowercase text. This
//! macro gives both directions of that mapping from a single table, with
//! case-insensitive parsing.
//!
//! # Example
//!
//! ```rust
//! use cadence_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum ConnectionState {
//!     Connected,
//!     Disconnected,
//! }
//!
//! impl_domain_status_conversions!(ConnectionState {
//!     Connected => "connected",
//!     Disconnected => "disconnected",
//! });
//!
//! assert_eq!(ConnectionState::Connected.to_string(), "connected");
//! ```

/// Implements Display and FromStr traits for stored enums
///
/// This macro generates:
/// - Display trait: converts enum variants to their stored strings
/// - FromStr trait: parses case-insensitive strings to enum variants
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase string
///   representations
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
