//! Core library for the Ramadan calendar relay.
//!
//! This crate defines:
//! - Configuration (file, environment overrides)
//! - Abstraction over Ramadan data providers
//! - Shared domain models and the calendar projection
//! - The HTTP relay served by `ramadan serve`
//!
//! It is used by `ramadan-cli`, but can also be embedded in other services.

pub mod calendar;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod relay;

pub use config::Config;
pub use error::{ErrorResponse, RelayError, RelayResult};
pub use model::{CalendarEntry, Coordinate, FastingDay, FastingTime, RootMessage};
pub use provider::RamadanProvider;
