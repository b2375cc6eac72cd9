//! Shared types for the rollcall attendance kiosk.
//!
//! Attendance types and states, SMS delivery status, and the constants
//! every other crate agrees on.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Crate version, logged at kiosk startup
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
