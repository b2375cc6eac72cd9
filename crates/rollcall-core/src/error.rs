use thiserror::Error;

/// Errors shared across the kiosk crates.
#[derive(Error, Debug)]
pub enum Error {
    // Stored codes that do not map to a known value
    #[error("Invalid attendance type code: {code}")]
    InvalidAttendanceType { code: i32 },

    #[error("Invalid attendance state: {0}")]
    InvalidAttendanceState(String),

    #[error("Invalid SMS status code: {code}")]
    InvalidSmsStatus { code: i32 },

    #[error("Invalid timestamp '{input}': {reason}")]
    InvalidTimestamp { input: String, reason: String },

    /// A student cannot move to the state they are already in
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            Error::InvalidAttendanceType { code: 9 }.to_string(),
            "Invalid attendance type code: 9"
        );
        assert_eq!(
            Error::Config("ROLLCALL_MINIMUM_MINUTES must not be negative".into()).to_string(),
            "Configuration error: ROLLCALL_MINIMUM_MINUTES must not be negative"
        );
    }
}
