use thiserror::Error;

/// Errors that stop the kiosk from starting or shutting down cleanly.
///
/// Per-tap failures never show up here; they become [`crate::KioskEvent`]s.
#[derive(Debug, Error)]
pub enum KioskError {
    #[error("Configuration error: {0}")]
    Config(#[from] rollcall_core::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rollcall_storage::StorageError),

    #[error("Hardware error: {0}")]
    Hardware(#[from] rollcall_hardware::HardwareError),

    #[error("SMS error: {0}")]
    Sms(#[from] rollcall_sms::SmsError),
}

/// Result type alias for kiosk operations
pub type Result<T> = std::result::Result<T, KioskError>;
