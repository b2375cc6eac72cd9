//! Errors from reader discovery and card reading.
//!
//! The manager turns these into [`ReaderEvent`](crate::ReaderEvent)s, so a
//! failing reader changes the kiosk banner instead of stopping the kiosk.

pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The reader went away, or its input source closed.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Device enumeration failed.
    #[error("Device enumeration failed: {message}")]
    Enumeration { message: String },

    /// The HID backend could not be opened.
    #[error("HID backend unavailable: {message}")]
    HidUnavailable { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn enumeration(message: impl Into<String>) -> Self {
        Self::Enumeration {
            message: message.into(),
        }
    }

    pub fn hid_unavailable(message: impl Into<String>) -> Self {
        Self::HidUnavailable {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            HardwareError::disconnected("USB RFID Reader").to_string(),
            "Device disconnected: USB RFID Reader"
        );
        assert_eq!(
            HardwareError::enumeration("permission denied").to_string(),
            "Device enumeration failed: permission denied"
        );
    }

    #[test]
    fn test_io_conversion() {
        let error: HardwareError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(error, HardwareError::Io(_)));
    }
}
