//! Core constants for the attendance kiosk.
//!
//! These values are shared by the card reader, the attendance store, the
//! coordinator and the SMS notifier. Anything a school might want to tune at
//! deploy time is also exposed through the kiosk configuration, and these
//! constants serve as its defaults.
//!
//! # Usage
//!
//! ```
//! use rollcall_core::constants::*;
//! use std::time::Duration;
//!
//! let gap = Duration::from_millis(CARD_READ_TIMEOUT_MS);
//! assert_eq!(gap.as_millis(), 100);
//!
//! assert!(MORNING_ARRIVAL_START_HOUR < MORNING_ARRIVAL_END_HOUR);
//! ```

// ============================================================================
// Card Reader
// ============================================================================

/// Maximum gap between two keystrokes of the same card read, in milliseconds.
///
/// Keyboard-wedge readers type the whole card id in a burst. A longer pause
/// means the previous burst was abandoned and the next key starts a new read.
pub const CARD_READ_TIMEOUT_MS: u64 = 100;

/// Interval between device presence checks, in seconds.
pub const DEVICE_POLL_INTERVAL_SECS: u64 = 5;

/// Device name reported when no reader is found by name but keyboard
/// emulation is assumed.
pub const KEYBOARD_EMULATION_DEVICE: &str = "USB HID RFID Reader (Keyboard Emulation)";

/// Capacity of the reader event channel.
pub const READER_EVENT_CHANNEL_SIZE: usize = 100;

// ============================================================================
// Attendance Rules
// ============================================================================

/// Default minimum number of minutes between two attendance records of the
/// same student.
pub const DEFAULT_MINIMUM_MINUTES: i64 = 1;

/// Status string stored for students currently inside the school.
pub const STATUS_IN: &str = "IN";

/// Status string stored for students currently outside the school.
pub const STATUS_OUT: &str = "OUT";

// ============================================================================
// Time-of-day Fallback
// ============================================================================
//
// Used only when the current status of a student cannot be read. Ranges are
// half-open: [start, end).

/// First hour (inclusive) treated as morning arrival.
pub const MORNING_ARRIVAL_START_HOUR: u32 = 6;

/// Hour (exclusive) at which morning arrival ends.
pub const MORNING_ARRIVAL_END_HOUR: u32 = 10;

/// First hour (inclusive) treated as afternoon dismissal.
pub const AFTERNOON_DISMISSAL_START_HOUR: u32 = 13;

/// Hour (exclusive) at which afternoon dismissal ends.
pub const AFTERNOON_DISMISSAL_END_HOUR: u32 = 18;

// ============================================================================
// Notifications
// ============================================================================

/// Signature appended to every guardian SMS.
pub const MESSAGE_SIGNATURE: &str = "School Attendance System";

/// Delay between two sends of a bulk announcement, in milliseconds.
pub const BULK_SEND_DELAY_MS: u64 = 100;

/// Default HTTP timeout for the SMS provider, in milliseconds.
pub const DEFAULT_SMS_TIMEOUT_MS: u64 = 30_000;

/// Default number of SMS log rows returned by a log query.
pub const DEFAULT_SMS_LOG_LIMIT: i64 = 100;

/// Country calling code used to normalize guardian phone numbers.
pub const PHONE_COUNTRY_CODE: &str = "63";

/// Capacity of the kiosk event channel.
pub const KIOSK_EVENT_CHANNEL_SIZE: usize = 256;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_ranges_do_not_overlap() {
        assert!(MORNING_ARRIVAL_START_HOUR < MORNING_ARRIVAL_END_HOUR);
        assert!(MORNING_ARRIVAL_END_HOUR <= AFTERNOON_DISMISSAL_START_HOUR);
        assert!(AFTERNOON_DISMISSAL_START_HOUR < AFTERNOON_DISMISSAL_END_HOUR);
        assert!(AFTERNOON_DISMISSAL_END_HOUR <= 24);
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(STATUS_IN, "IN");
        assert_eq!(STATUS_OUT, "OUT");
    }
}
