//! Messages returned when an attendance event is rejected.
//!
//! These strings are shown verbatim on the kiosk banner, so they are written
//! for students and staff rather than for logs.
//!
//! # Usage
//!
//! ```
//! use rollcall_storage::messages::ValidationMessages;
//!
//! assert_eq!(ValidationMessages::ALREADY_TIMED_IN, "Student is already timed in.");
//! assert_eq!(
//!     ValidationMessages::wait_minutes(2),
//!     "Please wait 2 more minute(s) before scanning again."
//! );
//! ```

/// Rejection messages for attendance validation.
pub struct ValidationMessages;

impl ValidationMessages {
    /// A time in was proposed for a student who is already inside.
    pub const ALREADY_TIMED_IN: &'static str = "Student is already timed in.";

    /// A time out was proposed for a student who is outside or has no record.
    pub const NOT_TIMED_IN: &'static str = "Student has not timed in yet.";

    /// The student does not exist or has been deactivated.
    pub const STUDENT_INACTIVE: &'static str = "Student is not active.";

    /// Scanned again before the minimum interval elapsed.
    pub fn wait_minutes(minutes: i64) -> String {
        format!("Please wait {minutes} more minute(s) before scanning again.")
    }
}
