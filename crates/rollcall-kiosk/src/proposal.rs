//! Choosing which event a tap should record.

use chrono::{NaiveTime, Timelike};
use rollcall_core::AttendanceType;
use rollcall_core::constants::{
    AFTERNOON_DISMISSAL_END_HOUR, AFTERNOON_DISMISSAL_START_HOUR, MORNING_ARRIVAL_END_HOUR,
    MORNING_ARRIVAL_START_HOUR,
};
use rollcall_storage::AttendanceStatus;

/// Alternate away from the current status. No record means time in.
pub fn next_attendance(current: Option<&AttendanceStatus>) -> AttendanceType {
    current
        .map(|status| status.state)
        .unwrap_or_default()
        .next_attendance()
}

/// Guess from the clock when the status cannot be read.
///
/// Morning arrival hours propose time in, afternoon dismissal hours propose
/// time out, anything else time in.
pub fn attendance_by_clock(at: NaiveTime) -> AttendanceType {
    let hour = at.hour();
    if (MORNING_ARRIVAL_START_HOUR..MORNING_ARRIVAL_END_HOUR).contains(&hour) {
        AttendanceType::TimeIn
    } else if (AFTERNOON_DISMISSAL_START_HOUR..AFTERNOON_DISMISSAL_END_HOUR).contains(&hour) {
        AttendanceType::TimeOut
    } else {
        AttendanceType::TimeIn
    }
}
