use crate::{
    Result,
    constants::{STATUS_IN, STATUS_OUT},
    error::Error,
};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Database identifier of a student.
pub type StudentId = i64;

/// Database identifier of a guardian.
pub type GuardianId = i64;

/// Kind of attendance event.
///
/// Stored as an integer column: 1 for time in, 2 for time out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum AttendanceType {
    TimeIn = 1,
    TimeOut = 2,
}

impl AttendanceType {
    /// Convert a stored integer code.
    #[inline]
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(AttendanceType::TimeIn),
            2 => Some(AttendanceType::TimeOut),
            _ => None,
        }
    }

    /// Convert a stored integer code, failing on unknown values.
    ///
    /// # Errors
    /// Returns `Error::InvalidAttendanceType` for anything other than 1 or 2.
    pub fn try_from_i32(value: i32) -> Result<Self> {
        Self::from_i32(value).ok_or(Error::InvalidAttendanceType { code: value })
    }

    #[inline]
    #[must_use]
    pub fn to_i32(self) -> i32 {
        self as i32
    }

    /// Human readable name, as shown on the kiosk banner.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            AttendanceType::TimeIn => "TIME IN",
            AttendanceType::TimeOut => "TIME OUT",
        }
    }

    /// Verb phrase used in guardian notifications.
    #[must_use]
    pub fn arrival_phrase(self) -> &'static str {
        match self {
            AttendanceType::TimeIn => "arrived at",
            AttendanceType::TimeOut => "left",
        }
    }

    /// State a student is in after this event is recorded.
    #[must_use]
    pub fn resulting_state(self) -> AttendanceState {
        match self {
            AttendanceType::TimeIn => AttendanceState::In,
            AttendanceType::TimeOut => AttendanceState::Out,
        }
    }

    #[must_use]
    pub fn is_time_in(self) -> bool {
        matches!(self, AttendanceType::TimeIn)
    }
}

impl From<AttendanceType> for i32 {
    fn from(kind: AttendanceType) -> i32 {
        kind as i32
    }
}

impl fmt::Display for AttendanceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttendanceType::TimeIn => write!(f, "TimeIn"),
            AttendanceType::TimeOut => write!(f, "TimeOut"),
        }
    }
}

/// Whether a student is currently inside or outside the school.
///
/// Students without any record are treated as `Out`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AttendanceState {
    In,
    #[default]
    Out,
}

impl AttendanceState {
    /// State after the most recent record of the given type.
    #[must_use]
    pub fn after(last: AttendanceType) -> Self {
        last.resulting_state()
    }

    /// The event that alternates away from this state.
    #[must_use]
    pub fn next_attendance(self) -> AttendanceType {
        match self {
            AttendanceState::In => AttendanceType::TimeOut,
            AttendanceState::Out => AttendanceType::TimeIn,
        }
    }

    /// Check whether recording `kind` from this state is a real transition.
    #[must_use]
    pub fn accepts(self, kind: AttendanceType) -> bool {
        kind.resulting_state() != self
    }

    /// Apply an event, rejecting same-state transitions.
    ///
    /// # Errors
    /// Returns `Error::InvalidStateTransition` for IN→IN and OUT→OUT.
    pub fn transition(self, kind: AttendanceType) -> Result<Self> {
        if !self.accepts(kind) {
            return Err(Error::InvalidStateTransition {
                from: self.to_string(),
                to: kind.resulting_state().to_string(),
            });
        }
        Ok(kind.resulting_state())
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceState::In => STATUS_IN,
            AttendanceState::Out => STATUS_OUT,
        }
    }
}

impl fmt::Display for AttendanceState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AttendanceState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            s if s.eq_ignore_ascii_case(STATUS_IN) => Ok(AttendanceState::In),
            s if s.eq_ignore_ascii_case(STATUS_OUT) => Ok(AttendanceState::Out),
            other => Err(Error::InvalidAttendanceState(other.to_string())),
        }
    }
}

/// Outcome of checking a proposed attendance event against the store rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub message: String,
}

impl ValidationResult {
    #[must_use]
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: String::new(),
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
        }
    }
}

/// Delivery status of an SMS log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum SmsStatus {
    Pending = 1,
    Sent = 2,
    Failed = 3,
    Delivered = 4,
    Queued = 5,
}

impl SmsStatus {
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(SmsStatus::Pending),
            2 => Some(SmsStatus::Sent),
            3 => Some(SmsStatus::Failed),
            4 => Some(SmsStatus::Delivered),
            5 => Some(SmsStatus::Queued),
            _ => None,
        }
    }

    /// # Errors
    /// Returns `Error::InvalidSmsStatus` for codes outside 1-5.
    pub fn try_from_i32(value: i32) -> Result<Self> {
        Self::from_i32(value).ok_or(Error::InvalidSmsStatus { code: value })
    }

    /// Returns `true` once the provider accepted the message.
    #[must_use]
    pub fn is_delivered_or_sent(self) -> bool {
        matches!(self, SmsStatus::Sent | SmsStatus::Delivered)
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            SmsStatus::Pending => "Pending",
            SmsStatus::Sent => "Sent",
            SmsStatus::Failed => "Failed",
            SmsStatus::Delivered => "Delivered",
            SmsStatus::Queued => "Queued",
        }
    }
}

impl From<SmsStatus> for i32 {
    fn from(status: SmsStatus) -> i32 {
        status as i32
    }
}

impl fmt::Display for SmsStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Parse a local wall-clock timestamp in `yyyy-MM-dd HH:mm:ss` form.
///
/// # Errors
/// Returns `Error::InvalidTimestamp` if the string does not match the format,
/// or if the time does not exist in the local zone.
///
/// # DST Handling
///
/// Times skipped by a "spring forward" change are rejected. Ambiguous times
/// during "fall back" resolve to the earlier occurrence.
pub fn parse_local_timestamp(s: &str) -> Result<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map_err(|e| {
        Error::InvalidTimestamp {
            input: s.to_string(),
            reason: e.to_string(),
        }
    })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| Error::InvalidTimestamp {
            input: s.to_string(),
            reason: "time does not exist in the local zone".to_string(),
        })
}

/// `HH:mm` rendering used in notifications.
#[must_use]
pub fn format_clock(at: &DateTime<Local>) -> String {
    at.format("%H:%M").to_string()
}

/// `yyyy-MM-dd` rendering used in notifications.
#[must_use]
pub fn format_date(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d").to_string()
}
