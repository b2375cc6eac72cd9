//! Business rules applied before an attendance event is recorded.
//!
//! Rules are checked in order and the first failure wins:
//!
//! 1. **Same-state rejection**: a time in while already in, or a time out
//!    while out (or without any record), is rejected.
//! 2. **Minimum interval**: a new event less than `minimum_minutes` after the
//!    previous one is rejected, so a card held against the reader does not
//!    produce an in/out pair.
//!
//! The policy is pure. The attendance repository feeds it the latest record
//! read inside the same write transaction that performs the insert.

use crate::messages::ValidationMessages;
use crate::models::AttendanceStatus;
use chrono::{DateTime, Utc};
use rollcall_core::constants::DEFAULT_MINIMUM_MINUTES;
use rollcall_core::{AttendanceState, AttendanceType, ValidationResult};

/// Attendance validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendancePolicy {
    /// Minimum minutes between two events of the same student.
    pub minimum_minutes: i64,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            minimum_minutes: DEFAULT_MINIMUM_MINUTES,
        }
    }
}

impl AttendancePolicy {
    pub fn new(minimum_minutes: i64) -> Self {
        Self {
            minimum_minutes: minimum_minutes.max(0),
        }
    }

    /// Check `proposed` at time `at` against the student's current status.
    pub fn evaluate(
        &self,
        current: Option<&AttendanceStatus>,
        proposed: AttendanceType,
        at: DateTime<Utc>,
    ) -> ValidationResult {
        let state = current.map_or(AttendanceState::Out, |s| s.state);

        if !state.accepts(proposed) {
            return ValidationResult::invalid(match proposed {
                AttendanceType::TimeIn => ValidationMessages::ALREADY_TIMED_IN,
                AttendanceType::TimeOut => ValidationMessages::NOT_TIMED_IN,
            });
        }

        if let Some(status) = current
            && self.minimum_minutes > 0
        {
            let required_secs = self.minimum_minutes * 60;
            let elapsed_secs = (at - status.last_timestamp).num_seconds().max(0);
            if elapsed_secs < required_secs {
                let remaining_minutes = (required_secs - elapsed_secs + 59) / 60;
                return ValidationResult::invalid(ValidationMessages::wait_minutes(
                    remaining_minutes.max(1),
                ));
            }
        }

        ValidationResult::valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 27, h, m, 0).unwrap()
    }

    fn status(state: AttendanceState, h: u32, m: u32) -> AttendanceStatus {
        AttendanceStatus {
            state,
            last_timestamp: at(h, m),
        }
    }

    #[test]
    fn test_first_time_in_accepted() {
        let policy = AttendancePolicy::default();
        assert!(policy.evaluate(None, AttendanceType::TimeIn, at(7, 30)).is_valid);
    }

    #[test]
    fn test_time_out_without_record_rejected() {
        let policy = AttendancePolicy::default();
        let result = policy.evaluate(None, AttendanceType::TimeOut, at(7, 30));
        assert!(!result.is_valid);
        assert_eq!(result.message, ValidationMessages::NOT_TIMED_IN);
    }

    #[rstest]
    #[case(AttendanceState::In, AttendanceType::TimeIn, ValidationMessages::ALREADY_TIMED_IN)]
    #[case(AttendanceState::Out, AttendanceType::TimeOut, ValidationMessages::NOT_TIMED_IN)]
    fn test_same_state_rejected(
        #[case] state: AttendanceState,
        #[case] proposed: AttendanceType,
        #[case] message: &str,
    ) {
        let policy = AttendancePolicy::default();
        let current = status(state, 8, 0);
        let result = policy.evaluate(Some(&current), proposed, at(16, 30));
        assert!(!result.is_valid);
        assert_eq!(result.message, message);
    }

    #[test]
    fn test_alternation_accepted() {
        let policy = AttendancePolicy::default();
        let current = status(AttendanceState::In, 8, 0);
        assert!(
            policy
                .evaluate(Some(&current), AttendanceType::TimeOut, at(16, 30))
                .is_valid
        );
    }

    #[rstest]
    #[case(0, "Please wait 5 more minute(s) before scanning again.")]
    #[case(1, "Please wait 4 more minute(s) before scanning again.")]
    #[case(4, "Please wait 1 more minute(s) before scanning again.")]
    fn test_minimum_interval(#[case] after_minutes: i64, #[case] message: &str) {
        let policy = AttendancePolicy::new(5);
        let current = status(AttendanceState::In, 8, 0);
        let tap = at(8, 0) + Duration::minutes(after_minutes);

        let result = policy.evaluate(Some(&current), AttendanceType::TimeOut, tap);
        assert!(!result.is_valid);
        assert_eq!(result.message, message);
    }

    #[test]
    fn test_partial_minute_rounds_up() {
        let policy = AttendancePolicy::new(1);
        let current = status(AttendanceState::In, 8, 0);
        let tap = at(8, 0) + Duration::seconds(59);

        let result = policy.evaluate(Some(&current), AttendanceType::TimeOut, tap);
        assert_eq!(result.message, ValidationMessages::wait_minutes(1));
    }

    #[test]
    fn test_interval_boundary_accepted() {
        let policy = AttendancePolicy::new(5);
        let current = status(AttendanceState::In, 8, 0);
        let tap = at(8, 5);
        assert!(
            policy
                .evaluate(Some(&current), AttendanceType::TimeOut, tap)
                .is_valid
        );
    }

    #[test]
    fn test_zero_minimum_disables_interval() {
        let policy = AttendancePolicy::new(0);
        let current = status(AttendanceState::In, 8, 0);
        assert!(
            policy
                .evaluate(Some(&current), AttendanceType::TimeOut, at(8, 0))
                .is_valid
        );
    }

    #[test]
    fn test_negative_minimum_clamped() {
        assert_eq!(AttendancePolicy::new(-3).minimum_minutes, 0);
    }
}
