use chrono::{DateTime, Utc};
use rollcall_core::{AttendanceState, AttendanceType};
use serde::{Deserialize, Serialize};

/// One time in or time out event
///
/// Records are append-only: the schema rejects updates and deletes. The
/// current status of a student is derived from the most recent record.
///
/// # Fields
///
/// * `attendance_type` - 1 = TimeIn, 2 = TimeOut; use [`AttendanceRecord::kind`]
/// * `recorded_at` - When the card was tapped
/// * `created_at` - When the row was written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub id: i64,
    pub student_id: i64,
    pub attendance_type: i32,
    pub recorded_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Get the attendance type as an enum
    pub fn kind(&self) -> Option<AttendanceType> {
        AttendanceType::from_i32(self.attendance_type)
    }

    /// Derived status after this record, if the stored type is valid
    pub fn status(&self) -> Option<AttendanceStatus> {
        self.kind().map(|kind| AttendanceStatus {
            state: AttendanceState::after(kind),
            last_timestamp: self.recorded_at,
        })
    }
}

/// Current status of a student, derived from their latest record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceStatus {
    pub state: AttendanceState,
    pub last_timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: i32) -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            student_id: 1,
            attendance_type: kind,
            recorded_at: Utc::now(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_from_record() {
        let rec = record(1);
        let status = rec.status().unwrap();
        assert_eq!(status.state, AttendanceState::In);
        assert_eq!(status.last_timestamp, rec.recorded_at);

        assert_eq!(record(2).status().unwrap().state, AttendanceState::Out);
    }

    #[test]
    fn test_invalid_type_has_no_status() {
        assert!(record(7).kind().is_none());
        assert!(record(7).status().is_none());
    }
}
