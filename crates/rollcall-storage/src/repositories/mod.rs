//! Repository traits and their SQLite implementations.
//!
//! Trait methods return `Send` futures so the kiosk can stay generic over
//! its stores and still spawn one task per card tap.

pub mod attendance;
pub mod guardian;
pub mod sms;
pub mod student;

pub use attendance::{AttendanceRepository, RecordDecision, SqliteAttendanceRepository};
pub use guardian::{GuardianRepository, SqliteGuardianRepository};
pub use sms::{SmsRepository, SqliteSmsRepository};
pub use student::{SqliteStudentRepository, StudentRepository};
