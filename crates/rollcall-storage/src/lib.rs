//! Storage layer for the attendance kiosk.
//!
//! SQLite-backed persistence for students, guardians, attendance records and
//! the SMS audit log, plus the attendance rules applied before a record is
//! written.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool manager with automatic migrations
//! - [`StudentRepository`], [`GuardianRepository`], [`AttendanceRepository`],
//!   [`SmsRepository`] - Data access traits with SQLite implementations
//! - [`AttendancePolicy`] - Same-state and minimum-interval rules
//!
//! ## Attendance records
//!
//! Records are append-only; triggers in the schema abort updates and
//! deletes. A student's status is never stored: it is the type of their most
//! recent record. [`AttendanceRepository::record_if_valid`] reads that record,
//! applies the policy and inserts inside one `BEGIN IMMEDIATE` transaction,
//! so concurrent taps for the same student are serialized.
//!
//! # Example
//!
//! ```no_run
//! use rollcall_core::AttendanceType;
//! use rollcall_storage::{
//!     AttendancePolicy, AttendanceRepository, Database, DatabaseConfig, RecordDecision,
//!     SqliteAttendanceRepository, SqliteStudentRepository, StudentRepository,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("rollcall.db")).await?;
//! let students = SqliteStudentRepository::new(db.pool().clone());
//! let attendance = SqliteAttendanceRepository::new(db.pool().clone(), AttendancePolicy::new(1));
//!
//! if let Some(student) = students.find_active_by_rfid("0009876543").await? {
//!     let decision = attendance
//!         .record_if_valid(student.id, AttendanceType::TimeIn, None, chrono::Utc::now())
//!         .await?;
//!     if let RecordDecision::Rejected(result) = decision {
//!         println!("{}", result.message);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod messages;
pub mod models;
pub mod policy;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use messages::ValidationMessages;
pub use models::{
    AttendanceRecord, AttendanceStatus, Guardian, SmsConfiguration, SmsLog, SmsLogFilter, Student,
};
pub use policy::AttendancePolicy;
pub use repositories::{
    AttendanceRepository, GuardianRepository, RecordDecision, SmsRepository,
    SqliteAttendanceRepository, SqliteGuardianRepository, SqliteSmsRepository,
    SqliteStudentRepository, StudentRepository,
};
