//! RFID attendance kiosk.
//!
//! A student taps a card on the reader, the kiosk records a time-in or
//! time-out, and the guardian gets an SMS.
//!
//! - [`coordinator::AttendanceCoordinator`]: card read to attendance record
//! - [`notifier::NotificationDispatcher`]: guardian SMS and bulk announcements
//! - [`kiosk::KioskRuntime`]: the loop between the reader manager and the
//!   coordinator
//! - [`events::KioskEvent`]: everything the display needs to show
//! - [`config::KioskConfig`]: environment configuration
//!
//! # Example
//!
//! ```no_run
//! use rollcall_kiosk::{
//!     AttendanceCoordinator, KioskConfig, KioskRuntime, event_channel,
//! };
//! use rollcall_storage::{Database, SqliteAttendanceRepository, SqliteStudentRepository};
//!
//! # async fn run(reader: rollcall_hardware::ReaderHandle) -> anyhow::Result<()> {
//! let config = KioskConfig::from_env()?;
//! let db = Database::new(config.database_config()).await?;
//! let (events, _display) = event_channel(64);
//!
//! let coordinator = AttendanceCoordinator::new(
//!     SqliteStudentRepository::new(db.pool().clone()),
//!     SqliteAttendanceRepository::new(db.pool().clone(), config.attendance_policy()),
//!     events.clone(),
//!     config.coordinator_config(),
//! );
//! KioskRuntime::new(coordinator, events)
//!     .run(reader, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod banner;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod kiosk;
pub mod notifier;
pub mod proposal;

pub use config::KioskConfig;
pub use coordinator::{AttendanceCoordinator, CoordinatorConfig, ScanOutcome};
pub use error::{KioskError, Result};
pub use events::{EventSink, KioskEvent, event_channel};
pub use kiosk::KioskRuntime;
pub use notifier::{
    BulkResult, NotificationDispatcher, NotificationQueue, NotificationRequest, NotifierConfig,
    notification_channel,
};
