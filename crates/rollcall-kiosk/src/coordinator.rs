//! Turns card taps into attendance records.
//!
//! For every [`CardRead`] the coordinator resolves the student, proposes the
//! next attendance type, and asks the store to validate and record it in one
//! transaction. The outcome is returned as a [`ScanOutcome`] and reported to
//! the display as a [`KioskEvent`]. Successful records are handed to the
//! notification queue without waiting for delivery.

use crate::events::{EventSink, KioskEvent};
use crate::notifier::{NotificationQueue, NotificationRequest};
use crate::proposal::{attendance_by_clock, next_attendance};
use chrono::{DateTime, Local, Utc};
use rollcall_core::AttendanceType;
use rollcall_hardware::CardRead;
use rollcall_storage::{AttendanceRepository, RecordDecision, StudentRepository, Student};
use tracing::{debug, info, warn};

/// Coordinator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Queue a guardian SMS after each recorded event
    pub notify_guardians: bool,

    /// Store the reader name in the record notes
    pub record_source: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            notify_guardians: true,
            record_source: false,
        }
    }
}

impl CoordinatorConfig {
    #[must_use]
    pub fn notify_guardians(mut self, enabled: bool) -> Self {
        self.notify_guardians = enabled;
        self
    }

    #[must_use]
    pub fn record_source(mut self, enabled: bool) -> Self {
        self.record_source = enabled;
        self
    }
}

/// What happened to one card tap
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// Attendance was recorded
    Recorded {
        student: Box<Student>,
        attendance_type: AttendanceType,
        record_id: i64,
        scan_time: DateTime<Local>,
    },

    /// No active student holds the card
    UnknownCard { card_id: String },

    /// The attendance rules refused the event
    Rejected {
        student: Box<Student>,
        attendance_type: AttendanceType,
        message: String,
    },

    /// The event was valid but could not be saved
    RecordFailed {
        student: Box<Student>,
        attendance_type: AttendanceType,
        message: String,
    },

    /// The student lookup itself failed
    LookupFailed { message: String },
}

impl ScanOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }
}

/// Attendance coordinator
pub struct AttendanceCoordinator<S, A> {
    students: S,
    attendance: A,
    events: EventSink,
    notifications: Option<NotificationQueue>,
    config: CoordinatorConfig,
}

impl<S, A> AttendanceCoordinator<S, A>
where
    S: StudentRepository,
    A: AttendanceRepository,
{
    pub fn new(students: S, attendance: A, events: EventSink, config: CoordinatorConfig) -> Self {
        Self {
            students,
            attendance,
            events,
            notifications: None,
            config,
        }
    }

    /// Hand recorded events to a notification worker.
    #[must_use]
    pub fn with_notifications(mut self, queue: NotificationQueue) -> Self {
        self.notifications = Some(queue);
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Process one card tap.
    ///
    /// Never fails: every error is reported as an event and an outcome.
    pub async fn handle_card_read(&self, read: CardRead) -> ScanOutcome {
        let scan_time = read.read_at;
        debug!(card_id = %read.card_id, source = %read.source, "Processing card tap");

        let student = match self.students.find_active_by_rfid(&read.card_id).await {
            Ok(Some(student)) => student,
            Ok(None) => {
                let message = format!("Unknown RFID card: {}. Student not found.", read.card_id);
                info!(card_id = %read.card_id, "Unknown card");
                self.events.emit(KioskEvent::RfidError {
                    message,
                    source: Some(read.source),
                });
                return ScanOutcome::UnknownCard {
                    card_id: read.card_id,
                };
            }
            Err(e) => {
                let message = format!("Error processing RFID scan: {e}");
                warn!(card_id = %read.card_id, error = %e, "Student lookup failed");
                self.events.emit(KioskEvent::RfidError {
                    message: message.clone(),
                    source: Some(read.source),
                });
                return ScanOutcome::LookupFailed { message };
            }
        };

        let attendance_type = self.propose(&student, scan_time).await;
        let notes = self.config.record_source.then_some(read.source.as_str());

        let decision = self
            .attendance
            .record_if_valid(
                student.id,
                attendance_type,
                notes,
                scan_time.with_timezone(&Utc),
            )
            .await;

        match decision {
            Ok(RecordDecision::Recorded { record_id }) => {
                info!(
                    student_id = student.id,
                    kind = %attendance_type,
                    record_id,
                    "Attendance recorded"
                );
                self.emit_scanned(&student, attendance_type, scan_time, &read.card_id, None);
                self.notify(&student, attendance_type, scan_time);
                ScanOutcome::Recorded {
                    student: Box::new(student),
                    attendance_type,
                    record_id,
                    scan_time,
                }
            }
            Ok(RecordDecision::Rejected(validation)) => {
                info!(
                    student_id = student.id,
                    kind = %attendance_type,
                    reason = %validation.message,
                    "Attendance rejected"
                );
                self.emit_scanned(
                    &student,
                    attendance_type,
                    scan_time,
                    &read.card_id,
                    Some(validation.message.clone()),
                );
                ScanOutcome::Rejected {
                    student: Box::new(student),
                    attendance_type,
                    message: validation.message,
                }
            }
            Err(e) => {
                let message = format!("Failed to record attendance: {e}");
                warn!(student_id = student.id, error = %e, "Attendance write failed");
                self.emit_scanned(
                    &student,
                    attendance_type,
                    scan_time,
                    &read.card_id,
                    Some(message.clone()),
                );
                ScanOutcome::RecordFailed {
                    student: Box::new(student),
                    attendance_type,
                    message,
                }
            }
        }
    }

    /// Next type from the current status, or from the clock if that fails.
    async fn propose(&self, student: &Student, scan_time: DateTime<Local>) -> AttendanceType {
        match self.attendance.current_status(student.id).await {
            Ok(status) => next_attendance(status.as_ref()),
            Err(e) => {
                let kind = attendance_by_clock(scan_time.time());
                warn!(
                    student_id = student.id,
                    error = %e,
                    fallback = %kind,
                    "Status lookup failed, proposing by time of day"
                );
                kind
            }
        }
    }

    fn emit_scanned(
        &self,
        student: &Student,
        attendance_type: AttendanceType,
        scan_time: DateTime<Local>,
        card_id: &str,
        error_message: Option<String>,
    ) {
        self.events.emit(KioskEvent::StudentScanned {
            student: Box::new(student.clone()),
            attendance_type,
            scan_time,
            rfid_code: card_id.to_string(),
            success: error_message.is_none(),
            error_message,
        });
    }

    fn notify(&self, student: &Student, attendance_type: AttendanceType, scan_time: DateTime<Local>) {
        if !self.config.notify_guardians {
            return;
        }
        if let Some(queue) = &self.notifications {
            queue.enqueue(NotificationRequest {
                student: student.clone(),
                attendance_type,
                scan_time,
            });
        }
    }
}
