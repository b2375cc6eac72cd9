//! Guardian notifications over SMS.
//!
//! The dispatcher checks that a student can be notified, formats the
//! message, and sends it through an [`SmsTransport`]. Every send is
//! bracketed by an SMS log entry: inserted as Pending before the gateway is
//! called, then updated to Sent or Failed. A logging failure is reported in
//! the trace and never fails the send.
//!
//! Attendance notifications are fire-and-forget for the coordinator: it
//! pushes a [`NotificationRequest`] onto a [`NotificationQueue`] and a worker
//! task owned by the dispatcher sends it.

use crate::events::{EventSink, KioskEvent};
use chrono::{DateTime, Local};
use rollcall_core::constants::{BULK_SEND_DELAY_MS, MESSAGE_SIGNATURE};
use rollcall_core::{AttendanceType, SmsStatus, format_clock, format_date};
use rollcall_sms::{SmsResult, SmsSettings, SmsTransport, format_phone_number};
use rollcall_storage::{SmsConfiguration, SmsRepository, Student};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const NOT_CONFIGURED: &str = "SMS service is not configured or inactive";
const NO_RECIPIENTS: &str = "No valid recipients found";

/// Capacity of the notification queue
pub const DEFAULT_QUEUE_SIZE: usize = 64;

/// Dispatcher settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    /// Pause between messages of a bulk announcement
    pub bulk_send_delay: Duration,

    /// Pending attendance notifications before new ones are dropped
    pub queue_size: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            bulk_send_delay: Duration::from_millis(BULK_SEND_DELAY_MS),
            queue_size: DEFAULT_QUEUE_SIZE,
        }
    }
}

impl NotifierConfig {
    #[must_use]
    pub fn bulk_send_delay(mut self, delay: Duration) -> Self {
        self.bulk_send_delay = delay;
        self
    }

    #[must_use]
    pub fn queue_size(mut self, size: usize) -> Self {
        self.queue_size = size.max(1);
        self
    }
}

/// Summary of a bulk announcement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkResult {
    /// True only when every recipient was sent to
    pub success: bool,
    pub total_recipients: usize,
    pub sent_count: usize,
    pub failed_count: usize,
    pub error_message: Option<String>,
    pub processed_at: DateTime<Local>,
}

impl BulkResult {
    fn failure(message: &str) -> Self {
        Self {
            success: false,
            total_recipients: 0,
            sent_count: 0,
            failed_count: 0,
            error_message: Some(message.to_string()),
            processed_at: Local::now(),
        }
    }
}

/// Text sent to a guardian after a recorded tap.
///
/// ```
/// use chrono::{Local, TimeZone};
/// use rollcall_core::AttendanceType;
/// use rollcall_kiosk::notifier::attendance_message;
/// use rollcall_storage::Student;
///
/// let student = Student::new("S-1", "Juan", "Cruz");
/// let at = Local.with_ymd_and_hms(2025, 10, 27, 7, 45, 0).unwrap();
/// assert_eq!(
///     attendance_message(&student, AttendanceType::TimeIn, &at),
///     "Your child Juan Cruz has arrived at school at 07:45 on 2025-10-27. - School Attendance System"
/// );
/// ```
pub fn attendance_message(
    student: &Student,
    kind: AttendanceType,
    scan_time: &DateTime<Local>,
) -> String {
    format!(
        "Your child {} {} has {} school at {} on {}. - {MESSAGE_SIGNATURE}",
        student.first_name,
        student.last_name,
        kind.arrival_phrase(),
        format_clock(scan_time),
        format_date(scan_time),
    )
}

/// Text sent to each guardian for an announcement.
pub fn announcement_message(student: &Student, message: &str) -> String {
    format!(
        "Dear Parent/Guardian of {} {}, {message} - {MESSAGE_SIGNATURE}",
        student.first_name, student.last_name
    )
}

/// Attendance notification waiting to be sent
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRequest {
    pub student: Student,
    pub attendance_type: AttendanceType,
    pub scan_time: DateTime<Local>,
}

/// Sending half of the notification queue
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<NotificationRequest>,
}

impl NotificationQueue {
    /// Queue a notification without waiting. Returns false if it was dropped.
    pub fn enqueue(&self, request: NotificationRequest) -> bool {
        match self.tx.try_send(request) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(request)) => {
                warn!(student_id = request.student.id, "Notification queue full, dropping");
                false
            }
            Err(mpsc::error::TrySendError::Closed(request)) => {
                warn!(student_id = request.student.id, "Notification worker stopped, dropping");
                false
            }
        }
    }
}

/// Create a notification queue with room for `capacity` requests.
pub fn notification_channel(
    capacity: usize,
) -> (NotificationQueue, mpsc::Receiver<NotificationRequest>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (NotificationQueue { tx }, rx)
}

/// Sends attendance notifications and announcements to guardians
pub struct NotificationDispatcher<T, R> {
    transport: T,
    sms: R,
    events: EventSink,
    config: NotifierConfig,
}

impl<T, R> NotificationDispatcher<T, R>
where
    T: SmsTransport,
    R: SmsRepository,
{
    pub fn new(transport: T, sms: R, events: EventSink, config: NotifierConfig) -> Self {
        Self {
            transport,
            sms,
            events,
            config,
        }
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// Load the active gateway settings, if SMS is enabled.
    async fn active_settings(&self) -> Option<SmsSettings> {
        match self.sms.active_configuration().await {
            Ok(Some(config)) if config.is_active => Some(settings_from(&config)),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Failed to load SMS configuration");
                None
            }
        }
    }

    /// Notify the guardian of `student` about a recorded event.
    ///
    /// Returns whether the gateway accepted the message. The outcome is also
    /// reported as a [`KioskEvent`].
    pub async fn send_attendance_notification(
        &self,
        student: &Student,
        kind: AttendanceType,
        scan_time: DateTime<Local>,
    ) -> bool {
        let Some(guardian) = student.guardian.as_ref().filter(|g| g.is_active) else {
            return self.fail(format!(
                "No guardian found for student {} {}",
                student.first_name, student.last_name
            ));
        };

        let Some(phone) = guardian.notification_phone() else {
            return self.fail(format!(
                "No phone number found for guardian of {} {}",
                student.first_name, student.last_name
            ));
        };

        let Some(settings) = self.active_settings().await else {
            return self.fail(NOT_CONFIGURED.to_string());
        };

        let message = attendance_message(student, kind, &scan_time);
        let result = self
            .send_logged(&settings, Some(student.id), phone, &message)
            .await;

        if result.success {
            info!(
                student_id = student.id,
                kind = %kind,
                message_id = ?result.message_id,
                "Guardian notified"
            );
            self.events.emit(KioskEvent::NotificationSent {
                student: Box::new(student.clone()),
                phone_number: phone.to_string(),
                message,
                sent_at: result.sent_at,
                message_id: result.message_id,
            });
            true
        } else {
            self.fail(format!(
                "Failed to send SMS to {phone}: {}",
                result.error_text()
            ))
        }
    }

    /// Send `message` to the guardian of every recipient that has a phone.
    ///
    /// Messages go out one at a time with the configured delay between them.
    pub async fn send_bulk_announcement(&self, message: &str, recipients: &[Student]) -> BulkResult {
        let Some(settings) = self.active_settings().await else {
            return BulkResult::failure(NOT_CONFIGURED);
        };

        let reachable: Vec<(&Student, &str)> = recipients
            .iter()
            .filter_map(|student| student.guardian_phone().map(|phone| (student, phone)))
            .collect();

        if reachable.is_empty() {
            return BulkResult::failure(NO_RECIPIENTS);
        }

        let mut sent_count = 0;
        let mut failed_count = 0;

        for (index, (student, phone)) in reachable.iter().enumerate() {
            if index > 0 && !self.config.bulk_send_delay.is_zero() {
                tokio::time::sleep(self.config.bulk_send_delay).await;
            }

            let text = announcement_message(student, message);
            let result = self
                .send_logged(&settings, Some(student.id), phone, &text)
                .await;
            if result.success {
                sent_count += 1;
            } else {
                failed_count += 1;
            }
        }

        info!(
            total = reachable.len(),
            sent_count, failed_count, "Bulk announcement processed"
        );

        BulkResult {
            success: failed_count == 0,
            total_recipients: reachable.len(),
            sent_count,
            failed_count,
            error_message: (failed_count > 0)
                .then(|| format!("{failed_count} messages failed to send")),
            processed_at: Local::now(),
        }
    }

    /// Spawn the worker that drains the notification queue.
    ///
    /// The worker stops once every [`NotificationQueue`] clone is dropped and
    /// the queue is empty.
    pub fn spawn_worker(self: Arc<Self>, mut rx: mpsc::Receiver<NotificationRequest>) -> JoinHandle<()>
    where
        T: 'static,
        R: 'static,
    {
        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                self.send_attendance_notification(
                    &request.student,
                    request.attendance_type,
                    request.scan_time,
                )
                .await;
            }
            debug!("Notification worker stopped");
        })
    }

    async fn send_logged(
        &self,
        settings: &SmsSettings,
        student_id: Option<i64>,
        phone: &str,
        message: &str,
    ) -> SmsResult {
        let number = format_phone_number(phone);
        let log_id = match self.sms.log_pending(student_id, &number, message).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, phone = %number, "Failed to create SMS log entry");
                None
            }
        };

        let result = self.transport.send(settings, phone, message).await;

        if let Some(log_id) = log_id {
            let status = if result.success {
                SmsStatus::Sent
            } else {
                SmsStatus::Failed
            };
            if let Err(e) = self
                .sms
                .update_log(
                    log_id,
                    status,
                    result.error_message.as_deref(),
                    result.provider_response.as_deref(),
                )
                .await
            {
                warn!(error = %e, log_id, "Failed to update SMS log entry");
            }
        }

        result
    }

    fn fail(&self, message: String) -> bool {
        warn!(%message, "Notification not sent");
        self.events.emit(KioskEvent::notification_error(message));
        false
    }
}

fn settings_from(config: &SmsConfiguration) -> SmsSettings {
    SmsSettings::new(&config.api_key, &config.api_url, &config.sender_name)
}
