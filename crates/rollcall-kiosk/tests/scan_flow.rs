//! End-to-end card tap flow: SQLite store, coordinator, notification worker
//! and a mock SMS transport.
//!
//! Run with: cargo test --package rollcall-kiosk --test scan_flow

use chrono::{DateTime, Local, TimeZone, Utc};
use rollcall_core::{AttendanceType, SmsStatus};
use rollcall_hardware::CardRead;
use rollcall_kiosk::{
    AttendanceCoordinator, CoordinatorConfig, KioskEvent, NotificationDispatcher, NotifierConfig,
    ScanOutcome, event_channel, notification_channel,
};
use rollcall_sms::MockTransport;
use rollcall_storage::{
    AttendancePolicy, AttendanceRepository, Database, Guardian, GuardianRepository,
    SmsConfiguration, SmsLogFilter, SmsRepository, SqliteAttendanceRepository,
    SqliteGuardianRepository, SqliteSmsRepository, SqliteStudentRepository, Student,
    StudentRepository,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;

const CARD: &str = "0009876543";

struct Kiosk {
    _db: Database,
    student_id: i64,
    attendance: SqliteAttendanceRepository,
    sms: SqliteSmsRepository,
    transport: MockTransport,
    coordinator: AttendanceCoordinator<SqliteStudentRepository, SqliteAttendanceRepository>,
    worker: JoinHandle<()>,
    events: Receiver<KioskEvent>,
}

impl Kiosk {
    async fn start(sms_configured: bool) -> Self {
        let db = Database::in_memory().await.unwrap();
        let pool = db.pool().clone();

        let guardians = SqliteGuardianRepository::new(pool.clone());
        let students = SqliteStudentRepository::new(pool.clone());
        let attendance = SqliteAttendanceRepository::new(pool.clone(), AttendancePolicy::default());
        let sms = SqliteSmsRepository::new(pool);

        let guardian_id = guardians
            .create(&Guardian::new("Maria", "Cruz").with_cell_phone("0917-123-4567"))
            .await
            .unwrap();
        let student_id = students
            .create(
                &Student::new("2025-0001", "Juan", "Cruz")
                    .with_rfid_tag(CARD)
                    .with_guardian_id(guardian_id),
            )
            .await
            .unwrap();

        if sms_configured {
            sms.save_configuration(&SmsConfiguration::new(
                "Semaphore",
                "test-key",
                "https://gateway.test/api/v4/messages",
                "SCHOOL",
            ))
            .await
            .unwrap();
        }

        let transport = MockTransport::new();
        let (sink, events) = event_channel(32);
        let (queue, requests) = notification_channel(8);

        let dispatcher = Arc::new(NotificationDispatcher::new(
            transport.clone(),
            sms.clone(),
            sink.clone(),
            NotifierConfig::default().bulk_send_delay(Duration::ZERO),
        ));
        let worker = dispatcher.spawn_worker(requests);

        let coordinator = AttendanceCoordinator::new(
            students,
            attendance.clone(),
            sink,
            CoordinatorConfig::default(),
        )
        .with_notifications(queue);

        Self {
            _db: db,
            student_id,
            attendance,
            sms,
            transport,
            coordinator,
            worker,
            events,
        }
    }

    async fn tap(&self, card: &str, at: DateTime<Local>) -> ScanOutcome {
        self.coordinator
            .handle_card_read(CardRead::new(card, "Front Gate").with_read_at(at))
            .await
    }

    /// Stop the coordinator, wait for queued notifications, and return every
    /// event raised along the way.
    async fn finish(self) -> (Vec<KioskEvent>, MockTransport, SqliteSmsRepository) {
        let Self {
            _db,
            coordinator,
            worker,
            mut events,
            transport,
            sms,
            ..
        } = self;

        drop(coordinator);
        worker.await.unwrap();

        let mut collected = Vec::new();
        while let Ok(event) = events.try_recv() {
            collected.push(event);
        }
        (collected, transport, sms)
    }

    async fn record_count(&self) -> usize {
        self.attendance
            .find_by_student(self.student_id, 100)
            .await
            .unwrap()
            .len()
    }
}

fn at(hour: u32, minute: u32, second: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2025, 10, 27, hour, minute, second)
        .unwrap()
}

#[tokio::test]
async fn test_afternoon_tap_after_morning_time_in_records_time_out() {
    let kiosk = Kiosk::start(true).await;
    kiosk
        .attendance
        .record(
            kiosk.student_id,
            AttendanceType::TimeIn,
            None,
            at(8, 0, 0).with_timezone(&Utc),
        )
        .await
        .unwrap();

    let outcome = kiosk.tap(CARD, at(16, 30, 0)).await;

    match &outcome {
        ScanOutcome::Recorded {
            attendance_type,
            scan_time,
            ..
        } => {
            assert_eq!(*attendance_type, AttendanceType::TimeOut);
            assert_eq!(*scan_time, at(16, 30, 0));
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    let history = kiosk
        .attendance
        .find_by_student(kiosk.student_id, 10)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].kind(), Some(AttendanceType::TimeOut));
    assert_eq!(history[0].recorded_at, at(16, 30, 0).with_timezone(&Utc));

    let (events, transport, sms) = kiosk.finish().await;

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].phone, "+639171234567");
    assert_eq!(
        sent[0].message,
        "Your child Juan Cruz has left school at 16:30 on 2025-10-27. - School Attendance System"
    );

    assert!(events.iter().any(|e| matches!(
        e,
        KioskEvent::StudentScanned { success: true, attendance_type: AttendanceType::TimeOut, .. }
    )));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, KioskEvent::NotificationSent { .. }))
    );

    let logs = sms.find_logs(&SmsLogFilter::default()).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].get_status(), Some(SmsStatus::Sent));
}

#[tokio::test]
async fn test_unregistered_card_raises_rfid_error_only() {
    let kiosk = Kiosk::start(true).await;

    let outcome = kiosk.tap("ABC123", at(7, 30, 0)).await;
    assert!(matches!(outcome, ScanOutcome::UnknownCard { .. }));
    assert_eq!(kiosk.record_count().await, 0);

    let (events, transport, _) = kiosk.finish().await;
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        KioskEvent::RfidError { message, .. } if message.contains("Unknown RFID card: ABC123")
    ));
    assert_eq!(transport.sent_count(), 0);
}

#[tokio::test]
async fn test_card_match_ignores_case_and_whitespace() {
    let kiosk = Kiosk::start(true).await;
    let outcome = kiosk.tap(" 0009876543 ", at(7, 30, 0)).await;
    assert!(outcome.is_recorded());
}

#[tokio::test]
async fn test_quick_second_tap_is_rejected_without_record() {
    let kiosk = Kiosk::start(true).await;

    assert!(kiosk.tap(CARD, at(7, 30, 0)).await.is_recorded());
    let outcome = kiosk.tap(CARD, at(7, 30, 30)).await;

    match &outcome {
        ScanOutcome::Rejected {
            attendance_type,
            message,
            ..
        } => {
            assert_eq!(*attendance_type, AttendanceType::TimeOut);
            assert_eq!(message, "Please wait 1 more minute(s) before scanning again.");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(kiosk.record_count().await, 1);

    let (events, transport, _) = kiosk.finish().await;
    assert!(events.iter().any(|e| matches!(
        e,
        KioskEvent::StudentScanned { success: false, error_message: Some(m), .. }
            if m == "Please wait 1 more minute(s) before scanning again."
    )));
    assert_eq!(transport.sent_count(), 1);
}

#[tokio::test]
async fn test_alternates_through_the_day() {
    let kiosk = Kiosk::start(true).await;

    let kinds = [at(7, 0, 0), at(12, 0, 0), at(13, 0, 0), at(17, 0, 0)];
    let mut recorded = Vec::new();
    for tap_time in kinds {
        match kiosk.tap(CARD, tap_time).await {
            ScanOutcome::Recorded {
                attendance_type, ..
            } => recorded.push(attendance_type),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    assert_eq!(
        recorded,
        vec![
            AttendanceType::TimeIn,
            AttendanceType::TimeOut,
            AttendanceType::TimeIn,
            AttendanceType::TimeOut,
        ]
    );
}

#[tokio::test]
async fn test_notification_failure_keeps_record() {
    let kiosk = Kiosk::start(true).await;
    kiosk.transport.set_failure(Some("HTTP Error: 503 - unavailable"));

    assert!(kiosk.tap(CARD, at(7, 30, 0)).await.is_recorded());
    assert_eq!(kiosk.record_count().await, 1);
    let attendance = kiosk.attendance.clone();
    let student_id = kiosk.student_id;

    let (events, _, sms) = kiosk.finish().await;
    assert!(events.iter().any(|e| matches!(
        e,
        KioskEvent::NotificationError { message, .. }
            if message == "Failed to send SMS to 0917-123-4567: HTTP Error: 503 - unavailable"
    )));

    let logs = sms.find_logs(&SmsLogFilter::default()).await.unwrap();
    assert_eq!(logs[0].get_status(), Some(SmsStatus::Failed));
    assert_eq!(
        attendance.find_by_student(student_id, 10).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_unconfigured_sms_still_records() {
    let kiosk = Kiosk::start(false).await;

    assert!(kiosk.tap(CARD, at(7, 30, 0)).await.is_recorded());

    let (events, transport, _) = kiosk.finish().await;
    assert_eq!(transport.sent_count(), 0);
    assert!(events.iter().any(|e| matches!(
        e,
        KioskEvent::NotificationError { message, .. }
            if message == "SMS service is not configured or inactive"
    )));
}

#[tokio::test]
async fn test_bulk_announcement_without_recipients() {
    let db = Database::in_memory().await.unwrap();
    let sms = SqliteSmsRepository::new(db.pool().clone());
    sms.save_configuration(&SmsConfiguration::new(
        "Semaphore",
        "test-key",
        "https://gateway.test/api/v4/messages",
        "SCHOOL",
    ))
    .await
    .unwrap();
    let (sink, _events) = event_channel(4);
    let dispatcher =
        NotificationDispatcher::new(MockTransport::new(), sms, sink, NotifierConfig::default());

    let result = dispatcher.send_bulk_announcement("Test", &[]).await;

    assert!(!result.success);
    assert_eq!(result.error_message.as_deref(), Some("No valid recipients found"));
    assert_eq!(result.total_recipients, 0);
    assert_eq!(result.sent_count, 0);
    assert_eq!(result.failed_count, 0);
}
