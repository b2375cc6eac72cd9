//! Text banners for the kiosk terminal.

use crate::events::KioskEvent;
use rollcall_hardware::ReaderStatus;

/// Render an event for display. Events with nothing to show return `None`.
pub fn render(event: &KioskEvent) -> Option<String> {
    match event {
        KioskEvent::StudentScanned {
            student,
            attendance_type,
            scan_time,
            success: true,
            ..
        } => Some(format!(
            "✓ {} RECORDED\n{}\nTime: {}\nDate: {}",
            attendance_type.display_name(),
            student.full_name(),
            scan_time.format("%H:%M:%S"),
            scan_time.format("%Y-%m-%d"),
        )),
        KioskEvent::StudentScanned {
            student,
            error_message,
            success: false,
            ..
        } => Some(format!(
            "❌ ATTENDANCE FAILED\n{}\n{}",
            student.full_name(),
            error_message.as_deref().unwrap_or("Unknown error"),
        )),
        KioskEvent::RfidError { message, .. } => Some(format!("❌ RFID ERROR\n{message}")),
        KioskEvent::RfidStatusChanged { status, message } => Some(match status {
            ReaderStatus::Reading => "RFID Reader Active - Please tap your card".to_string(),
            ReaderStatus::Connected => "RFID Reader Connected - Ready to scan".to_string(),
            ReaderStatus::Error => format!("RFID Reader Error: {message}"),
            ReaderStatus::Disconnected => {
                "RFID Reader Disconnected - Contact Administrator".to_string()
            }
            ReaderStatus::Connecting => return None,
        }),
        KioskEvent::NotificationSent {
            student,
            phone_number,
            ..
        } => Some(format!(
            "✓ SMS sent to {phone_number} for student {}",
            student.full_name()
        )),
        KioskEvent::NotificationError { message, .. } => Some(format!("✗ SMS Error: {message}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use rollcall_core::AttendanceType;
    use rollcall_storage::Student;

    fn scanned(success: bool, error_message: Option<&str>) -> KioskEvent {
        KioskEvent::StudentScanned {
            student: Box::new(Student::new("S-1", "Juan", "Cruz")),
            attendance_type: AttendanceType::TimeOut,
            scan_time: Local.with_ymd_and_hms(2025, 10, 27, 16, 30, 5).unwrap(),
            rfid_code: "0009876543".to_string(),
            success,
            error_message: error_message.map(str::to_string),
        }
    }

    #[test]
    fn test_recorded_banner() {
        assert_eq!(
            render(&scanned(true, None)).unwrap(),
            "✓ TIME OUT RECORDED\nJuan Cruz\nTime: 16:30:05\nDate: 2025-10-27"
        );
    }

    #[test]
    fn test_failed_banner() {
        assert_eq!(
            render(&scanned(false, Some("Student has not timed in yet."))).unwrap(),
            "❌ ATTENDANCE FAILED\nJuan Cruz\nStudent has not timed in yet."
        );
    }

    #[test]
    fn test_status_banners() {
        let status = |status| KioskEvent::RfidStatusChanged {
            status,
            message: "No USB RFID readers found".to_string(),
        };
        assert_eq!(
            render(&status(ReaderStatus::Reading)).unwrap(),
            "RFID Reader Active - Please tap your card"
        );
        assert_eq!(
            render(&status(ReaderStatus::Error)).unwrap(),
            "RFID Reader Error: No USB RFID readers found"
        );
        assert!(render(&status(ReaderStatus::Connecting)).is_none());
    }

    #[test]
    fn test_notification_banners() {
        assert_eq!(
            render(&KioskEvent::notification_error("SMS service is not configured or inactive"))
                .unwrap(),
            "✗ SMS Error: SMS service is not configured or inactive"
        );
        assert_eq!(
            render(&KioskEvent::rfid_error("Unknown RFID card: ABC123. Student not found."))
                .unwrap(),
            "❌ RFID ERROR\nUnknown RFID card: ABC123. Student not found."
        );
    }
}
