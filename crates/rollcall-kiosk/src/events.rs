//! Events raised by the kiosk core for the presentation layer.
//!
//! The coordinator and dispatcher never call into the display. They push
//! [`KioskEvent`]s onto a bounded channel and whoever renders the kiosk
//! drains it.

use chrono::{DateTime, Local};
use rollcall_core::AttendanceType;
use rollcall_hardware::ReaderStatus;
use rollcall_storage::Student;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Event emitted by the kiosk core
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum KioskEvent {
    /// A known student tapped; `success` says whether attendance was recorded
    StudentScanned {
        student: Box<Student>,
        attendance_type: AttendanceType,
        scan_time: DateTime<Local>,
        rfid_code: String,
        success: bool,
        error_message: Option<String>,
    },

    /// A tap could not be matched to a student
    RfidError {
        message: String,
        source: Option<String>,
    },

    /// Reader connectivity changed
    RfidStatusChanged {
        status: ReaderStatus,
        message: String,
    },

    /// A guardian notification was accepted by the gateway
    NotificationSent {
        student: Box<Student>,
        phone_number: String,
        message: String,
        sent_at: DateTime<Local>,
        message_id: Option<String>,
    },

    /// A guardian notification could not be sent
    NotificationError {
        message: String,
        timestamp: DateTime<Local>,
    },
}

impl KioskEvent {
    pub fn rfid_error(message: impl Into<String>) -> Self {
        Self::RfidError {
            message: message.into(),
            source: None,
        }
    }

    pub fn notification_error(message: impl Into<String>) -> Self {
        Self::NotificationError {
            message: message.into(),
            timestamp: Local::now(),
        }
    }
}

/// Sending half of the kiosk event channel
///
/// Emitting never blocks: when the channel is full the event is dropped
/// with a warning, so a stalled display cannot hold up attendance.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<KioskEvent>,
}

impl EventSink {
    pub fn emit(&self, event: KioskEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(?event, "Kiosk event dropped, channel is full");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Kiosk event channel closed");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Create a kiosk event channel with room for `capacity` pending events.
pub fn event_channel(capacity: usize) -> (EventSink, mpsc::Receiver<KioskEvent>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSink { tx }, rx)
}
