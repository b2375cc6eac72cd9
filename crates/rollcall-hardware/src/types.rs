//! Common types shared by card readers, scanners and the reader manager.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Connection status of the card reader as shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReaderStatus {
    Disconnected,
    Connecting,
    Connected,
    Reading,
    Error,
}

impl fmt::Display for ReaderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReaderStatus::Disconnected => "Disconnected",
            ReaderStatus::Connecting => "Connecting",
            ReaderStatus::Connected => "Connected",
            ReaderStatus::Reading => "Reading",
            ReaderStatus::Error => "Error",
        };
        f.write_str(s)
    }
}

/// A completed card read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRead {
    /// Trimmed card identifier as typed by the reader.
    pub card_id: String,

    /// Local wall-clock time at which the terminator key arrived.
    pub read_at: DateTime<Local>,

    /// Name of the device that produced the read.
    pub source: String,

    /// Bytes of the card identifier as received.
    pub raw_data: Vec<u8>,
}

impl CardRead {
    /// Create a card read stamped with the current local time.
    pub fn new(card_id: impl Into<String>, source: impl Into<String>) -> Self {
        let card_id = card_id.into();
        Self {
            raw_data: card_id.as_bytes().to_vec(),
            card_id,
            read_at: Local::now(),
            source: source.into(),
        }
    }

    /// Override the read time.
    #[must_use]
    pub fn with_read_at(mut self, read_at: DateTime<Local>) -> Self {
        self.read_at = read_at;
        self
    }
}

/// Event emitted by the reader manager.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ReaderEvent {
    /// A card was read while the reader was listening.
    CardRead(CardRead),

    /// Reader status changed.
    StatusChanged {
        status: ReaderStatus,
        message: String,
    },

    /// Non-fatal reader error, shown to the operator.
    Error { message: String },
}

impl ReaderEvent {
    pub fn status(status: ReaderStatus, message: impl Into<String>) -> Self {
        Self::StatusChanged {
            status,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Shared on/off switch deciding whether a reader accepts input.
///
/// The reader owns one and hands clones to whoever controls the reading
/// state. Keystrokes arriving while the gate is closed are discarded.
#[derive(Debug, Clone, Default)]
pub struct ReadingGate(Arc<AtomicBool>);

impl ReadingGate {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Open the gate. Returns the previous state.
    pub fn open(&self) -> bool {
        self.0.swap(true, Ordering::AcqRel)
    }

    /// Close the gate. Returns the previous state.
    pub fn close(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}
