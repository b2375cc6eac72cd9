//! Mock card reader driven programmatically.

use crate::{
    HardwareError, Result,
    traits::CardReader,
    types::{CardRead, ReadingGate},
};
use tokio::sync::mpsc;

/// Mock card reader for testing and development.
///
/// Cards are presented through the paired [`MockCardReaderHandle`].
///
/// # Examples
///
/// ```
/// use rollcall_hardware::mock::MockCardReader;
/// use rollcall_hardware::traits::CardReader;
///
/// #[tokio::main]
/// async fn main() -> rollcall_hardware::Result<()> {
///     let (mut reader, handle) = MockCardReader::new();
///
///     handle.present_card("ABC123").await?;
///
///     let read = reader.read_card().await?;
///     assert_eq!(read.card_id, "ABC123");
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockCardReader {
    event_rx: mpsc::Receiver<CardRead>,
    name: String,
    gate: ReadingGate,
}

impl MockCardReader {
    /// Create a mock reader with the default name.
    pub fn new() -> (Self, MockCardReaderHandle) {
        Self::with_name("Mock RFID Reader")
    }

    /// Create a mock reader with a custom name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockCardReaderHandle) {
        let name = name.into();
        let (event_tx, event_rx) = mpsc::channel(32);

        let reader = Self {
            event_rx,
            name: name.clone(),
            gate: ReadingGate::new(),
        };
        let handle = MockCardReaderHandle { event_tx, name };

        (reader, handle)
    }
}

impl CardReader for MockCardReader {
    async fn read_card(&mut self) -> Result<CardRead> {
        self.event_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected("mock reader channel closed"))
    }

    fn reading_gate(&self) -> ReadingGate {
        self.gate.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Handle for presenting cards to a [`MockCardReader`].
#[derive(Debug, Clone)]
pub struct MockCardReaderHandle {
    event_tx: mpsc::Sender<CardRead>,
    name: String,
}

impl MockCardReaderHandle {
    /// Present a card, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Disconnected` if the reader has been dropped.
    pub async fn present_card(&self, card_id: impl Into<String>) -> Result<()> {
        self.present(CardRead::new(card_id, self.name.clone()))
            .await
    }

    /// Present a fully specified card read.
    pub async fn present(&self, read: CardRead) -> Result<()> {
        self.event_tx
            .send(read)
            .await
            .map_err(|_| HardwareError::disconnected(self.name.clone()))
    }
}
