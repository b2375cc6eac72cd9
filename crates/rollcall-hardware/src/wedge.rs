//! Keyboard-wedge card reader.
//!
//! Most low-cost USB RFID readers enumerate as a HID keyboard. The kiosk
//! receives their output as ordinary key presses on whatever thread owns the
//! input device, so the reader is split in two halves:
//!
//! - [`KeystrokeFeeder`]: cloneable, synchronous, called once per key press from
//!   any thread. It assembles presses in a mutex-guarded [`KeystrokeBuffer`].
//! - [`KeyboardWedgeReader`]: the async half implementing [`CardReader`]. It
//!   yields each completed card id.
//!
//! ```text
//! input thread ──feed(char)──► KeystrokeFeeder ──mpsc──► KeyboardWedgeReader::read_card
//!                               (Mutex<buffer>)
//! ```

use crate::error::{HardwareError, Result};
use crate::keystroke::KeystrokeBuffer;
use crate::traits::CardReader;
use crate::types::{CardRead, ReadingGate};
use std::io::Read;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Completed reads buffered between the feeder and the reader.
const WEDGE_CHANNEL_SIZE: usize = 32;

/// Async half of a keyboard-wedge reader.
#[derive(Debug)]
pub struct KeyboardWedgeReader {
    name: String,
    gate: ReadingGate,
    card_rx: mpsc::Receiver<CardRead>,
}

impl KeyboardWedgeReader {
    /// Create a reader and the feeder that drives it.
    ///
    /// The gate starts closed: key presses are ignored until the reader
    /// manager starts reading.
    pub fn new(name: impl Into<String>, timeout: Duration) -> (Self, KeystrokeFeeder) {
        let name = name.into();
        let gate = ReadingGate::new();
        let (card_tx, card_rx) = mpsc::channel(WEDGE_CHANNEL_SIZE);

        let feeder = KeystrokeFeeder {
            shared: Arc::new(FeederShared {
                name: name.clone(),
                buffer: Mutex::new(KeystrokeBuffer::new(timeout)),
                gate: gate.clone(),
                card_tx,
            }),
        };

        let reader = Self {
            name,
            gate,
            card_rx,
        };

        (reader, feeder)
    }
}

impl CardReader for KeyboardWedgeReader {
    async fn read_card(&mut self) -> Result<CardRead> {
        self.card_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected(self.name.clone()))
    }

    fn reading_gate(&self) -> ReadingGate {
        self.gate.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug)]
struct FeederShared {
    name: String,
    buffer: Mutex<KeystrokeBuffer>,
    gate: ReadingGate,
    card_tx: mpsc::Sender<CardRead>,
}

/// Synchronous input half of a keyboard-wedge reader.
#[derive(Debug, Clone)]
pub struct KeystrokeFeeder {
    shared: Arc<FeederShared>,
}

impl KeystrokeFeeder {
    /// Feed one key press observed now.
    ///
    /// Returns `false` once the reader half has been dropped.
    pub fn feed(&self, key: char) -> bool {
        self.feed_at(key, Instant::now())
    }

    /// Feed one key press observed at `now`.
    pub fn feed_at(&self, key: char, now: Instant) -> bool {
        if self.shared.card_tx.is_closed() {
            return false;
        }
        if !self.shared.gate.is_open() {
            trace!(device = %self.shared.name, "Ignoring key while not reading");
            return true;
        }

        // A panic while holding the lock leaves only a partial card id behind
        let completed = {
            let mut buffer = self
                .shared
                .buffer
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            buffer.process_key_at(key, now)
        };

        if let Some(card_id) = completed {
            debug!(device = %self.shared.name, card_id = %card_id, "Card read completed");
            let read = CardRead::new(card_id, self.shared.name.clone());
            match self.shared.card_tx.try_send(read) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(read)) => {
                    warn!(
                        device = %self.shared.name,
                        card_id = %read.card_id,
                        "Card read dropped, reader queue is full"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => return false,
            }
        }
        true
    }

    /// Feed every character of `keys` in order.
    pub fn feed_str(&self, keys: &str) -> bool {
        keys.chars().all(|c| self.feed(c))
    }
}

/// Pump bytes from `input` into `feeder` on a dedicated OS thread.
///
/// The thread ends at end of input, on a read error, or once the reader has
/// been dropped.
pub fn spawn_input_source<R>(mut input: R, feeder: KeystrokeFeeder) -> std::thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut byte = [0u8; 1];
        loop {
            match input.read(&mut byte) {
                Ok(0) => {
                    debug!("Keystroke input reached end of stream");
                    break;
                }
                Ok(_) => {
                    if !feeder.feed(char::from(byte[0])) {
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "Keystroke input failed");
                    break;
                }
            }
        }
    })
}

/// Read key presses from the process's standard input.
///
/// A keyboard-wedge reader plugged into the kiosk types into the terminal, so
/// stdin carries its output.
pub fn spawn_stdin_source(feeder: KeystrokeFeeder) -> std::thread::JoinHandle<()> {
    spawn_input_source(std::io::stdin(), feeder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_feed_when_reading() {
        let (mut reader, feeder) = KeyboardWedgeReader::new("Wedge", Duration::from_millis(100));
        reader.reading_gate().open();

        assert!(feeder.feed_str("ABC123\r"));

        let read = reader.read_card().await.unwrap();
        assert_eq!(read.card_id, "ABC123");
        assert_eq!(read.source, "Wedge");
    }

    #[tokio::test]
    async fn test_keys_ignored_while_not_reading() {
        let (mut reader, feeder) = KeyboardWedgeReader::new("Wedge", Duration::from_millis(100));

        feeder.feed_str("IGNORED\r");
        reader.reading_gate().open();
        feeder.feed_str("KEPT\r");

        let read = reader.read_card().await.unwrap();
        assert_eq!(read.card_id, "KEPT");
    }

    #[tokio::test]
    async fn test_feed_from_other_thread() {
        let (mut reader, feeder) = KeyboardWedgeReader::new("Wedge", Duration::from_millis(100));
        reader.reading_gate().open();

        let worker = std::thread::spawn(move || feeder.feed_str("0009876543\n"));
        assert!(worker.join().unwrap());

        let read = reader.read_card().await.unwrap();
        assert_eq!(read.card_id, "0009876543");
    }

    #[tokio::test]
    async fn test_input_source_pumps_bytes() {
        let (mut reader, feeder) = KeyboardWedgeReader::new("Wedge", Duration::from_millis(100));
        reader.reading_gate().open();

        let input = std::io::Cursor::new(b"111\r\n222\n".to_vec());
        spawn_input_source(input, feeder).join().unwrap();

        assert_eq!(reader.read_card().await.unwrap().card_id, "111");
        assert_eq!(reader.read_card().await.unwrap().card_id, "222");
    }

    #[tokio::test]
    async fn test_reader_reports_disconnect_when_feeders_dropped() {
        let (mut reader, feeder) = KeyboardWedgeReader::new("Wedge", Duration::from_millis(100));
        drop(feeder);

        let err = reader.read_card().await.unwrap_err();
        assert!(matches!(err, HardwareError::Disconnected { .. }));
    }

    #[test]
    fn test_feed_after_reader_dropped() {
        let (reader, feeder) = KeyboardWedgeReader::new("Wedge", Duration::from_millis(100));
        drop(reader);
        assert!(!feeder.feed('A'));
    }
}
