//! Keystroke assembly for keyboard-emulating card readers.
//!
//! A USB HID reader in keyboard mode "types" the card id as a fast burst of
//! key presses followed by Enter. [`KeystrokeBuffer`] turns those presses back
//! into card ids:
//!
//! - ASCII letters and digits are appended to the buffer
//! - `'\r'` or `'\n'` completes the read: the trimmed buffer is returned if
//!   non-empty, and the buffer is cleared either way
//! - any other character is dropped
//! - a gap longer than the timeout between two presses discards whatever was
//!   buffered before handling the new key
//!
//! The buffer itself is not synchronized. Callers that receive keys on an
//! input thread wrap it in a mutex (see [`crate::wedge`]).
//!
//! # Examples
//!
//! ```
//! use rollcall_hardware::keystroke::KeystrokeBuffer;
//! use std::time::{Duration, Instant};
//!
//! let mut buffer = KeystrokeBuffer::new(Duration::from_millis(100));
//! let t0 = Instant::now();
//!
//! for (i, key) in "ABC123".chars().enumerate() {
//!     assert_eq!(buffer.process_key_at(key, t0 + Duration::from_millis(i as u64)), None);
//! }
//! let card = buffer.process_key_at('\r', t0 + Duration::from_millis(10));
//! assert_eq!(card.as_deref(), Some("ABC123"));
//! ```

use rollcall_core::constants::CARD_READ_TIMEOUT_MS;
use std::time::{Duration, Instant};

/// Accumulates keystrokes into card identifiers.
#[derive(Debug, Clone)]
pub struct KeystrokeBuffer {
    buffer: String,
    last_key_at: Option<Instant>,
    timeout: Duration,
}

impl KeystrokeBuffer {
    /// Create a buffer with the given inter-key timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            buffer: String::new(),
            last_key_at: None,
            timeout,
        }
    }

    /// Handle one key press at the current instant.
    pub fn process_key(&mut self, key: char) -> Option<String> {
        self.process_key_at(key, Instant::now())
    }

    /// Handle one key press observed at `now`.
    ///
    /// Returns the completed card id when `key` is a line terminator and the
    /// buffer held something.
    pub fn process_key_at(&mut self, key: char, now: Instant) -> Option<String> {
        if let Some(last) = self.last_key_at
            && now.saturating_duration_since(last) > self.timeout
        {
            self.buffer.clear();
        }
        self.last_key_at = Some(now);

        match key {
            '\r' | '\n' => {
                let card = self.buffer.trim().to_string();
                self.buffer.clear();
                (!card.is_empty()).then_some(card)
            }
            c if c.is_ascii_alphanumeric() => {
                self.buffer.push(c);
                None
            }
            _ => None,
        }
    }

    /// Characters buffered so far.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Drop any partial read.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.last_key_at = None;
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for KeystrokeBuffer {
    fn default() -> Self {
        Self::new(Duration::from_millis(CARD_READ_TIMEOUT_MS))
    }
}
