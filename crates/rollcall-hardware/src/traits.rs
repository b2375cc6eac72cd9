//! Card reader and device scanner traits.
//!
//! Both traits use native `async fn` methods (edition 2024), so they are not
//! object safe. Concrete dispatch goes through the enums in
//! [`crate::devices`].

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{CardRead, ReadingGate};

/// A source of completed card reads.
pub trait CardReader: Send + Sync {
    /// Wait for the next completed card read.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Disconnected` once the input source is gone.
    async fn read_card(&mut self) -> Result<CardRead>;

    /// Gate controlling whether this reader currently accepts input.
    fn reading_gate(&self) -> ReadingGate;

    /// Device name, for status messages.
    fn name(&self) -> &str;
}

/// Discovers connected card readers by device name.
pub trait DeviceScanner: Send + Sync {
    /// Return the names of the readers currently present.
    ///
    /// An empty list means no reader is connected.
    async fn scan(&self) -> Result<Vec<String>>;
}
