//! Enum wrappers for reader and scanner dispatch.
//!
//! Native `async fn` in traits is not object safe, so `Box<dyn CardReader>`
//! is not available. These enums give the reader manager concrete types to
//! spawn while still accepting any supported implementation.

use crate::mock::{MockCardReader, MockScanner};
use crate::scanner::ProcInputScanner;
#[cfg(feature = "hardware-hid")]
use crate::scanner::HidApiScanner;
use crate::traits::{CardReader, DeviceScanner};
use crate::types::{CardRead, ReadingGate};
use crate::wedge::KeyboardWedgeReader;
use crate::Result;

/// Any supported card reader.
///
/// # Examples
///
/// ```
/// use rollcall_hardware::devices::AnyCardReader;
/// use rollcall_hardware::mock::MockCardReader;
/// use rollcall_hardware::traits::CardReader;
///
/// let (reader, _handle) = MockCardReader::new();
/// let reader = AnyCardReader::Mock(reader);
/// assert_eq!(reader.name(), "Mock RFID Reader");
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyCardReader {
    /// USB HID reader typing into the keyboard input.
    Keyboard(KeyboardWedgeReader),

    /// Mock reader for development and testing.
    Mock(MockCardReader),
}

impl CardReader for AnyCardReader {
    async fn read_card(&mut self) -> Result<CardRead> {
        match self {
            Self::Keyboard(reader) => reader.read_card().await,
            Self::Mock(reader) => reader.read_card().await,
        }
    }

    fn reading_gate(&self) -> ReadingGate {
        match self {
            Self::Keyboard(reader) => reader.reading_gate(),
            Self::Mock(reader) => reader.reading_gate(),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Keyboard(reader) => reader.name(),
            Self::Mock(reader) => reader.name(),
        }
    }
}

/// Any supported device scanner.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyDeviceScanner {
    /// Linux `/proc/bus/input/devices`.
    ProcInput(ProcInputScanner),

    /// hidapi enumeration.
    #[cfg(feature = "hardware-hid")]
    Hid(HidApiScanner),

    /// Mock scanner for development and testing.
    Mock(MockScanner),
}

impl DeviceScanner for AnyDeviceScanner {
    async fn scan(&self) -> Result<Vec<String>> {
        match self {
            Self::ProcInput(scanner) => scanner.scan().await,
            #[cfg(feature = "hardware-hid")]
            Self::Hid(scanner) => scanner.scan().await,
            Self::Mock(scanner) => scanner.scan().await,
        }
    }
}
