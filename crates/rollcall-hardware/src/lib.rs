//! Card reader layer for the attendance kiosk.
//!
//! School kiosks use cheap USB RFID readers that emulate a keyboard: a tap
//! "types" the card id followed by Enter. This crate turns those keystrokes
//! back into card reads, discovers readers by device name, and watches for
//! disconnects.
//!
//! # Components
//!
//! - [`keystroke::KeystrokeBuffer`]: assembles key presses into card ids
//! - [`wedge::KeyboardWedgeReader`] and [`wedge::KeystrokeFeeder`]: the async
//!   reader and its thread-safe input half
//! - [`scanner`]: device discovery by name, with a keyboard-emulation fallback
//! - [`manager::ReaderManager`]: runs the reader and the connection monitor,
//!   reporting everything as [`ReaderEvent`]s
//! - [`mock`]: programmable reader and scanner for tests
//!
//! # Error Handling
//!
//! Operations return [`Result<T>`][error::Result] with [`HardwareError`]. The
//! manager converts failures into [`ReaderEvent::Error`] and
//! [`ReaderEvent::StatusChanged`] events instead of stopping the kiosk.
//!
//! # Example
//!
//! ```no_run
//! use rollcall_hardware::devices::{AnyCardReader, AnyDeviceScanner};
//! use rollcall_hardware::manager::{ReaderConfig, ReaderManager};
//! use rollcall_hardware::scanner::ProcInputScanner;
//! use rollcall_hardware::wedge::{KeyboardWedgeReader, spawn_stdin_source};
//! use rollcall_hardware::ReaderEvent;
//!
//! #[tokio::main]
//! async fn main() -> rollcall_hardware::Result<()> {
//!     let config = ReaderConfig::default();
//!     let (reader, feeder) = KeyboardWedgeReader::new("USB RFID Reader", config.card_timeout);
//!     spawn_stdin_source(feeder);
//!
//!     let manager = ReaderManager::new(
//!         config,
//!         AnyCardReader::Keyboard(reader),
//!         AnyDeviceScanner::ProcInput(ProcInputScanner::new(true)),
//!     );
//!     let mut handle = manager.start();
//!
//!     while let Some(event) = handle.recv().await {
//!         if let ReaderEvent::CardRead(read) = event {
//!             println!("Card {}", read.card_id);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod devices;
pub mod error;
pub mod keystroke;
pub mod manager;
pub mod mock;
pub mod scanner;
pub mod traits;
pub mod types;
pub mod wedge;

pub use error::{HardwareError, Result};
pub use keystroke::KeystrokeBuffer;
pub use manager::{ReaderConfig, ReaderControl, ReaderHandle, ReaderManager};
pub use traits::{CardReader, DeviceScanner};
pub use types::{CardRead, ReaderEvent, ReaderStatus, ReadingGate};
