//! Mock card readers and scanners for tests and development.

pub mod reader;
pub mod scanner;

pub use reader::{MockCardReader, MockCardReaderHandle};
pub use scanner::MockScanner;
