//! SMS gateway client for guardian notifications.
//!
//! - [`SmsTransport`]: the sending seam used by the notification dispatcher
//! - [`SemaphoreTransport`]: HTTP client for the Semaphore gateway
//! - [`MockTransport`]: scripted in-memory transport for tests
//! - [`format_phone_number`]: normalization to `+63...`
//!
//! Provider settings are passed per call as [`SmsSettings`], so the client
//! itself only owns the connection pool.

pub mod error;
pub mod mock;
pub mod phone;
pub mod transport;
pub mod types;

pub use error::{Result, SmsError};
pub use mock::{MockTransport, SentMessage};
pub use phone::format_phone_number;
pub use transport::{SEMAPHORE_ACCOUNT_URL, SemaphoreTransport, SmsClientConfig, SmsTransport};
pub use types::{SmsResult, SmsSettings};
