//! In-memory transport for tests.
//!
//! Records every send and answers from a script: by default every send
//! succeeds with a sequential message id.

use crate::error::{Result, SmsError};
use crate::phone::format_phone_number;
use crate::transport::SmsTransport;
use crate::types::{SmsResult, SmsSettings};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// A message captured by [`MockTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Normalized number
    pub phone: String,
    pub message: String,
    pub sender_name: String,
}

#[derive(Debug, Default)]
struct MockState {
    sent: Vec<SentMessage>,
    fail_all: Option<String>,
    failing_numbers: HashSet<String>,
    balance: f64,
    connected: bool,
}

/// Programmable SMS transport
///
/// Clones share state, so a test can keep one handle and give another to
/// the code under test.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                connected: true,
                balance: 100.0,
                ..MockState::default()
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail every send with `error` until cleared with `None`
    pub fn set_failure(&self, error: Option<&str>) {
        self.lock().fail_all = error.map(str::to_string);
    }

    /// Fail sends to one number (in any format)
    pub fn fail_number(&self, phone: &str) {
        self.lock().failing_numbers.insert(format_phone_number(phone));
    }

    pub fn set_balance(&self, balance: f64) {
        self.lock().balance = balance;
    }

    pub fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }

    /// Messages sent so far, successful or not
    pub fn sent(&self) -> Vec<SentMessage> {
        self.lock().sent.clone()
    }

    pub fn sent_count(&self) -> usize {
        self.lock().sent.len()
    }
}

impl SmsTransport for MockTransport {
    async fn send(&self, settings: &SmsSettings, phone: &str, message: &str) -> SmsResult {
        let number = format_phone_number(phone);
        let mut state = self.lock();
        state.sent.push(SentMessage {
            phone: number.clone(),
            message: message.to_string(),
            sender_name: settings.sender_name.clone(),
        });

        if let Some(error) = &state.fail_all {
            return SmsResult::failed(error.clone());
        }
        if state.failing_numbers.contains(&number) {
            return SmsResult::failed(format!("Number {number} rejected"));
        }

        let id = format!("mock-{}", state.sent.len());
        SmsResult::sent(id.clone()).with_provider_response(format!(
            r#"{{"status":"Queued","message_id":"{id}"}}"#
        ))
    }

    async fn test_connection(&self, _settings: &SmsSettings) -> bool {
        self.lock().connected
    }

    async fn balance(&self, _settings: &SmsSettings) -> Result<f64> {
        let state = self.lock();
        if state.connected {
            Ok(state.balance)
        } else {
            Err(SmsError::Configuration("mock transport disconnected".to_string()))
        }
    }
}
