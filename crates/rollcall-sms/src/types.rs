use chrono::{DateTime, Local};
use rollcall_core::SmsStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider account settings used for one send
///
/// Loaded from the active SMS configuration on every call, so a change made
/// by an administrator applies to the next message without a restart.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsSettings {
    pub api_key: String,
    pub api_url: String,
    pub sender_name: String,
}

impl SmsSettings {
    pub fn new(
        api_key: impl Into<String>,
        api_url: impl Into<String>,
        sender_name: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: api_url.into(),
            sender_name: sender_name.into(),
        }
    }
}

impl fmt::Debug for SmsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmsSettings")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("sender_name", &self.sender_name)
            .finish()
    }
}

/// Outcome of a single send
///
/// Failures are values, not errors: `success` is false and `error_message`
/// says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsResult {
    pub success: bool,
    /// Provider message id, or a generated UUID when the provider gave none
    pub message_id: Option<String>,
    pub cost: Option<f64>,
    pub error_message: Option<String>,
    pub sent_at: DateTime<Local>,
    /// `Sent` on success, `Failed` otherwise
    pub status: SmsStatus,
    /// Raw response body, kept for the audit log
    pub provider_response: Option<String>,
}

impl SmsResult {
    pub fn sent(message_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message_id: Some(message_id.into()),
            cost: None,
            error_message: None,
            sent_at: Local::now(),
            status: SmsStatus::Sent,
            provider_response: None,
        }
    }

    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            cost: None,
            error_message: Some(error_message.into()),
            sent_at: Local::now(),
            status: SmsStatus::Failed,
            provider_response: None,
        }
    }

    #[must_use]
    pub fn with_cost(mut self, cost: Option<f64>) -> Self {
        self.cost = cost;
        self
    }

    #[must_use]
    pub fn with_provider_response(mut self, body: impl Into<String>) -> Self {
        self.provider_response = Some(body.into());
        self
    }

    /// Error text, or an empty string on success
    pub fn error_text(&self) -> &str {
        self.error_message.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sent_result() {
        let result = SmsResult::sent("abc").with_cost(Some(1.0));
        assert!(result.success);
        assert_eq!(result.status, SmsStatus::Sent);
        assert_eq!(result.message_id.as_deref(), Some("abc"));
        assert_eq!(result.error_text(), "");
    }

    #[test]
    fn test_failed_result() {
        let result = SmsResult::failed("HTTP Error: 500 - oops").with_provider_response("oops");
        assert!(!result.success);
        assert_eq!(result.status, SmsStatus::Failed);
        assert_eq!(result.error_text(), "HTTP Error: 500 - oops");
        assert_eq!(result.provider_response.as_deref(), Some("oops"));
    }

    #[test]
    fn test_settings_debug_redacts_key() {
        let settings = SmsSettings::new("secret", "https://x.test", "SCHOOL");
        assert!(!format!("{settings:?}").contains("secret"));
    }
}
