//! HTTP transport for the Semaphore SMS gateway.
//!
//! # Request
//!
//! `POST {api_url}` with `Authorization: Token {api_key}` and the JSON body
//! `{"number": "+639...", "message": "...", "sendername": "..."}`.
//!
//! # Response
//!
//! The gateway answers with either one object or an array of objects, one
//! per recipient. Only the first is inspected:
//!
//! ```text
//! [{"message_id": 1234, "status": "Queued", "message": "...", ...}]
//! ```
//!
//! A `status` of `Success`, `Queued`, `Pending` or `Sent` (any case) counts
//! as accepted. Everything else is a failure carrying the provider's
//! `message`.
//!
//! # Error Mapping
//!
//! | Condition            | `error_message`                       |
//! |----------------------|---------------------------------------|
//! | non-2xx status       | `HTTP Error: {status} - {body}`       |
//! | rejected by provider | provider message, or a generic one    |
//! | network, bad JSON    | `Exception: {error}`                  |

use crate::error::{Result, SmsError};
use crate::phone::format_phone_number;
use crate::types::{SmsResult, SmsSettings};
use reqwest::header::AUTHORIZATION;
use rollcall_core::constants::DEFAULT_SMS_TIMEOUT_MS;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Account endpoint used for connection tests and balance queries
pub const SEMAPHORE_ACCOUNT_URL: &str = "https://api.semaphore.co/api/v4/account";

const ACCEPTED_STATUSES: [&str; 4] = ["success", "queued", "pending", "sent"];

const UNKNOWN_PROVIDER_ERROR: &str = "Unknown error from provider";

/// Sends text messages through an SMS provider.
///
/// Implementations never fail a send with `Err`; every outcome is an
/// [`SmsResult`].
pub trait SmsTransport: Send + Sync {
    /// Send `message` to `phone`, normalizing the number first
    fn send(
        &self,
        settings: &SmsSettings,
        phone: &str,
        message: &str,
    ) -> impl Future<Output = SmsResult> + Send;

    /// Whether the provider accepts the credentials
    fn test_connection(&self, settings: &SmsSettings) -> impl Future<Output = bool> + Send;

    /// Remaining account credit
    fn balance(&self, settings: &SmsSettings) -> impl Future<Output = Result<f64>> + Send;
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct SmsClientConfig {
    /// Timeout for a whole request, connect included
    pub timeout: Duration,

    /// Account endpoint for connection tests and balance queries
    pub account_url: String,
}

impl Default for SmsClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_SMS_TIMEOUT_MS),
            account_url: SEMAPHORE_ACCOUNT_URL.to_string(),
        }
    }
}

impl SmsClientConfig {
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn account_url(mut self, url: impl Into<String>) -> Self {
        self.account_url = url.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct OutgoingMessage<'a> {
    number: &'a str,
    message: &'a str,
    sendername: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderReply {
    #[serde(default, alias = "Status")]
    status: Option<String>,
    #[serde(default, alias = "Message")]
    message: Option<String>,
    #[serde(default, alias = "MessageId", alias = "messageId")]
    message_id: Option<Value>,
    #[serde(default, alias = "Cost")]
    cost: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProviderBody {
    Many(Vec<ProviderReply>),
    One(ProviderReply),
}

#[derive(Debug, Default, Deserialize)]
struct AccountReply {
    #[serde(default)]
    account_name: Option<String>,
    #[serde(default)]
    credit_balance: Option<Value>,
}

/// Numbers arrive as JSON numbers or numeric strings depending on endpoint.
fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Turn a 2xx body into a send outcome.
fn interpret_reply(body: &str) -> Result<SmsResult> {
    let reply = match serde_json::from_str::<ProviderBody>(body)? {
        ProviderBody::One(reply) => reply,
        ProviderBody::Many(replies) => replies.into_iter().next().unwrap_or_default(),
    };

    let accepted = reply
        .status
        .as_deref()
        .map(str::trim)
        .is_some_and(|status| {
            ACCEPTED_STATUSES
                .iter()
                .any(|ok| status.eq_ignore_ascii_case(ok))
        });

    let result = if accepted {
        let message_id = reply
            .message_id
            .as_ref()
            .and_then(value_as_id)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        SmsResult::sent(message_id).with_cost(reply.cost.as_ref().and_then(value_as_f64))
    } else {
        SmsResult::failed(
            reply
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_PROVIDER_ERROR.to_string()),
        )
    };

    Ok(result.with_provider_response(body))
}

/// Semaphore gateway client
///
/// Holds one `reqwest::Client`; clones share its connection pool. Dropping
/// the last clone closes pooled connections.
///
/// # Example
///
/// ```no_run
/// use rollcall_sms::{SemaphoreTransport, SmsClientConfig, SmsSettings, SmsTransport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = SemaphoreTransport::new(SmsClientConfig::default())?;
/// let settings = SmsSettings::new(
///     "api-key",
///     "https://api.semaphore.co/api/v4/messages",
///     "SCHOOL",
/// );
///
/// let result = transport.send(&settings, "09171234567", "Hello").await;
/// if !result.success {
///     eprintln!("{}", result.error_text());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SemaphoreTransport {
    client: reqwest::Client,
    account_url: String,
}

impl SemaphoreTransport {
    /// Build the HTTP client
    pub fn new(config: SmsClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        debug!(
            timeout_ms = config.timeout.as_millis() as u64,
            account_url = %config.account_url,
            "Created SMS transport"
        );

        Ok(Self {
            client,
            account_url: config.account_url,
        })
    }

    fn check_settings(settings: &SmsSettings) -> Result<()> {
        if settings.api_key.trim().is_empty() {
            return Err(SmsError::Configuration("API key is empty".to_string()));
        }
        if settings.api_url.trim().is_empty() {
            return Err(SmsError::Configuration("API URL is empty".to_string()));
        }
        Ok(())
    }

    async fn post_message(
        &self,
        settings: &SmsSettings,
        number: &str,
        message: &str,
    ) -> Result<SmsResult> {
        Self::check_settings(settings)?;

        let payload = OutgoingMessage {
            number,
            message,
            sendername: &settings.sender_name,
        };

        let response = self
            .client
            .post(&settings.api_url)
            .header(AUTHORIZATION, format!("Token {}", settings.api_key))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = SmsError::Status {
                status: status.as_u16(),
                body: body.clone(),
            };
            return Ok(SmsResult::failed(err.to_string()).with_provider_response(body));
        }

        interpret_reply(&body)
    }

    async fn account(&self, settings: &SmsSettings) -> Result<AccountReply> {
        Self::check_settings(settings)?;

        let response = self
            .client
            .get(&self.account_url)
            .header(AUTHORIZATION, format!("Token {}", settings.api_key))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SmsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

impl SmsTransport for SemaphoreTransport {
    async fn send(&self, settings: &SmsSettings, phone: &str, message: &str) -> SmsResult {
        let number = format_phone_number(phone);

        match self.post_message(settings, &number, message).await {
            Ok(result) => {
                if result.success {
                    debug!(phone = %number, message_id = ?result.message_id, "SMS accepted");
                } else {
                    warn!(phone = %number, error = result.error_text(), "SMS rejected");
                }
                result
            }
            Err(e) => {
                warn!(phone = %number, error = %e, "SMS send failed");
                SmsResult::failed(format!("Exception: {e}"))
            }
        }
    }

    async fn test_connection(&self, settings: &SmsSettings) -> bool {
        match self.account(settings).await {
            Ok(account) => account
                .account_name
                .is_some_and(|name| !name.trim().is_empty()),
            Err(e) => {
                debug!(error = %e, "SMS connection test failed");
                false
            }
        }
    }

    async fn balance(&self, settings: &SmsSettings) -> Result<f64> {
        let account = self.account(settings).await?;
        Ok(account
            .credit_balance
            .as_ref()
            .and_then(value_as_f64)
            .unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::SmsStatus;
    use rstest::rstest;

    #[rstest]
    #[case(r#"{"status":"Success","message_id":"m-1"}"#)]
    #[case(r#"{"status":"queued","message_id":"m-1"}"#)]
    #[case(r#"[{"status":"Pending","message_id":"m-1"}]"#)]
    #[case(r#"[{"status":"SENT","message_id":"m-1"},{"status":"Failed"}]"#)]
    fn test_accepted_statuses(#[case] body: &str) {
        let result = interpret_reply(body).unwrap();
        assert!(result.success);
        assert_eq!(result.status, SmsStatus::Sent);
        assert_eq!(result.message_id.as_deref(), Some("m-1"));
        assert_eq!(result.provider_response.as_deref(), Some(body));
    }

    #[test]
    fn test_numeric_message_id_and_cost() {
        let result = interpret_reply(r#"[{"status":"Queued","message_id":98765,"cost":"1.50"}]"#)
            .unwrap();
        assert_eq!(result.message_id.as_deref(), Some("98765"));
        assert_eq!(result.cost, Some(1.5));
    }

    #[test]
    fn test_missing_message_id_generates_uuid() {
        let result = interpret_reply(r#"{"status":"Success"}"#).unwrap();
        let id = result.message_id.unwrap();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_rejected_with_provider_message() {
        let result =
            interpret_reply(r#"{"status":"Failed","message":"Insufficient credits"}"#).unwrap();
        assert!(!result.success);
        assert_eq!(result.error_text(), "Insufficient credits");
    }

    #[rstest]
    #[case(r#"{"status":"Refunded"}"#)]
    #[case(r#"{}"#)]
    #[case(r#"[]"#)]
    fn test_rejected_without_message(#[case] body: &str) {
        let result = interpret_reply(body).unwrap();
        assert!(!result.success);
        assert_eq!(result.error_text(), UNKNOWN_PROVIDER_ERROR);
    }

    #[test]
    fn test_non_json_body_is_error() {
        assert!(matches!(
            interpret_reply("<html>oops</html>"),
            Err(SmsError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_api_key_fails_without_request() {
        let transport = SemaphoreTransport::new(SmsClientConfig::default()).unwrap();
        let settings = SmsSettings::new("", "http://127.0.0.1:9/messages", "SCHOOL");

        let result = transport.send(&settings, "09171234567", "Hi").await;
        assert!(!result.success);
        assert_eq!(
            result.error_text(),
            "Exception: Configuration error: API key is empty"
        );
    }

    #[test]
    fn test_config_builder() {
        let config = SmsClientConfig::default()
            .timeout(Duration::from_secs(2))
            .account_url("http://127.0.0.1/account");
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(config.account_url, "http://127.0.0.1/account");
        assert_eq!(
            SmsClientConfig::default().timeout,
            Duration::from_millis(30_000)
        );
    }
}
