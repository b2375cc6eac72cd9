use chrono::{DateTime, Utc};
use rollcall_core::SmsStatus;
use rollcall_core::constants::DEFAULT_SMS_LOG_LIMIT;
use serde::{Deserialize, Serialize};
use std::fmt;

/// SMS provider settings
///
/// One row is expected to be active at a time. The API key is redacted from
/// `Debug` output so configurations can be logged safely.
#[derive(Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SmsConfiguration {
    pub id: i64,
    pub provider_name: String,
    pub api_key: String,
    pub api_url: String,
    pub sender_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SmsConfiguration {
    /// Build an unsaved, active configuration.
    pub fn new(
        provider_name: impl Into<String>,
        api_key: impl Into<String>,
        api_url: impl Into<String>,
        sender_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            provider_name: provider_name.into(),
            api_key: api_key.into(),
            api_url: api_url.into(),
            sender_name: sender_name.into(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl fmt::Debug for SmsConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmsConfiguration")
            .field("id", &self.id)
            .field("provider_name", &self.provider_name)
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("sender_name", &self.sender_name)
            .field("is_active", &self.is_active)
            .finish()
    }
}

/// Audit entry for one SMS send attempt
///
/// Created as `Pending` before the provider is called and updated with the
/// outcome afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SmsLog {
    pub id: i64,
    pub student_id: Option<i64>,
    pub phone_number: String,
    pub message: String,
    /// 1 Pending, 2 Sent, 3 Failed, 4 Delivered, 5 Queued
    pub status: i32,
    pub error_message: Option<String>,
    pub provider_response: Option<String>,
    pub sent_at: DateTime<Utc>,
}

impl SmsLog {
    /// Get the delivery status as an enum
    pub fn get_status(&self) -> Option<SmsStatus> {
        SmsStatus::from_i32(self.status)
    }
}

/// Criteria for querying SMS logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsLogFilter {
    pub student_id: Option<i64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: i64,
}

impl Default for SmsLogFilter {
    fn default() -> Self {
        Self {
            student_id: None,
            from: None,
            to: None,
            limit: DEFAULT_SMS_LOG_LIMIT,
        }
    }
}

impl SmsLogFilter {
    #[must_use]
    pub fn student(mut self, student_id: i64) -> Self {
        self.student_id = Some(student_id);
        self
    }

    #[must_use]
    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }
}
