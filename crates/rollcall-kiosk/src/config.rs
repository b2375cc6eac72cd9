//! Kiosk configuration from the environment.
//!
//! Values come from process environment variables, with a `.env` file in
//! the working directory loaded first when present. Every variable is
//! optional:
//!
//! | Variable                     | Default       |
//! |------------------------------|---------------|
//! | `ROLLCALL_DATABASE`          | `rollcall.db` |
//! | `ROLLCALL_MINIMUM_MINUTES`   | `1`           |
//! | `ROLLCALL_CARD_TIMEOUT_MS`   | `100`         |
//! | `ROLLCALL_DEVICE_POLL_SECS`  | `5`           |
//! | `ROLLCALL_BULK_DELAY_MS`     | `100`         |
//! | `ROLLCALL_SMS_TIMEOUT_MS`    | `30000`       |
//! | `ROLLCALL_KEYBOARD_FALLBACK` | `true`        |

use crate::coordinator::CoordinatorConfig;
use crate::notifier::NotifierConfig;
use rollcall_core::constants::{
    BULK_SEND_DELAY_MS, CARD_READ_TIMEOUT_MS, DEFAULT_MINIMUM_MINUTES, DEFAULT_SMS_TIMEOUT_MS,
    DEVICE_POLL_INTERVAL_SECS,
};
use rollcall_core::{Error, Result};
use rollcall_hardware::ReaderConfig;
use rollcall_sms::SmsClientConfig;
use rollcall_storage::{AttendancePolicy, DatabaseConfig};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

pub const ENV_DATABASE: &str = "ROLLCALL_DATABASE";
pub const ENV_MINIMUM_MINUTES: &str = "ROLLCALL_MINIMUM_MINUTES";
pub const ENV_CARD_TIMEOUT_MS: &str = "ROLLCALL_CARD_TIMEOUT_MS";
pub const ENV_DEVICE_POLL_SECS: &str = "ROLLCALL_DEVICE_POLL_SECS";
pub const ENV_BULK_DELAY_MS: &str = "ROLLCALL_BULK_DELAY_MS";
pub const ENV_SMS_TIMEOUT_MS: &str = "ROLLCALL_SMS_TIMEOUT_MS";
pub const ENV_KEYBOARD_FALLBACK: &str = "ROLLCALL_KEYBOARD_FALLBACK";

/// Complete kiosk configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KioskConfig {
    /// SQLite database file
    pub database_path: String,

    /// Minimum minutes between two attendance events of one student
    pub minimum_minutes: i64,

    /// Maximum keystroke gap within one card read
    pub card_timeout: Duration,

    /// Interval between reader presence checks
    pub device_poll_interval: Duration,

    /// Pause between messages of a bulk announcement
    pub bulk_send_delay: Duration,

    /// Timeout for one SMS gateway request
    pub sms_timeout: Duration,

    /// Report a keyboard-emulation reader when no device matches by name
    pub keyboard_fallback: bool,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            database_path: DatabaseConfig::default().database_path,
            minimum_minutes: DEFAULT_MINIMUM_MINUTES,
            card_timeout: Duration::from_millis(CARD_READ_TIMEOUT_MS),
            device_poll_interval: Duration::from_secs(DEVICE_POLL_INTERVAL_SECS),
            bulk_send_delay: Duration::from_millis(BULK_SEND_DELAY_MS),
            sms_timeout: Duration::from_millis(DEFAULT_SMS_TIMEOUT_MS),
            keyboard_fallback: true,
        }
    }
}

impl KioskConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(Error::Config(format!("Failed to load .env: {e}"))),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let config = Self {
            database_path: get(ENV_DATABASE).unwrap_or(defaults.database_path),
            minimum_minutes: parse(&get, ENV_MINIMUM_MINUTES)?
                .unwrap_or(defaults.minimum_minutes),
            card_timeout: parse(&get, ENV_CARD_TIMEOUT_MS)?
                .map(Duration::from_millis)
                .unwrap_or(defaults.card_timeout),
            device_poll_interval: parse(&get, ENV_DEVICE_POLL_SECS)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.device_poll_interval),
            bulk_send_delay: parse(&get, ENV_BULK_DELAY_MS)?
                .map(Duration::from_millis)
                .unwrap_or(defaults.bulk_send_delay),
            sms_timeout: parse(&get, ENV_SMS_TIMEOUT_MS)?
                .map(Duration::from_millis)
                .unwrap_or(defaults.sms_timeout),
            keyboard_fallback: match get(ENV_KEYBOARD_FALLBACK) {
                Some(raw) => parse_bool(ENV_KEYBOARD_FALLBACK, &raw)?,
                None => defaults.keyboard_fallback,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.minimum_minutes < 0 {
            return Err(Error::Config(format!(
                "{ENV_MINIMUM_MINUTES} must not be negative"
            )));
        }
        if self.card_timeout.is_zero() {
            return Err(Error::Config(format!(
                "{ENV_CARD_TIMEOUT_MS} must be greater than zero"
            )));
        }
        if self.device_poll_interval.is_zero() {
            return Err(Error::Config(format!(
                "{ENV_DEVICE_POLL_SECS} must be greater than zero"
            )));
        }
        if self.sms_timeout.is_zero() {
            return Err(Error::Config(format!(
                "{ENV_SMS_TIMEOUT_MS} must be greater than zero"
            )));
        }
        Ok(())
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_path.clone())
    }

    pub fn attendance_policy(&self) -> AttendancePolicy {
        AttendancePolicy::new(self.minimum_minutes)
    }

    pub fn reader_config(&self) -> ReaderConfig {
        ReaderConfig::default()
            .card_timeout(self.card_timeout)
            .poll_interval(self.device_poll_interval)
    }

    pub fn sms_client_config(&self) -> SmsClientConfig {
        SmsClientConfig::default().timeout(self.sms_timeout)
    }

    pub fn notifier_config(&self) -> NotifierConfig {
        NotifierConfig::default().bulk_send_delay(self.bulk_send_delay)
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig::default()
    }
}

fn parse<T, G>(get: &G, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| Error::Config(format!("Invalid {key}={raw}: {e}")))
        })
        .transpose()
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "Invalid {key}={raw}: expected true or false"
        ))),
    }
}
