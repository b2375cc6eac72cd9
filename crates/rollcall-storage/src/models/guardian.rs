use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Guardian entity, the contact notified about a student's attendance
///
/// A guardian may be referenced by several students (siblings). The cell
/// phone is the SMS notification target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Guardian {
    /// Auto-increment primary key
    pub id: i64,

    pub first_name: String,
    pub last_name: String,

    /// Notification target. Stored as entered; normalized at send time.
    pub cell_phone: Option<String>,

    pub email: Option<String>,

    /// Inactive guardians are kept for history but never notified
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guardian {
    /// Build an unsaved guardian (id 0) with current timestamps.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            first_name: first_name.into(),
            last_name: last_name.into(),
            cell_phone: None,
            email: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_cell_phone(mut self, phone: impl Into<String>) -> Self {
        self.cell_phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Phone number to notify, if any non-blank number is on file.
    pub fn notification_phone(&self) -> Option<&str> {
        self.cell_phone
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
    }
}
