use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Guardian;

/// Student entity
///
/// # Fields
///
/// * `id` - Auto-increment primary key
/// * `student_number` - School-issued identifier, unique
/// * `guardian_id` - Optional reference to the guardian to notify
/// * `rfid_tag` - Card id as typed by the reader at enrollment, unique when set
/// * `guardian` - Joined guardian row; filled by lookups that need it, never stored
///
/// # Examples
///
/// ```
/// use rollcall_storage::models::{Guardian, Student};
///
/// let guardian = Guardian::new("Maria", "Cruz").with_cell_phone("09171234567");
/// let student = Student::new("2025-0001", "Juan", "Cruz")
///     .with_rfid_tag("0009876543")
///     .with_guardian(guardian);
///
/// assert_eq!(student.full_name(), "Juan Cruz");
/// assert_eq!(student.guardian_phone(), Some("09171234567"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: i64,
    pub student_number: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub cell_phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub guardian_id: Option<i64>,
    pub rfid_tag: Option<String>,

    /// Inactive students are not recognized by the kiosk
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[sqlx(skip)]
    pub guardian: Option<Guardian>,
}

impl Student {
    /// Build an unsaved student (id 0) with current timestamps.
    pub fn new(
        student_number: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            student_number: student_number.into(),
            first_name: first_name.into(),
            middle_name: None,
            last_name: last_name.into(),
            cell_phone: None,
            email: None,
            address: None,
            guardian_id: None,
            rfid_tag: None,
            is_active: true,
            created_at: now,
            updated_at: now,
            guardian: None,
        }
    }

    #[must_use]
    pub fn with_rfid_tag(mut self, tag: impl Into<String>) -> Self {
        self.rfid_tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn with_guardian_id(mut self, guardian_id: i64) -> Self {
        self.guardian_id = Some(guardian_id);
        self
    }

    /// Attach a loaded guardian, also setting the reference.
    #[must_use]
    pub fn with_guardian(mut self, guardian: Guardian) -> Self {
        if guardian.id != 0 {
            self.guardian_id = Some(guardian.id);
        }
        self.guardian = Some(guardian);
        self
    }

    /// First and last name, as used in notifications.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Phone number of the loaded guardian, if there is one to notify.
    pub fn guardian_phone(&self) -> Option<&str> {
        self.guardian
            .as_ref()
            .filter(|g| g.is_active)
            .and_then(Guardian::notification_phone)
    }
}
