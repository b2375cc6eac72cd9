use crate::error::{StorageError, StorageResult};
use crate::models::{Guardian, Student};
use chrono::Utc;
use sqlx::SqlitePool;
use std::future::Future;
use tracing::debug;

const STUDENT_COLUMNS: &str = r#"
    id, student_number, first_name, middle_name, last_name,
    cell_phone, email, address, guardian_id, rfid_tag,
    is_active, created_at, updated_at
"#;

/// Repository trait for Student entity operations
///
/// Methods return `Send` futures so callers can drive lookups from spawned
/// tasks while staying generic over the repository.
pub trait StudentRepository: Send + Sync {
    /// Find the active student holding an RFID tag, with their guardian loaded
    ///
    /// Tag comparison ignores case.
    fn find_active_by_rfid(
        &self,
        rfid_tag: &str,
    ) -> impl Future<Output = StorageResult<Option<Student>>> + Send;

    /// Find a student by ID, with their guardian loaded
    fn find_by_id(&self, id: i64) -> impl Future<Output = StorageResult<Option<Student>>> + Send;

    /// All active students, ordered by last then first name
    fn find_all_active(&self) -> impl Future<Output = StorageResult<Vec<Student>>> + Send;

    /// Students referencing a guardian
    fn find_by_guardian(
        &self,
        guardian_id: i64,
    ) -> impl Future<Output = StorageResult<Vec<Student>>> + Send;

    /// Create a new student, returning the new ID
    fn create(&self, student: &Student) -> impl Future<Output = StorageResult<i64>> + Send;

    /// Update an existing student
    fn update(&self, student: &Student) -> impl Future<Output = StorageResult<()>> + Send;

    /// Assign (or reassign) an RFID tag to a student
    ///
    /// Fails with `StorageError::Validation` when another student holds the tag.
    fn assign_rfid(
        &self,
        student_id: i64,
        rfid_tag: &str,
    ) -> impl Future<Output = StorageResult<()>> + Send;

    /// Mark a student inactive. Attendance history is kept.
    fn deactivate(&self, id: i64) -> impl Future<Output = StorageResult<()>> + Send;
}

/// SQLite implementation of StudentRepository
#[derive(Debug, Clone)]
pub struct SqliteStudentRepository {
    pool: SqlitePool,
}

impl SqliteStudentRepository {
    /// Create a new SQLite student repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load_guardian(&self, mut student: Student) -> StorageResult<Student> {
        if let Some(guardian_id) = student.guardian_id {
            student.guardian = sqlx::query_as::<_, Guardian>(
                r#"
                SELECT id, first_name, last_name, cell_phone, email,
                       is_active, created_at, updated_at
                FROM guardians
                WHERE id = ? AND is_active = 1
                "#,
            )
            .bind(guardian_id)
            .fetch_optional(&self.pool)
            .await?;
        }
        Ok(student)
    }

    fn map_tag_conflict(err: sqlx::Error, rfid_tag: &str) -> StorageError {
        let err = StorageError::from(err);
        if err.is_unique_violation() {
            StorageError::Validation(format!(
                "RFID tag {rfid_tag} is already assigned to another student"
            ))
        } else {
            err
        }
    }
}

impl StudentRepository for SqliteStudentRepository {
    async fn find_active_by_rfid(&self, rfid_tag: &str) -> StorageResult<Option<Student>> {
        let rfid_tag = rfid_tag.trim();
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE rfid_tag = ? AND is_active = 1"
        ))
        .bind(rfid_tag)
        .fetch_optional(&self.pool)
        .await?;

        match student {
            Some(student) => Ok(Some(self.load_guardian(student).await?)),
            None => {
                debug!(rfid_tag, "No active student for RFID tag");
                Ok(None)
            }
        }
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Student>> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match student {
            Some(student) => Ok(Some(self.load_guardian(student).await?)),
            None => Ok(None),
        }
    }

    async fn find_all_active(&self) -> StorageResult<Vec<Student>> {
        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE is_active = 1 \
             ORDER BY last_name, first_name"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut loaded = Vec::with_capacity(students.len());
        for student in students {
            loaded.push(self.load_guardian(student).await?);
        }
        Ok(loaded)
    }

    async fn find_by_guardian(&self, guardian_id: i64) -> StorageResult<Vec<Student>> {
        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE guardian_id = ? \
             ORDER BY last_name, first_name"
        ))
        .bind(guardian_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(students)
    }

    async fn create(&self, student: &Student) -> StorageResult<i64> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO students (
                student_number, first_name, middle_name, last_name,
                cell_phone, email, address, guardian_id, rfid_tag,
                is_active, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&student.student_number)
        .bind(&student.first_name)
        .bind(&student.middle_name)
        .bind(&student.last_name)
        .bind(&student.cell_phone)
        .bind(&student.email)
        .bind(&student.address)
        .bind(student.guardian_id)
        .bind(student.rfid_tag.as_deref().map(str::trim))
        .bind(student.is_active)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_tag_conflict(e, student.rfid_tag.as_deref().unwrap_or_default()))?;

        Ok(result.last_insert_rowid())
    }

    async fn update(&self, student: &Student) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE students
            SET student_number = ?, first_name = ?, middle_name = ?, last_name = ?,
                cell_phone = ?, email = ?, address = ?, guardian_id = ?,
                rfid_tag = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&student.student_number)
        .bind(&student.first_name)
        .bind(&student.middle_name)
        .bind(&student.last_name)
        .bind(&student.cell_phone)
        .bind(&student.email)
        .bind(&student.address)
        .bind(student.guardian_id)
        .bind(student.rfid_tag.as_deref().map(str::trim))
        .bind(student.is_active)
        .bind(Utc::now())
        .bind(student.id)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_tag_conflict(e, student.rfid_tag.as_deref().unwrap_or_default()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Student", "id", student.id));
        }
        Ok(())
    }

    async fn assign_rfid(&self, student_id: i64, rfid_tag: &str) -> StorageResult<()> {
        let rfid_tag = rfid_tag.trim();
        if rfid_tag.is_empty() {
            return Err(StorageError::Validation("RFID tag must not be empty".to_string()));
        }

        let result = sqlx::query("UPDATE students SET rfid_tag = ?, updated_at = ? WHERE id = ?")
            .bind(rfid_tag)
            .bind(Utc::now())
            .bind(student_id)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_tag_conflict(e, rfid_tag))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Student", "id", student_id));
        }
        Ok(())
    }

    async fn deactivate(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("UPDATE students SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Student", "id", id));
        }
        Ok(())
    }
}
