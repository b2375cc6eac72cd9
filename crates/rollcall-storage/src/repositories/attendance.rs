use crate::error::{StorageError, StorageResult};
use crate::messages::ValidationMessages;
use crate::models::{AttendanceRecord, AttendanceStatus};
use crate::policy::AttendancePolicy;
use chrono::{DateTime, Utc};
use rollcall_core::{AttendanceType, ValidationResult};
use sqlx::{SqliteConnection, SqlitePool};
use std::future::Future;
use tracing::debug;

/// Outcome of an atomic validate-and-record call
#[derive(Debug, Clone, PartialEq)]
pub enum RecordDecision {
    /// The event passed validation and was inserted
    Recorded { record_id: i64 },

    /// The event was refused by the attendance rules; nothing was written
    Rejected(ValidationResult),
}

impl RecordDecision {
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }
}

/// Repository trait for attendance records
pub trait AttendanceRepository: Send + Sync {
    /// Latest status of a student, `None` when they have no records
    fn current_status(
        &self,
        student_id: i64,
    ) -> impl Future<Output = StorageResult<Option<AttendanceStatus>>> + Send;

    /// Check a proposed event against the attendance rules without writing
    fn validate_transition(
        &self,
        student_id: i64,
        proposed: AttendanceType,
        at: DateTime<Utc>,
    ) -> impl Future<Output = StorageResult<ValidationResult>> + Send;

    /// Append a record unconditionally, returning its ID
    fn record(
        &self,
        student_id: i64,
        kind: AttendanceType,
        notes: Option<&str>,
        at: DateTime<Utc>,
    ) -> impl Future<Output = StorageResult<i64>> + Send;

    /// Validate and append in one write transaction
    ///
    /// Concurrent calls for the same student are serialized, so two racing
    /// taps cannot both record the same type.
    fn record_if_valid(
        &self,
        student_id: i64,
        kind: AttendanceType,
        notes: Option<&str>,
        at: DateTime<Utc>,
    ) -> impl Future<Output = StorageResult<RecordDecision>> + Send;

    /// All records in `[start, end)`, oldest first
    fn find_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = StorageResult<Vec<AttendanceRecord>>> + Send;

    /// Most recent records of one student, newest first
    fn find_by_student(
        &self,
        student_id: i64,
        limit: i64,
    ) -> impl Future<Output = StorageResult<Vec<AttendanceRecord>>> + Send;
}

/// SQLite implementation of AttendanceRepository
#[derive(Debug, Clone)]
pub struct SqliteAttendanceRepository {
    pool: SqlitePool,
    policy: AttendancePolicy,
}

impl SqliteAttendanceRepository {
    /// Create a new SQLite attendance repository applying `policy`
    pub fn new(pool: SqlitePool, policy: AttendancePolicy) -> Self {
        Self { pool, policy }
    }

    pub fn policy(&self) -> AttendancePolicy {
        self.policy
    }

    async fn latest_status(
        conn: &mut SqliteConnection,
        student_id: i64,
    ) -> StorageResult<Option<AttendanceStatus>> {
        let latest = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT id, student_id, attendance_type, recorded_at, notes, created_at
            FROM attendance_records
            WHERE student_id = ?
            ORDER BY recorded_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(student_id)
        .fetch_optional(&mut *conn)
        .await?;

        latest
            .map(|record| {
                record.status().ok_or_else(|| {
                    StorageError::CorruptData(format!(
                        "attendance record {} has type {}",
                        record.id, record.attendance_type
                    ))
                })
            })
            .transpose()
    }

    async fn insert(
        conn: &mut SqliteConnection,
        student_id: i64,
        kind: AttendanceType,
        notes: Option<&str>,
        at: DateTime<Utc>,
    ) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_records (student_id, attendance_type, recorded_at, notes, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(student_id)
        .bind(kind.to_i32())
        .bind(at)
        .bind(notes)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn decide_and_insert(
        &self,
        conn: &mut SqliteConnection,
        student_id: i64,
        kind: AttendanceType,
        notes: Option<&str>,
        at: DateTime<Utc>,
    ) -> StorageResult<RecordDecision> {
        let active: Option<bool> = sqlx::query_scalar("SELECT is_active FROM students WHERE id = ?")
            .bind(student_id)
            .fetch_optional(&mut *conn)
            .await?;
        if active != Some(true) {
            return Ok(RecordDecision::Rejected(ValidationResult::invalid(
                ValidationMessages::STUDENT_INACTIVE,
            )));
        }

        let current = Self::latest_status(conn, student_id).await?;
        let verdict = self.policy.evaluate(current.as_ref(), kind, at);
        if !verdict.is_valid {
            return Ok(RecordDecision::Rejected(verdict));
        }

        let record_id = Self::insert(conn, student_id, kind, notes, at).await?;
        Ok(RecordDecision::Recorded { record_id })
    }
}

impl AttendanceRepository for SqliteAttendanceRepository {
    async fn current_status(&self, student_id: i64) -> StorageResult<Option<AttendanceStatus>> {
        let mut conn = self.pool.acquire().await?;
        Self::latest_status(&mut conn, student_id).await
    }

    async fn validate_transition(
        &self,
        student_id: i64,
        proposed: AttendanceType,
        at: DateTime<Utc>,
    ) -> StorageResult<ValidationResult> {
        let current = self.current_status(student_id).await?;
        Ok(self.policy.evaluate(current.as_ref(), proposed, at))
    }

    async fn record(
        &self,
        student_id: i64,
        kind: AttendanceType,
        notes: Option<&str>,
        at: DateTime<Utc>,
    ) -> StorageResult<i64> {
        let mut conn = self.pool.acquire().await?;
        let id = Self::insert(&mut conn, student_id, kind, notes, at).await?;
        debug!(student_id, record_id = id, kind = %kind, "Attendance recorded");
        Ok(id)
    }

    async fn record_if_valid(
        &self,
        student_id: i64,
        kind: AttendanceType,
        notes: Option<&str>,
        at: DateTime<Utc>,
    ) -> StorageResult<RecordDecision> {
        // Write lock is held before the latest record is read
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let decision = self
            .decide_and_insert(&mut *tx, student_id, kind, notes, at)
            .await?;

        // Anything but a commit rolls back when `tx` drops
        if let RecordDecision::Recorded { record_id } = decision {
            tx.commit().await?;
            debug!(student_id, record_id, kind = %kind, "Attendance recorded");
        }
        Ok(decision)
    }

    async fn find_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<AttendanceRecord>> {
        let records = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT id, student_id, attendance_type, recorded_at, notes, created_at
            FROM attendance_records
            WHERE recorded_at >= ? AND recorded_at < ?
            ORDER BY recorded_at ASC, id ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn find_by_student(
        &self,
        student_id: i64,
        limit: i64,
    ) -> StorageResult<Vec<AttendanceRecord>> {
        let records = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT id, student_id, attendance_type, recorded_at, notes, created_at
            FROM attendance_records
            WHERE student_id = ?
            ORDER BY recorded_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(student_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
