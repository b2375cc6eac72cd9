use crate::error::{StorageError, StorageResult};
use crate::models::Guardian;
use chrono::Utc;
use sqlx::SqlitePool;
use std::future::Future;

/// Repository trait for Guardian entity operations
pub trait GuardianRepository: Send + Sync {
    /// Create a new guardian, returning the new ID
    fn create(&self, guardian: &Guardian) -> impl Future<Output = StorageResult<i64>> + Send;

    /// Find a guardian by ID
    fn find_by_id(&self, id: i64) -> impl Future<Output = StorageResult<Option<Guardian>>> + Send;

    /// All active guardians, ordered by last then first name
    fn find_all_active(&self) -> impl Future<Output = StorageResult<Vec<Guardian>>> + Send;

    /// Update an existing guardian
    fn update(&self, guardian: &Guardian) -> impl Future<Output = StorageResult<()>> + Send;

    /// Mark a guardian inactive so they are no longer notified
    fn deactivate(&self, id: i64) -> impl Future<Output = StorageResult<()>> + Send;
}

/// SQLite implementation of GuardianRepository
#[derive(Debug, Clone)]
pub struct SqliteGuardianRepository {
    pool: SqlitePool,
}

impl SqliteGuardianRepository {
    /// Create a new SQLite guardian repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl GuardianRepository for SqliteGuardianRepository {
    async fn create(&self, guardian: &Guardian) -> StorageResult<i64> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO guardians (first_name, last_name, cell_phone, email, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&guardian.first_name)
        .bind(&guardian.last_name)
        .bind(&guardian.cell_phone)
        .bind(&guardian.email)
        .bind(guardian.is_active)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Guardian>> {
        let guardian = sqlx::query_as::<_, Guardian>(
            r#"
            SELECT id, first_name, last_name, cell_phone, email, is_active, created_at, updated_at
            FROM guardians
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(guardian)
    }

    async fn find_all_active(&self) -> StorageResult<Vec<Guardian>> {
        let guardians = sqlx::query_as::<_, Guardian>(
            r#"
            SELECT id, first_name, last_name, cell_phone, email, is_active, created_at, updated_at
            FROM guardians
            WHERE is_active = 1
            ORDER BY last_name, first_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(guardians)
    }

    async fn update(&self, guardian: &Guardian) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE guardians
            SET first_name = ?, last_name = ?, cell_phone = ?, email = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&guardian.first_name)
        .bind(&guardian.last_name)
        .bind(&guardian.cell_phone)
        .bind(&guardian.email)
        .bind(guardian.is_active)
        .bind(Utc::now())
        .bind(guardian.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Guardian", "id", guardian.id));
        }
        Ok(())
    }

    async fn deactivate(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("UPDATE guardians SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Guardian", "id", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;
    use crate::models::Student;
    use crate::repositories::student::{SqliteStudentRepository, StudentRepository};

    #[tokio::test]
    async fn test_create_find_update() {
        let db = Database::in_memory().await.unwrap();
        let repo = SqliteGuardianRepository::new(db.pool().clone());

        let id = repo
            .create(&Guardian::new("Maria", "Cruz").with_cell_phone("09171234567"))
            .await
            .unwrap();

        let mut guardian = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(guardian.full_name(), "Maria Cruz");
        assert!(guardian.is_active);

        guardian.cell_phone = Some("09179999999".to_string());
        repo.update(&guardian).await.unwrap();

        let guardian = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(guardian.notification_phone(), Some("09179999999"));
        assert!(repo.find_by_id(id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deactivated_guardian_not_loaded_for_card_lookup() {
        let db = Database::in_memory().await.unwrap();
        let guardians = SqliteGuardianRepository::new(db.pool().clone());
        let students = SqliteStudentRepository::new(db.pool().clone());

        let guardian_id = guardians
            .create(&Guardian::new("Maria", "Cruz").with_cell_phone("09171234567"))
            .await
            .unwrap();
        students
            .create(
                &Student::new("S-1", "Juan", "Cruz")
                    .with_rfid_tag("CARD1")
                    .with_guardian_id(guardian_id),
            )
            .await
            .unwrap();

        guardians.deactivate(guardian_id).await.unwrap();
        assert!(guardians.find_all_active().await.unwrap().is_empty());

        let student = students.find_active_by_rfid("CARD1").await.unwrap().unwrap();
        assert!(student.guardian.is_none());
        assert_eq!(student.guardian_phone(), None);
    }

    #[tokio::test]
    async fn test_missing_guardian_errors() {
        let db = Database::in_memory().await.unwrap();
        let repo = SqliteGuardianRepository::new(db.pool().clone());

        assert!(matches!(
            repo.deactivate(42).await,
            Err(StorageError::NotFound { .. })
        ));
    }
}
