use crate::error::{StorageError, StorageResult};
use crate::models::{SmsConfiguration, SmsLog, SmsLogFilter};
use chrono::{DateTime, Utc};
use rollcall_core::SmsStatus;
use sqlx::SqlitePool;
use std::future::Future;

/// Repository trait for SMS configuration and the send audit log
pub trait SmsRepository: Send + Sync {
    /// The active provider configuration, if any
    fn active_configuration(
        &self,
    ) -> impl Future<Output = StorageResult<Option<SmsConfiguration>>> + Send;

    /// Insert or update a configuration, returning its ID
    ///
    /// Saving an active configuration deactivates every other one.
    fn save_configuration(
        &self,
        config: &SmsConfiguration,
    ) -> impl Future<Output = StorageResult<i64>> + Send;

    /// Open a Pending log entry for a send about to happen
    fn log_pending(
        &self,
        student_id: Option<i64>,
        phone_number: &str,
        message: &str,
    ) -> impl Future<Output = StorageResult<i64>> + Send;

    /// Record the outcome of a send
    fn update_log(
        &self,
        log_id: i64,
        status: SmsStatus,
        error_message: Option<&str>,
        provider_response: Option<&str>,
    ) -> impl Future<Output = StorageResult<()>> + Send;

    /// Log entries matching `filter`, newest first
    fn find_logs(
        &self,
        filter: &SmsLogFilter,
    ) -> impl Future<Output = StorageResult<Vec<SmsLog>>> + Send;

    /// Number of messages sent or delivered in `[start, end)`
    fn count_sent_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = StorageResult<i64>> + Send;
}

/// SQLite implementation of SmsRepository
#[derive(Debug, Clone)]
pub struct SqliteSmsRepository {
    pool: SqlitePool,
}

impl SqliteSmsRepository {
    /// Create a new SQLite SMS repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SmsRepository for SqliteSmsRepository {
    async fn active_configuration(&self) -> StorageResult<Option<SmsConfiguration>> {
        let config = sqlx::query_as::<_, SmsConfiguration>(
            r#"
            SELECT id, provider_name, api_key, api_url, sender_name,
                   is_active, created_at, updated_at
            FROM sms_configurations
            WHERE is_active = 1
            ORDER BY updated_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(config)
    }

    async fn save_configuration(&self, config: &SmsConfiguration) -> StorageResult<i64> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let id = if config.id == 0 {
            sqlx::query(
                r#"
                INSERT INTO sms_configurations (
                    provider_name, api_key, api_url, sender_name,
                    is_active, created_at, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&config.provider_name)
            .bind(&config.api_key)
            .bind(&config.api_url)
            .bind(&config.sender_name)
            .bind(config.is_active)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid()
        } else {
            let result = sqlx::query(
                r#"
                UPDATE sms_configurations
                SET provider_name = ?, api_key = ?, api_url = ?, sender_name = ?,
                    is_active = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&config.provider_name)
            .bind(&config.api_key)
            .bind(&config.api_url)
            .bind(&config.sender_name)
            .bind(config.is_active)
            .bind(now)
            .bind(config.id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(StorageError::not_found("SmsConfiguration", "id", config.id));
            }
            config.id
        };

        if config.is_active {
            sqlx::query(
                "UPDATE sms_configurations SET is_active = 0, updated_at = ? \
                 WHERE id != ? AND is_active = 1",
            )
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    async fn log_pending(
        &self,
        student_id: Option<i64>,
        phone_number: &str,
        message: &str,
    ) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sms_logs (student_id, phone_number, message, status, sent_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(student_id)
        .bind(phone_number)
        .bind(message)
        .bind(i32::from(SmsStatus::Pending))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn update_log(
        &self,
        log_id: i64,
        status: SmsStatus,
        error_message: Option<&str>,
        provider_response: Option<&str>,
    ) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE sms_logs
            SET status = ?, error_message = ?, provider_response = ?, sent_at = ?
            WHERE id = ?
            "#,
        )
        .bind(i32::from(status))
        .bind(error_message)
        .bind(provider_response)
        .bind(Utc::now())
        .bind(log_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("SmsLog", "id", log_id));
        }
        Ok(())
    }

    async fn find_logs(&self, filter: &SmsLogFilter) -> StorageResult<Vec<SmsLog>> {
        let logs = sqlx::query_as::<_, SmsLog>(
            r#"
            SELECT id, student_id, phone_number, message, status,
                   error_message, provider_response, sent_at
            FROM sms_logs
            WHERE (?1 IS NULL OR student_id = ?1)
              AND (?2 IS NULL OR sent_at >= ?2)
              AND (?3 IS NULL OR sent_at < ?3)
            ORDER BY sent_at DESC, id DESC
            LIMIT ?4
            "#,
        )
        .bind(filter.student_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn count_sent_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM sms_logs
            WHERE status IN (?, ?) AND sent_at >= ? AND sent_at < ?
            "#,
        )
        .bind(i32::from(SmsStatus::Sent))
        .bind(i32::from(SmsStatus::Delivered))
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;
    use chrono::Duration;

    async fn setup() -> (Database, SqliteSmsRepository) {
        let db = Database::in_memory().await.unwrap();
        let repo = SqliteSmsRepository::new(db.pool().clone());
        (db, repo)
    }

    #[tokio::test]
    async fn test_no_configuration() {
        let (_db, repo) = setup().await;
        assert!(repo.active_configuration().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_saving_active_configuration_deactivates_others() {
        let (_db, repo) = setup().await;

        let first = repo
            .save_configuration(&SmsConfiguration::new(
                "Semaphore",
                "key-1",
                "https://api.example.test/messages",
                "SCHOOL",
            ))
            .await
            .unwrap();
        let second = repo
            .save_configuration(&SmsConfiguration::new(
                "Semaphore",
                "key-2",
                "https://api.example.test/messages",
                "SCHOOL2",
            ))
            .await
            .unwrap();
        assert_ne!(first, second);

        let active = repo.active_configuration().await.unwrap().unwrap();
        assert_eq!(active.id, second);
        assert_eq!(active.api_key, "key-2");
    }

    #[tokio::test]
    async fn test_inactive_configuration_not_returned() {
        let (_db, repo) = setup().await;
        let mut config = SmsConfiguration::new("Semaphore", "key", "https://x.test", "SCHOOL");
        config.id = repo.save_configuration(&config).await.unwrap();

        config.is_active = false;
        repo.save_configuration(&config).await.unwrap();
        assert!(repo.active_configuration().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_configuration() {
        let (_db, repo) = setup().await;
        let mut config = SmsConfiguration::new("Semaphore", "key", "https://x.test", "SCHOOL");
        config.id = 77;
        assert!(matches!(
            repo.save_configuration(&config).await,
            Err(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_log_lifecycle() {
        let (_db, repo) = setup().await;

        let id = repo
            .log_pending(None, "+639171234567", "Hello")
            .await
            .unwrap();
        let logs = repo.find_logs(&SmsLogFilter::default()).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].get_status(), Some(SmsStatus::Pending));

        repo.update_log(id, SmsStatus::Sent, None, Some(r#"{"status":"Queued"}"#))
            .await
            .unwrap();
        let logs = repo.find_logs(&SmsLogFilter::default()).await.unwrap();
        assert_eq!(logs[0].get_status(), Some(SmsStatus::Sent));
        assert_eq!(logs[0].provider_response.as_deref(), Some(r#"{"status":"Queued"}"#));

        let now = Utc::now();
        let count = repo
            .count_sent_between(now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_failed_logs_not_counted_and_filterable() {
        let (_db, repo) = setup().await;

        let id = repo.log_pending(None, "+639170000000", "A").await.unwrap();
        repo.update_log(id, SmsStatus::Failed, Some("HTTP Error: 500 - boom"), None)
            .await
            .unwrap();
        repo.log_pending(None, "+639171111111", "B").await.unwrap();

        let now = Utc::now();
        let count = repo
            .count_sent_between(now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(count, 0);

        let limited = repo
            .find_logs(&SmsLogFilter::default().limit(1))
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);

        let none = repo
            .find_logs(&SmsLogFilter::default().student(5))
            .await
            .unwrap();
        assert!(none.is_empty());

        let windowed = repo
            .find_logs(&SmsLogFilter::default().between(now - Duration::hours(1), now + Duration::hours(1)))
            .await
            .unwrap();
        assert_eq!(windowed.len(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_log() {
        let (_db, repo) = setup().await;
        assert!(matches!(
            repo.update_log(9, SmsStatus::Sent, None, None).await,
            Err(StorageError::NotFound { .. })
        ));
    }
}
