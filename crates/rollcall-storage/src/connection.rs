//! SQLite pool for the kiosk database.
//!
//! The kiosk writes from several tasks at once (card taps and SMS log
//! updates), so file databases are opened in WAL mode with a busy timeout
//! and attendance writes take the write lock up front.

use crate::error::{StorageError, StorageResult};
use sqlx::ConnectOptions;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

const MEMORY_URL: &str = "sqlite::memory:";

/// Where the kiosk database lives and how the pool behaves
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite file, created with its parent directory when missing
    pub database_path: String,

    pub max_connections: u32,

    /// Connections kept open while the kiosk is idle
    pub min_connections: u32,

    /// Connections are recycled after this long
    pub max_lifetime: Duration,

    pub acquire_timeout: Duration,

    /// How long a writer waits for a competing write transaction
    pub busy_timeout: Duration,

    pub create_if_missing: bool,

    /// Apply pending migrations when the pool opens
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_path: "rollcall.db".to_string(),
            max_connections: 4,
            min_connections: 1,
            max_lifetime: Duration::from_secs(30 * 60),
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(10),
            create_if_missing: true,
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    pub fn new(database_path: impl Into<String>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    #[must_use]
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    #[must_use]
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    #[must_use]
    pub fn auto_migrate(mut self, migrate: bool) -> Self {
        self.auto_migrate = migrate;
        self
    }

    fn connect_options(&self) -> StorageResult<SqliteConnectOptions> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", self.database_path))
            .map_err(|e| StorageError::Configuration(format!("Invalid database path: {e}")))?;

        Ok(options
            .create_if_missing(self.create_if_missing)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout)
            .disable_statement_logging())
    }

    fn ensure_parent_dir(&self) -> StorageResult<()> {
        let Some(parent) = Path::new(&self.database_path).parent() else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() || parent.exists() {
            return Ok(());
        }
        std::fs::create_dir_all(parent).map_err(|e| {
            StorageError::Configuration(format!(
                "Failed to create database directory {}: {e}",
                parent.display()
            ))
        })
    }
}

/// Shared handle to the kiosk database
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database file described by `config`.
    ///
    /// ```no_run
    /// use rollcall_storage::connection::{Database, DatabaseConfig};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let db = Database::new(DatabaseConfig::new("/var/lib/rollcall/school.db")).await?;
    /// db.health_check().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(config: DatabaseConfig) -> StorageResult<Self> {
        config.ensure_parent_dir()?;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .max_lifetime(Some(config.max_lifetime))
            .acquire_timeout(config.acquire_timeout)
            .connect_with(config.connect_options()?)
            .await?;

        info!(path = %config.database_path, "Database opened");
        let db = Self { pool };
        if config.auto_migrate {
            db.migrate().await?;
        }
        Ok(db)
    }

    /// Fresh migrated database that lives as long as the pool.
    ///
    /// Every connection to `:memory:` is a separate database, so the pool is
    /// limited to one connection.
    pub async fn in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(MEMORY_URL)?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Apply the embedded migrations from `migrations/`.
    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        debug!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool once checked-out connections are returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
