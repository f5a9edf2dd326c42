//! # Connection Pool
//!
//! Opens the SQLite coupon store and hands out repositories.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  StoreConfig::load()  ──  COUPON_DB_PATH / --db                         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  DbConfig ──► Database::open ──► SqlitePool ──► migrations              │
//! │                                      │                                  │
//! │                  ┌───────────────────┴──────────────────┐               │
//! │                  ▼                                      ▼               │
//! │         db.coupons()                             db.service()           │
//! │         CouponRepository                         CouponService          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! File stores run in WAL mode: listing coupons never waits on the writer
//! that bumps a usage counter. `":memory:"` opens a private in-memory store.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::coupon::CouponRepository;
use crate::service::CouponService;

/// Path marker for an in-memory store.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// How to open the coupon store.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("./coupons.db").with_max_connections(8);
/// let db = Database::open(config).await?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// SQLite file, created on first open. `":memory:"` for a throwaway store.
    pub database_path: PathBuf,
    /// Pool size. Default 5; always 1 for in-memory stores.
    pub max_connections: u32,
    /// How long a caller waits for a free connection. Default 30s.
    pub acquire_timeout: Duration,
    /// Apply pending migrations on open. Default true.
    pub migrate_on_open: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            migrate_on_open: true,
        }
    }

    /// A private in-memory store, used by tests.
    pub fn in_memory() -> Self {
        DbConfig::new(IN_MEMORY_PATH).with_acquire_timeout(Duration::from_secs(5))
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Opens the store without touching its schema.
    pub fn without_migrations(mut self) -> Self {
        self.migrate_on_open = false;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY_PATH
    }

    /// Every connection to an in-memory store sees a different database,
    /// so the pool is pinned to one connection that never idles out.
    fn pool_options(&self) -> SqlitePoolOptions {
        if self.is_in_memory() {
            return SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .acquire_timeout(self.acquire_timeout);
        }

        SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let url = if self.is_in_memory() {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite://{}", self.database_path.display())
        };

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .foreign_keys(true);

        if self.is_in_memory() {
            return Ok(options);
        }

        Ok(options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal))
    }
}

/// Handle to an open coupon store. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the store and, unless disabled, brings its schema up to date.
    ///
    /// ## Errors
    /// - `ConnectionFailed` - bad path, permissions, unreadable file
    /// - `MigrationFailed` - schema could not be migrated
    pub async fn open(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening coupon store");

        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(max_connections = pool.options().get_max_connections(), "Pool ready");

        let db = Database { pool };
        if config.migrate_on_open {
            migrations::run_migrations(&db.pool).await?;
        }
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn coupons(&self) -> CouponRepository {
        CouponRepository::new(self.pool.clone())
    }

    pub fn service(&self) -> CouponService {
        CouponService::new(self.coupons())
    }

    /// True while the store answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Closes every connection; later queries fail.
    pub async fn close(&self) {
        info!("Closing coupon store");
        self.pool.close().await;
    }
}
