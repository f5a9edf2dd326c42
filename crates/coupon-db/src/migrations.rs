//! # Schema Migrations
//!
//! The SQL files under `crates/coupon-db/migrations/` are compiled into the
//! binary and applied by [`Database::open`](crate::Database::open).
//!
//! ```text
//! migrations/
//! └── 001_create_coupons.sql   coupons table, kind + is_active indexes
//! ```
//!
//! sqlx keeps a `_sqlx_migrations` ledger in the store itself, so opening an
//! up-to-date store only reads that table.
//!
//! New schema changes go in a new `NNN_description.sql` file. Applied files
//! are checksummed; editing one breaks every existing store.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Applies whatever the store has not seen yet. Safe to call repeatedly.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Migrating coupon schema");
    MIGRATOR.run(pool).await?;
    info!("Coupon schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts. A store that was never migrated
/// reports zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((MIGRATOR.migrations.len(), applied.max(0) as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_run_migrations_twice_is_harmless() {
        let db = Database::open(DbConfig::in_memory().without_migrations())
            .await
            .unwrap();
        assert_eq!(migration_status(db.pool()).await.unwrap().1, 0);

        run_migrations(db.pool()).await.unwrap();
        run_migrations(db.pool()).await.unwrap();

        let (embedded, applied) = migration_status(db.pool()).await.unwrap();
        assert_eq!(embedded, applied);
    }
}
