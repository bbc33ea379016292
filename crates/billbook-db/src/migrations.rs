//! # Schema Migrations
//!
//! The SQL under `migrations/sqlite/` is compiled into the binary, so a
//! fresh till needs nothing but the executable.
//!
//! ```text
//! migrations/sqlite/
//! ├── 001_initial_schema.sql   products, customers, staff, held carts,
//! │                            invoices, invoice lines
//! └── 002_product_search.sql   FTS5 index over product name / SKU / category
//! ```
//!
//! Applied files are recorded in `_sqlx_migrations` with their checksum.
//! Never edit an applied file; add `NNN_next_change.sql` instead.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// How far the schema has been brought up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStatus {
    /// Migrations embedded in this build.
    pub total: usize,
    /// Migrations recorded as applied.
    pub applied: usize,
}

impl MigrationStatus {
    pub fn is_current(&self) -> bool {
        self.applied >= self.total
    }
}

/// Applies pending migrations in file order, each in its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let before = migration_status(pool).await?;
    if before.is_current() {
        debug!(applied = before.applied, "Schema is current");
        return Ok(());
    }

    MIGRATOR.run(pool).await?;

    info!(
        from = before.applied,
        to = MIGRATOR.migrations.len(),
        "Schema migrated"
    );
    Ok(())
}

/// Counts embedded vs applied migrations. Reported by `/health`.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    // The bookkeeping table is missing until the first run
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok(MigrationStatus {
        total: MIGRATOR.migrations.len(),
        applied: usize::try_from(applied).unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_all_migrations_applied() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let status = migration_status(db.pool()).await.unwrap();

        assert_eq!(status.total, 2);
        assert!(status.is_current());
    }

    #[tokio::test]
    async fn test_status_before_and_after_first_run() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();
        let status = migration_status(db.pool()).await.unwrap();
        assert_eq!(status.applied, 0);
        assert!(!status.is_current());

        run_migrations(db.pool()).await.unwrap();
        assert!(migration_status(db.pool()).await.unwrap().is_current());
    }
}
