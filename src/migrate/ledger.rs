use crate::db::MigrationRecord;
use crate::db::SqlitePool;
use crate::db::schema::{MIGRATIONS_ADD_CHECKSUM, MIGRATIONS_LEDGER};
use crate::error::{GatehouseError, StorageContext};
use chrono::Utc;
use sqlx::sqlite::SqliteConnection;
use tracing::{info, warn};

#[derive(Clone)]
pub struct MigrationLedger {
    pool: SqlitePool,
}

impl MigrationLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the ledger table, upgrading ledgers that predate checksums.
    pub async fn ensure_table(&self) -> Result<(), GatehouseError> {
        sqlx::query(MIGRATIONS_LEDGER)
            .execute(&self.pool)
            .await
            .storage("failed to create migrations table")?;

        let has_checksum: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM pragma_table_info('migrations') WHERE name = 'checksum')",
        )
        .fetch_one(&self.pool)
        .await
        .storage("failed to inspect migrations table")?;
        if !has_checksum {
            info!("adding checksum column to migrations ledger");
            sqlx::query(MIGRATIONS_ADD_CHECKSUM)
                .execute(&self.pool)
                .await
                .storage("failed to upgrade migrations table")?;
        }
        Ok(())
    }

    pub async fn find(&self, name: &str) -> Result<Option<MigrationRecord>, GatehouseError> {
        sqlx::query_as(
            "SELECT id, file_name, checksum, executed_at, success FROM migrations WHERE file_name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .storage("failed to check migration status")
    }

    /// All records, most recent first.
    pub async fn list(&self) -> Result<Vec<MigrationRecord>, GatehouseError> {
        sqlx::query_as(
            r#"SELECT id, file_name, checksum, executed_at, success
               FROM migrations ORDER BY executed_at DESC, id DESC"#,
        )
        .fetch_all(&self.pool)
        .await
        .storage("failed to list migrations")
    }

    /// Record success inside the migration's own transaction. Replaces a
    /// failure row left by an earlier run.
    pub async fn record_success(
        conn: &mut SqliteConnection,
        name: &str,
        checksum: &str,
    ) -> Result<(), sqlx::Error> {
        Self::upsert(conn, name, checksum, true).await
    }

    /// Best effort: a failure to write the failure row is logged and dropped.
    pub async fn record_failure(&self, name: &str, checksum: &str) {
        let res = match self.pool.acquire().await {
            Ok(mut conn) => Self::upsert(&mut conn, name, checksum, false).await,
            Err(e) => Err(e),
        };
        if let Err(e) = res {
            warn!(migration = %name, error = %e, "could not record failed migration");
        }
    }

    async fn upsert(
        conn: &mut SqliteConnection,
        name: &str,
        checksum: &str,
        success: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO migrations (file_name, checksum, executed_at, success)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(file_name) DO UPDATE SET
                checksum = excluded.checksum,
                executed_at = excluded.executed_at,
                success = excluded.success
            "#,
        )
        .bind(name)
        .bind(checksum)
        .bind(Utc::now())
        .bind(success)
        .execute(conn)
        .await?;
        Ok(())
    }
}
