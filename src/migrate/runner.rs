use crate::db::SqlitePool;
use crate::error::{GatehouseError, StorageContext};
use crate::migrate::ledger::MigrationLedger;
use crate::migrate::source::{Migration, MigrationSource};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Which ledger rows cause a migration to be skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipPolicy {
    /// Only successful runs are skipped; recorded failures are retried.
    #[default]
    SuccessfulOnly,
    /// Any recorded run is skipped, failed or not.
    AnyRecorded,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

pub struct SchemaMigrator {
    pool: SqlitePool,
    ledger: MigrationLedger,
    policy: SkipPolicy,
}

impl SchemaMigrator {
    pub fn new(pool: SqlitePool, policy: SkipPolicy) -> Self {
        Self {
            ledger: MigrationLedger::new(pool.clone()),
            pool,
            policy,
        }
    }

    /// Apply pending migrations in lexicographic name order, stopping at the
    /// first failure.
    pub async fn run(
        &self,
        source: &dyn MigrationSource,
    ) -> Result<MigrationReport, GatehouseError> {
        self.ledger.ensure_table().await?;

        let mut migrations = source.migrations()?;
        migrations.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(pair) = migrations.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(GatehouseError::migration(
                &pair[0].name,
                "duplicate migration name",
            ));
        }

        let mut report = MigrationReport::default();
        for migration in &migrations {
            let checksum = migration.checksum();
            match self.ledger.find(&migration.name).await? {
                Some(record) if record.success => {
                    if let Some(recorded) = record.checksum.as_deref()
                        && recorded != checksum
                    {
                        return Err(GatehouseError::migration(
                            &migration.name,
                            format!("checksum mismatch (recorded {recorded}, found {checksum})"),
                        ));
                    }
                    debug!(migration = %migration.name, "already applied");
                    report.skipped.push(migration.name.clone());
                    continue;
                }
                Some(_) if self.policy == SkipPolicy::AnyRecorded => {
                    warn!(migration = %migration.name, "skipping previously failed migration");
                    report.skipped.push(migration.name.clone());
                    continue;
                }
                Some(_) => {
                    info!(migration = %migration.name, "retrying previously failed migration");
                }
                None => {}
            }

            self.apply(migration, &checksum).await?;
            report.applied.push(migration.name.clone());
        }

        info!(
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            "migrations complete"
        );
        Ok(report)
    }

    async fn apply(&self, migration: &Migration, checksum: &str) -> Result<(), GatehouseError> {
        let name = migration.name.as_str();
        info!(migration = %name, "applying migration");

        let mut tx = self
            .pool
            .begin()
            .await
            .storage("failed to begin migration transaction")?;

        if let Err(e) = sqlx::raw_sql(&migration.sql).execute(&mut *tx).await {
            // Release the connection before recording; the pool may hold only one.
            if let Err(rb) = tx.rollback().await {
                warn!(migration = %name, error = %rb, "rollback failed");
            }
            self.ledger.record_failure(name, checksum).await;
            error!(migration = %name, error = %e, "migration failed");
            return Err(GatehouseError::migration(name, e));
        }

        MigrationLedger::record_success(&mut tx, name, checksum)
            .await
            .map_err(|e| GatehouseError::migration(name, e))?;
        tx.commit()
            .await
            .map_err(|e| GatehouseError::migration(name, e))?;
        Ok(())
    }

    pub fn ledger(&self) -> &MigrationLedger {
        &self.ledger
    }
}
