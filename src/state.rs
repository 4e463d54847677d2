use crate::config::Config;
use crate::db::{AccountsStorage, SqlitePool, connect};
use crate::error::GatehouseError;
use crate::migrate::{
    DirectoryMigrations, EmbeddedMigrations, MigrationLedger, MigrationReport, MigrationSource,
    SchemaMigrator, SkipPolicy,
};
use crate::service::{
    AccountRegistrar, CredentialStore, SecretManager, SessionAuthenticator, TokenIssuer,
};
use tracing::info;

/// Shared application state. Only obtainable once migrations have run.
#[derive(Clone)]
pub struct GatehouseState {
    pub pool: SqlitePool,
    pub registrar: AccountRegistrar,
    pub authenticator: SessionAuthenticator,
    pub tokens: TokenIssuer,
    pub ledger: MigrationLedger,
    pub migration_report: MigrationReport,
}

impl GatehouseState {
    /// Connect, migrate, then wire the services. A migration failure aborts
    /// startup.
    pub async fn open(cfg: &Config) -> Result<Self, GatehouseError> {
        let pool = connect(cfg).await?;
        info!(database_url = %cfg.database_url, "database connected");
        match cfg.migrations_dir.as_ref() {
            Some(dir) => {
                Self::with_source(pool, &DirectoryMigrations::new(dir), cfg.skip_policy).await
            }
            None => Self::with_source(pool, &EmbeddedMigrations, cfg.skip_policy).await,
        }
    }

    pub async fn with_source(
        pool: SqlitePool,
        source: &dyn MigrationSource,
        policy: SkipPolicy,
    ) -> Result<Self, GatehouseError> {
        let migrator = SchemaMigrator::new(pool.clone(), policy);
        let migration_report = migrator.run(source).await?;

        let secrets = SecretManager::new(pool.clone());
        let tokens = TokenIssuer::new(secrets);
        let accounts = AccountsStorage::new(pool.clone());
        let credentials = CredentialStore::new();

        Ok(Self {
            registrar: AccountRegistrar::new(accounts.clone(), credentials, tokens.clone()),
            authenticator: SessionAuthenticator::new(accounts, credentials, tokens.clone()),
            tokens,
            ledger: migrator.ledger().clone(),
            migration_report,
            pool,
        })
    }
}
