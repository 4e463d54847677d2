use crate::config::Config;
use crate::db::models::DbAccount;
use crate::db::schema::SETTING_BOOTSTRAP_ADMIN;
use crate::error::{GatehouseError, StorageContext};
use crate::types::{Account, Role};
use chrono::Utc;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions,
};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

pub type SqlitePool = Pool<Sqlite>;

/// Open the SQLite pool described by `cfg`. Does not touch the schema.
pub async fn connect(cfg: &Config) -> Result<SqlitePool, GatehouseError> {
    let opts = SqliteConnectOptions::from_str(&cfg.database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        // Prevent transient "database is locked" errors under concurrent access.
        .busy_timeout(Duration::from_secs(cfg.busy_timeout_secs));

    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.max_connections.max(1))
        .connect_with(opts)
        .await?;
    Ok(pool)
}

/// Column list shared by every account read.
const ACCOUNT_COLUMNS: &str =
    "id, username, email, password_hash, user_role, meta_data, created_at, updated_at";

pub struct NewAccount<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
}

#[derive(Clone)]
pub struct AccountsStorage {
    pool: SqlitePool,
}

impl AccountsStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// True if any account uses `username` as its username or its email.
    pub async fn username_taken(&self, username: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1 OR email = ?1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
    }

    /// Insert on the caller's connection so it joins the caller's transaction.
    pub async fn insert(
        conn: &mut SqliteConnection,
        new: NewAccount<'_>,
    ) -> Result<DbAccount, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as(&format!(
            r#"INSERT INTO users (username, email, password_hash, user_role, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)
               RETURNING {ACCOUNT_COLUMNS}"#
        ))
        .bind(new.username)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.role.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(conn)
        .await
    }

    /// Find the account whose username or email equals `ident`.
    /// A username match wins over an email match; ties go to the oldest row.
    pub async fn find_by_login(&self, ident: &str) -> Result<Option<Account>, GatehouseError> {
        let row: Option<DbAccount> = sqlx::query_as(&format!(
            r#"SELECT {ACCOUNT_COLUMNS} FROM users
               WHERE username = ?1 OR email = ?1
               ORDER BY CASE WHEN username = ?1 THEN 0 ELSE 1 END, id
               LIMIT 1"#
        ))
        .bind(ident)
        .fetch_optional(&self.pool)
        .await
        .storage("failed to query user")?;
        row.map(Account::try_from).transpose()
    }
}

/// Owner-less settings rows. Every call runs on a caller-supplied connection.
pub struct SettingsStorage;

impl SettingsStorage {
    pub async fn get_global(
        conn: &mut SqliteConnection,
        key: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT setting_value FROM settings WHERE user_id IS NULL AND setting_key = ?",
        )
        .bind(key)
        .fetch_optional(conn)
        .await
    }

    /// Write `value` unless a non-empty value is already stored.
    /// The partial unique index on global keys makes racing writers resolve to
    /// one row; the first non-empty value wins. Returns true if this call wrote.
    pub async fn put_global_if_blank(
        conn: &mut SqliteConnection,
        key: &str,
        value: &str,
    ) -> Result<bool, sqlx::Error> {
        let now = Utc::now();
        let res = sqlx::query(
            r#"
            INSERT INTO settings (user_id, setting_key, setting_value, created_at, updated_at)
            VALUES (NULL, ?, ?, ?, ?)
            ON CONFLICT(setting_key) WHERE user_id IS NULL DO UPDATE SET
                setting_value = excluded.setting_value,
                updated_at = excluded.updated_at
            WHERE settings.setting_value = ''
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .bind(now)
        .execute(conn)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    /// Claim the one-time bootstrap flag. Succeeds only while no account
    /// exists and nobody else has claimed it.
    pub async fn claim_bootstrap(conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
        let now = Utc::now();
        let res = sqlx::query(
            r#"
            INSERT INTO settings (user_id, setting_key, setting_value, created_at, updated_at)
            SELECT NULL, ?1, '', ?2, ?2
            WHERE NOT EXISTS (SELECT 1 FROM users)
            ON CONFLICT(setting_key) WHERE user_id IS NULL DO NOTHING
            "#,
        )
        .bind(SETTING_BOOTSTRAP_ADMIN)
        .bind(now)
        .execute(conn)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    /// Record which account the bootstrap flag was spent on.
    pub async fn mark_bootstrap(
        conn: &mut SqliteConnection,
        account_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"UPDATE settings SET setting_value = ?, updated_at = ?
               WHERE user_id IS NULL AND setting_key = ?"#,
        )
        .bind(account_id.to_string())
        .bind(Utc::now())
        .bind(SETTING_BOOTSTRAP_ADMIN)
        .execute(conn)
        .await?;
        Ok(())
    }
}
