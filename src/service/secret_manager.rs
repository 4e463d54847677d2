//! Lifecycle of the single global token-signing secret.

use crate::db::schema::SETTING_JWT_SECRET;
use crate::db::{SettingsStorage, SqlitePool};
use crate::error::{GatehouseError, StorageContext};
use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sqlx::sqlite::SqliteConnection;
use tracing::{debug, info};

/// Raw key length before base64 encoding.
pub const SECRET_LEN: usize = 32;

#[derive(Clone)]
pub struct SecretManager {
    pool: SqlitePool,
}

impl SecretManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Make sure a non-empty secret is stored. No-op when one already is.
    pub async fn ensure(&self) -> Result<(), GatehouseError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .storage("failed to acquire connection")?;
        Self::ensure_on(&mut conn).await
    }

    /// Same as [`SecretManager::ensure`], on a connection the caller owns
    /// (typically one holding an open transaction).
    pub async fn ensure_on(conn: &mut SqliteConnection) -> Result<(), GatehouseError> {
        let current = SettingsStorage::get_global(&mut *conn, SETTING_JWT_SECRET)
            .await
            .storage("failed to read signing secret")?;
        if current.is_some_and(|v| !v.is_empty()) {
            return Ok(());
        }

        let wrote = SettingsStorage::put_global_if_blank(
            &mut *conn,
            SETTING_JWT_SECRET,
            &generate_secret(),
        )
        .await
        .storage("failed to store signing secret")?;

        if wrote {
            info!("generated new signing secret");
        } else {
            debug!("signing secret was provisioned concurrently; keeping existing value");
        }
        Ok(())
    }

    /// Fetch and decode the current secret. Always reads storage.
    pub async fn get(&self) -> Result<Vec<u8>, GatehouseError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .storage("failed to acquire connection")?;
        let value = SettingsStorage::get_global(&mut conn, SETTING_JWT_SECRET)
            .await
            .storage("failed to retrieve signing secret")?;

        match value {
            Some(v) if !v.is_empty() => STANDARD
                .decode(v.trim())
                .map_err(|e| GatehouseError::Secret(e.to_string())),
            _ => Err(GatehouseError::SecretNotFound),
        }
    }
}

fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_LEN];
    OsRng.fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}
