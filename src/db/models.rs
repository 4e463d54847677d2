use crate::error::GatehouseError;
use crate::types::{Account, Role};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbAccount {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub user_role: String,
    pub meta_data: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbAccount> for Account {
    type Error = GatehouseError;

    fn try_from(d: DbAccount) -> Result<Self, Self::Error> {
        let user_role: Role = d
            .user_role
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?;
        Ok(Account {
            id: d.id,
            username: d.username,
            email: d.email,
            user_role,
            password_hash: d.password_hash,
            meta_data: d.meta_data,
            created_at: d.created_at,
            updated_at: d.updated_at,
        })
    }
}

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct MigrationRecord {
    pub id: i64,
    pub file_name: String,
    pub checksum: Option<String>,
    pub executed_at: DateTime<Utc>,
    pub success: bool,
}
