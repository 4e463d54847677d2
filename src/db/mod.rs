//! Database module: connection setup, row models and storage helpers.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and conversions
//! - `schema.rs`: ledger DDL and well-known settings keys
//! - `sqlite.rs`: account and settings storage (SQLite-first)

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{DbAccount, MigrationRecord};
pub use sqlite::{AccountsStorage, NewAccount, SettingsStorage, SqlitePool, connect};
