#![allow(dead_code)]

use gatehouse::GatehouseState;
use gatehouse::config::Config;
use gatehouse::db::{SqlitePool, connect};
use tempfile::TempDir;

/// Config pointing at a throwaway database file. Keep the `TempDir` alive for
/// as long as the database is in use.
pub fn temp_config(max_connections: u32) -> (TempDir, Config) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let cfg = Config {
        database_url: format!("sqlite:{}", dir.path().join("gatehouse.db").display()),
        max_connections,
        ..Config::default()
    };
    (dir, cfg)
}

pub async fn open_state() -> (TempDir, GatehouseState) {
    let (dir, cfg) = temp_config(1);
    let state = GatehouseState::open(&cfg).await.expect("open state");
    (dir, state)
}

/// A pool with no schema applied.
pub async fn bare_pool(max_connections: u32) -> (TempDir, SqlitePool) {
    let (dir, cfg) = temp_config(max_connections);
    let pool = connect(&cfg).await.expect("connect");
    (dir, pool)
}
