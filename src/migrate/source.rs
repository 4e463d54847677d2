use crate::error::GatehouseError;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A named blob of SQL statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub name: String,
    pub sql: String,
}

impl Migration {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }

    /// SHA-256 of the content, lowercase hex.
    pub fn checksum(&self) -> String {
        format!("{:x}", Sha256::digest(self.sql.as_bytes()))
    }
}

/// Supplies the set of migrations. Order is imposed by the migrator.
pub trait MigrationSource {
    fn migrations(&self) -> Result<Vec<Migration>, GatehouseError>;
}

impl MigrationSource for Vec<Migration> {
    fn migrations(&self) -> Result<Vec<Migration>, GatehouseError> {
        Ok(self.clone())
    }
}

/// Migrations compiled into the binary from `migrations/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedMigrations;

const BUNDLED: &[(&str, &str)] = &[
    (
        "0001_init.sql",
        include_str!("../../migrations/0001_init.sql"),
    ),
    (
        "0002_add_bookmarks.sql",
        include_str!("../../migrations/0002_add_bookmarks.sql"),
    ),
];

impl MigrationSource for EmbeddedMigrations {
    fn migrations(&self) -> Result<Vec<Migration>, GatehouseError> {
        Ok(BUNDLED
            .iter()
            .map(|(name, sql)| Migration::new(*name, *sql))
            .collect())
    }
}

/// Every `*.sql` file directly inside a directory.
#[derive(Debug, Clone)]
pub struct DirectoryMigrations {
    dir: PathBuf,
}

impl DirectoryMigrations {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl MigrationSource for DirectoryMigrations {
    fn migrations(&self) -> Result<Vec<Migration>, GatehouseError> {
        let mut loaded = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !is_sql_file(&path) {
                debug!(path = %path.display(), "ignoring non-sql file in migrations dir");
                continue;
            }
            let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            loaded.push(Migration::new(name, fs::read_to_string(&path)?));
        }
        info!(path = %self.dir.display(), count = loaded.len(), "loaded migrations from directory");
        Ok(loaded)
    }
}

fn is_sql_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("sql"))
            == Some(true)
}
