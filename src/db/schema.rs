//! SQL the core owns directly. Application tables come from migrations.

/// Ledger of applied migrations. Created by the migrator before anything else.
/// - `file_name` UNIQUE: one row per migration name
/// - `checksum` SHA-256 hex of the content; NULL for rows predating checksums
/// - `success` BOOLEAN (stored as INTEGER 0/1)
pub const MIGRATIONS_LEDGER: &str = r#"
CREATE TABLE IF NOT EXISTS migrations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_name TEXT NOT NULL UNIQUE,
    checksum TEXT NULL,
    executed_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    success BOOLEAN NOT NULL DEFAULT 1
)
"#;

/// Upgrade for ledgers created before the checksum column existed.
pub const MIGRATIONS_ADD_CHECKSUM: &str = "ALTER TABLE migrations ADD COLUMN checksum TEXT NULL";

/// Global (owner-less) settings row holding the base64 signing key.
pub const SETTING_JWT_SECRET: &str = "jwt_secret";

/// Global settings row marking that the bootstrap admin has been created.
pub const SETTING_BOOTSTRAP_ADMIN: &str = "bootstrap_admin";
