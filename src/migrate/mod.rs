//! Ordered, transactional, ledger-tracked schema migrations.
//!
//! - `source.rs`: where migration scripts come from
//! - `ledger.rs`: the `migrations` table
//! - `runner.rs`: [`SchemaMigrator`], applied once at startup

pub mod ledger;
pub mod runner;
pub mod source;

pub use ledger::MigrationLedger;
pub use runner::{MigrationReport, SchemaMigrator, SkipPolicy};
pub use source::{DirectoryMigrations, EmbeddedMigrations, Migration, MigrationSource};
