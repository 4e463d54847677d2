use crate::error::GatehouseError;
use crate::migrate::SkipPolicy;
use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime configuration, resolved from defaults then `GATEHOUSE_*` env vars.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub loglevel: String,
    /// SQLite permits one writer at a time; more connections only help readers.
    pub max_connections: u32,
    pub busy_timeout_secs: u64,
    /// Load `*.sql` files from here instead of the bundled migrations.
    pub migrations_dir: Option<PathBuf>,
    pub skip_policy: SkipPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://gatehouse.db".to_string(),
            loglevel: "info".to_string(),
            max_connections: 1,
            busy_timeout_secs: 5,
            migrations_dir: None,
            skip_policy: SkipPolicy::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, GatehouseError> {
        Self::from_figment(Figment::from(Serialized::defaults(Config::default())))
    }

    fn from_figment(base: Figment) -> Result<Self, GatehouseError> {
        Ok(base.merge(Env::prefixed("GATEHOUSE_")).extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_extract_cleanly() {
        let cfg = Config::from_figment(Figment::from(Serialized::defaults(Config::default())))
            .expect("defaults must extract");
        assert_eq!(cfg.max_connections, 1);
        assert_eq!(cfg.skip_policy, SkipPolicy::SuccessfulOnly);
        assert!(cfg.migrations_dir.is_none());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let base = Figment::from(Serialized::defaults(Config::default()))
            .merge(Serialized::default("skip_policy", "any_recorded"))
            .merge(Serialized::default("database_url", "sqlite://other.db"));
        let cfg = Config::from_figment(base).expect("overrides must extract");
        assert_eq!(cfg.skip_policy, SkipPolicy::AnyRecorded);
        assert_eq!(cfg.database_url, "sqlite://other.db");
    }
}
