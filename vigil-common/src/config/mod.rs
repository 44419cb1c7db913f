mod defaults;

use std::path::PathBuf;
use std::time::Duration;

use defaults::*;
use serde::{Deserialize, Serialize};

use crate::Secret;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VigilConfigStore {
    #[serde(default = "_default_database_url")]
    pub database_url: Secret<String>,

    /// How long the in-process blocklist snapshot may lag behind the
    /// database before it is refreshed wholesale.
    #[serde(default = "_default_block_cache_ttl", with = "humantime_serde")]
    pub block_cache_ttl: Duration,

    /// Interval between background sweeps of expired blocks and sessions.
    #[serde(default = "_default_sweep_interval", with = "humantime_serde")]
    pub sweep_interval: Duration,

    /// Login attempts and security events older than this are deleted by
    /// the retention cleanup.
    #[serde(default = "_default_retention", with = "humantime_serde")]
    pub retention: Duration,
}

impl Default for VigilConfigStore {
    fn default() -> Self {
        Self {
            database_url: _default_database_url(),
            block_cache_ttl: _default_block_cache_ttl(),
            sweep_interval: _default_sweep_interval(),
            retention: _default_retention(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VigilConfig {
    pub store: VigilConfigStore,
    pub paths_relative_to: PathBuf,
}

impl Default for VigilConfig {
    fn default() -> Self {
        Self {
            store: VigilConfigStore::default(),
            paths_relative_to: PathBuf::from("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let store: VigilConfigStore = serde_yaml::from_str("{}").unwrap();
        assert_eq!(store.block_cache_ttl, Duration::from_secs(60));
        assert_eq!(store.database_url.expose_secret(), "sqlite:data/db");
    }

    #[test]
    fn test_durations_parse_as_humantime() {
        let store: VigilConfigStore =
            serde_yaml::from_str("block_cache_ttl: 30s\nretention: 7d\n").unwrap();
        assert_eq!(store.block_cache_ttl, Duration::from_secs(30));
        assert_eq!(store.retention, Duration::from_secs(60 * 60 * 24 * 7));
    }
}
