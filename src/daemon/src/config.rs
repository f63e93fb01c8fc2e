// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Configuration (`SPEC_FULL.md` §6): JSON file mode or environment
//! fallback, validated once into a [`Config`] before the daemon starts.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use cr_scheduler::ConfigSource;
use cr_types::error::RollupError;
use cr_types::Endpoint;
use serde::Deserialize;
use tracing::warn;

const DEFAULT_NUM_THREADS: usize = 32;

/// The JSON config file's shape. Every field is optional here; validation
/// into [`Config`] happens in [`Config::from_raw`].
#[derive(Deserialize, Debug, Default)]
struct RawConfig {
    acl_password: Option<String>,
    zk_coordination: Option<bool>,
    zk_servers: Option<Vec<String>>,
    cassandra_servers: Option<Vec<String>>,
    cassandra_username: Option<String>,
    cassandra_password: Option<String>,
    keyspace: Option<String>,
    num_threads: Option<usize>,
}

/// Validated daemon configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub acl_password: String,
    pub zk_coordination: bool,
    pub zk_servers: Vec<String>,
    pub cassandra_servers: Vec<String>,
    pub cassandra_username: Option<String>,
    pub cassandra_password: Option<String>,
    pub keyspace: String,
    pub num_threads: usize,
}

impl Config {
    /// Loads configuration from `config_file` if present, otherwise from
    /// the environment variables listed in `SPEC_FULL.md` §6.
    pub fn load(config_file: Option<&Path>) -> Result<Self, RollupError> {
        match config_file {
            Some(path) => Self::from_file(path),
            None => Self::from_env(),
        }
    }

    fn from_file(path: &Path) -> Result<Self, RollupError> {
        let contents = fs::read_to_string(path).map_err(|error| RollupError::ConfigInvalid {
            reason: format!("could not read config file {}: {error}", path.display()),
        })?;
        let raw: RawConfig = serde_json::from_str(&contents).map_err(|error| RollupError::ConfigInvalid {
            reason: format!("config file {} is not valid JSON: {error}", path.display()),
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, RollupError> {
        Ok(Config {
            acl_password: require(raw.acl_password, "acl_password")?,
            zk_coordination: raw.zk_coordination.unwrap_or(false),
            zk_servers: require(raw.zk_servers, "zk_servers")?,
            cassandra_servers: require(raw.cassandra_servers, "cassandra_servers")?,
            cassandra_username: raw.cassandra_username,
            cassandra_password: raw.cassandra_password,
            keyspace: require(raw.keyspace, "keyspace")?,
            num_threads: raw.num_threads.unwrap_or(DEFAULT_NUM_THREADS),
        })
    }

    /// Matches `original_source/config.py`'s `ZOOKEEPER_ENV`/`KEY_MAPPINGS`
    /// tables: comma-separated list vars are split on `,`.
    fn from_env() -> Result<Self, RollupError> {
        let acl_password = require_env("ZOOKEEPER_ACL_PASSWORD")?;
        let zk_servers = split_csv(&require_env("ZOOKEEPER_SERVERS")?);
        let zk_coordination = std::env::var("ZOOKEEPER_COORDINATION")
            .map(|value| value == "true")
            .unwrap_or(false);
        let cassandra_servers = split_csv(&require_env("CASSANDRA_SERVERS")?);
        let cassandra_username = std::env::var("CASSANDRA_USERNAME").ok();
        let cassandra_password = std::env::var("CASSANDRA_PASSWORD").ok();
        let keyspace = require_env("CASSANDRA_KEYSPACE")?;
        let num_threads = std::env::var("ROLLUP_THREADS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_NUM_THREADS);

        Ok(Config {
            acl_password,
            zk_coordination,
            zk_servers,
            cassandra_servers,
            cassandra_username,
            cassandra_password,
            keyspace,
            num_threads,
        })
    }
}

fn require<T>(value: Option<T>, key: &str) -> Result<T, RollupError> {
    value.ok_or_else(|| RollupError::ConfigInvalid {
        reason: format!("missing required config key {key}"),
    })
}

fn require_env(key: &str) -> Result<String, RollupError> {
    std::env::var(key).map_err(|_| RollupError::ConfigInvalid {
        reason: format!("missing required environment variable {key}"),
    })
}

fn split_csv(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

/// Rereads configuration on every call, so the scheduler always sees the
/// latest `cassandra_servers`/`zk_servers`/`num_threads` without a daemon
/// restart (`SPEC_FULL.md` §4.6 step 2, "allows hot reconfiguration").
pub struct DaemonConfigSource {
    config_file: Option<PathBuf>,
}

impl DaemonConfigSource {
    pub fn new(config_file: Option<PathBuf>) -> Self {
        DaemonConfigSource { config_file }
    }

    fn reload(&self) -> Option<Config> {
        match Config::load(self.config_file.as_deref()) {
            Ok(config) => Some(config),
            Err(error) => {
                warn!(%error, "failed to reread configuration, keeping the previous cycle's values");
                None
            }
        }
    }
}

impl ConfigSource for DaemonConfigSource {
    fn current_endpoints(&self) -> BTreeSet<Endpoint> {
        self.reload()
            .map(|config| config.cassandra_servers.into_iter().collect())
            .unwrap_or_default()
    }

    fn current_coordination_hosts(&self) -> Vec<String> {
        self.reload().map(|config| config.zk_servers).unwrap_or_default()
    }

    fn num_threads(&self) -> usize {
        self.reload().map(|config| config.num_threads).unwrap_or(DEFAULT_NUM_THREADS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_fills_defaults_for_optional_keys() {
        let raw = RawConfig {
            acl_password: Some("secret".to_string()),
            zk_coordination: None,
            zk_servers: Some(vec!["zk1:2181".to_string()]),
            cassandra_servers: Some(vec!["10.0.0.1".to_string()]),
            cassandra_username: None,
            cassandra_password: None,
            keyspace: Some("metrics".to_string()),
            num_threads: None,
        };
        let config = Config::from_raw(raw).unwrap();
        assert!(!config.zk_coordination);
        assert_eq!(config.num_threads, DEFAULT_NUM_THREADS);
    }

    #[test]
    fn from_raw_rejects_a_missing_required_key() {
        let raw = RawConfig {
            acl_password: None,
            ..RawConfig::default()
        };
        let error = Config::from_raw(raw).unwrap_err();
        assert!(matches!(error, RollupError::ConfigInvalid { .. }));
    }

    #[test]
    fn split_csv_trims_and_drops_empty_entries() {
        assert_eq!(split_csv("a, b,,c"), vec!["a", "b", "c"]);
    }
}
