// SPDX-License-Identifier: MIT OR Apache-2.0

//! Node configuration, read from an optional TOML file.
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use roster_auth::{AuthorizerConfig, CyclePolicy, DEFAULT_MAX_ENTRIES, MissingRootPolicy};
use serde::Deserialize;

pub const DEFAULT_PORT: u16 = 2030;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://roster.sqlite";

pub const DEFAULT_MAX_CONNECTIONS: u32 = 16;

pub const DEFAULT_RESOLVE_TIMEOUT_MS: u64 = 2000;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Address the HTTP server listens on.
    pub bind: SocketAddr,

    pub database_url: String,

    /// Maximum number of connections in the database pool.
    pub max_connections: u32,

    pub authorization: AuthorizationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            authorization: AuthorizationConfig::default(),
        }
    }
}

impl Config {
    pub fn from_toml(value: &str) -> Result<Self> {
        Ok(toml::from_str(value)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let value = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path.display()))?;
        Self::from_toml(&value)
            .with_context(|| format!("invalid config file {}", path.display()))
    }
}

/// The `[authorization]` table.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorizationConfig {
    pub missing_root: MissingRootPolicy,

    pub on_cycle: CyclePolicy,

    /// Seconds after which cached hierarchy chains expire, 0 keeps them until invalidated.
    pub cache_ttl_secs: u64,

    /// Maximum number of cached chains per unit kind, 0 removes the bound.
    pub cache_max_entries: usize,

    /// Milliseconds to wait for the database while resolving a chain, 0 waits forever.
    pub resolve_timeout_ms: u64,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            missing_root: MissingRootPolicy::default(),
            on_cycle: CyclePolicy::default(),
            cache_ttl_secs: 0,
            cache_max_entries: DEFAULT_MAX_ENTRIES,
            resolve_timeout_ms: DEFAULT_RESOLVE_TIMEOUT_MS,
        }
    }
}

impl AuthorizationConfig {
    pub fn authorizer_config(&self) -> AuthorizerConfig {
        let mut config = AuthorizerConfig::new()
            .missing_root(self.missing_root)
            .on_cycle(self.on_cycle)
            .cache_max_entries((self.cache_max_entries > 0).then_some(self.cache_max_entries));

        if self.cache_ttl_secs > 0 {
            config = config.cache_ttl(Duration::from_secs(self.cache_ttl_secs));
        }

        if self.resolve_timeout_ms > 0 {
            config = config.resolve_timeout(Duration::from_millis(self.resolve_timeout_ms));
        }

        config
    }
}
