// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

use crate::cache::DEFAULT_MAX_ENTRIES;
use crate::resolver::{CyclePolicy, MissingRootPolicy};

/// Configuration parameters for an [`Authorizer`](crate::Authorizer).
#[derive(Clone, Debug)]
pub struct AuthorizerConfig {
    /// What a chain contains when its root slug is unknown.
    ///
    /// Default: only the root slug itself.
    pub(crate) missing_root: MissingRootPolicy,

    /// Behaviour when the hierarchy contains a cycle.
    ///
    /// Default: truncate and log a warning.
    pub(crate) on_cycle: CyclePolicy,

    /// Maximum age of cached chains (`None` keeps them until invalidated).
    ///
    /// Default: `None`.
    pub(crate) cache_ttl: Option<Duration>,

    /// Maximum number of cached chains per unit kind (`None` for no limit).
    ///
    /// Default: `Some(4096)`.
    pub(crate) cache_max_entries: Option<usize>,

    /// Maximum time to wait for the hierarchy store while resolving a chain (`None` waits
    /// forever).
    ///
    /// Default: `None`.
    pub(crate) resolve_timeout: Option<Duration>,
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            missing_root: MissingRootPolicy::default(),
            on_cycle: CyclePolicy::default(),
            cache_ttl: None,
            cache_max_entries: Some(DEFAULT_MAX_ENTRIES),
            resolve_timeout: None,
        }
    }
}

impl AuthorizerConfig {
    /// Return a default instance of `AuthorizerConfig`.
    pub fn new() -> Self {
        Default::default()
    }

    pub fn missing_root(mut self, policy: MissingRootPolicy) -> Self {
        self.missing_root = policy;
        self
    }

    pub fn on_cycle(mut self, policy: CyclePolicy) -> Self {
        self.on_cycle = policy;
        self
    }

    /// Treat cached chains older than the given duration as missing.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Limit the number of cached chains per unit kind, `None` removes the limit.
    pub fn cache_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.cache_max_entries = max_entries;
        self
    }

    /// Fail a chain resolution which takes longer than the given duration.
    pub fn resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = Some(timeout);
        self
    }
}
