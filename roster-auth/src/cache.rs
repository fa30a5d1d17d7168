// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide memoization of hierarchy chains.
//!
//! Chains are derived state, correctness depends on every structural write to a hierarchy
//! invalidating the namespace of its kind (see [`Organisation`](crate::Organisation) which does
//! this for all writes it performs). A TTL can be configured on top as a safety net against
//! writes which bypass it.
//!
//! Populating the cache is an idempotent write: two concurrent resolutions of the same root both
//! compute the chain and the later one overwrites the earlier with an identical value.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use roster_store::{HierarchyStore, Slug, UnitKind};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::resolver::{HierarchyChain, ResolveError, Resolver};

#[derive(Debug)]
struct Entry {
    chain: Arc<HierarchyChain>,
    inserted_at: Instant,
}

#[derive(Debug, Default)]
struct Namespace {
    entries: HashMap<Slug, Entry>,

    /// Incremented on every invalidation of this namespace.
    ///
    /// A resolution remembers the epoch it started in and only writes its result back if no
    /// invalidation happened in the meantime, otherwise a chain computed from the old structure
    /// could outlive the invalidation meant to remove it.
    epoch: u64,
}

/// Default maximum number of chains kept per namespace.
pub const DEFAULT_MAX_ENTRIES: usize = 4096;

/// Memo from root slug to its previously computed [`HierarchyChain`].
///
/// Billets and department positions live in separate namespaces and never share entries.
///
/// Only chains of roots which exist in the store are kept, chains derived from the
/// [`MissingRootPolicy`](crate::MissingRootPolicy) are recomputed on every request. Each
/// namespace holds at most `max_entries` chains, the oldest entry is evicted to make room for a
/// new one. Expired entries are dropped as soon as they are seen.
#[derive(Debug)]
pub struct ClosureCache {
    namespaces: RwLock<HashMap<UnitKind, Namespace>>,
    ttl: Option<Duration>,
    max_entries: Option<usize>,
}

impl Default for ClosureCache {
    fn default() -> Self {
        Self {
            namespaces: RwLock::default(),
            ttl: None,
            max_entries: Some(DEFAULT_MAX_ENTRIES),
        }
    }
}

impl ClosureCache {
    /// Cache without TTL holding up to [`DEFAULT_MAX_ENTRIES`] chains per namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat entries older than `ttl` as missing.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Limit the number of chains per namespace, `None` removes the limit.
    pub fn with_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    fn is_fresh(&self, entry: &Entry) -> bool {
        match self.ttl {
            Some(ttl) => entry.inserted_at.elapsed() < ttl,
            None => true,
        }
    }

    /// Get a cached chain if present and fresh.
    pub async fn lookup(&self, kind: UnitKind, root: &Slug) -> Option<Arc<HierarchyChain>> {
        {
            let namespaces = self.namespaces.read().await;
            let entry = namespaces
                .get(&kind)
                .and_then(|namespace| namespace.entries.get(root))?;
            if self.is_fresh(entry) {
                return Some(entry.chain.clone());
            }
        }

        self.evict_expired(kind).await;
        None
    }

    /// Get the cached chain or resolve it, store it and return it.
    ///
    /// Nothing is written when the resolution fails, the root does not exist or the returned
    /// future is dropped before it completed.
    pub async fn get<S>(
        &self,
        store: &S,
        resolver: &Resolver,
        root: &Slug,
        kind: UnitKind,
    ) -> Result<Arc<HierarchyChain>, ResolveError<S::Error>>
    where
        S: HierarchyStore + Sync,
    {
        let epoch = {
            let namespaces = self.namespaces.read().await;
            let namespace = namespaces.get(&kind);

            if let Some(entry) = namespace.and_then(|namespace| namespace.entries.get(root)) {
                if self.is_fresh(entry) {
                    trace!(%kind, %root, "hierarchy chain cache hit");
                    return Ok(entry.chain.clone());
                }
            }

            namespace.map(|namespace| namespace.epoch).unwrap_or_default()
        };

        debug!(%kind, %root, "hierarchy chain cache miss");
        let chain = Arc::new(resolver.resolve(store, root, kind).await?);

        let mut namespaces = self.namespaces.write().await;
        let namespace = namespaces.entry(kind).or_default();

        // Expired entries, including a stale one for this root, go first.
        self.retain_fresh(namespace);

        if chain.root_missing() {
            return Ok(chain);
        }

        if namespace.epoch != epoch {
            debug!(%kind, %root, "namespace invalidated during resolution, result not cached");
            return Ok(chain);
        }

        if let Some(max_entries) = self.max_entries {
            if max_entries == 0 {
                return Ok(chain);
            }

            while namespace.entries.len() >= max_entries {
                let Some(oldest) = namespace
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(slug, _)| slug.clone())
                else {
                    break;
                };
                trace!(%kind, root = %oldest, "evicted hierarchy chain");
                namespace.entries.remove(&oldest);
            }
        }

        namespace.entries.insert(
            root.clone(),
            Entry {
                chain: chain.clone(),
                inserted_at: Instant::now(),
            },
        );

        Ok(chain)
    }

    fn retain_fresh(&self, namespace: &mut Namespace) {
        if self.ttl.is_some() {
            namespace.entries.retain(|_, entry| self.is_fresh(entry));
        }
    }

    async fn evict_expired(&self, kind: UnitKind) {
        let mut namespaces = self.namespaces.write().await;
        if let Some(namespace) = namespaces.get_mut(&kind) {
            self.retain_fresh(namespace);
        }
    }

    /// Remove one entry of a namespace, or all of them when no root is given.
    pub async fn invalidate(&self, kind: UnitKind, root: Option<&Slug>) {
        let mut namespaces = self.namespaces.write().await;
        let namespace = namespaces.entry(kind).or_default();
        namespace.epoch += 1;

        match root {
            Some(root) => {
                namespace.entries.remove(root);
            }
            None => namespace.entries.clear(),
        }

        debug!(%kind, root = ?root.map(Slug::as_str), "invalidated hierarchy chain cache");
    }

    /// Number of cached chains of a kind.
    pub async fn len(&self, kind: UnitKind) -> usize {
        let namespaces = self.namespaces.read().await;
        namespaces
            .get(&kind)
            .map(|namespace| namespace.entries.len())
            .unwrap_or_default()
    }

    pub async fn is_empty(&self, kind: UnitKind) -> bool {
        self.len(kind).await == 0
    }
}
