// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use roster_store::{HierarchyStore, Slug, UnitKind};
use thiserror::Error;
use tracing::debug;

use crate::cache::ClosureCache;
use crate::caller::CallerContext;
use crate::config::AuthorizerConfig;
use crate::descriptor::PermissionDescriptor;
use crate::resolver::{HierarchyChain, ResolveError, Resolver};

#[derive(Debug, Error)]
pub enum AuthError<E> {
    #[error(transparent)]
    Resolve(#[from] ResolveError<E>),

    /// Resolving the chain took longer than the configured timeout. Nothing was cached.
    #[error("resolving {kind} hierarchy chain of '{root}' timed out after {timeout:?}")]
    Timeout {
        kind: UnitKind,
        root: Slug,
        timeout: Duration,
    },
}

/// Decides whether a caller holds any of a list of required permissions.
///
/// The authorizer is cheap to clone, all clones share the same [`ClosureCache`].
#[derive(Clone, Debug)]
pub struct Authorizer<S> {
    store: S,
    cache: Arc<ClosureCache>,
    resolver: Resolver,
    resolve_timeout: Option<Duration>,
}

impl<S> Authorizer<S>
where
    S: HierarchyStore + Sync,
{
    /// Authorizer with default configuration and its own cache.
    pub fn new(store: S) -> Self {
        Self::from_config(store, &AuthorizerConfig::default())
    }

    pub fn from_config(store: S, config: &AuthorizerConfig) -> Self {
        let mut cache = ClosureCache::new().with_max_entries(config.cache_max_entries);
        if let Some(ttl) = config.cache_ttl {
            cache = cache.with_ttl(ttl);
        }
        Self::with_cache(store, Arc::new(cache), config)
    }

    /// Authorizer using an existing, possibly shared cache.
    pub fn with_cache(store: S, cache: Arc<ClosureCache>, config: &AuthorizerConfig) -> Self {
        Self {
            store,
            cache,
            resolver: Resolver::new(config.missing_root, config.on_cycle),
            resolve_timeout: config.resolve_timeout,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &Arc<ClosureCache> {
        &self.cache
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn resolve_timeout(&self) -> Option<Duration> {
        self.resolve_timeout
    }

    /// Hierarchy chain rooted at `root`, served from the cache when possible.
    pub async fn resolve_chain(
        &self,
        root: &Slug,
        kind: UnitKind,
    ) -> Result<Arc<HierarchyChain>, AuthError<S::Error>> {
        let resolution = self.cache.get(&self.store, &self.resolver, root, kind);

        match self.resolve_timeout {
            // Dropping the resolution on timeout also drops its pending cache write.
            Some(timeout) => tokio::time::timeout(timeout, resolution)
                .await
                .map_err(|_| AuthError::Timeout {
                    kind,
                    root: root.clone(),
                    timeout,
                })?
                .map_err(AuthError::from),
            None => resolution.await.map_err(AuthError::from),
        }
    }

    /// Returns `true` if `caller` is the unit `required` or any of its transitive subordinates.
    pub async fn check_membership(
        &self,
        kind: UnitKind,
        caller: &Slug,
        required: &Slug,
    ) -> Result<bool, AuthError<S::Error>> {
        let chain = self.resolve_chain(required, kind).await?;
        Ok(chain.contains(caller.as_str()))
    }

    /// Returns `true` if the caller satisfies at least one of the required descriptors.
    ///
    /// An empty list means no restriction. Tier and scope descriptors are checked first as they
    /// need no store access, unit descriptors are only resolved when none of them matched.
    ///
    /// A store failure while resolving any unit descriptor fails the whole check.
    pub async fn authorize(
        &self,
        caller: &CallerContext,
        required: &[PermissionDescriptor],
    ) -> Result<bool, AuthError<S::Error>> {
        if required.is_empty() {
            return Ok(true);
        }

        if required
            .iter()
            .any(|descriptor| descriptor.granted_by_rank_or_scope(caller))
        {
            return Ok(true);
        }

        for descriptor in required {
            let PermissionDescriptor::Unit { kind, slug } = descriptor else {
                continue;
            };

            // Callers without a unit of this kind can't be part of any of its chains.
            let Some(caller_slug) = caller.slug(*kind) else {
                continue;
            };

            if self.check_membership(*kind, caller_slug, slug).await? {
                return Ok(true);
            }
        }

        debug!(tier = %caller.tier, required = required.len(), "access denied");
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use roster_store::{MemoryStore, UnitKind};

    use super::{AuthError, Authorizer};
    use crate::config::AuthorizerConfig;
    use crate::test_utils::{CountingStore, FailingStore, SlowStore, hq_store};
    use crate::{CallerContext, PermissionDescriptor, RankTier};

    #[tokio::test]
    async fn empty_requirements_always_pass() {
        let authorizer = Authorizer::new(FailingStore);
        let caller = CallerContext::default();
        assert!(authorizer.authorize(&caller, &[]).await.unwrap());
    }

    #[tokio::test]
    async fn rank_tier_is_a_floor() {
        let authorizer = Authorizer::new(MemoryStore::new());
        let caller = CallerContext::new(RankTier::Company);

        assert!(
            authorizer
                .authorize(&caller, &[PermissionDescriptor::tier(RankTier::Nco)])
                .await
                .unwrap()
        );
        assert!(
            !authorizer
                .authorize(&caller, &[PermissionDescriptor::tier(RankTier::Command)])
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn scopes_match_exactly() {
        let authorizer = Authorizer::new(MemoryStore::new());
        let caller = CallerContext::new(RankTier::Enlisted).with_scope("Training");

        assert!(
            authorizer
                .authorize(&caller, &[PermissionDescriptor::scope("Training")])
                .await
                .unwrap()
        );
        assert!(
            !authorizer
                .authorize(&caller, &[PermissionDescriptor::scope("training")])
                .await
                .unwrap()
        );
        assert!(
            !authorizer
                .authorize(&caller, &[PermissionDescriptor::scope("Admin")])
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn any_descriptor_is_sufficient() {
        let authorizer = Authorizer::new(hq_store().await);
        let required = [
            PermissionDescriptor::tier(RankTier::Company),
            PermissionDescriptor::billet("hq:lead"),
        ];

        // Only the tier matches.
        let officer = CallerContext::new(RankTier::Company).with_billet("other-branch:lead");
        assert!(authorizer.authorize(&officer, &required).await.unwrap());

        // Only the hierarchy matches.
        let subordinate = CallerContext::new(RankTier::Enlisted).with_billet("hq-1-1:lead");
        assert!(authorizer.authorize(&subordinate, &required).await.unwrap());

        // Neither matches.
        let outsider = CallerContext::new(RankTier::Nco).with_billet("other-branch:lead");
        assert!(!authorizer.authorize(&outsider, &required).await.unwrap());
    }

    #[tokio::test]
    async fn cheap_descriptors_skip_the_store() {
        let store = CountingStore::new(hq_store().await);
        let authorizer = Authorizer::new(store.clone());

        // The unit descriptor comes first in the list but is never resolved.
        let required = [
            PermissionDescriptor::billet("hq:lead"),
            PermissionDescriptor::scope("Admin"),
        ];
        let caller = CallerContext::new(RankTier::Enlisted).with_scope("Admin");
        assert!(authorizer.authorize(&caller, &required).await.unwrap());
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn unit_descriptors_use_matching_kind() {
        let authorizer = Authorizer::new(hq_store().await);

        // A caller holding the position "training:instructor" but no billet.
        let caller = CallerContext::new(RankTier::Enlisted).with_position("training:instructor");

        assert!(
            authorizer
                .authorize(&caller, &[PermissionDescriptor::position("training:lead")])
                .await
                .unwrap()
        );

        // The same slug as billet descriptor does not match: the caller has no billet.
        assert!(
            !authorizer
                .authorize(&caller, &[PermissionDescriptor::billet("training:lead")])
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn superiors_are_not_part_of_subordinate_chains() {
        let authorizer = Authorizer::new(hq_store().await);

        let lead = CallerContext::new(RankTier::Enlisted).with_billet("hq:lead");
        assert!(
            !authorizer
                .authorize(&lead, &[PermissionDescriptor::billet("hq-1:lead")])
                .await
                .unwrap()
        );
        assert!(
            authorizer
                .check_membership(UnitKind::Billet, &"hq-1:lead".into(), &"hq-1:lead".into())
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn store_failures_are_surfaced() {
        let authorizer = Authorizer::new(FailingStore);
        let caller = CallerContext::new(RankTier::Enlisted).with_billet("hq-1:lead");

        let result = authorizer
            .authorize(&caller, &[PermissionDescriptor::billet("hq:lead")])
            .await;
        assert!(matches!(result, Err(AuthError::Resolve(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_stores_time_out_without_caching() {
        let store = SlowStore::new(hq_store().await, Duration::from_secs(10));
        let config = AuthorizerConfig::new().resolve_timeout(Duration::from_secs(2));
        let authorizer = Authorizer::from_config(store, &config);

        let result = authorizer
            .resolve_chain(&"hq:lead".into(), UnitKind::Billet)
            .await;
        assert!(matches!(result, Err(AuthError::Timeout { .. })));
        assert!(authorizer.cache().is_empty(UnitKind::Billet).await);
    }
}
