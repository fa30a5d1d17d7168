// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structural changes to the billet and department-position hierarchies.
//!
//! Cached hierarchy chains are only correct as long as every write is followed by an
//! invalidation. All writes therefore go through [`Organisation`], which shares its
//! [`ClosureCache`] with the [`Authorizer`] and drops the whole namespace of the changed kind
//! after each of them.
use std::sync::Arc;

use roster_store::{HierarchyWriter, Slug, Unit, UnitId, UnitKind};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::authorizer::Authorizer;
use crate::cache::ClosureCache;
use crate::graph::{self, AuditReport};
use crate::resolver::{CyclePolicy, MissingRootPolicy, ResolveError, Resolver};

#[derive(Debug, Error)]
pub enum OrganisationError<E> {
    #[error("hierarchy store error: {0}")]
    Store(#[source] E),

    #[error("unknown {kind} '{slug}'")]
    UnknownUnit { kind: UnitKind, slug: Slug },

    #[error("unknown superior {kind} '{slug}'")]
    UnknownSuperior { kind: UnitKind, slug: Slug },

    #[error("{kind} slug '{slug}' is already taken")]
    DuplicateSlug { kind: UnitKind, slug: Slug },

    /// The new superior is the unit itself or one of its subordinates.
    #[error("moving '{slug}' below '{superior}' would create a cycle")]
    WouldCycle { slug: Slug, superior: Slug },

    #[error(transparent)]
    Resolve(#[from] ResolveError<E>),
}

/// Write access to the hierarchies with enforced cache invalidation.
///
/// Writes are serialised: a write holds a lock from its first lookup until its store update
/// completed, so the cycle check of [`Organisation::move_unit`] always sees the effect of every
/// earlier write. Clones share the lock. Writes issued through a separately constructed
/// `Organisation`, or directly to the store, are not covered.
#[derive(Clone, Debug)]
pub struct Organisation<S> {
    store: S,
    cache: Arc<ClosureCache>,
    writes: Arc<Mutex<()>>,
}

impl<S> Organisation<S>
where
    S: HierarchyWriter + Sync,
{
    /// Organisation invalidating the given cache on every write.
    pub fn new(store: S, cache: Arc<ClosureCache>) -> Self {
        Self {
            store,
            cache,
            writes: Arc::default(),
        }
    }

    /// Organisation writing to the same store and cache an authorizer reads from.
    pub fn from_authorizer(authorizer: &Authorizer<S>) -> Self
    where
        S: Clone,
    {
        Self::new(authorizer.store().clone(), authorizer.cache().clone())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &Arc<ClosureCache> {
        &self.cache
    }

    pub async fn unit(
        &self,
        kind: UnitKind,
        slug: &Slug,
    ) -> Result<Unit, OrganisationError<S::Error>> {
        self.store
            .find_unit_by_slug(slug, kind)
            .await
            .map_err(OrganisationError::Store)?
            .ok_or_else(|| OrganisationError::UnknownUnit {
                kind,
                slug: slug.clone(),
            })
    }

    async fn superior_id(
        &self,
        kind: UnitKind,
        superior: Option<&Slug>,
    ) -> Result<Option<UnitId>, OrganisationError<S::Error>> {
        let Some(slug) = superior else {
            return Ok(None);
        };

        match self.unit(kind, slug).await {
            Ok(unit) => Ok(Some(unit.id)),
            Err(OrganisationError::UnknownUnit { kind, slug }) => {
                Err(OrganisationError::UnknownSuperior { kind, slug })
            }
            Err(err) => Err(err),
        }
    }

    /// Drop all cached chains of a kind, whatever the outcome of the write was.
    async fn invalidated<T>(
        &self,
        kind: UnitKind,
        result: Result<T, S::Error>,
    ) -> Result<T, OrganisationError<S::Error>> {
        self.cache.invalidate(kind, None).await;
        result.map_err(OrganisationError::Store)
    }

    /// Create a unit below `superior`, or a new root when no superior is given.
    pub async fn create_unit(
        &self,
        kind: UnitKind,
        slug: impl Into<Slug>,
        name: Option<String>,
        superior: Option<&Slug>,
    ) -> Result<Unit, OrganisationError<S::Error>> {
        let _write = self.writes.lock().await;
        let superior_id = self.superior_id(kind, superior).await?;

        let mut unit = Unit::new(slug, superior_id);
        unit.name = name;

        let result = self.store.insert_unit(kind, &unit).await;
        if !self.invalidated(kind, result).await? {
            return Err(OrganisationError::DuplicateSlug {
                kind,
                slug: unit.slug,
            });
        }

        info!(%kind, slug = %unit.slug, "created unit");
        Ok(unit)
    }

    /// Attach a unit to a new superior, `None` turns it into a root.
    ///
    /// Fails with [`OrganisationError::WouldCycle`] when the new superior is part of the unit's
    /// own hierarchy chain.
    pub async fn move_unit(
        &self,
        kind: UnitKind,
        slug: &Slug,
        superior: Option<&Slug>,
    ) -> Result<(), OrganisationError<S::Error>> {
        let _write = self.writes.lock().await;
        let unit = self.unit(kind, slug).await?;
        let superior_id = self.superior_id(kind, superior).await?;

        if let Some(superior) = superior {
            // Always resolve against the store, a cached chain might be stale while other
            // writes are in flight.
            let resolver = Resolver::new(MissingRootPolicy::Deny, CyclePolicy::Truncate);
            let chain = resolver.resolve(&self.store, &unit.slug, kind).await?;
            if chain.contains(superior.as_str()) {
                return Err(OrganisationError::WouldCycle {
                    slug: unit.slug,
                    superior: superior.clone(),
                });
            }
        }

        let result = self
            .store
            .set_superior(kind, &unit.id, superior_id.as_ref())
            .await;
        if !self.invalidated(kind, result).await? {
            // Deleted between lookup and update.
            return Err(OrganisationError::UnknownUnit {
                kind,
                slug: slug.clone(),
            });
        }

        info!(%kind, %slug, superior = ?superior.map(Slug::as_str), "moved unit");
        Ok(())
    }

    pub async fn rename_unit(
        &self,
        kind: UnitKind,
        slug: &Slug,
        new_slug: impl Into<Slug>,
    ) -> Result<(), OrganisationError<S::Error>> {
        let _write = self.writes.lock().await;
        let unit = self.unit(kind, slug).await?;
        let new_slug = new_slug.into();

        let result = self.store.set_slug(kind, &unit.id, &new_slug).await;
        if !self.invalidated(kind, result).await? {
            return Err(self.rename_failure(kind, &unit, new_slug).await);
        }

        info!(%kind, %slug, %new_slug, "renamed unit");
        Ok(())
    }

    /// Tell apart the two reasons for a rejected slug update: the unit vanished or another unit
    /// holds the slug.
    async fn rename_failure(
        &self,
        kind: UnitKind,
        unit: &Unit,
        new_slug: Slug,
    ) -> OrganisationError<S::Error> {
        match self.store.find_unit_by_slug(&new_slug, kind).await {
            Ok(Some(holder)) if holder.id != unit.id => OrganisationError::DuplicateSlug {
                kind,
                slug: new_slug,
            },
            Ok(_) => OrganisationError::UnknownUnit {
                kind,
                slug: unit.slug.clone(),
            },
            Err(err) => OrganisationError::Store(err),
        }
    }

    /// Delete a unit, its direct subordinates become roots.
    pub async fn delete_unit(
        &self,
        kind: UnitKind,
        slug: &Slug,
    ) -> Result<(), OrganisationError<S::Error>> {
        let _write = self.writes.lock().await;
        let unit = self.unit(kind, slug).await?;

        let result = self.store.delete_unit(kind, &unit.id).await;
        if !self.invalidated(kind, result).await? {
            return Err(OrganisationError::UnknownUnit {
                kind,
                slug: slug.clone(),
            });
        }

        info!(%kind, %slug, "deleted unit");
        Ok(())
    }

    /// Report cycles and dangling superior references of a hierarchy.
    pub async fn audit(&self, kind: UnitKind) -> Result<AuditReport, OrganisationError<S::Error>> {
        let units = self
            .store
            .list_units(kind)
            .await
            .map_err(OrganisationError::Store)?;
        let report = graph::audit(&units);
        debug!(
            %kind,
            units = units.len(),
            cycles = report.cycles.len(),
            dangling = report.dangling.len(),
            "audited hierarchy"
        );
        Ok(report)
    }

    /// Render a hierarchy in graphviz dot format.
    pub async fn to_dot(&self, kind: UnitKind) -> Result<String, OrganisationError<S::Error>> {
        let units = self
            .store
            .list_units(kind)
            .await
            .map_err(OrganisationError::Store)?;
        Ok(graph::to_dot(&units))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use roster_store::{HierarchyStore, HierarchyWriter, MemoryStore, Slug, Unit, UnitKind};

    use std::time::Duration;

    use roster_store::test_utils::insert_tree;

    use super::{Organisation, OrganisationError};
    use crate::cache::ClosureCache;
    use crate::test_utils::{SlowStore, hq_store};
    use crate::{Authorizer, CallerContext, PermissionDescriptor, RankTier};

    fn slug(value: &str) -> Slug {
        Slug::from(value)
    }

    #[tokio::test]
    async fn create_below_existing_superior() {
        let organisation = Organisation::new(hq_store().await, Arc::new(ClosureCache::new()));

        let unit = organisation
            .create_unit(
                UnitKind::Billet,
                "hq-3:lead",
                Some("Third platoon".into()),
                Some(&slug("hq:lead")),
            )
            .await
            .unwrap();
        assert_eq!(unit.name.as_deref(), Some("Third platoon"));
        assert_eq!(
            organisation
                .unit(UnitKind::Billet, &slug("hq-3:lead"))
                .await
                .unwrap(),
            unit
        );

        let result = organisation
            .create_unit(UnitKind::Billet, "hq-3:lead", None, None)
            .await;
        assert!(matches!(result, Err(OrganisationError::DuplicateSlug { .. })));

        let result = organisation
            .create_unit(UnitKind::Billet, "hq-4:lead", None, Some(&slug("nope")))
            .await;
        assert!(matches!(result, Err(OrganisationError::UnknownSuperior { .. })));
    }

    #[tokio::test]
    async fn moves_into_own_chain_are_rejected() {
        let organisation = Organisation::new(hq_store().await, Arc::new(ClosureCache::new()));

        for superior in ["hq:lead", "hq-1-1:lead"] {
            let result = organisation
                .move_unit(UnitKind::Billet, &slug("hq:lead"), Some(&slug(superior)))
                .await;
            assert!(
                matches!(result, Err(OrganisationError::WouldCycle { .. })),
                "moving below {superior}"
            );
        }

        // Moving a subtree to another branch is fine.
        organisation
            .move_unit(
                UnitKind::Billet,
                &slug("hq-1:lead"),
                Some(&slug("other-branch:lead")),
            )
            .await
            .unwrap();
        assert!(organisation.audit(UnitKind::Billet).await.unwrap().is_healthy());
    }

    #[tokio::test]
    async fn writes_invalidate_cached_chains() {
        let authorizer = Authorizer::new(hq_store().await);
        let organisation = Organisation::from_authorizer(&authorizer);
        let caller = CallerContext::new(RankTier::Enlisted).with_billet("hq-1-1:lead");
        let required = [PermissionDescriptor::billet("hq:lead")];

        assert!(authorizer.authorize(&caller, &required).await.unwrap());
        assert!(!authorizer.cache().is_empty(UnitKind::Billet).await);

        organisation
            .move_unit(UnitKind::Billet, &slug("hq-1:lead"), None)
            .await
            .unwrap();
        assert!(authorizer.cache().is_empty(UnitKind::Billet).await);
        assert!(!authorizer.authorize(&caller, &required).await.unwrap());

        organisation
            .move_unit(
                UnitKind::Billet,
                &slug("hq-1:lead"),
                Some(&slug("hq-2:lead")),
            )
            .await
            .unwrap();
        assert!(authorizer.authorize(&caller, &required).await.unwrap());
    }

    #[tokio::test]
    async fn rename_and_delete() {
        let authorizer = Authorizer::new(hq_store().await);
        let organisation = Organisation::from_authorizer(&authorizer);

        organisation
            .rename_unit(UnitKind::Billet, &slug("hq-1:lead"), "alpha:lead")
            .await
            .unwrap();
        let result = organisation
            .rename_unit(UnitKind::Billet, &slug("hq-2:lead"), "alpha:lead")
            .await;
        assert!(matches!(result, Err(OrganisationError::DuplicateSlug { .. })));

        let chain = authorizer
            .resolve_chain(&slug("hq:lead"), UnitKind::Billet)
            .await
            .unwrap();
        assert!(chain.contains("alpha:lead"));
        assert!(!chain.contains("hq-1:lead"));

        organisation
            .delete_unit(UnitKind::Billet, &slug("alpha:lead"))
            .await
            .unwrap();
        let chain = authorizer
            .resolve_chain(&slug("hq:lead"), UnitKind::Billet)
            .await
            .unwrap();
        assert_eq!(chain.len(), 2);

        // The former subordinate is a root now.
        let orphan = organisation
            .unit(UnitKind::Billet, &slug("hq-1-1:lead"))
            .await
            .unwrap();
        assert!(orphan.is_root());

        let result = organisation
            .delete_unit(UnitKind::Billet, &slug("alpha:lead"))
            .await;
        assert!(matches!(result, Err(OrganisationError::UnknownUnit { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_crossing_moves_cannot_form_a_cycle() {
        let store = MemoryStore::new();
        insert_tree(
            &store,
            UnitKind::Billet,
            &[("a:lead", None), ("b:lead", None)],
        )
        .await;
        let organisation = Organisation::new(
            SlowStore::new(store, Duration::from_millis(100)),
            Arc::new(ClosureCache::new()),
        );

        let (a, b) = (slug("a:lead"), slug("b:lead"));
        let (a_below_b, b_below_a) = tokio::join!(
            organisation.move_unit(UnitKind::Billet, &a, Some(&b)),
            organisation.move_unit(UnitKind::Billet, &b, Some(&a)),
        );

        assert!(a_below_b.is_ok());
        assert!(matches!(
            b_below_a,
            Err(OrganisationError::WouldCycle { .. })
        ));
        assert!(organisation.audit(UnitKind::Billet).await.unwrap().is_healthy());
    }

    #[tokio::test]
    async fn rejected_renames_name_the_actual_cause() {
        let organisation = Organisation::new(hq_store().await, Arc::new(ClosureCache::new()));
        let unit = organisation
            .unit(UnitKind::Billet, &slug("hq-2:lead"))
            .await
            .unwrap();

        let err = organisation
            .rename_failure(UnitKind::Billet, &unit, slug("hq-1:lead"))
            .await;
        assert!(matches!(err, OrganisationError::DuplicateSlug { .. }));

        // The unit disappeared between lookup and update.
        organisation
            .delete_unit(UnitKind::Billet, &slug("hq-2:lead"))
            .await
            .unwrap();
        let err = organisation
            .rename_failure(UnitKind::Billet, &unit, slug("alpha:lead"))
            .await;
        assert!(matches!(
            err,
            OrganisationError::UnknownUnit { slug: ref gone, .. } if gone.as_str() == "hq-2:lead"
        ));
    }

    #[tokio::test]
    async fn audit_reports_cycles_written_behind_its_back() {
        let store = MemoryStore::new();
        let a = Unit::new("a:lead", None);
        let b = Unit::new("b:lead", Some(a.id.clone()));
        store.insert_unit(UnitKind::Position, &a).await.unwrap();
        store.insert_unit(UnitKind::Position, &b).await.unwrap();
        store
            .set_superior(UnitKind::Position, &a.id, Some(&b.id))
            .await
            .unwrap();

        let organisation = Organisation::new(store, Arc::new(ClosureCache::new()));
        let report = organisation.audit(UnitKind::Position).await.unwrap();
        assert_eq!(report.cycles, vec![vec![slug("a:lead"), slug("b:lead")]]);
        assert!(organisation.audit(UnitKind::Billet).await.unwrap().is_healthy());

        let dot = organisation.to_dot(UnitKind::Position).await.unwrap();
        assert!(dot.contains("a:lead"));
        assert_eq!(
            organisation
                .store()
                .list_units(UnitKind::Position)
                .await
                .unwrap()
                .len(),
            2
        );
    }
}
