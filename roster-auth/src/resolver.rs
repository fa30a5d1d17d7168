// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolution of hierarchy chains.
//!
//! A hierarchy chain is the set of a unit's slug together with the slugs of all its transitive
//! subordinates. It is computed by walking "is superior of" edges downwards starting at the root.
//!
//! The storage layer does not guarantee that the superior relation forms a forest. A unit that is
//! reached a second time is therefore never expanded again, which bounds the walk even when the
//! data contains cycles.
use std::collections::{HashSet, VecDeque};

use roster_store::{HierarchyStore, Slug, UnitId, UnitKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// What to return when the root slug of a chain does not exist in the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingRootPolicy {
    /// The chain only contains the requested slug itself. A mistyped slug still defines a valid,
    /// minimal permission: only a caller holding exactly that slug passes.
    #[default]
    Singleton,

    /// The chain is empty and nobody passes.
    Deny,
}

/// What to do when the walk reaches a unit it has already visited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// Log a warning, stop expanding at the revisited unit and return what was found.
    #[default]
    Truncate,

    /// Fail the resolution with [`ResolveError::Cycle`].
    Reject,
}

#[derive(Debug, Error)]
pub enum ResolveError<E> {
    /// The hierarchy store failed, for example because the database is unreachable.
    #[error("hierarchy store error: {0}")]
    Store(#[source] E),

    /// The superior relation contains a cycle reachable from the root.
    #[error("{kind} hierarchy rooted at '{root}' contains a cycle through '{slug}'")]
    Cycle {
        kind: UnitKind,
        root: Slug,
        slug: Slug,
    },
}

/// Set of slugs formed by a root unit and all its transitive subordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HierarchyChain {
    root: Slug,
    members: HashSet<Slug>,
    cycles: Vec<Slug>,
    root_missing: bool,
}

impl HierarchyChain {
    /// Chain only containing the root itself.
    pub fn singleton(root: Slug) -> Self {
        Self {
            members: HashSet::from([root.clone()]),
            root,
            cycles: Vec::new(),
            root_missing: false,
        }
    }

    /// Chain without any members.
    pub fn empty(root: Slug) -> Self {
        Self {
            root,
            members: HashSet::new(),
            cycles: Vec::new(),
            root_missing: false,
        }
    }

    pub fn root(&self) -> &Slug {
        &self.root
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.members.contains(slug)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slug> {
        self.members.iter()
    }

    pub fn members(&self) -> &HashSet<Slug> {
        &self.members
    }

    /// Slugs at which the walk found an already visited unit.
    ///
    /// A non-empty list means the superior relation is not a forest and this chain might be
    /// missing units.
    pub fn cycles(&self) -> &[Slug] {
        &self.cycles
    }

    pub fn has_cycle(&self) -> bool {
        !self.cycles.is_empty()
    }

    /// Returns `true` if the root slug did not exist in the store and the chain was derived from
    /// the [`MissingRootPolicy`].
    pub fn root_missing(&self) -> bool {
        self.root_missing
    }
}

/// Computes hierarchy chains from a [`HierarchyStore`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Resolver {
    missing_root: MissingRootPolicy,
    on_cycle: CyclePolicy,
}

impl Resolver {
    pub fn new(missing_root: MissingRootPolicy, on_cycle: CyclePolicy) -> Self {
        Self {
            missing_root,
            on_cycle,
        }
    }

    /// Resolve the chain rooted at `root` in the hierarchy of the given kind.
    ///
    /// The walk is breadth-first, but as the result is a set the order carries no meaning. Store
    /// errors are never masked, a missing root is handled according to the [`MissingRootPolicy`].
    pub async fn resolve<S>(
        &self,
        store: &S,
        root: &Slug,
        kind: UnitKind,
    ) -> Result<HierarchyChain, ResolveError<S::Error>>
    where
        S: HierarchyStore + Sync,
    {
        let Some(root_unit) = store
            .find_unit_by_slug(root, kind)
            .await
            .map_err(ResolveError::Store)?
        else {
            debug!(%kind, %root, policy = ?self.missing_root, "root of hierarchy chain not found");
            let mut chain = match self.missing_root {
                MissingRootPolicy::Singleton => HierarchyChain::singleton(root.clone()),
                MissingRootPolicy::Deny => HierarchyChain::empty(root.clone()),
            };
            chain.root_missing = true;
            return Ok(chain);
        };

        let mut chain = HierarchyChain::singleton(root_unit.slug);
        let mut visited: HashSet<UnitId> = HashSet::from([root_unit.id.clone()]);
        let mut queue = VecDeque::from([root_unit.id]);

        while let Some(unit_id) = queue.pop_front() {
            let subordinates = store
                .find_subordinates(&unit_id, kind)
                .await
                .map_err(ResolveError::Store)?;

            for subordinate in subordinates {
                // Every unit has exactly one superior, reaching it twice means we went around a
                // cycle.
                if !visited.insert(subordinate.id.clone()) || chain.contains(subordinate.slug.as_str())
                {
                    warn!(
                        %kind,
                        root = %chain.root,
                        slug = %subordinate.slug,
                        "cycle detected in hierarchy"
                    );

                    match self.on_cycle {
                        CyclePolicy::Truncate => {
                            chain.cycles.push(subordinate.slug);
                            continue;
                        }
                        CyclePolicy::Reject => {
                            return Err(ResolveError::Cycle {
                                kind,
                                root: chain.root,
                                slug: subordinate.slug,
                            });
                        }
                    }
                }

                chain.members.insert(subordinate.slug);
                queue.push_back(subordinate.id);
            }
        }

        debug!(%kind, root = %chain.root, size = chain.len(), "resolved hierarchy chain");

        Ok(chain)
    }
}
