// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashSet;

use roster_store::{Slug, UnitKind};
use serde::{Deserialize, Serialize};

use crate::rank::RankTier;

/// Resolved identity of the acting principal.
///
/// This is produced by the session layer after authentication. The authorisation core treats it
/// as given and never verifies it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    pub tier: RankTier,

    /// Granted departments and other named permissions.
    pub scopes: HashSet<String>,

    pub billet: Option<Slug>,

    pub position: Option<Slug>,
}

impl CallerContext {
    pub fn new(tier: RankTier) -> Self {
        Self {
            tier,
            ..Default::default()
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.insert(scope.into());
        self
    }

    pub fn with_billet(mut self, slug: impl Into<Slug>) -> Self {
        self.billet = Some(slug.into());
        self
    }

    pub fn with_position(mut self, slug: impl Into<Slug>) -> Self {
        self.position = Some(slug.into());
        self
    }

    /// Exact, case-sensitive scope membership.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    /// The caller's slug in the hierarchy of the given kind.
    pub fn slug(&self, kind: UnitKind) -> Option<&Slug> {
        match kind {
            UnitKind::Billet => self.billet.as_ref(),
            UnitKind::Position => self.position.as_ref(),
        }
    }
}
