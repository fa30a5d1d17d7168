// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;
use std::str::FromStr;

use roster_store::{Slug, UnitKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::caller::CallerContext;
use crate::rank::{RankTier, UnknownRankTier};

/// A permission a call site requires.
///
/// Call sites usually pass a list of descriptors, each of them being an alternative sufficient
/// condition.
///
/// Descriptors have a textual form which is used in configuration files and route tables:
///
/// ```text
/// tier:company
/// scope:Training
/// billet:cinder-1:lead
/// position:medical:lead
/// ```
///
/// Only the first `:` separates the prefix, slugs may contain further colons.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PermissionDescriptor {
    /// Minimum rank tier of the caller.
    Tier(RankTier),

    /// Named, non-hierarchical grant, for example a department membership.
    Scope(String),

    /// Organisational unit whose hierarchy chain defines who is authorised.
    Unit { kind: UnitKind, slug: Slug },
}

impl PermissionDescriptor {
    pub fn tier(tier: RankTier) -> Self {
        Self::Tier(tier)
    }

    pub fn scope(scope: impl Into<String>) -> Self {
        Self::Scope(scope.into())
    }

    pub fn billet(slug: impl Into<Slug>) -> Self {
        Self::Unit {
            kind: UnitKind::Billet,
            slug: slug.into(),
        }
    }

    pub fn position(slug: impl Into<Slug>) -> Self {
        Self::Unit {
            kind: UnitKind::Position,
            slug: slug.into(),
        }
    }

    /// Check descriptors which can be decided on the caller context alone.
    ///
    /// Always returns `false` for unit descriptors.
    pub(crate) fn granted_by_rank_or_scope(&self, caller: &CallerContext) -> bool {
        match self {
            Self::Tier(required) => caller.tier.satisfies(*required),
            Self::Scope(scope) => caller.has_scope(scope),
            Self::Unit { .. } => false,
        }
    }
}

impl Display for PermissionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tier(tier) => write!(f, "tier:{tier}"),
            Self::Scope(scope) => write!(f, "scope:{scope}"),
            Self::Unit { kind, slug } => write!(f, "{kind}:{slug}"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("permission descriptor '{0}' is missing a prefix")]
    MissingPrefix(String),

    #[error("unknown permission descriptor prefix '{0}'")]
    UnknownPrefix(String),

    #[error("permission descriptor '{0}' has an empty value")]
    EmptyValue(String),

    #[error(transparent)]
    RankTier(#[from] UnknownRankTier),
}

impl FromStr for PermissionDescriptor {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, value) = s
            .split_once(':')
            .ok_or_else(|| DescriptorError::MissingPrefix(s.to_string()))?;

        if value.is_empty() {
            return Err(DescriptorError::EmptyValue(s.to_string()));
        }

        match prefix {
            "tier" => Ok(Self::Tier(value.parse()?)),
            "scope" => Ok(Self::Scope(value.to_string())),
            "billet" => Ok(Self::billet(value)),
            "position" => Ok(Self::position(value)),
            _ => Err(DescriptorError::UnknownPrefix(prefix.to_string())),
        }
    }
}

impl TryFrom<String> for PermissionDescriptor {
    type Error = DescriptorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PermissionDescriptor> for String {
    fn from(value: PermissionDescriptor) -> Self {
        value.to_string()
    }
}
