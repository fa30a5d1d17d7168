// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seniority tiers of a trooper. Greater tiers are assumed to contain all lower ones.
///
/// Tiers are compared by their ordinal position, never by their names.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RankTier {
    /// Enlisted ranks.
    #[default]
    Enlisted,

    /// Non-commissioned officers.
    Nco,

    /// Company-level officers.
    Company,

    /// Command staff.
    Command,
}

impl RankTier {
    pub const ALL: [RankTier; 4] = [
        RankTier::Enlisted,
        RankTier::Nco,
        RankTier::Company,
        RankTier::Command,
    ];

    /// Returns `true` if this tier is at least the required one.
    ///
    /// The required tier is a floor, not an exact match: a `Company` caller satisfies `Nco`.
    pub fn satisfies(&self, required: RankTier) -> bool {
        *self >= required
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RankTier::Enlisted => "enlisted",
            RankTier::Nco => "nco",
            RankTier::Company => "company",
            RankTier::Command => "command",
        }
    }
}

impl Display for RankTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown rank tier '{0}'")]
pub struct UnknownRankTier(pub String);

impl FromStr for RankTier {
    type Err = UnknownRankTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RankTier::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownRankTier(s.to_string()))
    }
}
