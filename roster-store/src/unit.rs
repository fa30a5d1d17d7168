// SPDX-License-Identifier: MIT OR Apache-2.0

use std::borrow::Borrow;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two hierarchies of the organisation.
///
/// Units of different kinds never reference each other, a billet can only have a billet as its
/// superior and a department position only another department position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Operational role or seat in the unit structure.
    Billet,

    /// Role within a functional department.
    Position,
}

impl UnitKind {
    pub const ALL: [UnitKind; 2] = [UnitKind::Billet, UnitKind::Position];

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Billet => "billet",
            UnitKind::Position => "position",
        }
    }
}

impl Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown unit kind '{0}'")]
pub struct UnknownUnitKind(String);

impl FromStr for UnitKind {
    type Err = UnknownUnitKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "billet" => Ok(UnitKind::Billet),
            "position" => Ok(UnitKind::Position),
            _ => Err(UnknownUnitKind(s.to_string())),
        }
    }
}

/// Opaque identifier of a unit, stable for the unit's lifetime.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(String);

impl UnitId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UnitId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UnitId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-readable unique key of a unit, for example `"cinder-1:lead"`.
///
/// Slugs are the external reference to units, they are used in permission descriptors and as
/// cache keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Slug {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Slug {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for Slug {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Organisational unit, either a billet or a department position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,

    pub slug: Slug,

    /// Display label, never used for authorisation.
    pub name: Option<String>,

    /// Direct superior of the same kind, `None` marks a root of the hierarchy.
    pub superior_id: Option<UnitId>,
}

impl Unit {
    /// Unit with a fresh random identifier.
    pub fn new(slug: impl Into<Slug>, superior_id: Option<UnitId>) -> Self {
        Self {
            id: UnitId::random(),
            slug: slug.into(),
            name: None,
            superior_id,
        }
    }

    pub fn with_id(mut self, id: impl Into<UnitId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_root(&self) -> bool {
        self.superior_id.is_none()
    }
}
