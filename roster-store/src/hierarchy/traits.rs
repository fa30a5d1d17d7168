// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error;

use crate::{Slug, Unit, UnitId, UnitKind};

/// Read-only interface for querying organisational units.
///
/// Every method takes the [`UnitKind`] of the hierarchy it queries. Implementations must never
/// return units of another kind.
pub trait HierarchyStore {
    type Error: Error + Send + Sync + 'static;

    /// Get a unit by its slug.
    ///
    /// Returns `None` if no unit with this slug exists in the hierarchy of the given kind.
    fn find_unit_by_slug(
        &self,
        slug: &Slug,
        kind: UnitKind,
    ) -> impl Future<Output = Result<Option<Unit>, Self::Error>> + Send;

    /// Get all units whose direct superior is the given unit.
    fn find_subordinates(
        &self,
        unit_id: &UnitId,
        kind: UnitKind,
    ) -> impl Future<Output = Result<Vec<Unit>, Self::Error>> + Send;

    /// Get all units of a hierarchy.
    fn list_units(&self, kind: UnitKind)
    -> impl Future<Output = Result<Vec<Unit>, Self::Error>> + Send;
}

/// Interface for changing the structure of a hierarchy.
///
/// None of these methods validate the forest invariant or invalidate any derived state, callers
/// are responsible for both.
pub trait HierarchyWriter: HierarchyStore {
    /// Insert a new unit.
    ///
    /// Returns `true` when the insert occurred, or `false` when a unit with the same id or slug
    /// already existed and no insertion occurred.
    fn insert_unit(
        &self,
        kind: UnitKind,
        unit: &Unit,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Point a unit at a new direct superior, `None` turns it into a root.
    ///
    /// Returns `false` when the unit was not found.
    fn set_superior(
        &self,
        kind: UnitKind,
        unit_id: &UnitId,
        superior_id: Option<&UnitId>,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Change the slug of a unit.
    ///
    /// Returns `false` when the unit was not found or the slug is already taken by another unit.
    fn set_slug(
        &self,
        kind: UnitKind,
        unit_id: &UnitId,
        slug: &Slug,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Delete a unit. Its direct subordinates are detached and become roots.
    ///
    /// Returns `true` when the removal occurred and `false` when the unit was not found.
    fn delete_unit(
        &self,
        kind: UnitKind,
        unit_id: &UnitId,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}
