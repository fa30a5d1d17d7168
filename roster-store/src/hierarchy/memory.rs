// SPDX-License-Identifier: MIT OR Apache-2.0

use std::convert::Infallible;

use crate::memory::MemoryStore;
use crate::{HierarchyStore, HierarchyWriter, Slug, Unit, UnitId, UnitKind};

fn sorted(mut units: Vec<Unit>) -> Vec<Unit> {
    units.sort_by(|a, b| a.slug.cmp(&b.slug));
    units
}

impl HierarchyStore for MemoryStore {
    type Error = Infallible;

    async fn find_unit_by_slug(
        &self,
        slug: &Slug,
        kind: UnitKind,
    ) -> Result<Option<Unit>, Self::Error> {
        let units = self.units.read().await;
        let unit = units
            .get(&kind)
            .and_then(|units| units.values().find(|unit| &unit.slug == slug))
            .cloned();
        Ok(unit)
    }

    async fn find_subordinates(
        &self,
        unit_id: &UnitId,
        kind: UnitKind,
    ) -> Result<Vec<Unit>, Self::Error> {
        let units = self.units.read().await;
        let subordinates = units
            .get(&kind)
            .map(|units| {
                units
                    .values()
                    .filter(|unit| unit.superior_id.as_ref() == Some(unit_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(sorted(subordinates))
    }

    async fn list_units(&self, kind: UnitKind) -> Result<Vec<Unit>, Self::Error> {
        let units = self.units.read().await;
        let all = units
            .get(&kind)
            .map(|units| units.values().cloned().collect())
            .unwrap_or_default();
        Ok(sorted(all))
    }
}

impl HierarchyWriter for MemoryStore {
    async fn insert_unit(&self, kind: UnitKind, unit: &Unit) -> Result<bool, Self::Error> {
        let mut units = self.units.write().await;
        let units = units.entry(kind).or_default();

        if units.contains_key(&unit.id) || units.values().any(|other| other.slug == unit.slug) {
            return Ok(false);
        }

        units.insert(unit.id.clone(), unit.clone());
        Ok(true)
    }

    async fn set_superior(
        &self,
        kind: UnitKind,
        unit_id: &UnitId,
        superior_id: Option<&UnitId>,
    ) -> Result<bool, Self::Error> {
        let mut units = self.units.write().await;
        let Some(unit) = units.get_mut(&kind).and_then(|units| units.get_mut(unit_id)) else {
            return Ok(false);
        };
        unit.superior_id = superior_id.cloned();
        Ok(true)
    }

    async fn set_slug(
        &self,
        kind: UnitKind,
        unit_id: &UnitId,
        slug: &Slug,
    ) -> Result<bool, Self::Error> {
        let mut units = self.units.write().await;
        let Some(units) = units.get_mut(&kind) else {
            return Ok(false);
        };

        if units
            .values()
            .any(|other| &other.slug == slug && &other.id != unit_id)
        {
            return Ok(false);
        }

        let Some(unit) = units.get_mut(unit_id) else {
            return Ok(false);
        };
        unit.slug = slug.clone();
        Ok(true)
    }

    async fn delete_unit(&self, kind: UnitKind, unit_id: &UnitId) -> Result<bool, Self::Error> {
        let mut units = self.units.write().await;
        let Some(units) = units.get_mut(&kind) else {
            return Ok(false);
        };

        if units.remove(unit_id).is_none() {
            return Ok(false);
        }

        // Detach direct subordinates, they become roots.
        units
            .values_mut()
            .filter(|unit| unit.superior_id.as_ref() == Some(unit_id))
            .for_each(|unit| unit.superior_id = None);

        Ok(true)
    }
}
