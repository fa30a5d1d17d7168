// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities.
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use roster_store::test_utils::insert_tree;
use roster_store::{HierarchyStore, HierarchyWriter, MemoryStore, Slug, Unit, UnitId, UnitKind};
use thiserror::Error;

pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}

/// Billet hierarchy used throughout the tests:
///
/// ```text
/// hq:lead
/// ├── hq-1:lead
/// │   └── hq-1-1:lead
/// └── hq-2:lead
/// other-branch:lead
/// ```
///
/// The department-position hierarchy holds `training:lead` with `training:instructor` below.
pub async fn hq_store() -> MemoryStore {
    let store = MemoryStore::new();
    insert_tree(
        &store,
        UnitKind::Billet,
        &[
            ("hq:lead", None),
            ("hq-1:lead", Some("hq:lead")),
            ("hq-2:lead", Some("hq:lead")),
            ("hq-1-1:lead", Some("hq-1:lead")),
            ("other-branch:lead", None),
        ],
    )
    .await;
    insert_tree(
        &store,
        UnitKind::Position,
        &[
            ("training:lead", None),
            ("training:instructor", Some("training:lead")),
        ],
    )
    .await;
    store
}

/// Wraps a store and counts every query issued to it.
#[derive(Clone, Debug)]
pub struct CountingStore<S> {
    inner: S,
    calls: Arc<AtomicUsize>,
}

impl<S> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Arc::default(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of store queries issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl<S> HierarchyStore for CountingStore<S>
where
    S: HierarchyStore + Sync,
{
    type Error = S::Error;

    async fn find_unit_by_slug(
        &self,
        slug: &Slug,
        kind: UnitKind,
    ) -> Result<Option<Unit>, Self::Error> {
        self.count();
        self.inner.find_unit_by_slug(slug, kind).await
    }

    async fn find_subordinates(
        &self,
        unit_id: &UnitId,
        kind: UnitKind,
    ) -> Result<Vec<Unit>, Self::Error> {
        self.count();
        self.inner.find_subordinates(unit_id, kind).await
    }

    async fn list_units(&self, kind: UnitKind) -> Result<Vec<Unit>, Self::Error> {
        self.count();
        self.inner.list_units(kind).await
    }
}

/// Wraps a store and delays every lookup of a unit by slug, writes pass through.
#[derive(Clone, Debug)]
pub struct SlowStore<S> {
    inner: S,
    delay: Duration,
}

impl<S> SlowStore<S> {
    pub fn new(inner: S, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl<S> HierarchyStore for SlowStore<S>
where
    S: HierarchyStore + Sync,
{
    type Error = S::Error;

    async fn find_unit_by_slug(
        &self,
        slug: &Slug,
        kind: UnitKind,
    ) -> Result<Option<Unit>, Self::Error> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_unit_by_slug(slug, kind).await
    }

    async fn find_subordinates(
        &self,
        unit_id: &UnitId,
        kind: UnitKind,
    ) -> Result<Vec<Unit>, Self::Error> {
        self.inner.find_subordinates(unit_id, kind).await
    }

    async fn list_units(&self, kind: UnitKind) -> Result<Vec<Unit>, Self::Error> {
        self.inner.list_units(kind).await
    }
}

impl<S> HierarchyWriter for SlowStore<S>
where
    S: HierarchyWriter + Sync,
{
    async fn insert_unit(&self, kind: UnitKind, unit: &Unit) -> Result<bool, Self::Error> {
        self.inner.insert_unit(kind, unit).await
    }

    async fn set_superior(
        &self,
        kind: UnitKind,
        unit_id: &UnitId,
        superior_id: Option<&UnitId>,
    ) -> Result<bool, Self::Error> {
        self.inner.set_superior(kind, unit_id, superior_id).await
    }

    async fn set_slug(
        &self,
        kind: UnitKind,
        unit_id: &UnitId,
        slug: &Slug,
    ) -> Result<bool, Self::Error> {
        self.inner.set_slug(kind, unit_id, slug).await
    }

    async fn delete_unit(&self, kind: UnitKind, unit_id: &UnitId) -> Result<bool, Self::Error> {
        self.inner.delete_unit(kind, unit_id).await
    }
}

#[derive(Debug, Error)]
#[error("hierarchy store unavailable at 10.0.0.7:5432")]
pub struct StoreUnavailable;

/// Store which fails every query, as if the database was unreachable.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingStore;

impl HierarchyStore for FailingStore {
    type Error = StoreUnavailable;

    async fn find_unit_by_slug(
        &self,
        _slug: &Slug,
        _kind: UnitKind,
    ) -> Result<Option<Unit>, Self::Error> {
        Err(StoreUnavailable)
    }

    async fn find_subordinates(
        &self,
        _unit_id: &UnitId,
        _kind: UnitKind,
    ) -> Result<Vec<Unit>, Self::Error> {
        Err(StoreUnavailable)
    }

    async fn list_units(&self, _kind: UnitKind) -> Result<Vec<Unit>, Self::Error> {
        Err(StoreUnavailable)
    }
}
