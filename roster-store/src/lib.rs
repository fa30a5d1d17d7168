// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interfaces and implementations of persistence layers for the organisational hierarchies of the
//! roster.
//!
//! Two independent hierarchies exist: operational _billets_ and _department positions_. Both are
//! relations of units where every unit optionally points at exactly one direct superior of the
//! same kind. They share the same shape and the same storage interface, the [`UnitKind`] given to
//! every query selects the relation and the two are never mixed.
//!
//! ## Read queries
//!
//! [`HierarchyStore`] offers the read-only interface which is used by the permission resolver in
//! `roster-auth`. It never writes.
//!
//! ## Write queries
//!
//! [`HierarchyWriter`] is used by organisational management to create, move, rename and delete
//! units. Note that none of these methods check the forest invariant of the hierarchy (no unit is
//! its own ancestor), this is left to the caller.
//!
//! ## Store implementations
//!
//! An in-memory solution is provided in the form of a [`MemoryStore`], gated by the `memory`
//! feature flag. A SQLite solution is provided by [`SqliteStore`](sqlite::SqliteStore), gated by
//! the `sqlite` feature flag. Both are enabled by default.
pub mod hierarchy;
#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
mod unit;

pub use hierarchy::{HierarchyStore, HierarchyWriter};
#[cfg(feature = "memory")]
pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteError, SqliteStore, SqliteStoreBuilder};
pub use unit::{Slug, Unit, UnitId, UnitKind};
