// SPDX-License-Identifier: MIT OR Apache-2.0

//! `HierarchyStore` and `HierarchyWriter` traits for querying and managing organisational units
//! as well as concrete `MemoryStore` and `SqliteStore` implementations.
#[cfg(feature = "memory")]
mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;
mod traits;

pub use traits::{HierarchyStore, HierarchyWriter};
