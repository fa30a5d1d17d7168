// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{Unit, UnitId, UnitKind};

pub(crate) type Units = HashMap<UnitKind, HashMap<UnitId, Unit>>;

/// In-memory store.
///
/// This does not persist data permamently, all changes are lost when the process ends. Use this
/// only in development or test contexts.
///
/// Cloned instances share the same underlying data.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    pub(crate) units: Arc<RwLock<Units>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// Trait implementations are in the regarding modules, see `hierarchy`.
