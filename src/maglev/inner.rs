// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{node_state::NodeStates, permutation::Permutation, LookupTable};
use std::sync::{Arc, Mutex, RwLock};

#[cfg(feature = "metrics")]
use crate::metrics::Metrics;

/// Shared state behind a [`crate::Maglev`] handle
pub struct MaglevInner {
    /// Number of nodes
    pub node_count: u32,

    /// Number of lookup table slots
    pub table_size: u32,

    pub(crate) node_states: RwLock<NodeStates>,

    /// Cached permutation rows, shared by all builds
    pub(crate) permutation: RwLock<Arc<Permutation>>,

    /// Currently published lookup table
    ///
    /// Builds never touch a published table; they swap in a new one.
    pub(crate) table: RwLock<Arc<LookupTable>>,

    /// Serializes builds, so tables are published in the order they were built.
    pub(crate) build_lock: Mutex<()>,

    #[doc(hidden)]
    #[cfg(feature = "metrics")]
    pub metrics: Arc<Metrics>,
}

impl MaglevInner {
    pub(crate) fn create_new(node_count: u32, table_size: u32) -> Self {
        let permutation = Permutation::generate(node_count, table_size);

        Self {
            node_count,
            table_size,
            node_states: RwLock::new(NodeStates::new(node_count)),
            permutation: RwLock::new(Arc::new(permutation)),
            table: RwLock::new(Arc::new(LookupTable::empty(table_size))),
            build_lock: Mutex::default(),

            #[cfg(feature = "metrics")]
            metrics: Metrics::default().into(),
        }
    }
}

impl Drop for MaglevInner {
    fn drop(&mut self) {
        log::trace!(
            "Dropping Maglev table ({} nodes, {} slots)",
            self.node_count,
            self.table_size,
        );
    }
}
