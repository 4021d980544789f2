// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

pub mod inner;

use crate::{
    hash::hash64, node_state::NodeStates, permutation::Permutation, populate::populate,
    LookupTable, NodeIndex,
};
use inner::MaglevInner;
use std::{sync::Arc, time::Instant};

/// A Maglev consistent hashing table
///
/// The handle is cheap to clone; clones share the same nodes and tables.
///
/// # Examples
///
/// ```
/// use maglev_table::Maglev;
///
/// let maglev = Maglev::new(3, 13)?;
/// assert_eq!(None, maglev.lookup("client-1"));
///
/// maglev.build()?;
/// let before = maglev.table();
///
/// // Take a node down, then publish a new table
/// maglev.down(1)?;
/// maglev.build()?;
///
/// // Slots of the removed node moved to other nodes
/// let changed = before.diff(&maglev.table());
/// for slot in 0..13 {
///     if before.get(slot) == Some(1) {
///         assert!(changed.contains(&slot));
///     }
/// }
/// assert!(maglev.table().iter().flatten().all(|node| node != 1));
/// #
/// # Ok::<(), maglev_table::Error>(())
/// ```
#[derive(Clone)]
pub struct Maglev(#[doc(hidden)] pub Arc<MaglevInner>);

impl std::ops::Deref for Maglev {
    type Target = MaglevInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Debug for Maglev {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Maglev")
            .field("node_count", &self.node_count)
            .field("table_size", &self.table_size)
            .field("active_count", &self.active_count())
            .finish_non_exhaustive()
    }
}

impl Maglev {
    /// Creates a Maglev table with `node_count` nodes and `table_size` slots.
    ///
    /// All nodes start out active. Permutations are generated right away,
    /// but the lookup table starts out with every slot unassigned until
    /// [`Maglev::build`] is called.
    ///
    /// See [`crate::Config`] for deriving the table size from the node count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) if `node_count` is zero, or if
    /// `table_size` is not a prime greater than `node_count`.
    pub fn new(node_count: u32, table_size: u32) -> crate::Result<Self> {
        let table_size = crate::Config::new(node_count)
            .table_size(table_size)
            .resolved_table_size()?;

        log::debug!("Creating Maglev table with {node_count} nodes over {table_size} slots");

        Ok(Self(Arc::new(MaglevInner::create_new(node_count, table_size))))
    }

    /// Number of nodes, active or not.
    #[must_use]
    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    /// Number of lookup table slots.
    #[must_use]
    pub fn table_size(&self) -> u32 {
        self.table_size
    }

    /// Recomputes the permutation rows of all nodes.
    ///
    /// Rows only depend on node count and table size, so this is idempotent.
    pub fn generate_permutations(&self) {
        let start = Instant::now();
        let permutation = Permutation::generate(self.node_count, self.table_size);

        *self.permutation.write().expect("lock is poisoned") = Arc::new(permutation);

        log::debug!(
            "Generated permutations of {} nodes in {:?}",
            self.node_count,
            start.elapsed(),
        );
    }

    /// Returns the cached permutation rows.
    #[must_use]
    pub fn permutation(&self) -> Arc<Permutation> {
        self.permutation.read().expect("lock is poisoned").clone()
    }

    /// Builds a new lookup table from the currently active nodes and publishes it.
    ///
    /// Concurrent lookups keep seeing the previous table until the new
    /// one is complete.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveNodes`](crate::Error::NoActiveNodes) if every node is down. The
    /// previously published table stays in place.
    pub fn build(&self) -> crate::Result<Arc<LookupTable>> {
        let _build_lock = self.build_lock.lock().expect("lock is poisoned");

        let start = Instant::now();
        let states = self.node_states();
        let permutation = self.permutation();

        let table = match populate(&permutation, &states) {
            Ok(table) => Arc::new(table),
            Err(e) => {
                #[cfg(feature = "metrics")]
                self.metrics
                    .failed_builds
                    .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

                return Err(e);
            }
        };

        *self.table.write().expect("lock is poisoned") = table.clone();

        #[cfg(feature = "metrics")]
        self.metrics
            .builds
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        log::debug!(
            "Published lookup table ({} slots, {} active nodes) in {:?}",
            self.table_size,
            states.active_count(),
            start.elapsed(),
        );

        Ok(table)
    }

    /// Returns the currently published lookup table.
    #[must_use]
    pub fn table(&self) -> Arc<LookupTable> {
        self.table.read().expect("lock is poisoned").clone()
    }

    /// Marks a node as active or inactive.
    ///
    /// Takes effect on the next [`Maglev::build`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIndex`](crate::Error::InvalidIndex) if the node does not exist.
    pub fn set_active(&self, idx: NodeIndex, active: bool) -> crate::Result<()> {
        self.node_states
            .write()
            .expect("lock is poisoned")
            .set_active(idx, active)?;

        log::debug!("Marked node {idx} as {}", if active { "up" } else { "down" });

        Ok(())
    }

    /// Marks a node as active.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIndex`](crate::Error::InvalidIndex) if the node does not exist.
    pub fn up(&self, idx: NodeIndex) -> crate::Result<()> {
        self.set_active(idx, true)
    }

    /// Marks a node as inactive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIndex`](crate::Error::InvalidIndex) if the node does not exist.
    pub fn down(&self, idx: NodeIndex) -> crate::Result<()> {
        self.set_active(idx, false)
    }

    /// Returns `true` if the node is active, `None` if it does not exist.
    #[must_use]
    pub fn is_active(&self, idx: NodeIndex) -> Option<bool> {
        self.node_states
            .read()
            .expect("lock is poisoned")
            .is_active(idx)
    }

    /// Number of active nodes.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.node_states
            .read()
            .expect("lock is poisoned")
            .active_count()
    }

    /// Indexes of the active nodes in ascending order.
    #[must_use]
    pub fn active_nodes(&self) -> Vec<NodeIndex> {
        self.node_states
            .read()
            .expect("lock is poisoned")
            .active()
            .collect()
    }

    /// Snapshot of the liveness flags.
    #[must_use]
    pub fn node_states(&self) -> NodeStates {
        self.node_states.read().expect("lock is poisoned").clone()
    }

    /// Returns the node a key is routed to.
    ///
    /// Returns `None` if no table has been built yet.
    #[must_use]
    pub fn lookup<K: AsRef<[u8]>>(&self, key: K) -> Option<NodeIndex> {
        self.lookup_hash(hash64(key.as_ref()))
    }

    /// Returns the node a precomputed key hash (e.g. of a connection tuple) is routed to.
    ///
    /// Returns `None` if no table has been built yet.
    #[must_use]
    pub fn lookup_hash(&self, hash: u64) -> Option<NodeIndex> {
        let node = self.table.read().expect("lock is poisoned").route(hash);

        #[cfg(feature = "metrics")]
        {
            use std::sync::atomic::Ordering::Relaxed;

            self.metrics.lookups.fetch_add(1, Relaxed);
            if node.is_none() {
                self.metrics.lookup_misses.fetch_add(1, Relaxed);
            }
        }

        node
    }

    /// Runtime counters.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn metrics(&self) -> &Arc<crate::Metrics> {
        &self.0.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use test_log::test;

    #[test]
    fn maglev_starts_empty() -> crate::Result<()> {
        let maglev = Maglev::new(4, 11)?;

        assert_eq!(4, maglev.active_count());
        assert_eq!(11, maglev.table().unassigned_count());
        assert_eq!(None, maglev.lookup("abc"));

        Ok(())
    }

    #[test]
    fn maglev_failed_build_keeps_table() -> crate::Result<()> {
        let maglev = Maglev::new(2, 5)?;
        let table = maglev.build()?;

        maglev.down(0)?;
        maglev.down(1)?;
        assert_eq!(Err(Error::NoActiveNodes), maglev.build());
        assert_eq!(*table, *maglev.table());

        maglev.up(1)?;
        assert_eq!(vec![Some(1); 5], maglev.build()?.iter().collect::<Vec<_>>());

        Ok(())
    }

    #[test]
    fn maglev_clones_share_state() -> crate::Result<()> {
        let a = Maglev::new(3, 7)?;
        let b = a.clone();

        b.down(2)?;
        a.build()?;

        assert_eq!(Some(false), a.is_active(2));
        assert_eq!(vec![0, 1], a.active_nodes());
        assert!(b.table().iter().flatten().all(|node| node != 2));

        Ok(())
    }

    #[test]
    fn maglev_generate_permutations_idempotent() -> crate::Result<()> {
        let maglev = Maglev::new(5, 31)?;
        let before = maglev.permutation();

        maglev.generate_permutations();
        assert_eq!(*before, *maglev.permutation());

        Ok(())
    }

    #[test]
    fn maglev_lookup_matches_table() -> crate::Result<()> {
        let maglev = Maglev::new(5, 31)?;
        let table = maglev.build()?;

        for key in ["a", "b", "c", "d"] {
            assert_eq!(table.route(hash64(key.as_bytes())), maglev.lookup(key));
            assert!(maglev.lookup(key).is_some());
        }

        Ok(())
    }

    #[test]
    fn maglev_debug() -> crate::Result<()> {
        let maglev = Maglev::new(2, 5)?;
        assert_eq!(
            "Maglev { node_count: 2, table_size: 5, active_count: 2, .. }",
            format!("{maglev:?}")
        );
        Ok(())
    }

    #[test]
    #[cfg(feature = "metrics")]
    fn maglev_metrics() -> crate::Result<()> {
        let maglev = Maglev::new(2, 5)?;

        let _ = maglev.lookup("a");
        maglev.build()?;
        let _ = maglev.lookup("a");

        maglev.down(0)?;
        maglev.down(1)?;
        assert!(maglev.build().is_err());

        assert_eq!(1, maglev.metrics().builds());
        assert_eq!(1, maglev.metrics().failed_builds());
        assert_eq!(2, maglev.metrics().lookups());
        assert!((maglev.metrics().lookup_efficiency() - 0.5).abs() < f64::EPSILON);

        Ok(())
    }
}
