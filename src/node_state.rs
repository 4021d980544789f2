// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{Error, NodeIndex};

/// Liveness flags of a fixed set of nodes
///
/// Every node starts out active.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NodeStates(Box<[bool]>);

impl NodeStates {
    /// Creates `node_count` active nodes.
    #[must_use]
    pub fn new(node_count: u32) -> Self {
        Self(vec![true; node_count as usize].into_boxed_slice())
    }

    /// Number of nodes, active or not.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn node_count(&self) -> u32 {
        // NOTE: Created from a u32
        self.0.len() as u32
    }

    /// Marks a node as active or inactive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIndex`] if the node does not exist,
    /// in which case nothing is changed.
    pub fn set_active(&mut self, idx: NodeIndex, active: bool) -> crate::Result<()> {
        let node_count = self.node_count();

        let Some(state) = self.0.get_mut(idx as usize) else {
            return Err(Error::InvalidIndex {
                index: idx,
                node_count,
            });
        };

        *state = active;
        Ok(())
    }

    /// Returns `true` if the node is active, `None` if it does not exist.
    #[must_use]
    pub fn is_active(&self, idx: NodeIndex) -> Option<bool> {
        self.0.get(idx as usize).copied()
    }

    /// Number of active nodes.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.0.iter().filter(|&&x| x).count()
    }

    /// Iterates over the indexes of active nodes in ascending order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn active(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|&(_, &active)| active)
            .map(|(idx, _)| idx as NodeIndex)
    }

    /// Iterates over all flags in node order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }
}
