// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{NodeIndex, Slot};

/// Marks a slot that no node has claimed
pub(crate) const UNASSIGNED: NodeIndex = NodeIndex::MAX;

/// Maps each slot to the node that owns it
///
/// A lookup table is immutable once built; rebuilds produce a new table.
#[derive(Clone, Eq, PartialEq)]
pub struct LookupTable(Box<[NodeIndex]>);

impl std::fmt::Debug for LookupTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LookupTable(len={}, unassigned={})",
            self.len(),
            self.unassigned_count(),
        )
    }
}

impl LookupTable {
    /// Creates a table where every slot is unassigned.
    #[must_use]
    pub fn empty(table_size: u32) -> Self {
        Self(vec![UNASSIGNED; table_size as usize].into_boxed_slice())
    }

    pub(crate) fn from_entries(entries: Box<[NodeIndex]>) -> Self {
        Self(entries)
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the table has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the owner of a slot.
    ///
    /// Returns `None` if the slot does not exist or is unassigned.
    #[must_use]
    pub fn get(&self, slot: Slot) -> Option<NodeIndex> {
        self.0
            .get(slot as usize)
            .copied()
            .filter(|&node| node != UNASSIGNED)
    }

    /// Routes a key hash to its slot owner.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn route(&self, hash: u64) -> Option<NodeIndex> {
        let len = self.len() as u64;

        if len == 0 {
            return None;
        }

        // NOTE: Result is < len, which came from a u32 table size
        self.get((hash % len) as Slot)
    }

    /// Iterates over the slot owners in slot order.
    pub fn iter(&self) -> impl Iterator<Item = Option<NodeIndex>> + '_ {
        self.0
            .iter()
            .map(|&node| (node != UNASSIGNED).then_some(node))
    }

    /// Number of slots no node has claimed.
    #[must_use]
    pub fn unassigned_count(&self) -> usize {
        self.0.iter().filter(|&&node| node == UNASSIGNED).count()
    }

    /// Returns `true` if every slot is owned by a node.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.0.contains(&UNASSIGNED)
    }

    /// Counts the slots owned by each node.
    ///
    /// Nodes owning no slot are not contained.
    #[must_use]
    pub fn distribution(&self) -> crate::HashMap<NodeIndex, usize> {
        let mut counts = crate::HashMap::default();

        for node in self.iter().flatten() {
            *counts.entry(node).or_default() += 1;
        }

        counts
    }

    /// Lists the slots whose owner differs from `other`.
    ///
    /// Slots that only exist in one of the tables count as changed.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn diff(&self, other: &Self) -> Vec<Slot> {
        let len = self.len().max(other.len());

        (0..len)
            .filter(|&slot| self.0.get(slot) != other.0.get(slot))
            .map(|slot| slot as Slot)
            .collect()
    }

    /// Fraction (0.0 - 1.0) of slots that have the same owner in `other`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn unchanged_ratio(&self, other: &Self) -> f64 {
        let len = self.len().max(other.len());

        if len == 0 {
            return 1.0;
        }

        let unchanged = self
            .0
            .iter()
            .zip(other.0.iter())
            .filter(|(a, b)| a == b)
            .count();

        unchanged as f64 / len as f64
    }

    /// Heap size of the table in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        std::mem::size_of_val(&*self.0)
    }
}
