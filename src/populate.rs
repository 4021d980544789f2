// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    lookup_table::UNASSIGNED, node_state::NodeStates, permutation::Permutation, Error,
    LookupTable, NodeIndex, Slot,
};

/// Fills a new lookup table from the permutation rows of the active nodes.
///
/// Active nodes take turns in ascending index order; on its turn a node
/// claims the next slot of its row that is still free. The fill stops once
/// every slot is claimed.
///
/// # Errors
///
/// Returns [`Error::NoActiveNodes`] if no node is active, and
/// [`Error::Unsatisfiable`] if a row runs out of slots before the table is full.
pub fn populate(permutation: &Permutation, states: &NodeStates) -> crate::Result<LookupTable> {
    debug_assert_eq!(permutation.node_count(), states.node_count());

    let table_size = permutation.table_size() as usize;

    // NOTE: Collect the rows up front, inactive nodes never take a turn
    let mut nodes = states
        .active()
        .map(|idx| {
            permutation
                .row(idx)
                .map(|row| Cursor { idx, row, next: 0 })
                .ok_or(Error::Unsatisfiable)
        })
        .collect::<crate::Result<Vec<_>>>()?;

    if nodes.is_empty() {
        log::warn!("Refusing to populate lookup table without active nodes");
        return Err(Error::NoActiveNodes);
    }

    let mut entries = vec![UNASSIGNED; table_size].into_boxed_slice();
    let mut claimed = 0;
    let mut sweeps = 0usize;

    'fill: while claimed < table_size {
        for node in &mut nodes {
            node.claim(&mut entries)?;
            claimed += 1;

            if claimed == table_size {
                break 'fill;
            }
        }

        sweeps += 1;
    }

    log::trace!(
        "Populated {table_size} slots with {} active nodes in {sweeps} full sweeps",
        nodes.len(),
    );

    Ok(LookupTable::from_entries(entries))
}

/// Fill position of a node inside its permutation row
struct Cursor<'a> {
    idx: NodeIndex,
    row: &'a [Slot],
    next: usize,
}

impl Cursor<'_> {
    /// Claims the next free slot of this node's row.
    fn claim(&mut self, entries: &mut [NodeIndex]) -> crate::Result<()> {
        loop {
            // NOTE: The row is a permutation, so a free slot is reached
            // before the cursor runs off the row as long as one exists
            let Some(&slot) = self.row.get(self.next) else {
                return Err(Error::Unsatisfiable);
            };
            self.next += 1;

            let Some(entry) = entries.get_mut(slot as usize) else {
                return Err(Error::Unsatisfiable);
            };

            if *entry == UNASSIGNED {
                *entry = self.idx;
                return Ok(());
            }
        }
    }
}
