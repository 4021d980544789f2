// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    hash::{hash1, hash2},
    NodeIndex, Slot,
};

/// Per-node slot preference lists
///
/// Row `i` is a full permutation of `0..table_size`, starting at
/// `offset(i)` and stepping by `skip(i)`. Rows only depend on the node's
/// identity, so the same permutation serves every rebuild.
///
/// Rows are stored back-to-back in a single allocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Permutation {
    node_count: u32,
    table_size: u32,
    rows: Box<[Slot]>,
}

impl Permutation {
    /// Generates the permutation rows for `node_count` nodes over `table_size` slots.
    ///
    /// # Panics
    ///
    /// Panics if `table_size < 2`, as there is no valid skip value in that case.
    #[must_use]
    pub fn generate(node_count: u32, table_size: u32) -> Self {
        assert!(table_size >= 2, "table size must be at least 2");

        let m = u64::from(table_size);
        let mut rows = Vec::with_capacity(node_count as usize * table_size as usize);

        for node in 0..node_count {
            let (offset, skip) = Self::seed(node, table_size);
            let (offset, skip) = (u64::from(offset), u64::from(skip));

            // NOTE: offset + j * skip < M + M * M, which fits into u64
            #[allow(clippy::cast_possible_truncation)]
            rows.extend((0..m).map(|j| ((offset + j * skip) % m) as Slot));
        }

        log::trace!("Generated permutation for {node_count} nodes over {table_size} slots");

        Self {
            node_count,
            table_size,
            rows: rows.into_boxed_slice(),
        }
    }

    /// Computes `(offset, skip)` of a node, hashing its 1-based id.
    ///
    /// # Panics
    ///
    /// Panics if `table_size < 2`.
    #[must_use]
    pub fn seed(node: NodeIndex, table_size: u32) -> (Slot, u32) {
        let id = node.wrapping_add(1);
        let offset = hash1(id) % table_size;
        let skip = hash2(id) % (table_size - 1) + 1;
        (offset, skip)
    }

    /// Number of rows.
    #[must_use]
    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    /// Length of each row.
    #[must_use]
    pub fn table_size(&self) -> u32 {
        self.table_size
    }

    /// Returns the preference list of a node.
    #[must_use]
    pub fn row(&self, node: NodeIndex) -> Option<&[Slot]> {
        let m = self.table_size as usize;
        let start = (node as usize).checked_mul(m)?;
        self.rows.get(start..start.checked_add(m)?)
    }

    /// Iterates over all rows in node order.
    pub fn rows(&self) -> impl Iterator<Item = &[Slot]> {
        self.rows.chunks_exact(self.table_size as usize)
    }

    /// Heap size of the rows in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        std::mem::size_of_val(&*self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn is_permutation(row: &[Slot], table_size: u32) -> bool {
        let mut seen = vec![false; table_size as usize];

        for &slot in row {
            match seen.get_mut(slot as usize) {
                Some(flag) if !*flag => *flag = true,
                _ => return false,
            }
        }

        row.len() == table_size as usize && seen.iter().all(|&x| x)
    }

    #[test]
    fn permutation_rows_are_permutations() {
        let perm = Permutation::generate(10, 13);

        assert_eq!(10, perm.rows().count());
        for row in perm.rows() {
            assert!(is_permutation(row, 13));
        }
    }

    #[test]
    fn permutation_rows_are_permutations_large() {
        let perm = Permutation::generate(100, 503);

        for row in perm.rows() {
            assert!(is_permutation(row, 503));
        }
    }

    #[test]
    fn permutation_row_formula() {
        let perm = Permutation::generate(3, 7);

        // node 0 is hashed as 1: offset = 10125 % 7 = 3, skip = 6311 % 6 + 1 = 6
        assert_eq!((3, 6), Permutation::seed(0, 7));
        assert_eq!(Some(&[3, 2, 1, 0, 6, 5, 4][..]), perm.row(0));
    }

    #[test]
    fn permutation_skip_never_zero() {
        for table_size in [2, 3, 5, 7, 11, 4_099, 65_537] {
            for node in 0..256 {
                let (offset, skip) = Permutation::seed(node, table_size);
                assert!(offset < table_size);
                assert!((1..table_size).contains(&skip));
            }
        }
    }

    #[test]
    fn permutation_row_out_of_range() {
        let perm = Permutation::generate(3, 7);
        assert!(perm.row(2).is_some());
        assert!(perm.row(3).is_none());
        assert!(perm.row(u32::MAX).is_none());
    }

    #[test]
    fn permutation_deterministic() {
        assert_eq!(Permutation::generate(20, 101), Permutation::generate(20, 101));
    }

    #[test]
    fn permutation_size() {
        let perm = Permutation::generate(4, 11);
        assert_eq!(4 * 11 * std::mem::size_of::<Slot>(), perm.size());
    }
}
