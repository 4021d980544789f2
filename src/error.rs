// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::NodeIndex;

/// Represents errors that can occur while maintaining a Maglev table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Node index is outside of `[0, node_count)`
    InvalidIndex {
        /// Offending index
        index: NodeIndex,

        /// Number of nodes the table was created with
        node_count: u32,
    },

    /// Table build was requested while every node is inactive
    NoActiveNodes,

    /// Table fill could not make progress
    ///
    /// Only reachable if a permutation row does not cover every slot.
    Unsatisfiable,

    /// Node count or table size were rejected
    InvalidConfig(&'static str),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIndex { index, node_count } => {
                write!(
                    f,
                    "MaglevError: invalid node index {index} (node count is {node_count})"
                )
            }
            _ => write!(f, "MaglevError: {self:?}"),
        }
    }
}

impl std::error::Error for Error {}

/// Maglev result
pub type Result<T> = std::result::Result<T, Error>;
