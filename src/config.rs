// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    util::{is_prime, next_prime},
    Error, Maglev,
};

/// Table size multiplier used when no explicit table size is configured
///
/// The table size then is the smallest prime `>= node_count * DEFAULT_TABLE_SIZE_FACTOR`.
pub const DEFAULT_TABLE_SIZE_FACTOR: u32 = 5;

/// Maglev table configuration builder
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Number of nodes
    ///
    /// Once opened, the node count is fixed.
    pub node_count: u32,

    /// Number of lookup table slots
    ///
    /// If `None`, a prime is derived from the node count.
    pub table_size: Option<u32>,

    /// Whether to build the lookup table when opening
    pub(crate) build_on_open: bool,
}

impl Config {
    /// Initializes a new config
    #[must_use]
    pub fn new(node_count: u32) -> Self {
        Self {
            node_count,
            table_size: None,
            build_on_open: true,
        }
    }

    /// Sets the number of lookup table slots.
    ///
    /// Must be a prime greater than the node count. Larger tables
    /// distribute keys more evenly at the cost of memory and build time.
    ///
    /// Defaults to the smallest prime `>= node_count * 5`.
    #[must_use]
    pub fn table_size(mut self, table_size: u32) -> Self {
        self.table_size = Some(table_size);
        self
    }

    /// If `true`, [`Config::open`] builds and publishes a lookup table
    /// with all nodes active.
    ///
    /// Otherwise, the lookup table starts out with every slot unassigned.
    ///
    /// Default = true
    #[must_use]
    pub fn build_on_open(mut self, b: bool) -> Self {
        self.build_on_open = b;
        self
    }

    /// Returns the table size that will be used, validating it against the node count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration is not usable.
    pub fn resolved_table_size(&self) -> crate::Result<u32> {
        if self.node_count == 0 {
            return Err(Error::InvalidConfig("node count must be at least 1"));
        }

        let table_size = match self.table_size {
            Some(table_size) => table_size,
            None => {
                let target = self
                    .node_count
                    .saturating_mul(DEFAULT_TABLE_SIZE_FACTOR)
                    .max(self.node_count.saturating_add(1));

                next_prime(target)
                    .ok_or(Error::InvalidConfig("no prime table size fits into u32"))?
            }
        };

        if table_size <= self.node_count {
            return Err(Error::InvalidConfig(
                "table size must be greater than node count",
            ));
        }

        if !is_prime(table_size) {
            return Err(Error::InvalidConfig("table size must be prime"));
        }

        Ok(table_size)
    }

    /// Creates the Maglev table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration is not usable.
    pub fn open(self) -> crate::Result<Maglev> {
        let table_size = self.resolved_table_size()?;
        let maglev = Maglev::new(self.node_count, table_size)?;

        if self.build_on_open {
            maglev.build()?;
        }

        Ok(maglev)
    }
}
