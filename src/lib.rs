// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A Maglev consistent hashing lookup table.
//!
//! ##### About
//!
//! This crate exports a [`Maglev`] table that maps keys to a fixed set of backend nodes,
//! as used by load balancers to route connections.
//!
//! Each node derives a permutation of all table slots from two hashes of its index.
//! Active nodes then take turns claiming their most preferred free slot until the
//! table is full. Lookups hash the key into a slot, which is O(1).
//!
//! The resulting table is close to uniform, and when a node goes down (or comes back),
//! only a small fraction of slots change owners, so existing connections mostly keep
//! their backend.
//!
//! The set of nodes is fixed when the table is created; nodes can only be marked up or
//! down. Changes are batched until the next [`Maglev::build`], which publishes a new
//! table atomically: concurrent lookups see either the old or the new table.
//!
//! ```
//! use maglev_table::Config;
//!
//! let maglev = Config::new(5).table_size(31).open()?;
//! let backend = maglev.lookup("10.0.0.1:51234");
//! assert!(backend.is_some());
//!
//! maglev.down(3)?;
//! maglev.build()?;
//! assert_ne!(Some(3), maglev.lookup("10.0.0.1:51234"));
//! #
//! # Ok::<(), maglev_table::Error>(())
//! ```

#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![warn(clippy::multiple_crate_versions)]
#![allow(clippy::option_if_let_else)]
#![warn(clippy::redundant_feature_names)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

#[doc(hidden)]
pub type HashMap<K, V> = std::collections::HashMap<K, V, rustc_hash::FxBuildHasher>;

/// Configuration
pub mod config;

mod error;

/// Hash functions
pub mod hash;

mod lookup_table;
mod maglev;

#[cfg(feature = "metrics")]
pub(crate) mod metrics;

mod node_state;
mod permutation;
mod populate;

/// Utility functions
pub mod util;

/// Index of a node in `[0, node_count)`
pub type NodeIndex = u32;

/// Index of a lookup table slot in `[0, table_size)`
pub type Slot = u32;

#[doc(hidden)]
pub use maglev::inner::MaglevInner;

pub use {
    config::Config,
    error::{Error, Result},
    lookup_table::LookupTable,
    maglev::Maglev,
    node_state::NodeStates,
    permutation::Permutation,
};

#[cfg(feature = "metrics")]
pub use metrics::Metrics;
