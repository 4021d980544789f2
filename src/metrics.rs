// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::Relaxed;

/// Runtime counters of a Maglev table
#[derive(Debug, Default)]
pub struct Metrics {
    /// Number of lookup tables that were published
    pub(crate) builds: AtomicUsize,

    /// Number of table builds that were rejected
    pub(crate) failed_builds: AtomicUsize,

    /// Number of lookups that were performed
    pub(crate) lookups: AtomicUsize,

    /// Number of lookups that hit an unassigned slot
    pub(crate) lookup_misses: AtomicUsize,
}

#[allow(clippy::cast_precision_loss)]
impl Metrics {
    /// Number of lookup tables that were published.
    pub fn builds(&self) -> usize {
        self.builds.load(Relaxed)
    }

    /// Number of table builds that failed.
    pub fn failed_builds(&self) -> usize {
        self.failed_builds.load(Relaxed)
    }

    /// Number of lookups that were performed.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Relaxed)
    }

    /// Lookup hit rate in percent (0.0 - 1.0).
    pub fn lookup_efficiency(&self) -> f64 {
        let queries = self.lookups() as f64;
        let misses = self.lookup_misses.load(Relaxed) as f64;
        (queries - misses) / queries
    }
}
