//! The concurrency core shared by all three utilities.
//!
//! A traversal is a [`Worklist`] of directories plus a [`WorkerPool`]
//! whose action expands each popped directory into leaf work and new
//! worklist items. The worklist owns termination detection: a worker
//! mid-directory counts as pending work, so the pool only unwinds when
//! the frontier is truly exhausted. The linker reuses the same pool
//! with an externally-fed worklist and batched pops.
//!
//! ```text
//!            ┌────────────────────────────┐
//!            │         Worklist           │
//!            │  queue + wip + eof under   │
//!            │  one mutex, one condvar    │
//!            └─────┬────────────────▲─────┘
//!                  │ pop            │ push subdirs
//!       ┌──────────┼────────────────┼──────────┐
//!       │          ▼                │          │
//!       │  Worker 0..N: read dir, resolve      │
//!       │  kinds, leaf work, enqueue subdirs   │
//!       └──────────────────────────────────────┘
//! ```

mod pool;
mod worklist;

pub use pool::WorkerPool;
pub use worklist::{Lease, Worklist};

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters accumulated across all workers of one walk.
#[derive(Debug, Default)]
pub struct WalkStats {
    /// Directories opened for expansion.
    pub dirs_read: AtomicU64,

    /// Metadata calls made for kind resolution.
    pub stat_calls: AtomicU64,
}

impl WalkStats {
    pub fn record_dir(&self) {
        self.dirs_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stat(&self) {
        self.stat_calls.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_stats() {
        let stats = WalkStats::default();
        stats.record_dir();
        stats.record_stat();
        stats.record_stat();
        assert_eq!(stats.dirs_read.load(Ordering::Relaxed), 1);
        assert_eq!(stats.stat_calls.load(Ordering::Relaxed), 2);
    }
}
