//! Parallel filesystem utilities for high-latency directory trees.
//!
//! On a networked filer every readdir and stat is a round trip, so a
//! single-threaded `find`, `ln` or `rm -r` spends nearly all of its
//! time waiting. The three tools in this crate keep a pool of worker
//! threads busy against a shared worklist instead:
//!
//! - **parfind** lists every file (or directory) under a root, like
//!   `find dir ! -type d`, building an in-memory tree during the walk
//!   and printing it afterwards so output order is independent of
//!   scheduling.
//! - **parlink** reads relative paths from stdin and re-creates them as
//!   hard links under a target root.
//! - **parrm** unlinks a whole tree in parallel, then sweeps away the
//!   emptied directories bottom-up.
//!
//! # Architecture
//!
//! ```text
//!   root ──► Worklist (FIFO + wip count + eof, one mutex/condvar)
//!               │ pop                         ▲ push subdirs
//!               ▼                             │
//!           Worker pool ── per-item action ───┘
//!               │
//!               ▼ after join
//!           tree emit / rmdir sweep / exit status
//! ```
//!
//! Workers block only on the worklist condvar and inside OS calls; the
//! worklist mutex is never held across an OS call. Termination is
//! detected, not timed out: the last worker to finish an item with the
//! queue empty wakes everyone up to observe shutdown.
//!
//! # Example
//!
//! ```bash
//! # list a tree, 30 threads
//! parfind /mnt/filer/project
//!
//! # mirror a tree as hard links
//! parfind -f src | (cd src && parlink -d /mnt/filer/mirror)
//!
//! # destroy a tree, 100 threads
//! parrm -rfp /mnt/filer/scratch
//! ```

pub mod config;
pub mod dir;
pub mod error;
pub mod link;
pub mod list;
pub mod remove;
pub mod tree;
pub mod walker;

pub use error::{FailureFlag, UsageError, WalkError};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for a binary. Verbose raises the crate's level
/// to info; diagnostics for the operator go to stderr either way.
pub fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("parfind=info,warn")
    } else {
        EnvFilter::new("parfind=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
