//! Lister driver: parallel walk, deferred tree-order output.
//!
//! The worklist carries (directory path, owning tree node) pairs. A
//! worker pops one, reads the directory, attaches every entry to the
//! owning node in yield order, and enqueues subdirectories with their
//! fresh node handles. Output happens only after the pool joins.

use crate::config::{EmitMode, ListConfig};
use crate::dir::{resolve_is_dir, DirReader};
use crate::error::{report, FailureFlag, WalkError};
use crate::tree::{NodeId, Tree};
use crate::walker::{WalkStats, WorkerPool, Worklist};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

const TOOL: &str = "parfind";

/// One pending directory: its path and the tree node to fill in.
type WorkItem = (PathBuf, NodeId);

/// Summary of a finished listing.
#[derive(Debug)]
pub struct ListReport {
    /// A directory read or metadata call failed somewhere.
    pub failed: bool,

    /// Condvar waits taken by starved workers.
    pub spins: u64,

    /// Metadata calls made for kind resolution.
    pub stat_calls: u64,
}

/// Everything a worker needs, bundled so the action closure stays thin.
struct ListContext {
    cfg: ListConfig,
    tree: Tree,
    stats: WalkStats,
    failed: FailureFlag,
}

/// Walk `cfg.root` and write the selected emitter's records to `out`.
///
/// Recoverable failures are reported as they happen and reflected in
/// the returned report; only pool startup/join problems are `Err`.
pub fn run<W: Write>(cfg: &ListConfig, out: &mut W) -> Result<ListReport, WalkError> {
    let worklist: Arc<Worklist<WorkItem>> = Arc::new(Worklist::new());
    let ctx = Arc::new(ListContext {
        cfg: cfg.clone(),
        tree: Tree::new(cfg.root.clone().into_os_string()),
        stats: WalkStats::default(),
        failed: FailureFlag::default(),
    });

    worklist.push((cfg.root.clone(), Tree::ROOT));

    let pool = {
        let ctx = Arc::clone(&ctx);
        let feeder = Arc::clone(&worklist);
        WorkerPool::spawn(
            Arc::clone(&worklist),
            cfg.threads,
            1,
            TOOL,
            move |(dir, node)| expand_directory(&ctx, &feeder, dir, node),
        )?
    };
    pool.join()?;

    match cfg.mode {
        EmitMode::Files => ctx.tree.write_files(out, cfg.terminator),
        EmitMode::Dirs => ctx.tree.write_dirs(out, cfg.terminator),
    }
    .map_err(|e| WalkError::Write { source: e })?;

    let spins = worklist.spin_count();
    let stat_calls = ctx.stats.stat_calls.load(Ordering::Relaxed);
    info!(
        directories = ctx.stats.dirs_read.load(Ordering::Relaxed),
        spins,
        stat_calls,
        "walk complete"
    );

    Ok(ListReport {
        failed: ctx.failed.is_set(),
        spins,
        stat_calls,
    })
}

/// Expand one directory: attach every entry to its node, enqueue the
/// subdirectories. Runs on a worker thread.
fn expand_directory(
    ctx: &ListContext,
    worklist: &Worklist<WorkItem>,
    dir: PathBuf,
    node: NodeId,
) {
    let reader = match DirReader::open(&dir, ctx.cfg.include_snapshot) {
        Ok(reader) => reader,
        Err(e) => {
            let err = WalkError::OpenDir {
                path: dir,
                source: e,
            };
            // unreadable directories are expected on shared filers;
            // they don't affect the exit status
            if !(ctx.cfg.quiet && err.is_permission_denied()) {
                report(TOOL, &err);
            }
            return;
        }
    };
    ctx.stats.record_dir();

    for entry in reader {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report(
                    TOOL,
                    &WalkError::ReadDir {
                        path: dir,
                        source: e,
                    },
                );
                ctx.failed.set();
                return;
            }
        };

        let child_path = dir.join(&entry.name);
        let is_dir =
            match resolve_is_dir(&child_path, entry.kind, ctx.cfg.force_stat, &ctx.stats) {
                Ok(is_dir) => is_dir,
                Err(e) => {
                    report(
                        TOOL,
                        &WalkError::Stat {
                            path: child_path.clone(),
                            source: e,
                        },
                    );
                    ctx.failed.set();
                    false
                }
            };

        let child_node = ctx.tree.attach(node, entry.name, is_dir);
        if is_dir {
            worklist.push((child_path, child_node));
        }
    }
}
