//! Remover driver: parallel unlink pass, then a bottom-up rmdir pass.
//!
//! The parallel pass does everything that can be done out of order:
//! unlink every non-directory and discover every directory. Directories
//! can only be removed once empty, so the final pass is a plain
//! single-threaded post-order walk over the drained tree; at that point
//! every remaining entry is a directory and the work left is cheap.

use crate::config::{RemoveConfig, REMOVE_THREADS};
use crate::dir::{resolve_is_dir, DirReader};
use crate::error::{report, FailureFlag, WalkError};
use crate::walker::{WalkStats, WorkerPool, Worklist};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

const TOOL: &str = "parrm";

/// Summary of a finished removal.
#[derive(Debug)]
pub struct RemoveReport {
    /// Something could not be removed; the tree may be partial.
    pub failed: bool,
}

struct RemoveContext {
    stats: WalkStats,
    failed: FailureFlag,
}

/// Destroy the tree at `cfg.root`.
///
/// Individual failures are reported and recorded; when the parallel
/// pass saw any, the rmdir pass is skipped rather than producing a
/// cascade of not-empty errors over directories that still hold the
/// survivors.
pub fn run(cfg: &RemoveConfig) -> Result<RemoveReport, WalkError> {
    let worklist: Arc<Worklist<PathBuf>> = Arc::new(Worklist::new());
    let ctx = Arc::new(RemoveContext {
        stats: WalkStats::default(),
        failed: FailureFlag::default(),
    });

    worklist.push(cfg.root.clone());

    let pool = {
        let ctx = Arc::clone(&ctx);
        let feeder = Arc::clone(&worklist);
        WorkerPool::spawn(
            Arc::clone(&worklist),
            REMOVE_THREADS,
            1,
            TOOL,
            move |dir: PathBuf| drain_directory(&ctx, &feeder, dir),
        )?
    };
    pool.join()?;

    if !ctx.failed.is_set() {
        remove_tree(&ctx, &cfg.root);
    }

    info!(
        directories = ctx.stats.dirs_read.load(Ordering::Relaxed),
        failed = ctx.failed.is_set(),
        "removal complete"
    );

    Ok(RemoveReport {
        failed: ctx.failed.is_set(),
    })
}

/// Unlink every non-directory in `dir` and enqueue every directory.
/// Runs on a worker thread.
fn drain_directory(ctx: &RemoveContext, worklist: &Worklist<PathBuf>, dir: PathBuf) {
    let reader = match DirReader::open(&dir, false) {
        Ok(reader) => reader,
        Err(e) => {
            report(
                TOOL,
                &WalkError::OpenDir {
                    path: dir,
                    source: e,
                },
            );
            ctx.failed.set();
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

        let path = dir.join(&entry.name);
        let is_dir = match resolve_is_dir(&path, entry.kind, false, &ctx.stats) {
            Ok(is_dir) => is_dir,
            Err(e) => {
                // un-actionable: neither enqueued nor unlinked
                report(TOOL, &WalkError::Stat { path, source: e });
                ctx.failed.set();
                continue;
            }
        };

        if is_dir {
            worklist.push(path);
        } else if let Err(e) = fs::remove_file(&path) {
            report(TOOL, &WalkError::Unlink { path, source: e });
            ctx.failed.set();
        }
    }
}

/// Post-order removal of the now-emptied directory skeleton.
fn remove_tree(ctx: &RemoveContext, dir: &Path) {
    let reader = match DirReader::open(dir, false) {
        Ok(reader) => reader,
        Err(e) => {
            report(
                TOOL,
                &WalkError::OpenDir {
                    path: dir.to_path_buf(),
                    source: e,
                },
            );
            ctx.failed.set();
            return;
        }
    };

    for entry in reader {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report(
                    TOOL,
                    &WalkError::ReadDir {
                        path: dir.to_path_buf(),
                        source: e,
                    },
                );
                ctx.failed.set();
                return;
            }
        };

        let path = dir.join(&entry.name);
        match resolve_is_dir(&path, entry.kind, false, &ctx.stats) {
            Ok(true) => remove_tree(ctx, &path),
            Ok(false) => {} // leftover leaf; the rmdir below will say so
            Err(e) => {
                report(TOOL, &WalkError::Stat { path, source: e });
                ctx.failed.set();
            }
        }
    }

    if let Err(e) = fs::remove_dir(dir) {
        report(
            TOOL,
            &WalkError::Rmdir {
                path: dir.to_path_buf(),
                source: e,
            },
        );
        ctx.failed.set();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_removes_whole_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("r");
        fs::create_dir_all(root.join("b/d")).unwrap();
        fs::create_dir(root.join("e")).unwrap();
        File::create(root.join("a")).unwrap();
        File::create(root.join("b/c")).unwrap();

        let report = run(&RemoveConfig { root: root.clone() }).unwrap();

        assert!(!report.failed);
        assert!(!root.exists());
        assert!(tmp.path().exists());
    }

    #[test]
    fn test_missing_root_reports_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let report = run(&RemoveConfig {
            root: tmp.path().join("absent"),
        })
        .unwrap();
        assert!(report.failed);
    }

    #[test]
    fn test_bottom_up_pass_handles_deep_nesting() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("deep");
        let mut leaf = root.clone();
        for i in 0..20 {
            leaf.push(format!("level{i}"));
        }
        fs::create_dir_all(&leaf).unwrap();
        File::create(leaf.join("f")).unwrap();

        let report = run(&RemoveConfig { root: root.clone() }).unwrap();
        assert!(!report.failed);
        assert!(!root.exists());
    }
}
