//! Linker driver: hard-link a stream of relative paths in parallel.
//!
//! The worklist is fed from the input stream by the calling thread
//! while the pool is already running; workers pop in batches because a
//! link is cheap relative to the cost of taking the worklist lock.
//! Parent directories under the target root must already exist; the
//! linker never creates directories.

use crate::config::{LinkConfig, MAX_LINE_BYTES};
use crate::error::{report, FailureFlag, WalkError};
use crate::walker::{WorkerPool, Worklist};
use std::ffi::OsString;
use std::fs;
use std::io::BufRead;
use std::os::unix::ffi::OsStringExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const TOOL: &str = "parlink";

/// Summary of a finished link run.
#[derive(Debug)]
pub struct LinkReport {
    /// At least one link failed.
    pub failed: bool,

    /// Source paths consumed from the input.
    pub sources: u64,
}

/// Link every path read from `input` to the same relative path under
/// `cfg.target`.
///
/// Link failures are reported per item and reflected in the report. An
/// over-long input line is fatal: the feed stops, in-flight work
/// drains, and the error is returned.
pub fn run<R: BufRead>(cfg: &LinkConfig, input: &mut R) -> Result<LinkReport, WalkError> {
    let worklist: Arc<Worklist<PathBuf>> = Arc::new(Worklist::with_external_feed());
    let failed = Arc::new(FailureFlag::default());

    let pool = {
        let target = cfg.target.clone();
        let failed = Arc::clone(&failed);
        WorkerPool::spawn(
            Arc::clone(&worklist),
            cfg.threads,
            cfg.batch,
            TOOL,
            move |source: PathBuf| {
                let dest = target.join(&source);
                if let Err(e) = fs::hard_link(&source, &dest) {
                    report(
                        TOOL,
                        &WalkError::Link {
                            from: source,
                            to: dest,
                            source: e,
                        },
                    );
                    failed.set();
                }
            },
        )?
    };

    // Feed while the workers run; the eof mark is what finally lets
    // them observe termination.
    let feed = feed_worklist(input, &worklist);
    worklist.mark_eof();
    pool.join()?;
    let sources = feed?;

    info!(sources, spins = worklist.spin_count(), "link pass complete");

    Ok(LinkReport {
        failed: failed.is_set(),
        sources,
    })
}

/// Push one worklist item per input line, newline stripped, bytes kept
/// verbatim. Returns the number of lines pushed.
fn feed_worklist<R: BufRead>(
    input: &mut R,
    worklist: &Worklist<PathBuf>,
) -> Result<u64, WalkError> {
    let mut line = Vec::new();
    let mut pushed = 0u64;
    loop {
        line.clear();
        let n = input
            .read_until(b'\n', &mut line)
            .map_err(|e| WalkError::Input { source: e })?;
        if n == 0 {
            return Ok(pushed);
        }
        if line.len() > MAX_LINE_BYTES {
            return Err(WalkError::LineTooLong {
                limit: MAX_LINE_BYTES,
            });
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        worklist.push(PathBuf::from(OsString::from_vec(line.clone())));
        pushed += 1;
    }
}
