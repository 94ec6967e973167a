//! Error types for the parallel tree utilities.
//!
//! Failures split into two classes:
//! - Recoverable: a directory that cannot be opened or read, a stat,
//!   link, unlink or rmdir that fails. These are reported on stderr as
//!   a single `tool: message` line and recorded in a shared
//!   [`FailureFlag`]; the walk continues.
//! - Fatal: no worker threads could be started, a worker could not be
//!   joined (completion can no longer be determined), or a usage error
//!   at startup. These terminate the process with exit status 1.

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Errors raised while walking, linking or removing a tree.
#[derive(Error, Debug)]
pub enum WalkError {
    /// A directory could not be opened. The directory yields no entries.
    #[error("cannot open directory '{}': {source}", path.display())]
    OpenDir { path: PathBuf, source: io::Error },

    /// Reading directory entries failed mid-stream. Aborts that
    /// directory only; entries already yielded stand.
    #[error("error reading directory '{}': {source}", path.display())]
    ReadDir { path: PathBuf, source: io::Error },

    /// A metadata call failed; the entry is classified as a non-directory.
    #[error("cannot stat '{}': {source}", path.display())]
    Stat { path: PathBuf, source: io::Error },

    /// A hard link could not be created.
    #[error("cannot link '{}' to '{}': {source}", from.display(), to.display())]
    Link {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    /// A file could not be unlinked.
    #[error("cannot unlink '{}': {source}", path.display())]
    Unlink { path: PathBuf, source: io::Error },

    /// A directory could not be removed.
    #[error("cannot remove directory '{}': {source}", path.display())]
    Rmdir { path: PathBuf, source: io::Error },

    /// An input line exceeded the accepted length.
    #[error("input line longer than {limit} bytes")]
    LineTooLong { limit: usize },

    /// Reading the worklist input stream failed.
    #[error("cannot read input: {source}")]
    Input { source: io::Error },

    /// Writing the output stream failed.
    #[error("cannot write output: {source}")]
    Write { source: io::Error },

    /// Not a single worker thread could be started.
    #[error("cannot start any worker threads")]
    NoWorkersStarted,

    /// A worker thread could not be joined.
    #[error("worker thread lost; cannot determine completion")]
    JoinFailed,
}

impl WalkError {
    /// True for open failures caused by missing search permission.
    /// These may be expected (root-owned subtrees) and can be silenced.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            WalkError::OpenDir { source, .. } => source.kind() == io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }
}

/// Exact-match usage error; the message is the usage line itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("usage: {usage}")]
pub struct UsageError {
    pub usage: &'static str,
}

/// Write one diagnostic line for a recoverable failure.
pub fn report(tool: &str, err: &WalkError) {
    eprintln!("{tool}: {err}");
}

/// Monotonic any-failure-seen flag shared by all workers.
///
/// Only ever raised, never cleared, so relaxed ordering is enough: the
/// sole reader is the exit-status computation after the pool has joined.
#[derive(Debug, Default)]
pub struct FailureFlag(AtomicBool);

impl FailureFlag {
    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_classification() {
        let denied = WalkError::OpenDir {
            path: "/locked".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(denied.is_permission_denied());

        let missing = WalkError::OpenDir {
            path: "/gone".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(!missing.is_permission_denied());

        // Only open failures qualify for suppression
        let stat_denied = WalkError::Stat {
            path: "/locked/f".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(!stat_denied.is_permission_denied());
    }

    #[test]
    fn test_failure_flag_is_monotonic() {
        let flag = FailureFlag::default();
        assert!(!flag.is_set());
        flag.set();
        flag.set();
        assert!(flag.is_set());
    }

    #[test]
    fn test_error_display_includes_path() {
        let err = WalkError::Unlink {
            path: "/data/f".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        let msg = err.to_string();
        assert!(msg.contains("/data/f"));
        assert!(msg.starts_with("cannot unlink"));
    }
}
