//! Configuration types for the three utilities.
//!
//! CLI argument parsing uses clap derive macros for the lister and the
//! linker. The remover is the exception: its command line is the exact
//! literal `parrm -rfp DIR` and anything else must be refused, so it is
//! matched by hand in [`parse_remove_args`] rather than through an
//! option parser that would happily accept reordered or split flags.

use crate::error::UsageError;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

/// Hard ceiling on worker threads. 128 approximates the number of
/// metadata RPCs a networked-filer client keeps in flight (c.f.
/// sunrpc.tcp_slot_table_entries); more threads than that just queue.
pub const MAX_PARALLEL: usize = 128;

/// Default worker count for the lister.
pub const DEFAULT_LIST_THREADS: usize = 30;

/// Default worker count for the linker.
pub const DEFAULT_LINK_THREADS: usize = 15;

/// Fixed worker count for the remover.
pub const REMOVE_THREADS: usize = 100;

/// Default number of items a linker worker pops per batch.
pub const DEFAULT_LINK_BATCH: usize = 50;

/// Longest accepted input line for the linker, newline included.
pub const MAX_LINE_BYTES: usize = 1999;

/// Clamp a requested worker count to the supported range.
pub fn clamp_threads(n: usize) -> usize {
    n.clamp(1, MAX_PARALLEL)
}

/// parfind - fast parallel recursive file lister
#[derive(Parser, Debug, Clone)]
#[command(
    name = "parfind",
    version,
    about = "Fast parallel recursive file lister",
    long_about = "Prints every non-directory under DIR (or every directory with -d),\n\
                  using a pool of worker threads to overlap directory-read and stat\n\
                  latency on networked filesystems. Output order follows the\n\
                  directory tree, not the traversal."
)]
pub struct ListArgs {
    /// Print directories instead of files
    #[arg(short = 'd', overrides_with = "files")]
    pub dirs: bool,

    /// Print files, not directories (the default)
    #[arg(short = 'f', overrides_with = "dirs")]
    pub files: bool,

    /// Number of worker threads
    #[arg(short = 'p', value_name = "N", default_value_t = DEFAULT_LIST_THREADS)]
    pub parallel: usize,

    /// Suppress permission-denied warnings from unreadable directories
    #[arg(short = 'q')]
    pub quiet: bool,

    /// Stat every entry, warming client metadata caches
    #[arg(short = 's')]
    pub stat_all: bool,

    /// Descend into .snapshot directories
    #[arg(short = 't')]
    pub snapshot: bool,

    /// Print summary counters to stderr
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Terminate output records with NUL instead of newline
    #[arg(short = '0')]
    pub null_terminated: bool,

    /// Directory to walk
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,
}

/// Which side of the tree the lister emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitMode {
    Files,
    Dirs,
}

/// Validated runtime configuration for the lister.
#[derive(Debug, Clone)]
pub struct ListConfig {
    /// Starting directory, kept verbatim as the output path prefix.
    pub root: PathBuf,

    /// Emit files or directories.
    pub mode: EmitMode,

    /// Worker thread count, already clamped.
    pub threads: usize,

    /// Silence permission-denied open failures.
    pub quiet: bool,

    /// Stat every entry regardless of the kind hint.
    pub force_stat: bool,

    /// Yield `.snapshot` entries instead of filtering them.
    pub include_snapshot: bool,

    /// Print counters to stderr.
    pub verbose: bool,

    /// Output record terminator.
    pub terminator: u8,
}

impl ListConfig {
    pub fn from_args(args: ListArgs) -> Self {
        Self {
            root: args.dir,
            mode: if args.dirs { EmitMode::Dirs } else { EmitMode::Files },
            threads: clamp_threads(args.parallel),
            quiet: args.quiet,
            force_stat: args.stat_all,
            include_snapshot: args.snapshot,
            verbose: args.verbose,
            terminator: if args.null_terminated { 0 } else { b'\n' },
        }
    }
}

/// parlink - hard-link a list of files quickly
#[derive(Parser, Debug, Clone)]
#[command(
    name = "parlink",
    version,
    about = "Hard-link a list of files in parallel",
    long_about = "Reads relative source paths from stdin, one per line, and creates a\n\
                  hard link for each under the target directory at the same relative\n\
                  path. The target directory structure must already exist; no\n\
                  directories are created."
)]
pub struct LinkArgs {
    /// Target directory root for the new links
    #[arg(short = 'd', value_name = "DIR")]
    pub dest: PathBuf,

    /// Number of worker threads
    #[arg(short = 'p', value_name = "N", default_value_t = DEFAULT_LINK_THREADS)]
    pub parallel: usize,

    /// Worklist items popped per batch
    #[arg(short = 'n', value_name = "N", default_value_t = DEFAULT_LINK_BATCH)]
    pub batch: usize,
}

/// Validated runtime configuration for the linker.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Root under which links are created.
    pub target: PathBuf,

    /// Worker thread count, already clamped.
    pub threads: usize,

    /// Items popped per batch, at least one.
    pub batch: usize,
}

impl LinkConfig {
    pub fn from_args(args: LinkArgs) -> Self {
        Self {
            target: args.dest,
            threads: clamp_threads(args.parallel),
            batch: args.batch.max(1),
        }
    }
}

/// Runtime configuration for the remover.
#[derive(Debug, Clone)]
pub struct RemoveConfig {
    /// Directory tree to destroy.
    pub root: PathBuf,
}

/// Usage line for the remover, also the text of its usage error.
pub const REMOVE_USAGE: &str = "parrm -rfp dir";

/// Parse the remover command line: exactly `-rfp DIR`, nothing else.
///
/// The sentinel is matched byte-for-byte. `-r -f -p`, `-rpf`, extra
/// operands or a missing directory all fail, so an accidental
/// `parrm somedir` cannot destroy anything.
pub fn parse_remove_args(args: &[OsString]) -> Result<RemoveConfig, UsageError> {
    match args {
        [sentinel, dir] if sentinel == "-rfp" => Ok(RemoveConfig {
            root: PathBuf::from(dir),
        }),
        _ => Err(UsageError {
            usage: REMOVE_USAGE,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_args(argv: &[&str]) -> ListArgs {
        ListArgs::try_parse_from(std::iter::once("parfind").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_list_defaults() {
        let cfg = ListConfig::from_args(list_args(&["tree"]));
        assert_eq!(cfg.mode, EmitMode::Files);
        assert_eq!(cfg.threads, DEFAULT_LIST_THREADS);
        assert_eq!(cfg.terminator, b'\n');
        assert!(!cfg.quiet && !cfg.force_stat && !cfg.include_snapshot);
    }

    #[test]
    fn test_list_last_mode_flag_wins() {
        let cfg = ListConfig::from_args(list_args(&["-d", "-f", "tree"]));
        assert_eq!(cfg.mode, EmitMode::Files);

        let cfg = ListConfig::from_args(list_args(&["-f", "-d", "tree"]));
        assert_eq!(cfg.mode, EmitMode::Dirs);
    }

    #[test]
    fn test_list_null_terminator() {
        let cfg = ListConfig::from_args(list_args(&["-0", "tree"]));
        assert_eq!(cfg.terminator, 0);
    }

    #[test]
    fn test_thread_clamp() {
        assert_eq!(clamp_threads(0), 1);
        assert_eq!(clamp_threads(1), 1);
        assert_eq!(clamp_threads(30), 30);
        assert_eq!(clamp_threads(4096), MAX_PARALLEL);

        let cfg = ListConfig::from_args(list_args(&["-p", "9999", "tree"]));
        assert_eq!(cfg.threads, MAX_PARALLEL);
    }

    #[test]
    fn test_list_requires_exactly_one_dir() {
        assert!(ListArgs::try_parse_from(["parfind"]).is_err());
        assert!(ListArgs::try_parse_from(["parfind", "a", "b"]).is_err());
    }

    #[test]
    fn test_link_defaults_and_clamps() {
        let args = LinkArgs::try_parse_from(["parlink", "-d", "dst"]).unwrap();
        let cfg = LinkConfig::from_args(args);
        assert_eq!(cfg.target, PathBuf::from("dst"));
        assert_eq!(cfg.threads, DEFAULT_LINK_THREADS);
        assert_eq!(cfg.batch, DEFAULT_LINK_BATCH);

        let args = LinkArgs::try_parse_from(["parlink", "-d", "dst", "-n", "0"]).unwrap();
        assert_eq!(LinkConfig::from_args(args).batch, 1);
    }

    #[test]
    fn test_link_requires_target() {
        assert!(LinkArgs::try_parse_from(["parlink"]).is_err());
        // no positional operands accepted
        assert!(LinkArgs::try_parse_from(["parlink", "-d", "dst", "extra"]).is_err());
    }

    #[test]
    fn test_remove_sentinel_exact_match() {
        let ok = parse_remove_args(&["-rfp".into(), "tree".into()]).unwrap();
        assert_eq!(ok.root, PathBuf::from("tree"));

        // anything other than the literal sentinel is a usage error
        assert!(parse_remove_args(&["tree".into()]).is_err());
        assert!(parse_remove_args(&["-rpf".into(), "tree".into()]).is_err());
        assert!(parse_remove_args(&["-r".into(), "-f".into(), "-p".into(), "tree".into()]).is_err());
        assert!(parse_remove_args(&["-rfp".into()]).is_err());
        assert!(parse_remove_args(&["-rfp".into(), "a".into(), "b".into()]).is_err());
        assert!(parse_remove_args(&[]).is_err());
    }
}
