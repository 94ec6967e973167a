//! parfind - fast parallel recursive file lister.
//!
//! Entry point; the walk itself lives in the library.

use anyhow::Result;
use clap::Parser;
use parfind::config::{ListArgs, ListConfig};
use parfind::list;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = match ListArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // usage problems exit 1; --help and --version exit 0
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("parfind: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: ListArgs) -> Result<ExitCode> {
    parfind::setup_logging(args.verbose);
    let cfg = ListConfig::from_args(args);

    if cfg.verbose {
        eprintln!("using {} threads", cfg.threads);
    }

    let stdout = io::stdout().lock();
    let mut out = BufWriter::new(stdout);
    let report = list::run(&cfg, &mut out)?;
    out.flush()?;

    if cfg.verbose {
        eprintln!("{} spins, {} stats", report.spins, report.stat_calls);
    }

    Ok(if report.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
