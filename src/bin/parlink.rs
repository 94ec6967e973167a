//! parlink - hard-link a list of files quickly.
//!
//! Source paths arrive on stdin, relative to the current directory;
//! each gets a hard link at the same relative path under the target
//! root given with -d.

use anyhow::Result;
use clap::Parser;
use parfind::config::{LinkArgs, LinkConfig};
use parfind::link;
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = match LinkArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
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
            eprintln!("parlink: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: LinkArgs) -> Result<ExitCode> {
    parfind::setup_logging(false);
    let cfg = LinkConfig::from_args(args);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let report = link::run(&cfg, &mut input)?;

    Ok(if report.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
