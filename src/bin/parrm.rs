//! parrm - parallel recursive tree deleter.
//!
//! This command destroys quickly, so the entire command line is the
//! literal `parrm -rfp DIR`; anything else prints usage and touches
//! nothing.

use anyhow::Result;
use parfind::config::parse_remove_args;
use parfind::remove;
use std::ffi::OsString;
use std::process::ExitCode;

fn main() -> ExitCode {
    let argv: Vec<OsString> = std::env::args_os().skip(1).collect();
    let cfg = match parse_remove_args(&argv) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run(cfg) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("parrm: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cfg: parfind::config::RemoveConfig) -> Result<ExitCode> {
    parfind::setup_logging(false);
    let report = remove::run(&cfg)?;

    Ok(if report.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
