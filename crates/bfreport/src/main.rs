//! bfreport: classify and dedup failures in `go test -json` logs
//!
//! This binary reads a `go test -json` log, classifies the failures in it and
//! prints either a JSON analysis or one summary line per failing test.

use std::io::Write;

use anyhow::Context;
use bfreport::analyze;
use bfreport::config::Config;
use clap::{CommandFactory, Parser};
use tracing::debug;

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Logs go to stderr; stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    config.validate()?;
    debug!(?config, "Starting bfreport");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let ran = analyze::run(&config, &mut out).context("could not analyze this run")?;
    if !ran {
        Config::command().print_help()?;
    }
    out.flush()?;
    Ok(())
}
