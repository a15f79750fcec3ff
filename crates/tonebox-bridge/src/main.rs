use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tonebox_bridge::app::{self, App};
use tonebox_bridge::config::Args;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match &args.log_filter {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter {directive:?}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = args.engine_config()?;
    info!(
        grain_seed = config.grain_seed,
        strict = config.reject_unknown_operations,
        "tonebox ready"
    );

    let mut app = App::new(config);
    app::run(&mut app, io::stdin().lock(), io::stdout().lock()).context("protocol loop")?;
    Ok(())
}
