use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tonebox_core::config::EngineConfig;

/// Filter engine speaking newline-delimited JSON on stdin/stdout.
#[derive(Debug, Clone, Parser)]
#[command(name = "tonebox", version)]
pub struct Args {
    /// Engine settings file (JSON).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seed for the grain filter. Overrides the config file.
    #[arg(long)]
    pub grain_seed: Option<u64>,

    /// Reject unknown operation names instead of skipping them.
    #[arg(long)]
    pub strict: bool,

    /// Log filter directive, e.g. `debug` or `tonebox_core=trace`. Falls back
    /// to `RUST_LOG`, then `info`.
    #[arg(long)]
    pub log_filter: Option<String>,
}

impl Args {
    /// Config file (or defaults) with command-line overrides applied.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => EngineConfig::default(),
        };
        if let Some(seed) = self.grain_seed {
            config.grain_seed = seed;
        }
        if self.strict {
            config.reject_unknown_operations = true;
        }
        Ok(config)
    }
}
