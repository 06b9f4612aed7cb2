use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;
use crate::config::AppConfig;
#[derive(Parser, Debug)]
#[command(
    name = "sweepfall",
    about = "Live spectrum and waterfall view of a hackrf_sweep style stream"
)]
pub struct Cli {
    /// JSON config file; command line flags take precedence over it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Sweep tool command line, run through the shell
    #[arg(long)]
    pub command: Option<String>,

    /// Power-value count that marks the "no usable bins" record
    #[arg(long, conflicts_with = "no_sentinel")]
    pub sentinel_width: Option<usize>,

    /// Never treat any record as the terminal sentinel
    #[arg(long, action)]
    pub no_sentinel: bool,

    /// Number of rows kept in the waterfall
    #[arg(long)]
    pub depth: Option<usize>,

    /// Milliseconds the tool gets to exit before it is killed
    #[arg(long)]
    pub grace_ms: Option<u64>,

    /// Log each sweep instead of opening a window
    #[arg(long, action)]
    pub headless: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG wins when set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
impl Cli {
    pub fn resolve(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }
    fn apply(&self, config: &mut AppConfig) {
        if let Some(command) = &self.command {
            config.command = command.clone();
        }
        if self.no_sentinel {
            config.sentinel_width = None;
        } else if let Some(width) = self.sentinel_width {
            config.sentinel_width = Some(width);
        }
        if let Some(depth) = self.depth {
            config.waterfall_depth = depth;
        }
        if let Some(ms) = self.grace_ms {
            config.shutdown_grace_ms = ms;
        }
    }
}
