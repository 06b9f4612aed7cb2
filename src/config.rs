use std::fs;
use std::path::Path;
use std::time::Duration;
use anyhow::{Context, Result};
use serde::Deserialize;
use crate::drivers::{
    ShellCommand, SweepError, DEFAULT_GRACE, DEFAULT_SENTINEL_WIDTH, DEFAULT_SWEEP_COMMAND,
    DEFAULT_WATERFALL_DEPTH,
};
/// Power range mapped onto the plot axis and the waterfall colormap.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub power_min_db: f64,
    pub power_max_db: f64,
}
impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            power_min_db: -80.0,
            power_max_db: 0.0,
        }
    }
}
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Command line handed to the shell.
    pub command: String,
    /// Overrides the platform shell (`sh` / `cmd`).
    pub shell: Option<String>,
    /// Power-value count that marks the "no usable bins" record; `null` disables it.
    pub sentinel_width: Option<usize>,
    pub waterfall_depth: usize,
    pub shutdown_grace_ms: u64,
    /// Pending renderer notifications before new ones are dropped.
    pub notify_capacity: usize,
    pub display: DisplayConfig,
}
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_SWEEP_COMMAND.to_string(),
            shell: None,
            sentinel_width: Some(DEFAULT_SENTINEL_WIDTH),
            waterfall_depth: DEFAULT_WATERFALL_DEPTH,
            shutdown_grace_ms: DEFAULT_GRACE.as_millis() as u64,
            notify_capacity: 64,
            display: DisplayConfig::default(),
        }
    }
}
impl AppConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("invalid config JSON")?;
        Ok(config)
    }
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))
    }
    pub fn validate(&self) -> Result<(), SweepError> {
        if self.command.trim().is_empty() {
            return Err(SweepError::InvalidConfig("command is empty".into()));
        }
        if self.waterfall_depth == 0 {
            return Err(SweepError::InvalidConfig(
                "waterfall_depth must be at least 1".into(),
            ));
        }
        if self.notify_capacity == 0 {
            return Err(SweepError::InvalidConfig(
                "notify_capacity must be at least 1".into(),
            ));
        }
        if !(self.display.power_min_db < self.display.power_max_db) {
            return Err(SweepError::InvalidConfig(format!(
                "display range {}..{} dB is empty",
                self.display.power_min_db, self.display.power_max_db
            )));
        }
        Ok(())
    }
    pub fn shell_command(&self) -> ShellCommand {
        let cmd = ShellCommand::platform(self.command.clone());
        match &self.shell {
            Some(shell) => cmd.with_shell(shell.clone()),
            None => cmd,
        }
    }
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
