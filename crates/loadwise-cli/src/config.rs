//! TOML configuration for the `loadwise` binary.
//!
//! Looked up at `--config FILE` or `./loadwise.toml`. Every key is optional:
//!
//! ```toml
//! [thresholds]
//! optimal_min = 0.7
//! overload = 1.0
//! high_priority = 1.2
//!
//! [optimizer]
//! max_shift_days = 30
//! mode = "minimize_peaks"
//!
//! [replacement]
//! match_group = true
//!
//! [output]
//! format = "json"
//! display = "hours"
//! ```

use anyhow::{bail, Context, Result};
use loadwise_engine::{DisplayMode, EngineOptions, ReplacementOptions, ShiftOptions, Thresholds};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::output::OutputFormat;

/// File picked up from the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "loadwise.toml";

/// Output defaults, overridden by `--format` and `--display`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub display: DisplayMode,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub optimizer: ShiftOptions,
    #[serde(default)]
    pub replacement: ReplacementOptions,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load the configuration.
    ///
    /// An explicit path must exist. Without one, `./loadwise.toml` is used
    /// when present and the defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&content).with_context(|| format!("Invalid config file: {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject thresholds that would make classification ambiguous
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        if !(t.optimal_min >= 0.0 && t.optimal_min <= t.overload) {
            bail!(
                "thresholds.optimal_min ({}) must be between 0 and thresholds.overload ({})",
                t.optimal_min,
                t.overload
            );
        }
        if t.high_priority < t.overload {
            bail!(
                "thresholds.high_priority ({}) must not be below thresholds.overload ({})",
                t.high_priority,
                t.overload
            );
        }
        if self.optimizer.max_target_utilization <= 0.0 {
            bail!(
                "optimizer.max_target_utilization must be positive, got {}",
                self.optimizer.max_target_utilization
            );
        }
        if self.optimizer.min_improvement_hours < 0.0 {
            bail!("optimizer.min_improvement_hours must not be negative");
        }
        Ok(())
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            thresholds: self.thresholds.clone(),
            optimizer: self.optimizer.clone(),
            replacement: self.replacement.clone(),
        }
    }
}
