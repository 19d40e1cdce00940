//! Debugger configuration loaded from TOML.
//!
//! Every field has a default, so an absent file or an empty table is valid.
//! The defaults reproduce the scheduler constants the core was tuned with.

use crate::{DebuggerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const APP_DIR: &str = "emu-debug";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DebuggerConfig {
    pub scheduler: SchedulerConfig,
    pub storage: StorageConfig,
}

/// Tuning knobs for the adaptive batch controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Instructions requested by the first batch of a session.
    pub initial_step_size: usize,
    /// Batches retiring this many instructions or fewer are not measured.
    pub min_sample_steps: u64,
    /// Batches finishing under this many milliseconds double the step size.
    pub frame_budget_ms: f64,
    /// Weight of the newest sample in the throughput average.
    pub smoothing: f64,
    /// Upper bound on growth. `None` lets the step size grow without limit.
    pub max_step_size: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_step_size: 5000,
            min_sample_steps: 1000,
            frame_budget_ms: 8.0,
            smoothing: 0.5,
            max_step_size: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding persisted breakpoint sets, one file per session.
    pub dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("breakpoints")
        })
    }
}

impl DebuggerConfig {
    /// Default config file location, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// tried and silently skipped when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DebuggerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&text)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| DebuggerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let s = &self.scheduler;
        if s.initial_step_size == 0 {
            return Err(DebuggerError::Config("initial_step_size must be positive".into()).into());
        }
        if !(0.0..=1.0).contains(&s.smoothing) {
            return Err(DebuggerError::Config(format!(
                "smoothing must be within [0, 1], got {}",
                s.smoothing
            ))
            .into());
        }
        if let Some(max) = s.max_step_size {
            if max < s.initial_step_size {
                return Err(DebuggerError::Config(format!(
                    "max_step_size ({}) is below initial_step_size ({})",
                    max, s.initial_step_size
                ))
                .into());
            }
        }
        Ok(())
    }
}
