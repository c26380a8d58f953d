use std::env;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

/// Timing configuration for the frame scheduler.
///
/// Parsed from TOML (`from_toml` / `from_file`) or built from defaults plus
/// environment overrides (`from_env`). All durations are in microseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Target frame rate. 0 = uncapped, no frame deadline.
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
    /// Safety margin subtracted from the frame deadline.
    #[serde(default = "default_frame_padding")]
    pub frame_padding_us: u64,
    /// Guaranteed processing time per frame, regardless of the deadline.
    #[serde(default = "default_min_process_time")]
    pub min_process_time_us: u64,
    /// Assumed cost of a task kind that has never run.
    #[serde(default = "default_baseline_estimate")]
    pub baseline_estimate_us: u64,
    /// Multiplier applied to a task's average cost when deciding whether it
    /// still fits before the deadline.
    #[serde(default = "default_skip_ahead_factor")]
    pub skip_ahead_factor: u32,
}

fn default_target_fps() -> u32 { 60 }
fn default_frame_padding() -> u64 { 2_000 }
fn default_min_process_time() -> u64 { 1_000 }
fn default_baseline_estimate() -> u64 { 1_000 }
fn default_skip_ahead_factor() -> u32 { 2 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            frame_padding_us: default_frame_padding(),
            min_process_time_us: default_min_process_time(),
            baseline_estimate_us: default_baseline_estimate(),
            skip_ahead_factor: default_skip_ahead_factor(),
        }
    }
}

impl SchedulerConfig {
    /// Parse config from a TOML string, apply `FRAMEFILL_*` overrides, validate.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.apply_overrides(|key| profiled_env_opt(&active_profile(), key));
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Defaults plus environment overrides (call `load_dotenv()` first).
    ///
    /// Profile is read from `FRAMEFILL_PROFILE`. When set (e.g. `BENCH`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| profiled_env_opt(&active_profile(), key));
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup.
    ///
    /// Keys: `FRAMEFILL_TARGET_FPS`, `FRAMEFILL_FRAME_PADDING_US`,
    /// `FRAMEFILL_MIN_PROCESS_TIME_US`, `FRAMEFILL_BASELINE_ESTIMATE_US`,
    /// `FRAMEFILL_SKIP_AHEAD_FACTOR`. Unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let parse_u64 = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        let parse_u32 = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u32>().ok());

        if let Some(v) = parse_u32("FRAMEFILL_TARGET_FPS") {
            self.target_fps = v;
        }
        if let Some(v) = parse_u64("FRAMEFILL_FRAME_PADDING_US") {
            self.frame_padding_us = v;
        }
        if let Some(v) = parse_u64("FRAMEFILL_MIN_PROCESS_TIME_US") {
            self.min_process_time_us = v;
        }
        if let Some(v) = parse_u64("FRAMEFILL_BASELINE_ESTIMATE_US") {
            self.baseline_estimate_us = v;
        }
        if let Some(v) = parse_u32("FRAMEFILL_SKIP_AHEAD_FACTOR") {
            self.skip_ahead_factor = v;
        }
    }

    /// Validate the config.
    ///
    /// An uncapped frame rate with no processing floor is accepted but logged:
    /// nothing bounds the drain in that configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.skip_ahead_factor == 0 {
            return Err(ConfigError::Invalid(
                "skip_ahead_factor must be at least 1".into(),
            ));
        }
        let budget = self.frame_budget();
        if !budget.is_zero() && self.frame_padding() >= budget {
            return Err(ConfigError::Invalid(format!(
                "frame_padding_us ({}) must be smaller than the frame budget ({}us at {} fps)",
                self.frame_padding_us,
                budget.as_micros(),
                self.target_fps
            )));
        }
        if budget.is_zero() && self.min_process_time_us == 0 {
            warn!("target_fps = 0 and min_process_time_us = 0: per-frame drain is unbounded");
        }
        Ok(())
    }

    /// Frame budget derived from the target frame rate (zero when uncapped).
    pub fn frame_budget(&self) -> Duration {
        frame_budget_for(self.target_fps)
    }

    pub fn frame_padding(&self) -> Duration {
        Duration::from_micros(self.frame_padding_us)
    }

    pub fn min_process_time(&self) -> Duration {
        Duration::from_micros(self.min_process_time_us)
    }

    pub fn baseline_estimate(&self) -> Duration {
        Duration::from_micros(self.baseline_estimate_us)
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        info!(
            target_fps = self.target_fps,
            frame_budget_us = self.frame_budget().as_micros() as u64,
            frame_padding_us = self.frame_padding_us,
            min_process_time_us = self.min_process_time_us,
            baseline_estimate_us = self.baseline_estimate_us,
            skip_ahead_factor = self.skip_ahead_factor,
            "scheduler config loaded"
        );
    }
}

/// `1_000_000 / fps` microseconds, or zero for an uncapped frame rate.
pub fn frame_budget_for(target_fps: u32) -> Duration {
    if target_fps == 0 {
        Duration::ZERO
    } else {
        Duration::from_micros(1_000_000 / u64::from(target_fps))
    }
}

fn active_profile() -> String {
    env_opt("FRAMEFILL_PROFILE").unwrap_or_default().to_uppercase()
}
