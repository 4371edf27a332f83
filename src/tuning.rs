//! Timing and retry knobs for the accessor protocol.
//!
//! Every delay, timeout, threshold, and budget the accessor and orchestrator
//! use lives here, so tests can shrink the profile and operators can stretch
//! it for slow machines via a TOML file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::retry::RetryPolicy;

/// Errors that can occur when loading a tuning file.
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse tuning file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Tunable timing/retry profile. All durations are milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct Tuning {
    /// Settling delay before enumeration starts.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// Stabilization delay at the start of an apply.
    #[serde(default = "default_apply_settle_ms")]
    pub apply_settle_ms: u64,
    /// Orchestrator pause between enumeration and apply.
    #[serde(default = "default_stabilize_ms")]
    pub stabilize_ms: u64,
    /// Timeout bounding every individual surface probe.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Discovery attempts on read paths.
    #[serde(default = "default_read_discovery_attempts")]
    pub read_discovery_attempts: u32,
    /// Discovery attempts on the apply path. Larger than the read budget:
    /// the surface is most likely to be mid-recreation right after an
    /// enumeration.
    #[serde(default = "default_apply_discovery_attempts")]
    pub apply_discovery_attempts: u32,
    /// Delay between discovery attempts.
    #[serde(default = "default_discovery_delay_ms")]
    pub discovery_delay_ms: u64,
    /// Budget for waiting on the shell root to appear before discovery.
    #[serde(default = "default_ready_budget_ms")]
    pub ready_budget_ms: u64,
    /// Poll interval while waiting on the shell root.
    #[serde(default = "default_ready_poll_ms")]
    pub ready_poll_ms: u64,
    /// Responsiveness-probe attempts before declaring the surface hung.
    #[serde(default = "default_ping_attempts")]
    pub ping_attempts: u32,
    /// Base backoff between responsiveness probes (doubles per attempt).
    #[serde(default = "default_ping_backoff_ms")]
    pub ping_backoff_ms: u64,
    /// Consecutive enumeration failures that trigger a surface refresh.
    #[serde(default = "default_enum_failure_threshold")]
    pub enum_failure_threshold: u32,
    /// Icons that must be processed between refresh attempts.
    #[serde(default = "default_refresh_cooldown_items")]
    pub refresh_cooldown_items: usize,
    /// Consecutive apply failures that trigger a refresh-and-retry.
    #[serde(default = "default_apply_failure_threshold")]
    pub apply_failure_threshold: u32,
    /// Insert a pacing delay after this many applied icons.
    #[serde(default = "default_pace_every")]
    pub pace_every: usize,
    /// Length of the pacing delay.
    #[serde(default = "default_pace_delay_ms")]
    pub pace_delay_ms: u64,
    /// Re-validate handle freshness and responsiveness after this many
    /// applied icons.
    #[serde(default = "default_revalidate_every")]
    pub revalidate_every: usize,
    /// Icon-count drift tolerated at apply time, as a percentage of the
    /// requested count.
    #[serde(default = "default_count_tolerance_percent")]
    pub count_tolerance_percent: usize,
}

fn default_settle_ms() -> u64 {
    100
}

fn default_apply_settle_ms() -> u64 {
    150
}

fn default_stabilize_ms() -> u64 {
    300
}

fn default_probe_timeout_ms() -> u64 {
    500
}

fn default_read_discovery_attempts() -> u32 {
    3
}

fn default_apply_discovery_attempts() -> u32 {
    6
}

fn default_discovery_delay_ms() -> u64 {
    150
}

fn default_ready_budget_ms() -> u64 {
    2000
}

fn default_ready_poll_ms() -> u64 {
    100
}

fn default_ping_attempts() -> u32 {
    3
}

fn default_ping_backoff_ms() -> u64 {
    200
}

fn default_enum_failure_threshold() -> u32 {
    5
}

fn default_refresh_cooldown_items() -> usize {
    10
}

fn default_apply_failure_threshold() -> u32 {
    3
}

fn default_pace_every() -> usize {
    10
}

fn default_pace_delay_ms() -> u64 {
    50
}

fn default_revalidate_every() -> usize {
    20
}

fn default_count_tolerance_percent() -> usize {
    10
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            apply_settle_ms: default_apply_settle_ms(),
            stabilize_ms: default_stabilize_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            read_discovery_attempts: default_read_discovery_attempts(),
            apply_discovery_attempts: default_apply_discovery_attempts(),
            discovery_delay_ms: default_discovery_delay_ms(),
            ready_budget_ms: default_ready_budget_ms(),
            ready_poll_ms: default_ready_poll_ms(),
            ping_attempts: default_ping_attempts(),
            ping_backoff_ms: default_ping_backoff_ms(),
            enum_failure_threshold: default_enum_failure_threshold(),
            refresh_cooldown_items: default_refresh_cooldown_items(),
            apply_failure_threshold: default_apply_failure_threshold(),
            pace_every: default_pace_every(),
            pace_delay_ms: default_pace_delay_ms(),
            revalidate_every: default_revalidate_every(),
            count_tolerance_percent: default_count_tolerance_percent(),
        }
    }
}

impl Tuning {
    /// Load a tuning profile from a TOML file. Fields absent from the file
    /// keep their defaults.
    pub fn load(path: &Path) -> Result<Self, TuningError> {
        let content = fs::read_to_string(path).map_err(|e| TuningError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| TuningError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn apply_settle(&self) -> Duration {
        Duration::from_millis(self.apply_settle_ms)
    }

    pub fn stabilize(&self) -> Duration {
        Duration::from_millis(self.stabilize_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn ready_budget(&self) -> Duration {
        Duration::from_millis(self.ready_budget_ms)
    }

    pub fn ready_poll(&self) -> Duration {
        Duration::from_millis(self.ready_poll_ms)
    }

    pub fn pace_delay(&self) -> Duration {
        Duration::from_millis(self.pace_delay_ms)
    }

    /// Discovery budget for enumeration and bounds reads.
    pub fn read_discovery(&self) -> RetryPolicy {
        RetryPolicy::fixed(
            self.read_discovery_attempts,
            Duration::from_millis(self.discovery_delay_ms),
        )
    }

    /// Discovery budget for the apply path.
    pub fn apply_discovery(&self) -> RetryPolicy {
        RetryPolicy::fixed(
            self.apply_discovery_attempts,
            Duration::from_millis(self.discovery_delay_ms),
        )
    }

    /// One-shot rediscovery used by mid-operation refreshes.
    pub fn single_discovery(&self) -> RetryPolicy {
        RetryPolicy::fixed(1, Duration::from_millis(self.discovery_delay_ms))
    }

    /// Responsiveness-probe budget with exponential backoff.
    pub fn ping_retry(&self) -> RetryPolicy {
        RetryPolicy::exponential(self.ping_attempts, Duration::from_millis(self.ping_backoff_ms))
    }
}
