//! Runtime configuration.
//!
//! Every cadence the protocol depends on is a value here, with the
//! defaults below. A JSON file may override any subset of fields;
//! command-line arguments are applied on top of that.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuntimeError};

pub const DEFAULT_REGION_PATH: &str = "/dev/shm/snake-duo.region";

/// What to do when the backing file is shorter than `offset + REGION_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizePolicy {
    /// Grow a regular file to the required length.
    #[default]
    Extend,
    /// Refuse to map; the caller must pre-size the file.
    Require,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub region_path: PathBuf,
    pub region_offset: u64,
    pub size_policy: SizePolicy,
    /// Loop tick while Active (render + input cadence).
    pub active_tick_ms: u64,
    /// Loop tick while Settling or Dormant; also the liveness poll cadence.
    pub poll_interval_ms: u64,
    /// How often the Active holder stamps the heartbeat.
    pub heartbeat_interval_ms: u64,
    /// Heartbeat silence after which the owner is declared dead.
    pub liveness_timeout_ms: u64,
    /// Observation window before a fresh process decides there is no incumbent.
    pub settle_window_ms: u64,
    /// Food generator seed; random when absent.
    pub rng_seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            region_path: PathBuf::from(DEFAULT_REGION_PATH),
            region_offset: 0,
            size_policy: SizePolicy::Extend,
            active_tick_ms: 16,
            poll_interval_ms: 100,
            heartbeat_interval_ms: 500,
            liveness_timeout_ms: 1000,
            settle_window_ms: 1500,
            rng_seed: None,
        }
    }
}

impl RuntimeConfig {
    /// Load overrides from a JSON file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| RuntimeError::io(path, e))?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            RuntimeError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    /// Reject cadences under which the protocol cannot work.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("active_tick_ms", self.active_tick_ms),
            ("poll_interval_ms", self.poll_interval_ms),
            ("heartbeat_interval_ms", self.heartbeat_interval_ms),
            ("liveness_timeout_ms", self.liveness_timeout_ms),
            ("settle_window_ms", self.settle_window_ms),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(RuntimeError::InvalidConfig(format!("{name} must be positive")));
        }
        if self.heartbeat_interval_ms >= self.liveness_timeout_ms {
            return Err(RuntimeError::InvalidConfig(format!(
                "heartbeat_interval_ms ({}) must be below liveness_timeout_ms ({})",
                self.heartbeat_interval_ms, self.liveness_timeout_ms
            )));
        }
        if self.heartbeat_interval_ms >= self.settle_window_ms {
            return Err(RuntimeError::InvalidConfig(format!(
                "heartbeat_interval_ms ({}) must be below settle_window_ms ({})",
                self.heartbeat_interval_ms, self.settle_window_ms
            )));
        }
        Ok(())
    }

    pub fn active_tick(&self) -> Duration {
        Duration::from_millis(self.active_tick_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }

    pub fn settle_window(&self) -> Duration {
        Duration::from_millis(self.settle_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        RuntimeConfig::default().validate().unwrap();
    }

    #[test]
    fn heartbeat_must_beat_faster_than_timeout() {
        let config = RuntimeConfig {
            heartbeat_interval_ms: 1000,
            liveness_timeout_ms: 1000,
            ..RuntimeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RuntimeError::InvalidConfig(msg)) if msg.contains("liveness_timeout_ms")
        ));
    }

    #[test]
    fn zero_tick_rejected() {
        let config = RuntimeConfig {
            active_tick_ms: 0,
            ..RuntimeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"region_offset": 4096, "size_policy": "require", "rng_seed": 7}}"#
        )
        .unwrap();
        let config = RuntimeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.region_offset, 4096);
        assert_eq!(config.size_policy, SizePolicy::Require);
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.heartbeat_interval_ms, 500);
    }

    #[test]
    fn unknown_field_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"heartbeat": 3}}"#).unwrap();
        assert!(matches!(
            RuntimeConfig::from_file(file.path()),
            Err(RuntimeError::InvalidConfig(_))
        ));
    }
}
