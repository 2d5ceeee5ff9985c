//! Playback tuning.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Which candidate paths of an iteration get an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnFilter {
    /// One agent per candidate path.
    #[default]
    AllPaths,
    /// Only the iteration's best path (`paths[0]`).
    BestOnly,
}

/// How edges are turned into on-screen paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMode {
    /// Two-point straight segments.
    #[default]
    Straight,
    /// Ask a routing collaborator for a road-following polyline.
    Routed,
}

/// Configuration for playback parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Tick length that `speed` is expressed against (default: 50).
    pub reference_dt_ms: u64,
    /// Pause between the last agent arriving and the next iteration (default: 500).
    pub settle_delay_ms: u64,
    /// Lower bound of the per-agent speed, in segments per reference tick (default: 0.02).
    pub min_speed: f64,
    /// Upper bound, exclusive (default: 0.04).
    pub max_speed: f64,
    /// Node positions kept in each agent's trail (default: 10).
    pub trail_length: usize,
    pub spawn_filter: SpawnFilter,
    pub path_mode: PathMode,
    /// Seed for agent speeds. Random when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            reference_dt_ms: 50,
            settle_delay_ms: 500,
            min_speed: 0.02,
            max_speed: 0.04,
            trail_length: 10,
            spawn_filter: SpawnFilter::AllPaths,
            path_mode: PathMode::Straight,
            seed: None,
        }
    }
}

impl PlaybackConfig {
    pub fn reference_dt(&self) -> Duration {
        Duration::from_millis(self.reference_dt_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reference_dt_ms == 0 {
            return Err(ConfigError::ZeroReferenceDt);
        }
        if !self.min_speed.is_finite()
            || !self.max_speed.is_finite()
            || self.min_speed <= 0.0
            || self.max_speed < self.min_speed
        {
            return Err(ConfigError::InvalidSpeedRange {
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("reference_dt_ms must be positive")]
    ZeroReferenceDt,

    #[error("speed range {min}..{max} is empty, inverted or not finite")]
    InvalidSpeedRange { min: f64, max: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PlaybackConfig::default().validate().is_ok());
        assert_eq!(PlaybackConfig::default().settle_delay(), Duration::from_millis(500));
    }

    #[test]
    fn rejects_bad_speeds() {
        let config = PlaybackConfig {
            min_speed: 0.05,
            max_speed: 0.01,
            ..PlaybackConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSpeedRange { .. })
        ));

        let config = PlaybackConfig {
            min_speed: f64::NAN,
            ..PlaybackConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PlaybackConfig {
            reference_dt_ms: 0,
            ..PlaybackConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroReferenceDt));
    }

    #[test]
    fn partial_tables_fill_in_defaults() {
        let config: PlaybackConfig =
            serde_json::from_str(r#"{"spawn_filter": "best_only", "seed": 7}"#).unwrap();
        assert_eq!(config.spawn_filter, SpawnFilter::BestOnly);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.trail_length, 10);
    }
}
