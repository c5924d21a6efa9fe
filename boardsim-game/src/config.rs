//! Session configuration and the structural errors raised while loading it.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_COLLECTIBLE_WEIGHT, DEFAULT_LOG_CAPACITY, DEFAULT_MULTIPLIER,
    DEFAULT_PICKUP_POINTS, DEFAULT_SALARY, DEFAULT_STARTING_DICE, DEFAULT_STARTING_MONEY,
    DEFAULT_TILE_WEIGHT,
};

/// Errors raised when board, level-table, or session configuration violates
/// structural invariants. These are fatal at init: the engine does not start.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("board must contain at least one tile")]
    EmptyBoard,
    #[error("tile at position {position} has index {found}; indices must be contiguous from 0")]
    NonContiguousIndex { position: usize, found: usize },
    #[error("tile {index} bonus probability must be within 0.0..=1.0 (got {value})")]
    InvalidProbability { index: usize, value: f64 },
    #[error("tile {index} weight must be positive")]
    ZeroWeight { index: usize },
    #[error("level table entry {position} has level {level}; levels must be unique and ascending")]
    LevelOrder { position: usize, level: u32 },
    #[error("level {level} must require at least one point")]
    ZeroRequirement { level: u32 },
    #[error("{field} must be at least 1")]
    ZeroValue { field: &'static str },
}

/// Tunable knobs for a session. Every field falls back to its default when
/// missing from the serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SystemConfig {
    pub starting_money: i64,
    pub starting_dice: u64,
    pub multiplier: u32,
    /// Salary credited (times the multiplier) when a move crosses index 0.
    pub salary: i64,
    /// Base progression points per pickup, scaled by the multiplier.
    pub pickup_points: u32,
    /// Destination weight for tiles holding a collectible under smart targeting.
    pub collectible_weight: u32,
    /// Destination weight for tiles without a configured weight.
    pub default_tile_weight: u32,
    pub smart_targeting: bool,
    /// Turns per scheduling slice in fast batch mode.
    pub batch_size: u32,
    /// Number of log entries retained in memory.
    pub log_capacity: usize,
    /// Seed for the RNG streams; fresh entropy when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            starting_money: DEFAULT_STARTING_MONEY,
            starting_dice: DEFAULT_STARTING_DICE,
            multiplier: DEFAULT_MULTIPLIER,
            salary: DEFAULT_SALARY,
            pickup_points: DEFAULT_PICKUP_POINTS,
            collectible_weight: DEFAULT_COLLECTIBLE_WEIGHT,
            default_tile_weight: DEFAULT_TILE_WEIGHT,
            smart_targeting: false,
            batch_size: DEFAULT_BATCH_SIZE,
            log_capacity: DEFAULT_LOG_CAPACITY,
            seed: None,
        }
    }
}

impl SystemConfig {
    /// Builder-style seed override.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ZeroValue` when a knob that scales or sizes the
    /// simulation is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&'static str, bool); 5] = [
            ("multiplier", self.multiplier == 0),
            ("collectibleWeight", self.collectible_weight == 0),
            ("defaultTileWeight", self.default_tile_weight == 0),
            ("batchSize", self.batch_size == 0),
            ("logCapacity", self.log_capacity == 0),
        ];
        match checks.into_iter().find(|(_, is_zero)| *is_zero) {
            Some((field, _)) => Err(ConfigError::ZeroValue { field }),
            None => Ok(()),
        }
    }

    /// Load configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_session_constants() {
        let cfg = SystemConfig::default();
        assert_eq!(cfg.starting_money, 5_000);
        assert_eq!(cfg.starting_dice, 1_000);
        assert_eq!(cfg.multiplier, 1);
        assert_eq!(cfg.salary, 2_000);
        assert_eq!(cfg.log_capacity, 50);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg = SystemConfig::from_json(r#"{ "multiplier": 3, "seed": 9 }"#).unwrap();
        assert_eq!(cfg.multiplier, 3);
        assert_eq!(cfg.seed, Some(9));
        assert_eq!(cfg.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn zero_multiplier_is_rejected() {
        let cfg = SystemConfig {
            multiplier: 0,
            ..SystemConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ZeroValue {
                field: "multiplier"
            })
        );
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let cfg = SystemConfig {
            batch_size: 0,
            ..SystemConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ZeroValue { field: "batchSize" })
        ));
    }
}
