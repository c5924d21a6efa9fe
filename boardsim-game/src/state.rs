use serde::{Deserialize, Serialize};

use crate::collectibles::CollectibleSet;
use crate::config::SystemConfig;
use crate::event_log::EventLog;
use crate::progression::Progression;

/// Which run the controller is currently driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunMode {
    #[default]
    Idle,
    PacedAuto,
    FastBatch,
}

impl RunMode {
    #[must_use]
    pub const fn is_auto(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Mutable session state, exclusively owned by the turn engine.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub turn_count: u64,
    pub position: usize,
    /// Signed; no bankruptcy is enforced.
    pub money: i64,
    pub dice_balance: u64,
    pub multiplier: u32,
    pub tile_visit_counts: Vec<u64>,
    pub collectibles: CollectibleSet,
    pub progression: Progression,
    pub log: EventLog,
    pub run_mode: RunMode,
    /// Step taken by the most recent completed turn, 0 before the first.
    pub last_step: u8,
}

impl EngineState {
    /// Fresh state for a board of `board_len` tiles.
    #[must_use]
    pub fn new(board_len: usize, config: &SystemConfig) -> Self {
        Self {
            turn_count: 0,
            position: 0,
            money: config.starting_money,
            dice_balance: config.starting_dice,
            multiplier: config.multiplier.max(1),
            tile_visit_counts: vec![0; board_len],
            collectibles: CollectibleSet::new(),
            progression: Progression::new(),
            log: EventLog::new(config.log_capacity),
            run_mode: RunMode::Idle,
            last_step: 0,
        }
    }

    /// Restore starting values for a new board while keeping the log's id
    /// sequence alive.
    pub fn reset(&mut self, board_len: usize, config: &SystemConfig) {
        let mut log = std::mem::replace(&mut self.log, EventLog::new(1));
        log.clear();
        log.set_capacity(config.log_capacity);
        *self = Self {
            log,
            ..Self::new(board_len, config)
        };
    }

    /// Visits recorded for `index`, 0 when out of range.
    #[must_use]
    pub fn visits(&self, index: usize) -> u64 {
        self.tile_visit_counts.get(index).copied().unwrap_or(0)
    }
}
