//! Point-in-time copies of engine state handed to consumers.
use serde::{Deserialize, Serialize};

use crate::event_log::LogEntry;
use crate::state::RunMode;

/// Progression as rendered by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionView {
    pub level: u32,
    pub points: u64,
    pub total_collected: u64,
    /// Points still needed for the next level; absent at max level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_to_next: Option<u64>,
    pub is_max_level: bool,
}

/// Everything a renderer needs after a state-changing operation. Built only
/// after a turn fully resolves, so position and log always agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub turn: u64,
    pub position: usize,
    pub money: i64,
    pub dice: u64,
    pub multiplier: u32,
    pub tile_visit_counts: Vec<u64>,
    pub collectibles: Vec<usize>,
    pub progression: ProgressionView,
    /// Retained log tail, oldest first.
    pub log: Vec<LogEntry>,
    pub last_step: u8,
    pub run_mode: RunMode,
}

impl Snapshot {
    /// Highest log id present in the tail, 0 when empty.
    #[must_use]
    pub fn last_log_id(&self) -> u64 {
        self.log.last().map_or(0, |entry| entry.id)
    }

    #[must_use]
    pub fn total_visits(&self) -> u64 {
        self.tile_visit_counts.iter().sum()
    }
}
