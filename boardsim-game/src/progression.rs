//! Leveled collection meter with carry-over.
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::constants::STARTING_LEVEL;

/// One row of the externally supplied level table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelEntry {
    pub level: u32,
    #[serde(alias = "required")]
    pub required_points: u64,
    #[serde(alias = "gold")]
    pub reward_amount: i64,
    #[serde(default, alias = "desc")]
    pub description: String,
}

/// Validated level table, ordered by level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LevelTable {
    entries: Vec<LevelEntry>,
}

impl LevelTable {
    /// Validate and wrap level rows.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::LevelOrder` when levels are not strictly
    /// ascending, or `ConfigError::ZeroRequirement` when a level needs no points.
    pub fn new(entries: Vec<LevelEntry>) -> Result<Self, ConfigError> {
        let mut previous: Option<u32> = None;
        for (position, entry) in entries.iter().enumerate() {
            if previous.is_some_and(|prev| entry.level <= prev) {
                return Err(ConfigError::LevelOrder {
                    position,
                    level: entry.level,
                });
            }
            if entry.required_points == 0 {
                return Err(ConfigError::ZeroRequirement { level: entry.level });
            }
            previous = Some(entry.level);
        }
        Ok(Self { entries })
    }

    /// Parse a JSON array of level rows and validate it.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json(json: &str) -> Result<Self, LevelTableLoadError> {
        let entries: Vec<LevelEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries)?)
    }

    #[must_use]
    pub fn entry(&self, level: u32) -> Option<&LevelEntry> {
        self.entries
            .binary_search_by_key(&level, |entry| entry.level)
            .ok()
            .and_then(|idx| self.entries.get(idx))
    }

    #[must_use]
    pub fn entries(&self) -> &[LevelEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Failure while loading a level table from serialized form.
#[derive(Debug, thiserror::Error)]
pub enum LevelTableLoadError {
    #[error("level table JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// A single level transition produced by [`Progression::add_points`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUp {
    pub from_level: u32,
    pub to_level: u32,
    /// Unscaled reward from the table row that was completed.
    pub reward_amount: i64,
    pub description: String,
}

/// Mutable progression meter. The level table lives with the engine; the
/// meter only tracks where the session stands against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progression {
    pub level: u32,
    pub points: u64,
    /// Number of pickups collected (not points).
    pub total_collected: u64,
}

impl Default for Progression {
    fn default() -> Self {
        Self::new()
    }
}

impl Progression {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            level: STARTING_LEVEL,
            points: 0,
            total_collected: 0,
        }
    }

    /// True once no table row exists for the current level.
    #[must_use]
    pub fn is_max_level(&self, table: &LevelTable) -> bool {
        table.entry(self.level).is_none()
    }

    /// Points still needed for the next level, `None` at max level.
    #[must_use]
    pub fn points_to_next(&self, table: &LevelTable) -> Option<u64> {
        table
            .entry(self.level)
            .map(|entry| entry.required_points.saturating_sub(self.points))
    }

    /// Record one pickup worth `points`, then level up as many times as the
    /// accumulated points allow. Remainders carry forward; at max level the
    /// points are retained but inert.
    pub fn add_points(&mut self, points: u64, table: &LevelTable) -> Vec<LevelUp> {
        self.points = self.points.saturating_add(points);
        self.total_collected = self.total_collected.saturating_add(1);

        let mut level_ups = Vec::new();
        while let Some(entry) = table.entry(self.level) {
            if self.points < entry.required_points {
                break;
            }
            self.points -= entry.required_points;
            let from_level = self.level;
            self.level = self.level.saturating_add(1);
            level_ups.push(LevelUp {
                from_level,
                to_level: self.level,
                reward_amount: entry.reward_amount,
                description: entry.description.clone(),
            });
            if self.level == u32::MAX {
                break;
            }
        }
        level_ups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: u32, required_points: u64, reward_amount: i64) -> LevelEntry {
        LevelEntry {
            level,
            required_points,
            reward_amount,
            description: format!("Level {level} reward"),
        }
    }

    fn two_level_table() -> LevelTable {
        LevelTable::new(vec![entry(1, 3, 1000), entry(2, 5, 2000)]).unwrap()
    }

    #[test]
    fn single_pickup_can_cross_several_levels() {
        let table = two_level_table();
        let mut progression = Progression::new();
        let ups = progression.add_points(8, &table);
        assert_eq!(ups.len(), 2);
        assert_eq!(ups[0].from_level, 1);
        assert_eq!(ups[1].to_level, 3);
        assert_eq!(
            ups.iter().map(|up| up.reward_amount).sum::<i64>(),
            3_000
        );
        assert_eq!(progression.level, 3);
        assert_eq!(progression.points, 0);
        assert_eq!(progression.total_collected, 1);
        assert!(progression.is_max_level(&table));
    }

    #[test]
    fn remainder_carries_forward() {
        let table = two_level_table();
        let mut progression = Progression::new();
        assert_eq!(progression.add_points(4, &table).len(), 1);
        assert_eq!(progression.level, 2);
        assert_eq!(progression.points, 1);
        assert_eq!(progression.points_to_next(&table), Some(4));
    }

    #[test]
    fn max_level_retains_inert_points() {
        let table = two_level_table();
        let mut progression = Progression::new();
        progression.add_points(8, &table);
        assert!(progression.add_points(50, &table).is_empty());
        assert_eq!(progression.level, 3);
        assert_eq!(progression.points, 50);
        assert_eq!(progression.points_to_next(&table), None);
        assert_eq!(progression.total_collected, 2);
    }

    #[test]
    fn empty_table_starts_at_max_level() {
        let table = LevelTable::default();
        let mut progression = Progression::new();
        assert!(progression.is_max_level(&table));
        assert!(progression.add_points(10, &table).is_empty());
    }

    #[test]
    fn rejects_unordered_levels() {
        let err = LevelTable::new(vec![entry(2, 3, 10), entry(1, 3, 10)]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::LevelOrder {
                position: 1,
                level: 1
            }
        );
    }

    #[test]
    fn rejects_zero_requirement() {
        let err = LevelTable::new(vec![entry(1, 0, 10)]).unwrap_err();
        assert_eq!(err, ConfigError::ZeroRequirement { level: 1 });
    }

    #[test]
    fn parses_legacy_column_names() {
        let table = LevelTable::from_json(
            r#"[{ "level": 1, "required": 2, "gold": 500, "desc": "first" }]"#,
        )
        .unwrap();
        assert_eq!(table.entry(1).unwrap().required_points, 2);
        assert_eq!(table.entry(1).unwrap().reward_amount, 500);
        assert!(table.entry(2).is_none());
    }
}
