//! Board configuration: the ordered, session-immutable list of tiles.
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Effect family of a tile. Payload-carrying variants hold the unscaled
/// amounts; the engine multiplies them at resolution time.
#[derive(Debug, Clone, PartialEq)]
pub enum TileKind {
    Start,
    PlainCell { value: i64 },
    SmallBonus { value: i64 },
    BigBonus { value: i64 },
    BonusChance { probability: f64, value: i64 },
    ToJail,
    Jail,
    Parking,
    /// Any tag the engine has no effect for; landing is informational.
    Other { label: String },
}

impl TileKind {
    /// Parse a tabular kind tag. Legacy sheet tags are accepted as aliases.
    #[must_use]
    pub fn from_tag(tag: &str, value: i64, probability: f64) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "START" | "GO" => Self::Start,
            "PLAIN_CELL" | "PROPERTY" => Self::PlainCell { value },
            "SMALL_BONUS" | "SMALL_GOLD" => Self::SmallBonus { value },
            "BIG_BONUS" | "BIG_GOLD" => Self::BigBonus { value },
            "BONUS_CHANCE" | "AIRPORT" => Self::BonusChance { probability, value },
            "TO_JAIL" | "GOTOJAIL" => Self::ToJail,
            "JAIL" => Self::Jail,
            "PARKING" => Self::Parking,
            other => Self::Other {
                label: other.to_string(),
            },
        }
    }

    /// Canonical tabular tag for this kind.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Start => "START",
            Self::PlainCell { .. } => "PLAIN_CELL",
            Self::SmallBonus { .. } => "SMALL_BONUS",
            Self::BigBonus { .. } => "BIG_BONUS",
            Self::BonusChance { .. } => "BONUS_CHANCE",
            Self::ToJail => "TO_JAIL",
            Self::Jail => "JAIL",
            Self::Parking => "PARKING",
            Self::Other { label } => label.as_str(),
        }
    }

    /// Unscaled monetary value carried by the tile, 0 for informational kinds.
    #[must_use]
    pub const fn value(&self) -> i64 {
        match self {
            Self::PlainCell { value }
            | Self::SmallBonus { value }
            | Self::BigBonus { value }
            | Self::BonusChance { value, .. } => *value,
            _ => 0,
        }
    }

    const fn probability(&self) -> f64 {
        match self {
            Self::BonusChance { probability, .. } => *probability,
            _ => 0.0,
        }
    }
}

/// A single tile on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TileRow", into = "TileRow")]
pub struct TileDescriptor {
    pub index: usize,
    pub kind: TileKind,
    pub name: String,
    /// Destination bias used by smart targeting; the session default applies when absent.
    pub weight: Option<u32>,
}

impl TileDescriptor {
    #[must_use]
    pub fn new(index: usize, kind: TileKind, name: impl Into<String>) -> Self {
        Self {
            index,
            kind,
            name: name.into(),
            weight: None,
        }
    }

    #[must_use]
    pub const fn with_weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }
}

/// Flat tabular row shape: `{index, kind, name, value, probability, weight?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TileRow {
    index: usize,
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: i64,
    #[serde(default)]
    probability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    weight: Option<u32>,
}

impl From<TileRow> for TileDescriptor {
    fn from(row: TileRow) -> Self {
        Self {
            index: row.index,
            kind: TileKind::from_tag(&row.kind, row.value, row.probability),
            name: row.name,
            weight: row.weight,
        }
    }
}

impl From<TileDescriptor> for TileRow {
    fn from(tile: TileDescriptor) -> Self {
        Self {
            index: tile.index,
            kind: tile.kind.tag().to_string(),
            value: tile.kind.value(),
            probability: tile.kind.probability(),
            name: tile.name,
            weight: tile.weight,
        }
    }
}

/// Validated, fixed-length circular board.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Board {
    tiles: Vec<TileDescriptor>,
}

impl Board {
    /// Build a board after checking its structural invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the board is empty, indices are not the
    /// contiguous sequence `0..N`, a bonus probability is outside `[0, 1]`, or
    /// a configured weight is zero.
    pub fn new(tiles: Vec<TileDescriptor>) -> Result<Self, ConfigError> {
        if tiles.is_empty() {
            return Err(ConfigError::EmptyBoard);
        }
        for (position, tile) in tiles.iter().enumerate() {
            if tile.index != position {
                return Err(ConfigError::NonContiguousIndex {
                    position,
                    found: tile.index,
                });
            }
            if let TileKind::BonusChance { probability, .. } = tile.kind
                && !(probability.is_finite() && (0.0..=1.0).contains(&probability))
            {
                return Err(ConfigError::InvalidProbability {
                    index: tile.index,
                    value: probability,
                });
            }
            if tile.weight == Some(0) {
                return Err(ConfigError::ZeroWeight { index: tile.index });
            }
        }
        Ok(Self { tiles })
    }

    /// Parse a JSON array of tile rows and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the board is structurally invalid.
    pub fn from_json(json: &str) -> Result<Self, BoardLoadError> {
        let tiles: Vec<TileDescriptor> = serde_json::from_str(json)?;
        Ok(Self::new(tiles)?)
    }

    /// Number of tiles (N).
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Always false for a validated board; present for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    #[must_use]
    pub fn tile(&self, index: usize) -> Option<&TileDescriptor> {
        self.tiles.get(index)
    }

    #[must_use]
    pub fn tiles(&self) -> &[TileDescriptor] {
        &self.tiles
    }

    /// Destination of a walk of `step` tiles from `position`.
    #[must_use]
    pub fn advance(&self, position: usize, step: usize) -> usize {
        (position + step) % self.tiles.len()
    }

    /// Cyclic neighbours `(previous, next)` of `index`.
    #[must_use]
    pub fn neighbours(&self, index: usize) -> (usize, usize) {
        let len = self.tiles.len();
        ((index + len - 1) % len, (index + 1) % len)
    }
}

/// Failure while loading a board from serialized form.
#[derive(Debug, thiserror::Error)]
pub enum BoardLoadError {
    #[error("board JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}
