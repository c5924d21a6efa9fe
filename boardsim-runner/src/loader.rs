//! Tabular configuration loading.
//!
//! Boards and level tables come from CSV (header row, `#` comments) or JSON
//! arrays. The loader is forgiving about cell contents: malformed numbers fall
//! back to defaults with a logged warning. Structural checks (contiguous
//! indices, level order) are left to the engine.
use anyhow::{Context, Result, bail};
use boardsim_game::{LevelEntry, SystemConfig, TileDescriptor, TileKind};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::presets;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Csv,
    Json,
}

fn detect_format(path: &Path) -> Result<Format> {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("csv") => Ok(Format::Csv),
        Some("json") => Ok(Format::Json),
        _ => bail!("unsupported file type for {} (expected .csv or .json)", path.display()),
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Load tile rows from `path`, or the built-in board when absent.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid CSV/JSON.
pub fn load_tiles(path: Option<&Path>) -> Result<Vec<TileDescriptor>> {
    let Some(path) = path else {
        return Ok(presets::default_board());
    };
    let text = read(path)?;
    let mut tiles = match detect_format(path)? {
        Format::Json => serde_json::from_str::<Vec<TileDescriptor>>(&text)
            .with_context(|| format!("invalid board JSON in {}", path.display()))?,
        Format::Csv => parse_tiles_csv(&text)?,
    };
    tiles.sort_by_key(|tile| tile.index);
    log::info!("loaded {} tiles from {}", tiles.len(), path.display());
    Ok(tiles)
}

/// Load level rows from `path`, or the built-in ladder when absent.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid CSV/JSON.
pub fn load_levels(path: Option<&Path>) -> Result<Vec<LevelEntry>> {
    let Some(path) = path else {
        return Ok(presets::default_levels());
    };
    let text = read(path)?;
    let mut levels = match detect_format(path)? {
        Format::Json => serde_json::from_str::<Vec<LevelEntry>>(&text)
            .with_context(|| format!("invalid level JSON in {}", path.display()))?,
        Format::Csv => parse_levels_csv(&text)?,
    };
    levels.sort_by_key(|entry| entry.level);
    log::info!("loaded {} levels from {}", levels.len(), path.display());
    Ok(levels)
}

/// Load a JSON session config, or defaults when absent.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<SystemConfig> {
    let Some(path) = path else {
        return Ok(SystemConfig::default());
    };
    let text = read(path)?;
    SystemConfig::from_json(&text).with_context(|| format!("invalid config JSON in {}", path.display()))
}

/// Parse tile rows: `index,kind,name,value,probability,weight`.
///
/// # Errors
///
/// Returns an error when the header row is missing or lacks a `kind` column.
pub fn parse_tiles_csv(text: &str) -> Result<Vec<TileDescriptor>> {
    let table = CsvTable::parse(text)?;
    let Some(kind_col) = table.column(&["kind", "type"]) else {
        bail!("tile CSV needs a `kind` column");
    };
    let index_col = table.column(&["index", "id"]);
    let name_col = table.column(&["name", "displayname"]);
    let value_col = table.column(&["value", "price"]);
    let probability_col = table.column(&["probability", "chance"]);
    let weight_col = table.column(&["weight"]);

    let tiles = table
        .rows
        .iter()
        .enumerate()
        .map(|(position, row)| {
            let index = row.number(index_col, "index", position);
            let tag = row.cell(Some(kind_col)).unwrap_or_default();
            let tag = if tag.is_empty() {
                log::warn!("line {}: empty tile kind, using PLAIN_CELL", row.line);
                "PLAIN_CELL"
            } else {
                tag
            };
            let value = row.number(value_col, "value", 0_i64);
            let probability = row.number(probability_col, "probability", 0.0_f64);
            let name = row
                .cell(name_col)
                .filter(|name| !name.is_empty())
                .map_or_else(|| format!("Tile {index}"), str::to_string);
            let mut tile = TileDescriptor::new(index, TileKind::from_tag(tag, value, probability), name);
            tile.weight = row.optional_number(weight_col, "weight");
            tile
        })
        .collect();
    Ok(tiles)
}

/// Parse level rows: `level,required_points,reward_amount,description`.
///
/// # Errors
///
/// Returns an error when the header row is missing.
pub fn parse_levels_csv(text: &str) -> Result<Vec<LevelEntry>> {
    let table = CsvTable::parse(text)?;
    let level_col = table.column(&["level", "lv"]);
    let required_col = table.column(&["requiredpoints", "required", "points"]);
    let reward_col = table.column(&["rewardamount", "reward", "gold"]);
    let description_col = table.column(&["description", "desc"]);

    let levels = table
        .rows
        .iter()
        .enumerate()
        .map(|(position, row)| {
            let fallback_level = u32::try_from(position + 1).unwrap_or(u32::MAX);
            LevelEntry {
                level: row.number(level_col, "level", fallback_level),
                required_points: row.number(required_col, "required_points", 1_u64),
                reward_amount: row.number(reward_col, "reward_amount", 0_i64),
                description: row.cell(description_col).unwrap_or_default().to_string(),
            }
        })
        .collect();
    Ok(levels)
}

#[derive(Debug)]
struct CsvTable {
    headers: Vec<String>,
    rows: Vec<CsvRow>,
}

#[derive(Debug)]
struct CsvRow {
    line: usize,
    cells: Vec<String>,
}

impl CsvTable {
    fn parse(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));
        let Some((_, header)) = lines.next() else {
            bail!("CSV has no header row");
        };
        let headers = split_row(header)
            .into_iter()
            .map(|name| normalize_header(&name))
            .collect();
        let rows = lines
            .map(|(line, text)| CsvRow {
                line,
                cells: split_row(text),
            })
            .collect();
        Ok(Self { headers, rows })
    }

    fn column(&self, names: &[&str]) -> Option<usize> {
        names
            .iter()
            .find_map(|name| self.headers.iter().position(|header| header == name))
    }
}

impl CsvRow {
    fn cell(&self, column: Option<usize>) -> Option<&str> {
        column
            .and_then(|col| self.cells.get(col))
            .map(String::as_str)
    }

    /// Parse a numeric cell, falling back to `default` when missing or malformed.
    fn number<T: FromStr + std::fmt::Display + Copy>(
        &self,
        column: Option<usize>,
        label: &str,
        default: T,
    ) -> T {
        match self.cell(column).filter(|raw| !raw.is_empty()) {
            None => default,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!(
                    "line {}: malformed {label} `{raw}`, using {default}",
                    self.line
                );
                default
            }),
        }
    }

    fn optional_number<T: FromStr>(&self, column: Option<usize>, label: &str) -> Option<T> {
        let raw = self.cell(column).filter(|raw| !raw.is_empty())?;
        let parsed = raw.parse().ok();
        if parsed.is_none() {
            log::warn!("line {}: malformed {label} `{raw}`, ignoring", self.line);
        }
        parsed
    }
}

fn normalize_header(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|ch| !matches!(ch, '_' | ' ' | '-'))
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// Split one CSV line, keeping empty cells and honouring double quotes.
pub fn split_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => cells.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(ch),
        }
    }
    cells.push(current.trim().to_string());
    cells
}
