//! Turn engine: advances the token, detects pass-start, resolves tile effects
//! and runs the collection check, appending every observable change to the
//! bounded event log.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Board, TileKind};
use crate::config::{ConfigError, SystemConfig};
use crate::dice::{self, DestinationWeights, StepPolicy, StepTrace};
use crate::event_log::{EntryDraft, EventKind, LogEntry, Severity};
use crate::progression::{LevelTable, LevelUp};
use crate::rng::RngBundle;
use crate::snapshot::{ProgressionView, Snapshot};
use crate::state::{EngineState, RunMode};

/// Summary of one fully resolved turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReport {
    pub turn: u64,
    pub step: u8,
    pub from: usize,
    pub to: usize,
    pub passed_start: bool,
    /// Net money change across salary, tile effect and level rewards.
    pub money_delta: i64,
    pub collected: bool,
    #[serde(default)]
    pub level_ups: Vec<LevelUp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<StepTrace>,
}

/// Outcome of a turn request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[must_use]
pub enum TurnResult {
    /// Not enough dice for the multiplier cost; nothing but the log changed.
    Refused { dice_balance: u64, cost: u32 },
    Completed(TurnReport),
}

impl TurnResult {
    #[must_use]
    pub const fn is_refused(&self) -> bool {
        matches!(self, Self::Refused { .. })
    }

    #[must_use]
    pub const fn report(&self) -> Option<&TurnReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Refused { .. } => None,
        }
    }
}

/// Owns the board, the level table, the RNG streams and the mutable session state.
#[derive(Debug, Clone)]
pub struct TurnEngine {
    board: Board,
    levels: LevelTable,
    config: SystemConfig,
    rng: RngBundle,
    state: EngineState,
}

impl TurnEngine {
    /// Build an engine for a validated board and level table.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the session configuration is invalid.
    pub fn new(board: Board, levels: LevelTable, config: SystemConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = RngBundle::from_optional_seed(config.seed);
        let state = EngineState::new(board.len(), &config);
        log::debug!(
            "engine initialised: {} tiles, {} levels, seed {}",
            board.len(),
            levels.entries().len(),
            rng.seed()
        );
        Ok(Self {
            board,
            levels,
            config,
            rng,
            state,
        })
    }

    /// Replace board, levels and configuration, resetting the session. The
    /// log keeps its id sequence so consumers never see an id reused.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the new configuration is invalid; the
    /// current session is left untouched in that case.
    pub fn reinit(
        &mut self,
        board: Board,
        levels: LevelTable,
        config: SystemConfig,
    ) -> Result<(), ConfigError> {
        config.validate()?;
        self.rng = RngBundle::from_optional_seed(config.seed);
        self.state.reset(board.len(), &config);
        self.board = board;
        self.levels = levels;
        self.config = config;
        log::debug!("engine re-initialised with seed {}", self.rng.seed());
        Ok(())
    }

    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub const fn levels(&self) -> &LevelTable {
        &self.levels
    }

    #[must_use]
    pub const fn config(&self) -> &SystemConfig {
        &self.config
    }

    #[must_use]
    pub const fn state(&self) -> &EngineState {
        &self.state
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    /// Seed actually in use, including one drawn from entropy.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub const fn set_run_mode(&mut self, mode: RunMode) {
        self.state.run_mode = mode;
    }

    /// Enable or disable staging of log entries for emission.
    pub fn set_log_capture(&mut self, enabled: bool) {
        self.state.log.set_capture(enabled);
    }

    /// Entries appended since the previous drain (capture must be enabled).
    pub fn drain_new_entries(&mut self) -> Vec<LogEntry> {
        self.state.log.drain_emitted()
    }

    /// Override the dice balance.
    pub fn set_dice(&mut self, dice: u64) {
        self.state.dice_balance = dice;
        self.record(
            EventKind::System,
            Severity::Info,
            format!("Dice balance set to {dice}"),
        );
    }

    /// Override the multiplier.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ZeroValue` for a zero multiplier.
    pub fn set_multiplier(&mut self, multiplier: u32) -> Result<(), ConfigError> {
        if multiplier == 0 {
            return Err(ConfigError::ZeroValue {
                field: "multiplier",
            });
        }
        self.state.multiplier = multiplier;
        self.record(
            EventKind::System,
            Severity::Info,
            format!("Multiplier set to x{multiplier}"),
        );
        Ok(())
    }

    pub fn set_smart_targeting(&mut self, enabled: bool) {
        if self.config.smart_targeting == enabled {
            return;
        }
        self.config.smart_targeting = enabled;
        let label = if enabled { "enabled" } else { "disabled" };
        self.record(
            EventKind::System,
            Severity::Info,
            format!("Smart targeting {label}"),
        );
    }

    /// Append a SYSTEM entry on behalf of the host.
    pub fn record_system(&mut self, severity: Severity, detail: impl Into<String>) {
        self.record(EventKind::System, severity, detail.into());
    }

    /// Put a collectible on `index` if the adjacency rule allows it.
    pub fn place_collectible(&mut self, index: usize) -> bool {
        self.state.collectibles.try_place(index, self.board.len())
    }

    /// Run one turn with a generated step.
    pub fn execute_turn(&mut self) -> TurnResult {
        if let Some(refusal) = self.charge_turn() {
            return refusal;
        }
        let policy = StepPolicy::from_smart_targeting(self.config.smart_targeting);
        let weights = self.destination_weights();
        let decision = dice::next_step(
            policy,
            &self.board,
            &self.state.collectibles,
            self.state.position,
            weights,
            self.rng.dice(),
        );
        if let Some(trace) = decision.trace.as_ref() {
            let name = self
                .board
                .tile(decision.target_index)
                .map_or("?", |tile| tile.name.as_str());
            let detail = format!(
                "Smart targeting chose tile {} ({name}) with weight {}/{}, step {}",
                decision.target_index, decision.target_weight, trace.total_weight, decision.step
            );
            self.record(EventKind::System, Severity::Info, detail);
        }
        TurnResult::Completed(self.resolve_move(decision.step, decision.trace))
    }

    /// Run one turn with an externally supplied step. A step of 0 never
    /// counts as passing start.
    pub fn execute_scripted_turn(&mut self, step: u8) -> TurnResult {
        if let Some(refusal) = self.charge_turn() {
            return refusal;
        }
        TurnResult::Completed(self.resolve_move(step, None))
    }

    /// Clear collectibles and greedily place up to `count` new ones.
    /// Returns the number actually placed.
    pub fn generate_collectibles(&mut self, count: usize) -> usize {
        let placed =
            self.state
                .collectibles
                .generate(self.board.len(), count, self.rng.placement());
        if placed < count {
            log::warn!("placed {placed} of {count} requested collectibles; board is full");
        }
        self.record(
            EventKind::System,
            Severity::Info,
            format!("Placed {placed} collectibles (requested {count}, no two adjacent)"),
        );
        placed
    }

    /// Collect the pickup at `position`, if any, and run the level-up loop.
    /// Returns the level transitions, or `None` when nothing was collected.
    pub fn check_collection(&mut self, position: usize) -> Option<Vec<LevelUp>> {
        if !self.state.collectibles.take(position) {
            return None;
        }
        let points =
            u64::from(self.config.pickup_points).saturating_mul(u64::from(self.state.multiplier));
        let level_ups = self.state.progression.add_points(points, &self.levels);
        let progression = self.state.progression;
        self.record(
            EventKind::Collect,
            Severity::Info,
            format!(
                "Collected pickup: +{points} points ({} total, {} pickups)",
                progression.points, progression.total_collected
            ),
        );
        for level_up in &level_ups {
            let reward = self.scale(level_up.reward_amount);
            self.credit(
                EventKind::LevelUp,
                reward,
                format!(
                    "Level {} -> {}: {}",
                    level_up.from_level, level_up.to_level, level_up.description
                ),
            );
        }
        self.respawn_item();
        Some(level_ups)
    }

    /// Place one collectible uniformly among the free, non-adjacent tiles.
    pub fn respawn_item(&mut self) -> Option<usize> {
        let spot = self
            .state
            .collectibles
            .respawn(self.board.len(), self.rng.placement());
        if spot.is_none() {
            log::warn!("collectible respawn skipped: no free non-adjacent tile");
            self.record(
                EventKind::System,
                Severity::Warning,
                "No free tile for a collectible respawn".to_string(),
            );
        }
        spot
    }

    /// Point-in-time copy of everything a consumer renders.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let progression = self.state.progression;
        Snapshot {
            turn: self.state.turn_count,
            position: self.state.position,
            money: self.state.money,
            dice: self.state.dice_balance,
            multiplier: self.state.multiplier,
            tile_visit_counts: self.state.tile_visit_counts.clone(),
            collectibles: self.state.collectibles.to_vec(),
            progression: ProgressionView {
                level: progression.level,
                points: progression.points,
                total_collected: progression.total_collected,
                points_to_next: progression.points_to_next(&self.levels),
                is_max_level: progression.is_max_level(&self.levels),
            },
            log: self.state.log.to_vec(),
            last_step: self.state.last_step,
            run_mode: self.state.run_mode,
        }
    }

    const fn destination_weights(&self) -> DestinationWeights {
        DestinationWeights {
            default_weight: self.config.default_tile_weight,
            collectible_weight: self.config.collectible_weight,
        }
    }

    /// Gate on dice, then pay for and open a new turn.
    fn charge_turn(&mut self) -> Option<TurnResult> {
        let cost = self.state.multiplier;
        let balance = self.state.dice_balance;
        if balance < u64::from(cost) {
            self.record(
                EventKind::InsufficientResource,
                Severity::Warning,
                format!("Not enough dice: need {cost}, have {balance}"),
            );
            return Some(TurnResult::Refused {
                dice_balance: balance,
                cost,
            });
        }
        self.state.dice_balance = balance - u64::from(cost);
        self.state.turn_count = self.state.turn_count.saturating_add(1);
        None
    }

    fn resolve_move(&mut self, step: u8, trace: Option<StepTrace>) -> TurnReport {
        let from = self.state.position;
        let to = self.board.advance(from, usize::from(step));
        let passed_start = to < from && from + usize::from(step) >= self.board.len();
        let money_before = self.state.money;

        self.state.position = to;
        self.state.last_step = step;
        if let Some(visits) = self.state.tile_visit_counts.get_mut(to) {
            *visits = visits.saturating_add(1);
        }
        log::debug!(
            "turn {}: {from} -> {to} (step {step})",
            self.state.turn_count
        );

        if passed_start {
            let salary = self.scale(self.config.salary);
            self.credit(
                EventKind::PassGo,
                salary,
                format!("Passed start, salary +{salary}"),
            );
        }
        self.resolve_tile(to);
        let level_ups = self.check_collection(to);

        TurnReport {
            turn: self.state.turn_count,
            step,
            from,
            to,
            passed_start,
            money_delta: self.state.money.saturating_sub(money_before),
            collected: level_ups.is_some(),
            level_ups: level_ups.unwrap_or_default(),
            trace,
        }
    }

    fn resolve_tile(&mut self, index: usize) {
        let Some(tile) = self.board.tile(index) else {
            return;
        };
        let name = tile.name.clone();
        match tile.kind.clone() {
            TileKind::PlainCell { value } => {
                let amount = self.scale(value);
                if amount > 0 {
                    self.credit(EventKind::Income, amount, format!("Income +{amount} ({name})"));
                } else if amount < 0 {
                    self.credit(
                        EventKind::Expense,
                        amount,
                        format!("Paid {} ({name})", amount.unsigned_abs()),
                    );
                }
            }
            TileKind::SmallBonus { value } => {
                let amount = self.scale(value);
                self.credit(EventKind::SmallBonus, amount, format!("Small bonus +{amount} ({name})"));
            }
            TileKind::BigBonus { value } => {
                let amount = self.scale(value);
                self.credit(EventKind::BigBonus, amount, format!("Big bonus +{amount} ({name})"));
            }
            TileKind::BonusChance { probability, value } => {
                let draw: f64 = self.rng.events().r#gen();
                if draw <= probability {
                    let amount = self.scale(value);
                    self.credit(
                        EventKind::BonusSuccess,
                        amount,
                        format!("Bonus granted +{amount} ({name})"),
                    );
                } else {
                    self.record(
                        EventKind::BonusFail,
                        Severity::Info,
                        format!(
                            "Bonus not granted at {name} (chance {:.1}%)",
                            probability * 100.0
                        ),
                    );
                }
            }
            TileKind::ToJail => {
                self.record(EventKind::ToJail, Severity::Info, format!("Sent to jail ({name})"));
            }
            TileKind::Start => {
                self.record(EventKind::LandStart, Severity::Info, format!("Landed on {name}"));
            }
            TileKind::Jail | TileKind::Parking => {
                self.record(EventKind::Visit, Severity::Info, format!("Visited {name}"));
            }
            TileKind::Other { label } => {
                self.record(EventKind::Visit, Severity::Info, format!("Visited {name} ({label})"));
            }
        }
    }

    fn scale(&self, value: i64) -> i64 {
        value.saturating_mul(i64::from(self.state.multiplier))
    }

    fn credit(&mut self, event: EventKind, amount: i64, detail: String) {
        self.state.money = self.state.money.saturating_add(amount);
        self.push(event, Severity::Info, amount, detail);
    }

    fn record(&mut self, event: EventKind, severity: Severity, detail: String) {
        self.push(event, severity, 0, detail);
    }

    fn push(&mut self, event: EventKind, severity: Severity, delta_money: i64, detail: String) {
        self.state.log.push(EntryDraft {
            turn: self.state.turn_count,
            position: self.state.position,
            event,
            severity,
            delta_money,
            balance_after: self.state.money,
            detail,
        });
    }
}
