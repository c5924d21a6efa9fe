//! Run-mode controller: the command/event boundary around the turn engine.
//!
//! The controller is a synchronous state machine. Hosts feed it [`Command`]s
//! and forward the returned [`EngineEvent`]s to whoever renders them. Paced
//! auto-play is a two-message handshake (an `Update` goes out, a `NextTurn`
//! comes back); fast batch runs are advanced by calling
//! [`RunController::run_fast_batch`] until the run ends, which gives the host
//! a yield point between batches. A stop request is therefore honoured at the
//! next batch boundary: a batch that has started always completes.
use serde::{Deserialize, Serialize};

use crate::board::{Board, TileDescriptor};
use crate::config::{ConfigError, SystemConfig};
use crate::engine::{TurnEngine, TurnResult};
use crate::event_log::{LogEntry, Severity};
use crate::progression::{LevelEntry, LevelTable};
use crate::snapshot::Snapshot;
use crate::state::RunMode;

/// How many turns an auto run should execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTarget {
    Turns(u64),
    /// Run until stopped or out of dice.
    Unbounded,
}

impl RunTarget {
    /// A count of 0 means "unbounded".
    #[must_use]
    pub const fn from_count(count: u64) -> Self {
        if count == 0 {
            Self::Unbounded
        } else {
            Self::Turns(count)
        }
    }

    #[must_use]
    pub const fn is_reached(self, completed: u64) -> bool {
        match self {
            Self::Turns(target) => completed >= target,
            Self::Unbounded => false,
        }
    }
}

/// Partial override of the consumable resource and run knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigUpdate {
    pub dice: Option<u64>,
    pub multiplier: Option<u32>,
    pub smart_targeting: Option<bool>,
}

/// Commands accepted by the engine boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    InitGame {
        tiles: Vec<TileDescriptor>,
        levels: Vec<LevelEntry>,
        #[serde(default)]
        config: Option<SystemConfig>,
    },
    ExecTurn,
    StartAutoPlay(RunTarget),
    StartFastSim(RunTarget),
    NextTurn,
    StopAuto,
    GenExtra(usize),
    UpdateConfig(ConfigUpdate),
}

/// Why an auto run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The target turn count was reached.
    Completed,
    /// A `StopAuto` command arrived.
    Cancelled,
    /// The dice balance could not cover another turn.
    ResourceExhausted,
    /// A new run was started over this one.
    Replaced,
    /// The session was re-initialised.
    Reinitialized,
}

/// Snapshot plus the log entries appended since the previous update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    pub snapshot: Snapshot,
    pub new_entries: Vec<LogEntry>,
    /// True when the host should skip move animation.
    pub is_auto: bool,
}

/// Per-batch progress of a fast run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub completed: u64,
    pub target: RunTarget,
    pub update: Update,
}

/// Events leaving the engine boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineEvent {
    Update(Box<Update>),
    Progress(Box<Progress>),
    #[serde(rename_all = "camelCase")]
    AutoStopped {
        /// True only when the run reached its target.
        finished: bool,
        reason: StopReason,
        turns_run: u64,
        turn: u64,
    },
}

impl EngineEvent {
    /// Snapshot carried by the event, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Self::Update(update) => Some(&update.snapshot),
            Self::Progress(progress) => Some(&progress.update.snapshot),
            Self::AutoStopped { .. } => None,
        }
    }

    /// New log entries carried by the event.
    #[must_use]
    pub fn new_entries(&self) -> &[LogEntry] {
        match self {
            Self::Update(update) => &update.new_entries,
            Self::Progress(progress) => &progress.update.new_entries,
            Self::AutoStopped { .. } => &[],
        }
    }
}

/// Status of the run currently being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRun {
    pub mode: RunMode,
    pub target: RunTarget,
    pub completed: u64,
}

/// Single owner of the engine; every mutation goes through [`Self::handle`].
#[derive(Debug, Clone)]
pub struct RunController {
    engine: TurnEngine,
    run: Option<ActiveRun>,
}

impl RunController {
    /// Wrap an engine, turning on log capture so every update can carry the
    /// entries appended since the previous one.
    #[must_use]
    pub fn new(mut engine: TurnEngine) -> Self {
        engine.set_log_capture(true);
        Self { engine, run: None }
    }

    /// Build the engine from raw configuration and wrap it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the board, level table or config is invalid.
    pub fn from_parts(
        tiles: Vec<TileDescriptor>,
        levels: Vec<LevelEntry>,
        config: SystemConfig,
    ) -> Result<Self, ConfigError> {
        let engine = TurnEngine::new(Board::new(tiles)?, LevelTable::new(levels)?, config)?;
        Ok(Self::new(engine))
    }

    #[must_use]
    pub const fn engine(&self) -> &TurnEngine {
        &self.engine
    }

    #[must_use]
    pub const fn active_run(&self) -> Option<ActiveRun> {
        self.run
    }

    #[must_use]
    pub const fn run_mode(&self) -> RunMode {
        match self.run {
            Some(run) => run.mode,
            None => RunMode::Idle,
        }
    }

    /// True while a fast batch run still wants [`Self::run_fast_batch`] calls.
    #[must_use]
    pub const fn is_fast_running(&self) -> bool {
        matches!(self.run_mode(), RunMode::FastBatch)
    }

    /// Current state plus any entries not yet emitted.
    pub fn update(&mut self, is_auto: bool) -> EngineEvent {
        EngineEvent::Update(Box::new(self.build_update(is_auto)))
    }

    /// Apply one command and return the events it produced, in order.
    pub fn handle(&mut self, command: Command) -> Vec<EngineEvent> {
        match command {
            Command::InitGame {
                tiles,
                levels,
                config,
            } => self.init_game(tiles, levels, config),
            Command::ExecTurn => {
                let result = self.engine.execute_turn();
                log_refusal(&result);
                if result.is_refused() && self.run.is_some() {
                    return self.stop_run(false, StopReason::ResourceExhausted, false);
                }
                vec![self.update(false)]
            }
            Command::StartAutoPlay(target) => {
                let mut events = self.start_run(RunMode::PacedAuto, target);
                events.extend(self.paced_step());
                events
            }
            Command::StartFastSim(target) => {
                let mut events = self.start_run(RunMode::FastBatch, target);
                events.push(self.update(true));
                events
            }
            Command::NextTurn => {
                if self.run_mode() == RunMode::PacedAuto {
                    self.paced_step()
                } else {
                    Vec::new()
                }
            }
            Command::StopAuto => self.stop_run(false, StopReason::Cancelled, false),
            Command::GenExtra(count) => {
                self.engine.generate_collectibles(count);
                vec![self.update(true)]
            }
            Command::UpdateConfig(update) => {
                self.apply_config_update(update);
                vec![self.update(false)]
            }
        }
    }

    /// Run one fast batch of up to `batch_size` turns. Emits one `Progress`
    /// event, followed by `AutoStopped` and an idle `Update` when the run
    /// ends. Returns nothing when no fast run is active.
    pub fn run_fast_batch(&mut self) -> Vec<EngineEvent> {
        let Some(mut run) = self.run.filter(|run| run.mode == RunMode::FastBatch) else {
            return Vec::new();
        };
        let batch_size = self.engine.config().batch_size;
        let mut exhausted = false;
        for _ in 0..batch_size {
            if run.target.is_reached(run.completed) {
                break;
            }
            if self.engine.execute_turn().is_refused() {
                exhausted = true;
                break;
            }
            run.completed += 1;
        }
        self.run = Some(run);
        log::debug!("fast batch done: {} turns completed", run.completed);

        let mut events = vec![EngineEvent::Progress(Box::new(Progress {
            completed: run.completed,
            target: run.target,
            update: self.build_update(true),
        }))];
        if exhausted {
            events.extend(self.stop_run(false, StopReason::ResourceExhausted, true));
        } else if run.target.is_reached(run.completed) {
            events.extend(self.stop_run(true, StopReason::Completed, true));
        }
        events
    }

    fn init_game(
        &mut self,
        tiles: Vec<TileDescriptor>,
        levels: Vec<LevelEntry>,
        config: Option<SystemConfig>,
    ) -> Vec<EngineEvent> {
        let built = Board::new(tiles)
            .and_then(|board| LevelTable::new(levels).map(|levels| (board, levels)));
        let mut events = Vec::new();
        match built {
            Ok((board, levels)) => {
                let config = config.unwrap_or_default();
                let (tile_count, level_count) = (board.len(), levels.entries().len());
                if let Err(err) = config.validate() {
                    return self.reject_config(&err);
                }
                events.extend(self.finish_run(false, StopReason::Reinitialized));
                if let Err(err) = self.engine.reinit(board, levels, config) {
                    return self.reject_config(&err);
                }
                self.engine.record_system(
                    Severity::Info,
                    format!("Session initialised: {tile_count} tiles, {level_count} levels"),
                );
            }
            Err(err) => return self.reject_config(&err),
        }
        events.push(self.update(false));
        events
    }

    fn reject_config(&mut self, err: &ConfigError) -> Vec<EngineEvent> {
        log::warn!("configuration rejected: {err}");
        self.engine
            .record_system(Severity::Critical, format!("Configuration rejected: {err}"));
        vec![self.update(false)]
    }

    fn apply_config_update(&mut self, update: ConfigUpdate) {
        if let Some(dice) = update.dice {
            self.engine.set_dice(dice);
        }
        if let Some(multiplier) = update.multiplier
            && let Err(err) = self.engine.set_multiplier(multiplier)
        {
            log::warn!("config update rejected: {err}");
            self.engine
                .record_system(Severity::Warning, format!("Config update rejected: {err}"));
        }
        if let Some(enabled) = update.smart_targeting {
            self.engine.set_smart_targeting(enabled);
        }
    }

    /// Replace any active run with a fresh one.
    fn start_run(&mut self, mode: RunMode, target: RunTarget) -> Vec<EngineEvent> {
        let events = self.finish_run(false, StopReason::Replaced).into_iter().collect();
        self.run = Some(ActiveRun {
            mode,
            target,
            completed: 0,
        });
        self.engine.set_run_mode(mode);
        events
    }

    fn paced_step(&mut self) -> Vec<EngineEvent> {
        let Some(mut run) = self.run else {
            return Vec::new();
        };
        if run.target.is_reached(run.completed) {
            return self.stop_run(true, StopReason::Completed, true);
        }
        let result = self.engine.execute_turn();
        log_refusal(&result);
        if result.is_refused() {
            return self.stop_run(false, StopReason::ResourceExhausted, true);
        }
        run.completed += 1;
        self.run = Some(run);
        vec![self.update(true)]
    }

    /// End the active run, if any, then follow the stop notice with a
    /// snapshot that already shows the idle mode.
    fn stop_run(&mut self, finished: bool, reason: StopReason, is_auto: bool) -> Vec<EngineEvent> {
        match self.finish_run(finished, reason) {
            Some(stopped) => vec![stopped, self.update(is_auto)],
            None => Vec::new(),
        }
    }

    /// End the active run, if any, and report how it ended.
    fn finish_run(&mut self, finished: bool, reason: StopReason) -> Option<EngineEvent> {
        let run = self.run.take()?;
        self.engine.set_run_mode(RunMode::Idle);
        log::debug!(
            "{:?} run ended after {} turns ({reason:?})",
            run.mode,
            run.completed
        );
        Some(EngineEvent::AutoStopped {
            finished,
            reason,
            turns_run: run.completed,
            turn: self.engine.state().turn_count,
        })
    }

    fn build_update(&mut self, is_auto: bool) -> Update {
        Update {
            snapshot: self.engine.snapshot(),
            new_entries: self.engine.drain_new_entries(),
            is_auto,
        }
    }
}

fn log_refusal(result: &TurnResult) {
    if let TurnResult::Refused { dice_balance, cost } = result {
        log::debug!("turn refused: {dice_balance} dice left, {cost} needed");
    }
}
