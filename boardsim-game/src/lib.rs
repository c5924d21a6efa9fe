//! Boardsim Game Engine
//!
//! Platform-agnostic core of the board-walk economy simulator: a token walks a
//! circular board, tile effects move a signed balance, a collection meter
//! levels up with carry-over, and every change lands in a bounded event log.
//! The engine has no rendering dependency; hosts talk to it through the
//! command/event boundary in [`controller`] (or [`worker`] with the `async`
//! feature).

pub mod board;
pub mod collectibles;
pub mod config;
pub mod constants;
pub mod controller;
pub mod dice;
pub mod engine;
pub mod event_log;
pub mod export;
pub mod progression;
pub mod rng;
pub mod snapshot;
pub mod state;
#[cfg(feature = "async")]
pub mod worker;

// Re-export commonly used types
pub use board::{Board, BoardLoadError, TileDescriptor, TileKind};
pub use collectibles::CollectibleSet;
pub use config::{ConfigError, SystemConfig};
pub use controller::{
    ActiveRun, Command, ConfigUpdate, EngineEvent, Progress, RunController, RunTarget, StopReason,
    Update,
};
pub use dice::{DestinationWeights, StepCandidate, StepDecision, StepPolicy, StepTrace};
pub use engine::{TurnEngine, TurnReport, TurnResult};
pub use event_log::{EntryDraft, EventKind, EventLog, LogCursor, LogEntry, Severity};
pub use export::{CSV_HEADER, ExportRecord, export_records, render_csv};
pub use progression::{LevelEntry, LevelTable, LevelTableLoadError, LevelUp, Progression};
pub use rng::RngBundle;
pub use snapshot::{ProgressionView, Snapshot};
pub use state::{EngineState, RunMode};
#[cfg(feature = "async")]
pub use worker::{EngineHandle, WorkerClosed, spawn_worker};
