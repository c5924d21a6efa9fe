//! Drives an engine worker through one run and captures everything it emits.
use anyhow::{Context, Result, anyhow};
use boardsim_game::{
    Command, EngineEvent, EngineHandle, LogEntry, RunController, RunTarget, Snapshot, StopReason,
    spawn_worker,
};
use colored::Colorize;
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;

/// How the run is paced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveMode {
    /// One `ExecTurn` per requested turn.
    Single,
    /// Auto-play, acknowledging every update with `NextTurn`.
    Paced,
    /// Batched fast simulation.
    Fast,
}

#[derive(Debug, Clone, Copy)]
pub struct RunPlan {
    pub mode: DriveMode,
    /// 0 means unbounded for paced and fast runs.
    pub turns: u64,
    pub collectibles: usize,
    pub verbose: bool,
}

/// How an auto run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopInfo {
    pub finished: bool,
    pub reason: StopReason,
    pub turns_run: u64,
}

/// Everything captured while driving.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub snapshot: Snapshot,
    /// Every log entry emitted during the run, oldest first.
    pub history: Vec<LogEntry>,
    pub stop: Option<StopInfo>,
    pub progress_events: u64,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct Capture {
    snapshot: Option<Snapshot>,
    history: Vec<LogEntry>,
    stop: Option<StopInfo>,
    progress_events: u64,
}

impl Capture {
    fn absorb(&mut self, event: &EngineEvent) {
        self.history.extend_from_slice(event.new_entries());
        if let Some(snapshot) = event.snapshot() {
            self.snapshot = Some(snapshot.clone());
        }
        match event {
            EngineEvent::Progress(_) => self.progress_events += 1,
            EngineEvent::AutoStopped {
                finished,
                reason,
                turns_run,
                ..
            } => {
                self.stop = Some(StopInfo {
                    finished: *finished,
                    reason: *reason,
                    turns_run: *turns_run,
                });
            }
            EngineEvent::Update(_) => {}
        }
    }
}

/// Spawn a worker for `controller` and drive it according to `plan`.
///
/// # Errors
///
/// Returns an error if the worker shuts down before the run completes.
pub async fn drive(controller: RunController, plan: RunPlan) -> Result<RunOutcome> {
    let start = Instant::now();
    let (handle, mut events) = spawn_worker(controller);
    let mut capture = Capture::default();

    if plan.collectibles > 0 {
        handle.send(Command::GenExtra(plan.collectibles))?;
        next_event(&mut events, &mut capture).await?;
    }

    match plan.mode {
        DriveMode::Single => drive_single(&handle, &mut events, &mut capture, plan).await?,
        DriveMode::Paced => drive_paced(&handle, &mut events, &mut capture, plan).await?,
        DriveMode::Fast => drive_fast(&handle, &mut events, &mut capture, plan).await?,
    }

    let mut controller = handle.shutdown().await.context("engine worker failed")?;
    // Picks up entries staged after the last emitted event.
    capture.absorb(&controller.update(false));

    let snapshot = capture
        .snapshot
        .take()
        .ok_or_else(|| anyhow!("engine produced no snapshot"))?;
    Ok(RunOutcome {
        snapshot,
        history: capture.history,
        stop: capture.stop,
        progress_events: capture.progress_events,
        elapsed: start.elapsed(),
    })
}

async fn next_event(
    events: &mut UnboundedReceiver<EngineEvent>,
    capture: &mut Capture,
) -> Result<EngineEvent> {
    let event = events
        .recv()
        .await
        .ok_or_else(|| anyhow!("engine worker closed its event channel"))?;
    capture.absorb(&event);
    Ok(event)
}

async fn drive_single(
    handle: &EngineHandle,
    events: &mut UnboundedReceiver<EngineEvent>,
    capture: &mut Capture,
    plan: RunPlan,
) -> Result<()> {
    for _ in 0..plan.turns.max(1) {
        handle.send(Command::ExecTurn)?;
        let event = next_event(events, capture).await?;
        if plan.verbose {
            print_turn(&event);
        }
    }
    Ok(())
}

async fn drive_paced(
    handle: &EngineHandle,
    events: &mut UnboundedReceiver<EngineEvent>,
    capture: &mut Capture,
    plan: RunPlan,
) -> Result<()> {
    handle.send(Command::StartAutoPlay(RunTarget::from_count(plan.turns)))?;
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);
    let mut stop_sent = false;
    loop {
        tokio::select! {
            event = next_event(events, capture) => {
                let event = event?;
                if matches!(event, EngineEvent::AutoStopped { .. }) {
                    break;
                }
                if plan.verbose {
                    print_turn(&event);
                }
                handle.send(Command::NextTurn)?;
            }
            _ = &mut interrupt, if !stop_sent => {
                log::info!("interrupt received, stopping paced run");
                handle.send(Command::StopAuto)?;
                stop_sent = true;
            }
        }
    }
    Ok(())
}

async fn drive_fast(
    handle: &EngineHandle,
    events: &mut UnboundedReceiver<EngineEvent>,
    capture: &mut Capture,
    plan: RunPlan,
) -> Result<()> {
    handle.send(Command::StartFastSim(RunTarget::from_count(plan.turns)))?;
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);
    let mut stop_sent = false;
    loop {
        tokio::select! {
            event = next_event(events, capture) => {
                match event? {
                    EngineEvent::AutoStopped { .. } => break,
                    EngineEvent::Progress(progress) => {
                        log::info!(
                            "fast run: {} turns, money {}",
                            progress.completed,
                            progress.update.snapshot.money
                        );
                        if plan.verbose {
                            println!(
                                "{} {} turns",
                                "⏩".cyan(),
                                progress.completed.to_string().bold()
                            );
                        }
                    }
                    EngineEvent::Update(_) => {}
                }
            }
            _ = &mut interrupt, if !stop_sent => {
                log::info!("interrupt received, stopping fast run at the next batch boundary");
                handle.send(Command::StopAuto)?;
                stop_sent = true;
            }
        }
    }
    Ok(())
}

fn print_turn(event: &EngineEvent) {
    let Some(snapshot) = event.snapshot() else {
        return;
    };
    println!(
        "🎲 turn {:>5}  step {:>2}  pos {:>3}  money {}",
        snapshot.turn,
        snapshot.last_step,
        snapshot.position,
        snapshot.money.to_string().green()
    );
    for entry in event.new_entries() {
        println!("     {} {}", entry.event.to_string().yellow(), entry.detail);
    }
}
