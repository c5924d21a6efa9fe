//! Async host for the run controller.
//!
//! The worker task is the single owner of the engine. Commands arrive on an
//! unbounded mailbox and events leave on an unbounded channel, which is the
//! only output. While a fast run is active the loop drains pending commands
//! without blocking, runs one batch, then yields to the scheduler.
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};
use tokio::task::JoinHandle;

use crate::controller::{Command, EngineEvent, RunController};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("engine worker has shut down")]
pub struct WorkerClosed;

/// Sending side of the engine mailbox plus the worker task.
#[derive(Debug)]
pub struct EngineHandle {
    commands: UnboundedSender<Command>,
    task: JoinHandle<RunController>,
}

impl EngineHandle {
    /// Post a command to the worker.
    ///
    /// # Errors
    ///
    /// Returns `WorkerClosed` once the worker has stopped.
    pub fn send(&self, command: Command) -> Result<(), WorkerClosed> {
        self.commands.send(command).map_err(|_| WorkerClosed)
    }

    /// Close the mailbox and wait for the worker to hand the controller back.
    ///
    /// # Errors
    ///
    /// Returns `WorkerClosed` if the worker task panicked or was aborted.
    pub async fn shutdown(self) -> Result<RunController, WorkerClosed> {
        drop(self.commands);
        self.task.await.map_err(|_| WorkerClosed)
    }
}

/// Spawn the worker task on the current tokio runtime.
#[must_use]
pub fn spawn_worker(controller: RunController) -> (EngineHandle, UnboundedReceiver<EngineEvent>) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_worker(controller, command_rx, event_tx));
    (
        EngineHandle {
            commands: command_tx,
            task,
        },
        event_rx,
    )
}

async fn run_worker(
    mut controller: RunController,
    mut commands: UnboundedReceiver<Command>,
    events: UnboundedSender<EngineEvent>,
) -> RunController {
    loop {
        if !controller.is_fast_running() {
            let Some(command) = commands.recv().await else {
                break;
            };
            if !emit(&events, controller.handle(command)) {
                break;
            }
            continue;
        }

        loop {
            match commands.try_recv() {
                Ok(command) => {
                    if !emit(&events, controller.handle(command)) {
                        return controller;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return controller,
            }
        }
        if controller.is_fast_running() {
            if !emit(&events, controller.run_fast_batch()) {
                break;
            }
            tokio::task::yield_now().await;
        }
    }
    log::debug!("engine worker stopped");
    controller
}

/// Forward events; false once the receiver is gone.
fn emit(events: &UnboundedSender<EngineEvent>, batch: Vec<EngineEvent>) -> bool {
    batch.into_iter().all(|event| events.send(event).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{TileDescriptor, TileKind};
    use crate::config::SystemConfig;
    use crate::controller::{RunTarget, StopReason};

    fn controller(batch_size: u32) -> RunController {
        let tiles = (0..52)
            .map(|index| TileDescriptor::new(index, TileKind::Parking, "Lot"))
            .collect();
        let config = SystemConfig {
            batch_size,
            ..SystemConfig::default().with_seed(17)
        };
        RunController::from_parts(tiles, Vec::new(), config).unwrap()
    }

    async fn wait_for_stop(events: &mut UnboundedReceiver<EngineEvent>) -> (bool, StopReason, u64) {
        while let Some(event) = events.recv().await {
            if let EngineEvent::AutoStopped {
                finished,
                reason,
                turn,
                ..
            } = event
            {
                return (finished, reason, turn);
            }
        }
        panic!("worker closed without stopping the run");
    }

    #[tokio::test]
    async fn stop_right_after_fast_start_interrupts_the_run() {
        let (handle, mut events) = spawn_worker(controller(100));
        handle
            .send(Command::StartFastSim(RunTarget::Turns(1_000)))
            .unwrap();
        handle.send(Command::StopAuto).unwrap();
        let (finished, reason, turn) = wait_for_stop(&mut events).await;
        assert!(!finished);
        assert_eq!(reason, StopReason::Cancelled);
        assert!(turn < 1_000);
        let controller = handle.shutdown().await.unwrap();
        assert!(!controller.is_fast_running());
    }

    #[tokio::test]
    async fn fast_run_reports_progress_then_finishes() {
        let (handle, mut events) = spawn_worker(controller(40));
        handle
            .send(Command::StartFastSim(RunTarget::Turns(100)))
            .unwrap();
        let mut progress = 0;
        let outcome = loop {
            match events.recv().await.unwrap() {
                EngineEvent::Progress(_) => progress += 1,
                EngineEvent::AutoStopped {
                    finished, turn, ..
                } => break (finished, turn),
                EngineEvent::Update(_) => {}
            }
        };
        assert_eq!(outcome, (true, 100));
        assert_eq!(progress, 3);
        drop(handle);
    }

    #[tokio::test]
    async fn paced_run_advances_only_on_next_turn() {
        let (handle, mut events) = spawn_worker(controller(10));
        handle
            .send(Command::StartAutoPlay(RunTarget::Turns(2)))
            .unwrap();
        let first = events.recv().await.unwrap();
        assert_eq!(first.snapshot().unwrap().turn, 1);
        handle.send(Command::NextTurn).unwrap();
        let second = events.recv().await.unwrap();
        assert_eq!(second.snapshot().unwrap().turn, 2);
        handle.send(Command::NextTurn).unwrap();
        let (finished, reason, _) = wait_for_stop(&mut events).await;
        assert!(finished);
        assert_eq!(reason, StopReason::Completed);
        let controller = handle.shutdown().await.unwrap();
        assert_eq!(controller.engine().state().turn_count, 2);
    }
}
