use boardsim_game::{
    Command, ConfigUpdate, EngineEvent, EventKind, LogCursor, LogEntry, RunController, RunMode,
    RunTarget, StopReason, SystemConfig, TileDescriptor, TileKind,
};

fn tiles() -> Vec<TileDescriptor> {
    (0..40)
        .map(|index| {
            let kind = if index == 0 {
                TileKind::Start
            } else if index % 5 == 0 {
                TileKind::SmallBonus { value: 50 }
            } else {
                TileKind::PlainCell { value: -10 }
            };
            TileDescriptor::new(index, kind, format!("Tile {index}"))
        })
        .collect()
}

fn controller(config: SystemConfig) -> RunController {
    RunController::from_parts(tiles(), Vec::new(), config).unwrap()
}

fn stop_of(events: &[EngineEvent]) -> Option<(bool, StopReason, u64)> {
    events.iter().find_map(|event| match event {
        EngineEvent::AutoStopped {
            finished,
            reason,
            turn,
            ..
        } => Some((*finished, *reason, *turn)),
        _ => None,
    })
}

fn drive_fast(controller: &mut RunController) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while controller.is_fast_running() {
        events.extend(controller.run_fast_batch());
    }
    events
}

#[test]
fn stop_right_after_fast_start_reports_unfinished() {
    let mut controller = controller(SystemConfig::default().with_seed(10));
    let _ = controller.handle(Command::StartFastSim(RunTarget::Turns(1_000)));
    let events = controller.handle(Command::StopAuto);
    let (finished, reason, turn) = stop_of(&events).unwrap();
    assert!(!finished);
    assert_eq!(reason, StopReason::Cancelled);
    assert!(turn < 1_000);
    assert!(controller.run_fast_batch().is_empty());
}

#[test]
fn stop_between_batches_keeps_completed_batch() {
    let config = SystemConfig {
        batch_size: 250,
        ..SystemConfig::default().with_seed(11)
    };
    let mut controller = controller(config);
    let _ = controller.handle(Command::StartFastSim(RunTarget::Turns(1_000)));
    let first = controller.run_fast_batch();
    assert!(matches!(first[0], EngineEvent::Progress(ref progress) if progress.completed == 250));
    let (finished, _, turn) = stop_of(&controller.handle(Command::StopAuto)).unwrap();
    assert!(!finished);
    assert_eq!(turn, 250);
}

#[test]
fn fast_run_to_completion_reports_finished() {
    let mut controller = controller(SystemConfig::default().with_seed(12));
    let _ = controller.handle(Command::StartFastSim(RunTarget::Turns(900)));
    let events = drive_fast(&mut controller);
    let progress = events
        .iter()
        .filter(|event| matches!(event, EngineEvent::Progress(_)))
        .count();
    assert_eq!(progress, 2);
    assert_eq!(stop_of(&events), Some((true, StopReason::Completed, 900)));
    assert_eq!(controller.run_mode(), RunMode::Idle);
}

#[test]
fn unbounded_paced_run_stops_when_dice_run_out() {
    let config = SystemConfig {
        starting_dice: 6,
        ..SystemConfig::default().with_seed(13)
    };
    let mut controller = controller(config);
    let _ = controller.handle(Command::UpdateConfig(ConfigUpdate {
        multiplier: Some(2),
        ..ConfigUpdate::default()
    }));
    let mut events = controller.handle(Command::StartAutoPlay(RunTarget::Unbounded));
    while controller.run_mode() == RunMode::PacedAuto {
        events.extend(controller.handle(Command::NextTurn));
    }
    let (finished, reason, turn) = stop_of(&events).unwrap();
    assert!(!finished);
    assert_eq!(reason, StopReason::ResourceExhausted);
    assert_eq!(turn, 3);
}

#[test]
fn captured_entries_form_the_full_history() {
    let mut controller = controller(SystemConfig::default().with_seed(14));
    let _ = controller.handle(Command::GenExtra(4));
    let _ = controller.handle(Command::StartFastSim(RunTarget::Turns(400)));
    let mut history: Vec<LogEntry> = Vec::new();
    for event in drive_fast(&mut controller) {
        history.extend_from_slice(event.new_entries());
    }
    assert!(history.len() > 50);
    assert!(history.windows(2).all(|pair| pair[1].id == pair[0].id + 1));
    let tail = controller.engine().snapshot().log;
    assert_eq!(tail.len(), 50);
    assert_eq!(tail.last(), history.last());
}

#[test]
fn cursor_diffs_successive_snapshots() {
    let mut controller = controller(SystemConfig::default().with_seed(15));
    let mut cursor = LogCursor::new();
    let mut seen = 0;
    for _ in 0..30 {
        for event in controller.handle(Command::ExecTurn) {
            if let Some(snapshot) = event.snapshot() {
                seen += cursor.unseen(&snapshot.log).len();
            }
        }
    }
    assert_eq!(cursor.last_seen(), controller.engine().state().log.next_id() - 1);
    assert_eq!(seen as u64, cursor.last_seen());
}

#[test]
fn gen_extra_logs_the_number_placed() {
    let mut controller = controller(SystemConfig::default().with_seed(16));
    let events = controller.handle(Command::GenExtra(100));
    let snapshot = events[0].snapshot().unwrap();
    assert!(snapshot.collectibles.len() <= 20);
    let entry = snapshot.log.last().unwrap();
    assert_eq!(entry.event, EventKind::System);
    assert!(entry.detail.contains(&format!("Placed {}", snapshot.collectibles.len())));
}

#[cfg(feature = "async")]
mod worker {
    use super::*;
    use boardsim_game::spawn_worker;

    #[tokio::test]
    async fn worker_honours_stop_at_batch_boundary() {
        let config = SystemConfig {
            batch_size: 50,
            ..SystemConfig::default().with_seed(20)
        };
        let (handle, mut events) = spawn_worker(controller(config));
        handle
            .send(Command::StartFastSim(RunTarget::Turns(100_000)))
            .unwrap();
        let mut progress_seen = 0;
        while let Some(event) = events.recv().await {
            match event {
                EngineEvent::Progress(progress) => {
                    assert_eq!(progress.completed % 50, 0);
                    progress_seen += 1;
                    if progress_seen == 2 {
                        handle.send(Command::StopAuto).unwrap();
                    }
                }
                EngineEvent::AutoStopped {
                    finished, turn, ..
                } => {
                    assert!(!finished);
                    assert!(turn < 100_000);
                    assert_eq!(turn % 50, 0);
                    break;
                }
                EngineEvent::Update(_) => {}
            }
        }
        let controller = handle.shutdown().await.unwrap();
        assert_eq!(controller.run_mode(), RunMode::Idle);
    }
}
