use anyhow::Result;
use boardsim_game::{ExportRecord, LogEntry, Severity, export_records, render_csv};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

use crate::driver::{DriveMode, RunOutcome, StopInfo};

/// Entries shown in the console tail unless verbose.
const CONSOLE_TAIL: usize = 15;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub mode: DriveMode,
    pub seed: u64,
    pub turns: u64,
    pub position: usize,
    pub money: i64,
    pub dice: u64,
    pub multiplier: u32,
    pub level: u32,
    pub points: u64,
    pub total_collected: u64,
    pub collectibles: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopInfo>,
    pub progress_events: u64,
    pub logged_entries: usize,
    /// Emitted entries per event tag.
    pub event_counts: BTreeMap<String, u64>,
    pub elapsed_ms: u128,
}

impl RunSummary {
    #[must_use]
    pub fn from_outcome(mode: DriveMode, seed: u64, outcome: &RunOutcome) -> Self {
        let snapshot = &outcome.snapshot;
        let mut event_counts = BTreeMap::new();
        for entry in &outcome.history {
            *event_counts.entry(entry.event.to_string()).or_insert(0) += 1;
        }
        Self {
            mode,
            seed,
            turns: snapshot.turn,
            position: snapshot.position,
            money: snapshot.money,
            dice: snapshot.dice,
            multiplier: snapshot.multiplier,
            level: snapshot.progression.level,
            points: snapshot.progression.points,
            total_collected: snapshot.progression.total_collected,
            collectibles: snapshot.collectibles.clone(),
            stop: outcome.stop,
            progress_events: outcome.progress_events,
            logged_entries: outcome.history.len(),
            event_counts,
            elapsed_ms: outcome.elapsed.as_millis(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    summary: &'a RunSummary,
    entries: Vec<ExportRecord>,
}

/// Summary plus the full captured history as export records.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn generate_json_report<W: Write>(
    writer: &mut W,
    summary: &RunSummary,
    history: &[LogEntry],
) -> Result<()> {
    let report = JsonReport {
        generated_at: Utc::now(),
        summary,
        entries: export_records(history),
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}

/// Full captured history as CSV.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn generate_csv_report<W: Write>(writer: &mut W, history: &[LogEntry]) -> Result<()> {
    writer.write_all(render_csv(history).as_bytes())?;
    Ok(())
}

/// Human-readable summary with the tail of the log.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn generate_console_report<W: Write>(
    writer: &mut W,
    summary: &RunSummary,
    history: &[LogEntry],
    verbose: bool,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Run Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "==============".cyan())?;
    writeln!(writer, "Mode: {:?}   Seed: {}", summary.mode, summary.seed)?;
    writeln!(writer, "Turns played: {}", summary.turns)?;
    let money = if summary.money < 0 {
        summary.money.to_string().red()
    } else {
        summary.money.to_string().green()
    };
    writeln!(writer, "Money: {money}")?;
    writeln!(
        writer,
        "Dice left: {}   Multiplier: x{}",
        summary.dice, summary.multiplier
    )?;
    writeln!(
        writer,
        "Level: {}   Points: {}   Collected: {}",
        summary.level, summary.points, summary.total_collected
    )?;
    writeln!(writer, "Position: {}   Pickups on board: {:?}", summary.position, summary.collectibles)?;

    if let Some(stop) = summary.stop {
        let status = if stop.finished {
            "✅ finished".green()
        } else {
            "⏹ stopped".yellow()
        };
        writeln!(
            writer,
            "{status} ({:?}) after {} auto turns",
            stop.reason, stop.turns_run
        )?;
    }

    if !summary.event_counts.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "{}", "Events".bold())?;
        for (event, count) in &summary.event_counts {
            writeln!(writer, "  {event:22} {count}")?;
        }
    }

    let skip = if verbose {
        0
    } else {
        history.len().saturating_sub(CONSOLE_TAIL)
    };
    if history.len() > skip {
        writeln!(writer)?;
        writeln!(writer, "{}", "Log".bold())?;
        if skip > 0 {
            writeln!(writer, "  … {skip} earlier entries")?;
        }
        for entry in &history[skip..] {
            writeln!(writer, "{}", format_entry(entry))?;
        }
    }
    Ok(())
}

fn format_entry(entry: &LogEntry) -> String {
    let tag = match entry.severity {
        Severity::Critical => entry.event.to_string().red().bold(),
        Severity::Warning => entry.event.to_string().yellow(),
        Severity::Info => entry.event.to_string().normal(),
    };
    let delta = match entry.delta_money {
        0 => String::new(),
        d if d > 0 => format!(" {}", format!("+{d}").green()),
        d => format!(" {}", d.to_string().red()),
    };
    format!(
        "  #{:<6} t{:<6} @{:<3} {tag}{delta} {}",
        entry.id, entry.turn, entry.position, entry.detail
    )
}
