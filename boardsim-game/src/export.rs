//! Flat tabular projection of log entries for export.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::event_log::{EventKind, LogEntry};

pub const CSV_HEADER: &str = "turn,position,event,delta_money,balance_after,timestamp";

/// One exported row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub id: u64,
    pub turn: u64,
    pub position: usize,
    pub event: EventKind,
    pub delta_money: i64,
    pub balance_after: i64,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&LogEntry> for ExportRecord {
    fn from(entry: &LogEntry) -> Self {
        Self {
            id: entry.id,
            turn: entry.turn,
            position: entry.position,
            event: entry.event,
            delta_money: entry.delta_money,
            balance_after: entry.balance_after,
            detail: entry.detail.clone(),
            timestamp: entry.timestamp,
        }
    }
}

impl ExportRecord {
    /// CSV line matching [`CSV_HEADER`] (no trailing newline).
    #[must_use]
    pub fn csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.turn,
            self.position,
            self.event,
            self.delta_money,
            self.balance_after,
            self.timestamp.to_rfc3339()
        )
    }
}

/// Project any slice of entries (retained tail or captured history).
#[must_use]
pub fn export_records(entries: &[LogEntry]) -> Vec<ExportRecord> {
    entries.iter().map(ExportRecord::from).collect()
}

/// Render entries as CSV with a header row.
#[must_use]
pub fn render_csv(entries: &[LogEntry]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + entries.len() * 64);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for entry in entries {
        let _ = writeln!(out, "{}", ExportRecord::from(entry).csv_line());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log::Severity;

    fn entry(id: u64, event: EventKind, delta_money: i64) -> LogEntry {
        LogEntry {
            id,
            turn: id,
            position: 3,
            event,
            severity: Severity::Info,
            delta_money,
            balance_after: 5_000 + delta_money,
            detail: "detail, with comma".to_string(),
            timestamp: DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn csv_has_header_and_one_row_per_entry() {
        let csv = render_csv(&[entry(1, EventKind::PassGo, 2_000), entry(2, EventKind::Visit, 0)]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "1,3,PASS_GO,2000,7000,2024-05-01T12:00:00+00:00");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn records_keep_id_and_detail() {
        let records = export_records(&[entry(9, EventKind::Expense, -50)]);
        assert_eq!(records[0].id, 9);
        assert_eq!(records[0].detail, "detail, with comma");
        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["event"], "EXPENSE");
        assert_eq!(json["delta_money"], -50);
    }
}
