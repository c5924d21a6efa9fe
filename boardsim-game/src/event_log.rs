//! Bounded, monotonically identified audit log.
//!
//! The log retains only the most recent `capacity` entries. Consumers that
//! need full history capture entries as they are emitted: with capture
//! enabled, every append is also staged in an outbox that the controller
//! drains into the next update. Capture is off by default so a bare engine
//! never accumulates history.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Mechanical event kind recorded in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    PassGo,
    Income,
    Expense,
    SmallBonus,
    BigBonus,
    BonusSuccess,
    BonusFail,
    ToJail,
    LandStart,
    Visit,
    Collect,
    LevelUp,
    System,
    InsufficientResource,
}

impl EventKind {
    /// Stable tag used in exports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PassGo => "PASS_GO",
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
            Self::SmallBonus => "SMALL_BONUS",
            Self::BigBonus => "BIG_BONUS",
            Self::BonusSuccess => "BONUS_SUCCESS",
            Self::BonusFail => "BONUS_FAIL",
            Self::ToJail => "TO_JAIL",
            Self::LandStart => "LAND_START",
            Self::Visit => "VISIT",
            Self::Collect => "COLLECT",
            Self::LevelUp => "LEVEL_UP",
            Self::System => "SYSTEM",
            Self::InsufficientResource => "INSUFFICIENT_RESOURCE",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity tier for a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

/// One audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Session-unique, strictly increasing identifier.
    pub id: u64,
    pub turn: u64,
    pub position: usize,
    pub event: EventKind,
    #[serde(default)]
    pub severity: Severity,
    pub delta_money: i64,
    pub balance_after: i64,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

/// Fields supplied by the engine for a new entry; the log assigns id and time.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub turn: u64,
    pub position: usize,
    pub event: EventKind,
    pub severity: Severity,
    pub delta_money: i64,
    pub balance_after: i64,
    pub detail: String,
}

/// FIFO-capped log with an emission outbox.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    outbox: Vec<LogEntry>,
    capture: bool,
    capacity: usize,
    next_id: u64,
}

impl EventLog {
    /// Create an empty log keeping at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            outbox: Vec::new(),
            capture: false,
            capacity,
            next_id: 1,
        }
    }

    /// Append an entry, evicting the oldest when over capacity. Returns the new id.
    pub fn push(&mut self, draft: EntryDraft) -> u64 {
        let id = self.next_id;
        let entry = LogEntry {
            id,
            turn: draft.turn,
            position: draft.position,
            event: draft.event,
            severity: draft.severity,
            delta_money: draft.delta_money,
            balance_after: draft.balance_after,
            detail: draft.detail,
            timestamp: Utc::now(),
        };
        self.next_id = self.next_id.saturating_add(1);
        if self.capture {
            self.outbox.push(entry.clone());
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        id
    }

    /// Drop retained entries and the outbox while keeping the id sequence,
    /// so ids stay unique across re-initialisation.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.outbox.clear();
    }

    /// Change the retention cap (minimum 1), evicting the oldest entries if needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Enable or disable staging of appended entries for emission.
    pub fn set_capture(&mut self, enabled: bool) {
        self.capture = enabled;
        if !enabled {
            self.outbox.clear();
        }
    }

    /// Take every entry appended since the previous drain.
    pub fn drain_emitted(&mut self) -> Vec<LogEntry> {
        std::mem::take(&mut self.outbox)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Id that the next appended entry will receive.
    #[must_use]
    pub const fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    /// Point-in-time copy of the retained entries, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

/// Incremental-sync helper for consumers: remembers the highest id seen and
/// returns only unseen entries from a log tail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogCursor {
    last_seen: u64,
}

impl LogCursor {
    #[must_use]
    pub const fn new() -> Self {
        Self { last_seen: 0 }
    }

    #[must_use]
    pub const fn last_seen(&self) -> u64 {
        self.last_seen
    }

    /// Entries in `tail` newer than anything previously observed.
    pub fn unseen<'a>(&mut self, tail: &'a [LogEntry]) -> &'a [LogEntry] {
        let start = tail.partition_point(|entry| entry.id <= self.last_seen);
        if let Some(last) = tail.last() {
            self.last_seen = self.last_seen.max(last.id);
        }
        &tail[start..]
    }
}
