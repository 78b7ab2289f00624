//! Event history tracking for debugging and diagnostics.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::runtime::Instant;

/// Kind of event in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    PollSuccess,
    PollFailure,
    Write,
    WriteFailure,
    /// A command refused because the fixture was unavailable.
    Skipped,
}

/// A recorded event in the history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: EventKind,
    pub detail: String,
    /// Seconds since history creation
    pub timestamp: f64,
}

/// Bounded log of what the engine did to a fixture.
#[derive(Debug, Clone)]
pub struct EventHistory {
    counts: HashMap<EventKind, usize>,
    last_error: Option<String>,
    start_time: Instant,
    entries: VecDeque<HistoryEntry>,
    max_entries: usize,
}

impl Default for EventHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHistory {
    pub const DEFAULT_MAX_ENTRIES: usize = 100;

    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
            last_error: None,
            start_time: Instant::now(),
            entries: VecDeque::new(),
            max_entries: Self::DEFAULT_MAX_ENTRIES,
        }
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries,
            ..Self::new()
        }
    }

    pub fn record(&mut self, kind: EventKind, detail: impl Into<String>) {
        let detail = detail.into();
        *self.counts.entry(kind).or_default() += 1;
        if matches!(kind, EventKind::PollFailure | EventKind::WriteFailure) {
            self.last_error = Some(detail.clone());
        }

        self.entries.push_back(HistoryEntry {
            kind,
            detail,
            timestamp: self.start_time.elapsed().as_secs_f64(),
        });

        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Total events of `kind` since creation, including evicted ones.
    pub fn count(&self, kind: EventKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
        self.entries.clear();
        self.last_error = None;
    }

    pub fn summary(&self) -> HistorySummary {
        HistorySummary {
            poll_successes: self.count(EventKind::PollSuccess),
            poll_failures: self.count(EventKind::PollFailure),
            writes: self.count(EventKind::Write),
            write_failures: self.count(EventKind::WriteFailure),
            skipped_commands: self.count(EventKind::Skipped),
            total_entries: self.entries.len(),
            last_error: self.last_error.clone(),
        }
    }
}

/// Summary of event history for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySummary {
    pub poll_successes: usize,
    pub poll_failures: usize,
    pub writes: usize,
    pub write_failures: usize,
    pub skipped_commands: usize,
    pub total_entries: usize,
    pub last_error: Option<String>,
}
