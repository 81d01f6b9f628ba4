//! Bounded, newest-first log of check results

use std::collections::VecDeque;

use serde::Serialize;

use crate::monitor::CheckResult;

/// Maximum number of results kept per monitor
pub const HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct HistoryLog {
    entries: VecDeque<CheckResult>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self { entries: VecDeque::with_capacity(HISTORY_CAPACITY) }
    }

    /// Rebuild from results already ordered newest first
    pub fn from_results<I: IntoIterator<Item = CheckResult>>(results: I) -> Self {
        Self {
            entries: results.into_iter().take(HISTORY_CAPACITY).collect(),
        }
    }

    /// Record a result as the newest entry, evicting the oldest on overflow
    pub fn push(&mut self, result: CheckResult) {
        self.entries.push_front(result);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    pub fn latest(&self) -> Option<&CheckResult> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CheckResult> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
