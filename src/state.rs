use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::monitor::CheckResult;

/// Change in open/closed status caused by a check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Closed -> open; the only transition that alerts
    Opened,
    Closed,
    Unchanged,
}

/// Current view of a monitored page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorState {
    pub is_open: bool,
    pub last_checked: Option<DateTime<Utc>>,
    /// Message from the most recent failed check, cleared on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl MonitorState {
    /// Fold a fresh result into the state
    pub fn apply(&mut self, result: &CheckResult) -> Transition {
        let transition = match (self.is_open, result.matched()) {
            (false, true) => Transition::Opened,
            (true, false) => Transition::Closed,
            _ => Transition::Unchanged,
        };
        self.is_open = result.matched();

        // last_checked never moves backwards
        if self.last_checked.map_or(true, |prev| result.timestamp() > prev) {
            self.last_checked = Some(result.timestamp());
        }
        self.last_error = None;
        transition
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_open { "OPEN" } else { "CLOSED" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_transitions() {
        let t0 = Utc::now();
        let mut state = MonitorState::default();

        assert_eq!(state.apply(&CheckResult::new(t0, false)), Transition::Unchanged);
        assert_eq!(state.apply(&CheckResult::new(t0, true)), Transition::Opened);
        assert!(state.is_open);
        assert_eq!(state.apply(&CheckResult::new(t0, true)), Transition::Unchanged);
        assert_eq!(state.apply(&CheckResult::new(t0, false)), Transition::Closed);
        assert!(!state.is_open);
    }

    #[test]
    fn test_last_checked_is_monotonic() {
        let t0 = Utc::now();
        let mut state = MonitorState::default();
        assert_eq!(state.last_checked, None);

        state.apply(&CheckResult::new(t0, false));
        assert_eq!(state.last_checked, Some(t0));

        state.apply(&CheckResult::new(t0 - Duration::minutes(5), true));
        assert_eq!(state.last_checked, Some(t0));
        // The status still follows the most recent result
        assert!(state.is_open);

        let later = t0 + Duration::minutes(1);
        state.apply(&CheckResult::new(later, true));
        assert_eq!(state.last_checked, Some(later));
    }

    #[test]
    fn test_error_slot() {
        let mut state = MonitorState::default();
        state.record_error("connection refused");
        assert_eq!(state.last_error.as_deref(), Some("connection refused"));
        assert_eq!(state.last_checked, None);
        assert!(!state.is_open);

        state.apply(&CheckResult::new(Utc::now(), false));
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_status_label() {
        let mut state = MonitorState::default();
        assert_eq!(state.status_label(), "CLOSED");
        state.is_open = true;
        assert_eq!(state.status_label(), "OPEN");
    }
}
