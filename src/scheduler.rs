//! Periodic fetch + match loop with cooperative cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::fetch::Fetcher;
use crate::history::HistoryLog;
use crate::matcher::{extract, Matcher};
use crate::monitor::{CheckResult, MonitorConfig};
use crate::notify::{Delivery, Notifier};
use crate::state::{MonitorState, Transition};

/// How often the loop wakes to look for due monitors and cancellation
const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Shared stop flag; clones observe the same flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Whether a check raised an alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    NotNeeded,
    Delivered(Delivery),
    /// The check itself stands; only the alert was lost
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub result: CheckResult,
    pub transition: Transition,
    pub alert: Alert,
}

/// A monitor together with everything a check updates
#[derive(Debug, Clone)]
pub struct MonitorRun {
    pub monitor: MonitorConfig,
    pub state: MonitorState,
    pub history: HistoryLog,
    pub notifier: Notifier,
}

impl MonitorRun {
    pub fn new(monitor: MonitorConfig, notifier: Notifier) -> Self {
        Self {
            monitor,
            state: MonitorState::default(),
            history: HistoryLog::new(),
            notifier,
        }
    }

    pub fn with_state(mut self, state: MonitorState, history: HistoryLog) -> Self {
        self.state = state;
        self.history = history;
        self
    }
}

/// Run a single check: fetch, match, record, and alert on closed -> open
///
/// A failed fetch or extraction produces no result: the error lands in
/// `state.last_error` and history is untouched.
pub fn check_once<F: Fetcher + ?Sized>(run: &mut MonitorRun, fetcher: &F) -> Result<CheckOutcome> {
    let matched = match evaluate(&run.monitor, fetcher) {
        Ok(matched) => matched,
        Err(e) => {
            warn!(monitor = %run.monitor.name, error = %e, "check failed");
            run.state.record_error(e.to_string());
            return Err(e);
        }
    };

    let result = CheckResult::new(Utc::now(), matched);
    let transition = run.state.apply(&result);
    run.history.push(result);
    debug!(monitor = %run.monitor.name, matched, ?transition, "check complete");

    let alert = if transition == Transition::Opened {
        info!(monitor = %run.monitor.name, "monitor opened");
        match run.notifier.notify_opened(&run.monitor, &result) {
            Ok(delivery) => Alert::Delivered(delivery),
            Err(e) => {
                warn!(monitor = %run.monitor.name, error = %e, "alert failed");
                Alert::Failed(e.to_string())
            }
        }
    } else {
        Alert::NotNeeded
    };

    Ok(CheckOutcome { result, transition, alert })
}

fn evaluate<F: Fetcher + ?Sized>(monitor: &MonitorConfig, fetcher: &F) -> Result<bool> {
    let matcher = Matcher::new(&monitor.search_text, &monitor.match_mode)?;
    let page = fetcher.fetch(&monitor.target_url, &monitor.headers)?;
    let content = extract(&page, &monitor.extraction)?;
    Ok(matcher.is_match(&content))
}

/// Checks each monitor immediately, then once per its interval, until cancelled
pub struct Scheduler<'a, F: Fetcher + ?Sized> {
    fetcher: &'a F,
    runs: Vec<MonitorRun>,
    cancel: CancelToken,
    tick: Duration,
    max_checks: Option<usize>,
}

impl<'a, F: Fetcher + ?Sized> Scheduler<'a, F> {
    pub fn new(fetcher: &'a F, runs: Vec<MonitorRun>, cancel: CancelToken) -> Self {
        Self {
            fetcher,
            runs,
            cancel,
            tick: DEFAULT_TICK,
            max_checks: None,
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Stop after this many checks in total
    pub fn with_max_checks(mut self, max_checks: Option<usize>) -> Self {
        self.max_checks = max_checks;
        self
    }

    pub fn runs(&self) -> &[MonitorRun] {
        &self.runs
    }

    pub fn into_runs(self) -> Vec<MonitorRun> {
        self.runs
    }

    /// Drive the loop; `observer` sees every check as it happens.
    /// Returns the number of checks performed.
    pub fn run<O>(&mut self, mut observer: O) -> usize
    where
        O: FnMut(&MonitorRun, &Result<CheckOutcome>),
    {
        let start = Instant::now();
        let mut next_due = vec![start; self.runs.len()];
        let mut checks = 0;

        if self.max_checks == Some(0) {
            return 0;
        }

        info!(monitors = self.runs.len(), "scheduler started");

        while !self.cancel.is_cancelled() {
            for (run, due) in self.runs.iter_mut().zip(next_due.iter_mut()) {
                if self.cancel.is_cancelled() || Instant::now() < *due {
                    continue;
                }

                let outcome = check_once(run, self.fetcher);
                observer(run, &outcome);
                checks += 1;
                *due = Instant::now() + run.monitor.interval.as_duration();

                if self.max_checks.is_some_and(|max| checks >= max) {
                    info!(checks, "check limit reached");
                    return checks;
                }
            }

            if self.runs.is_empty() {
                break;
            }
            self.sleep_until_next(&next_due);
        }

        info!(checks, "scheduler stopped");
        checks
    }

    fn sleep_until_next(&self, next_due: &[Instant]) {
        let now = Instant::now();
        let wait = next_due
            .iter()
            .map(|due| due.saturating_duration_since(now))
            .min()
            .unwrap_or(self.tick)
            .min(self.tick);
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
    }
}
