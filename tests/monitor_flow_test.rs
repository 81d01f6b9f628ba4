//! End-to-end checks against a canned page source
//!
//! These run the real scheduler, database and notifier without touching
//! the network; pages come from an in-memory fetcher.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use openwatch::config::{Config, NotifyTarget, QuietHours};
use openwatch::db::Database;
use openwatch::error::{MonitorError, Result};
use openwatch::fetch::{Fetcher, PageContent};
use openwatch::history::HISTORY_CAPACITY;
use openwatch::monitor::{CheckInterval, Extraction, MonitorConfig};
use openwatch::notify::{Delivery, Notifier};
use openwatch::scheduler::{check_once, Alert, CancelToken, MonitorRun, Scheduler};
use openwatch::state::Transition;

const CLOSED_PAGE: &str = "<html><body><h1>TIP GDP</h1><p>Applications are closed.</p></body></html>";
const OPEN_PAGE: &str = "<html><body><h1>TIP GDP</h1><p>Applications are NOW OPEN!</p></body></html>";

/// Serves queued bodies in order; `None` simulates a network failure
struct CannedFetcher {
    pages: RefCell<VecDeque<Option<&'static str>>>,
    seen_headers: RefCell<Vec<HashMap<String, String>>>,
}

impl CannedFetcher {
    fn new(pages: Vec<Option<&'static str>>) -> Self {
        Self {
            pages: RefCell::new(pages.into()),
            seen_headers: RefCell::new(Vec::new()),
        }
    }
}

impl Fetcher for CannedFetcher {
    fn fetch(&self, url: &str, headers: &HashMap<String, String>) -> Result<PageContent> {
        self.seen_headers.borrow_mut().push(headers.clone());
        match self.pages.borrow_mut().pop_front().flatten() {
            Some(body) => Ok(PageContent {
                url: url.to_string(),
                body: body.to_string(),
            }),
            None => Err(MonitorError::IoError(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
        }
    }
}

fn tip_monitor() -> MonitorConfig {
    MonitorConfig::new(
        "TIP GDP".to_string(),
        "https://example.org/tip-gdp".to_string(),
        "now open".to_string(),
    )
}

fn logging_notifier(dir: &tempfile::TempDir) -> Notifier {
    Notifier::new(None).with_log_path(Some(dir.path().join("alerts.log")))
}

#[test]
fn test_alert_fires_once_per_opening() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = CannedFetcher::new(vec![
        Some(CLOSED_PAGE),
        Some(OPEN_PAGE),
        Some(OPEN_PAGE),
        Some(CLOSED_PAGE),
        Some(OPEN_PAGE),
    ]);
    let mut run = MonitorRun::new(tip_monitor(), logging_notifier(&dir));

    let transitions: Vec<_> = (0..5)
        .map(|_| check_once(&mut run, &fetcher).unwrap().transition)
        .collect();

    assert_eq!(
        transitions,
        vec![
            Transition::Unchanged,
            Transition::Opened,
            Transition::Unchanged,
            Transition::Closed,
            Transition::Opened,
        ]
    );

    let log = std::fs::read_to_string(dir.path().join("alerts.log")).unwrap();
    assert_eq!(log.matches("TIP GDP is now OPEN!").count(), 2);
}

#[test]
fn test_failed_fetch_keeps_previous_state() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = CannedFetcher::new(vec![Some(OPEN_PAGE), None]);
    let mut run = MonitorRun::new(tip_monitor(), logging_notifier(&dir));

    check_once(&mut run, &fetcher).unwrap();
    let checked_at = run.state.last_checked;

    assert!(check_once(&mut run, &fetcher).is_err());
    assert!(run.state.is_open);
    assert_eq!(run.state.last_checked, checked_at);
    assert!(run.state.last_error.as_deref().unwrap().contains("connection refused"));
    assert_eq!(run.history.len(), 1);
}

#[test]
fn test_quiet_hours_suppress_but_still_log() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = CannedFetcher::new(vec![Some(OPEN_PAGE)]);
    let always_quiet = QuietHours { start: "00:00".into(), end: "23:59".into() };
    let notifier = Notifier::new(Some(NotifyTarget::Command { command: "false".into() }))
        .with_quiet_hours(Some(always_quiet))
        .with_log_path(Some(dir.path().join("alerts.log")));

    // 23:59 itself is outside the window
    let now = chrono::Local::now();
    if now.format("%H:%M").to_string() == "23:59" {
        return;
    }

    let mut run = MonitorRun::new(tip_monitor(), notifier);
    let outcome = check_once(&mut run, &fetcher).unwrap();

    assert_eq!(outcome.alert, Alert::Delivered(Delivery::Suppressed));
    let log = std::fs::read_to_string(dir.path().join("alerts.log")).unwrap();
    assert!(log.contains("QUIET_HOURS_SUPPRESSED"));
}

#[test]
fn test_selector_extraction_and_headers_reach_fetcher() {
    let dir = tempfile::tempdir().unwrap();
    let page = "<html><body><nav>now open: careers</nav><div id=\"status\">Closed</div></body></html>";
    let fetcher = CannedFetcher::new(vec![Some(page)]);

    let mut monitor = tip_monitor();
    monitor.extraction = Extraction::Selector { selector: "#status".into() };
    monitor.headers.insert("Cookie".into(), "session=abc".into());

    let mut run = MonitorRun::new(monitor, logging_notifier(&dir));
    let outcome = check_once(&mut run, &fetcher).unwrap();

    // The nav text matches, but only #status is searched
    assert!(!outcome.result.matched());
    let seen = fetcher.seen_headers.borrow();
    assert_eq!(seen[0].get("Cookie").map(String::as_str), Some("session=abc"));
}

#[test]
fn test_scheduler_persists_through_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_at(&dir.path().join("openwatch.db")).unwrap();

    let mut monitor = tip_monitor();
    monitor.interval = CheckInterval::OneMinute;
    db.insert_monitor(&monitor).unwrap();

    let pages: Vec<_> = (0..12)
        .map(|i| Some(if i % 2 == 0 { CLOSED_PAGE } else { OPEN_PAGE }))
        .collect();
    let fetcher = CannedFetcher::new(pages);

    // One check per run of the loop; a fresh scheduler checks immediately
    let mut run = MonitorRun::new(monitor.clone(), logging_notifier(&dir));
    for _ in 0..12 {
        let mut scheduler = Scheduler::new(&fetcher, vec![run], CancelToken::new())
            .with_tick(Duration::from_millis(5))
            .with_max_checks(Some(1));
        let checks = scheduler.run(|run, outcome| {
            if let Ok(outcome) = outcome {
                db.insert_check(&run.monitor.id, &outcome.result).unwrap();
            }
            db.save_state(&run.monitor.id, &run.state).unwrap();
        });
        assert_eq!(checks, 1);
        run = scheduler.into_runs().remove(0);
    }

    let history = db.load_history(&monitor.id).unwrap();
    assert_eq!(history.len(), HISTORY_CAPACITY);
    // Stored timestamps keep millisecond precision
    let stored: Vec<_> = history.iter().map(|r| (r.timestamp().timestamp_millis(), r.matched())).collect();
    let live: Vec<_> = run.history.iter().map(|r| (r.timestamp().timestamp_millis(), r.matched())).collect();
    assert_eq!(stored, live);
    assert!(history.latest().unwrap().matched());

    let state = db.load_state(&monitor.id).unwrap();
    assert!(state.is_open);
    assert_eq!(
        state.last_checked.map(|t| t.timestamp_millis()),
        run.state.last_checked.map(|t| t.timestamp_millis())
    );

    db.delete_monitor(&monitor.id).unwrap();
    assert!(db.load_history(&monitor.id).unwrap().is_empty());
}

#[test]
fn test_cancelled_scheduler_does_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = CannedFetcher::new(vec![Some(OPEN_PAGE)]);
    let cancel = CancelToken::new();
    cancel.cancel();

    let run = MonitorRun::new(tip_monitor(), logging_notifier(&dir));
    let mut scheduler = Scheduler::new(&fetcher, vec![run], cancel);
    let checks = scheduler.run(|_, _| panic!("no check expected"));

    assert_eq!(checks, 0);
    assert!(fetcher.seen_headers.borrow().is_empty());
}

#[test]
fn test_config_round_trips_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = Config::default();
    config.default_notify = Some(NotifyTarget::Ntfy { topic: "tip-gdp".into(), server: None });
    config.quiet_hours = Some(QuietHours { start: "22:00".into(), end: "07:00".into() });
    config.default_interval_minutes = 15;
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded.default_notify, config.default_notify);
    assert_eq!(loaded.default_interval_minutes, 15);
    assert!(loaded.quiet_hours.unwrap().contains(23, 30));
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
    assert!(loaded.default_notify.is_none());
    assert_eq!(loaded.default_interval_minutes, 60);
}
