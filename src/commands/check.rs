//! Check and monitoring commands: check, history, run, daemon, watch (ephemeral)

use std::io::{self, Write};

use colored::Colorize;
use tracing::warn;

use openwatch::config::Config;
use openwatch::db::Database;
use openwatch::error::{MonitorError, Result};
use openwatch::fetch::HttpFetcher;
use openwatch::monitor::{CheckInterval, MatchMode, MonitorConfig};
use openwatch::notify::{Delivery, Notifier};
use openwatch::scheduler::{check_once, Alert, CancelToken, CheckOutcome, MonitorRun, Scheduler};
use openwatch::state::{MonitorState, Transition};

use crate::utils::{extract_domain, format_last_checked, format_timestamp};

/// Check a monitor now ("Check Now")
pub fn cmd_check(id_or_name: &str, json: bool) -> Result<()> {
    let db = Database::open()?;
    let config = Config::load()?;
    let monitor = db.require_monitor(id_or_name)?;
    let fetcher = HttpFetcher::from_config(&config);

    let mut run = load_run(&db, &config, monitor)?;

    if !json {
        print!("Checking {}... ", run.monitor.target_url);
        let _ = io::stdout().flush();
    }

    let outcome = check_once(&mut run, &fetcher);
    persist(&db, &run, &outcome)?;

    if json {
        let output = serde_json::json!({
            "monitor": run.monitor.name,
            "url": run.monitor.target_url,
            "status": run.state.status_label(),
            "is_open": run.state.is_open,
            "last_checked": run.state.last_checked,
            "error": run.state.last_error,
            "opened": matches!(&outcome, Ok(o) if o.transition == Transition::Opened),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return outcome.map(|_| ());
    }

    let outcome = outcome?;
    println!("{}", "done".dimmed());
    print_status(&run.monitor, &run.state);
    print_alert(&outcome);
    Ok(())
}

/// Show the status history for a monitor
pub fn cmd_history(id_or_name: &str, json: bool) -> Result<()> {
    let db = Database::open()?;
    let monitor = db.require_monitor(id_or_name)?;
    let history = db.load_history(&monitor.id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    println!("\nStatus history for '{}':\n", monitor.name);
    if history.is_empty() {
        println!("  No history yet");
        return Ok(());
    }

    println!("  {:19}  {}", "Time".bold(), "Status".bold());
    for result in history.iter() {
        let status = if result.matched() {
            result.status_label().green()
        } else {
            result.status_label().red()
        };
        println!("  {}  {}", format_timestamp(result.timestamp()), status);
    }
    println!();
    Ok(())
}

/// Check every enabled monitor once (for cron)
pub fn cmd_run() -> Result<()> {
    let db = Database::open()?;
    let config = Config::load()?;
    let fetcher = HttpFetcher::from_config(&config);

    let enabled: Vec<_> = db.list_monitors()?.into_iter().filter(|m| m.enabled).collect();
    if enabled.is_empty() {
        println!("No active monitors.");
        return Ok(());
    }

    println!("Checking {} monitors...\n", enabled.len());

    for monitor in enabled {
        let mut run = load_run(&db, &config, monitor)?;
        let outcome = check_once(&mut run, &fetcher);
        persist(&db, &run, &outcome)?;
        print_check_line(&run, &outcome);
    }

    println!("\nDone.");
    Ok(())
}

/// Run continuously, checking each enabled monitor on its interval
pub fn cmd_daemon(count: Option<usize>) -> Result<()> {
    let db = Database::open()?;
    let config = Config::load()?;
    let fetcher = HttpFetcher::from_config(&config);

    let mut runs = Vec::new();
    for monitor in db.list_monitors()?.into_iter().filter(|m| m.enabled) {
        runs.push(load_run(&db, &config, monitor)?);
    }

    if runs.is_empty() {
        println!("No active monitors. Add one with `openwatch add <url>`.");
        return Ok(());
    }

    let cancel = install_ctrlc()?;

    println!("\nopenwatch daemon starting...\n");
    println!("Monitoring {} pages:\n", runs.len());
    for run in &runs {
        println!("  {} - every {}", run.monitor.name, run.monitor.interval);
    }
    println!("\nPress {} to stop.\n", "Ctrl+C".yellow());

    let mut scheduler = Scheduler::new(&fetcher, runs, cancel).with_max_checks(count);
    scheduler.run(|run, outcome| {
        if let Err(e) = persist(&db, run, outcome) {
            warn!(monitor = %run.monitor.name, error = %e, "could not save check");
        }
        print_check_line(run, outcome);
    });

    println!("Daemon stopped.");
    Ok(())
}

/// Ephemeral watch mode - nothing is saved to the database
pub fn cmd_watch(url: &str, search: &str, regex: bool, interval: &str) -> Result<()> {
    let config = Config::load()?;
    let fetcher = HttpFetcher::from_config(&config);

    let name = extract_domain(url).unwrap_or_else(|| url.to_string());
    let mut monitor = MonitorConfig::new(name, url.trim().to_string(), search.to_string());
    monitor.interval = CheckInterval::parse(interval)?;
    if regex {
        monitor.match_mode = MatchMode::Regex;
    }
    monitor.validate()?;

    let notifier = Notifier::for_monitor(&config, &monitor);
    let cancel = install_ctrlc()?;

    println!(
        "\n{} {} for \"{}\" every {}",
        "Watching".cyan().bold(),
        monitor.target_url,
        monitor.search_text,
        monitor.interval
    );
    println!("Press {} to stop\n", "Ctrl+C".yellow());

    let mut scheduler = Scheduler::new(&fetcher, vec![MonitorRun::new(monitor, notifier)], cancel);
    let checks = scheduler.run(print_check_line);

    println!("\nStopped after {} checks.", checks);
    Ok(())
}

/// Build a run from the stored monitor, state and history
fn load_run(db: &Database, config: &Config, monitor: MonitorConfig) -> Result<MonitorRun> {
    let state = db.load_state(&monitor.id)?;
    let history = db.load_history(&monitor.id)?;
    let notifier = Notifier::for_monitor(config, &monitor);
    Ok(MonitorRun::new(monitor, notifier).with_state(state, history))
}

/// Save the outcome of a check; failed checks only update the error slot
fn persist(db: &Database, run: &MonitorRun, outcome: &Result<CheckOutcome>) -> Result<()> {
    if let Ok(outcome) = outcome {
        db.insert_check(&run.monitor.id, &outcome.result)?;
    }
    db.save_state(&run.monitor.id, &run.state)
}

fn install_ctrlc() -> Result<CancelToken> {
    let cancel = CancelToken::new();
    let handle = cancel.clone();
    ctrlc::set_handler(move || {
        println!("\n\nShutting down...");
        handle.cancel();
    })
    .map_err(|e| MonitorError::ConfigError(format!("Failed to set Ctrl+C handler: {}", e)))?;
    Ok(cancel)
}

fn print_status(monitor: &MonitorConfig, state: &MonitorState) {
    let status = if state.is_open {
        state.status_label().green().bold()
    } else {
        state.status_label().red().bold()
    };
    println!("\n{} Status Monitor\n", monitor.name.bold());
    println!("  Current Status: {}", status);
    println!("  Last checked:   {}", format_last_checked(state.last_checked));
}

fn print_alert(outcome: &CheckOutcome) {
    match &outcome.alert {
        Alert::NotNeeded => {}
        Alert::Delivered(Delivery::Sent) => println!("\n  {}", "Alert sent.".green()),
        Alert::Delivered(Delivery::Suppressed) => {
            println!("\n  {}", "Alert suppressed (quiet hours).".yellow())
        }
        Alert::Delivered(Delivery::LoggedOnly) => println!(
            "\n  {} Set up notifications with `openwatch notify set`.",
            "Opened, but no notification target is configured.".yellow()
        ),
        Alert::Failed(e) => println!("\n  {} {}", "Alert failed:".red(), e),
    }
}

fn print_check_line(run: &MonitorRun, outcome: &Result<CheckOutcome>) {
    let when = format_last_checked(run.state.last_checked);
    match outcome {
        Ok(o) => {
            let status = match o.transition {
                Transition::Opened => "OPENED".green().bold(),
                Transition::Closed => "CLOSED (was open)".yellow(),
                Transition::Unchanged if o.result.matched() => "open".green(),
                Transition::Unchanged => "closed".dimmed(),
            };
            println!("  [{}] {}: {}", when, run.monitor.name, status);
            if o.transition == Transition::Opened {
                print_alert(o);
            }
        }
        Err(e) => println!("  [{}] {}: {} {}", when, run.monitor.name, "error".red(), e),
    }
}
