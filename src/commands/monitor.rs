//! Monitor management commands: add, list, show, edit, pause/resume, remove

use colored::Colorize;
use inquire::Confirm;

use openwatch::config::Config;
use openwatch::db::Database;
use openwatch::error::{MonitorError, Result};
use openwatch::monitor::{CheckInterval, Extraction, MatchMode, MonitorConfig};

use crate::utils::{extract_domain, format_last_checked, format_timestamp, parse_header, truncate_str};

/// Add a monitor
#[allow(clippy::too_many_arguments)]
pub fn cmd_add(
    url: String,
    name: Option<String>,
    search: String,
    regex: bool,
    case_sensitive: bool,
    interval: Option<String>,
    selector: Option<String>,
    html: bool,
    headers: Vec<String>,
) -> Result<()> {
    let db = Database::open()?;
    let config = Config::load()?;

    let url = url.trim().to_string();
    let name = name.unwrap_or_else(|| extract_domain(&url).unwrap_or_else(|| url.clone()));

    let mut monitor = MonitorConfig::new(name, url, search);
    monitor.match_mode = if regex {
        MatchMode::Regex
    } else {
        MatchMode::Substring { case_sensitive }
    };
    monitor.extraction = match (selector, html) {
        (Some(selector), _) => Extraction::Selector { selector },
        (None, true) => Extraction::Html,
        (None, false) => Extraction::Text,
    };
    monitor.interval = match interval {
        Some(s) => CheckInterval::parse(&s)?,
        None => CheckInterval::from_minutes(config.default_interval_minutes)?,
    };
    for raw in &headers {
        let (key, value) = parse_header(raw)?;
        monitor.headers.insert(key, value);
    }

    monitor.validate()?;
    db.insert_monitor(&monitor)?;

    println!("\n{} {}", "Added".green().bold(), monitor.name.bold());
    println!("  URL:      {}", monitor.target_url);
    println!("  Search:   \"{}\"", monitor.search_text);
    println!("  Interval: every {}", monitor.interval);
    println!("\n  Check it now with: openwatch check \"{}\"", monitor.name);
    Ok(())
}

/// List all monitors
pub fn cmd_list(json: bool) -> Result<()> {
    let db = Database::open()?;
    let monitors = db.list_monitors()?;

    if json {
        let mut rows = Vec::with_capacity(monitors.len());
        for monitor in &monitors {
            rows.push(serde_json::json!({
                "monitor": monitor,
                "state": db.load_state(&monitor.id)?,
            }));
        }
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if monitors.is_empty() {
        println!("No monitors configured. Run `openwatch add <url>` to create one.");
        return Ok(());
    }

    println!("\nMonitors:\n");

    let max_name_len = monitors.iter().map(|m| m.name.chars().count()).max().unwrap_or(20).min(30);

    for monitor in monitors {
        let state = db.load_state(&monitor.id)?;

        let enabled = if monitor.enabled { "●".green() } else { "○".yellow() };
        let status = if state.is_open {
            state.status_label().green().bold()
        } else {
            state.status_label().red().bold()
        };
        let name = format!("{:width$}", truncate_str(&monitor.name, max_name_len), width = max_name_len);

        println!(
            "  {} {} {:6}  {} ({}, checked {})",
            enabled,
            name.bold(),
            status,
            truncate_str(&monitor.target_url, 50).dimmed(),
            monitor.interval,
            format_last_checked(state.last_checked),
        );
    }

    println!();
    Ok(())
}

/// Show details of a specific monitor
pub fn cmd_show(id_or_name: &str, json: bool) -> Result<()> {
    let db = Database::open()?;
    let monitor = db.require_monitor(id_or_name)?;
    let state = db.load_state(&monitor.id)?;

    if json {
        let output = serde_json::json!({
            "monitor": monitor,
            "state": state,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("\nMonitor: {}\n", monitor.name.bold());
    println!("  ID:        {}", monitor.id);
    println!("  URL:       {}", monitor.target_url);
    println!("  Search:    \"{}\" ({})", monitor.search_text, describe_match_mode(&monitor.match_mode));
    println!("  Matches:   {}", describe_extraction(&monitor.extraction));
    println!("  Interval:  every {}", monitor.interval);
    println!("  Enabled:   {}", if monitor.enabled { "yes" } else { "no (paused)" });
    if monitor.notify_target.is_some() {
        println!("  Notify:    per-monitor target");
    }
    if !monitor.headers.is_empty() {
        let mut keys: Vec<_> = monitor.headers.keys().cloned().collect();
        keys.sort();
        println!("  Headers:   {}", keys.join(", "));
    }
    println!("  Created:   {}", format_timestamp(monitor.created_at));
    println!();
    println!("  Status:        {}", state.status_label());
    println!("  Last checked:  {}", format_last_checked(state.last_checked));
    if let Some(ref error) = state.last_error {
        println!("  Last error:    {}", error.red());
    }

    Ok(())
}

/// Edit a monitor
#[allow(clippy::too_many_arguments)]
pub fn cmd_edit(
    id_or_name: &str,
    name: Option<String>,
    url: Option<String>,
    search: Option<String>,
    regex: Option<bool>,
    interval: Option<String>,
    selector: Option<String>,
    html: bool,
    text: bool,
    enabled: Option<bool>,
) -> Result<()> {
    let db = Database::open()?;
    let mut monitor = db.require_monitor(id_or_name)?;
    let mut changes = Vec::new();

    if let Some(name) = name {
        if db.name_exists(&name, Some(&monitor.id))? {
            return Err(MonitorError::DuplicateName(name));
        }
        changes.push(format!("name -> {}", name));
        monitor.name = name;
    }
    if let Some(url) = url {
        changes.push(format!("url -> {}", url));
        monitor.target_url = url.trim().to_string();
    }
    if let Some(search) = search {
        changes.push(format!("search -> \"{}\"", search));
        monitor.search_text = search;
    }
    if let Some(regex) = regex {
        monitor.match_mode = if regex {
            MatchMode::Regex
        } else {
            MatchMode::default()
        };
        changes.push(format!("match -> {}", describe_match_mode(&monitor.match_mode)));
    }
    if let Some(interval) = interval {
        monitor.interval = CheckInterval::parse(&interval)?;
        changes.push(format!("interval -> {}", monitor.interval));
    }
    let extraction = match (selector, html, text) {
        (Some(selector), _, _) => Some(Extraction::Selector { selector }),
        (None, true, _) => Some(Extraction::Html),
        (None, false, true) => Some(Extraction::Text),
        (None, false, false) => None,
    };
    if let Some(extraction) = extraction {
        changes.push(format!("matches -> {}", describe_extraction(&extraction)));
        monitor.extraction = extraction;
    }
    if let Some(enabled) = enabled {
        monitor.enabled = enabled;
        changes.push(format!("enabled -> {}", enabled));
    }

    if changes.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }

    monitor.validate()?;
    db.update_monitor(&monitor)?;

    println!("Updated '{}':", monitor.name);
    for change in changes {
        println!("  {}", change);
    }
    Ok(())
}

/// Pause or resume a monitor
pub fn cmd_set_enabled(id_or_name: &str, enabled: bool) -> Result<()> {
    let db = Database::open()?;
    let mut monitor = db.require_monitor(id_or_name)?;
    monitor.enabled = enabled;
    db.update_monitor(&monitor)?;

    if enabled {
        println!("Resumed '{}'.", monitor.name);
    } else {
        println!("Paused '{}'.", monitor.name);
    }
    Ok(())
}

/// Delete a monitor
pub fn cmd_remove(id_or_name: &str, skip_confirm: bool) -> Result<()> {
    let db = Database::open()?;
    let monitor = db.require_monitor(id_or_name)?;

    if !skip_confirm {
        let confirmed = Confirm::new(&format!("Delete '{}' and its history?", monitor.name))
            .with_default(false)
            .prompt()
            .map_err(|e| MonitorError::ConfigError(e.to_string()))?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    db.delete_monitor(&monitor.id)?;
    println!("Deleted '{}'.", monitor.name);
    Ok(())
}

fn describe_match_mode(mode: &MatchMode) -> &'static str {
    match mode {
        MatchMode::Substring { case_sensitive: true } => "text, case-sensitive",
        MatchMode::Substring { case_sensitive: false } => "text",
        MatchMode::Regex => "regex",
    }
}

fn describe_extraction(extraction: &Extraction) -> String {
    match extraction {
        Extraction::Text => "visible page text".to_string(),
        Extraction::Html => "raw HTML".to_string(),
        Extraction::Selector { selector } => format!("elements matching {}", selector),
    }
}
