//! Notification commands: set, show, test, quiet

use chrono::Utc;
use colored::Colorize;
use inquire::{Select, Text};

use openwatch::config::{Config, NotifyTarget, QuietHours};
use openwatch::error::{MonitorError, Result};
use openwatch::notify::{send_notification, NotificationPayload};

fn prompt_err(e: inquire::InquireError) -> MonitorError {
    MonitorError::ConfigError(e.to_string())
}

/// Both halves of a two-part target must be given together
fn pair<T>(
    first: Option<String>,
    second: Option<String>,
    names: (&str, &str),
    build: impl FnOnce(String, String) -> T,
) -> Result<Option<T>> {
    match (first, second) {
        (Some(a), Some(b)) => Ok(Some(build(a, b))),
        (Some(_), None) => Err(MonitorError::ConfigError(format!("{} requires {}", names.0, names.1))),
        (None, Some(_)) => Err(MonitorError::ConfigError(format!("{} requires {}", names.1, names.0))),
        (None, None) => Ok(None),
    }
}

/// Set up the default notification target
#[allow(clippy::too_many_arguments)]
pub fn cmd_notify_set(
    ntfy: Option<String>,
    slack: Option<String>,
    discord: Option<String>,
    gotify_server: Option<String>,
    gotify_token: Option<String>,
    telegram_token: Option<String>,
    telegram_chat: Option<String>,
    command: Option<String>,
    clear: bool,
) -> Result<()> {
    let mut config = Config::load()?;

    if clear {
        config.default_notify = None;
        config.save()?;
        println!("Notification target removed. Alerts will only be logged.");
        return Ok(());
    }

    let gotify = pair(gotify_server, gotify_token, ("--gotify-server", "--gotify-token"), |server, token| {
        NotifyTarget::Gotify { server, token }
    })?;
    let telegram = pair(telegram_token, telegram_chat, ("--telegram-token", "--telegram-chat"), |bot_token, chat_id| {
        NotifyTarget::Telegram { bot_token, chat_id }
    })?;

    let direct_target = ntfy
        .map(|topic| NotifyTarget::Ntfy { topic, server: None })
        .or_else(|| slack.map(|webhook_url| NotifyTarget::Slack { webhook_url }))
        .or_else(|| discord.map(|webhook_url| NotifyTarget::Discord { webhook_url }))
        .or(gotify)
        .or(telegram)
        .or_else(|| command.map(|command| NotifyTarget::Command { command }));

    let target = match direct_target {
        Some(target) => Some(target),
        None => {
            println!("\nNotification Setup\n");
            prompt_notification_setup()?
        }
    };

    match target {
        Some(target) => {
            config.default_notify = Some(target.clone());
            config.save()?;
            println!("Notification settings saved: {}", describe_notify_target(&target));
            println!("Send a test alert with `openwatch notify test`.");
        }
        None => println!("\n  Notification setup cancelled."),
    }

    Ok(())
}

/// Show current notification settings
pub fn cmd_notify_show() -> Result<()> {
    let config = Config::load()?;

    println!("\nNotification Settings\n");

    match &config.default_notify {
        Some(target) => println!("  Notifications: {} ({})", "Enabled".green(), describe_notify_target(target)),
        None => {
            println!("  Notifications: {}", "not configured".yellow());
            println!("  Run `openwatch notify set` to get alerted when a page opens.");
        }
    }

    match &config.quiet_hours {
        Some(quiet) => {
            let status = if quiet.is_quiet_now() {
                "ACTIVE NOW".yellow()
            } else {
                "scheduled".normal()
            };
            println!("\n  Quiet hours: {} - {} ({})", quiet.start, quiet.end, status);
        }
        None => println!("\n  Quiet hours: not configured"),
    }

    if let Ok(path) = Config::config_path() {
        println!("\n  Config file: {}", path.display());
    }
    if let Ok(dir) = Config::data_dir() {
        println!("  Alert log:   {}", dir.join("alerts.log").display());
    }

    Ok(())
}

/// Configure quiet hours
pub fn cmd_notify_quiet(start: Option<String>, end: Option<String>, disable: bool) -> Result<()> {
    let mut config = Config::load()?;

    if disable {
        config.quiet_hours = None;
        config.save()?;
        println!("Quiet hours disabled.");
        return Ok(());
    }

    let (start, end) = match (start, end) {
        (Some(s), Some(e)) => (s, e),
        (Some(_), None) | (None, Some(_)) => {
            return Err(MonitorError::ConfigError("Both --start and --end are required".into()));
        }
        (None, None) => {
            let start = Text::new("Quiet hours start time (HH:MM):")
                .with_default("22:00")
                .with_help_message("When to stop sending notifications")
                .prompt()
                .map_err(prompt_err)?;
            let end = Text::new("Quiet hours end time (HH:MM):")
                .with_default("08:00")
                .with_help_message("When to resume notifications")
                .prompt()
                .map_err(prompt_err)?;
            (start, end)
        }
    };

    for (label, value) in [("start", &start), ("end", &end)] {
        if chrono::NaiveTime::parse_from_str(value, "%H:%M").is_err() {
            return Err(MonitorError::ConfigError(format!(
                "Invalid {} time '{}'. Use HH:MM format (e.g., 22:00)",
                label, value
            )));
        }
    }

    config.quiet_hours = Some(QuietHours { start: start.clone(), end: end.clone() });
    config.save()?;
    println!("Quiet hours set: {} to {}", start, end);
    println!("Alerts will be logged but not sent during this time.");
    Ok(())
}

/// Send a test notification
pub fn cmd_notify_test() -> Result<()> {
    let config = Config::load()?;

    let Some(target) = &config.default_notify else {
        println!("\nNo notification target configured.");
        println!("Run `openwatch notify set` to configure notifications.");
        return Ok(());
    };

    println!("\nSending test notification...");

    let payload = NotificationPayload {
        monitor_id: "test".to_string(),
        monitor_name: "openwatch".to_string(),
        url: "https://example.com".to_string(),
        search_text: "now open".to_string(),
        status: "test".to_string(),
        detected_at: Utc::now(),
    };

    match send_notification(target, &payload) {
        Ok(()) => println!("  {} You'll be notified when a monitored page opens.", "Sent!".green()),
        Err(e) => println!("  {} {}", "Failed to send notification:".red(), e),
    }

    Ok(())
}

/// Interactive notification setup prompt
fn prompt_notification_setup() -> Result<Option<NotifyTarget>> {
    let options = vec![
        "ntfy.sh (easy push notifications)",
        "Gotify (self-hosted)",
        "Slack webhook",
        "Discord webhook",
        "Telegram bot",
        "Custom command",
        "Skip for now",
    ];

    let choice = Select::new("Where should alerts go when a page opens?", options)
        .prompt()
        .map_err(prompt_err)?;

    let target = match choice {
        "ntfy.sh (easy push notifications)" => {
            let topic = Text::new("ntfy topic name:")
                .with_default("openwatch-alerts")
                .with_help_message("Get notifications at ntfy.sh/<topic> or via the ntfy app")
                .prompt()
                .map_err(prompt_err)?;
            println!("\n  Subscribe in the ntfy app or visit: https://ntfy.sh/{}", topic);
            NotifyTarget::Ntfy { topic, server: None }
        }
        "Gotify (self-hosted)" => {
            let server = Text::new("Gotify server URL:")
                .with_help_message("e.g., https://gotify.example.com")
                .prompt()
                .map_err(prompt_err)?;
            let token = Text::new("Gotify application token:").prompt().map_err(prompt_err)?;
            NotifyTarget::Gotify { server, token }
        }
        "Slack webhook" => {
            let webhook_url = Text::new("Slack webhook URL:").prompt().map_err(prompt_err)?;
            NotifyTarget::Slack { webhook_url }
        }
        "Discord webhook" => {
            let webhook_url = Text::new("Discord webhook URL:")
                .with_help_message("Server Settings > Integrations > Webhooks")
                .prompt()
                .map_err(prompt_err)?;
            NotifyTarget::Discord { webhook_url }
        }
        "Telegram bot" => {
            let bot_token = Text::new("Telegram bot token:").prompt().map_err(prompt_err)?;
            let chat_id = Text::new("Telegram chat ID:").prompt().map_err(prompt_err)?;
            NotifyTarget::Telegram { bot_token, chat_id }
        }
        "Custom command" => {
            let command = Text::new("Command to run:")
                .with_help_message("Receives the alert as JSON on stdin, e.g. notify-send 'Page open'")
                .prompt()
                .map_err(prompt_err)?;
            NotifyTarget::Command { command }
        }
        _ => return Ok(None),
    };

    Ok(Some(target))
}

/// Human-readable description of a target (secrets omitted)
pub fn describe_notify_target(target: &NotifyTarget) -> String {
    match target {
        NotifyTarget::Command { command } => format!("command: {}", command),
        NotifyTarget::Ntfy { topic, server } => match server {
            Some(server) => format!("ntfy: {}/{}", server, topic),
            None => format!("ntfy: {}", topic),
        },
        NotifyTarget::Slack { .. } => "Slack webhook".to_string(),
        NotifyTarget::Discord { .. } => "Discord webhook".to_string(),
        NotifyTarget::Gotify { server, .. } => format!("Gotify: {}", server),
        NotifyTarget::Telegram { chat_id, .. } => format!("Telegram chat {}", chat_id),
    }
}
