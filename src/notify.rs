use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use chrono::{DateTime, Local, Timelike, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{Config, NotifyTarget, QuietHours};
use crate::error::{MonitorError, Result};
use crate::monitor::{CheckResult, MonitorConfig};

/// Alert payload sent to all targets
#[derive(Debug, Clone, Serialize)]
pub struct NotificationPayload {
    pub monitor_id: String,
    pub monitor_name: String,
    pub url: String,
    pub search_text: String,
    pub status: String,
    pub detected_at: DateTime<Utc>,
}

impl NotificationPayload {
    /// Payload for a monitor that just opened
    pub fn opened(monitor: &MonitorConfig, result: &CheckResult) -> Self {
        Self {
            monitor_id: monitor.id.to_string(),
            monitor_name: monitor.name.clone(),
            url: monitor.target_url.clone(),
            search_text: monitor.search_text.clone(),
            status: "open".to_string(),
            detected_at: result.timestamp(),
        }
    }

    pub fn title(&self) -> String {
        format!("{} Alert", self.monitor_name)
    }

    pub fn message(&self) -> String {
        format!(
            "{} is now OPEN!\n\nFound \"{}\" at {}\n\n{}",
            self.monitor_name,
            self.search_text,
            self.detected_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            self.url
        )
    }
}

/// What happened to an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Inside quiet hours; logged only
    Suppressed,
    /// No target configured; logged only
    LoggedOnly,
}

/// Sends the one-shot "now open" alert
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    target: Option<NotifyTarget>,
    quiet_hours: Option<QuietHours>,
    log_path: Option<PathBuf>,
}

impl Notifier {
    pub fn new(target: Option<NotifyTarget>) -> Self {
        Self { target, quiet_hours: None, log_path: None }
    }

    /// Notifier for a monitor: its own target wins over the global default
    pub fn for_monitor(config: &Config, monitor: &MonitorConfig) -> Self {
        let target = monitor.notify_target.clone().or_else(|| config.default_notify.clone());
        Self {
            target,
            quiet_hours: config.quiet_hours.clone(),
            log_path: Config::data_dir().ok().map(|d| d.join("alerts.log")),
        }
    }

    pub fn with_quiet_hours(mut self, quiet_hours: Option<QuietHours>) -> Self {
        self.quiet_hours = quiet_hours;
        self
    }

    pub fn with_log_path(mut self, path: Option<PathBuf>) -> Self {
        self.log_path = path;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<&NotifyTarget> {
        self.target.as_ref()
    }

    /// Alert that `monitor` has opened
    pub fn notify_opened(&self, monitor: &MonitorConfig, result: &CheckResult) -> Result<Delivery> {
        self.deliver(&NotificationPayload::opened(monitor, result))
    }

    /// Deliver an arbitrary payload, honouring quiet hours
    pub fn deliver(&self, payload: &NotificationPayload) -> Result<Delivery> {
        let now = Local::now();
        self.deliver_at(payload, now.hour(), now.minute())
    }

    fn deliver_at(&self, payload: &NotificationPayload, hour: u32, minute: u32) -> Result<Delivery> {
        if self.quiet_hours.as_ref().is_some_and(|q| q.contains(hour, minute)) {
            info!(monitor = %payload.monitor_name, "alert suppressed by quiet hours");
            self.log_alert(payload, "QUIET_HOURS_SUPPRESSED");
            return Ok(Delivery::Suppressed);
        }

        let Some(target) = &self.target else {
            self.log_alert(payload, "none");
            return Ok(Delivery::LoggedOnly);
        };

        self.log_alert(payload, target.kind());
        send_notification(target, payload)?;
        info!(monitor = %payload.monitor_name, target = target.kind(), "alert sent");
        Ok(Delivery::Sent)
    }

    /// Append the alert to the log file; failures are only warned about
    fn log_alert(&self, payload: &NotificationPayload, target_type: &str) {
        let Some(path) = &self.log_path else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let entry = format!(
            "\n{}\n{}\nMonitor: {} | Target: {}\n{}\n{}\n",
            "=".repeat(60),
            payload.detected_at.format("%Y-%m-%d %H:%M:%S UTC"),
            payload.monitor_name,
            target_type,
            "-".repeat(40),
            payload.message(),
        );
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(entry.as_bytes()));
        if let Err(e) = written {
            warn!(path = %path.display(), error = %e, "could not write alert log");
        }
    }
}

/// Deliver `payload` to a single target, ignoring quiet hours
pub fn send_notification(target: &NotifyTarget, payload: &NotificationPayload) -> Result<()> {
    match target {
        NotifyTarget::Command { command } => send_command(command, payload),
        NotifyTarget::Ntfy { topic, server } => send_ntfy(topic, server.as_deref(), payload),
        NotifyTarget::Slack { webhook_url } => send_slack(webhook_url, payload),
        NotifyTarget::Discord { webhook_url } => send_discord(webhook_url, payload),
        NotifyTarget::Gotify { server, token } => send_gotify(server, token, payload),
        NotifyTarget::Telegram { bot_token, chat_id } => send_telegram(bot_token, chat_id, payload),
    }
}

/// Run `sh -c command` with the payload as JSON on stdin
fn send_command(command: &str, payload: &NotificationPayload) -> Result<()> {
    let json = serde_json::to_string(payload)?;

    let mut child = Command::new("sh")
        .args(["-c", command])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(json.as_bytes())?;
    }

    let output = child.wait_with_output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MonitorError::NotificationError(format!(
            "Command failed: {}",
            stderr.trim()
        )));
    }

    Ok(())
}

/// ntfy publish; `topic` may be a full URL
fn send_ntfy(topic: &str, server: Option<&str>, payload: &NotificationPayload) -> Result<()> {
    let url = if topic.starts_with("http://") || topic.starts_with("https://") {
        topic.to_string()
    } else {
        format!("{}/{}", server.unwrap_or("https://ntfy.sh").trim_end_matches('/'), topic)
    };

    ureq::post(&url)
        .header("Title", &payload.title())
        .header("Priority", "high")
        .header("Tags", "tada")
        .header("Click", &payload.url)
        .send(&payload.message())?;

    Ok(())
}

/// Slack incoming webhook
fn send_slack(webhook_url: &str, payload: &NotificationPayload) -> Result<()> {
    let title = payload.title();
    let body = payload.message();

    let slack_payload = serde_json::json!({
        "text": format!("*{}*\n{}", title, body),
        "blocks": [
            {
                "type": "header",
                "text": { "type": "plain_text", "text": title }
            },
            {
                "type": "section",
                "text": { "type": "mrkdwn", "text": body }
            }
        ]
    });

    ureq::post(webhook_url)
        .header("Content-Type", "application/json")
        .send_json(&slack_payload)?;

    Ok(())
}

/// Discord webhook embed
fn send_discord(webhook_url: &str, payload: &NotificationPayload) -> Result<()> {
    let discord_payload = serde_json::json!({
        "embeds": [
            {
                "title": payload.title(),
                "description": payload.message(),
                "url": payload.url,
                "color": 3066993, // Green
                "timestamp": payload.detected_at.to_rfc3339(),
                "footer": { "text": "openwatch" }
            }
        ]
    });

    ureq::post(webhook_url)
        .header("Content-Type", "application/json")
        .send_json(&discord_payload)?;

    Ok(())
}

/// Gotify `/message` endpoint
fn send_gotify(server: &str, token: &str, payload: &NotificationPayload) -> Result<()> {
    let url = format!("{}/message?token={}", server.trim_end_matches('/'), token);

    let gotify_payload = serde_json::json!({
        "title": payload.title(),
        "message": payload.message(),
        "priority": 8,
        "extras": {
            "client::notification": {
                "click": { "url": payload.url }
            }
        }
    });

    ureq::post(&url)
        .header("Content-Type", "application/json")
        .send_json(&gotify_payload)?;

    Ok(())
}

/// Telegram Bot API `sendMessage`
fn send_telegram(bot_token: &str, chat_id: &str, payload: &NotificationPayload) -> Result<()> {
    let url = format!("https://api.telegram.org/bot{}/sendMessage", bot_token);

    let telegram_payload = serde_json::json!({
        "chat_id": chat_id,
        "text": format!("<b>{}</b>\n\n{}", payload.title(), payload.message()),
        "parse_mode": "HTML",
    });

    ureq::post(&url)
        .header("Content-Type", "application/json")
        .send_json(&telegram_payload)?;

    Ok(())
}
