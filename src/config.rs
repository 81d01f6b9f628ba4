use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{MonitorError, Result};

/// Global openwatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default notification target
    #[serde(default)]
    pub default_notify: Option<NotifyTarget>,

    /// Interval for new monitors, in minutes (1, 5, 15, 30 or 60)
    #[serde(default = "default_interval")]
    pub default_interval_minutes: u64,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Quiet hours - don't send notifications during this time
    #[serde(default)]
    pub quiet_hours: Option<QuietHours>,
}

/// Quiet hours configuration - suppress notifications during specified time range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuietHours {
    /// Start time in HH:MM format (e.g., "22:00")
    pub start: String,
    /// End time in HH:MM format (e.g., "08:00")
    pub end: String,
}

impl QuietHours {
    /// Check if the current local time is within quiet hours
    pub fn is_quiet_now(&self) -> bool {
        use chrono::{Local, Timelike};

        let now = Local::now();
        self.contains(now.hour(), now.minute())
    }

    /// Check whether `hour:minute` falls inside the window
    pub fn contains(&self, hour: u32, minute: u32) -> bool {
        use chrono::NaiveTime;

        let Some(current) = NaiveTime::from_hms_opt(hour, minute, 0) else {
            return false;
        };
        let (Ok(start), Ok(end)) = (
            NaiveTime::parse_from_str(&self.start, "%H:%M"),
            NaiveTime::parse_from_str(&self.end, "%H:%M"),
        ) else {
            return false;
        };

        // Overnight ranges (e.g., 22:00 to 08:00)
        if start > end {
            current >= start || current < end
        } else {
            current >= start && current < end
        }
    }
}

fn default_interval() -> u64 {
    60
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("Mozilla/5.0 (compatible; openwatch/{})", env!("CARGO_PKG_VERSION"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_notify: None,
            default_interval_minutes: default_interval(),
            request_timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            quiet_hours: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifyTarget {
    /// Run a shell command with the JSON payload on stdin
    Command { command: String },
    Ntfy { topic: String, server: Option<String> },
    Slack { webhook_url: String },
    Discord { webhook_url: String },
    Gotify { server: String, token: String },
    /// Telegram Bot API
    Telegram { bot_token: String, chat_id: String },
}

impl NotifyTarget {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            NotifyTarget::Command { .. } => "command",
            NotifyTarget::Ntfy { .. } => "ntfy",
            NotifyTarget::Slack { .. } => "slack",
            NotifyTarget::Discord { .. } => "discord",
            NotifyTarget::Gotify { .. } => "gotify",
            NotifyTarget::Telegram { .. } => "telegram",
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file, falling back to defaults if absent
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| MonitorError::ConfigError(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Supports OPENWATCH_CONFIG environment variable for test isolation
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("OPENWATCH_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let dirs = ProjectDirs::from("", "", "openwatch")
            .ok_or_else(|| MonitorError::ConfigError("Could not determine config directory".into()))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "openwatch")
            .ok_or_else(|| MonitorError::ConfigError("Could not determine data directory".into()))?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Get the database path
    ///
    /// Supports OPENWATCH_DB environment variable for test isolation
    pub fn db_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("OPENWATCH_DB") {
            return Ok(PathBuf::from(path));
        }
        Ok(Self::data_dir()?.join("openwatch.db"))
    }
}
