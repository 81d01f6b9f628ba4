use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::NotifyTarget;
use crate::error::{MonitorError, Result};
use crate::matcher::Matcher;

/// Page watched by a freshly created monitor
pub const DEFAULT_TARGET_URL: &str = "https://www.stc.com/products/tip-gdp";

/// Text whose presence means the page is open
pub const DEFAULT_SEARCH_TEXT: &str = "now open";

/// How often a monitor is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum CheckInterval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    #[default]
    Hourly,
}

impl CheckInterval {
    pub const ALL: [CheckInterval; 5] = [
        CheckInterval::OneMinute,
        CheckInterval::FiveMinutes,
        CheckInterval::FifteenMinutes,
        CheckInterval::ThirtyMinutes,
        CheckInterval::Hourly,
    ];

    pub fn minutes(self) -> u64 {
        match self {
            CheckInterval::OneMinute => 1,
            CheckInterval::FiveMinutes => 5,
            CheckInterval::FifteenMinutes => 15,
            CheckInterval::ThirtyMinutes => 30,
            CheckInterval::Hourly => 60,
        }
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.minutes() * 60)
    }

    pub fn from_minutes(minutes: u64) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|i| i.minutes() == minutes)
            .ok_or_else(|| MonitorError::InvalidInterval(format!(
                "{} minutes is not supported", minutes
            )))
    }

    /// Parse "15", "15m", "1h" or "60m"
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        let minutes = if let Some(h) = s.strip_suffix('h') {
            h.parse::<u64>().ok().and_then(|h| h.checked_mul(60))
        } else if let Some(m) = s.strip_suffix('m') {
            m.parse::<u64>().ok()
        } else {
            s.parse::<u64>().ok()
        };
        match minutes {
            Some(m) => Self::from_minutes(m),
            None => Err(MonitorError::InvalidInterval(format!("'{}' is not a number of minutes", s))),
        }
    }
}

impl TryFrom<u64> for CheckInterval {
    type Error = MonitorError;

    fn try_from(minutes: u64) -> Result<Self> {
        Self::from_minutes(minutes)
    }
}

impl From<CheckInterval> for u64 {
    fn from(interval: CheckInterval) -> u64 {
        interval.minutes()
    }
}

impl fmt::Display for CheckInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckInterval::OneMinute => write!(f, "1 minute"),
            CheckInterval::Hourly => write!(f, "1 hour"),
            other => write!(f, "{} minutes", other.minutes()),
        }
    }
}

/// How the search text is compared against page content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MatchMode {
    /// Plain substring search
    Substring {
        #[serde(default)]
        case_sensitive: bool,
    },
    /// Regular expression search
    Regex,
}

impl Default for MatchMode {
    fn default() -> Self {
        Self::Substring { case_sensitive: false }
    }
}

/// What part of the page the search text is matched against
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Extraction {
    /// Visible text of the page body
    #[default]
    Text,
    /// Raw response body
    Html,
    /// Text of elements matching a CSS selector
    Selector { selector: String },
}

/// A monitor definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Unique identifier
    pub id: Uuid,
    /// User-friendly name
    pub name: String,
    /// URL to check
    pub target_url: String,
    /// Text (or pattern) whose presence means "open"
    pub search_text: String,
    #[serde(default)]
    pub match_mode: MatchMode,
    #[serde(default)]
    pub extraction: Extraction,
    #[serde(default)]
    pub interval: CheckInterval,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Per-monitor notification target (overrides global default)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_target: Option<NotifyTarget>,
    /// Custom headers sent with each request
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl MonitorConfig {
    /// Create a new monitor with defaults
    pub fn new(name: String, target_url: String, search_text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            target_url,
            search_text,
            match_mode: MatchMode::default(),
            extraction: Extraction::default(),
            interval: CheckInterval::default(),
            enabled: true,
            notify_target: None,
            headers: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Validate user-editable fields
    pub fn validate(&self) -> Result<()> {
        let url = self.target_url.trim();
        if url.is_empty() {
            return Err(MonitorError::InvalidConfig("target URL must not be empty".into()));
        }
        let parsed = url::Url::parse(url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(MonitorError::InvalidConfig(format!(
                "unsupported URL scheme '{}'", parsed.scheme()
            )));
        }
        if self.name.trim().is_empty() {
            return Err(MonitorError::InvalidConfig("name must not be empty".into()));
        }
        if let Extraction::Selector { selector } = &self.extraction {
            scraper::Selector::parse(selector)
                .map_err(|e| MonitorError::InvalidConfig(format!("bad selector '{}': {}", selector, e)))?;
        }
        // Also rejects empty search text and bad regexes
        Matcher::new(&self.search_text, &self.match_mode)?;
        Ok(())
    }
}

/// Outcome of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    timestamp: DateTime<Utc>,
    matched: bool,
}

impl CheckResult {
    pub fn new(timestamp: DateTime<Utc>, matched: bool) -> Self {
        Self { timestamp, matched }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn matched(&self) -> bool {
        self.matched
    }

    pub fn status_label(&self) -> &'static str {
        if self.matched { "Open" } else { "Closed" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(url: &str, search: &str) -> MonitorConfig {
        MonitorConfig::new("TIP GDP".into(), url.into(), search.into())
    }

    #[test]
    fn test_interval_parse() {
        assert_eq!(CheckInterval::parse("1").unwrap(), CheckInterval::OneMinute);
        assert_eq!(CheckInterval::parse("15m").unwrap(), CheckInterval::FifteenMinutes);
        assert_eq!(CheckInterval::parse("1h").unwrap(), CheckInterval::Hourly);
        assert_eq!(CheckInterval::parse("60").unwrap(), CheckInterval::Hourly);
        assert!(matches!(CheckInterval::parse("7"), Err(MonitorError::InvalidInterval(_))));
        assert!(CheckInterval::parse("2h").is_err());
        assert!(CheckInterval::parse("soon").is_err());
        assert!(matches!(
            CheckInterval::parse("307445734561825861h"),
            Err(MonitorError::InvalidInterval(_))
        ));
    }

    #[test]
    fn test_interval_serde_rejects_unsupported() {
        assert_eq!(serde_json::to_string(&CheckInterval::ThirtyMinutes).unwrap(), "30");
        assert!(serde_json::from_str::<CheckInterval>("5").is_ok());
        assert!(serde_json::from_str::<CheckInterval>("10").is_err());
    }

    #[test]
    fn test_interval_display() {
        assert_eq!(CheckInterval::OneMinute.to_string(), "1 minute");
        assert_eq!(CheckInterval::FiveMinutes.to_string(), "5 minutes");
        assert_eq!(CheckInterval::Hourly.to_string(), "1 hour");
        assert_eq!(CheckInterval::Hourly.as_duration(), Duration::from_secs(3600));
    }

    #[test]
    fn test_new_monitor_defaults() {
        let m = monitor(DEFAULT_TARGET_URL, DEFAULT_SEARCH_TEXT);
        assert_eq!(m.interval, CheckInterval::Hourly);
        assert_eq!(m.extraction, Extraction::Text);
        assert!(m.enabled);
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        assert!(matches!(monitor("   ", "now open").validate(), Err(MonitorError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_non_http() {
        assert!(monitor("ftp://example.com", "x").validate().is_err());
        assert!(monitor("not a url", "x").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_regex() {
        let mut m = monitor("https://example.com", "(unclosed");
        m.match_mode = MatchMode::Regex;
        assert!(matches!(m.validate(), Err(MonitorError::InvalidPattern(_))));
    }

    #[test]
    fn test_validate_rejects_empty_search() {
        assert!(monitor("https://example.com", "").validate().is_err());
    }

    #[test]
    fn test_check_result_label() {
        let now = Utc::now();
        assert_eq!(CheckResult::new(now, true).status_label(), "Open");
        assert_eq!(CheckResult::new(now, false).status_label(), "Closed");
    }
}
