use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] ureq::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] refinery::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Invalid monitor configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Extraction failed: {0}")]
    ExtractionError(String),

    #[error("Monitor not found: {0}")]
    MonitorNotFound(String),

    #[error("Monitor name already exists: {0}")]
    DuplicateName(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Notification failed: {0}")]
    NotificationError(String),
}

impl MonitorError {
    /// Get an actionable hint for how to resolve this error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            MonitorError::HttpError(_) => Some(
                "Check your internet connection and the monitor URL:\n  openwatch show \"<monitor>\""
            ),
            MonitorError::MonitorNotFound(_) => Some(
                "Run `openwatch list` to see available monitors"
            ),
            MonitorError::DuplicateName(_) => Some(
                "Choose a different name, or edit the existing monitor:\n  openwatch edit \"<name>\" --url <new-url>"
            ),
            MonitorError::InvalidInterval(_) => Some(
                "Supported intervals are 1, 5, 15, 30 and 60 minutes (e.g. --interval 15)"
            ),
            MonitorError::InvalidPattern(_) => Some(
                "Check the regex syntax, or drop --regex to match plain text"
            ),
            MonitorError::NotificationError(_) => Some(
                "Check your notification settings with `openwatch notify show`\nOr reconfigure with `openwatch notify set`"
            ),
            MonitorError::ExtractionError(_) => Some(
                "Try matching the raw page instead: openwatch edit \"<monitor>\" --html"
            ),
            MonitorError::DatabaseError(_) | MonitorError::MigrationError(_) => Some(
                "Set OPENWATCH_DB to use a different database file"
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
