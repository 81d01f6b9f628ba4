use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{MonitorError, Result};
use crate::history::{HistoryLog, HISTORY_CAPACITY};
use crate::monitor::{CheckInterval, CheckResult, MonitorConfig};
use crate::state::MonitorState;

/// Safely convert Unix milliseconds to DateTime<Utc>, falling back to current time if invalid
fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(Utc::now)
}

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

const MONITOR_COLUMNS: &str = "id, name, target_url, search_text, match_mode, extraction,
     interval_minutes, enabled, notify_target, headers, created_at";

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database at the configured location
    pub fn open() -> Result<Self> {
        Self::open_at(&Config::db_path()?)
    }

    /// Open or create the database at a specific path
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory database (for testing and ephemeral runs)
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        embedded::migrations::runner().run(&mut conn)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    // ========== Monitor operations ==========

    /// Insert a new monitor
    pub fn insert_monitor(&self, monitor: &MonitorConfig) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO monitors (id, name, target_url, search_text, match_mode, extraction,
             interval_minutes, enabled, notify_target, headers, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                monitor.id.to_string(),
                monitor.name,
                monitor.target_url,
                monitor.search_text,
                serde_json::to_string(&monitor.match_mode)?,
                serde_json::to_string(&monitor.extraction)?,
                monitor.interval.minutes() as i64,
                monitor.enabled,
                monitor.notify_target.as_ref().map(serde_json::to_string).transpose()?,
                serde_json::to_string(&monitor.headers)?,
                monitor.created_at.timestamp_millis(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(MonitorError::DuplicateName(monitor.name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a monitor name is already in use (optionally excluding a specific monitor ID)
    pub fn name_exists(&self, name: &str, exclude_id: Option<&Uuid>) -> Result<bool> {
        let count: i64 = match exclude_id {
            Some(id) => self.conn.query_row(
                "SELECT COUNT(*) FROM monitors WHERE name = ?1 AND id != ?2",
                params![name, id.to_string()],
                |row| row.get(0),
            )?,
            None => self.conn.query_row(
                "SELECT COUNT(*) FROM monitors WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )?,
        };
        Ok(count > 0)
    }

    /// Get a monitor by ID, ID prefix, or name
    pub fn get_monitor(&self, id_or_name: &str) -> Result<Option<MonitorConfig>> {
        let exact = self.conn.query_row(
            &format!("SELECT {} FROM monitors WHERE id = ?1 OR name = ?1", MONITOR_COLUMNS),
            params![id_or_name],
            monitor_from_row,
        ).optional()?;
        if exact.is_some() || id_or_name.len() < 4 {
            return Ok(exact);
        }

        // Short ID prefixes as printed by `list`
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM monitors WHERE substr(id, 1, length(?1)) = ?1 LIMIT 2",
            MONITOR_COLUMNS
        ))?;
        let mut matches = stmt
            .query_map(params![id_or_name], monitor_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(if matches.len() == 1 { matches.pop() } else { None })
    }

    /// Get a monitor or fail with `MonitorNotFound`
    pub fn require_monitor(&self, id_or_name: &str) -> Result<MonitorConfig> {
        self.get_monitor(id_or_name)?
            .ok_or_else(|| MonitorError::MonitorNotFound(id_or_name.to_string()))
    }

    /// List all monitors, oldest first
    pub fn list_monitors(&self) -> Result<Vec<MonitorConfig>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM monitors ORDER BY created_at ASC",
            MONITOR_COLUMNS
        ))?;
        let monitors = stmt
            .query_map([], monitor_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(monitors)
    }

    /// Update an existing monitor
    pub fn update_monitor(&self, monitor: &MonitorConfig) -> Result<()> {
        let result = self.conn.execute(
            "UPDATE monitors SET name = ?1, target_url = ?2, search_text = ?3, match_mode = ?4,
             extraction = ?5, interval_minutes = ?6, enabled = ?7, notify_target = ?8, headers = ?9
             WHERE id = ?10",
            params![
                monitor.name,
                monitor.target_url,
                monitor.search_text,
                serde_json::to_string(&monitor.match_mode)?,
                serde_json::to_string(&monitor.extraction)?,
                monitor.interval.minutes() as i64,
                monitor.enabled,
                monitor.notify_target.as_ref().map(serde_json::to_string).transpose()?,
                serde_json::to_string(&monitor.headers)?,
                monitor.id.to_string(),
            ],
        );

        match result {
            Ok(0) => Err(MonitorError::MonitorNotFound(monitor.id.to_string())),
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(MonitorError::DuplicateName(monitor.name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a monitor along with its state and history
    pub fn delete_monitor(&self, id: &Uuid) -> Result<()> {
        self.conn.execute("DELETE FROM monitors WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }

    // ========== State operations ==========

    /// Load the status of a monitor (closed and never checked if absent)
    pub fn load_state(&self, monitor_id: &Uuid) -> Result<MonitorState> {
        let state = self.conn.query_row(
            "SELECT is_open, last_checked, last_error FROM monitor_state WHERE monitor_id = ?1",
            params![monitor_id.to_string()],
            |row| {
                Ok(MonitorState {
                    is_open: row.get(0)?,
                    last_checked: row.get::<_, Option<i64>>(1)?.map(millis_to_datetime),
                    last_error: row.get(2)?,
                })
            },
        ).optional()?;
        Ok(state.unwrap_or_default())
    }

    /// Save the status of a monitor
    pub fn save_state(&self, monitor_id: &Uuid, state: &MonitorState) -> Result<()> {
        self.conn.execute(
            "INSERT INTO monitor_state (monitor_id, is_open, last_checked, last_error)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(monitor_id) DO UPDATE SET is_open = ?2, last_checked = ?3, last_error = ?4",
            params![
                monitor_id.to_string(),
                state.is_open,
                state.last_checked.map(|t| t.timestamp_millis()),
                state.last_error,
            ],
        )?;
        Ok(())
    }

    // ========== History operations ==========

    /// Record a check result, keeping only the most recently recorded entries per monitor
    pub fn insert_check(&self, monitor_id: &Uuid, result: &CheckResult) -> Result<()> {
        let id = monitor_id.to_string();
        self.conn.execute(
            "INSERT INTO checks (monitor_id, checked_at, matched) VALUES (?1, ?2, ?3)",
            params![id, result.timestamp().timestamp_millis(), result.matched()],
        )?;
        self.conn.execute(
            "DELETE FROM checks WHERE monitor_id = ?1 AND id NOT IN (
                SELECT id FROM checks WHERE monitor_id = ?1
                ORDER BY id DESC LIMIT ?2
             )",
            params![id, HISTORY_CAPACITY as i64],
        )?;
        Ok(())
    }

    /// Load the check history of a monitor, most recently recorded first
    pub fn load_history(&self, monitor_id: &Uuid) -> Result<HistoryLog> {
        let mut stmt = self.conn.prepare(
            "SELECT checked_at, matched FROM checks WHERE monitor_id = ?1
             ORDER BY id DESC LIMIT ?2",
        )?;
        let results = stmt
            .query_map(params![monitor_id.to_string(), HISTORY_CAPACITY as i64], |row| {
                Ok(CheckResult::new(millis_to_datetime(row.get(0)?), row.get(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(HistoryLog::from_results(results))
    }
}

fn monitor_from_row(row: &Row<'_>) -> rusqlite::Result<MonitorConfig> {
    let id: String = row.get(0)?;
    let match_mode: String = row.get(4)?;
    let extraction: String = row.get(5)?;
    let interval_minutes: i64 = row.get(6)?;
    let notify_target: Option<String> = row.get(8)?;
    let headers: String = row.get(9)?;

    Ok(MonitorConfig {
        id: Uuid::parse_str(&id).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?,
        name: row.get(1)?,
        target_url: row.get(2)?,
        search_text: row.get(3)?,
        match_mode: serde_json::from_str(&match_mode).unwrap_or_default(),
        extraction: serde_json::from_str(&extraction).unwrap_or_default(),
        interval: CheckInterval::from_minutes(interval_minutes.max(0) as u64).unwrap_or_default(),
        enabled: row.get(7)?,
        notify_target: notify_target.and_then(|s| serde_json::from_str(&s).ok()),
        headers: serde_json::from_str(&headers).unwrap_or_default(),
        created_at: millis_to_datetime(row.get(10)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{Extraction, MatchMode};
    use chrono::Duration;

    fn make_monitor(name: &str) -> MonitorConfig {
        MonitorConfig::new(name.to_string(), "https://example.com".to_string(), "now open".to_string())
    }

    #[test]
    fn test_monitor_crud() {
        let db = Database::open_in_memory().unwrap();

        let mut monitor = make_monitor("TIP GDP");
        monitor.match_mode = MatchMode::Regex;
        monitor.extraction = Extraction::Selector { selector: ".status".into() };
        monitor.interval = CheckInterval::FiveMinutes;
        monitor.headers.insert("Cookie".into(), "a=b".into());
        db.insert_monitor(&monitor).unwrap();

        let loaded = db.get_monitor("TIP GDP").unwrap().unwrap();
        assert_eq!(loaded.id, monitor.id);
        assert_eq!(loaded.match_mode, MatchMode::Regex);
        assert_eq!(loaded.extraction, monitor.extraction);
        assert_eq!(loaded.interval, CheckInterval::FiveMinutes);
        assert_eq!(loaded.headers.get("Cookie").map(String::as_str), Some("a=b"));

        let prefix = &monitor.id.to_string()[..8];
        assert_eq!(db.get_monitor(prefix).unwrap().unwrap().id, monitor.id);

        let mut edited = loaded.clone();
        edited.enabled = false;
        edited.search_text = "applications open".into();
        db.update_monitor(&edited).unwrap();
        let reloaded = db.require_monitor(&monitor.id.to_string()).unwrap();
        assert!(!reloaded.enabled);
        assert_eq!(reloaded.search_text, "applications open");

        assert_eq!(db.list_monitors().unwrap().len(), 1);

        db.delete_monitor(&monitor.id).unwrap();
        assert!(db.get_monitor("TIP GDP").unwrap().is_none());
        assert!(matches!(
            db.require_monitor("TIP GDP"),
            Err(MonitorError::MonitorNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_name() {
        let db = Database::open_in_memory().unwrap();
        db.insert_monitor(&make_monitor("dup")).unwrap();
        assert!(db.name_exists("dup", None).unwrap());
        assert!(matches!(
            db.insert_monitor(&make_monitor("dup")),
            Err(MonitorError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_state_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        let monitor = make_monitor("state");
        db.insert_monitor(&monitor).unwrap();

        assert_eq!(db.load_state(&monitor.id).unwrap(), MonitorState::default());

        let state = MonitorState {
            is_open: true,
            last_checked: Some(millis_to_datetime(Utc::now().timestamp_millis())),
            last_error: Some("timeout".into()),
        };
        db.save_state(&monitor.id, &state).unwrap();
        assert_eq!(db.load_state(&monitor.id).unwrap(), state);
    }

    #[test]
    fn test_history_is_pruned_and_ordered() {
        let db = Database::open_in_memory().unwrap();
        let monitor = make_monitor("history");
        db.insert_monitor(&monitor).unwrap();

        let t0 = Utc::now();
        for i in 0..13 {
            let result = CheckResult::new(t0 + Duration::seconds(i), i == 12);
            db.insert_check(&monitor.id, &result).unwrap();
        }

        let count: i64 = db.conn
            .query_row("SELECT COUNT(*) FROM checks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, HISTORY_CAPACITY as i64);

        let history = db.load_history(&monitor.id).unwrap();
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert!(history.latest().unwrap().matched());
        let oldest = history.iter().last().unwrap();
        assert_eq!(oldest.timestamp().timestamp(), (t0 + Duration::seconds(3)).timestamp());
    }

    #[test]
    fn test_history_follows_arrival_order() {
        let db = Database::open_in_memory().unwrap();
        let monitor = make_monitor("clock");
        db.insert_monitor(&monitor).unwrap();

        let t0 = Utc::now();
        for i in 0..10 {
            db.insert_check(&monitor.id, &CheckResult::new(t0 + Duration::seconds(i), false)).unwrap();
        }
        // Wall clock stepped back an hour
        let late = CheckResult::new(t0 - Duration::hours(1), true);
        db.insert_check(&monitor.id, &late).unwrap();

        let history = db.load_history(&monitor.id).unwrap();
        assert_eq!(history.len(), HISTORY_CAPACITY);
        let latest = history.latest().unwrap();
        assert!(latest.matched());
        assert_eq!(latest.timestamp().timestamp_millis(), late.timestamp().timestamp_millis());
        // The oldest arrival was evicted
        let oldest = history.iter().last().unwrap();
        assert_eq!(oldest.timestamp().timestamp(), (t0 + Duration::seconds(1)).timestamp());
    }

    #[test]
    fn test_prefix_lookup_is_literal() {
        let db = Database::open_in_memory().unwrap();
        let monitor = make_monitor("only");
        db.insert_monitor(&monitor).unwrap();

        assert!(db.get_monitor("%%%%").unwrap().is_none());
        assert!(db.get_monitor("____").unwrap().is_none());
        let prefix = &monitor.id.to_string()[..6];
        assert_eq!(db.get_monitor(prefix).unwrap().unwrap().id, monitor.id);
    }

    #[test]
    fn test_corrupt_id_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        let monitor = make_monitor("corrupt");
        db.insert_monitor(&monitor).unwrap();
        db.conn
            .execute("UPDATE monitors SET id = 'not-a-uuid' WHERE name = 'corrupt'", [])
            .unwrap();

        assert!(matches!(
            db.get_monitor("corrupt"),
            Err(MonitorError::DatabaseError(rusqlite::Error::FromSqlConversionFailure(..)))
        ));
    }

    #[test]
    fn test_delete_cascades() {
        let db = Database::open_in_memory().unwrap();
        let monitor = make_monitor("cascade");
        db.insert_monitor(&monitor).unwrap();
        db.insert_check(&monitor.id, &CheckResult::new(Utc::now(), false)).unwrap();
        db.save_state(&monitor.id, &MonitorState::default()).unwrap();

        db.delete_monitor(&monitor.id).unwrap();
        assert!(db.load_history(&monitor.id).unwrap().is_empty());
    }
}
