//! Shared helpers for the command implementations

use chrono::{DateTime, Local, Utc};

use openwatch::MonitorError;

/// Format a timestamp in local time, as shown in status and history tables
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format an optional "last checked" time
pub fn format_last_checked(ts: Option<DateTime<Utc>>) -> String {
    ts.map(format_timestamp).unwrap_or_else(|| "Never".to_string())
}

/// Truncate a string to max_len characters (not bytes), adding "..." if truncated.
/// Safe for non-ASCII content (emoji, CJK, etc).
pub fn truncate_str(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        chars[..max_len].iter().collect()
    } else {
        format!("{}...", chars[..max_len - 3].iter().collect::<String>())
    }
}

/// Extract the host from a URL, used as the default monitor name
pub fn extract_domain(url: &str) -> Option<String> {
    url::Url::parse(url).ok().and_then(|u| u.host_str().map(|h| h.to_string()))
}

/// Parse a "Name: value" header argument
pub fn parse_header(raw: &str) -> openwatch::Result<(String, String)> {
    let (name, value) = raw.split_once(':').ok_or_else(|| {
        MonitorError::InvalidConfig(format!("header '{}' must look like 'Name: value'", raw))
    })?;
    let name = name.trim();
    if name.is_empty() {
        return Err(MonitorError::InvalidConfig(format!("header '{}' has no name", raw)));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("ab", 3), "ab");
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("https://www.stc.com/products/tip-gdp"),
            Some("www.stc.com".to_string())
        );
        assert_eq!(extract_domain("not a url"), None);
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Cookie: session=abc: def").unwrap(),
            ("Cookie".to_string(), "session=abc: def".to_string())
        );
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn test_last_checked_never() {
        assert_eq!(format_last_checked(None), "Never");
    }
}
