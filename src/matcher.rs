use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::error::{MonitorError, Result};
use crate::fetch::PageContent;
use crate::monitor::{Extraction, MatchMode};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").expect("Invalid whitespace regex")
});

/// A compiled search predicate
#[derive(Debug, Clone)]
pub enum Matcher {
    Substring { needle: String, case_sensitive: bool },
    Pattern(Regex),
}

impl Matcher {
    pub fn new(search_text: &str, mode: &MatchMode) -> Result<Self> {
        if search_text.is_empty() {
            return Err(MonitorError::InvalidPattern("search text must not be empty".into()));
        }

        match mode {
            MatchMode::Substring { case_sensitive: true } => Ok(Matcher::Substring {
                needle: search_text.to_string(),
                case_sensitive: true,
            }),
            MatchMode::Substring { case_sensitive: false } => Ok(Matcher::Substring {
                needle: search_text.to_lowercase(),
                case_sensitive: false,
            }),
            MatchMode::Regex => Regex::new(search_text)
                .map(Matcher::Pattern)
                .map_err(|e| MonitorError::InvalidPattern(e.to_string())),
        }
    }

    pub fn is_match(&self, content: &str) -> bool {
        match self {
            Matcher::Substring { needle, case_sensitive: true } => content.contains(needle.as_str()),
            Matcher::Substring { needle, case_sensitive: false } => {
                content.to_lowercase().contains(needle.as_str())
            }
            Matcher::Pattern(re) => re.is_match(content),
        }
    }
}

/// Pull out the part of the page the predicate runs against
pub fn extract(content: &PageContent, extraction: &Extraction) -> Result<String> {
    match extraction {
        Extraction::Html => Ok(content.body.clone()),
        Extraction::Text => Ok(visible_text(&content.body)),
        Extraction::Selector { selector } => extract_selector(&content.body, selector),
    }
}

/// Visible text of `<body>`, falling back to the whole document for fragments
fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let text = match Selector::parse("body").ok().and_then(|s| document.select(&s).next()) {
        Some(body) => body.text().collect::<Vec<_>>().join(" "),
        None => document.root_element().text().collect::<Vec<_>>().join(" "),
    };
    collapse_whitespace(&text)
}

fn extract_selector(html: &str, selector: &str) -> Result<String> {
    let parsed = Selector::parse(selector)
        .map_err(|e| MonitorError::ExtractionError(format!("invalid selector '{}': {}", selector, e)))?;
    let document = Html::parse_document(html);

    let parts: Vec<String> = document
        .select(&parsed)
        .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
        .filter(|t| !t.is_empty())
        .collect();

    Ok(parts.join("\n"))
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}
