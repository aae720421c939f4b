// src/ingest/types.rs
use anyhow::Result;

/// Cleaned, bounded news entry ready for composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem {
    pub title: String,        // non-empty after cleaning
    pub link: Option<String>, // None when the feed gave nothing usable
    pub summary: String,      // <= 150 chars + "..."
    pub source: String,       // feed-level title
}

/// Feed as parsed from XML, before any cleaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<FeedEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
}

/// Per-source result: isolation without losing the reason.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome<T> {
    Ok(T),
    Skipped(Skipped),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub source: String,
    pub reason: String,
}

impl<T> SourceOutcome<T> {
    /// Collapse a fallible fetch, keeping the full error chain as the reason.
    pub fn from_result(source: &str, res: Result<T>) -> Self {
        match res {
            Ok(v) => SourceOutcome::Ok(v),
            Err(e) => SourceOutcome::Skipped(Skipped {
                source: source.to_string(),
                reason: format!("{e:#}"),
            }),
        }
    }
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse one feed URL.
    async fn fetch_feed(&self, url: &str) -> Result<ParsedFeed>;
    fn name(&self) -> &'static str;
}
