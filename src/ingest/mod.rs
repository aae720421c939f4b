// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::types::{FeedSource, NewsItem, ParsedFeed, Skipped, SourceOutcome};
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

pub const SUMMARY_MAX_CHARS: usize = 150;
pub const ELLIPSIS: &str = "...";
pub const UNKNOWN_SOURCE: &str = "未知来源";

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Strip markup tags, decode entities, collapse whitespace, trim.
pub fn clean_markup(s: &str) -> String {
    // 1) Strip HTML tags
    let out = RE_TAGS.replace_all(s, "");

    // 2) HTML entity decode; runs after stripping, so escaped markup stays literal text
    let out = html_escape::decode_html_entities(&out);

    // 3) Collapse whitespace, including NBSP
    RE_WS.replace_all(&out, " ").trim().to_string()
}

/// Cap at `max` chars; over-long text gets [`ELLIPSIS`] appended.
pub fn truncate_summary(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Turn one parsed feed into at most `max_items` news items.
///
/// The cap applies to raw entries, so entries dropped for an empty title
/// still count against it.
pub fn items_from_feed(feed: &ParsedFeed, max_items: usize) -> Vec<NewsItem> {
    let source = feed
        .title
        .as_deref()
        .map(clean_markup)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

    feed.entries
        .iter()
        .take(max_items)
        .filter_map(|e| {
            let title = clean_markup(e.title.as_deref().unwrap_or_default());
            if title.is_empty() {
                return None;
            }
            let summary = clean_markup(e.summary.as_deref().unwrap_or_default());
            Some(NewsItem {
                title,
                link: e
                    .link
                    .as_deref()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string),
                summary: truncate_summary(&summary, SUMMARY_MAX_CHARS),
                source: source.clone(),
            })
        })
        .collect()
}

/// Drop later items whose lower-cased title was already seen.
/// Returns (kept, dedup_count).
pub fn dedup_by_title(items: Vec<NewsItem>) -> (Vec<NewsItem>, usize) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut keep = Vec::with_capacity(items.len());
    let mut dedup_out = 0usize;
    for it in items {
        if !seen.insert(it.title.to_lowercase()) {
            dedup_out += 1;
            continue;
        }
        keep.push(it);
    }
    (keep, dedup_out)
}

/// Concatenate per-source batches in source order, dedup, then bound.
pub fn merge_news(batches: Vec<Vec<NewsItem>>, max_items: usize) -> (Vec<NewsItem>, usize) {
    let all: Vec<NewsItem> = batches.into_iter().flatten().collect();
    let (mut kept, dedup) = dedup_by_title(all);
    kept.truncate(max_items);
    (kept, dedup)
}

#[derive(Debug, Clone, Default)]
pub struct NewsBatch {
    pub items: Vec<NewsItem>,
    pub skipped: Vec<Skipped>,
    pub dedup: usize,
}

/// Fetch every feed in order; a broken feed is skipped, never fatal.
pub async fn collect_news<S: FeedSource + ?Sized>(
    source: &S,
    urls: &[String],
    max_items: usize,
) -> NewsBatch {
    let mut batches = Vec::with_capacity(urls.len());
    let mut skipped = Vec::new();

    for url in urls {
        match SourceOutcome::from_result(url, source.fetch_feed(url).await) {
            SourceOutcome::Ok(feed) => {
                let items = items_from_feed(&feed, max_items);
                tracing::debug!(feed = %url, items = items.len(), "feed parsed");
                batches.push(items);
            }
            SourceOutcome::Skipped(s) => {
                tracing::warn!(feed = %s.source, error = %s.reason, provider = source.name(), "feed skipped");
                counter!("digest_source_skipped_total", "kind" => "feed").increment(1);
                skipped.push(s);
            }
        }
    }

    let (items, dedup) = merge_news(batches, max_items);
    counter!("digest_news_items_total").increment(items.len() as u64);
    NewsBatch {
        items,
        skipped,
        dedup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::FeedEntry;

    fn news(title: &str, source: &str) -> NewsItem {
        NewsItem {
            title: title.into(),
            link: None,
            summary: String::new(),
            source: source.into(),
        }
    }

    #[test]
    fn clean_markup_strips_tags_and_collapses_ws() {
        let s = "  <p>Hello&nbsp;&nbsp;<b>world</b></p>\n\t again ";
        assert_eq!(clean_markup(s), "Hello world again");
        assert_eq!(clean_markup(""), "");
    }

    #[test]
    fn escaped_markup_survives_as_text() {
        assert_eq!(clean_markup("use &lt;p&gt; tags &amp; more"), "use <p> tags & more");
    }

    #[test]
    fn truncation_is_char_based() {
        let long = "x".repeat(200);
        let out = truncate_summary(&long, SUMMARY_MAX_CHARS);
        assert_eq!(out.chars().count(), 153);
        assert!(out.ends_with("..."));

        let exact = "币".repeat(150);
        assert_eq!(truncate_summary(&exact, SUMMARY_MAX_CHARS), exact);
    }

    #[test]
    fn dedup_is_case_insensitive_first_wins() {
        let (kept, dedup) = dedup_by_title(vec![news("BTC Rallies", "A"), news("btc rallies", "B")]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].source, "A");
        assert_eq!(dedup, 1);
    }

    #[test]
    fn per_feed_cap_counts_raw_entries() {
        let feed = ParsedFeed {
            title: None,
            entries: vec![
                FeedEntry {
                    title: Some("<b> </b>".into()),
                    ..Default::default()
                },
                FeedEntry {
                    title: Some("One".into()),
                    link: Some("  ".into()),
                    ..Default::default()
                },
                FeedEntry {
                    title: Some("Two".into()),
                    ..Default::default()
                },
            ],
        };
        let items = items_from_feed(&feed, 2);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "One");
        assert_eq!(items[0].source, UNKNOWN_SOURCE);
        assert!(items[0].link.is_none());
    }

    #[test]
    fn merge_bounds_after_dedup() {
        let (items, dedup) = merge_news(
            vec![
                vec![news("a", "s1"), news("b", "s1")],
                vec![news("A", "s2"), news("c", "s2"), news("d", "s2")],
            ],
            3,
        );
        let titles: Vec<_> = items.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
        assert_eq!(dedup, 1);
    }
}
