// tests/news_aggregate.rs
use anyhow::{anyhow, Result};
use crypto_digest::ingest::collect_news;
use crypto_digest::ingest::providers::parse_feed;
use crypto_digest::ingest::types::{FeedSource, ParsedFeed};
use std::collections::HashMap;

/// Serves fixture XML by URL; unknown URLs behave like a network failure.
struct FixtureFeeds {
    bodies: HashMap<String, String>,
}

impl FixtureFeeds {
    fn new(entries: &[(&str, &str)]) -> Self {
        let bodies = entries
            .iter()
            .map(|(url, path)| {
                let xml = std::fs::read_to_string(path).expect("fixture");
                (url.to_string(), xml)
            })
            .collect();
        Self { bodies }
    }
}

#[async_trait::async_trait]
impl FeedSource for FixtureFeeds {
    async fn fetch_feed(&self, url: &str) -> Result<ParsedFeed> {
        let body = self
            .bodies
            .get(url)
            .ok_or_else(|| anyhow!("connection refused: {url}"))?;
        parse_feed(body)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

fn urls(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn dedup_across_sources_keeps_earlier_feed() {
    let feeds = FixtureFeeds::new(&[
        ("https://coin/rss", "tests/fixtures/coin_rss.xml"),
        ("https://chain/atom", "tests/fixtures/chain_atom.xml"),
    ]);
    let batch = collect_news(&feeds, &urls(&["https://coin/rss", "https://chain/atom"]), 5).await;

    let titles: Vec<_> = batch.items.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "BTC Rallies",
            "Solana memecoins cool off",
            "Stablecoin supply hits record"
        ]
    );
    assert_eq!(batch.items[0].source, "Coin Wire");
    assert_eq!(batch.dedup, 1);
    assert!(batch.skipped.is_empty());
}

#[tokio::test]
async fn source_order_decides_which_duplicate_survives() {
    let feeds = FixtureFeeds::new(&[
        ("https://coin/rss", "tests/fixtures/coin_rss.xml"),
        ("https://chain/atom", "tests/fixtures/chain_atom.xml"),
    ]);
    let batch = collect_news(&feeds, &urls(&["https://chain/atom", "https://coin/rss"]), 5).await;
    assert_eq!(batch.items[0].title, "btc rallies");
    assert_eq!(batch.items[0].source, "Chain Brief");
}

#[tokio::test]
async fn broken_and_unreachable_feeds_are_skipped_not_fatal() {
    let feeds = FixtureFeeds::new(&[
        ("https://broken/rss", "tests/fixtures/broken_feed.xml"),
        ("https://coin/rss", "tests/fixtures/coin_rss.xml"),
    ]);
    let batch = collect_news(
        &feeds,
        &urls(&["https://broken/rss", "https://down/rss", "https://coin/rss"]),
        5,
    )
    .await;

    assert_eq!(batch.items.len(), 2);
    let skipped: Vec<_> = batch.skipped.iter().map(|s| s.source.as_str()).collect();
    assert_eq!(skipped, vec!["https://broken/rss", "https://down/rss"]);
    assert!(batch.skipped[1].reason.contains("connection refused"));
}

#[tokio::test]
async fn per_source_and_total_caps_apply() {
    let feeds = FixtureFeeds::new(&[
        ("https://coin/rss", "tests/fixtures/coin_rss.xml"),
        ("https://chain/atom", "tests/fixtures/chain_atom.xml"),
    ]);
    let batch = collect_news(&feeds, &urls(&["https://coin/rss", "https://chain/atom"]), 1).await;
    assert_eq!(batch.items.len(), 1);
    assert_eq!(batch.items[0].title, "BTC Rallies");
}
