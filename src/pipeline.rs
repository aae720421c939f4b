//! One digest run: fetch (sequentially), rank, compose, deliver.
//!
//! Sentiment is the only fatal source. Token and feed failures are
//! isolated per source and surface in the [`RunReport`].

use chrono::{DateTime, FixedOffset};
use metrics::counter;
use thiserror::Error;

use crate::compose::{Digest, DigestComposer, DigestInput};
use crate::config::DigestConfig;
use crate::dex::{rank_by_volume, snapshot_token, PairSource, WatchItem};
use crate::ingest::collect_news;
use crate::ingest::types::{FeedSource, Skipped, SourceOutcome};
use crate::narrative::NarrativeTopic;
use crate::notify::{DeliveryOptions, Notifier};
use crate::sentiment::SentimentSource;

#[derive(Debug, Error)]
pub enum DigestError {
    /// Lead section unavailable; nothing is sent.
    #[error("sentiment source {source_name} failed: {cause:#}")]
    Sentiment {
        source_name: &'static str,
        cause: anyhow::Error,
    },
    #[error("delivery via {notifier} failed: {cause:#}")]
    Delivery {
        notifier: &'static str,
        cause: anyhow::Error,
    },
}

/// The upstream seams a run pulls from.
pub struct Sources<'a> {
    pub sentiment: &'a dyn SentimentSource,
    pub pairs: &'a dyn PairSource,
    pub feeds: &'a dyn FeedSource,
}

/// What was dropped along the way, so silent skips stay countable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub tokens_listed: usize,
    pub tokens_without_pairs: Vec<String>,
    pub tokens_skipped: Vec<Skipped>,
    pub feeds_skipped: Vec<Skipped>,
    pub news_items: usize,
    pub news_deduplicated: usize,
}

impl RunReport {
    pub fn skipped_sources(&self) -> usize {
        self.tokens_skipped.len() + self.feeds_skipped.len()
    }
}

/// Fetch one pair per watched token, in watchlist order; failures are isolated.
pub async fn collect_tokens(
    source: &dyn PairSource,
    cfg: &DigestConfig,
    report: &mut RunReport,
) -> Vec<WatchItem> {
    let mut items = Vec::with_capacity(cfg.watchlist.len());
    for token in &cfg.watchlist {
        match SourceOutcome::from_result(&token.address, snapshot_token(source, token).await) {
            SourceOutcome::Ok(Some(item)) => {
                tracing::debug!(token = %item.label, symbol = %item.pair.symbol, dex = %item.pair.dex, "pair selected");
                items.push(item);
            }
            SourceOutcome::Ok(None) => {
                tracing::info!(token = %token.address, "no pairs for watched token");
                counter!("digest_tokens_without_pairs_total").increment(1);
                report.tokens_without_pairs.push(token.address.clone());
            }
            SourceOutcome::Skipped(s) => {
                tracing::warn!(token = %s.source, error = %s.reason, provider = source.name(), "token skipped");
                counter!("digest_source_skipped_total", "kind" => "token").increment(1);
                report.tokens_skipped.push(s);
            }
        }
    }
    items
}

/// Gather every source and compose the digest. Does not deliver.
pub async fn build_digest(
    cfg: &DigestConfig,
    topics: &[NarrativeTopic],
    sources: &Sources<'_>,
    generated_at: DateTime<FixedOffset>,
) -> Result<(Digest, RunReport), DigestError> {
    counter!("digest_runs_total").increment(1);

    let sentiment = sources
        .sentiment
        .fetch_snapshot()
        .await
        .map_err(|cause| DigestError::Sentiment {
            source_name: sources.sentiment.name(),
            cause,
        })?;

    let mut report = RunReport::default();

    let news = if cfg.news_sources.is_empty() {
        Default::default()
    } else {
        collect_news(sources.feeds, &cfg.news_sources, cfg.max_news_items).await
    };
    report.feeds_skipped = news.skipped;
    report.news_items = news.items.len();
    report.news_deduplicated = news.dedup;

    let mut tokens = collect_tokens(sources.pairs, cfg, &mut report).await;
    rank_by_volume(&mut tokens);
    report.tokens_listed = tokens.len();

    let digest = DigestComposer::from_config(cfg).compose(&DigestInput {
        generated_at,
        sentiment: &sentiment,
        tokens: &tokens,
        news: &news.items,
        topics,
    });

    Ok((digest, report))
}

/// Full run: build, then hand the text to the notifier.
pub async fn run(
    cfg: &DigestConfig,
    topics: &[NarrativeTopic],
    sources: &Sources<'_>,
    notifier: &dyn Notifier,
    generated_at: DateTime<FixedOffset>,
) -> Result<RunReport, DigestError> {
    let (digest, report) = build_digest(cfg, topics, sources, generated_at).await?;

    notifier
        .send(&digest.render(), &DeliveryOptions::default())
        .await
        .map_err(|cause| {
            counter!("digest_delivery_failures_total").increment(1);
            DigestError::Delivery {
                notifier: notifier.name(),
                cause,
            }
        })?;

    tracing::info!(
        target: "digest",
        tokens = report.tokens_listed,
        tokens_skipped = report.tokens_skipped.len(),
        tokens_without_pairs = report.tokens_without_pairs.len(),
        news = report.news_items,
        feeds_skipped = report.feeds_skipped.len(),
        notifier = notifier.name(),
        "digest delivered"
    );
    Ok(report)
}
