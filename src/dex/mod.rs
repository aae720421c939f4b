//! Token-pair selection: one representative pair per watched token.
//!
//! Two independent orderings live here and must not be mixed up:
//! [`select_best_pair`] picks the deepest pool for a single token
//! (liquidity, then volume, then trade count), while [`rank_by_volume`]
//! orders the selected tokens against each other for display.

pub mod client;
pub mod types;

use std::cmp::Ordering;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::WatchedToken;
use types::RawPair;

pub use client::DexscreenerClient;

/// Normalized pair; numeric absence is preserved for the formatter.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenPair {
    pub name: String,
    pub symbol: String,
    pub chain: String,
    pub dex: String,
    pub price_usd: Option<f64>,
    pub fdv: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub volume_24h: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub buys: u64,
    pub sells: u64,
    pub pair_url: Option<String>,
    pub quote_symbol: String,
}

impl TokenPair {
    pub fn txn_count(&self) -> u64 {
        self.buys.saturating_add(self.sells)
    }
}

/// A selected pair plus the operator's label for it.
///
/// Digest lines show the on-chain base symbol; the label only names the
/// token in logs.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchItem {
    pub label: String,
    pub pair: TokenPair,
}

impl WatchItem {
    pub fn new(token: &WatchedToken, pair: TokenPair) -> Self {
        let label = token
            .label
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| pair.symbol.clone());
        Self { label, pair }
    }
}

/// Lexicographic selection key, each part defaulting to zero.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PairScore {
    liquidity: f64,
    volume: f64,
    txns: u64,
}

impl PairScore {
    fn of(p: &RawPair) -> Self {
        let tx = p.txns.as_ref().and_then(|t| t.h24.as_ref());
        Self {
            liquidity: p.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0),
            volume: p.volume.as_ref().and_then(|v| v.h24).unwrap_or(0.0),
            txns: tx
                .and_then(|t| t.buys)
                .unwrap_or(0)
                .saturating_add(tx.and_then(|t| t.sells).unwrap_or(0)),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.liquidity
            .total_cmp(&other.liquidity)
            .then(self.volume.total_cmp(&other.volume))
            .then(self.txns.cmp(&other.txns))
    }
}

/// Greatest `(liquidity, volume, txns)` wins; exact ties keep the earliest pair.
pub fn select_best_pair(pairs: &[RawPair]) -> Option<&RawPair> {
    let mut best: Option<(&RawPair, PairScore)> = None;
    for p in pairs {
        let score = PairScore::of(p);
        let better = match &best {
            Some((_, top)) => score.compare(top) == Ordering::Greater,
            None => true,
        };
        if better {
            best = Some((p, score));
        }
    }
    best.map(|(p, _)| p)
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Resolve defaults once, at the boundary.
pub fn normalize_pair(p: &RawPair) -> TokenPair {
    let base = p.base_token.clone().unwrap_or_default();
    let quote = p.quote_token.clone().unwrap_or_default();
    let tx = p
        .txns
        .as_ref()
        .and_then(|t| t.h24.clone())
        .unwrap_or_default();

    TokenPair {
        name: non_empty(base.name.as_deref()).unwrap_or_else(|| "Unknown".to_string()),
        symbol: non_empty(base.symbol.as_deref()).unwrap_or_else(|| "?".to_string()),
        chain: non_empty(p.chain_id.as_deref()).unwrap_or_else(|| "?".to_string()),
        dex: non_empty(p.dex_id.as_deref()).unwrap_or_else(|| "?".to_string()),
        price_usd: p.price_usd,
        fdv: p.fdv,
        liquidity_usd: p.liquidity.as_ref().and_then(|l| l.usd),
        volume_24h: p.volume.as_ref().and_then(|v| v.h24),
        price_change_24h: p.price_change.as_ref().and_then(|c| c.h24),
        buys: tx.buys.unwrap_or(0),
        sells: tx.sells.unwrap_or(0),
        pair_url: non_empty(p.url.as_deref()),
        quote_symbol: non_empty(quote.symbol.as_deref()).unwrap_or_default(),
    }
}

/// Stable descending sort by 24h volume (absent counts as zero).
pub fn rank_by_volume(items: &mut [WatchItem]) {
    items.sort_by(|a, b| {
        let va = a.pair.volume_24h.unwrap_or(0.0);
        let vb = b.pair.volume_24h.unwrap_or(0.0);
        vb.total_cmp(&va)
    });
}

#[async_trait]
pub trait PairSource: Send + Sync {
    /// All pairs the upstream knows for `address` (possibly none).
    async fn fetch_pairs(&self, address: &str) -> Result<Vec<RawPair>>;
    fn name(&self) -> &'static str;
}

/// `Ok(None)` when the token has no pairs; errors are the caller's to isolate.
pub async fn snapshot_token<S: PairSource + ?Sized>(
    source: &S,
    token: &WatchedToken,
) -> Result<Option<WatchItem>> {
    let pairs = source.fetch_pairs(&token.address).await?;
    Ok(select_best_pair(&pairs).map(|p| WatchItem::new(token, normalize_pair(p))))
}
