//! Raw Dexscreener `/latest/dex/tokens/{address}` records.
//!
//! Every nested object and numeric field is optional upstream; numerics may
//! arrive as numbers or strings (`priceUsd` is always a string).

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenPairsResponse {
    /// `null` when the address is unknown.
    #[serde(default)]
    pub pairs: Option<Vec<RawPair>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPair {
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub dex_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub base_token: Option<TokenInfo>,
    #[serde(default)]
    pub quote_token: Option<TokenInfo>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub price_usd: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub fdv: Option<f64>,
    #[serde(default)]
    pub liquidity: Option<Liquidity>,
    #[serde(default)]
    pub volume: Option<Window>,
    #[serde(default)]
    pub price_change: Option<Window>,
    #[serde(default)]
    pub txns: Option<Txns>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Liquidity {
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub usd: Option<f64>,
}

/// `{ "h24": ... }` shaped metrics (volume, priceChange).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Window {
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Txns {
    #[serde(default)]
    pub h24: Option<TxnCounts>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TxnCounts {
    #[serde(default, deserialize_with = "deserialize_lenient_u64")]
    pub buys: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_lenient_u64")]
    pub sells: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlexibleNumber {
    Float(f64),
    Int(i64),
    Str(String),
    Other(IgnoredAny),
}

/// Unparsable values collapse to `None` instead of failing the whole pair.
fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<FlexibleNumber>::deserialize(deserializer)? {
        Some(FlexibleNumber::Float(f)) if f.is_finite() => Some(f),
        Some(FlexibleNumber::Int(i)) => Some(i as f64),
        Some(FlexibleNumber::Str(s)) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        Some(FlexibleNumber::Float(_)) | Some(FlexibleNumber::Other(IgnoredAny)) | None => None,
    })
}

fn deserialize_lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_lenient_f64(deserializer)?
        .filter(|f| *f >= 0.0)
        .map(|f| f as u64))
}
