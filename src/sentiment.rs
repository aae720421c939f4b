//! Fear & Greed index reader (Alternative.me).
//!
//! This is the one source whose failure aborts the run: a missing `data`
//! field or a non-numeric reading is an error, while fewer than three
//! records simply leave the trailing readings empty.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};

pub const FNG_URL: &str = "https://api.alternative.me/fng/";

/// now, yesterday, last week
pub const HISTORY_POINTS: usize = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct FearGreedResponse {
    pub data: Vec<FearGreedRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FearGreedRecord {
    #[serde(deserialize_with = "deserialize_index_value")]
    pub value: u8,
    #[serde(default)]
    pub value_classification: String,
}

/// The API ships the value as a string ("65"); accept numbers as well.
fn deserialize_index_value<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlexibleIndex {
        Int(u64),
        Float(f64),
        Str(String),
    }

    let raw = match FlexibleIndex::deserialize(deserializer)? {
        FlexibleIndex::Int(i) => i,
        FlexibleIndex::Float(f) if f.is_finite() && f >= 0.0 => f.round() as u64,
        FlexibleIndex::Float(f) => {
            return Err(serde::de::Error::custom(format!("invalid index value {f}")))
        }
        FlexibleIndex::Str(s) => s.trim().parse().map_err(serde::de::Error::custom)?,
    };
    u8::try_from(raw)
        .ok()
        .filter(|v| *v <= 100)
        .ok_or_else(|| serde::de::Error::custom(format!("index value {raw} out of 0..=100")))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentimentReading {
    pub value: u8,
    pub classification: String,
}

/// Ordered triple of readings; absent positions stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentimentSnapshot {
    pub now: Option<SentimentReading>,
    pub yesterday: Option<SentimentReading>,
    pub last_week: Option<SentimentReading>,
}

impl SentimentSnapshot {
    /// Records arrive most-recent first.
    pub fn from_records(records: &[FearGreedRecord]) -> Self {
        let at = |i: usize| {
            records.get(i).map(|r| SentimentReading {
                value: r.value,
                classification: r.value_classification.clone(),
            })
        };
        Self {
            now: at(0),
            yesterday: at(1),
            last_week: at(2),
        }
    }
}

/// Parse a raw response body; structural problems are errors.
pub fn parse_fear_greed(body: &str) -> Result<SentimentSnapshot> {
    let resp: FearGreedResponse =
        serde_json::from_str(body).context("parsing fear & greed response")?;
    Ok(SentimentSnapshot::from_records(&resp.data))
}

#[async_trait]
pub trait SentimentSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<SentimentSnapshot>;
    fn name(&self) -> &'static str;
}

pub struct AlternativeMeClient {
    client: Client,
}

impl AlternativeMeClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SentimentSource for AlternativeMeClient {
    async fn fetch_snapshot(&self) -> Result<SentimentSnapshot> {
        let body = self
            .client
            .get(FNG_URL)
            .query(&[("limit", HISTORY_POINTS)])
            .send()
            .await
            .context("fear & greed get()")?
            .error_for_status()
            .context("fear & greed non-2xx")?
            .text()
            .await
            .context("fear & greed .text()")?;
        parse_fear_greed(&body)
    }

    fn name(&self) -> &'static str {
        "alternative.me"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_records_fill_the_triple() {
        let body = r#"{"name":"Fear and Greed Index","data":[
            {"value":"65","value_classification":"Greed","timestamp":"1"},
            {"value":"58","value_classification":"Greed","timestamp":"2"},
            {"value":"40","value_classification":"Fear","timestamp":"3"}
        ]}"#;
        let s = parse_fear_greed(body).unwrap();
        assert_eq!(s.now.as_ref().map(|r| r.value), Some(65));
        assert_eq!(s.yesterday.as_ref().map(|r| r.value), Some(58));
        assert_eq!(
            s.last_week,
            Some(SentimentReading {
                value: 40,
                classification: "Fear".into()
            })
        );
    }

    #[test]
    fn short_history_leaves_gaps() {
        let body = r#"{"data":[{"value":12,"value_classification":"Extreme Fear"}]}"#;
        let s = parse_fear_greed(body).unwrap();
        assert!(s.now.is_some());
        assert!(s.yesterday.is_none());
        assert!(s.last_week.is_none());
    }

    #[test]
    fn empty_history_is_not_an_error() {
        let s = parse_fear_greed(r#"{"data":[]}"#).unwrap();
        assert_eq!(s, SentimentSnapshot::default());
    }

    #[test]
    fn missing_data_field_is_fatal() {
        assert!(parse_fear_greed(r#"{"metadata":{"error":"oops"}}"#).is_err());
    }

    #[test]
    fn non_numeric_value_is_fatal() {
        assert!(parse_fear_greed(r#"{"data":[{"value":"abc"}]}"#).is_err());
        assert!(parse_fear_greed(r#"{"data":[{"value":"140"}]}"#).is_err());
    }
}
