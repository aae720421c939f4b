use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use super::types::{RawPair, TokenPairsResponse};
use super::PairSource;

pub const DEXSCREENER_TOKENS_URL: &str = "https://api.dexscreener.com/latest/dex/tokens";

/// Dexscreener token lookup. One GET per watched address, no batching.
pub struct DexscreenerClient {
    client: Client,
}

impl DexscreenerClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Parse a `/tokens/{address}` body; `"pairs": null` yields an empty list.
pub fn parse_token_pairs(body: &str) -> Result<Vec<RawPair>> {
    let resp: TokenPairsResponse =
        serde_json::from_str(body).context("parsing dexscreener response")?;
    Ok(resp.pairs.unwrap_or_default())
}

#[async_trait]
impl PairSource for DexscreenerClient {
    async fn fetch_pairs(&self, address: &str) -> Result<Vec<RawPair>> {
        let url = format!("{DEXSCREENER_TOKENS_URL}/{}", address.trim());
        let body = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("dexscreener get() {address}"))?
            .error_for_status()
            .context("dexscreener non-2xx")?
            .text()
            .await
            .context("dexscreener .text()")?;
        parse_token_pairs(&body)
    }

    fn name(&self) -> &'static str {
        "dexscreener"
    }
}
