//! morning-digest — Binary Entrypoint
//! Loads config, gathers sentiment / pairs / news, composes the digest and
//! delivers it once. Meant to be run from cron or a CI schedule.

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crypto_digest::compose::beijing_now;
use crypto_digest::config::{load_config_default, load_topics_default};
use crypto_digest::dex::DexscreenerClient;
use crypto_digest::ingest::providers::HttpFeedSource;
use crypto_digest::metrics::{Metrics, ENV_METRICS_PATH};
use crypto_digest::notify::{Notifier, StdoutNotifier, TelegramNotifier};
use crypto_digest::pipeline::{self, Sources};
use crypto_digest::sentiment::AlternativeMeClient;

/// Compact human logs by default; `DIGEST_LOG_FORMAT=json` for log shippers.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("crypto_digest=info,morning_digest=info,warn"));

    let json = std::env::var("DIGEST_LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

fn dry_run() -> bool {
    std::env::var("DIGEST_DRY_RUN")
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when the scheduler injects env vars.
    let _ = dotenvy::dotenv();
    init_tracing();

    let metrics = match Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(error = ?e, "metrics recorder not installed");
            None
        }
    };

    let cfg = load_config_default()?;
    let topics = load_topics_default()?;
    let client = crypto_digest::http_client(cfg.http_timeout_secs)?;

    // Resolve credentials before any fetch so a misconfigured run fails fast.
    let notifier: Box<dyn Notifier> = if dry_run() {
        Box::new(StdoutNotifier)
    } else {
        Box::new(TelegramNotifier::from_env(client.clone())?)
    };

    let sentiment = AlternativeMeClient::new(client.clone());
    let pairs = DexscreenerClient::new(client.clone());
    let feeds = HttpFeedSource::new(client);
    let sources = Sources {
        sentiment: &sentiment,
        pairs: &pairs,
        feeds: &feeds,
    };

    let outcome = pipeline::run(&cfg, &topics, &sources, notifier.as_ref(), beijing_now()).await;

    if let (Some(m), Ok(path)) = (&metrics, std::env::var(ENV_METRICS_PATH)) {
        let finished = chrono::Utc::now().timestamp();
        if let Err(e) = m.write_textfile(&PathBuf::from(path), finished) {
            tracing::warn!(error = ?e, "metrics textfile not written");
        }
    }

    let report = outcome?;
    if report.skipped_sources() > 0 {
        tracing::warn!(
            skipped = report.skipped_sources(),
            "digest sent with skipped sources"
        );
    }
    Ok(())
}
