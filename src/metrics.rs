//! Prometheus recorder for one-shot runs.
//!
//! A scheduled run has no scrape endpoint, so the exposition text is
//! written to a file for a node-exporter textfile collector instead.

use anyhow::{Context, Result};
use metrics::{describe_counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;

pub const ENV_METRICS_PATH: &str = "DIGEST_METRICS_PATH";

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global recorder and register series descriptions.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!("digest_runs_total", "Digest runs started.");
        describe_counter!(
            "digest_source_skipped_total",
            "Token lookups or feeds skipped after a fetch/parse error."
        );
        describe_counter!(
            "digest_tokens_without_pairs_total",
            "Watched tokens for which the pair API returned nothing."
        );
        describe_counter!("digest_news_items_total", "News items included in digests.");
        describe_counter!(
            "digest_delivery_failures_total",
            "Digests that could not be delivered."
        );

        Ok(Self { handle })
    }

    /// Stamp the finish time and write the exposition text to `path`.
    pub fn write_textfile(&self, path: &Path, finished_unix: i64) -> Result<()> {
        gauge!("digest_last_run_ts").set(finished_unix as f64);
        let tmp = path.with_extension("prom.tmp");
        std::fs::write(&tmp, self.handle.render())
            .with_context(|| format!("writing metrics to {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("moving metrics into {}", path.display()))?;
        Ok(())
    }
}
