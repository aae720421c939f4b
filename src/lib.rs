// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod compose;
pub mod config;
pub mod dex;
pub mod format;
pub mod ingest;
pub mod metrics;
pub mod narrative;
pub mod notify;
pub mod pipeline;
pub mod sentiment;

// ---- Re-exports for stable public API ----
pub use crate::compose::{Digest, DigestComposer, DigestInput};
pub use crate::config::{DigestConfig, WatchedToken};
pub use crate::pipeline::{build_digest, run, DigestError, RunReport, Sources};

use anyhow::Context;
use std::time::Duration;

/// One HTTP client for every outbound call, bounded by a fixed timeout.
pub fn http_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("morning-digest/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building http client")
}
