use anyhow::Result;
use std::io::Write;

use super::{DeliveryOptions, Notifier};

/// Dry-run transport: prints the digest instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutNotifier;

#[async_trait::async_trait]
impl Notifier for StdoutNotifier {
    async fn send(&self, text: &str, _opts: &DeliveryOptions) -> Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{text}")?;
        out.flush()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}
