//! Outbound delivery of the composed digest.

pub mod stdout;
pub mod telegram;

use anyhow::Result;

pub use stdout::StdoutNotifier;
pub use telegram::TelegramNotifier;

/// Transport-level flags; the body itself is already final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOptions {
    /// Body uses the restricted HTML subset (`<b>`, `<a href>`).
    pub html: bool,
    pub disable_link_preview: bool,
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self {
            html: true,
            disable_link_preview: true,
        }
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str, opts: &DeliveryOptions) -> Result<()>;
    fn name(&self) -> &'static str;
}
