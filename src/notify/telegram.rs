use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Serialize;

use super::{DeliveryOptions, Notifier};

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Telegram Bot API `sendMessage`, one message per run.
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String, // "@channel" or "-100…"
    client: Client,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    disable_web_page_preview: bool,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String, client: Client) -> Self {
        Self {
            bot_token,
            chat_id,
            client,
        }
    }

    /// Reads `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`.
    pub fn from_env(client: Client) -> Result<Self> {
        let token = std::env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| anyhow!("Missing TELEGRAM_BOT_TOKEN env var"))?;
        let chat = std::env::var("TELEGRAM_CHAT_ID")
            .map_err(|_| anyhow!("Missing TELEGRAM_CHAT_ID env var"))?;
        Ok(Self::new(token, chat, client))
    }

    fn endpoint(&self) -> String {
        format!("{TELEGRAM_API}/bot{}/sendMessage", self.bot_token)
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str, opts: &DeliveryOptions) -> Result<()> {
        let form = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: opts.html.then_some("HTML"),
            disable_web_page_preview: opts.disable_link_preview,
        };

        // Errors are stripped of the URL so the bot token never reaches logs.
        self.client
            .post(self.endpoint())
            .form(&form)
            .send()
            .await
            .map_err(|e| anyhow!("telegram request failed: {}", e.without_url()))?
            .error_for_status()
            .map_err(|e| anyhow!("telegram non-2xx: {}", e.without_url()))
            .context("telegram sendMessage")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}
