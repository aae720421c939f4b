//! Manually curated narrative topics ("what is trending" notes).

use serde::Deserialize;

use crate::compose::escape_text;

/// Either a structured `{title, note, source}` record or a free-text line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NarrativeTopic {
    Text(String),
    Entry {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        note: Option<String>,
        #[serde(default)]
        source: Option<String>,
    },
}

fn trimmed(s: &Option<String>) -> &str {
    s.as_deref().map(str::trim).unwrap_or_default()
}

impl NarrativeTopic {
    /// One bullet line of the narrative section (HTML-subset markup).
    pub fn render(&self) -> String {
        match self {
            NarrativeTopic::Text(t) => format!("• {}", escape_text(t.trim())),
            NarrativeTopic::Entry {
                title,
                note,
                source,
            } => {
                let (title, note, src) = (trimmed(title), trimmed(note), trimmed(source));
                if src.is_empty() {
                    format!("• <b>{}</b>：{}", escape_text(title), escape_text(note))
                } else {
                    format!(
                        "• <b>{}</b>：{}（{}）",
                        escape_text(title),
                        escape_text(note),
                        escape_text(src)
                    )
                }
            }
        }
    }
}
