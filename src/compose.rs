//! Digest composition: fixed section order, deterministic empty states.
//!
//! Nothing here can fail. Every upstream gap is rendered with that
//! component's placeholder, so the composer only needs what it is given.

use chrono::{DateTime, FixedOffset, Utc};

use crate::config::DigestConfig;
use crate::dex::WatchItem;
use crate::format::{format_money, format_percent, format_price, MISSING};
use crate::ingest::types::NewsItem;
use crate::narrative::NarrativeTopic;
use crate::sentiment::{SentimentReading, SentimentSnapshot};

pub const DIGEST_TITLE: &str = "币圈早报";
pub const TOKENS_PLACEHOLDER: &str = "• （暂无数据：检查 Dexscreener API 或地址是否正确）";
pub const TOPICS_PLACEHOLDER: &str =
    "• （在 hot_topics 配置里填：例如「币安 UTF-8 编码测试→中文 meme 拉升」等）";
pub const FOOTER_RULE: &str = "—";
pub const FOOTER_NOTE: &str =
    "注：Meme 数据来自 Dexscreener（按最液态交易对）；指数来自 Alternative.me；新闻来自 RSS 源。";

const BEIJING_OFFSET_SECS: i32 = 8 * 3600;

/// Current wall-clock time in UTC+8, the zone the header is printed in.
pub fn beijing_now() -> DateTime<FixedOffset> {
    let tz = FixedOffset::east_opt(BEIJING_OFFSET_SECS).expect("UTC+8 is a valid offset");
    Utc::now().with_timezone(&tz)
}

/// Escape free text for the HTML-subset message body.
pub fn escape_text(s: &str) -> String {
    html_escape::encode_text(s).into_owned()
}

fn escape_href(s: &str) -> String {
    html_escape::encode_double_quoted_attribute(s).into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Header,
    Sentiment,
    Tokens,
    PairLinks,
    News,
    Narrative,
    Footer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub lines: Vec<String>,
}

impl Section {
    fn new(kind: SectionKind, lines: Vec<String>) -> Self {
        Self { kind, lines }
    }
}

/// Composed message; sections are separated by one blank line when rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    sections: Vec<Section>,
}

impl Digest {
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.lines.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Everything one run gathered, borrowed for composition.
#[derive(Debug, Clone, Copy)]
pub struct DigestInput<'a> {
    pub generated_at: DateTime<FixedOffset>,
    pub sentiment: &'a SentimentSnapshot,
    /// Already ranked by volume.
    pub tokens: &'a [WatchItem],
    pub news: &'a [NewsItem],
    pub topics: &'a [NarrativeTopic],
}

#[derive(Debug, Clone, Copy)]
pub struct DigestComposer {
    max_meme_items: usize,
    max_topics: usize,
}

impl DigestComposer {
    pub fn new(max_meme_items: usize, max_topics: usize) -> Self {
        Self {
            max_meme_items,
            max_topics,
        }
    }

    pub fn from_config(cfg: &DigestConfig) -> Self {
        Self::new(cfg.max_meme_items, cfg.max_topics)
    }

    pub fn compose(&self, input: &DigestInput<'_>) -> Digest {
        let tokens = &input.tokens[..input.tokens.len().min(self.max_meme_items)];

        let mut sections = vec![
            header(input.generated_at),
            sentiment_section(input.sentiment),
            token_section(tokens, input.tokens.is_empty()),
        ];
        if !tokens.is_empty() {
            sections.push(pair_link_section(tokens));
        }
        if !input.news.is_empty() {
            sections.push(news_section(input.news));
        }
        sections.push(narrative_section(input.topics, self.max_topics));
        sections.push(Section::new(
            SectionKind::Footer,
            vec![FOOTER_RULE.to_string(), FOOTER_NOTE.to_string()],
        ));

        Digest { sections }
    }
}

fn header(at: DateTime<FixedOffset>) -> Section {
    Section::new(
        SectionKind::Header,
        vec![format!(
            "<b>{DIGEST_TITLE}</b>（北京时间 {}）",
            at.format("%Y-%m-%d %H:%M")
        )],
    )
}

fn reading(r: &Option<SentimentReading>) -> String {
    r.as_ref()
        .map(|r| r.value.to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

fn sentiment_section(s: &SentimentSnapshot) -> Section {
    Section::new(
        SectionKind::Sentiment,
        vec![
            "🧭 <b>情绪</b>".to_string(),
            format!(
                "• 恐慌指数：<b>{}</b>｜昨日 {}｜上周 {}",
                reading(&s.now),
                reading(&s.yesterday),
                reading(&s.last_week)
            ),
        ],
    )
}

fn token_line(it: &WatchItem) -> String {
    let p = &it.pair;
    format!(
        "• <b>{}</b>（{} / {}）  价 {}｜24h {}｜量 {}｜流动性 {}｜FDV {}｜Txns {}",
        escape_text(&p.symbol),
        escape_text(&p.chain),
        escape_text(&p.dex),
        format_price(p.price_usd),
        format_percent(p.price_change_24h),
        format_money(p.volume_24h),
        format_money(p.liquidity_usd),
        format_money(p.fdv),
        p.txn_count()
    )
}

/// The placeholder means "nothing came back", so it depends on the uncapped list.
fn token_section(tokens: &[WatchItem], none_fetched: bool) -> Section {
    let mut lines = vec!["🔥 <b>爆量 Meme 观察</b>（按24h成交量）".to_string()];
    if none_fetched {
        lines.push(TOKENS_PLACEHOLDER.to_string());
    } else {
        lines.extend(tokens.iter().map(token_line));
    }
    Section::new(SectionKind::Tokens, lines)
}

fn pair_link_section(tokens: &[WatchItem]) -> Section {
    let mut lines = vec!["🔗 <b>池子链接</b>".to_string()];
    lines.extend(tokens.iter().filter_map(|it| {
        it.pair
            .pair_url
            .as_deref()
            .map(|url| format!("• {}: {}", escape_text(&it.pair.symbol), escape_text(url)))
    }));
    Section::new(SectionKind::PairLinks, lines)
}

fn news_entry(n: &NewsItem) -> String {
    let title = escape_text(&n.title);
    let summary = escape_text(&n.summary);
    match n.link.as_deref() {
        Some(link) => {
            let mut out = format!("• <b>{title}</b>");
            if !summary.is_empty() {
                out.push_str(&format!("\n  {summary}"));
            }
            let anchor = if n.source.is_empty() {
                "查看详情".to_string()
            } else {
                format!("来源：{}", escape_text(&n.source))
            };
            out.push_str(&format!("\n  <a href=\"{}\">{anchor}</a>", escape_href(link)));
            out
        }
        None if summary.is_empty() => format!("• <b>{title}</b>"),
        None => format!("• <b>{title}</b>：{summary}"),
    }
}

fn news_section(news: &[NewsItem]) -> Section {
    let mut lines = vec!["📰 <b>币圈新闻</b>".to_string()];
    lines.extend(news.iter().map(news_entry));
    Section::new(SectionKind::News, lines)
}

fn narrative_section(topics: &[NarrativeTopic], max_topics: usize) -> Section {
    let mut lines = vec!["📣 <b>热门叙事/刷屏</b>".to_string()];
    if topics.is_empty() {
        lines.push(TOPICS_PLACEHOLDER.to_string());
    } else {
        lines.extend(topics.iter().take(max_topics).map(NarrativeTopic::render));
    }
    Section::new(SectionKind::Narrative, lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-10-19T08:30:00+08:00").unwrap()
    }

    #[test]
    fn missing_readings_render_placeholder() {
        let s = SentimentSnapshot {
            now: Some(SentimentReading {
                value: 20,
                classification: "Extreme Fear".into(),
            }),
            ..Default::default()
        };
        let sec = sentiment_section(&s);
        assert_eq!(sec.lines[1], "• 恐慌指数：<b>20</b>｜昨日 —｜上周 —");
    }

    #[test]
    fn header_uses_given_timestamp() {
        let sec = header(at());
        assert_eq!(sec.lines[0], "<b>币圈早报</b>（北京时间 2026-10-19 08:30）");
    }

    #[test]
    fn news_entry_shapes() {
        let mut n = NewsItem {
            title: "ETF <flows>".into(),
            link: Some("https://n.example/a?x=1&y=2".into()),
            summary: "Inflows rose".into(),
            source: "CoinDesk".into(),
        };
        assert_eq!(
            news_entry(&n),
            "• <b>ETF &lt;flows&gt;</b>\n  Inflows rose\n  <a href=\"https://n.example/a?x=1&amp;y=2\">来源：CoinDesk</a>"
        );

        n.source.clear();
        n.summary.clear();
        assert!(news_entry(&n).ends_with(">查看详情</a>"));

        n.link = None;
        assert_eq!(news_entry(&n), "• <b>ETF &lt;flows&gt;</b>");
        n.summary = "short".into();
        assert_eq!(news_entry(&n), "• <b>ETF &lt;flows&gt;</b>：short");
    }

    fn wif(label: &str) -> WatchItem {
        let mut pair = crate::dex::normalize_pair(&Default::default());
        pair.symbol = "WIF".into();
        pair.pair_url = Some("https://d/x".into());
        WatchItem {
            label: label.into(),
            pair,
        }
    }

    #[test]
    fn token_lines_show_base_symbol() {
        let items = [wif("dogwifhat")];
        let sec = token_section(&items, false);
        assert!(sec.lines[1].starts_with("• <b>WIF</b>（? / ?）"));
        assert_eq!(pair_link_section(&items).lines[1], "• WIF: https://d/x");
    }

    #[test]
    fn zero_cap_is_not_reported_as_missing_data() {
        let s = SentimentSnapshot::default();
        let items = [wif("w")];
        let d = DigestComposer::new(0, 5).compose(&DigestInput {
            generated_at: at(),
            sentiment: &s,
            tokens: &items,
            news: &[],
            topics: &[],
        });
        let tokens = d.section(SectionKind::Tokens).unwrap();
        assert_eq!(tokens.lines.len(), 1);
        assert!(!d.render().contains(TOKENS_PLACEHOLDER));
        assert!(d.section(SectionKind::PairLinks).is_none());
    }

    #[test]
    fn topics_are_capped() {
        let topics: Vec<_> = (0..4)
            .map(|i| NarrativeTopic::Text(format!("t{i}")))
            .collect();
        let sec = narrative_section(&topics, 2);
        assert_eq!(sec.lines, vec!["📣 <b>热门叙事/刷屏</b>", "• t0", "• t1"]);
    }
}
