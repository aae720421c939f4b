// tests/compose_digest.rs
use chrono::{DateTime, FixedOffset};
use crypto_digest::compose::{
    DigestComposer, DigestInput, SectionKind, FOOTER_NOTE, TOKENS_PLACEHOLDER, TOPICS_PLACEHOLDER,
};
use crypto_digest::dex::types::RawPair;
use crypto_digest::dex::{normalize_pair, WatchItem};
use crypto_digest::ingest::types::NewsItem;
use crypto_digest::narrative::NarrativeTopic;
use crypto_digest::sentiment::{SentimentReading, SentimentSnapshot};

fn at() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2026-10-19T09:00:00+08:00").unwrap()
}

fn snapshot() -> SentimentSnapshot {
    let r = |v: u8, c: &str| {
        Some(SentimentReading {
            value: v,
            classification: c.into(),
        })
    };
    SentimentSnapshot {
        now: r(65, "Greed"),
        yesterday: r(58, "Greed"),
        last_week: r(40, "Fear"),
    }
}

fn token(label: &str, vol: Option<f64>, url: Option<&str>) -> WatchItem {
    let mut pair = normalize_pair(&RawPair::default());
    pair.symbol = label.to_string();
    pair.chain = "solana".into();
    pair.dex = "raydium".into();
    pair.volume_24h = vol;
    pair.pair_url = url.map(str::to_string);
    WatchItem {
        label: label.to_string(),
        pair,
    }
}

fn kinds(d: &crypto_digest::Digest) -> Vec<SectionKind> {
    d.sections().iter().map(|s| s.kind).collect()
}

#[test]
fn empty_inputs_render_placeholders_in_fixed_order() {
    let s = snapshot();
    let d = DigestComposer::new(5, 5).compose(&DigestInput {
        generated_at: at(),
        sentiment: &s,
        tokens: &[],
        news: &[],
        topics: &[],
    });

    assert_eq!(
        kinds(&d),
        vec![
            SectionKind::Header,
            SectionKind::Sentiment,
            SectionKind::Tokens,
            SectionKind::Narrative,
            SectionKind::Footer
        ]
    );
    let tokens = d.section(SectionKind::Tokens).unwrap();
    assert_eq!(tokens.lines.len(), 2);
    assert_eq!(tokens.lines[1], TOKENS_PLACEHOLDER);
    assert!(d.section(SectionKind::PairLinks).is_none());
    assert!(d.section(SectionKind::News).is_none());

    let text = d.render();
    assert!(text.contains("• 恐慌指数：<b>65</b>｜昨日 58｜上周 40"));
    assert!(text.contains(TOPICS_PLACEHOLDER));
    assert!(text.ends_with(FOOTER_NOTE));
    assert!(text.starts_with("<b>币圈早报</b>（北京时间 2026-10-19 09:00）\n\n🧭"));
}

#[test]
fn tokens_are_capped_and_links_skip_missing_urls() {
    let s = snapshot();
    let tokens = vec![
        token("AAA", Some(3e6), Some("https://dexscreener.com/solana/aaa")),
        token("BBB", Some(2e6), None),
        token("CCC", Some(1e6), Some("https://dexscreener.com/solana/ccc")),
    ];
    let d = DigestComposer::new(2, 5).compose(&DigestInput {
        generated_at: at(),
        sentiment: &s,
        tokens: &tokens,
        news: &[],
        topics: &[],
    });

    let tok = d.section(SectionKind::Tokens).unwrap();
    assert_eq!(tok.lines.len(), 3);
    assert!(tok.lines[1].starts_with("• <b>AAA</b>（solana / raydium）  价 —｜24h —｜量 $3.00M"));
    assert!(tok.lines[2].contains("Txns 0"));

    let links = d.section(SectionKind::PairLinks).unwrap();
    assert_eq!(
        links.lines,
        vec![
            "🔗 <b>池子链接</b>".to_string(),
            "• AAA: https://dexscreener.com/solana/aaa".to_string()
        ]
    );
}

#[test]
fn news_and_topics_sections_follow_tokens() {
    let s = SentimentSnapshot::default();
    let news = vec![NewsItem {
        title: "BTC Rallies".into(),
        link: None,
        summary: "Up only".into(),
        source: "Coin Wire".into(),
    }];
    let topics = vec![NarrativeTopic::Entry {
        title: Some("Restaking".into()),
        note: Some("points farming".into()),
        source: None,
    }];
    let d = DigestComposer::new(5, 5).compose(&DigestInput {
        generated_at: at(),
        sentiment: &s,
        tokens: &[],
        news: &news,
        topics: &topics,
    });

    assert_eq!(
        kinds(&d),
        vec![
            SectionKind::Header,
            SectionKind::Sentiment,
            SectionKind::Tokens,
            SectionKind::News,
            SectionKind::Narrative,
            SectionKind::Footer
        ]
    );
    let text = d.render();
    assert!(text.contains("• 恐慌指数：<b>—</b>｜昨日 —｜上周 —"));
    assert!(text.contains("📰 <b>币圈新闻</b>\n• <b>BTC Rallies</b>：Up only"));
    assert!(text.contains("• <b>Restaking</b>：points farming"));
}
