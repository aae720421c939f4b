//! Syndication feed parsing (RSS 2.0, RSS 1.0/RDF, Atom) and the HTTP feed source.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::Client;

use crate::ingest::types::{FeedEntry, FeedSource, ParsedFeed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedKind {
    Rss,
    Rdf,
    Atom,
}

impl FeedKind {
    fn from_root(local: &str) -> Option<Self> {
        match local {
            "rss" => Some(FeedKind::Rss),
            "RDF" => Some(FeedKind::Rdf),
            "feed" => Some(FeedKind::Atom),
            _ => None,
        }
    }

    /// Element path (local names, root first) of each entry.
    fn entry_path(self) -> &'static [&'static str] {
        match self {
            FeedKind::Rss => &["rss", "channel", "item"],
            FeedKind::Rdf => &["RDF", "item"],
            FeedKind::Atom => &["feed", "entry"],
        }
    }

    fn title_path(self) -> &'static [&'static str] {
        match self {
            FeedKind::Rss => &["rss", "channel", "title"],
            FeedKind::Rdf => &["RDF", "channel", "title"],
            FeedKind::Atom => &["feed", "title"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    FeedTitle,
    Title,
    Link,
    Summary,
    Content,
}

#[derive(Debug)]
struct Capture {
    field: Field,
    depth: usize,
    text: String,
}

#[derive(Debug)]
struct AtomLink {
    href: String,
    rel: Option<String>,
}

#[derive(Debug, Default)]
struct EntryDraft {
    title: Option<String>,
    link: Option<String>,
    summary: Option<String>,
    content: Option<String>,
    atom_links: Vec<AtomLink>,
}

impl EntryDraft {
    fn slot(&mut self, field: Field) -> Option<&mut Option<String>> {
        match field {
            Field::Title => Some(&mut self.title),
            Field::Link => Some(&mut self.link),
            Field::Summary => Some(&mut self.summary),
            Field::Content => Some(&mut self.content),
            Field::FeedTitle => None,
        }
    }

    fn finish(self) -> FeedEntry {
        let atom_link = self
            .atom_links
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| self.atom_links.first())
            .map(|l| l.href.clone());
        FeedEntry {
            title: self.title,
            link: self.link.or(atom_link),
            summary: self.summary.filter(|s| !s.is_empty()).or(self.content),
        }
    }
}

/// Streaming walk over one feed document.
///
/// Only elements in the feed's own namespace count: `<dc:title>`,
/// `<media:title>` or `<atom:link>` beside an item's `<title>`/`<link>` are
/// skipped together with everything nested in them. The first occurrence
/// of a field wins.
struct FeedWalker {
    kind: FeedKind,
    own_prefix: Option<Vec<u8>>,
    /// Local names of open elements; `None` marks a foreign element.
    stack: Vec<Option<String>>,
    title: Option<String>,
    entries: Vec<FeedEntry>,
    entry: Option<EntryDraft>,
    capture: Option<Capture>,
}

impl FeedWalker {
    fn new(kind: FeedKind, own_prefix: Option<Vec<u8>>) -> Self {
        Self {
            kind,
            own_prefix,
            stack: Vec::new(),
            title: None,
            entries: Vec::new(),
            entry: None,
            capture: None,
        }
    }

    fn at(&self, path: &[&str]) -> bool {
        self.stack.len() == path.len()
            && self
                .stack
                .iter()
                .zip(path)
                .all(|(open, want)| open.as_deref() == Some(*want))
    }

    /// Name of the current element when it is a direct child of an entry.
    fn entry_child(&self) -> Option<&str> {
        let path = self.kind.entry_path();
        let (last, parent) = self.stack.split_last()?;
        let is_child = self.entry.is_some()
            && parent.len() == path.len()
            && parent
                .iter()
                .zip(path)
                .all(|(open, want)| open.as_deref() == Some(*want));
        if is_child {
            last.as_deref()
        } else {
            None
        }
    }

    fn entry_field(&self, name: &str) -> Option<Field> {
        match (self.kind, name) {
            (_, "title") => Some(Field::Title),
            (FeedKind::Rss | FeedKind::Rdf, "link") => Some(Field::Link),
            (FeedKind::Rss | FeedKind::Rdf, "description") => Some(Field::Summary),
            (FeedKind::Atom, "summary") => Some(Field::Summary),
            (FeedKind::Atom, "content") => Some(Field::Content),
            _ => None,
        }
    }

    fn open(&mut self, e: &BytesStart<'_>) -> Result<()> {
        let qname = e.name();
        let prefix = qname.prefix().map(|p| p.as_ref().to_vec());
        let ours = self.stack.is_empty() || prefix == self.own_prefix;
        let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
        self.stack.push(ours.then_some(local));

        if let Some(cap) = self.capture.as_mut() {
            // nested markup (e.g. Atom xhtml content): keep words apart
            cap.text.push(' ');
            return Ok(());
        }

        if self.at(self.kind.entry_path()) {
            self.entry = Some(EntryDraft::default());
            return Ok(());
        }
        if self.at(self.kind.title_path()) {
            self.start_capture(Field::FeedTitle);
            return Ok(());
        }

        let Some(name) = self.entry_child().map(str::to_string) else {
            return Ok(());
        };
        if self.kind == FeedKind::Atom && name == "link" {
            if let Some(href) = attr(e, "href")? {
                let rel = attr(e, "rel")?;
                if let Some(draft) = self.entry.as_mut() {
                    draft.atom_links.push(AtomLink { href, rel });
                }
            }
        } else if let Some(field) = self.entry_field(&name) {
            self.start_capture(field);
        }
        Ok(())
    }

    fn start_capture(&mut self, field: Field) {
        self.capture = Some(Capture {
            field,
            depth: self.stack.len(),
            text: String::new(),
        });
    }

    fn text(&mut self, s: &str) {
        if let Some(cap) = self.capture.as_mut() {
            cap.text.push_str(s);
        }
    }

    fn close(&mut self) {
        let depth = self.stack.len();
        match self.capture.take() {
            Some(cap) if cap.depth == depth => self.store(cap),
            Some(mut cap) => {
                cap.text.push(' ');
                self.capture = Some(cap);
            }
            None => {
                if self.at(self.kind.entry_path()) {
                    if let Some(draft) = self.entry.take() {
                        self.entries.push(draft.finish());
                    }
                }
            }
        }
        self.stack.pop();
    }

    fn store(&mut self, cap: Capture) {
        let value = cap.text.trim().to_string();
        let slot = match cap.field {
            Field::FeedTitle => Some(&mut self.title),
            field => self.entry.as_mut().and_then(|d| d.slot(field)),
        };
        if let Some(slot) = slot {
            if slot.is_none() {
                *slot = Some(value);
            }
        }
    }
}

fn attr(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    match e
        .try_get_attribute(name)
        .with_context(|| format!("reading @{name}"))?
    {
        Some(a) => Ok(Some(
            a.unescape_value()
                .with_context(|| format!("unescaping @{name}"))?
                .into_owned(),
        )),
        None => Ok(None),
    }
}

/// Kind and namespace prefix of the first element.
fn root_element(xml: &str) -> Option<(String, Option<Vec<u8>>)> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                let prefix = e.name().prefix().map(|p| p.as_ref().to_vec());
                return Some((local, prefix));
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

/// Parse a feed document into titles/links/summaries, without cleaning.
pub fn parse_feed(xml: &str) -> Result<ParsedFeed> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let (root, prefix) =
        root_element(&xml_clean).ok_or_else(|| anyhow!("feed has no root element"))?;
    let kind = FeedKind::from_root(&root).ok_or_else(|| anyhow!("unrecognized feed root <{root}>"))?;
    // RSS 1.0 roots are `rdf:RDF` while items live in the default namespace
    let own_prefix = if kind == FeedKind::Atom { prefix } else { None };

    let mut walker = FeedWalker::new(kind, own_prefix);
    let mut reader = Reader::from_str(&xml_clean);
    loop {
        match reader.read_event().context("parsing feed xml")? {
            Event::Start(e) => walker.open(&e)?,
            Event::Empty(e) => {
                walker.open(&e)?;
                walker.close();
            }
            Event::End(_) => walker.close(),
            Event::Text(t) => {
                // unknown entities stay raw; clean_markup decodes them later
                let text = t
                    .unescape()
                    .map(|c| c.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                walker.text(&text);
            }
            Event::CData(c) => walker.text(&String::from_utf8_lossy(&c.into_inner())),
            Event::Eof => break,
            _ => {}
        }
    }
    if !walker.stack.is_empty() {
        return Err(anyhow!("feed xml ended inside <{root}>"));
    }

    Ok(ParsedFeed {
        title: walker.title,
        entries: walker.entries,
    })
}

/// HTML entities that are not predefined in XML would abort the parser.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

/// Fetches feed URLs over HTTP with the shared client.
pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_feed(&self, url: &str) -> Result<ParsedFeed> {
        let body = self
            .client
            .get(url)
            .send()
            .await
            .context("feed http get()")?
            .error_for_status()
            .context("feed non-2xx")?
            .text()
            .await
            .context("feed http .text()")?;
        parse_feed(&body)
    }

    fn name(&self) -> &'static str {
        "rss"
    }
}
