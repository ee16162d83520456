//! RSS 2.0 / RSS 1.0 (RDF) / Atom parsing into [`Article`]s.
//!
//! Only the four fields the pipeline needs are read: title, summary, link and
//! the raw publish string. Entries without a title or without any date are
//! skipped; the date string itself is kept verbatim for the lenient parser.
//!
//! The serde structs match elements by local name, so extension elements
//! (`media:title`, `atom:link`, `dc:title`, ...) would collide with the core
//! fields. Before deserializing, [`strip_foreign_elements`] drops every
//! prefixed element except `dc:date` and elements in the root's own prefix.

use anyhow::{anyhow, Context, Result};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use serde::Deserialize;

use crate::article::Article;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

/// RSS 1.0 puts items next to the channel, under `rdf:RDF`.
#[derive(Debug, Deserialize)]
struct Rdf {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    /// `dc:date`, carried under its local name.
    #[serde(rename = "date")]
    dc_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

impl AtomEntry {
    /// `rel="alternate"` (or no rel) wins; otherwise the first link.
    fn best_link(&self) -> Option<&str> {
        self.link
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| self.link.first())
            .map(|l| l.href.as_str())
    }
}

/// Parse a feed document. Errors only when the document is not a feed at
/// all; callers decide whether that is fatal.
pub fn parse_feed(xml: &str) -> Result<Vec<Article>> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);

    let root = root_element(&xml_clean).ok_or_else(|| anyhow!("no root element"))?;
    let doc = strip_foreign_elements(&xml_clean)?;
    let out: Vec<Article> = match root.as_str() {
        "rss" => {
            let rss: Rss = from_str(&doc).context("parsing rss xml")?;
            rss.channel.item.into_iter().filter_map(item_to_article).collect()
        }
        "RDF" => {
            let rdf: Rdf = from_str(&doc).context("parsing rdf xml")?;
            rdf.item.into_iter().filter_map(item_to_article).collect()
        }
        "feed" => {
            let feed: AtomFeed = from_str(&doc).context("parsing atom xml")?;
            feed.entry.into_iter().filter_map(entry_to_article).collect()
        }
        other => return Err(anyhow!("unsupported feed root <{other}>")),
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("feed_parse_ms").record(ms);
    counter!("feed_entries_total").increment(out.len() as u64);
    Ok(out)
}

fn item_to_article(it: Item) -> Option<Article> {
    let title = clean_text(it.title.as_deref()?);
    let published = it.pub_date.or(it.dc_date)?.trim().to_string();
    if title.is_empty() || published.is_empty() {
        tracing::debug!(target: "ingest", "skipping rss item without title or date");
        return None;
    }
    Some(Article::new(
        title,
        clean_text(it.description.as_deref().unwrap_or_default()),
        it.link.unwrap_or_default().trim(),
        published,
    ))
}

fn entry_to_article(e: AtomEntry) -> Option<Article> {
    let title = clean_text(&e.title.as_ref()?.value);
    let published = e
        .published
        .as_deref()
        .or(e.updated.as_deref())?
        .trim()
        .to_string();
    if title.is_empty() || published.is_empty() {
        tracing::debug!(target: "ingest", "skipping atom entry without title or date");
        return None;
    }
    let summary = e
        .summary
        .as_ref()
        .or(e.content.as_ref())
        .map(|t| clean_text(&t.value))
        .unwrap_or_default();
    let link = e.best_link().unwrap_or_default().trim().to_string();
    Some(Article::new(title, summary, link, published))
}

/// Local name of the first element, e.g. `rss`, `feed`, `RDF`.
fn root_element(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// What happens to an element on its way to the deserializer.
enum Carry {
    AsIs,
    Renamed(String),
    Drop,
}

fn carry(qname: &[u8], root_prefix: Option<&[u8]>) -> Carry {
    let Some(colon) = qname.iter().position(|&b| b == b':') else {
        return Carry::AsIs;
    };
    let prefix = &qname[..colon];
    if qname == b"dc:date" || Some(prefix) == root_prefix {
        Carry::Renamed(String::from_utf8_lossy(&qname[colon + 1..]).into_owned())
    } else {
        Carry::Drop
    }
}

/// Re-emit the document without extension elements (and their children).
/// Kept prefixed elements lose their prefix; attributes are untouched.
fn strip_foreign_elements(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut root_prefix: Option<Vec<u8>> = None;
    let mut depth = 0usize;
    // depth of the element being dropped, while inside it
    let mut dropping: Option<usize> = None;

    loop {
        let event = reader.read_event().context("reading feed xml")?;
        match event {
            Event::Eof => break,
            Event::Start(e) => {
                depth += 1;
                if dropping.is_some() {
                    continue;
                }
                if depth == 1 {
                    root_prefix = e.name().prefix().map(|p| p.as_ref().to_vec());
                }
                let how = carry(e.name().as_ref(), root_prefix.as_deref());
                match how {
                    Carry::AsIs => writer.write_event(Event::Start(e))?,
                    Carry::Renamed(local) => writer.write_event(Event::Start(
                        BytesStart::new(local).with_attributes(e.attributes().flatten()),
                    ))?,
                    Carry::Drop => dropping = Some(depth),
                }
            }
            Event::End(e) => {
                let closing = depth;
                depth = depth.saturating_sub(1);
                if let Some(d) = dropping {
                    if d == closing {
                        dropping = None;
                    }
                    continue;
                }
                let how = carry(e.name().as_ref(), root_prefix.as_deref());
                match how {
                    Carry::AsIs => writer.write_event(Event::End(e))?,
                    Carry::Renamed(local) => writer.write_event(Event::End(BytesEnd::new(local)))?,
                    Carry::Drop => {}
                }
            }
            Event::Empty(e) => {
                if dropping.is_some() {
                    continue;
                }
                let how = carry(e.name().as_ref(), root_prefix.as_deref());
                match how {
                    Carry::AsIs => writer.write_event(Event::Empty(e))?,
                    Carry::Renamed(local) => writer.write_event(Event::Empty(
                        BytesStart::new(local).with_attributes(e.attributes().flatten()),
                    ))?,
                    Carry::Drop => {}
                }
            }
            other => {
                if dropping.is_none() {
                    writer.write_event(other)?;
                }
            }
        }
    }
    String::from_utf8(writer.into_inner()).context("feed xml is not utf-8")
}

/// Decode entities, drop markup, collapse whitespace. Summaries are often
/// HTML fragments; matching and scoring want the words.
pub fn clean_text(s: &str) -> String {
    use once_cell::sync::OnceCell;
    use regex::Regex;

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[a-z!][^>]*>").expect("tag regex"));
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("ws regex"));

    let no_tags = re_tags.replace_all(s, " ");
    let decoded = html_escape::decode_html_entities(&no_tags);
    re_ws.replace_all(&decoded, " ").trim().to_string()
}

/// HTML entities that are not XML entities and would break the parser.
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
