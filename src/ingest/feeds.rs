// src/ingest/feeds.rs
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

/// Load the feed list. `.toml` (`feeds = [..]`) and `.json` (array of
/// strings) are accepted; anything else is read as CSV, one feed per row,
/// URL in the first field.
pub fn load_feed_links(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed list from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let links = parse_feed_links(&content, ext.as_str())
        .with_context(|| format!("parsing feed list {}", path.display()))?;
    tracing::debug!(target: "ingest", path = %path.display(), feeds = links.len(), "feed list loaded");
    Ok(links)
}

fn parse_feed_links(s: &str, hint_ext: &str) -> Result<Vec<String>> {
    match hint_ext {
        "toml" => parse_toml(s),
        "json" => parse_json(s),
        _ => Ok(parse_csv(s)),
    }
}

fn parse_toml(s: &str) -> Result<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct TomlFeeds {
        feeds: Vec<String>,
    }
    let v: TomlFeeds = toml::from_str(s)?;
    Ok(clean_list(v.feeds))
}

fn parse_json(s: &str) -> Result<Vec<String>> {
    let v: Vec<String> = serde_json::from_str(s).map_err(|e| anyhow!("feed list json: {e}"))?;
    Ok(clean_list(v))
}

/// First field of each non-blank row. Rows keep file order and repeats are
/// kept: every listed feed is fetched.
fn parse_csv(s: &str) -> Vec<String> {
    s.lines()
        .filter_map(|line| {
            let first = first_csv_field(line);
            (!first.is_empty()).then_some(first)
        })
        .collect()
}

fn first_csv_field(line: &str) -> String {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix('"') {
        // Quoted field: runs to the next unescaped quote, `""` is a literal quote.
        let mut out = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    out.push('"');
                    chars.next();
                } else {
                    break;
                }
            } else {
                out.push(c);
            }
        }
        return out.trim().to_string();
    }
    line.split(',').next().unwrap_or_default().trim().to_string()
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|it| it.trim().to_string())
        .filter(|it| !it.is_empty())
        .collect()
}
