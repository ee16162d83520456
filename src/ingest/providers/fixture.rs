use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;

use crate::article::Article;
use crate::ingest::parse::parse_feed;
use crate::ingest::types::FeedSource;

/// Serves feed documents from memory, keyed by URL. Unknown URLs fail like an
/// unreachable host would.
#[derive(Debug, Clone, Default)]
pub struct FixtureFeedSource {
    feeds: HashMap<String, String>,
}

impl FixtureFeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, url: impl Into<String>, xml: impl Into<String>) -> Self {
        self.feeds.insert(url.into(), xml.into());
        self
    }
}

#[async_trait]
impl FeedSource for FixtureFeedSource {
    async fn fetch(&self, url: &str) -> Result<Vec<Article>> {
        let xml = self
            .feeds
            .get(url)
            .ok_or_else(|| anyhow!("no fixture for {url}"))?;
        parse_feed(xml)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
