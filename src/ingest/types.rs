// src/ingest/types.rs
use anyhow::Result;

use crate::article::Article;

/// A syndication source: one call yields every entry of one feed URL.
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<Article>>;
    fn name(&self) -> &'static str;
}
