use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::article::Article;
use crate::ingest::parse::parse_feed;
use crate::ingest::types::FeedSource;

/// Fetches feeds over HTTP(S). One GET per URL, no retries.
#[derive(Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent.to_string());
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build().context("building feed http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<Vec<Article>> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("feed http get {url}"))?
            .error_for_status()
            .with_context(|| format!("feed http status {url}"))?;
        let body = resp.text().await.context("feed http .text()")?;
        parse_feed(&body).with_context(|| format!("parsing feed {url}"))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
