//! # Article
//! The one entity flowing through the pipeline: a feed entry plus an
//! optional sentiment score filled in by [`crate::sentiment::SentimentScorer`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    /// Feed summary (RSS `description`, Atom `summary`/`content`).
    pub description: String,
    pub link: String,
    /// Raw publish timestamp as the feed spelled it; parsed on demand.
    pub published: String,
    /// `None` until scored. Never defaulted to zero.
    #[serde(default)]
    pub sentiment: Option<f64>,
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        link: impl Into<String>,
        published: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            link: link.into(),
            published: published.into(),
            sentiment: None,
        }
    }

    /// `title + " " + description`, exactly as scored and topic-matched.
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }

    /// Case-insensitive substring check against title or description.
    /// `needle_lower` must already be lowercase.
    pub(crate) fn mentions(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower)
            || self.description.to_lowercase().contains(needle_lower)
    }
}
