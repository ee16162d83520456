//! Sentiment buckets. Unscored articles land in none of them.

use serde::Serialize;

use crate::article::Article;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Categorized {
    pub positive: Vec<Article>,
    pub neutral: Vec<Article>,
    pub negative: Vec<Article>,
}

impl Categorized {
    pub fn total(&self) -> usize {
        self.positive.len() + self.neutral.len() + self.negative.len()
    }
}

/// Split scored articles by sign of `sentiment`, keeping input order.
pub fn categorize(articles: &[Article]) -> Categorized {
    let mut out = Categorized::default();
    for a in articles {
        let Some(s) = a.sentiment else {
            continue;
        };
        if s > 0.0 {
            out.positive.push(a.clone());
        } else if s == 0.0 {
            out.neutral.push(a.clone());
        } else if s < 0.0 {
            out.negative.push(a.clone());
        }
        // NaN matches no comparison and is dropped with the unscored.
    }
    out
}
