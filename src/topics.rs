//! # Topics
//! Presence counts for a fixed energy vocabulary, ready for a share chart.
//!
//! A topic is counted at most once per article, on a whole-word (or
//! whole-phrase) match in the lowercased `title + " " + description`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::article::Article;

/// Chart vocabulary, in display order.
pub const TOPIC_VOCABULARY: [&str; 4] = ["solar", "wind", "oil and gas", "natural gas"];

static TOPIC_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    TOPIC_VOCABULARY
        .iter()
        .map(|t| {
            let re = Regex::new(&format!(r"\b{}\b", regex::escape(t))).expect("topic regex");
            (*t, re)
        })
        .collect()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicCount {
    pub topic: &'static str,
    pub count: usize,
}

/// Non-zero topic counts in vocabulary order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TopicDistribution {
    counts: Vec<TopicCount>,
}

impl TopicDistribution {
    pub fn counts(&self) -> &[TopicCount] {
        &self.counts
    }

    pub fn count(&self, topic: &str) -> usize {
        self.counts
            .iter()
            .find(|c| c.topic == topic)
            .map_or(0, |c| c.count)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|c| c.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// `(topic, percent)` pairs summing to 100 (empty when nothing counted).
    pub fn shares(&self) -> Vec<(&'static str, f64)> {
        let total = self.total();
        if total == 0 {
            return Vec::new();
        }
        self.counts
            .iter()
            .map(|c| (c.topic, c.count as f64 * 100.0 / total as f64))
            .collect()
    }
}

/// Count topic presence across `articles`, dropping zero counts.
pub fn aggregate(articles: &[Article]) -> TopicDistribution {
    let mut tallies = [0usize; TOPIC_VOCABULARY.len()];
    for a in articles {
        let text = a.text().to_lowercase();
        for (i, (_, re)) in TOPIC_PATTERNS.iter().enumerate() {
            if re.is_match(&text) {
                tallies[i] += 1;
            }
        }
    }

    let counts = TOPIC_PATTERNS
        .iter()
        .zip(tallies)
        .filter(|(_, n)| *n > 0)
        .map(|(&(topic, _), count)| TopicCount { topic, count })
        .collect();
    TopicDistribution { counts }
}
