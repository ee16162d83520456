//! # Sentiment
//! Lexicon/rule polarity in `[-1.0, 1.0]` for `title + " " + description`.
//!
//! Each token found in the embedded lexicon contributes one assessment:
//! its polarity, scaled by a directly preceding intensifier, flipped and
//! damped (`× -0.5`) when a negator sits in the previous three tokens. The
//! article polarity is the mean of all assessments; no hits means exactly 0.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::article::Article;

static LEXICON: Lazy<HashMap<String, f64>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, f64>>(raw).expect("valid sentiment lexicon")
});

/// Multiplier applied to a sentiment word when the previous token is an
/// intensifier or a softener.
fn intensity(tok: &str) -> Option<f64> {
    let m = match tok {
        "very" | "highly" | "deeply" => 1.3,
        "extremely" | "hugely" | "exceptionally" => 1.5,
        "really" | "so" | "too" | "particularly" => 1.2,
        "quite" | "fairly" => 1.1,
        "somewhat" | "rather" => 0.8,
        "slightly" | "marginally" | "barely" => 0.5,
        _ => return None,
    };
    Some(m)
}

/// Negators, including contracted forms kept whole by the tokenizer.
fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "nor"
            | "neither"
            | "without"
            | "cannot"
            | "hardly"
    ) || tok.ends_with("n't")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentScorer;

impl SentimentScorer {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_polarity(&self, w: &str) -> Option<f64> {
        LEXICON.get(w).copied()
    }

    /// Polarity of free text.
    pub fn polarity(&self, text: &str) -> f64 {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut sum = 0.0;
        let mut hits = 0usize;

        for (i, tok) in tokens.iter().enumerate() {
            let Some(base) = self.word_polarity(tok) else {
                continue;
            };

            let mut p = base;
            if i >= 1 {
                if let Some(m) = intensity(tokens[i - 1].as_str()) {
                    p *= m;
                }
            }
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            if negated {
                p *= -0.5;
            }

            sum += p.clamp(-1.0, 1.0);
            hits += 1;
        }

        if hits == 0 {
            0.0
        } else {
            (sum / hits as f64).clamp(-1.0, 1.0)
        }
    }

    /// Polarity of one article's `title + " " + description`.
    pub fn score_article(&self, a: &Article) -> f64 {
        self.polarity(&a.text())
    }

    /// Set `sentiment` on every article in place.
    pub fn score(&self, articles: &mut [Article]) {
        for a in articles.iter_mut() {
            a.sentiment = Some(self.score_article(a));
        }
    }
}

/// Lowercase word tokens; apostrophes stay inside words so contractions
/// like "isn't" survive as one token.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .map(|t| t.trim_matches(|c| c == '\'' || c == '\u{2019}'))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase().replace('\u{2019}', "'"))
}
