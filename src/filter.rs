//! # Article filter
//! Keyword / region / country matching over title and description.
//!
//! The keyword set always contains `energy`; user keywords and regions come in
//! as comma-separated strings. An article is kept when the first of four
//! inclusion branches fires:
//!
//! 1. no region text, no keyword text, energy present;
//! 2. no region text, some other keyword present, energy present;
//! 3. no keyword text, a country or region present, energy present;
//! 4. energy, some other keyword, and a country or region present.
//!
//! How "energy present" is decided is controlled by [`EnergyRule`].

use serde::{Deserialize, Serialize};

use crate::article::Article;
use crate::session::SelectedCountries;

/// The implicit keyword every query carries.
pub const ENERGY_TERM: &str = "energy";

/// How the implicit `energy` term is matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyRule {
    /// `energy` must appear (case-insensitive) in title or description.
    #[default]
    Literal,
    /// `energy` counts as present for every article (legacy matching, where
    /// the check compared the term with itself).
    AlwaysPresent,
}

impl std::str::FromStr for EnergyRule {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "literal" => Ok(Self::Literal),
            "always_present" | "always" | "legacy" => Ok(Self::AlwaysPresent),
            other => anyhow::bail!("unknown energy rule `{other}`"),
        }
    }
}

/// Parsed, lowercased query terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    keyword_text: bool,
    region_text: bool,
    other_keywords: Vec<String>,
    regions: Vec<String>,
    energy_rule: EnergyRule,
}

impl FilterCriteria {
    pub fn new(keyword_csv: &str, region_csv: &str, energy_rule: EnergyRule) -> Self {
        let other_keywords = split_terms(keyword_csv)
            .into_iter()
            .filter(|k| k != ENERGY_TERM)
            .collect();
        Self {
            keyword_text: !keyword_csv.trim().is_empty(),
            region_text: !region_csv.trim().is_empty(),
            other_keywords,
            regions: split_terms(region_csv),
            energy_rule,
        }
    }

    /// Keyword set as matched: `energy` first, then the user's other terms.
    pub fn keywords(&self) -> Vec<&str> {
        std::iter::once(ENERGY_TERM)
            .chain(self.other_keywords.iter().map(String::as_str))
            .collect()
    }

    fn has_energy(&self, a: &Article) -> bool {
        match self.energy_rule {
            EnergyRule::Literal => a.mentions(ENERGY_TERM),
            EnergyRule::AlwaysPresent => true,
        }
    }

    /// Decide one article. Branch order matters only for readability: any
    /// true branch includes.
    pub fn matches(&self, a: &Article, countries: &SelectedCountries) -> bool {
        let energy = self.has_energy(a);
        if !energy {
            return false;
        }
        let other = self.other_keywords.iter().any(|k| a.mentions(k));
        let place = countries.iter().any(|c| a.mentions(&c.to_lowercase()))
            || self.regions.iter().any(|r| a.mentions(r));

        (!self.region_text && !self.keyword_text)
            || (!self.region_text && other)
            || (!self.keyword_text && place)
            || (other && place)
    }
}

/// Applies [`FilterCriteria`] to article lists.
#[derive(Debug, Clone)]
pub struct ArticleFilter {
    criteria: FilterCriteria,
}

impl ArticleFilter {
    pub fn new(criteria: FilterCriteria) -> Self {
        Self { criteria }
    }

    /// New list of matching articles, input order preserved.
    pub fn filter(&self, articles: &[Article], countries: &SelectedCountries) -> Vec<Article> {
        articles
            .iter()
            .filter(|a| self.criteria.matches(a, countries))
            .cloned()
            .collect()
    }
}

/// One-shot form of [`ArticleFilter::filter`] with the default energy rule.
pub fn filter_articles(
    articles: &[Article],
    keyword_csv: &str,
    region_csv: &str,
    countries: &SelectedCountries,
) -> Vec<Article> {
    ArticleFilter::new(FilterCriteria::new(
        keyword_csv,
        region_csv,
        EnergyRule::default(),
    ))
    .filter(articles, countries)
}

/// Split on commas, trim, lowercase, drop empties.
fn split_terms(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
