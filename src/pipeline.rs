//! # Pipeline
//! One request's worth of work over an already-fetched corpus:
//! keyword/region/country filter → date window → sentiment → buckets, with
//! the topic distribution taken over the same date-filtered set.
//!
//! No I/O here. Fetching happens before, chart rendering after.

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;

use crate::article::Article;
use crate::categorize::{categorize, Categorized};
use crate::dates::DateRange;
use crate::error::PipelineError;
use crate::filter::{ArticleFilter, EnergyRule, FilterCriteria};
use crate::sentiment::SentimentScorer;
use crate::session::SelectedCountries;
use crate::topics::{aggregate, TopicDistribution};

/// User inputs for one run, as they arrive from the form.
#[derive(Debug, Clone, Default)]
pub struct PipelineRequest {
    pub keywords: String,
    pub region: String,
    pub start_date: String,
    /// Empty or `None` means "now".
    pub end_date: Option<String>,
    pub countries: SelectedCountries,
    pub energy_rule: EnergyRule,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineOutcome {
    pub categorized: Categorized,
    pub topics: TopicDistribution,
    /// Articles handed to the run.
    pub considered: usize,
    /// Articles left after keyword/region/country and date filtering.
    pub kept: usize,
}

/// Run against the current clock.
pub fn run(
    articles: &[Article],
    req: &PipelineRequest,
    scorer: &SentimentScorer,
) -> Result<PipelineOutcome, PipelineError> {
    run_at(articles, req, scorer, Utc::now())
}

/// [`run`] with an explicit `now` for the empty end-date case.
pub fn run_at(
    articles: &[Article],
    req: &PipelineRequest,
    scorer: &SentimentScorer,
    now: DateTime<Utc>,
) -> Result<PipelineOutcome, PipelineError> {
    let span = tracing::info_span!(
        target: "pipeline",
        "pipeline_run",
        considered = articles.len(),
        countries = req.countries.len()
    );
    let _guard = span.enter();
    crate::metrics::describe_all();
    counter!("pipeline_runs_total").increment(1);

    // 1) Keyword / region / country
    let criteria = FilterCriteria::new(&req.keywords, &req.region, req.energy_rule);
    let matched = ArticleFilter::new(criteria).filter(articles, &req.countries);

    // 2) Date window (parse errors abort the run)
    let range = DateRange::parse(&req.start_date, req.end_date.as_deref(), now)
        .and_then(|range| range.filter(&matched).map(|v| (range, v)));
    let (range, mut dated) = match range {
        Ok(x) => x,
        Err(e) => {
            tracing::warn!(target: "pipeline", error = %e, "date filter failed");
            counter!("pipeline_date_errors_total").increment(1);
            return Err(e);
        }
    };

    // 3) Sentiment, in place
    scorer.score(&mut dated);

    // 4) Buckets + topics
    let categorized = categorize(&dated);
    let topics = aggregate(&dated);

    counter!("articles_kept_total").increment(dated.len() as u64);
    tracing::info!(
        target: "pipeline",
        matched = matched.len(),
        kept = dated.len(),
        start = %range.start,
        end = %range.end,
        positive = categorized.positive.len(),
        neutral = categorized.neutral.len(),
        negative = categorized.negative.len(),
        "pipeline finished"
    );

    Ok(PipelineOutcome {
        categorized,
        topics,
        considered: articles.len(),
        kept: dated.len(),
    })
}
