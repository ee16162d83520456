//! # Date range filter
//! Lenient date parsing for feed timestamps and form inputs, plus the
//! inclusive publish-window filter.
//!
//! Feeds spell dates every which way (RFC 2822 in RSS, RFC 3339 in Atom,
//! bare dates in hand-written feeds), and the form sends `YYYY-MM-DD`.
//! Everything is normalized to `DateTime<Utc>`; zone-less inputs are UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::article::Article;
use crate::error::PipelineError;

/// Formats carrying an explicit numeric offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M %z",
    "%Y-%m-%dT%H:%M%z",
    "%d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M %z",
    "%a %b %d %H:%M:%S %z %Y",
];

/// Formats with a time of day but no zone.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%B %d %Y %H:%M:%S",
    "%B %d %Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%a, %d %b %Y %H:%M:%S",
    "%a %b %d %H:%M:%S %Y",
    "%Y%m%dT%H%M%S",
];

/// Date-only formats; resolved to midnight UTC.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%a, %d %b %Y",
    "%Y%m%d",
];

/// Zone labels that mean UTC when trailing a zone-less timestamp.
const UTC_SUFFIXES: &[&str] = &[" UTC", " GMT", " UT", " Z", "Z"];

/// Zone abbreviations seen in feeds that RFC 2822 does not define.
const ZONE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("WET", "+0000"),
    ("WEST", "+0100"),
    ("BST", "+0100"),
    ("CET", "+0100"),
    ("CEST", "+0200"),
    ("EET", "+0200"),
    ("EEST", "+0300"),
    ("MSK", "+0300"),
    ("IST", "+0530"),
    ("SGT", "+0800"),
    ("HKT", "+0800"),
    ("JST", "+0900"),
    ("KST", "+0900"),
    ("AEST", "+1000"),
    ("AEDT", "+1100"),
    ("NZST", "+1200"),
    ("NZDT", "+1300"),
];

const WEEKDAYS: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Parse `input` leniently into a UTC instant. `None` if no known format fits.
pub fn parse_lenient(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = parse_rfc2822_tolerant(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = parse_with_offset(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = parse_naive(s) {
        return Some(Utc.from_utc_datetime(&naive));
    }

    // "2024-03-01 10:00 UTC", "2024-03-01T10:00:00.5Z" and friends
    for suffix in UTC_SUFFIXES {
        if let Some(head) = strip_suffix_ignore_case(s, suffix) {
            let head = head.trim_end();
            if let Some(naive) = parse_naive(head) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }
    }

    if let Some(rest) = strip_weekday(s) {
        return parse_lenient(rest);
    }
    parse_with_zone_abbreviation(s)
}

/// [`parse_lenient`] mapped into a pipeline error naming the input field.
pub fn parse_field(field: &'static str, input: &str) -> Result<DateTime<Utc>, PipelineError> {
    parse_lenient(input).ok_or_else(|| PipelineError::DateParse {
        field,
        input: input.to_string(),
    })
}

/// RFC 2822, also accepting a weekday that disagrees with the date (common
/// in hand-rolled feeds) by retrying without it.
fn parse_rfc2822_tolerant(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt);
    }
    let (head, rest) = s.split_once(',')?;
    if !head.trim().chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    DateTime::parse_from_rfc2822(rest.trim()).ok()
}

/// Drop a leading weekday ("Friday,", "Tues") when something follows it.
fn strip_weekday(s: &str) -> Option<&str> {
    let (head, rest) = s.split_once(char::is_whitespace)?;
    let day = head.trim_end_matches(',').to_ascii_lowercase();
    let is_weekday = day.len() >= 3 && WEEKDAYS.iter().any(|w| w.starts_with(day.as_str()));
    let rest = rest.trim_start();
    (is_weekday && !rest.is_empty()).then_some(rest)
}

/// Trailing upper-case zone token such as `CET`: known abbreviations become
/// their offset, unknown ones are ignored and the rest is read as UTC.
fn parse_with_zone_abbreviation(s: &str) -> Option<DateTime<Utc>> {
    let (head, zone) = s.rsplit_once(char::is_whitespace)?;
    if !(2..=5).contains(&zone.len()) || !zone.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }
    let head = head.trim_end();
    match ZONE_ABBREVIATIONS.iter().find(|(abbr, _)| *abbr == zone) {
        Some((_, offset)) => parse_lenient(&format!("{head} {offset}")),
        None => parse_lenient(head),
    }
}

fn parse_with_offset(s: &str) -> Option<DateTime<FixedOffset>> {
    OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let cut = s.len().checked_sub(suffix.len())?;
    if !s.is_char_boundary(cut) {
        return None;
    }
    let (head, tail) = s.split_at(cut);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

/// Inclusive publish window `[start, end]` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Parse the form inputs. An empty `end` means `now`.
    pub fn parse(start: &str, end: Option<&str>, now: DateTime<Utc>) -> Result<Self, PipelineError> {
        let start = parse_field("start", start)?;
        let end = match end.map(str::trim).filter(|e| !e.is_empty()) {
            Some(e) => parse_field("end", e)?,
            None => now,
        };
        Ok(Self { start, end })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Keep articles published inside the window. The first article whose
    /// `published` cannot be parsed aborts the whole call.
    pub fn filter(&self, articles: &[Article]) -> Result<Vec<Article>, PipelineError> {
        let mut out = Vec::with_capacity(articles.len());
        for a in articles {
            let published = parse_field("published", &a.published)?;
            if self.contains(published) {
                out.push(a.clone());
            }
        }
        Ok(out)
    }
}

/// Filter `articles` to `[start, end]`, with an empty `end` meaning the
/// current time at call.
pub fn filter_by_date_range(
    articles: &[Article],
    start: &str,
    end: Option<&str>,
) -> Result<Vec<Article>, PipelineError> {
    filter_by_date_range_at(articles, start, end, Utc::now())
}

/// [`filter_by_date_range`] with an explicit `now`.
pub fn filter_by_date_range_at(
    articles: &[Article],
    start: &str,
    end: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Vec<Article>, PipelineError> {
    DateRange::parse(start, end, now)?.filter(articles)
}
