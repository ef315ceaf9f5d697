//! Complaint date extraction.
//!
//! Four patterns are tried in a fixed order. The first one that matches
//! decides the result: a valid calendar date becomes ISO `YYYY-MM-DD`, an
//! invalid one (e.g. `31/02/2025`) is returned exactly as written.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;
use triage_core::DATE_NOT_MENTIONED;

use super::rules::RuleChain;
use super::text::normalize_whitespace;

static LONG_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2})\s*(January|February|March|April|May|June|July|August|September|October|November|December)\s*(\d{4})\b",
    )
    .unwrap()
});

static SHORT_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s*(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)\s*(\d{4})\b")
        .unwrap()
});

static DAY_FIRST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})([-/])(\d{1,2})([-/])(\d{4})\b").unwrap());

static YEAR_FIRST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})([-/])(\d{1,2})([-/])(\d{1,2})\b").unwrap());

static DATE_RULES: Lazy<RuleChain<String>> = Lazy::new(|| {
    RuleChain::new("date")
        .rule("day_month_name", day_month_name)
        .rule("day_month_abbrev", day_month_abbrev)
        .rule("day_first_numeric", day_first_numeric)
        .rule("year_first_numeric", year_first_numeric)
});

/// Date mentioned in the text, or `"Not mentioned"`.
pub fn extract_date(text: &str) -> String {
    DATE_RULES
        .resolve(&normalize_whitespace(text))
        .unwrap_or_else(|| DATE_NOT_MENTIONED.to_string())
}

fn day_month_name(text: &str) -> Option<String> {
    named_month(&LONG_MONTH_RE, text)
}

fn day_month_abbrev(text: &str) -> Option<String> {
    named_month(&SHORT_MONTH_RE, text)
}

fn named_month(re: &Regex, text: &str) -> Option<String> {
    let cap = re.captures(text)?;
    let date = month_number(&cap[2])
        .and_then(|month| ymd(&cap[3], month, &cap[1]));
    Some(iso_or_raw(&cap, date))
}

fn day_first_numeric(text: &str) -> Option<String> {
    let cap = DAY_FIRST_RE.captures(text)?;
    let date = if cap[2] == cap[4] {
        cap[3]
            .parse::<u32>()
            .ok()
            .and_then(|month| ymd(&cap[5], month, &cap[1]))
    } else {
        None
    };
    Some(iso_or_raw(&cap, date))
}

fn year_first_numeric(text: &str) -> Option<String> {
    let cap = YEAR_FIRST_RE.captures(text)?;
    let date = if cap[2] == cap[4] {
        cap[3]
            .parse::<u32>()
            .ok()
            .and_then(|month| ymd(&cap[1], month, &cap[5]))
    } else {
        None
    };
    Some(iso_or_raw(&cap, date))
}

fn ymd(year: &str, month: u32, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month, day.parse().ok()?)
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn iso_or_raw(cap: &Captures<'_>, date: Option<NaiveDate>) -> String {
    let raw = &cap[0];
    match date {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => {
            debug!("Unparseable date '{}', keeping raw text", raw);
            raw.to_string()
        }
    }
}
