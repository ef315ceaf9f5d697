//! Affected-population estimation from natural-language cues.
//!
//! An explicit count ("affecting approximately 1,200 residents") always
//! wins. Otherwise qualitative phrases map onto a fixed ladder:
//! "thousands of people" → 10000, "many residents" → 3000,
//! "few families" → 800, nothing → 500.

use once_cell::sync::Lazy;
use regex::Regex;

use super::rules::RuleChain;

pub const LARGE_IMPACT_POPULATION: u64 = 10_000;
pub const MEDIUM_IMPACT_POPULATION: u64 = 3_000;
pub const SMALL_IMPACT_POPULATION: u64 = 800;
pub const DEFAULT_POPULATION: u64 = 500;

const PEOPLE_WORDS: &str =
    "people|residents|citizens|individuals|families|households|population";

static EXPLICIT_COUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:affecting|affected|impacting)\s+(?:approximately\s+)?(\d[\d,]*)\s+(?:people|residents|citizens|individuals|families|households)",
    )
    .unwrap()
});

static LARGE_IMPACT_RE: Lazy<Regex> =
    Lazy::new(|| cue_regex("thousands of|large number of|numerous"));

static MEDIUM_IMPACT_RE: Lazy<Regex> =
    Lazy::new(|| cue_regex("many|several|multiple|large group of"));

static SMALL_IMPACT_RE: Lazy<Regex> =
    Lazy::new(|| cue_regex("few|some|limited number of|nearby"));

static POPULATION_RULES: Lazy<RuleChain<u64>> = Lazy::new(|| {
    RuleChain::new("population")
        .rule("explicit_count", explicit_count)
        .rule("large_impact", large_impact)
        .rule("medium_impact", medium_impact)
        .rule("small_impact", small_impact)
});

fn cue_regex(cues: &str) -> Regex {
    Regex::new(&format!(r"(?:{})\s+(?:{})", cues, PEOPLE_WORDS)).unwrap()
}

/// Estimated number of people affected by the complaint.
pub fn resolve_population(text: &str) -> u64 {
    POPULATION_RULES
        .resolve(&text.to_lowercase())
        .unwrap_or(DEFAULT_POPULATION)
}

fn explicit_count(text: &str) -> Option<u64> {
    let cap = EXPLICIT_COUNT_RE.captures(text)?;
    Some(parse_count(&cap[1]))
}

/// Digits with thousands separators removed, saturating at `u64::MAX`.
fn parse_count(digits: &str) -> u64 {
    digits
        .chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0u64, |acc, d| acc.saturating_mul(10).saturating_add(u64::from(d)))
}

fn large_impact(text: &str) -> Option<u64> {
    LARGE_IMPACT_RE
        .is_match(text)
        .then_some(LARGE_IMPACT_POPULATION)
}

fn medium_impact(text: &str) -> Option<u64> {
    MEDIUM_IMPACT_RE
        .is_match(text)
        .then_some(MEDIUM_IMPACT_POPULATION)
}

fn small_impact(text: &str) -> Option<u64> {
    SMALL_IMPACT_RE
        .is_match(text)
        .then_some(SMALL_IMPACT_POPULATION)
}
