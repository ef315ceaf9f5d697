use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::entities::{EntityLabel, EntityRecognizer};
use super::rules::RuleChain;
use super::text::{normalize_whitespace, title_case};

static ZONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bzone\s*[-:]?\s*\d+\b").unwrap());

/// OCR sometimes spaces out letters: "Z O N E 7".
static SPACED_ZONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bz\s*o\s*n\s*e\s*\d+\b").unwrap());

static ZONE_RULES: Lazy<RuleChain<String>> = Lazy::new(|| {
    RuleChain::new("location")
        .rule("zone", zone)
        .rule("spaced_zone", spaced_zone)
});

/// Location of the complaint: an administrative zone if one is named,
/// otherwise the first place the recognizer finds.
///
/// Recognizer errors are logged and treated as "no location".
pub fn extract_location(text: &str, recognizer: &dyn EntityRecognizer) -> Option<String> {
    let text = normalize_whitespace(text);
    if let Some(zone) = ZONE_RULES.resolve(&text) {
        return Some(zone);
    }

    match recognizer.recognize(&text) {
        Ok(entities) => entities
            .into_iter()
            .find(|e| e.label == EntityLabel::Gpe)
            .map(|e| e.text),
        Err(e) => {
            debug!("Entity recognition failed, no location: {}", e);
            None
        }
    }
}

fn zone(text: &str) -> Option<String> {
    ZONE_RE.find(text).map(|m| normalize_zone(m.as_str()))
}

fn spaced_zone(text: &str) -> Option<String> {
    SPACED_ZONE_RE.find(text).map(|m| normalize_zone(m.as_str()))
}

/// "zone-3" → "Zone 3", "Z O N E 7" → "Zone7".
fn normalize_zone(matched: &str) -> String {
    title_case(&matched.replace(' ', "")).replace('-', " ")
}
