//! Named-entity recognition for place names.
//!
//! `EntityRecognizer` is the seam for a real NER model. The bundled
//! `HeuristicRecognizer` combines a gazetteer of place names with
//! capitalized phrases introduced by a locative preposition
//! ("in Pune", "at Shivaji Nagar"), plus organisation names ending in a
//! civic-body keyword.

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;
use triage_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    /// Geopolitical entity: city, district, neighbourhood.
    Gpe,
    Org,
    Person,
    Other,
}

/// A labelled span of the input. Offsets are byte positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
    pub start: usize,
    pub end: usize,
}

/// Text → labelled spans, in order of appearance.
pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, text: &str) -> Result<Vec<Entity>>;
}

const DEFAULT_PLACES: &[&str] = &[
    "Ahmedabad", "Amritsar", "Aurangabad", "Bangalore", "Bengaluru", "Bhopal",
    "Bhubaneswar", "Chandigarh", "Chennai", "Coimbatore", "Dehradun", "Delhi",
    "Faridabad", "Ghaziabad", "Gurgaon", "Gurugram", "Guwahati", "Hyderabad",
    "Indore", "Jaipur", "Jodhpur", "Kanpur", "Kochi", "Kolhapur", "Kolkata",
    "Lucknow", "Ludhiana", "Madurai", "Mangalore", "Mumbai", "Mysore", "Nagpur",
    "Nashik", "Navi Mumbai", "New Delhi", "Noida", "Patna", "Pimpri-Chinchwad",
    "Pune", "Raipur", "Rajkot", "Ranchi", "Satara", "Solapur", "Surat", "Thane",
    "Thiruvananthapuram", "Vadodara", "Varanasi", "Vijayawada", "Visakhapatnam",
];

/// Capitalized words that follow "in"/"at"/"near" without naming a place.
const NON_PLACE_WORDS: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august",
    "september", "october", "november", "december", "monday", "tuesday",
    "wednesday", "thursday", "friday", "saturday", "sunday", "the", "this",
    "that", "these", "our", "my", "your", "their", "his", "her", "its", "an",
    "all", "any", "each", "every", "morning", "evening", "night", "present",
    "future", "past", "order", "view", "regard", "respect", "case", "time",
    "addition", "spite", "front", "charge", "general", "particular", "zone",
];

static PLACE_PHRASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:[Ii]n|[Aa]t|[Nn]ear|[Aa]round)\s+([A-Z][a-zA-Z]+(?:[ -][A-Z][a-zA-Z]+){0,2})")
        .unwrap()
});

static ORG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:[A-Z][a-zA-Z]+\s+){1,4}(?:Society|Association|Committee|Corporation|Council|Federation|Forum|Trust|Board)\b",
    )
    .unwrap()
});

static DEFAULT_GAZETTEER_RE: Lazy<Regex> = Lazy::new(|| {
    gazetteer_regex(DEFAULT_PLACES.iter().map(|s| s.to_string())).unwrap()
});

/// Build one case-insensitive alternation over all places, longest first so
/// "Navi Mumbai" wins over "Mumbai".
fn gazetteer_regex<I: IntoIterator<Item = String>>(places: I) -> Result<Regex> {
    let mut places: Vec<String> = places
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    places.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    if places.is_empty() {
        return Err(Error::Ner("gazetteer is empty".into()));
    }
    let alternation = places
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation))
        .map_err(|e| Error::Ner(format!("invalid gazetteer: {}", e)))
}

/// Gazetteer plus capitalized-phrase recognizer.
#[derive(Clone)]
pub struct HeuristicRecognizer {
    gazetteer: Regex,
}

impl Default for HeuristicRecognizer {
    fn default() -> Self {
        Self {
            gazetteer: DEFAULT_GAZETTEER_RE.clone(),
        }
    }
}

impl HeuristicRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recognizer using the built-in places plus `extra`.
    pub fn with_places<I: IntoIterator<Item = String>>(extra: I) -> Result<Self> {
        let places = DEFAULT_PLACES
            .iter()
            .map(|s| s.to_string())
            .chain(extra);
        Ok(Self {
            gazetteer: gazetteer_regex(places)?,
        })
    }

    /// Extend the built-in places with a newline-separated list.
    /// Blank lines and `#` comments are ignored.
    pub fn load_gazetteer(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let extra: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect();
        info!("Loaded {} gazetteer entries from {}", extra.len(), path.display());
        Self::with_places(extra)
    }

    fn place_phrases(&self, text: &str, out: &mut Vec<Entity>) {
        for cap in PLACE_PHRASE_RE.captures_iter(text) {
            let Some(m) = cap.get(1) else { continue };
            let first = m.as_str().split([' ', '-']).next().unwrap_or_default();
            if NON_PLACE_WORDS.contains(&first.to_lowercase().as_str()) {
                continue;
            }
            out.push(Entity {
                text: m.as_str().to_string(),
                label: EntityLabel::Gpe,
                start: m.start(),
                end: m.end(),
            });
        }
    }
}

impl EntityRecognizer for HeuristicRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        let mut found: Vec<Entity> = self
            .gazetteer
            .find_iter(text)
            .map(|m| Entity {
                text: m.as_str().to_string(),
                label: EntityLabel::Gpe,
                start: m.start(),
                end: m.end(),
            })
            .collect();
        for m in ORG_RE.find_iter(text) {
            found.push(Entity {
                text: m.as_str().to_string(),
                label: EntityLabel::Org,
                start: m.start(),
                end: m.end(),
            });
        }
        self.place_phrases(text, &mut found);

        // Earliest first; on overlap keep the longer span.
        found.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
        let mut entities: Vec<Entity> = Vec::with_capacity(found.len());
        for entity in found {
            match entities.last() {
                Some(prev) if entity.start < prev.end => continue,
                _ => entities.push(entity),
            }
        }
        Ok(entities)
    }
}
