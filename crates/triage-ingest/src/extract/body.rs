//! Complaint body and complaint summary extraction.
//!
//! The body is what remains of a letter after headers, metadata lines,
//! address blocks and the sign-off footer are filtered out. The complaint is
//! the first few substantial sentences of that body.

use once_cell::sync::Lazy;
use regex::Regex;

use super::text::{is_title_word, non_blank_lines, normalize_whitespace};

/// Lines shorter than this are headers, names or salutations.
const MIN_LINE_CHARS: usize = 30;

/// Lines at least this long are kept even without a verb.
const LONG_LINE_CHARS: usize = 60;

/// Share of title-cased words above which a comma-heavy line is an address.
const ADDRESS_TITLE_RATIO: f64 = 0.6;

/// Bodies shorter than this yield no complaint.
const MIN_BODY_CHARS: usize = 50;

/// Sentence fragments must be longer than this to count.
const MIN_SENTENCE_CHARS: usize = 20;

const MAX_SENTENCES: usize = 4;

static SUBJECT_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^subject\s*[:\-]").unwrap());

static ADDRESSING_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(to|from)\s*[:\-]").unwrap());

static METADATA_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(date|location|sender|address)\s*[:\-]").unwrap());

static SIGN_OFF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(yours sincerely|yours faithfully|with regards|thank you)").unwrap()
});

static VERB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(is|are|has|have|was|were|remain|causing|resulting)\b").unwrap()
});

static SENTENCE_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]").unwrap());

/// What to do with one line of a letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineVerdict {
    Keep,
    Drop,
    /// Sign-off reached; nothing after this line is body text.
    Footer,
}

fn classify_line(line: &str) -> LineVerdict {
    if SUBJECT_LINE_RE.is_match(line)
        || ADDRESSING_LINE_RE.is_match(line)
        || METADATA_LINE_RE.is_match(line)
    {
        return LineVerdict::Drop;
    }
    if SIGN_OFF_RE.is_match(line) {
        return LineVerdict::Footer;
    }
    if is_address_line(line) {
        return LineVerdict::Drop;
    }

    let len = line.chars().count();
    if len < MIN_LINE_CHARS {
        return LineVerdict::Drop;
    }
    if VERB_RE.is_match(line) || len >= LONG_LINE_CHARS {
        LineVerdict::Keep
    } else {
        LineVerdict::Drop
    }
}

/// Comma-separated, mostly title-cased: "Flat 4, Green Park, Baner Road".
fn is_address_line(line: &str) -> bool {
    if line.matches(',').count() < 2 {
        return false;
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    let titled = words.iter().filter(|w| is_title_word(w)).count();
    titled as f64 / words.len().max(1) as f64 > ADDRESS_TITLE_RATIO
}

/// Sentence-like body lines of a letter, joined into one paragraph.
pub fn extract_body(text: &str) -> String {
    let mut kept = Vec::new();
    for line in non_blank_lines(text) {
        match classify_line(line) {
            LineVerdict::Keep => kept.push(line),
            LineVerdict::Drop => {}
            LineVerdict::Footer => break,
        }
    }
    normalize_whitespace(&kept.join(" "))
}

/// First few substantial sentences of a body, or empty when the body is too
/// short to describe a complaint.
pub fn extract_complaint(body: &str) -> String {
    if body.chars().count() < MIN_BODY_CHARS {
        return String::new();
    }
    SENTENCE_END_RE
        .split(body)
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .take(MAX_SENTENCES)
        .collect::<Vec<_>>()
        .join(". ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTER: &str = "To: The Ward Officer\n\
        Pune Municipal Corporation\n\
        Subject: Overflowing sewage line\n\
        Date: 04/01/2025\n\
        Respected Sir,\n\
        The sewage line near the school has been overflowing for a week.\n\
        Children walking to school are exposed to filth every single morning\n\
        Flat 12, Green Park Society, Baner Road, Pune\n\
        Kindly take action soon\n\
        Yours sincerely,\n\
        This line is after the footer and must be ignored entirely.";

    #[test]
    fn test_body_filters_letter_furniture() {
        assert_eq!(
            extract_body(LETTER),
            "The sewage line near the school has been overflowing for a week. \
             Children walking to school are exposed to filth every single morning"
        );
    }

    #[test]
    fn test_long_line_without_verb_kept() {
        let line = "Complete darkness along the entire stretch near the railway crossing";
        assert_eq!(classify_line(line), LineVerdict::Keep);
        assert_eq!(
            classify_line("Darkness along the stretch near the crossing"),
            LineVerdict::Drop
        );
    }

    #[test]
    fn test_sign_off_is_footer() {
        assert_eq!(classify_line("Thank you for your attention"), LineVerdict::Footer);
        assert_eq!(extract_body("Thank you\nThe road is broken and dangerous for all."), "");
    }

    #[test]
    fn test_address_line_detection() {
        assert!(is_address_line("Flat 12, Green Park Society, Baner Road, Pune"));
        assert!(!is_address_line("The road, the drain, and the lights are all broken"));
        assert!(!is_address_line("Sector Nine Main Road Pune"));
    }

    #[test]
    fn test_complaint_short_body_is_empty() {
        assert_eq!(extract_complaint(""), "");
        assert_eq!(extract_complaint("Garbage not collected. Please act."), "");
    }

    #[test]
    fn test_complaint_keeps_first_four_sentences() {
        let body = "The main road near the bus stand is broken. Ok. \
            Vehicles are getting damaged every single day! \
            Two accidents have happened this month alone? \
            Residents have complained twice before without result. \
            The monsoon will make this far worse for everyone.";
        assert_eq!(
            extract_complaint(body),
            "The main road near the bus stand is broken. \
             Vehicles are getting damaged every single day. \
             Two accidents have happened this month alone. \
             Residents have complained twice before without result"
        );
    }
}
