use once_cell::sync::Lazy;
use regex::Regex;
use triage_core::ANONYMOUS_SENDER;

use super::rules::RuleChain;
use super::text::non_blank_lines;

/// Closing lines searched for an organisation-style signature.
const SIGNATURE_SCAN_LINES: usize = 5;

const ORGANISATION_KEYWORDS: &[&str] = &[
    "committee",
    "association",
    "residents",
    "society",
    "citizens",
    "welfare",
];

static SENDER_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^sender[\s:\-]+(.+)").unwrap());

static SENDER_INLINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bsender\s*:\s*(.+)$").unwrap());

static SENDER_RULES: Lazy<RuleChain<String>> = Lazy::new(|| {
    RuleChain::new("sender")
        .rule("labelled_line", labelled_line)
        .rule("inline_label", inline_label)
        .rule("organisation_signature", organisation_signature)
});

/// Sender of a complaint letter, `"Anonymous"` when none is found.
pub fn extract_sender(text: &str) -> String {
    SENDER_RULES
        .resolve(text)
        .unwrap_or_else(|| ANONYMOUS_SENDER.to_string())
}

/// Last line starting with a `Sender` label.
fn labelled_line(text: &str) -> Option<String> {
    non_blank_lines(text)
        .into_iter()
        .rev()
        .find_map(|line| SENDER_LINE_RE.captures(line).map(|c| c[1].trim().to_string()))
}

/// Last `Sender:` label appearing mid-line.
fn inline_label(text: &str) -> Option<String> {
    non_blank_lines(text)
        .into_iter()
        .rev()
        .find_map(|line| SENDER_INLINE_RE.captures(line).map(|c| c[1].trim().to_string()))
}

/// A closing line that names a residents' body or similar organisation.
fn organisation_signature(text: &str) -> Option<String> {
    let lines = non_blank_lines(text);
    let tail = &lines[lines.len().saturating_sub(SIGNATURE_SCAN_LINES)..];
    tail.iter()
        .rev()
        .find(|line| {
            let lower = line.to_lowercase();
            ORGANISATION_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .map(|line| line.to_string())
}
