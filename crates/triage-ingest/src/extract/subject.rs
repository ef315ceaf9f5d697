use once_cell::sync::Lazy;
use regex::Regex;

use super::rules::RuleChain;
use super::text::non_blank_lines;

/// Only the opening lines of a letter are searched for a subject label.
const SUBJECT_SCAN_LINES: usize = 5;

static SUBJECT_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^subject[\s:\-]+(.+)").unwrap());

static SUBJECT_RULES: Lazy<RuleChain<String>> = Lazy::new(|| {
    RuleChain::new("subject")
        .rule("labelled", labelled_subject)
        .rule("leading_line", leading_line)
});

/// Subject of a complaint letter, if one can be identified.
pub fn extract_subject(text: &str) -> Option<String> {
    SUBJECT_RULES.resolve(text)
}

/// `Subject: ...` (or `Subject - ...`) within the first few lines.
fn labelled_subject(text: &str) -> Option<String> {
    non_blank_lines(text)
        .into_iter()
        .take(SUBJECT_SCAN_LINES)
        .find_map(|line| {
            SUBJECT_LABEL_RE
                .captures(line)
                .map(|cap| cap[1].trim().to_string())
        })
}

/// A short first line, as in headed government correspondence.
fn leading_line(text: &str) -> Option<String> {
    let first = non_blank_lines(text).into_iter().next()?;
    let len = first.chars().count();
    (len > 5 && len < 120).then(|| first.to_string())
}
