//! DOCX paragraph text extraction.
//!
//! A DOCX file is a ZIP archive; body text lives in `word/document.xml` as
//! `w:p` paragraphs made of `w:t` runs.

use std::io::Read;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use triage_core::{Error, Result};

const DOCUMENT_PART: &str = "word/document.xml";

static PARAGRAPH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<w:p(?:\s[^>]*[^/])?>(.*?)</w:p>").unwrap());

static PARAGRAPH_PROPS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<w:pPr>.*?</w:pPr>").unwrap());

static RUN_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*[^/])?>(.*?)</w:t>|<w:(tab|br|cr)(?:\s[^>]*)?/>").unwrap()
});

static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(amp|lt|gt|quot|apos|#[0-9]+|#x[0-9a-fA-F]+);").unwrap());

/// Read a DOCX file and return its non-blank paragraphs joined with newlines.
pub fn read_docx_text(path: &Path) -> Result<String> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| Error::Parse(format!("not a valid DOCX archive: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| Error::Parse(format!("DOCX is missing {}: {}", DOCUMENT_PART, e)))?
        .read_to_string(&mut xml)?;

    Ok(paragraphs_from_xml(&xml).join("\n").trim().to_string())
}

/// Extract non-blank paragraph texts from a `document.xml` body.
pub fn paragraphs_from_xml(xml: &str) -> Vec<String> {
    PARAGRAPH_RE
        .captures_iter(xml)
        .filter_map(|cap| {
            let inner = PARAGRAPH_PROPS_RE.replace_all(&cap[1], "");
            let mut text = String::new();
            for token in RUN_TOKEN_RE.captures_iter(&inner) {
                if let Some(run) = token.get(1) {
                    text.push_str(&unescape_xml(run.as_str()));
                } else {
                    match token.get(2).map(|m| m.as_str()) {
                        Some("tab") => text.push('\t'),
                        _ => text.push('\n'),
                    }
                }
            }
            if text.trim().is_empty() {
                None
            } else {
                Some(text)
            }
        })
        .collect()
}

fn unescape_xml(s: &str) -> String {
    ENTITY_RE
        .replace_all(s, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match name {
                "amp" => "&".to_string(),
                "lt" => "<".to_string(),
                "gt" => ">".to_string(),
                "quot" => "\"".to_string(),
                "apos" => "'".to_string(),
                _ => {
                    let code = if let Some(hex) = name.strip_prefix("#x") {
                        u32::from_str_radix(hex, 16).ok()
                    } else {
                        name[1..].parse::<u32>().ok()
                    };
                    code.and_then(char::from_u32)
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| caps[0].to_string())
                }
            }
        })
        .into_owned()
}
