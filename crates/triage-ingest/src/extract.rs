//! Heuristic field extraction from complaint letters.
//!
//! Every field is produced by an ordered rule chain (see [`rules`]) tuned for
//! noisy, government-style correspondence, including OCR output.

pub mod body;
pub mod date;
pub mod entities;
pub mod location;
pub mod population;
pub mod rules;
pub mod sender;
pub mod subject;
pub mod text;

pub use body::{extract_body, extract_complaint};
pub use date::extract_date;
pub use location::extract_location;
pub use population::resolve_population;
pub use sender::extract_sender;
pub use subject::extract_subject;

use serde::{Deserialize, Serialize};

use entities::EntityRecognizer;

/// All fields extracted from one unstructured document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentExtraction {
    pub subject: Option<String>,
    /// Filtered body text the complaint and population are derived from.
    pub body: String,
    /// Empty when the document holds no usable complaint.
    pub complaint: String,
    pub sender: String,
    pub date: String,
    pub location: Option<String>,
    pub population: u64,
}

/// Run every extractor over a document's raw text.
///
/// Subject, sender, date and location read the raw text; the complaint and
/// the affected population are derived from the filtered body.
pub fn extract_document(raw_text: &str, recognizer: &dyn EntityRecognizer) -> DocumentExtraction {
    let body = extract_body(raw_text);
    let complaint = extract_complaint(&body);
    let population = resolve_population(&body);

    DocumentExtraction {
        subject: extract_subject(raw_text),
        complaint,
        sender: extract_sender(raw_text),
        date: extract_date(raw_text),
        location: extract_location(raw_text, recognizer),
        population,
        body,
    }
}
