//! CivicTriage Ingest: format-aware document loading and heuristic field extraction.

pub mod docx;
pub mod extract;
pub mod loader;
pub mod ocr;
pub mod staging;
pub mod tabular;

pub use extract::entities::{Entity, EntityLabel, EntityRecognizer, HeuristicRecognizer};
pub use extract::{extract_document, DocumentExtraction};
pub use loader::{DocumentLoader, FileType};
pub use ocr::{OcrEngine, PopplerTesseract};
pub use staging::StagedFile;
