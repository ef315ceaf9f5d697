//! Error types for CivicTriage.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported file type '{extension}' for {filename}. Upload PDF, DOCX, CSV, XLS or XLSX only.")]
    UnsupportedFormat { filename: String, extension: String },

    #[error("Could not extract complaint text from {0}")]
    ExtractionFailure(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("Entity recognition error: {0}")]
    Ner(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status the transport layer should report for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnsupportedFormat { .. } | Self::ExtractionFailure(_) | Self::Parse(_) => 422,
            Self::NotFound(_) => 404,
            Self::Timeout(_) => 504,
            _ => 500,
        }
    }

    /// Stable machine-readable name, used in batch failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::ExtractionFailure(_) => "extraction_failure",
            Self::Parse(_) => "parse_error",
            Self::Inference(_) | Self::Ocr(_) | Self::Ner(_) => "external_model_failure",
            Self::Timeout(_) => "timeout",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) | Self::Database(_) => "storage_error",
            Self::Io(_) | Self::Json(_) | Self::Config(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// Whether the caller is at fault (4xx) rather than the server.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let unsupported = Error::UnsupportedFormat {
            filename: "notes.txt".into(),
            extension: "txt".into(),
        };
        assert_eq!(unsupported.status_code(), 422);
        assert!(unsupported.is_client_error());
        assert!(unsupported.to_string().contains("notes.txt"));

        let failure = Error::ExtractionFailure("letter.pdf".into());
        assert_eq!(failure.status_code(), 422);
        assert_eq!(
            failure.to_string(),
            "Could not extract complaint text from letter.pdf"
        );

        let model = Error::Inference("embedder offline".into());
        assert_eq!(model.status_code(), 500);
        assert_eq!(model.kind(), "external_model_failure");
        assert!(!model.is_client_error());
    }
}
