//! Complaint data model shared by the loader, extractors, scorer and ranker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sender used when no signature or organization line is found.
pub const ANONYMOUS_SENDER: &str = "Anonymous";

/// Date sentinel used when no recognizable date appears in the text.
pub const DATE_NOT_MENTIONED: &str = "Not mentioned";

/// An uploaded file, consumed once by the loader.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Content type declared by the client, if any.
    pub content_type: Option<String>,
}

impl RawDocument {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Lowercased file extension without the dot (empty when absent).
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase()
    }
}

/// One row of a CSV/XLS/XLSX upload. Missing columns are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredRecord {
    pub subject: String,
    pub complaint: String,
    pub location: String,
    pub date: String,
    pub sender: String,
}

/// What the loader produced for one document.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedContent {
    /// Free text from PDF/DOCX, possibly OCR-derived.
    UnstructuredText(String),
    /// Tabular rows from CSV/XLS/XLSX.
    StructuredRecords(Vec<StructuredRecord>),
}

/// Loader output: the parsed content plus whether OCR produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub content: ParsedContent,
    pub ocr_used: bool,
}

/// Document-level metadata echoed back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub file_type: Option<String>,
}

/// Fields extracted from one document or one tabular row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub subject: Option<String>,
    pub complaint: String,
    pub sender: String,
    /// `YYYY-MM-DD`, the raw matched text when unparseable, or `"Not mentioned"`.
    pub date: String,
    pub location: Option<String>,
    pub population_used: u64,
    pub ocr_used: bool,
    #[serde(default)]
    pub metadata: SourceMetadata,
}

/// Absolute risk band derived from the model score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Fixed step function: `<40 Low`, `<65 Medium`, `<80 High`, else `Critical`.
    pub fn from_score(score: f64) -> Self {
        if score < 40.0 {
            Self::Low
        } else if score < 65.0 {
            Self::Medium
        } else if score < 80.0 {
            Self::High
        } else {
            Self::Critical
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// Batch-relative rank band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Band for a position ratio in `[0, 1]` over the distinct scores of a batch.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio <= 0.33 {
            Self::High
        } else if ratio <= 0.66 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}

/// Per-item scorer output. Carries no priority: that needs the whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub severity: Severity,
}

/// Final risk block of a ranked result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysis {
    pub risk_score: f64,
    pub severity: Severity,
    pub priority: Priority,
}

/// A scored item waiting for the batch ranking pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredComplaint {
    pub filename: String,
    pub extracted: ExtractedFields,
    pub assessment: RiskAssessment,
}

impl ScoredComplaint {
    /// Attach the batch-assigned priority.
    pub fn into_result(self, priority: Priority) -> ComplaintResult {
        ComplaintResult {
            filename: self.filename,
            extracted: self.extracted,
            risk_analysis: RiskAnalysis {
                risk_score: self.assessment.risk_score,
                severity: self.assessment.severity,
                priority,
            },
        }
    }
}

/// The unit returned to the caller and handed to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplaintResult {
    pub filename: String,
    pub extracted: ExtractedFields,
    pub risk_analysis: RiskAnalysis,
}

/// A file of the batch that produced no results, or one tabular row of it
/// that could not be scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub filename: String,
    /// 1-based data row, for failures confined to one row of a sheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    pub kind: String,
    pub message: String,
    pub status: u16,
}

impl FileFailure {
    pub fn from_error(filename: impl Into<String>, err: &crate::Error) -> Self {
        Self {
            filename: filename.into(),
            row: None,
            kind: err.kind().to_string(),
            message: err.to_string(),
            status: err.status_code(),
        }
    }

    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }
}

/// Outcome of one submitted batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Ranked results, descending risk score.
    pub results: Vec<ComplaintResult>,
    pub errors: Vec<FileFailure>,
    /// Tabular rows dropped for lack of complaint text.
    pub skipped_rows: usize,
    /// Files that contributed no result and at least one failure.
    #[serde(skip)]
    pub failed_files: usize,
}

/// Workflow state of a persisted complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Open,
    InProgress,
    Resolved,
    Rejected,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "open" => Some(Self::Open),
            "in_progress" | "in-progress" => Some(Self::InProgress),
            "resolved" => Some(Self::Resolved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// A ranked result as written by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredComplaint {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub status: ComplaintStatus,
    pub content_hash: String,
    #[serde(flatten)]
    pub result: ComplaintResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_bands() {
        assert_eq!(Severity::from_score(0.0), Severity::Low);
        assert_eq!(Severity::from_score(39.99), Severity::Low);
        assert_eq!(Severity::from_score(40.0), Severity::Medium);
        assert_eq!(Severity::from_score(64.99), Severity::Medium);
        assert_eq!(Severity::from_score(65.0), Severity::High);
        assert_eq!(Severity::from_score(79.99), Severity::High);
        assert_eq!(Severity::from_score(80.0), Severity::Critical);
        assert_eq!(Severity::from_score(100.0), Severity::Critical);
    }

    #[test]
    fn test_priority_ratio_boundaries() {
        assert_eq!(Priority::from_ratio(0.0), Priority::High);
        assert_eq!(Priority::from_ratio(0.33), Priority::High);
        assert_eq!(Priority::from_ratio(1.0 / 3.0), Priority::Medium);
        assert_eq!(Priority::from_ratio(0.66), Priority::Medium);
        assert_eq!(Priority::from_ratio(2.0 / 3.0), Priority::Low);
        assert_eq!(Priority::from_ratio(1.0), Priority::Low);
    }

    #[test]
    fn test_extension_is_lowercased() {
        let doc = RawDocument::new("Complaint.PDF", Vec::new());
        assert_eq!(doc.extension(), "pdf");
        assert_eq!(RawDocument::new("README", Vec::new()).extension(), "");
    }

    #[test]
    fn test_result_serialization_shape() {
        let scored = ScoredComplaint {
            filename: "a.pdf".into(),
            extracted: ExtractedFields {
                subject: None,
                complaint: "Garbage has not been collected for a week".into(),
                sender: ANONYMOUS_SENDER.into(),
                date: DATE_NOT_MENTIONED.into(),
                location: Some("Zone 3".into()),
                population_used: 500,
                ocr_used: false,
                metadata: SourceMetadata::default(),
            },
            assessment: RiskAssessment {
                risk_score: 72.5,
                severity: Severity::High,
            },
        };
        let json = serde_json::to_value(scored.into_result(Priority::Medium)).unwrap();
        assert_eq!(json["filename"], "a.pdf");
        assert!(json["extracted"]["subject"].is_null());
        assert_eq!(json["extracted"]["population_used"], 500);
        assert_eq!(json["risk_analysis"]["severity"], "High");
        assert_eq!(json["risk_analysis"]["priority"], "Medium");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(ComplaintStatus::parse("Open"), Some(ComplaintStatus::Open));
        assert_eq!(
            ComplaintStatus::parse("in-progress"),
            Some(ComplaintStatus::InProgress)
        );
        assert_eq!(ComplaintStatus::parse("closed"), None);
        assert_eq!(ComplaintStatus::Resolved.as_str(), "resolved");
    }
}
