//! End-to-end batch processing with in-memory collaborators.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use ndarray::{Array1, array};
use parking_lot::Mutex;
use triage_core::{
    Error, Priority, RawDocument, Result, Severity, StoredComplaint, ANONYMOUS_SENDER,
    DATE_NOT_MENTIONED,
};
use triage_infer::{
    EmbedderBackend, EmbeddingResult, IdentityScaler, NoopEmbedder, RiskRegressor, RiskScorer,
};
use triage_ingest::{HeuristicRecognizer, OcrEngine};
use triage_runtime::{ModelContext, Orchestrator};
use triage_store::ComplaintSink;

struct ConstEmbedder;

impl EmbedderBackend for ConstEmbedder {
    fn embed(&self, _text: &str) -> Result<EmbeddingResult> {
        Ok(EmbeddingResult {
            embedding: array![0.25, -0.5],
            cached: false,
        })
    }

    fn dimension(&self) -> usize {
        2
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Fails on any complaint mentioning `trigger`.
struct SelectiveEmbedder {
    trigger: &'static str,
}

impl EmbedderBackend for SelectiveEmbedder {
    fn embed(&self, text: &str) -> Result<EmbeddingResult> {
        if text.to_lowercase().contains(self.trigger) {
            return Err(Error::Inference("session run failed".into()));
        }
        ConstEmbedder.embed(text)
    }

    fn dimension(&self) -> usize {
        2
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Risk = 10 × ln(1 + population), the last feature.
struct PopulationRegressor;

impl RiskRegressor for PopulationRegressor {
    fn predict(&self, features: &Array1<f64>) -> Result<f64> {
        Ok(10.0 * features[features.len() - 1])
    }
}

struct NoOcr;

impl OcrEngine for NoOcr {
    fn rasterize_and_ocr(&self, _pdf_path: &Path) -> Result<String> {
        Err(Error::Ocr("tesseract not installed".into()))
    }
}

#[derive(Default)]
struct RecordingSink {
    records: Mutex<Vec<StoredComplaint>>,
}

impl ComplaintSink for RecordingSink {
    fn persist(&self, complaint: &StoredComplaint) -> Result<()> {
        self.records.lock().push(complaint.clone());
        Ok(())
    }
}

struct BrokenSink;

impl ComplaintSink for BrokenSink {
    fn persist(&self, _complaint: &StoredComplaint) -> Result<()> {
        Err(Error::Database("disk I/O error".into()))
    }
}

fn models(embedder: Arc<dyn EmbedderBackend>) -> Arc<ModelContext> {
    let scorer = RiskScorer::new(
        embedder,
        Arc::new(IdentityScaler),
        Arc::new(PopulationRegressor),
    );
    Arc::new(ModelContext::new(
        scorer,
        Arc::new(HeuristicRecognizer::new()),
        Arc::new(NoOcr),
    ))
}

fn orchestrator() -> Orchestrator {
    Orchestrator::new(models(Arc::new(ConstEmbedder)))
}

fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{}</w:body></w:document>",
        body
    );
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

fn water_leakage_letter() -> RawDocument {
    RawDocument::new(
        "leak.docx",
        docx(&[
            "Subject: Water leakage",
            "This is to inform that water has been leaking for 3 days, affecting \
             approximately 1200 residents. Sender: Residents Welfare Society",
        ]),
    )
    .with_content_type("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
}

fn complaint_sheet() -> RawDocument {
    let csv = "subject,complaint,location,date,sender\n\
        Streetlights,The streetlights on the main road have not worked for two weeks and several residents have reported thefts.,Ward 7,2025-01-04,Ward Committee\n\
        Empty,,,,\n\
        ,Sewage is overflowing beside the school and a few families have fallen sick this month.,,,\n";
    RawDocument::new("sheet.csv", csv.as_bytes().to_vec()).with_content_type("text/csv")
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_water_leakage_scenario() {
    let report = orchestrator().process_batch(vec![water_leakage_letter()]);
    assert!(report.errors.is_empty());
    assert_eq!(report.results.len(), 1);

    let result = &report.results[0];
    assert_eq!(result.filename, "leak.docx");
    assert_eq!(result.extracted.subject.as_deref(), Some("Water leakage"));
    assert_eq!(result.extracted.sender, "Residents Welfare Society");
    assert_eq!(result.extracted.date, DATE_NOT_MENTIONED);
    assert_eq!(result.extracted.population_used, 1200);
    assert!(!result.extracted.ocr_used);
    assert!(result
        .extracted
        .metadata
        .file_type
        .as_deref()
        .unwrap()
        .contains("wordprocessingml"));

    // 10 × ln(1201) = 70.909...
    assert!(close(result.risk_analysis.risk_score, 70.91));
    assert_eq!(result.risk_analysis.severity, Severity::High);
    assert_eq!(result.risk_analysis.priority, Priority::High);
}

#[test]
fn test_mixed_batch_ranked_with_per_file_isolation() {
    let batch = vec![
        water_leakage_letter(),
        RawDocument::new("notes.txt", b"water leaking everywhere".to_vec()),
        complaint_sheet(),
        RawDocument::new("blank.docx", docx(&["Scan", "Page 1"])),
    ];
    let report = orchestrator().process_batch(batch);

    let names: Vec<&str> = report.results.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, vec!["sheet.csv", "leak.docx", "sheet.csv"]);
    assert_eq!(report.skipped_rows, 1);

    let top = &report.results[0];
    assert_eq!(top.extracted.subject.as_deref(), Some("Streetlights"));
    assert_eq!(top.extracted.location.as_deref(), Some("Ward 7"));
    assert_eq!(top.extracted.date, "2025-01-04");
    assert_eq!(top.extracted.sender, "Ward Committee");
    assert_eq!(top.extracted.population_used, 3000);
    assert!(close(top.risk_analysis.risk_score, 80.07));
    assert_eq!(top.risk_analysis.severity, Severity::Critical);

    let last = &report.results[2];
    assert_eq!(last.extracted.subject, None);
    assert_eq!(last.extracted.sender, ANONYMOUS_SENDER);
    assert_eq!(last.extracted.date, DATE_NOT_MENTIONED);
    assert_eq!(last.extracted.population_used, 800);
    assert!(!last.extracted.ocr_used);

    let priorities: Vec<Priority> = report
        .results
        .iter()
        .map(|r| r.risk_analysis.priority)
        .collect();
    assert_eq!(priorities, vec![Priority::High, Priority::Medium, Priority::Low]);

    assert_eq!(report.errors.len(), 2);
    assert_eq!(report.failed_files, 2);
    assert_eq!(report.errors[0].filename, "notes.txt");
    assert_eq!(report.errors[0].kind, "unsupported_format");
    assert_eq!(report.errors[0].status, 422);
    assert_eq!(report.errors[1].filename, "blank.docx");
    assert_eq!(report.errors[1].kind, "extraction_failure");
}

#[test]
fn test_empty_sheet_is_not_an_error() {
    let sheet = RawDocument::new("empty.csv", b"subject,complaint\nOnly a subject,\n".to_vec());
    let report = orchestrator().process_batch(vec![sheet]);
    assert!(report.results.is_empty());
    assert!(report.errors.is_empty());
    assert_eq!(report.skipped_rows, 1);
}

#[test]
fn test_scoring_failure_without_embedder() {
    let pipeline = Orchestrator::new(models(Arc::new(NoopEmbedder::new(2))));
    let report = pipeline.process_batch(vec![water_leakage_letter(), complaint_sheet()]);

    assert!(report.results.is_empty());
    assert_eq!(report.failed_files, 2);
    let failed: Vec<(&str, Option<usize>)> = report
        .errors
        .iter()
        .map(|f| (f.filename.as_str(), f.row))
        .collect();
    assert_eq!(
        failed,
        vec![("leak.docx", None), ("sheet.csv", Some(1)), ("sheet.csv", Some(3))]
    );
    assert!(report
        .errors
        .iter()
        .all(|f| f.kind == "external_model_failure" && f.status == 500));
}

#[test]
fn test_row_scoring_failure_keeps_other_rows() {
    let pipeline = Orchestrator::new(models(Arc::new(SelectiveEmbedder { trigger: "sewage" })));
    let report = pipeline.process_batch(vec![complaint_sheet()]);

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].extracted.subject.as_deref(), Some("Streetlights"));
    assert_eq!(report.results[0].risk_analysis.priority, Priority::High);
    assert_eq!(report.skipped_rows, 1);
    assert_eq!(report.failed_files, 0);

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].filename, "sheet.csv");
    assert_eq!(report.errors[0].row, Some(3));
    assert_eq!(report.errors[0].kind, "external_model_failure");
}

#[test]
fn test_severity_follows_unrounded_score() {
    struct Const(f64);

    impl RiskRegressor for Const {
        fn predict(&self, _features: &Array1<f64>) -> Result<f64> {
            Ok(self.0)
        }
    }

    let scorer = RiskScorer::new(
        Arc::new(ConstEmbedder),
        Arc::new(IdentityScaler),
        Arc::new(Const(79.996)),
    );
    let pipeline = Orchestrator::new(Arc::new(ModelContext::new(
        scorer,
        Arc::new(HeuristicRecognizer::new()),
        Arc::new(NoOcr),
    )));
    let report = pipeline.process_batch(vec![water_leakage_letter()]);

    let risk = &report.results[0].risk_analysis;
    assert!(close(risk.risk_score, 80.0));
    assert_eq!(risk.severity, Severity::High);
}

#[test]
fn test_empty_batch() {
    let report = orchestrator().process_batch(Vec::new());
    assert!(report.results.is_empty());
    assert!(report.errors.is_empty());
    assert_eq!(report.skipped_rows, 0);
}

#[test]
fn test_ranked_results_are_persisted() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = orchestrator().with_sink(sink.clone());
    let report = pipeline.process_batch(vec![water_leakage_letter(), complaint_sheet()]);

    let records = sink.records.lock();
    assert_eq!(records.len(), report.results.len());
    for (record, result) in records.iter().zip(&report.results) {
        assert_eq!(&record.result, result);
        assert_eq!(record.content_hash.len(), 64);
    }
}

#[test]
fn test_persistence_failure_keeps_results() {
    let pipeline = orchestrator().with_sink(Arc::new(BrokenSink));
    let report = pipeline.process_batch(vec![water_leakage_letter()]);
    assert_eq!(report.results.len(), 1);
    assert!(report.errors.is_empty());
}

#[test]
fn test_staging_dir_is_left_clean() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = orchestrator().with_staging_dir(dir.path());
    let report = pipeline.process_batch(vec![water_leakage_letter(), complaint_sheet()]);
    assert_eq!(report.results.len(), 3);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
