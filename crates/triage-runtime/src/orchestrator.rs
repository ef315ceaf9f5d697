//! Pipeline orchestrator: load → extract → score → rank → persist.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};
use triage_core::{
    BatchReport, Error, ExtractedFields, FileFailure, ParsedContent, RawDocument, Result,
    ScoredComplaint, SourceMetadata, StructuredRecord, ANONYMOUS_SENDER, DATE_NOT_MENTIONED,
};
use triage_ingest::extract::{extract_body, extract_complaint, extract_location, resolve_population};
use triage_ingest::{extract_document, DocumentLoader};
use triage_store::{new_record, ComplaintSink};

use crate::context::ModelContext;
use crate::ranking::assign_priority;

/// Items produced by one file before ranking.
struct FileOutcome {
    items: Vec<ScoredComplaint>,
    row_failures: Vec<FileFailure>,
    skipped_rows: usize,
}

/// Processes uploaded batches end to end.
///
/// A batch runs sequentially on the calling thread in submission order.
/// A file that cannot be loaded, extracted or scored is reported in
/// [`BatchReport::errors`] and the rest of the batch continues. A sheet row
/// that cannot be scored is reported with its row number and the sheet's
/// other rows are kept.
pub struct Orchestrator {
    models: Arc<ModelContext>,
    loader: DocumentLoader,
    sink: Option<Arc<dyn ComplaintSink>>,
}

impl Orchestrator {
    pub fn new(models: Arc<ModelContext>) -> Self {
        let loader = DocumentLoader::new(models.ocr.clone());
        info!(
            "Orchestrator initialized: feature_width={}, embedder_available={}",
            models.scorer.feature_width(),
            models.scorer.embedder_available()
        );
        Self {
            models,
            loader,
            sink: None,
        }
    }

    /// Stage uploads under `dir`.
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.loader = DocumentLoader::new(self.models.ocr.clone()).with_staging_dir(dir);
        self
    }

    /// Persist every ranked result through `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn ComplaintSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn models(&self) -> &ModelContext {
        &self.models
    }

    /// Process one uploaded batch.
    pub fn process_batch(&self, docs: Vec<RawDocument>) -> BatchReport {
        let total = docs.len();
        let mut scored = Vec::new();
        let mut errors = Vec::new();
        let mut skipped_rows = 0;
        let mut failed_files = 0;

        for doc in &docs {
            match self.process_file(doc) {
                Ok(outcome) => {
                    debug!(
                        "{}: {} item(s), {} row(s) failed, {} row(s) skipped",
                        doc.filename,
                        outcome.items.len(),
                        outcome.row_failures.len(),
                        outcome.skipped_rows
                    );
                    if outcome.items.is_empty() && !outcome.row_failures.is_empty() {
                        failed_files += 1;
                    }
                    skipped_rows += outcome.skipped_rows;
                    scored.extend(outcome.items);
                    errors.extend(outcome.row_failures);
                }
                Err(e) => {
                    warn!("{} failed: {}", doc.filename, e);
                    errors.push(FileFailure::from_error(&doc.filename, &e));
                    failed_files += 1;
                }
            }
        }

        let results = assign_priority(scored);
        if let Some(sink) = &self.sink {
            let mut persisted = 0;
            for result in &results {
                match sink.persist(&new_record(result.clone())) {
                    Ok(()) => persisted += 1,
                    Err(e) => warn!("Failed to persist result for {}: {}", result.filename, e),
                }
            }
            debug!("Persisted {}/{} result(s)", persisted, results.len());
        }

        info!(
            "Batch complete: {} file(s), {} result(s), {} failed, {} row(s) skipped",
            total,
            results.len(),
            errors.len(),
            skipped_rows
        );
        BatchReport {
            results,
            errors,
            skipped_rows,
            failed_files,
        }
    }

    fn process_file(&self, doc: &RawDocument) -> Result<FileOutcome> {
        let loaded = self.loader.load(doc)?;
        let metadata = SourceMetadata {
            file_type: doc.content_type.clone(),
        };

        match loaded.content {
            ParsedContent::UnstructuredText(text) => {
                let fields = self.extract_text(&doc.filename, &text, loaded.ocr_used, metadata)?;
                let item = self.score(&doc.filename, fields)?;
                Ok(FileOutcome {
                    items: vec![item],
                    row_failures: Vec::new(),
                    skipped_rows: 0,
                })
            }
            ParsedContent::StructuredRecords(rows) => {
                let mut items = Vec::with_capacity(rows.len());
                let mut row_failures = Vec::new();
                let mut skipped_rows = 0;
                for (index, row) in rows.iter().enumerate() {
                    let Some(fields) = self.extract_row(row, metadata.clone()) else {
                        debug!("{}: row {} has no complaint text, skipped", doc.filename, index + 1);
                        skipped_rows += 1;
                        continue;
                    };
                    match self.score(&doc.filename, fields) {
                        Ok(item) => items.push(item),
                        Err(e) => {
                            warn!("{}: row {} failed: {}", doc.filename, index + 1, e);
                            row_failures
                                .push(FileFailure::from_error(&doc.filename, &e).with_row(index + 1));
                        }
                    }
                }
                Ok(FileOutcome {
                    items,
                    row_failures,
                    skipped_rows,
                })
            }
        }
    }

    fn extract_text(
        &self,
        filename: &str,
        text: &str,
        ocr_used: bool,
        metadata: SourceMetadata,
    ) -> Result<ExtractedFields> {
        let extraction = extract_document(text, self.models.recognizer.as_ref());
        if extraction.complaint.is_empty() {
            return Err(Error::ExtractionFailure(filename.to_string()));
        }
        Ok(ExtractedFields {
            subject: extraction.subject,
            complaint: extraction.complaint,
            sender: extraction.sender,
            date: extraction.date,
            location: extraction.location,
            population_used: extraction.population,
            ocr_used,
            metadata,
        })
    }

    /// `None` when the row yields no complaint text.
    fn extract_row(&self, row: &StructuredRecord, metadata: SourceMetadata) -> Option<ExtractedFields> {
        let body = extract_body(&row.complaint);
        let complaint = extract_complaint(&body);
        if complaint.is_empty() {
            return None;
        }

        let location = match non_empty(&row.location) {
            Some(location) => Some(location),
            None => extract_location(&body, self.models.recognizer.as_ref()),
        };
        Some(ExtractedFields {
            subject: non_empty(&row.subject),
            sender: non_empty(&row.sender).unwrap_or_else(|| ANONYMOUS_SENDER.to_string()),
            date: non_empty(&row.date).unwrap_or_else(|| DATE_NOT_MENTIONED.to_string()),
            population_used: resolve_population(&body),
            complaint,
            location,
            ocr_used: false,
            metadata,
        })
    }

    fn score(&self, filename: &str, extracted: ExtractedFields) -> Result<ScoredComplaint> {
        let assessment = self
            .models
            .scorer
            .assess(&extracted.complaint, extracted.population_used)?;
        Ok(ScoredComplaint {
            filename: filename.to_string(),
            extracted,
            assessment,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
