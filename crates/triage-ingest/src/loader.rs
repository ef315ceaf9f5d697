//! Format-aware document loading.
//!
//! Dispatches strictly on the file extension. PDFs whose embedded text layer
//! is too thin are treated as scans and sent through OCR.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use triage_core::{Error, LoadedDocument, ParsedContent, RawDocument, Result};

use crate::docx::read_docx_text;
use crate::ocr::OcrEngine;
use crate::staging::StagedFile;
use crate::tabular::{read_csv, read_workbook};

/// Embedded PDF text shorter than this (in characters) triggers OCR.
pub const MIN_EMBEDDED_TEXT_CHARS: usize = 50;

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Pdf,
    Docx,
    Csv,
    /// XLS or XLSX workbook.
    Spreadsheet,
    Unsupported,
}

impl FileType {
    /// Detect file type from extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "csv" => Self::Csv,
            "xls" | "xlsx" => Self::Spreadsheet,
            _ => Self::Unsupported,
        }
    }

    /// Whether this format yields tabular records rather than free text.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Csv | Self::Spreadsheet)
    }
}

/// Loads uploaded documents into [`ParsedContent`].
pub struct DocumentLoader {
    ocr: Arc<dyn OcrEngine>,
    staging_dir: Option<PathBuf>,
}

impl DocumentLoader {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            ocr,
            staging_dir: None,
        }
    }

    /// Stage uploads in `dir` instead of the system temp directory.
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Parse one uploaded document.
    ///
    /// The bytes are staged to a temporary file for the duration of the
    /// parse; the file is removed whether parsing succeeds or fails.
    pub fn load(&self, doc: &RawDocument) -> Result<LoadedDocument> {
        let ext = doc.extension();
        let file_type = FileType::from_extension(&ext);
        if file_type == FileType::Unsupported {
            return Err(unsupported(doc, &ext));
        }
        // Empty PDFs still go through the OCR fallback.
        if doc.bytes.is_empty() && file_type != FileType::Pdf {
            debug!("{} is empty", doc.filename);
            return if file_type.is_structured() {
                Ok(LoadedDocument {
                    content: ParsedContent::StructuredRecords(Vec::new()),
                    ocr_used: false,
                })
            } else {
                Err(Error::ExtractionFailure(doc.filename.clone()))
            };
        }

        let staged = StagedFile::write(self.staging_dir.as_deref(), &ext, &doc.bytes)?;
        let result = self.parse(file_type, staged.path(), doc, &ext);
        staged.release();

        if let Ok(loaded) = &result {
            match &loaded.content {
                ParsedContent::UnstructuredText(text) => debug!(
                    "Loaded {} ({:?}): {} chars, ocr={}",
                    doc.filename,
                    file_type,
                    text.chars().count(),
                    loaded.ocr_used
                ),
                ParsedContent::StructuredRecords(rows) => {
                    debug!("Loaded {} ({:?}): {} rows", doc.filename, file_type, rows.len())
                }
            }
        }
        result
    }

    fn parse(
        &self,
        file_type: FileType,
        path: &Path,
        doc: &RawDocument,
        ext: &str,
    ) -> Result<LoadedDocument> {
        let (content, ocr_used) = match file_type {
            FileType::Pdf => return Ok(self.load_pdf(path, &doc.filename)),
            FileType::Docx => (ParsedContent::UnstructuredText(read_docx_text(path)?), false),
            FileType::Csv => (ParsedContent::StructuredRecords(read_csv(path)?), false),
            FileType::Spreadsheet => (ParsedContent::StructuredRecords(read_workbook(path)?), false),
            FileType::Unsupported => return Err(unsupported(doc, ext)),
        };
        Ok(LoadedDocument { content, ocr_used })
    }

    fn load_pdf(&self, path: &Path, filename: &str) -> LoadedDocument {
        let embedded = extract_embedded_text(path, filename);
        if embedded.chars().count() >= MIN_EMBEDDED_TEXT_CHARS {
            return LoadedDocument {
                content: ParsedContent::UnstructuredText(embedded),
                ocr_used: false,
            };
        }

        info!(
            "{}: embedded text too short ({} chars), running OCR",
            filename,
            embedded.chars().count()
        );
        let text = match self.ocr.rasterize_and_ocr(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("OCR failed for {}: {}", filename, e);
                String::new()
            }
        };
        LoadedDocument {
            content: ParsedContent::UnstructuredText(text),
            ocr_used: true,
        }
    }
}

/// Embedded text layer of a PDF, trimmed. Unreadable PDFs yield empty text.
fn extract_embedded_text(path: &Path, filename: &str) -> String {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    match std::panic::catch_unwind(|| pdf_extract::extract_text(path)) {
        Ok(Ok(text)) => text.trim().to_string(),
        Ok(Err(e)) => {
            warn!("PDF text extraction failed for {}: {}", filename, e);
            String::new()
        }
        Err(_) => {
            warn!("PDF text extraction panicked for {}", filename);
            String::new()
        }
    }
}

fn unsupported(doc: &RawDocument, ext: &str) -> Error {
    Error::UnsupportedFormat {
        filename: doc.filename.clone(),
        extension: ext.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingOcr {
        calls: AtomicUsize,
        reply: Option<&'static str>,
    }

    impl CountingOcr {
        fn new(reply: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply,
            })
        }
    }

    impl OcrEngine for CountingOcr {
        fn rasterize_and_ocr(&self, pdf_path: &Path) -> Result<String> {
            assert!(pdf_path.exists(), "OCR must see the staged file");
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Some(text) => Ok(text.to_string()),
                None => Err(Error::Ocr("tesseract not found on PATH".into())),
            }
        }
    }

    /// Generate a one-page PDF with a text layer using lopdf.
    fn make_test_pdf(text: &str) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content = format!("BT /F1 12 Tf 72 700 Td ({}) Tj ET", text);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        };
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        });
        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
            dict.set("Parent", pages_id);
        }
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn loader(ocr: Arc<CountingOcr>, dir: &Path) -> DocumentLoader {
        DocumentLoader::new(ocr).with_staging_dir(dir)
    }

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_extension("PDF"), FileType::Pdf);
        assert_eq!(FileType::from_extension("docx"), FileType::Docx);
        assert_eq!(FileType::from_extension("Xlsx"), FileType::Spreadsheet);
        assert_eq!(FileType::from_extension("xls"), FileType::Spreadsheet);
        assert_eq!(FileType::from_extension("doc"), FileType::Unsupported);
        assert!(FileType::Csv.is_structured());
        assert!(!FileType::Pdf.is_structured());
    }

    #[test]
    fn test_unsupported_extension_skips_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let ocr = CountingOcr::new(Some("text"));
        let doc = RawDocument::new("notes.txt", b"Subject: noise".to_vec());
        let err = loader(ocr.clone(), dir.path()).load(&doc).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { ref extension, .. } if extension == "txt"));
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_pdf_with_text_layer_skips_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let ocr = CountingOcr::new(Some("should not be used"));
        let text = "Streetlights on the main road have been off for two weeks now";
        let doc = RawDocument::new("letter.pdf", make_test_pdf(text));

        let loaded = loader(ocr.clone(), dir.path()).load(&doc).unwrap();
        assert!(!loaded.ocr_used);
        match loaded.content {
            ParsedContent::UnstructuredText(t) => assert!(t.contains("Streetlights")),
            other => panic!("unexpected content: {:?}", other),
        }
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_thin_pdf_falls_back_to_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let ocr = CountingOcr::new(Some("Subject: Drainage\nDrains are blocked in Zone 4"));
        let doc = RawDocument::new("scan.PDF", make_test_pdf("Scan"));

        let loaded = loader(ocr.clone(), dir.path()).load(&doc).unwrap();
        assert!(loaded.ocr_used);
        assert_eq!(
            loaded.content,
            ParsedContent::UnstructuredText("Subject: Drainage\nDrains are blocked in Zone 4".into())
        );
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ocr_failure_yields_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let ocr = CountingOcr::new(None);
        let doc = RawDocument::new("broken.pdf", b"%PDF-1.4 truncated".to_vec());

        let loaded = loader(ocr.clone(), dir.path()).load(&doc).unwrap();
        assert!(loaded.ocr_used);
        assert_eq!(loaded.content, ParsedContent::UnstructuredText(String::new()));
    }

    #[test]
    fn test_zero_byte_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let ocr = CountingOcr::new(Some("text"));
        let loader = loader(ocr.clone(), dir.path());

        let err = loader.load(&RawDocument::new("empty.docx", Vec::new())).unwrap_err();
        assert!(matches!(err, Error::ExtractionFailure(ref f) if f == "empty.docx"));

        let loaded = loader.load(&RawDocument::new("empty.xlsx", Vec::new())).unwrap();
        assert_eq!(loaded.content, ParsedContent::StructuredRecords(Vec::new()));
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_byte_pdf_attempts_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let ocr = CountingOcr::new(Some("text"));
        let loaded = loader(ocr.clone(), dir.path())
            .load(&RawDocument::new("empty.pdf", Vec::new()))
            .unwrap();
        assert!(loaded.ocr_used);
        assert_eq!(loaded.content, ParsedContent::UnstructuredText("text".into()));
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_docx_and_csv_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let ocr = CountingOcr::new(None);
        let loader = loader(ocr, dir.path());

        let docx = RawDocument::new(
            "letter.docx",
            crate::docx::tests::make_docx(&["Subject: Water", "Taps have been dry"]),
        );
        let loaded = loader.load(&docx).unwrap();
        assert!(!loaded.ocr_used);
        assert_eq!(
            loaded.content,
            ParsedContent::UnstructuredText("Subject: Water\nTaps have been dry".into())
        );

        let csv = RawDocument::new(
            "batch.CSV",
            b"complaint,sender\nSewage is overflowing onto the road,Resident\n".to_vec(),
        );
        match loader.load(&csv).unwrap().content {
            ParsedContent::StructuredRecords(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].sender, "Resident");
            }
            other => panic!("unexpected content: {:?}", other),
        }
    }

    #[test]
    fn test_staged_files_are_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let ocr = CountingOcr::new(None);
        let loader = loader(ocr, dir.path());

        let _ = loader.load(&RawDocument::new("bad.docx", b"not a zip".to_vec()));
        let _ = loader.load(&RawDocument::new("ok.csv", b"complaint\nx\n".to_vec()));

        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 0);
    }
}
