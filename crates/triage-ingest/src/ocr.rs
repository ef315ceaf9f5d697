//! Rasterize-and-OCR fallback for image-only PDFs.
//!
//! `PopplerTesseract` shells out to `pdftoppm` (300 DPI PNG pages) and
//! `tesseract` (English), killing either tool once the configured deadline
//! passes.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, info};
use triage_core::{Error, Result};

/// Rasterization resolution used for OCR.
pub const OCR_DPI: u32 = 300;

/// OCR language.
pub const OCR_LANG: &str = "eng";

/// Turns a PDF on disk into recognized text.
pub trait OcrEngine: Send + Sync {
    fn rasterize_and_ocr(&self, pdf_path: &Path) -> Result<String>;
}

/// Poppler + Tesseract command-line OCR.
pub struct PopplerTesseract {
    pdftoppm_bin: PathBuf,
    tesseract_bin: PathBuf,
    timeout: Duration,
}

impl PopplerTesseract {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pdftoppm_bin: PathBuf::from("pdftoppm"),
            tesseract_bin: PathBuf::from("tesseract"),
            timeout,
        }
    }

    /// Override tool locations (e.g. bundled binaries).
    pub fn with_binaries(mut self, pdftoppm: impl Into<PathBuf>, tesseract: impl Into<PathBuf>) -> Self {
        self.pdftoppm_bin = pdftoppm.into();
        self.tesseract_bin = tesseract.into();
        self
    }

    fn rasterize(&self, pdf_path: &Path, out_dir: &Path, deadline: Instant) -> Result<Vec<PathBuf>> {
        let prefix = out_dir.join("page");
        let mut cmd = Command::new(&self.pdftoppm_bin);
        cmd.arg("-r")
            .arg(OCR_DPI.to_string())
            .arg("-png")
            .arg(pdf_path)
            .arg(&prefix);
        run_with_deadline(cmd, deadline, "pdftoppm")?;

        let mut pages: Vec<PathBuf> = std::fs::read_dir(out_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("png"))
            .collect();
        // pdftoppm zero-pads page numbers, so lexical order is page order.
        pages.sort();
        Ok(pages)
    }

    fn recognize(&self, image: &Path, deadline: Instant) -> Result<String> {
        let mut cmd = Command::new(&self.tesseract_bin);
        cmd.arg(image).arg("stdout").arg("-l").arg(OCR_LANG);
        let stdout = run_with_deadline(cmd, deadline, "tesseract")?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

impl OcrEngine for PopplerTesseract {
    fn rasterize_and_ocr(&self, pdf_path: &Path) -> Result<String> {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let work_dir = tempfile::Builder::new().prefix("ocr-").tempdir()?;

        let pages = self.rasterize(pdf_path, work_dir.path(), deadline)?;
        debug!("Rasterized {} page(s) at {} DPI", pages.len(), OCR_DPI);

        let mut texts = Vec::with_capacity(pages.len());
        for page in &pages {
            texts.push(self.recognize(page, deadline)?);
        }

        let text = texts.join(" ").trim().to_string();
        info!(
            "OCR finished: {} page(s), {} chars in {}ms",
            pages.len(),
            text.chars().count(),
            started.elapsed().as_millis()
        );
        Ok(text)
    }
}

/// Run a command to completion, killing it if `deadline` passes first.
/// Returns captured stdout.
fn run_with_deadline(mut cmd: Command, deadline: Instant, tool: &str) -> Result<Vec<u8>> {
    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Ocr(format!("{} not found on PATH", tool))
            } else {
                Error::Ocr(format!("failed to start {}: {}", tool, e))
            }
        })?;

    // Drain stdout on a helper thread so a chatty child cannot block on a full pipe.
    let stdout = child.stdout.take();
    let reader = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout {
            let _ = out.read_to_end(&mut buf);
        }
        buf
    });

    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::Timeout(format!("{} exceeded the OCR deadline", tool)));
        }
        std::thread::sleep(Duration::from_millis(25));
    };

    let output = reader
        .join()
        .map_err(|_| Error::Ocr(format!("{} output reader panicked", tool)))?;

    if !status.success() {
        return Err(Error::Ocr(format!("{} exited with {}", tool, status)));
    }
    Ok(output)
}
