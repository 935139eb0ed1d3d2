//! Adapters for the external OCR engine and PDF rasterizer.
//!
//! Both are invoked as external binaries (Tesseract, Poppler). The traits
//! keep the pipeline testable without either installed.

use std::path::Path;

use image::RgbImage;
use thiserror::Error;

use crate::models::{DocumentKind, WordDetection};

pub mod poppler;
pub mod tesseract;

pub use poppler::PopplerRasterizer;
pub use tesseract::TesseractOcr;

/// Errors from the rasterization/OCR boundary.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("external tool not found: {0}")]
    ToolNotFound(String),

    #[error("{0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// PDF → ordered page images at a fixed resolution.
pub trait Rasterizer: Send + Sync {
    /// Number of pages in the document.
    fn page_count(&self, path: &Path) -> Result<u32, AdapterError>;

    /// Render an inclusive, 1-based page range to images at the given DPI.
    fn rasterize_range(
        &self,
        path: &Path,
        dpi: u32,
        first: u32,
        last: u32,
    ) -> Result<Vec<RgbImage>, AdapterError>;
}

/// Page image → raw word detections. An empty result is a blank page, not an
/// error.
pub trait OcrEngine: Send + Sync {
    fn detect_words(&self, image: &RgbImage) -> Result<Vec<WordDetection>, AdapterError>;
}

/// Classify a file as PDF or raster image by content sniffing, falling back
/// to the extension.
pub fn detect_kind(path: &Path) -> Result<DocumentKind, AdapterError> {
    if let Ok(Some(kind)) = infer::get_from_path(path) {
        match kind.mime_type() {
            "application/pdf" => return Ok(DocumentKind::Pdf),
            mime if mime.starts_with("image/") => return Ok(DocumentKind::Image),
            _ => {}
        }
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => Ok(DocumentKind::Pdf),
        Some("png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "gif") => Ok(DocumentKind::Image),
        _ => Err(AdapterError::UnsupportedFileType(path.display().to_string())),
    }
}

/// Handle command output, extracting stdout on success or returning appropriate error.
pub(crate) fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, AdapterError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(AdapterError::Failed(format!("{}: {}", error_prefix, stderr)))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AdapterError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(AdapterError::Io(e)),
    }
}

/// Check command status, returning appropriate error on failure.
pub(crate) fn check_cmd_status(
    result: std::io::Result<std::process::ExitStatus>,
    tool_name: &str,
    error_msg: &str,
) -> Result<(), AdapterError> {
    match result {
        Ok(s) if s.success() => Ok(()),
        Ok(_) => Err(AdapterError::Failed(error_msg.to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AdapterError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(AdapterError::Io(e)),
    }
}

/// Check if a binary exists in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Check if required external tools are available.
pub fn check_tools() -> Vec<(String, bool)> {
    ["pdftoppm", "pdfinfo", "tesseract"]
        .iter()
        .map(|tool| (tool.to_string(), check_binary(tool)))
        .collect()
}

/// Run a blocking adapter call off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, AdapterError>
where
    F: FnOnce() -> Result<T, AdapterError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AdapterError::Failed(format!("adapter task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_kind_by_extension() {
        assert_eq!(
            detect_kind(Path::new("missing/scan.pdf")).unwrap(),
            DocumentKind::Pdf
        );
        assert_eq!(
            detect_kind(Path::new("missing/scan.JPEG")).unwrap(),
            DocumentKind::Image
        );
        assert!(matches!(
            detect_kind(Path::new("missing/notes.txt")),
            Err(AdapterError::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn detect_kind_by_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mislabeled.dat");
        std::fs::write(&path, b"%PDF-1.4\n%fake\n").unwrap();
        assert_eq!(detect_kind(&path).unwrap(), DocumentKind::Pdf);
    }

    #[test]
    fn check_tools_lists_all_three() {
        let tools = check_tools();
        assert_eq!(tools.len(), 3);
    }
}
