//! PDF rasterization via Poppler's pdftoppm and pdfinfo.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::RgbImage;
use tempfile::TempDir;

use super::{check_cmd_status, handle_cmd_output, AdapterError, Rasterizer};

/// Rasterizer backed by the `pdftoppm` and `pdfinfo` binaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct PopplerRasterizer;

impl PopplerRasterizer {
    pub fn new() -> Self {
        Self
    }

    /// Find the image file for a specific page number.
    ///
    /// pdftoppm pads the page number to the digit count of the document's
    /// last page: page-1.png, page-07.png, page-012.png.
    fn find_page_image(&self, temp_path: &Path, page_num: u32) -> Option<PathBuf> {
        for digits in [1, 2, 3, 4, 5, 6] {
            let filename = format!("page-{:0width$}.png", page_num, width = digits);
            let path = temp_path.join(&filename);
            if path.exists() {
                return Some(path);
            }
        }
        None
    }
}

impl Rasterizer for PopplerRasterizer {
    /// Get the page count of a PDF via pdfinfo.
    fn page_count(&self, path: &Path) -> Result<u32, AdapterError> {
        let output = Command::new("pdfinfo").arg(path).output();
        let stdout = handle_cmd_output(output, "pdfinfo (install poppler-utils)", "pdfinfo failed")?;

        for line in stdout.lines() {
            if line.starts_with("Pages:") {
                if let Some(count) = line.split_whitespace().nth(1).and_then(|s| s.parse().ok()) {
                    return Ok(count);
                }
            }
        }
        Err(AdapterError::Failed(format!(
            "pdfinfo reported no page count for {}",
            path.display()
        )))
    }

    fn rasterize_range(
        &self,
        path: &Path,
        dpi: u32,
        first: u32,
        last: u32,
    ) -> Result<Vec<RgbImage>, AdapterError> {
        let temp_dir = TempDir::new()?;
        let temp_path = temp_dir.path();
        let output_prefix = temp_path.join("page");

        let dpi_str = dpi.to_string();
        let first_str = first.to_string();
        let last_str = last.to_string();
        let status = Command::new("pdftoppm")
            .args(["-png", "-r", &dpi_str, "-f", &first_str, "-l", &last_str])
            .arg(path)
            .arg(&output_prefix)
            .status();

        check_cmd_status(
            status,
            "pdftoppm (install poppler-utils)",
            &format!("pdftoppm failed to convert pages {first}-{last}"),
        )?;

        let mut pages = Vec::with_capacity((last - first + 1) as usize);
        for page_num in first..=last {
            let image_path = self.find_page_image(temp_path, page_num).ok_or_else(|| {
                AdapterError::Failed(format!("no image generated for page {page_num}"))
            })?;
            pages.push(image::open(&image_path)?.to_rgb8());
        }
        Ok(pages)
    }
}
