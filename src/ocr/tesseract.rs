//! Word-level OCR via the Tesseract binary in TSV mode.
//!
//! TSV output carries one row per layout element; word rows are level 5 and
//! hold `left top width height conf text` in the last six columns.

use std::process::Command;

use image::RgbImage;
use tempfile::TempDir;

use super::{handle_cmd_output, AdapterError, OcrEngine};
use crate::models::WordDetection;

const TSV_COLUMNS: usize = 12;
const WORD_LEVEL: u32 = 5;

/// OCR engine backed by the `tesseract` binary.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    /// Tesseract language setting.
    lang: String,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self {
            lang: "eng".to_string(),
        }
    }
}

impl TesseractOcr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set Tesseract language.
    pub fn with_language(mut self, lang: &str) -> Self {
        self.lang = lang.to_string();
        self
    }
}

impl OcrEngine for TesseractOcr {
    fn detect_words(&self, image: &RgbImage) -> Result<Vec<WordDetection>, AdapterError> {
        let temp_dir = TempDir::new()?;
        let image_path = temp_dir.path().join("page.png");
        image.save(&image_path)?;

        let output = Command::new("tesseract")
            .arg(&image_path)
            .arg("stdout")
            .args(["-l", &self.lang, "tsv"])
            .output();

        let tsv = handle_cmd_output(
            output,
            "tesseract (install tesseract-ocr)",
            "tesseract failed",
        )?;

        Ok(parse_tsv(&tsv))
    }
}

/// Parse Tesseract TSV output into raw word detections.
///
/// Structural rows (page/block/line, confidence -1) are dropped here; the
/// blank-word filter is the ingestion pipeline's job.
fn parse_tsv(tsv: &str) -> Vec<WordDetection> {
    let mut detections = Vec::new();

    for line in tsv.lines() {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < TSV_COLUMNS {
            continue;
        }
        let Ok(level) = cols[0].parse::<u32>() else {
            continue; // header row
        };
        if level != WORD_LEVEL {
            continue;
        }
        let Ok(conf) = cols[10].parse::<f32>() else {
            continue;
        };
        if conf < 0.0 {
            continue;
        }

        let (Ok(x), Ok(y), Ok(width), Ok(height)) = (
            cols[6].parse::<i32>(),
            cols[7].parse::<i32>(),
            cols[8].parse::<i32>(),
            cols[9].parse::<i32>(),
        ) else {
            tracing::debug!(row = %line, "malformed tsv geometry, skipping");
            continue;
        };

        detections.push(WordDetection {
            word: cols[11].to_string(),
            x,
            y,
            width,
            height,
        });
    }

    detections
}
