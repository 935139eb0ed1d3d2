//! Domain models for sessions, documents, word occurrences and search hits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle enclosing a detected word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl BoundingBox {
    pub fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// A box is valid when both corner orderings hold.
    pub fn is_valid(&self) -> bool {
        self.x_min <= self.x_max && self.y_min <= self.y_max
    }

    pub fn width(&self) -> i32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> i32 {
        self.y_max - self.y_min
    }
}

/// One raw OCR detection: a word and its top-left anchored extent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordDetection {
    pub word: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl WordDetection {
    /// Convert the anchored extent into corner form.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Detections with no visible text are dropped by the pipeline.
    pub fn is_blank(&self) -> bool {
        self.word.trim().is_empty()
    }
}

/// An ingestion epoch. At most one session is open (`end_time` unset) at a time.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// One ingested file. `page_count` is fixed at creation.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: i32,
    pub path: String,
    pub session_id: i32,
    pub page_count: u32,
}

/// One indexed word instance, immutable once written.
#[derive(Debug, Clone)]
pub struct WordOccurrence {
    pub document_id: i32,
    pub session_id: i32,
    pub word: String,
    pub bbox: BoundingBox,
    pub page_number: u32,
}

/// A fuzzy-search match joined with its owning document, in scan order.
///
/// The same shape is used when reading recorded results back for annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub document_id: i32,
    pub document_path: String,
    pub page_count: u32,
    pub session_id: i32,
    pub word: String,
    pub bbox: BoundingBox,
    pub page_number: u32,
}

/// Kind of ingestable file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Multi-page, rasterized through Poppler.
    Pdf,
    /// Single-page raster image; the file is its own page.
    Image,
}
