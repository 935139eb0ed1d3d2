//! Ingestion pipeline: rasterize, OCR, and index documents page by page.
//!
//! PDF pages are processed in fixed-size batches so peak memory stays bounded
//! regardless of document length. Failures are contained per file: a broken
//! PDF is logged and skipped while the remaining files proceed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbImage;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{DEFAULT_BATCH_SIZE, DEFAULT_DPI};
use crate::error::Result;
use crate::models::{DocumentKind, WordOccurrence};
use crate::ocr::{self, blocking, OcrEngine, Rasterizer};
use crate::repository::document::{BatchOutcome, DieselDocumentRepository};

/// Ingestion tuning knobs.
#[derive(Debug, Clone, Copy)]
pub struct IngestConfig {
    /// Rasterization resolution for PDF pages.
    pub dpi: u32,
    /// Pages materialized per batch.
    pub batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Per-file ingestion result.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub path: PathBuf,
    pub document_id: i32,
    pub page_count: u32,
    pub words_indexed: u64,
    pub words_skipped: u64,
}

/// Drives rasterization + OCR per document and writes word occurrences.
pub struct IngestService {
    documents: DieselDocumentRepository,
    rasterizer: Arc<dyn Rasterizer>,
    ocr: Arc<dyn OcrEngine>,
    config: IngestConfig,
}

impl IngestService {
    pub fn new(
        documents: DieselDocumentRepository,
        rasterizer: Arc<dyn Rasterizer>,
        ocr: Arc<dyn OcrEngine>,
        config: IngestConfig,
    ) -> Self {
        Self {
            documents,
            rasterizer,
            ocr,
            config: IngestConfig {
                batch_size: config.batch_size.max(1),
                ..config
            },
        }
    }

    /// Ingest a set of files and directories into the given session.
    ///
    /// Directories are expanded to their ingestable children. File-level
    /// failures are logged and skipped; only fatal store errors abort.
    pub async fn ingest_paths(&self, paths: &[PathBuf], session_id: i32) -> Result<Vec<IngestOutcome>> {
        let files = expand_paths(paths)?;
        if files.is_empty() {
            tracing::warn!("no ingestable documents found");
            return Ok(Vec::new());
        }

        let progress = ProgressBar::new(files.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            progress.set_message(
                file.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );
            match self.ingest_file(&file, session_id).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(path = %file.display(), error = %e, "skipping file");
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        Ok(outcomes)
    }

    /// Ingest one file. Returns the new document id and word counts.
    pub async fn ingest_file(&self, path: &Path, session_id: i32) -> Result<IngestOutcome> {
        match ocr::detect_kind(path)? {
            DocumentKind::Pdf => self.ingest_pdf(path, session_id).await,
            DocumentKind::Image => self.ingest_image(path, session_id).await,
        }
    }

    async fn ingest_pdf(&self, path: &Path, session_id: i32) -> Result<IngestOutcome> {
        let page_count = {
            let rasterizer = self.rasterizer.clone();
            let path = path.to_path_buf();
            blocking(move || rasterizer.page_count(&path)).await?
        };

        // Document row first: its id tags every word write that follows.
        let document_id = self
            .documents
            .insert(&path.to_string_lossy(), session_id, page_count)
            .await?;

        let mut totals = BatchOutcome::default();
        let batch = self.config.batch_size as u32;
        let mut first = 1u32;
        while first <= page_count {
            let last = (first + batch - 1).min(page_count);
            tracing::info!(
                path = %path.display(),
                "processing pages {first}-{last} of {page_count}"
            );

            let pages = {
                let rasterizer = self.rasterizer.clone();
                let path = path.to_path_buf();
                let dpi = self.config.dpi;
                blocking(move || rasterizer.rasterize_range(&path, dpi, first, last)).await?
            };

            for (offset, page) in pages.into_iter().enumerate() {
                let page_number = first + offset as u32;
                let outcome = self
                    .index_page(page, document_id, session_id, page_number)
                    .await?;
                totals.inserted += outcome.inserted;
                totals.skipped += outcome.skipped;
            }

            first = last + 1;
        }

        Ok(IngestOutcome {
            path: path.to_path_buf(),
            document_id,
            page_count,
            words_indexed: totals.inserted,
            words_skipped: totals.skipped,
        })
    }

    async fn ingest_image(&self, path: &Path, session_id: i32) -> Result<IngestOutcome> {
        let page = {
            let path = path.to_path_buf();
            blocking(move || Ok(image::open(&path)?.to_rgb8())).await?
        };

        let document_id = self
            .documents
            .insert(&path.to_string_lossy(), session_id, 1)
            .await?;

        let outcome = self.index_page(page, document_id, session_id, 1).await?;

        Ok(IngestOutcome {
            path: path.to_path_buf(),
            document_id,
            page_count: 1,
            words_indexed: outcome.inserted,
            words_skipped: outcome.skipped,
        })
    }

    /// OCR one page and write its surviving detections.
    async fn index_page(
        &self,
        page: RgbImage,
        document_id: i32,
        session_id: i32,
        page_number: u32,
    ) -> Result<BatchOutcome> {
        let detections = {
            let ocr = self.ocr.clone();
            blocking(move || ocr.detect_words(&page)).await?
        };

        let words: Vec<WordOccurrence> = detections
            .into_iter()
            .filter(|det| !det.is_blank())
            .filter_map(|det| {
                let bbox = det.bbox();
                if !bbox.is_valid() {
                    tracing::warn!(word = %det.word, page = page_number, "dropping inverted box");
                    return None;
                }
                Some(WordOccurrence {
                    document_id,
                    session_id,
                    word: det.word,
                    bbox,
                    page_number,
                })
            })
            .collect();

        if words.is_empty() {
            tracing::debug!(page = page_number, "blank page");
            return Ok(BatchOutcome::default());
        }

        self.documents.insert_words(words).await
    }
}

/// Expand files and directories into a flat, sorted list of ingestable files.
fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut children: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|p| p.is_file())
                .collect();
            children.sort();
            for child in children {
                match ocr::detect_kind(&child) {
                    Ok(_) => files.push(child),
                    Err(_) => {
                        tracing::debug!(path = %child.display(), "not a document, skipping");
                    }
                }
            }
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}
