//! End-to-end tests for the ingest → search → annotate pipeline.
//!
//! The OCR engine and rasterizer are replaced with in-process fakes so the
//! store-facing behavior can be exercised without tesseract or poppler.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{Rgb, RgbImage};

use wordtrace::models::{BoundingBox, WordDetection};
use wordtrace::ocr::{AdapterError, OcrEngine, Rasterizer};
use wordtrace::repository::pool::create_pool;
use wordtrace::repository::{
    migrations, DieselDocumentRepository, DieselSearchRepository, DieselSessionRepository,
};
use wordtrace::services::{
    AnnotateConfig, AnnotationService, IngestConfig, IngestService, SearchService,
};
use wordtrace::Error;

/// OCR fake returning the same detections for every page.
struct FixedOcr {
    detections: Vec<WordDetection>,
}

impl FixedOcr {
    fn single(word: &str, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            detections: vec![WordDetection {
                word: word.to_string(),
                x,
                y,
                width,
                height,
            }],
        }
    }
}

impl OcrEngine for FixedOcr {
    fn detect_words(&self, _image: &RgbImage) -> Result<Vec<WordDetection>, AdapterError> {
        Ok(self.detections.clone())
    }
}

/// Rasterizer fake producing blank white pages.
struct BlankRasterizer {
    pages: u32,
}

impl Rasterizer for BlankRasterizer {
    fn page_count(&self, _path: &Path) -> Result<u32, AdapterError> {
        Ok(self.pages)
    }

    fn rasterize_range(
        &self,
        _path: &Path,
        _dpi: u32,
        first: u32,
        last: u32,
    ) -> Result<Vec<RgbImage>, AdapterError> {
        assert!(first >= 1 && last <= self.pages && first <= last);
        Ok((first..=last)
            .map(|_| RgbImage::from_pixel(300, 200, Rgb([255, 255, 255])))
            .collect())
    }
}

struct Fixture {
    sessions: DieselSessionRepository,
    documents: DieselDocumentRepository,
    search_log: DieselSearchRepository,
    dir: tempfile::TempDir,
}

async fn setup() -> Fixture {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let pool = create_pool(&dir.path().join("test.db")).expect("Failed to create pool");
    migrations::run_migrations(pool.clone())
        .await
        .expect("Failed to run migrations");

    Fixture {
        sessions: DieselSessionRepository::new(pool.clone()),
        documents: DieselDocumentRepository::new(pool.clone()),
        search_log: DieselSearchRepository::new(pool),
        dir,
    }
}

impl Fixture {
    fn ingest_service(&self, ocr: FixedOcr, rasterizer: BlankRasterizer) -> IngestService {
        IngestService::new(
            self.documents.clone(),
            Arc::new(rasterizer),
            Arc::new(ocr),
            IngestConfig::default(),
        )
    }

    fn search_service(&self) -> SearchService {
        SearchService::new(self.search_log.clone())
    }

    /// Write a small white PNG into the fixture dir.
    fn write_page_image(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        RgbImage::from_pixel(300, 200, Rgb([255, 255, 255]))
            .save(&path)
            .expect("Failed to write test image");
        path
    }

    /// Write a fake PDF; only the extension/magic matter, the rasterizer is
    /// replaced in tests.
    fn write_fake_pdf(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, b"%PDF-1.4\n%fake test document\n").unwrap();
        path
    }
}

#[tokio::test]
async fn end_to_end_invoice_scenario() {
    let fx = setup().await;
    let session = fx.sessions.start(true).await.unwrap();

    let page = fx.write_page_image("invoice_scan.png");
    let service = fx.ingest_service(
        FixedOcr::single("invoice", 50, 50, 100, 20),
        BlankRasterizer { pages: 0 },
    );
    let outcome = service.ingest_file(&page, session.id).await.unwrap();
    assert_eq!(outcome.page_count, 1);
    assert_eq!(outcome.words_indexed, 1);

    // fuzzy match within distance 2
    let hits = fx.search_service().search("invoise", 2).await.unwrap();
    assert_eq!(hits.len(), 1);
    let hit = &hits[0];
    assert_eq!(hit.word, "invoice");
    assert_eq!(hit.bbox, BoundingBox::new(50, 50, 150, 70));
    assert_eq!(hit.page_number, 1);
    assert_eq!(hit.session_id, session.id);

    // the match was recorded as history
    assert_eq!(fx.search_log.count().await.unwrap(), 1);

    // render the highlight back onto the page
    let out_root = fx.dir.path().join("annotated");
    let annotator = AnnotationService::new(
        fx.search_log.clone(),
        Arc::new(BlankRasterizer { pages: 0 }),
        AnnotateConfig { dpi: 300 },
    );
    let written = annotator.annotate_all(&out_root).await.unwrap();
    assert_eq!(written.len(), 1);
    assert!(written[0].ends_with("invoice_scan/invoice_scan_page_1.png"));

    // margin = round(300 / 25.4) = 12: outline encloses (38,38)-(162,82)
    let annotated = image::open(&written[0]).unwrap().to_rgb8();
    let red = Rgb([255u8, 0, 0]);
    let white = Rgb([255u8, 255, 255]);
    assert_eq!(*annotated.get_pixel(38, 38), red);
    assert_eq!(*annotated.get_pixel(162, 82), red);
    assert_eq!(*annotated.get_pixel(100, 60), white, "interior must stay clear");
    assert_eq!(*annotated.get_pixel(25, 25), white, "outside must stay clear");
}

#[tokio::test]
async fn search_with_zero_distance_is_exact_match() {
    let fx = setup().await;
    let session = fx.sessions.start(true).await.unwrap();

    for (name, word) in [("a.png", "invoice"), ("b.png", "invoices")] {
        let page = fx.write_page_image(name);
        let service = fx.ingest_service(
            FixedOcr::single(word, 10, 10, 80, 20),
            BlankRasterizer { pages: 0 },
        );
        service.ingest_file(&page, session.id).await.unwrap();
    }

    let hits = fx.search_service().search("invoice", 0).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].word, "invoice");
}

#[tokio::test]
async fn empty_term_is_rejected_before_any_side_effect() {
    let fx = setup().await;
    fx.sessions.start(true).await.unwrap();

    let err = fx.search_service().search("", 2).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(fx.search_log.count().await.unwrap(), 0);
}

#[tokio::test]
async fn zero_matches_is_a_normal_empty_result() {
    let fx = setup().await;
    fx.sessions.start(true).await.unwrap();

    let hits = fx.search_service().search("anything", 2).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn identical_searches_return_identical_order() {
    let fx = setup().await;
    let session = fx.sessions.start(true).await.unwrap();

    // three occurrences of near-identical words across two pages
    let pdf = fx.write_fake_pdf("scan.pdf");
    let service = IngestService::new(
        fx.documents.clone(),
        Arc::new(BlankRasterizer { pages: 2 }),
        Arc::new(FixedOcr {
            detections: vec![
                WordDetection {
                    word: "ledger".into(),
                    x: 200,
                    y: 40,
                    width: 60,
                    height: 18,
                },
                WordDetection {
                    word: "ledgers".into(),
                    x: 30,
                    y: 40,
                    width: 70,
                    height: 18,
                },
            ],
        }),
        IngestConfig::default(),
    );
    service.ingest_file(&pdf, session.id).await.unwrap();

    let first = fx.search_service().search("ledger", 2).await.unwrap();
    let second = fx.search_service().search("ledger", 2).await.unwrap();
    assert_eq!(first, second);

    // scan order: page ascending, then x_min ascending within a page
    assert_eq!(first.len(), 4);
    assert_eq!(first[0].page_number, 1);
    assert_eq!(first[0].bbox.x_min, 30);
    assert_eq!(first[1].bbox.x_min, 200);
    assert_eq!(first[2].page_number, 2);
}

#[tokio::test]
async fn pdf_pages_are_batched_and_numbered_consecutively() {
    let fx = setup().await;
    let session = fx.sessions.start(true).await.unwrap();

    let pdf = fx.write_fake_pdf("long.pdf");
    // 25 pages with batch size 10 exercises a short final batch
    let service = IngestService::new(
        fx.documents.clone(),
        Arc::new(BlankRasterizer { pages: 25 }),
        Arc::new(FixedOcr::single("page", 10, 10, 50, 12)),
        IngestConfig {
            dpi: 300,
            batch_size: 10,
        },
    );
    let outcome = service.ingest_file(&pdf, session.id).await.unwrap();
    assert_eq!(outcome.page_count, 25);
    assert_eq!(outcome.words_indexed, 25);

    let occurrences = fx.documents.occurrences(outcome.document_id).await.unwrap();
    let pages: Vec<u32> = occurrences.iter().map(|o| o.page_number).collect();
    assert_eq!(pages, (1..=25).collect::<Vec<u32>>());
    for occurrence in &occurrences {
        assert!(occurrence.bbox.is_valid());
        assert!(occurrence.page_number >= 1 && occurrence.page_number <= outcome.page_count);
    }
}

#[tokio::test]
async fn blank_detections_are_dropped() {
    let fx = setup().await;
    let session = fx.sessions.start(true).await.unwrap();

    let page = fx.write_page_image("sparse.png");
    let service = fx.ingest_service(
        FixedOcr {
            detections: vec![
                WordDetection {
                    word: "kept".into(),
                    x: 5,
                    y: 5,
                    width: 40,
                    height: 12,
                },
                WordDetection {
                    word: "   ".into(),
                    x: 60,
                    y: 5,
                    width: 10,
                    height: 12,
                },
                WordDetection {
                    word: String::new(),
                    x: 80,
                    y: 5,
                    width: 10,
                    height: 12,
                },
            ],
        },
        BlankRasterizer { pages: 0 },
    );
    let outcome = service.ingest_file(&page, session.id).await.unwrap();
    assert_eq!(outcome.words_indexed, 1);
    assert_eq!(fx.documents.word_count().await.unwrap(), 1);
}

#[tokio::test]
async fn reingesting_a_file_duplicates_rows() {
    let fx = setup().await;
    let session = fx.sessions.start(true).await.unwrap();

    let page = fx.write_page_image("dup.png");
    let service = fx.ingest_service(
        FixedOcr::single("receipt", 20, 20, 90, 18),
        BlankRasterizer { pages: 0 },
    );
    let first = service.ingest_file(&page, session.id).await.unwrap();
    let second = service.ingest_file(&page, session.id).await.unwrap();

    // no dedup: two documents, two occurrence rows for the same word
    assert_ne!(first.document_id, second.document_id);
    assert_eq!(fx.documents.word_count().await.unwrap(), 2);

    let hits = fx.search_service().search("receipt", 0).await.unwrap();
    assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn fresh_session_wipes_index_but_keeps_history() {
    let fx = setup().await;
    let session = fx.sessions.start(true).await.unwrap();

    let page = fx.write_page_image("old.png");
    let service = fx.ingest_service(
        FixedOcr::single("stale", 20, 20, 60, 18),
        BlankRasterizer { pages: 0 },
    );
    service.ingest_file(&page, session.id).await.unwrap();
    fx.search_service().search("stale", 0).await.unwrap();
    assert_eq!(fx.search_log.count().await.unwrap(), 1);

    let new_session = fx.sessions.start(true).await.unwrap();

    // index wiped, history retained, one open session
    assert_eq!(fx.documents.count().await.unwrap(), 0);
    assert_eq!(fx.documents.word_count().await.unwrap(), 0);
    assert_eq!(fx.search_log.count().await.unwrap(), 1);
    assert_eq!(fx.sessions.open_count().await.unwrap(), 1);
    assert_eq!(fx.sessions.count().await.unwrap(), 2);
    assert_ne!(session.id, new_session.id);

    // searching the wiped index finds nothing
    let hits = fx.search_service().search("stale", 0).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn continue_session_reuses_latest() {
    let fx = setup().await;
    let fresh = fx.sessions.start(true).await.unwrap();
    let continued = fx.sessions.start(false).await.unwrap();
    assert_eq!(fresh.id, continued.id);
}

#[tokio::test]
async fn file_level_failures_do_not_abort_sibling_files() {
    let fx = setup().await;
    let session = fx.sessions.start(true).await.unwrap();

    // a corrupt image file plus a good one; the corrupt file fails decode
    let bad = fx.dir.path().join("broken.png");
    std::fs::write(&bad, b"not a png").unwrap();
    let good = fx.write_page_image("fine.png");

    let service = fx.ingest_service(
        FixedOcr::single("fine", 10, 10, 40, 12),
        BlankRasterizer { pages: 0 },
    );
    let outcomes = service
        .ingest_paths(&[bad, good], session.id)
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].path.ends_with("fine.png"));
}
