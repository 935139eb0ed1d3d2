//! Highlight rendering: draw recorded search matches back onto page images.
//!
//! Rendering is read-only with respect to the index; it regenerates page
//! images and writes annotated PNGs under a per-document output directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{Rgb, RgbImage};

use crate::config::DEFAULT_DPI;
use crate::error::{Error, Result};
use crate::models::{BoundingBox, Document, DocumentKind, SearchHit};
use crate::ocr::{self, blocking, Rasterizer};
use crate::repository::search_log::DieselSearchRepository;

/// Highlight outline color.
const HIGHLIGHT: Rgb<u8> = Rgb([255, 0, 0]);

/// Rendering tuning knobs.
#[derive(Debug, Clone, Copy)]
pub struct AnnotateConfig {
    /// Resolution for regenerated PDF pages. Independent of ingestion DPI.
    pub dpi: u32,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self { dpi: DEFAULT_DPI }
    }
}

/// Margin and outline thickness in pixels for a given resolution.
///
/// 1 mm of margin and 0.5 mm of outline, converted through the DPI.
pub fn highlight_geometry(dpi: u32) -> (i32, u32) {
    let pixels_per_mm = f64::from(dpi) / 25.4;
    let margin = (pixels_per_mm * 1.0).round() as i32;
    let thickness = (pixels_per_mm * 0.5).round().max(1.0) as u32;
    (margin, thickness)
}

/// Expand a stored box by `margin` on all sides and clamp it to the page.
///
/// Returns None when the expanded box falls entirely outside the image.
pub fn highlight_rect(
    bbox: &BoundingBox,
    margin: i32,
    image_width: u32,
    image_height: u32,
) -> Option<BoundingBox> {
    let x_min = (bbox.x_min - margin).max(0);
    let y_min = (bbox.y_min - margin).max(0);
    let x_max = (bbox.x_max + margin).min(image_width as i32 - 1);
    let y_max = (bbox.y_max + margin).min(image_height as i32 - 1);

    (x_min <= x_max && y_min <= y_max).then(|| BoundingBox::new(x_min, y_min, x_max, y_max))
}

/// Draw a rectangle outline of the given thickness, growing inward from the
/// rect's edges. The rect must already be clamped to the image.
fn draw_rect_outline(image: &mut RgbImage, rect: &BoundingBox, thickness: u32, color: Rgb<u8>) {
    let x0 = rect.x_min.max(0) as u32;
    let y0 = rect.y_min.max(0) as u32;
    let x1 = rect.x_max.max(0) as u32;
    let y1 = rect.y_max.max(0) as u32;

    for band in 0..thickness {
        let left = x0 + band;
        let top = y0 + band;
        let right = x1.saturating_sub(band);
        let bottom = y1.saturating_sub(band);
        if left > right || top > bottom {
            break;
        }
        for x in left..=right {
            image.put_pixel(x, top, color);
            image.put_pixel(x, bottom, color);
        }
        for y in top..=bottom {
            image.put_pixel(left, y, color);
            image.put_pixel(right, y, color);
        }
    }
}

/// Renders per-page images with highlight rectangles for recorded matches.
pub struct AnnotationService {
    search: DieselSearchRepository,
    rasterizer: Arc<dyn Rasterizer>,
    config: AnnotateConfig,
}

impl AnnotationService {
    pub fn new(
        search: DieselSearchRepository,
        rasterizer: Arc<dyn Rasterizer>,
        config: AnnotateConfig,
    ) -> Self {
        Self {
            search,
            rasterizer,
            config,
        }
    }

    /// Render every document that has recorded search results.
    ///
    /// Documents whose source file has moved are logged and skipped. Returns
    /// the paths of all written page images.
    pub async fn annotate_all(&self, output_root: &Path) -> Result<Vec<PathBuf>> {
        let grouped = self.search.results_by_document().await?;
        if grouped.is_empty() {
            tracing::info!("no search results recorded, nothing to annotate");
            return Ok(Vec::new());
        }

        let mut written = Vec::new();
        for (document, hits) in grouped {
            let source = Path::new(&document.path);
            if !source.exists() {
                tracing::warn!(path = %document.path, "document file missing, skipping");
                continue;
            }

            let out_dir = output_root.join(document_stem(source));
            std::fs::create_dir_all(&out_dir)?;

            match self.annotate_document(&document, &hits, &out_dir).await {
                Ok(mut paths) => written.append(&mut paths),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(path = %document.path, error = %e, "annotation failed");
                }
            }
        }

        Ok(written)
    }

    /// Render one document's pages with its matches highlighted.
    pub async fn annotate_document(
        &self,
        document: &Document,
        hits: &[SearchHit],
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let source = PathBuf::from(&document.path);

        let mut boxes_by_page: HashMap<u32, Vec<BoundingBox>> = HashMap::new();
        for hit in hits {
            boxes_by_page
                .entry(hit.page_number)
                .or_default()
                .push(hit.bbox);
        }

        let pages: Vec<RgbImage> = match ocr::detect_kind(&source)? {
            DocumentKind::Pdf => {
                let rasterizer = self.rasterizer.clone();
                let path = source.clone();
                let dpi = self.config.dpi;
                let page_count = document.page_count;
                blocking(move || rasterizer.rasterize_range(&path, dpi, 1, page_count)).await?
            }
            DocumentKind::Image => {
                let path = source.clone();
                blocking(move || Ok(vec![image::open(&path)?.to_rgb8()])).await?
            }
        };

        let (margin, thickness) = highlight_geometry(self.config.dpi);
        let stem = document_stem(&source);
        let out_dir = out_dir.to_path_buf();

        tokio::task::spawn_blocking(move || -> Result<Vec<PathBuf>> {
            let mut written = Vec::with_capacity(pages.len());
            for (index, mut page) in pages.into_iter().enumerate() {
                let page_number = index as u32 + 1;
                let (width, height) = page.dimensions();

                for bbox in boxes_by_page.get(&page_number).into_iter().flatten() {
                    match highlight_rect(bbox, margin, width, height) {
                        Some(rect) => draw_rect_outline(&mut page, &rect, thickness, HIGHLIGHT),
                        None => {
                            tracing::warn!(page = page_number, "match outside page bounds");
                        }
                    }
                }

                let out_path = out_dir.join(format!("{stem}_page_{page_number}.png"));
                page.save(&out_path)?;
                written.push(out_path);
            }
            Ok(written)
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::other(format!("render task failed: {e}"))))?
    }
}

fn document_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_at_300_dpi() {
        let (margin, thickness) = highlight_geometry(300);
        assert_eq!(margin, 12);
        assert_eq!(thickness, 6);
    }

    #[test]
    fn geometry_never_degenerates() {
        let (_, thickness) = highlight_geometry(25);
        assert!(thickness >= 1);
    }

    #[test]
    fn highlight_rect_clamps_both_corners() {
        let bbox = BoundingBox::new(5, 5, 195, 95);
        let rect = highlight_rect(&bbox, 12, 200, 100).unwrap();
        assert_eq!(rect, BoundingBox::new(0, 0, 199, 99));
    }

    #[test]
    fn highlight_rect_expands_interior_boxes() {
        let bbox = BoundingBox::new(100, 100, 150, 120);
        let rect = highlight_rect(&bbox, 12, 1000, 1000).unwrap();
        assert_eq!(rect, BoundingBox::new(88, 88, 162, 132));
    }

    #[test]
    fn highlight_rect_rejects_offscreen_boxes() {
        let bbox = BoundingBox::new(500, 500, 520, 520);
        assert!(highlight_rect(&bbox, 2, 100, 100).is_none());
    }

    #[test]
    fn outline_touches_corners_and_leaves_interior() {
        let mut image = RgbImage::from_pixel(60, 40, Rgb([255, 255, 255]));
        let rect = BoundingBox::new(10, 10, 49, 29);
        draw_rect_outline(&mut image, &rect, 2, HIGHLIGHT);

        assert_eq!(*image.get_pixel(10, 10), HIGHLIGHT);
        assert_eq!(*image.get_pixel(49, 29), HIGHLIGHT);
        // second band
        assert_eq!(*image.get_pixel(11, 11), HIGHLIGHT);
        // interior untouched
        assert_eq!(*image.get_pixel(30, 20), Rgb([255, 255, 255]));
        // outside untouched
        assert_eq!(*image.get_pixel(9, 9), Rgb([255, 255, 255]));
    }
}
