//! Search-side queries and the append-only search_result audit log.

use std::collections::BTreeMap;

use diesel::prelude::*;

use super::models::{DocumentRecord, ExtractedTextRecord, NewSearchResult, SearchResultRecord};
use super::pool::{run_blocking, SqlitePool};
use crate::error::{Error, Result};
use crate::models::{BoundingBox, Document, SearchHit};
use crate::schema::{documents, extracted_texts, search_result};

/// Diesel-based repository for fuzzy-search reads and result logging.
#[derive(Clone)]
pub struct DieselSearchRepository {
    pool: SqlitePool,
}

impl DieselSearchRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load every word occurrence joined with its document, ordered by
    /// `(document_id, page_number, x_min, y_min)`.
    ///
    /// This scan order is what makes search results reproducible and lets the
    /// renderer group highlights left-to-right, top-to-bottom.
    pub async fn load_corpus(&self) -> Result<Vec<SearchHit>> {
        let pool = self.pool.clone();

        let rows = run_blocking(pool, |conn| {
            extracted_texts::table
                .inner_join(documents::table)
                .order((
                    extracted_texts::document_id.asc(),
                    extracted_texts::page_number.asc(),
                    extracted_texts::x_min.asc(),
                    extracted_texts::y_min.asc(),
                ))
                .select((
                    ExtractedTextRecord::as_select(),
                    DocumentRecord::as_select(),
                ))
                .load::<(ExtractedTextRecord, DocumentRecord)>(conn)
        })
        .await?;

        Ok(rows
            .into_iter()
            .map(|(text, doc)| SearchHit {
                document_id: doc.document_id,
                document_path: doc.document_path,
                page_count: doc.page_count.max(1) as u32,
                session_id: text.session_id,
                word: text.word,
                bbox: BoundingBox::new(text.x_min, text.y_min, text.x_max, text.y_max),
                page_number: text.page_number.max(1) as u32,
            })
            .collect())
    }

    /// Append one match to the audit log.
    ///
    /// Failures come back as [`Error::RowWrite`] so the caller can skip the
    /// row and keep going.
    pub async fn append(&self, term: &str, hit: &SearchHit, match_time: &str) -> Result<()> {
        let term = term.to_string();
        let hit = hit.clone();
        let match_time = match_time.to_string();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            diesel::insert_into(search_result::table)
                .values(NewSearchResult {
                    search_term: &term,
                    session_id: hit.session_id,
                    document_id: hit.document_id,
                    word: &hit.word,
                    x_min: hit.bbox.x_min,
                    y_min: hit.bbox.y_min,
                    x_max: hit.bbox.x_max,
                    y_max: hit.bbox.y_max,
                    page_number: hit.page_number as i32,
                    match_time: &match_time,
                })
                .execute(conn)?;
            Ok(())
        })
        .await
        .map_err(|e| match e {
            Error::Store(source) => Error::RowWrite {
                context: "search_result".to_string(),
                source,
            },
            other => other,
        })
    }

    /// Count all recorded search results.
    pub async fn count(&self) -> Result<u64> {
        let pool = self.pool.clone();

        run_blocking(pool, |conn| {
            use diesel::dsl::count_star;
            let count: i64 = search_result::table.select(count_star()).first(conn)?;
            Ok(count as u64)
        })
        .await
    }

    /// Load recorded search results grouped by their document, for rendering.
    ///
    /// Results whose document no longer exists (wiped by a fresh session) are
    /// dropped by the join — the history row remains, but there is nothing
    /// left to draw on.
    pub async fn results_by_document(&self) -> Result<Vec<(Document, Vec<SearchHit>)>> {
        let pool = self.pool.clone();

        let rows = run_blocking(pool, |conn| {
            search_result::table
                .inner_join(documents::table)
                .order((
                    search_result::document_id.asc(),
                    search_result::page_number.asc(),
                    search_result::x_min.asc(),
                    search_result::y_min.asc(),
                ))
                .select((
                    SearchResultRecord::as_select(),
                    DocumentRecord::as_select(),
                ))
                .load::<(SearchResultRecord, DocumentRecord)>(conn)
        })
        .await?;

        let mut grouped: BTreeMap<i32, (Document, Vec<SearchHit>)> = BTreeMap::new();
        for (result, doc) in rows {
            let document = Document::from(doc);
            let hit = SearchHit {
                document_id: result.document_id,
                document_path: document.path.clone(),
                page_count: document.page_count,
                session_id: result.session_id,
                word: result.word,
                bbox: BoundingBox::new(result.x_min, result.y_min, result.x_max, result.y_max),
                page_number: result.page_number.max(1) as u32,
            };
            grouped
                .entry(document.id)
                .or_insert_with(|| (document, Vec::new()))
                .1
                .push(hit);
        }

        Ok(grouped.into_values().collect())
    }
}
