//! Document and word-occurrence persistence.

use diesel::prelude::*;

use super::models::{DocumentRecord, ExtractedTextRecord, NewDocument, NewExtractedText};
use super::pool::{run_blocking, DieselError, SqlitePool};
use super::LastInsertRowId;
use crate::error::Result;
use crate::models::{BoundingBox, Document, WordOccurrence};
use crate::schema::{documents, extracted_texts};

impl From<DocumentRecord> for Document {
    fn from(record: DocumentRecord) -> Self {
        Document {
            id: record.document_id,
            path: record.document_path,
            session_id: record.session_id,
            page_count: record.page_count.max(1) as u32,
        }
    }
}

impl From<ExtractedTextRecord> for WordOccurrence {
    fn from(record: ExtractedTextRecord) -> Self {
        WordOccurrence {
            document_id: record.document_id,
            session_id: record.session_id,
            word: record.word,
            bbox: BoundingBox::new(record.x_min, record.y_min, record.x_max, record.y_max),
            page_number: record.page_number.max(1) as u32,
        }
    }
}

/// Outcome of a batched word-occurrence write.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOutcome {
    pub inserted: u64,
    pub skipped: u64,
}

/// Diesel-based document repository with compile-time query checking.
#[derive(Clone)]
pub struct DieselDocumentRepository {
    pool: SqlitePool,
}

impl DieselDocumentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a document row once its page count is known. Returns the new
    /// document id used by all subsequent word writes.
    pub async fn insert(&self, path: &str, session_id: i32, page_count: u32) -> Result<i32> {
        let path = path.to_string();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            diesel::insert_into(documents::table)
                .values(NewDocument {
                    document_path: &path,
                    session_id,
                    page_count: page_count as i32,
                })
                .execute(conn)?;

            let rowid: LastInsertRowId =
                diesel::sql_query("SELECT last_insert_rowid()").get_result(conn)?;
            Ok(rowid.id as i32)
        })
        .await
    }

    /// Insert a batch of word occurrences in one transaction.
    ///
    /// A failing row is logged and skipped without aborting the batch; rows
    /// already written by earlier batches are never rolled back.
    pub async fn insert_words(&self, words: Vec<WordOccurrence>) -> Result<BatchOutcome> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            conn.transaction::<_, DieselError, _>(|conn| {
                let mut outcome = BatchOutcome::default();
                for word in &words {
                    let row = NewExtractedText {
                        document_id: word.document_id,
                        word: &word.word,
                        x_min: word.bbox.x_min,
                        y_min: word.bbox.y_min,
                        x_max: word.bbox.x_max,
                        y_max: word.bbox.y_max,
                        page_number: word.page_number as i32,
                        session_id: word.session_id,
                    };
                    match diesel::insert_into(extracted_texts::table)
                        .values(row)
                        .execute(conn)
                    {
                        Ok(_) => outcome.inserted += 1,
                        Err(e) => {
                            tracing::warn!(
                                word = %word.word,
                                page = word.page_number,
                                error = %e,
                                "skipping word occurrence"
                            );
                            outcome.skipped += 1;
                        }
                    }
                }
                Ok(outcome)
            })
        })
        .await
    }

    /// Get a document by id.
    pub async fn get(&self, id: i32) -> Result<Option<Document>> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            documents::table
                .find(id)
                .first::<DocumentRecord>(conn)
                .optional()
        })
        .await
        .map(|opt| opt.map(Document::from))
    }

    /// All documents in insertion order.
    pub async fn list(&self) -> Result<Vec<Document>> {
        let pool = self.pool.clone();

        run_blocking(pool, |conn| {
            documents::table
                .order(documents::document_id.asc())
                .load::<DocumentRecord>(conn)
        })
        .await
        .map(|records| records.into_iter().map(Document::from).collect())
    }

    /// Count all documents.
    pub async fn count(&self) -> Result<u64> {
        let pool = self.pool.clone();

        run_blocking(pool, |conn| {
            use diesel::dsl::count_star;
            let count: i64 = documents::table.select(count_star()).first(conn)?;
            Ok(count as u64)
        })
        .await
    }

    /// Count all word occurrences.
    pub async fn word_count(&self) -> Result<u64> {
        let pool = self.pool.clone();

        run_blocking(pool, |conn| {
            use diesel::dsl::count_star;
            let count: i64 = extracted_texts::table.select(count_star()).first(conn)?;
            Ok(count as u64)
        })
        .await
    }

    /// Count word occurrences for one document.
    pub async fn word_count_for_document(&self, document_id: i32) -> Result<u64> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            use diesel::dsl::count_star;
            let count: i64 = extracted_texts::table
                .filter(extracted_texts::document_id.eq(document_id))
                .select(count_star())
                .first(conn)?;
            Ok(count as u64)
        })
        .await
    }

    /// Word occurrences for one document in scan order.
    pub async fn occurrences(&self, document_id: i32) -> Result<Vec<WordOccurrence>> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            extracted_texts::table
                .filter(extracted_texts::document_id.eq(document_id))
                .order((
                    extracted_texts::page_number.asc(),
                    extracted_texts::x_min.asc(),
                    extracted_texts::y_min.asc(),
                ))
                .load::<ExtractedTextRecord>(conn)
        })
        .await
        .map(|records| records.into_iter().map(WordOccurrence::from).collect())
    }
}
