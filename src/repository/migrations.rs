//! Schema bootstrap.
//!
//! Word occurrences cascade from their session and document. `search_result`
//! is an append-only history table with soft references: it must survive the
//! fresh-session wipe that deletes the documents its rows point at.

use diesel::prelude::*;

use super::pool::{run_blocking, DieselError, SqlitePool};
use crate::error::Result;

const DDL: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS sessions (
        session_id INTEGER PRIMARY KEY AUTOINCREMENT,
        start_time TEXT NOT NULL,
        end_time TEXT
    )"#,
    r#"CREATE TABLE IF NOT EXISTS documents (
        document_id INTEGER PRIMARY KEY AUTOINCREMENT,
        document_path TEXT NOT NULL,
        session_id INTEGER NOT NULL REFERENCES sessions(session_id) ON DELETE CASCADE,
        page_count INTEGER NOT NULL CHECK (page_count >= 1)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS extracted_texts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        document_id INTEGER NOT NULL REFERENCES documents(document_id) ON DELETE CASCADE,
        word TEXT NOT NULL CHECK (length(word) > 0),
        x_min INTEGER NOT NULL,
        y_min INTEGER NOT NULL,
        x_max INTEGER NOT NULL,
        y_max INTEGER NOT NULL,
        page_number INTEGER NOT NULL CHECK (page_number >= 1),
        session_id INTEGER NOT NULL REFERENCES sessions(session_id) ON DELETE CASCADE,
        CHECK (x_min <= x_max AND y_min <= y_max)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS search_result (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        search_term TEXT NOT NULL,
        session_id INTEGER NOT NULL,
        document_id INTEGER NOT NULL,
        word TEXT NOT NULL,
        x_min INTEGER NOT NULL,
        y_min INTEGER NOT NULL,
        x_max INTEGER NOT NULL,
        y_max INTEGER NOT NULL,
        page_number INTEGER NOT NULL,
        match_time TEXT NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_documents_session ON documents(session_id)",
    "CREATE INDEX IF NOT EXISTS idx_extracted_texts_document
        ON extracted_texts(document_id, page_number)",
    "CREATE INDEX IF NOT EXISTS idx_search_result_document ON search_result(document_id)",
];

/// Create all tables and indexes if they do not exist.
pub async fn run_migrations(pool: SqlitePool) -> Result<()> {
    run_blocking(pool, |conn| {
        for statement in DDL {
            diesel::sql_query(*statement).execute(conn)?;
        }
        Ok::<_, DieselError>(())
    })
    .await
}
