//! Diesel ORM models for database tables.
//!
//! These models provide compile-time type checking for database operations.

use diesel::prelude::*;

use crate::schema;

/// Session record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::sessions)]
#[diesel(primary_key(session_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SessionRecord {
    pub session_id: i32,
    pub start_time: String,
    pub end_time: Option<String>,
}

/// New session for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::sessions)]
pub struct NewSession<'a> {
    pub start_time: &'a str,
}

/// Document record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::documents)]
#[diesel(primary_key(document_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DocumentRecord {
    pub document_id: i32,
    pub document_path: String,
    pub session_id: i32,
    pub page_count: i32,
}

/// New document for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::documents)]
pub struct NewDocument<'a> {
    pub document_path: &'a str,
    pub session_id: i32,
    pub page_count: i32,
}

/// Word occurrence record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::extracted_texts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ExtractedTextRecord {
    pub id: i32,
    pub document_id: i32,
    pub word: String,
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
    pub page_number: i32,
    pub session_id: i32,
}

/// New word occurrence for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::extracted_texts)]
pub struct NewExtractedText<'a> {
    pub document_id: i32,
    pub word: &'a str,
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
    pub page_number: i32,
    pub session_id: i32,
}

/// Search result record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::search_result)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SearchResultRecord {
    pub id: i32,
    pub search_term: String,
    pub session_id: i32,
    pub document_id: i32,
    pub word: String,
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
    pub page_number: i32,
    pub match_time: String,
}

/// New search result for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::search_result)]
pub struct NewSearchResult<'a> {
    pub search_term: &'a str,
    pub session_id: i32,
    pub document_id: i32,
    pub word: &'a str,
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
    pub page_number: i32,
    pub match_time: &'a str,
}
