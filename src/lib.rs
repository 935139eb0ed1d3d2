//! wordtrace: index scanned documents by word and pixel location, search the
//! index by bounded edit distance, and render matches back onto the pages as
//! highlight rectangles.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod ocr;
pub mod repository;
pub mod schema;
pub mod services;

pub use error::{Error, Result};
