//! Crate-wide error types.
//!
//! Failure classes map to containment policy: `Connection` aborts the run,
//! `Adapter` aborts one file, `RowWrite` skips one row, `Validation` is
//! rejected before any store interaction.

use crate::ocr::AdapterError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Store unreachable (pool exhausted, database locked away, task failure).
    #[error("database unreachable: {0}")]
    Connection(String),

    /// A query failed for reasons other than a single-row write.
    #[error("database error: {0}")]
    Store(#[from] diesel::result::Error),

    /// Rasterization or OCR failed for one file or page.
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// A single insert failed; the surrounding work continues without it.
    #[error("row write failed ({context}): {source}")]
    RowWrite {
        context: String,
        #[source]
        source: diesel::result::Error,
    },

    /// Malformed caller input, rejected before any side effect.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("no {0} recorded")]
    NotFound(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error must abort the whole run rather than one unit of work.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Connection(_))
    }
}
