//! Error types for the tachar censoring library.

use thiserror::Error;

/// Primary error type for censoring operations.
///
/// Bookkeeping mismatches in the stream stack are reported through logging
/// and never surface here; this type covers the failures that would
/// otherwise produce wrong redaction or wrong geometry.
#[derive(Error, Debug)]
pub enum Error {
    #[error("document error: {0}")]
    Document(#[from] lopdf::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XObject not found in resources: {0}")]
    MissingObject(String),

    #[error("XObject {0} is not a stream")]
    NotAStream(String),

    #[error("content stream error: {0}")]
    ContentStream(String),

    #[error("invalid censor expression {pattern:?}: {msg}")]
    InvalidExpression { pattern: String, msg: String },

    #[error("document has no pages")]
    EmptyDocument,
}

/// Convenience Result type alias for censoring operations.
pub type Result<T> = std::result::Result<T, Error>;
