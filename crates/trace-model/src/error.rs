//! Error types for the traceability model

/// Errors raised while building model values from wire records
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Identifier was empty after trimming
    #[error("empty artifact identifier")]
    EmptyIdentifier,

    /// Identifier field held a value that is neither string nor number
    #[error("unsupported identifier value: {0}")]
    UnsupportedIdentifier(String),

    /// Record could not be decoded
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] serde_json::Error),
}
