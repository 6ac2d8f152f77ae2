//! Error types for ocrmate-verify
//!
//! Only total unavailability of both extraction sources (or caller
//! cancellation / an invalid schema) fails a verification run. Everything
//! else degrades into lower confidence and a review disposition.

use crate::types::Source;
use thiserror::Error;

/// Verification error type
#[derive(Debug, Error)]
pub enum VerifyError {
    /// One extractor timed out, failed in transport or returned garbage
    #[error("{extractor} source unavailable: {reason}")]
    SourceUnavailable { extractor: Source, reason: String },

    /// Neither extractor produced a result for this document
    #[error("both extraction sources unavailable (OCR: {ocr}; LLM: {llm})")]
    BothSourcesUnavailable { ocr: String, llm: String },

    /// Caller cancelled the run before it completed
    #[error("verification cancelled")]
    Cancelled,

    /// Schema with empty or duplicate field names
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// ocrmate-common error
    #[error("Common error: {0}")]
    Common(#[from] ocrmate_common::Error),
}

impl VerifyError {
    pub fn source_unavailable(extractor: Source, reason: impl Into<String>) -> Self {
        VerifyError::SourceUnavailable {
            extractor,
            reason: reason.into(),
        }
    }
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerifyError>;
