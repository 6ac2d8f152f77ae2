//! ocrmate-verify - OCR/LLM dual-extraction verification
//!
//! Compares the values an OCR engine and an LLM extractor pulled from the
//! same document, fuses their confidences, resolves disagreements through a
//! configurable conflict policy and routes the document to auto-approval,
//! spot-check or human review.
//!
//! Pipeline: extractors → normalizer → comparator → confidence fusion
//! (+ conflict policy) → document aggregator.

pub mod config;
pub mod error;
pub mod fusion;
pub mod logging;
pub mod ocr;
pub mod types;
pub mod workflow;

pub use crate::config::VerifierSettings;
pub use crate::error::{VerifyError, VerifyResult};
pub use crate::fusion::extractors::{Extractor, JsonFileExtractor, OcrKeywordExtractor};
pub use crate::fusion::{
    ConflictPolicy, Disposition, DocumentVerification, FieldVerification, MatchStatus,
    ResolutionMethod, RoutingThresholds,
};
pub use crate::types::{
    DocumentRef, ExtractionSchema, FieldSpec, RawValue, SemanticType, Source, SourceExtraction,
    SourceField,
};
pub use crate::workflow::VerificationOrchestrator;
