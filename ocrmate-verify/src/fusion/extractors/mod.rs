// Extractors - the two external sources behind one trait
//
// OCR and LLM extraction both happen outside this crate. An Extractor adapts
// one of them into a SourceExtraction for a document and schema.

pub mod file_extractor;
pub mod keyword_extractor;

use crate::error::VerifyResult;
use crate::types::{DocumentRef, ExtractionSchema, Source, SourceExtraction};
use async_trait::async_trait;

pub use file_extractor::JsonFileExtractor;
pub use keyword_extractor::OcrKeywordExtractor;

/// Extractor trait - OCR and LLM sources both implement this
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Which side of the comparison this extractor feeds
    fn source(&self) -> Source;

    /// Extract every schema field it can find from the document
    ///
    /// # Returns
    /// * `Ok(SourceExtraction)` - values with self-reported confidence
    /// * `Err(VerifyError::SourceUnavailable)` - the source failed as a whole;
    ///   the orchestrator degrades to the other source
    async fn extract(
        &self,
        document: &DocumentRef,
        schema: &ExtractionSchema,
    ) -> VerifyResult<SourceExtraction>;

    /// Check if extractor is usable (credentials configured, model loaded, etc.)
    fn is_available(&self) -> bool {
        true
    }
}

/// Extractor returning a precomputed extraction, e.g. a cached prediction
pub struct StaticExtractor {
    extraction: SourceExtraction,
}

impl StaticExtractor {
    pub fn new(extraction: SourceExtraction) -> Self {
        Self { extraction }
    }
}

#[async_trait]
impl Extractor for StaticExtractor {
    fn source(&self) -> Source {
        self.extraction.source()
    }

    async fn extract(
        &self,
        _document: &DocumentRef,
        _schema: &ExtractionSchema,
    ) -> VerifyResult<SourceExtraction> {
        Ok(self.extraction.clone())
    }
}
