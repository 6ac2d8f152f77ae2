//! Verification Orchestrator
//!
//! Issues the OCR and LLM extractions concurrently, waits for both (each
//! bounded by its own timeout) and reconciles whatever came back.
//!
//! # Error Handling
//! - One failed or timed-out source: logged, its fields degrade to the other
//!   source's single-source path
//! - Both failed: `VerifyError::BothSourcesUnavailable`
//! - Caller cancellation: both in-flight extractions are dropped and
//!   `VerifyError::Cancelled` is returned
//!
//! # Example
//! ```rust,ignore
//! let orchestrator = VerificationOrchestrator::new(ocr, llm, VerifierSettings::default());
//! let verification = orchestrator.verify(&DocumentRef::new("receipt.png"), &schema).await?;
//! ```

use crate::config::VerifierSettings;
use crate::error::{VerifyError, VerifyResult};
use crate::fusion::extractors::Extractor;
use crate::fusion::{reconcile_document, DocumentVerification};
use crate::types::{DocumentRef, ExtractionSchema, Source, SourceExtraction};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs one verification per call; holds no per-document state
pub struct VerificationOrchestrator {
    ocr: Arc<dyn Extractor>,
    llm: Arc<dyn Extractor>,
    settings: VerifierSettings,
}

impl VerificationOrchestrator {
    pub fn new(
        ocr: Arc<dyn Extractor>,
        llm: Arc<dyn Extractor>,
        settings: VerifierSettings,
    ) -> Self {
        if ocr.source() != Source::Ocr || llm.source() != Source::Llm {
            warn!(
                "Extractor sources look swapped (ocr slot reports {}, llm slot reports {})",
                ocr.source(),
                llm.source()
            );
        }
        Self { ocr, llm, settings }
    }

    pub fn settings(&self) -> &VerifierSettings {
        &self.settings
    }

    /// Verify one document against the schema
    ///
    /// # Returns
    /// * `Ok(DocumentVerification)` - at least one source produced a result
    /// * `Err(InvalidSchema)` - checked before any extractor runs
    /// * `Err(BothSourcesUnavailable)` - neither source produced a result
    pub async fn verify(
        &self,
        document: &DocumentRef,
        schema: &ExtractionSchema,
    ) -> VerifyResult<DocumentVerification> {
        schema.validate()?;
        let start = Instant::now();
        info!(
            "Verifying {} ({} fields, policy {})",
            document,
            schema.fields.len(),
            self.settings.policy
        );

        // Both extractions in flight at once; neither depends on the other
        let (ocr_result, llm_result) = tokio::join!(
            self.run_extractor(self.ocr.as_ref(), document, schema),
            self.run_extractor(self.llm.as_ref(), document, schema),
        );

        let (ocr, llm) = match (ocr_result, llm_result) {
            (Err(ocr_err), Err(llm_err)) => {
                warn!("Both extraction sources failed for {}", document);
                return Err(VerifyError::BothSourcesUnavailable {
                    ocr: ocr_err.to_string(),
                    llm: llm_err.to_string(),
                });
            }
            (ocr, llm) => (Self::degrade(ocr), Self::degrade(llm)),
        };

        let verification = reconcile_document(
            document.clone(),
            schema,
            ocr.as_ref(),
            llm.as_ref(),
            &self.settings.policy,
            &self.settings.thresholds(),
        );

        debug!("Verification of {} took {:?}", document, start.elapsed());
        Ok(verification)
    }

    /// Verify, abandoning both extractions if `cancel_token` fires first
    pub async fn verify_with_cancel(
        &self,
        document: &DocumentRef,
        schema: &ExtractionSchema,
        cancel_token: &CancellationToken,
    ) -> VerifyResult<DocumentVerification> {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                info!("Verification of {} cancelled", document);
                Err(VerifyError::Cancelled)
            }
            result = self.verify(document, schema) => result,
        }
    }

    async fn run_extractor(
        &self,
        extractor: &dyn Extractor,
        document: &DocumentRef,
        schema: &ExtractionSchema,
    ) -> VerifyResult<SourceExtraction> {
        let source = extractor.source();
        if !extractor.is_available() {
            return Err(VerifyError::source_unavailable(source, "extractor not available"));
        }

        let timeout = self.settings.extractor_timeout;
        match tokio::time::timeout(timeout, extractor.extract(document, schema)).await {
            Ok(result) => result,
            Err(_) => Err(VerifyError::source_unavailable(
                source,
                format!("timed out after {:?}", timeout),
            )),
        }
    }

    /// A failed source is treated as absent for every field
    fn degrade(result: VerifyResult<SourceExtraction>) -> Option<SourceExtraction> {
        match result {
            Ok(extraction) => Some(extraction),
            Err(e) => {
                warn!("Continuing with a single source: {}", e);
                None
            }
        }
    }
}
