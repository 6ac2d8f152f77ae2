//! Verification workflow
//!
//! Runs both extractors for one document and hands their results to the
//! reconciliation pipeline in `crate::fusion`.

pub mod orchestrator;

pub use orchestrator::VerificationOrchestrator;
