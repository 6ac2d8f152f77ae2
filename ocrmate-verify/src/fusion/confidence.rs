// Confidence Fusion - Per-Field Final Value and Confidence
//
// Agreement earns a fixed bonus over the weaker source, a single source is
// discounted, disagreements go to the active conflict policy.

use super::policy::{Candidate, ConflictPolicy, Resolution};
use super::{MatchStatus, ResolutionMethod};
use crate::types::{clamp_confidence, SemanticType};

/// Added to the weaker confidence when both sources agree
pub const AGREEMENT_BONUS: f64 = 0.15;

/// Multiplier applied when only one source produced a usable value
pub const SINGLE_SOURCE_PENALTY: f64 = 0.8;

/// Fuse one field's comparison outcome into a final value and confidence
///
/// `ocr` / `llm` are present exactly when that source produced a value that
/// normalized; `status` must be the comparator's verdict over the same pair.
pub fn fuse(
    status: MatchStatus,
    ocr: Option<Candidate<'_>>,
    llm: Option<Candidate<'_>>,
    semantic_type: SemanticType,
    policy: &ConflictPolicy,
) -> Resolution {
    match (status, ocr, llm) {
        (MatchStatus::Match, Some(ocr), Some(llm)) => Resolution {
            final_value: Some(llm.raw.clone()),
            confidence: agreement_confidence(ocr.confidence, llm.confidence),
            method: ResolutionMethod::Agreement,
        },
        (MatchStatus::Mismatch, Some(ocr), Some(llm)) => policy.resolve(ocr, llm, semantic_type),
        (MatchStatus::OcrOnly, Some(ocr), _) => Resolution {
            final_value: Some(ocr.raw.clone()),
            confidence: single_source_confidence(ocr.confidence),
            method: ResolutionMethod::SingleSourceOcr,
        },
        (MatchStatus::LlmOnly, _, Some(llm)) => Resolution {
            final_value: Some(llm.raw.clone()),
            confidence: single_source_confidence(llm.confidence),
            method: ResolutionMethod::SingleSourceLlm,
        },
        _ => missing(),
    }
}

/// `min(ocr, llm) + AGREEMENT_BONUS`, capped at 1.0
pub fn agreement_confidence(ocr_conf: f64, llm_conf: f64) -> f64 {
    clamp_confidence(clamp_confidence(ocr_conf).min(clamp_confidence(llm_conf)) + AGREEMENT_BONUS)
}

/// `source_conf * SINGLE_SOURCE_PENALTY`
pub fn single_source_confidence(source_conf: f64) -> f64 {
    clamp_confidence(source_conf) * SINGLE_SOURCE_PENALTY
}

fn missing() -> Resolution {
    Resolution {
        final_value: None,
        confidence: 0.0,
        method: ResolutionMethod::Missing,
    }
}
