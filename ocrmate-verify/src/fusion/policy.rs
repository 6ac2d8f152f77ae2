// Conflict Resolution Policy - Strategies for Disagreeing Sources
//
// Consulted only for MISMATCH fields. Selected once per verification run;
// every strategy is a pure function of its inputs.

use super::normalizer::NormalizedValue;
use super::ResolutionMethod;
use crate::types::{clamp_confidence, Confidence, RawValue, SemanticType, Source};
use std::fmt;
use std::str::FromStr;

/// Strategy used when OCR and LLM disagree on a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Take the more confident source; `ties` decides equal confidences
    HigherConfidence { ties: Source },
    /// Always take the named source
    PreferSource(Source),
    /// Confidence-weighted mean for number/currency fields,
    /// HigherConfidence (favoring the LLM on ties) for anything else
    WeightedAverage,
    /// Never resolve automatically
    AlwaysHumanReview,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        ConflictPolicy::HigherConfidence { ties: Source::Llm }
    }
}

impl ConflictPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            ConflictPolicy::HigherConfidence { .. } => "higher_confidence",
            ConflictPolicy::PreferSource(Source::Ocr) => "prefer_ocr",
            ConflictPolicy::PreferSource(Source::Llm) => "prefer_llm",
            ConflictPolicy::WeightedAverage => "weighted_average",
            ConflictPolicy::AlwaysHumanReview => "human_review",
        }
    }

    /// Replace the tie-break source; no effect on other strategies
    pub fn with_tie_break(self, source: Source) -> Self {
        match self {
            ConflictPolicy::HigherConfidence { .. } => {
                ConflictPolicy::HigherConfidence { ties: source }
            }
            other => other,
        }
    }

    /// Resolve a disagreement between two present, normalized values
    pub fn resolve(
        &self,
        ocr: Candidate<'_>,
        llm: Candidate<'_>,
        semantic_type: SemanticType,
    ) -> Resolution {
        match *self {
            ConflictPolicy::HigherConfidence { ties } => higher_confidence(ocr, llm, ties),
            ConflictPolicy::PreferSource(Source::Ocr) => Resolution {
                final_value: Some(ocr.raw.clone()),
                confidence: clamp_confidence(ocr.confidence),
                method: ResolutionMethod::PreferOcr,
            },
            ConflictPolicy::PreferSource(Source::Llm) => Resolution {
                final_value: Some(llm.raw.clone()),
                confidence: clamp_confidence(llm.confidence),
                method: ResolutionMethod::PreferLlm,
            },
            ConflictPolicy::WeightedAverage => weighted_average(ocr, llm, semantic_type),
            ConflictPolicy::AlwaysHumanReview => Resolution {
                final_value: None,
                confidence: 0.0,
                method: ResolutionMethod::HumanReview,
            },
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictPolicy::HigherConfidence { ties } => {
                write!(f, "higher_confidence (ties favor {})", ties)
            }
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "higher_confidence" => Ok(ConflictPolicy::default()),
            "prefer_ocr" => Ok(ConflictPolicy::PreferSource(Source::Ocr)),
            "prefer_llm" => Ok(ConflictPolicy::PreferSource(Source::Llm)),
            "weighted_average" => Ok(ConflictPolicy::WeightedAverage),
            "human_review" | "always_human_review" => Ok(ConflictPolicy::AlwaysHumanReview),
            other => Err(format!(
                "unknown conflict policy '{}' (expected higher_confidence, prefer_ocr, \
                 prefer_llm, weighted_average or human_review)",
                other
            )),
        }
    }
}

/// One source's side of a disagreement
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub raw: &'a RawValue,
    pub normalized: &'a NormalizedValue,
    pub confidence: Confidence,
}

/// Final value, fused confidence and the branch that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub final_value: Option<RawValue>,
    pub confidence: Confidence,
    pub method: ResolutionMethod,
}

fn higher_confidence(ocr: Candidate<'_>, llm: Candidate<'_>, ties: Source) -> Resolution {
    let winner = pick_higher(ocr.confidence, llm.confidence, ties);
    let (chosen, method) = match winner {
        Source::Ocr => (ocr, ResolutionMethod::HigherConfidenceOcr),
        Source::Llm => (llm, ResolutionMethod::HigherConfidenceLlm),
    };
    Resolution {
        final_value: Some(chosen.raw.clone()),
        confidence: clamp_confidence(ocr.confidence.max(llm.confidence)),
        method,
    }
}

fn pick_higher(ocr_conf: Confidence, llm_conf: Confidence, ties: Source) -> Source {
    match ocr_conf.partial_cmp(&llm_conf) {
        Some(std::cmp::Ordering::Greater) => Source::Ocr,
        Some(std::cmp::Ordering::Less) => Source::Llm,
        _ => ties,
    }
}

fn weighted_average(
    ocr: Candidate<'_>,
    llm: Candidate<'_>,
    semantic_type: SemanticType,
) -> Resolution {
    let numbers = (ocr.normalized.as_number(), llm.normalized.as_number());
    let weight = ocr.confidence + llm.confidence;

    match numbers {
        (Some(a), Some(b)) if semantic_type.is_numeric() && weight > 0.0 => Resolution {
            final_value: Some(RawValue::Number(
                (a * ocr.confidence + b * llm.confidence) / weight,
            )),
            confidence: clamp_confidence(weight / 2.0),
            method: ResolutionMethod::WeightedAverage,
        },
        _ => {
            tracing::debug!(
                "weighted_average not applicable to {} field, falling back to higher_confidence",
                semantic_type
            );
            let mut fallback = higher_confidence(ocr, llm, Source::Llm);
            fallback.method = match fallback.method {
                ResolutionMethod::HigherConfidenceOcr => {
                    ResolutionMethod::FallbackHigherConfidenceOcr
                }
                _ => ResolutionMethod::FallbackHigherConfidenceLlm,
            };
            fallback
        }
    }
}
