// Field Comparator - Type-Aware Match Status
//
// Decides whether two normalized values agree. Numeric fields tolerate 1%
// relative difference, dates compare canonically, everything else compares
// case-folded text.

use super::normalizer::NormalizedValue;
use super::MatchStatus;
use crate::types::SemanticType;

/// Maximum relative distance at which two numeric values still match
pub const NUMERIC_TOLERANCE: f64 = 0.01;

/// Floor for the relative-distance denominator
const DISTANCE_EPSILON: f64 = f64::EPSILON;

/// Outcome of comparing one field across the two sources
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub status: MatchStatus,
    /// Relative distance, only for numeric fields where both values were present
    pub distance: Option<f64>,
}

impl Comparison {
    fn status(status: MatchStatus) -> Self {
        Self {
            status,
            distance: None,
        }
    }
}

/// Compare the OCR and LLM normalized values for one field
pub fn compare(
    ocr: Option<&NormalizedValue>,
    llm: Option<&NormalizedValue>,
    semantic_type: SemanticType,
) -> Comparison {
    let (ocr, llm) = match (ocr, llm) {
        (None, None) => return Comparison::status(MatchStatus::BothMissing),
        (Some(_), None) => return Comparison::status(MatchStatus::OcrOnly),
        (None, Some(_)) => return Comparison::status(MatchStatus::LlmOnly),
        (Some(a), Some(b)) => (a, b),
    };

    if semantic_type.is_numeric() {
        if let (Some(a), Some(b)) = (ocr.as_number(), llm.as_number()) {
            let distance = relative_distance(a, b);
            let status = if distance <= NUMERIC_TOLERANCE {
                MatchStatus::Match
            } else {
                MatchStatus::Mismatch
            };
            return Comparison {
                status,
                distance: Some(distance),
            };
        }
    }

    // Dates compare as canonical NaiveDate, text as folded strings
    let status = if ocr == llm {
        MatchStatus::Match
    } else {
        MatchStatus::Mismatch
    };
    Comparison::status(status)
}

/// `|a-b| / max(|a|, |b|, ε)`; two zeros are distance 0
pub fn relative_distance(a: f64, b: f64) -> f64 {
    if a == 0.0 && b == 0.0 {
        return 0.0;
    }
    (a - b).abs() / a.abs().max(b.abs()).max(DISTANCE_EPSILON)
}
