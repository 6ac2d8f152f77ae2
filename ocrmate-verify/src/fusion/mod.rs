// Fusion Module - Two-Source Reconciliation
//
// Architecture: Extractors (OCR, LLM) → Normalizer → Comparator →
// Confidence Fusion (+ Conflict Policy) → Document Aggregator

pub mod aggregator;
pub mod comparator;
pub mod confidence;
pub mod extractors;
pub mod normalizer;
pub mod policy;
pub mod reconcile;

use crate::types::{Confidence, DocumentRef, RawValue, SemanticType};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use aggregator::{aggregate, RoutingThresholds};
pub use policy::ConflictPolicy;
pub use reconcile::{reconcile_document, verify_field};

/// Categorical outcome of comparing both sources' values for one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Match,
    Mismatch,
    OcrOnly,
    LlmOnly,
    BothMissing,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Match => write!(f, "MATCH"),
            MatchStatus::Mismatch => write!(f, "MISMATCH"),
            MatchStatus::OcrOnly => write!(f, "OCR_ONLY"),
            MatchStatus::LlmOnly => write!(f, "LLM_ONLY"),
            MatchStatus::BothMissing => write!(f, "BOTH_MISSING"),
        }
    }
}

/// Routing decision for a whole document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    AutoApprove,
    SpotCheck,
    HumanReview,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::AutoApprove => write!(f, "AUTO_APPROVE"),
            Disposition::SpotCheck => write!(f, "SPOT_CHECK"),
            Disposition::HumanReview => write!(f, "HUMAN_REVIEW"),
        }
    }
}

/// Branch that produced a field's final value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// Both sources matched
    Agreement,
    SingleSourceOcr,
    SingleSourceLlm,
    /// Neither source had a usable value
    Missing,
    HigherConfidenceOcr,
    HigherConfidenceLlm,
    PreferOcr,
    PreferLlm,
    WeightedAverage,
    /// weighted_average requested on a field it cannot average
    FallbackHigherConfidenceOcr,
    FallbackHigherConfidenceLlm,
    /// Deferred to a reviewer by policy
    HumanReview,
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionMethod::Agreement => "agreement",
            ResolutionMethod::SingleSourceOcr => "single_source_ocr",
            ResolutionMethod::SingleSourceLlm => "single_source_llm",
            ResolutionMethod::Missing => "missing",
            ResolutionMethod::HigherConfidenceOcr => "higher_confidence_ocr",
            ResolutionMethod::HigherConfidenceLlm => "higher_confidence_llm",
            ResolutionMethod::PreferOcr => "prefer_ocr",
            ResolutionMethod::PreferLlm => "prefer_llm",
            ResolutionMethod::WeightedAverage => "weighted_average",
            ResolutionMethod::FallbackHigherConfidenceOcr => "fallback_higher_confidence_ocr",
            ResolutionMethod::FallbackHigherConfidenceLlm => "fallback_higher_confidence_llm",
            ResolutionMethod::HumanReview => "human_review",
        }
    }
}

impl fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reconciled outcome for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldVerification {
    pub field_name: String,
    pub semantic_type: SemanticType,
    pub required: bool,

    /// Raw values as received; `None` if the source had no value
    pub ocr_value: Option<RawValue>,
    pub llm_value: Option<RawValue>,
    pub ocr_confidence: Option<Confidence>,
    pub llm_confidence: Option<Confidence>,

    pub match_status: MatchStatus,

    /// Relative numeric distance when both numeric values were comparable
    pub distance: Option<f64>,

    /// Value to use downstream
    pub final_value: Option<RawValue>,

    /// Fused confidence (0.0-1.0)
    pub confidence_score: Confidence,

    pub resolution_method: ResolutionMethod,

    /// Explanation for disagreement, single-source or missing values
    pub conflict_reason: Option<String>,

    /// Required field absent from both sources
    pub required_missing: bool,
}

impl FieldVerification {
    /// Final value withheld because the policy deferred to a reviewer
    pub fn deferred_to_review(&self) -> bool {
        self.resolution_method == ResolutionMethod::HumanReview
    }
}

/// Aggregate verification result for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVerification {
    pub document: DocumentRef,
    pub schema_version: u32,

    /// One entry per schema field, in schema declaration order
    pub field_verifications: Vec<FieldVerification>,

    /// Mean fused confidence over considered fields (0.0-1.0)
    pub overall_confidence: f64,

    /// Matches / fields not BOTH_MISSING (0.0-1.0)
    pub match_rate: f64,

    pub needs_human_review: bool,
    pub disposition: Disposition,

    /// Required fields neither source produced
    pub required_missing: Vec<String>,

    /// Conflict policy active for this run
    pub conflict_policy: String,
}

impl DocumentVerification {
    /// Final values by field name, schema order, skipping fields without one
    pub fn final_extraction(&self) -> Vec<(&str, &RawValue)> {
        self.field_verifications
            .iter()
            .filter_map(|fv| fv.final_value.as_ref().map(|v| (fv.field_name.as_str(), v)))
            .collect()
    }

    /// Fields where OCR and LLM disagreed
    pub fn conflicts(&self) -> Vec<&FieldVerification> {
        self.field_verifications
            .iter()
            .filter(|fv| fv.match_status == MatchStatus::Mismatch)
            .collect()
    }

    /// Field names with confidence at or above `threshold` (0.8 is typical)
    pub fn high_confidence_fields(&self, threshold: f64) -> Vec<&str> {
        self.field_verifications
            .iter()
            .filter(|fv| fv.confidence_score >= threshold)
            .map(|fv| fv.field_name.as_str())
            .collect()
    }

    /// Field names with confidence below `threshold` (0.5 is typical)
    pub fn low_confidence_fields(&self, threshold: f64) -> Vec<&str> {
        self.field_verifications
            .iter()
            .filter(|fv| fv.confidence_score < threshold)
            .map(|fv| fv.field_name.as_str())
            .collect()
    }

    pub fn field(&self, name: &str) -> Option<&FieldVerification> {
        self.field_verifications.iter().find(|fv| fv.field_name == name)
    }
}
