// Field and Document Reconciliation Pipeline
//
// Runs normalize → compare → fuse for every schema field, then hands the
// ordered field results to the aggregator. Pure and deterministic: no clock,
// no randomness, no shared state.

use super::aggregator::{aggregate, RoutingThresholds};
use super::comparator::compare;
use super::confidence::fuse;
use super::normalizer::{normalize_optional, NormalizedValue};
use super::policy::{Candidate, ConflictPolicy};
use super::{DocumentVerification, FieldVerification, MatchStatus};
use crate::types::{
    Confidence, DocumentRef, ExtractionSchema, FieldSpec, RawValue, SourceExtraction,
};
use tracing::{debug, warn};

/// Reconcile every schema field and aggregate into a routed document result
///
/// A `None` extraction means that source was unavailable for the whole run;
/// its fields degrade to the single-source path.
pub fn reconcile_document(
    document: DocumentRef,
    schema: &ExtractionSchema,
    ocr: Option<&SourceExtraction>,
    llm: Option<&SourceExtraction>,
    policy: &ConflictPolicy,
    thresholds: &RoutingThresholds,
) -> DocumentVerification {
    debug!(
        "Reconciling {} fields for {} (OCR: {}, LLM: {})",
        schema.fields.len(),
        document,
        if ocr.is_some() { "available" } else { "unavailable" },
        if llm.is_some() { "available" } else { "unavailable" },
    );

    let field_verifications = schema
        .fields
        .iter()
        .map(|spec| verify_field(spec, ocr, llm, policy))
        .collect();

    aggregate(document, schema, field_verifications, policy, thresholds)
}

/// Verify a single field by comparing both sources' values
pub fn verify_field(
    spec: &FieldSpec,
    ocr: Option<&SourceExtraction>,
    llm: Option<&SourceExtraction>,
    policy: &ConflictPolicy,
) -> FieldVerification {
    let ocr_entry = ocr.and_then(|e| e.value(&spec.name));
    let llm_entry = llm.and_then(|e| e.value(&spec.name));

    let ocr_norm = normalize_optional(ocr_entry.map(|(v, _)| v), spec.semantic_type, &spec.name);
    let llm_norm = normalize_optional(llm_entry.map(|(v, _)| v), spec.semantic_type, &spec.name);

    let comparison = compare(ocr_norm.as_ref(), llm_norm.as_ref(), spec.semantic_type);

    let ocr_candidate = candidate(ocr_entry, ocr_norm.as_ref());
    let llm_candidate = candidate(llm_entry, llm_norm.as_ref());

    let resolution = fuse(
        comparison.status,
        ocr_candidate,
        llm_candidate,
        spec.semantic_type,
        policy,
    );

    let ocr_value = ocr_entry.map(|(v, _)| v.clone());
    let llm_value = llm_entry.map(|(v, _)| v.clone());
    let required_missing = spec.required && comparison.status == MatchStatus::BothMissing;

    let conflict_reason = conflict_reason(
        comparison.status,
        ocr_value.as_ref(),
        llm_value.as_ref(),
        spec,
    );

    match comparison.status {
        MatchStatus::Mismatch => warn!(
            "Field '{}' conflict: OCR={:?} LLM={:?}, resolved by {} (confidence {:.3})",
            spec.name, ocr_value, llm_value, resolution.method, resolution.confidence
        ),
        MatchStatus::BothMissing if required_missing => {
            warn!("Required field '{}' missing from both sources", spec.name)
        }
        _ => debug!(
            "Field '{}': {} via {} (confidence {:.3})",
            spec.name, comparison.status, resolution.method, resolution.confidence
        ),
    }

    FieldVerification {
        field_name: spec.name.clone(),
        semantic_type: spec.semantic_type,
        required: spec.required,
        ocr_value,
        llm_value,
        ocr_confidence: ocr_entry.map(|(_, c)| c),
        llm_confidence: llm_entry.map(|(_, c)| c),
        match_status: comparison.status,
        distance: comparison.distance,
        final_value: resolution.final_value,
        confidence_score: resolution.confidence,
        resolution_method: resolution.method,
        conflict_reason,
        required_missing,
    }
}

/// A source takes part in fusion only when its value normalized
fn candidate<'a>(
    entry: Option<(&'a RawValue, Confidence)>,
    normalized: Option<&'a NormalizedValue>,
) -> Option<Candidate<'a>> {
    match (entry, normalized) {
        (Some((raw, confidence)), Some(normalized)) => Some(Candidate {
            raw,
            normalized,
            confidence,
        }),
        _ => None,
    }
}

fn conflict_reason(
    status: MatchStatus,
    ocr_value: Option<&RawValue>,
    llm_value: Option<&RawValue>,
    spec: &FieldSpec,
) -> Option<String> {
    let unreadable = |value: Option<&RawValue>, source: &str| {
        value.map(|v| {
            format!(
                "{} value '{}' could not be read as {}",
                source, v, spec.semantic_type
            )
        })
    };

    match status {
        MatchStatus::Match => None,
        MatchStatus::Mismatch => Some(format!(
            "OCR extracted '{}', LLM extracted '{}'",
            ocr_value.map(ToString::to_string).unwrap_or_default(),
            llm_value.map(ToString::to_string).unwrap_or_default()
        )),
        MatchStatus::OcrOnly => Some(
            unreadable(llm_value, "LLM")
                .map(|r| format!("{}; only OCR value used", r))
                .unwrap_or_else(|| "Only OCR extracted this field".to_string()),
        ),
        MatchStatus::LlmOnly => Some(
            unreadable(ocr_value, "OCR")
                .map(|r| format!("{}; only LLM value used", r))
                .unwrap_or_else(|| "Only LLM extracted this field".to_string()),
        ),
        MatchStatus::BothMissing => {
            let reasons: Vec<String> = [unreadable(ocr_value, "OCR"), unreadable(llm_value, "LLM")]
                .into_iter()
                .flatten()
                .collect();
            Some(if reasons.is_empty() {
                "Neither OCR nor LLM extracted this field".to_string()
            } else {
                reasons.join("; ")
            })
        }
    }
}
