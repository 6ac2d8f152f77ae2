// Document Aggregator - Document Confidence, Match Rate and Routing
//
// Folds per-field results into overall confidence and match rate, then
// applies the routing thresholds to pick a disposition.

use super::policy::ConflictPolicy;
use super::{Disposition, DocumentVerification, FieldVerification, MatchStatus};
use crate::types::{clamp_confidence, DocumentRef, ExtractionSchema};
use tracing::info;

/// Default overall confidence below which a document needs human review
pub const DEFAULT_HUMAN_REVIEW_THRESHOLD: f64 = 0.6;

/// Default overall confidence at or above which a document is auto-approved
pub const DEFAULT_AUTO_APPROVE_THRESHOLD: f64 = 0.9;

/// Confidence thresholds that route a document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutingThresholds {
    pub human_review: f64,
    pub auto_approve: f64,
}

impl Default for RoutingThresholds {
    fn default() -> Self {
        Self {
            human_review: DEFAULT_HUMAN_REVIEW_THRESHOLD,
            auto_approve: DEFAULT_AUTO_APPROVE_THRESHOLD,
        }
    }
}

/// Aggregate field results into a routed `DocumentVerification`
///
/// Optional fields missing from both sources do not count toward
/// `overall_confidence`; required ones count as 0.0 and force review, as does
/// any field the conflict policy deferred to a reviewer.
pub fn aggregate(
    document: DocumentRef,
    schema: &ExtractionSchema,
    field_verifications: Vec<FieldVerification>,
    policy: &ConflictPolicy,
    thresholds: &RoutingThresholds,
) -> DocumentVerification {
    let overall_confidence = overall_confidence(&field_verifications);
    let match_rate = match_rate(&field_verifications);

    let required_missing: Vec<String> = field_verifications
        .iter()
        .filter(|fv| fv.required_missing)
        .map(|fv| fv.field_name.clone())
        .collect();
    let deferred = field_verifications.iter().filter(|fv| fv.deferred_to_review()).count();
    let forced_review = !required_missing.is_empty() || deferred > 0;

    let needs_human_review = forced_review || overall_confidence < thresholds.human_review;
    let disposition = if forced_review {
        Disposition::HumanReview
    } else if overall_confidence >= thresholds.auto_approve {
        Disposition::AutoApprove
    } else if needs_human_review {
        Disposition::HumanReview
    } else {
        Disposition::SpotCheck
    };

    info!(
        "Document {} verified: disposition={}, confidence={:.3}, match_rate={:.1}%, \
         {} required missing, {} deferred",
        document,
        disposition,
        overall_confidence,
        match_rate * 100.0,
        required_missing.len(),
        deferred
    );

    DocumentVerification {
        document,
        schema_version: schema.version,
        field_verifications,
        overall_confidence,
        match_rate,
        needs_human_review,
        disposition,
        required_missing,
        conflict_policy: policy.name().to_string(),
    }
}

/// Mean confidence over fields considered; 0.0 when none are
pub fn overall_confidence(field_verifications: &[FieldVerification]) -> f64 {
    let considered: Vec<f64> = field_verifications
        .iter()
        .filter(|fv| fv.required || fv.match_status != MatchStatus::BothMissing)
        .map(|fv| fv.confidence_score)
        .collect();

    if considered.is_empty() {
        return 0.0;
    }
    clamp_confidence(considered.iter().sum::<f64>() / considered.len() as f64)
}

/// Matches over comparable (not BOTH_MISSING) fields; 0.0 when none are
pub fn match_rate(field_verifications: &[FieldVerification]) -> f64 {
    let comparable = field_verifications
        .iter()
        .filter(|fv| fv.match_status != MatchStatus::BothMissing)
        .count();
    if comparable == 0 {
        return 0.0;
    }

    let matches = field_verifications
        .iter()
        .filter(|fv| fv.match_status == MatchStatus::Match)
        .count();
    matches as f64 / comparable as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::ResolutionMethod;
    use crate::types::{FieldSpec, RawValue, SemanticType};

    fn field(
        name: &str,
        status: MatchStatus,
        confidence: f64,
        required: bool,
    ) -> FieldVerification {
        let method = match status {
            MatchStatus::Match => ResolutionMethod::Agreement,
            MatchStatus::Mismatch => ResolutionMethod::HigherConfidenceLlm,
            MatchStatus::OcrOnly => ResolutionMethod::SingleSourceOcr,
            MatchStatus::LlmOnly => ResolutionMethod::SingleSourceLlm,
            MatchStatus::BothMissing => ResolutionMethod::Missing,
        };
        FieldVerification {
            field_name: name.to_string(),
            semantic_type: SemanticType::Text,
            required,
            ocr_value: None,
            llm_value: None,
            ocr_confidence: None,
            llm_confidence: None,
            match_status: status,
            distance: None,
            final_value: (status != MatchStatus::BothMissing).then(|| RawValue::from("v")),
            confidence_score: confidence,
            resolution_method: method,
            conflict_reason: None,
            required_missing: required && status == MatchStatus::BothMissing,
        }
    }

    fn schema_for(fields: &[FieldVerification]) -> ExtractionSchema {
        ExtractionSchema::new(
            fields
                .iter()
                .map(|f| FieldSpec::new(f.field_name.clone(), f.semantic_type, f.required))
                .collect(),
        )
    }

    fn run(fields: Vec<FieldVerification>) -> DocumentVerification {
        let schema = schema_for(&fields);
        aggregate(
            DocumentRef::new("doc"),
            &schema,
            fields,
            &ConflictPolicy::default(),
            &RoutingThresholds::default(),
        )
    }

    #[test]
    fn test_spot_check_between_thresholds() {
        let result = run(vec![
            field("merchant_name", MatchStatus::Match, 0.85, true),
            field("total", MatchStatus::Mismatch, 0.9, true),
        ]);
        assert!((result.overall_confidence - 0.875).abs() < 1e-9);
        assert_eq!(result.match_rate, 0.5);
        assert!(!result.needs_human_review);
        assert_eq!(result.disposition, Disposition::SpotCheck);
    }

    #[test]
    fn test_auto_approve_at_threshold() {
        let result = run(vec![
            field("a", MatchStatus::Match, 0.9, true),
            field("b", MatchStatus::Match, 0.9, true),
        ]);
        assert_eq!(result.disposition, Disposition::AutoApprove);
        assert_eq!(result.match_rate, 1.0);
    }

    #[test]
    fn test_human_review_below_threshold() {
        let result = run(vec![field("a", MatchStatus::OcrOnly, 0.4, true)]);
        assert!(result.needs_human_review);
        assert_eq!(result.disposition, Disposition::HumanReview);
    }

    #[test]
    fn test_optional_missing_excluded_from_confidence() {
        let result = run(vec![
            field("a", MatchStatus::Match, 1.0, true),
            field("tip", MatchStatus::BothMissing, 0.0, false),
        ]);
        assert_eq!(result.overall_confidence, 1.0);
        assert_eq!(result.match_rate, 1.0);
        assert_eq!(result.disposition, Disposition::AutoApprove);
    }

    #[test]
    fn test_required_missing_forces_review() {
        let mut fields: Vec<_> = (0..9)
            .map(|i| field(&format!("f{}", i), MatchStatus::Match, 1.0, true))
            .collect();
        fields.push(field("invoice_number", MatchStatus::BothMissing, 0.0, true));

        let result = run(fields);
        assert!((result.overall_confidence - 0.9).abs() < 1e-9);
        assert_eq!(result.required_missing, vec!["invoice_number".to_string()]);
        assert!(result.needs_human_review);
        assert_eq!(result.disposition, Disposition::HumanReview);
    }

    #[test]
    fn test_all_missing_rates_are_zero() {
        let result = run(vec![
            field("a", MatchStatus::BothMissing, 0.0, false),
            field("b", MatchStatus::BothMissing, 0.0, false),
        ]);
        assert_eq!(result.match_rate, 0.0);
        assert_eq!(result.overall_confidence, 0.0);
        assert_eq!(result.disposition, Disposition::HumanReview);
    }

    #[test]
    fn test_deferred_field_forces_review() {
        let mut deferred = field("total", MatchStatus::Mismatch, 0.0, false);
        deferred.final_value = None;
        deferred.resolution_method = ResolutionMethod::HumanReview;
        let mut fields: Vec<_> = (0..20)
            .map(|i| field(&format!("f{}", i), MatchStatus::Match, 1.0, true))
            .collect();
        fields.push(deferred);

        let result = run(fields);
        assert!(result.overall_confidence > 0.9);
        assert_eq!(result.disposition, Disposition::HumanReview);
    }

    #[test]
    fn test_query_helpers() {
        let result = run(vec![
            field("a", MatchStatus::Match, 0.95, true),
            field("b", MatchStatus::Mismatch, 0.6, true),
            field("c", MatchStatus::LlmOnly, 0.3, false),
            field("d", MatchStatus::BothMissing, 0.0, false),
        ]);
        assert_eq!(result.high_confidence_fields(0.8), vec!["a"]);
        assert_eq!(result.low_confidence_fields(0.5), vec!["c", "d"]);
        assert_eq!(result.conflicts().len(), 1);
        assert_eq!(result.conflicts()[0].field_name, "b");
        let names: Vec<_> = result.final_extraction().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(result.field("d").is_some());
        assert!(result.field("zz").is_none());
    }
}
