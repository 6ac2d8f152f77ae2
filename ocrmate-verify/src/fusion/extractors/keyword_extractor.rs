// OCR Keyword Extractor
//
// Finds field values in OCR text by label: for each schema field, the first
// line matching one of its labels yields the rest of that line.

use super::Extractor;
use crate::error::{VerifyError, VerifyResult};
use crate::fusion::normalizer::{parse_number, FALSE_WORDS, TRUE_WORDS};
use crate::ocr::markdown::{format_compact, OcrFormatter};
use crate::ocr::{OcrEngine, OcrResult};
use crate::types::{
    Confidence, DocumentRef, ExtractionSchema, FieldSpec, RawValue, SemanticType, Source,
    SourceExtraction, SourceField,
};
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Confidence given to OCR values when the engine reports none per line
pub const OCR_DEFAULT_CONFIDENCE: Confidence = 0.7;

/// Separators skipped between a label and its value, then the value itself
const SEPARATORS_THEN_VALUE: &str = r"[:*\s-]*([^:*\s-].*)";

pub struct OcrKeywordExtractor {
    engine: Arc<dyn OcrEngine>,
    formatter: OcrFormatter,
}

impl OcrKeywordExtractor {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            engine,
            formatter: format_compact,
        }
    }

    /// Search a different rendering of the OCR result
    pub fn with_formatter(mut self, formatter: OcrFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Locate every schema field in an already-recognized OCR result
    pub fn extract_from(&self, ocr: &OcrResult, schema: &ExtractionSchema) -> SourceExtraction {
        let text = (self.formatter)(ocr);
        let fields = schema.fields.iter().filter_map(|field| {
            let patterns = label_patterns(field);
            let (value_text, pattern) = find_field(&text, &patterns)?;
            let confidence =
                line_confidence(ocr, pattern, value_text).unwrap_or(OCR_DEFAULT_CONFIDENCE);
            debug!(
                "OCR label match for {}: '{}' (confidence {:.2})",
                field.name, value_text, confidence
            );
            Some((
                field.name.clone(),
                SourceField {
                    value: Some(convert_value(value_text, field.semantic_type)),
                    confidence,
                },
            ))
        });
        SourceExtraction::new(Source::Ocr, fields.collect::<Vec<_>>())
    }
}

#[async_trait]
impl Extractor for OcrKeywordExtractor {
    fn source(&self) -> Source {
        Source::Ocr
    }

    async fn extract(
        &self,
        document: &DocumentRef,
        schema: &ExtractionSchema,
    ) -> VerifyResult<SourceExtraction> {
        let ocr = self
            .engine
            .recognize(document)
            .await
            .map_err(|e| VerifyError::source_unavailable(Source::Ocr, format!("{:#}", e)))?;

        let extraction = self.extract_from(&ocr, schema);
        info!(
            "OCR engine {} located {}/{} fields in {}",
            self.engine.engine_id(),
            extraction.len(),
            schema.fields.len(),
            document
        );
        Ok(extraction)
    }
}

/// Labels to search for, in priority order
fn labels(field: &FieldSpec) -> Vec<String> {
    let mut labels = vec![field.name.replace('_', " ")];
    if let Some(display_name) = &field.display_name {
        labels.push(display_name.clone());
    }
    for hint in &field.extraction_hints {
        // "Look for 'Subtotal' label" searches for Subtotal
        let quoted: Vec<&str> = hint.split('\'').skip(1).step_by(2).collect();
        if quoted.is_empty() {
            labels.push(hint.clone());
        } else {
            labels.extend(quoted.iter().map(|q| q.to_string()));
        }
    }
    labels.retain(|l| !l.trim().is_empty());
    labels
}

fn label_patterns(field: &FieldSpec) -> Vec<Regex> {
    labels(field)
        .iter()
        .filter_map(|label| match label_regex(label.trim()) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Skipping label '{}' for {}: {}", label, field.name, e);
                None
            }
        })
        .collect()
}

/// Case-insensitive `label [separators] value` pattern
///
/// Word boundaries are only required on label ends that are word characters,
/// so labels like "Total $" still match.
fn label_regex(label: &str) -> Result<Regex, regex::Error> {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let before = if label.starts_with(is_word) { r"\b" } else { "" };
    let after = if label.ends_with(is_word) { r"\b" } else { "" };
    let pattern = format!(
        "{}{}{}{}",
        before,
        regex::escape(label),
        after,
        SEPARATORS_THEN_VALUE
    );
    RegexBuilder::new(&pattern).case_insensitive(true).build()
}

/// Value text following the label in one line
fn find_value<'t>(line: &'t str, pattern: &Regex) -> Option<&'t str> {
    let value = pattern.captures(line)?.get(1)?.as_str().trim();
    (!value.is_empty()).then_some(value)
}

/// Value text and the pattern that found it
fn find_field<'t, 'p>(text: &'t str, patterns: &'p [Regex]) -> Option<(&'t str, &'p Regex)> {
    patterns.iter().find_map(|pattern| {
        text.lines()
            .find_map(|line| find_value(line, pattern))
            .map(|value| (value, pattern))
    })
}

/// Confidence of the OCR line that yields the same value under the same label
fn line_confidence(ocr: &OcrResult, pattern: &Regex, value: &str) -> Option<Confidence> {
    ocr.lines()
        .find(|line| find_value(&line.text, pattern) == Some(value))
        .and_then(|line| line.confidence)
}

/// Type a scraped OCR string before reconciliation
pub fn convert_value(text: &str, semantic_type: SemanticType) -> RawValue {
    match semantic_type {
        SemanticType::Number | SemanticType::Currency => parse_number(text)
            .map(RawValue::Number)
            .unwrap_or_else(|| RawValue::from(text)),
        SemanticType::Boolean => {
            let lower = text.trim().to_lowercase();
            if TRUE_WORDS.contains(&lower.as_str()) {
                RawValue::Bool(true)
            } else if FALSE_WORDS.contains(&lower.as_str()) {
                RawValue::Bool(false)
            } else {
                RawValue::from(text)
            }
        }
        _ => RawValue::from(text),
    }
}
