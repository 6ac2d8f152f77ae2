//! Base types shared by every verification stage
//!
//! Schema description (`ExtractionSchema`, `FieldSpec`), raw extracted values
//! and the per-source view of one document (`SourceExtraction`).

use crate::error::VerifyError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Confidence score (0.0-1.0)
pub type Confidence = f64;

/// Clamp a reported confidence into [0, 1]; NaN becomes 0.0
pub fn clamp_confidence(confidence: Confidence) -> Confidence {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// Logical data kind of a field, governing normalization and comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Text,
    Number,
    Currency,
    Date,
    Boolean,
    Email,
    Phone,
    Address,
}

impl SemanticType {
    /// Number and currency fields compare by magnitude
    pub fn is_numeric(self) -> bool {
        matches!(self, SemanticType::Number | SemanticType::Currency)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SemanticType::Text => "text",
            SemanticType::Number => "number",
            SemanticType::Currency => "currency",
            SemanticType::Date => "date",
            SemanticType::Boolean => "boolean",
            SemanticType::Email => "email",
            SemanticType::Phone => "phone",
            SemanticType::Address => "address",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field of the caller's extraction schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Unique field key (snake_case)
    pub name: String,

    #[serde(rename = "type", alias = "semantic_type", alias = "data_type")]
    pub semantic_type: SemanticType,

    #[serde(default = "default_required")]
    pub required: bool,

    /// Human-readable label, also used as an OCR search label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// What the field represents, passed to the LLM prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Extra OCR search labels (e.g. "Subtotal", "Amount Due")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extraction_hints: Vec<String>,
}

fn default_required() -> bool {
    true
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, semantic_type: SemanticType, required: bool) -> Self {
        Self {
            name: name.into(),
            semantic_type,
            required,
            display_name: None,
            description: None,
            extraction_hints: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.extraction_hints.push(hint.into());
        self
    }

    /// Display name, falling back to the field name with spaces
    pub fn label(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| self.name.replace('_', " "))
    }
}

/// Ordered field schema for one document type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSchema {
    #[serde(default = "default_schema_version")]
    pub version: u32,

    pub fields: Vec<FieldSpec>,
}

fn default_schema_version() -> u32 {
    1
}

impl ExtractionSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            version: default_schema_version(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names must be non-empty and unique
    pub fn validate(&self) -> Result<(), VerifyError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(VerifyError::InvalidSchema(
                    "field name must not be empty".to_string(),
                ));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(VerifyError::InvalidSchema(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
        }
        Ok(())
    }

    /// Human-readable field listing for extraction prompts
    pub fn to_prompt_description(&self) -> String {
        let mut lines = vec!["Extract the following fields from the document:".to_string()];
        for field in &self.fields {
            let required = if field.required { "(required)" } else { "(optional)" };
            let mut line = format!("- {} ({}) {}", field.label(), field.semantic_type, required);
            if let Some(description) = &field.description {
                line.push_str(": ");
                line.push_str(description);
            }
            lines.push(line);
            for hint in &field.extraction_hints {
                lines.push(format!("  • {}", hint));
            }
        }
        lines.join("\n")
    }
}

/// Raw value as received from an extraction source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl RawValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Bool(b) => write!(f, "{}", b),
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

/// Which extraction source a value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Ocr,
    Llm,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Ocr => write!(f, "OCR"),
            Source::Llm => write!(f, "LLM"),
        }
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ocr" => Ok(Source::Ocr),
            "llm" => Ok(Source::Llm),
            other => Err(format!("unknown source '{}' (expected 'ocr' or 'llm')", other)),
        }
    }
}

/// Reference to the document being verified (path or URI)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentRef(String);

impl DocumentRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One source's value and self-reported confidence for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceField {
    #[serde(default)]
    pub value: Option<RawValue>,

    pub confidence: Confidence,
}

/// One source's view of one document
///
/// Built once per source per run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceExtraction {
    source: Source,
    fields: HashMap<String, SourceField>,
}

impl SourceExtraction {
    /// Build an extraction, clamping every confidence into [0, 1]
    pub fn new<I>(source: Source, fields: I) -> Self
    where
        I: IntoIterator<Item = (String, SourceField)>,
    {
        let fields = fields
            .into_iter()
            .map(|(name, field)| {
                (
                    name,
                    SourceField {
                        value: field.value,
                        confidence: clamp_confidence(field.confidence),
                    },
                )
            })
            .collect();
        Self { source, fields }
    }

    /// Extraction with no fields (source answered but found nothing)
    pub fn empty(source: Source) -> Self {
        Self {
            source,
            fields: HashMap::new(),
        }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn get(&self, field_name: &str) -> Option<&SourceField> {
        self.fields.get(field_name)
    }

    /// Present value and its confidence; `None` when the field has no value
    pub fn value(&self, field_name: &str) -> Option<(&RawValue, Confidence)> {
        let field = self.fields.get(field_name)?;
        field.value.as_ref().map(|v| (v, field.confidence))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_confidence() {
        assert_eq!(clamp_confidence(-0.2), 0.0);
        assert_eq!(clamp_confidence(1.7), 1.0);
        assert_eq!(clamp_confidence(f64::NAN), 0.0);
        assert_eq!(clamp_confidence(0.42), 0.42);
    }

    #[test]
    fn test_source_extraction_clamps_confidence() {
        let extraction = SourceExtraction::new(
            Source::Llm,
            vec![(
                "total".to_string(),
                SourceField {
                    value: Some(RawValue::Number(10.0)),
                    confidence: 1.3,
                },
            )],
        );
        assert_eq!(extraction.value("total"), Some((&RawValue::Number(10.0), 1.0)));
    }

    #[test]
    fn test_value_is_none_for_null_field() {
        let extraction = SourceExtraction::new(
            Source::Ocr,
            vec![(
                "date".to_string(),
                SourceField {
                    value: None,
                    confidence: 0.9,
                },
            )],
        );
        assert!(extraction.get("date").is_some());
        assert!(extraction.value("date").is_none());
        assert!(extraction.value("missing").is_none());
    }

    #[test]
    fn test_schema_validate_rejects_duplicates() {
        let schema = ExtractionSchema::new(vec![
            FieldSpec::new("total", SemanticType::Currency, true),
            FieldSpec::new("total", SemanticType::Number, false),
        ]);
        assert!(matches!(schema.validate(), Err(VerifyError::InvalidSchema(_))));
    }

    #[test]
    fn test_schema_deserializes_with_defaults() {
        let schema: ExtractionSchema = serde_json::from_str(
            r#"{"fields": [
                {"name": "merchant_name", "type": "text"},
                {"name": "total", "data_type": "currency", "required": false}
            ]}"#,
        )
        .unwrap();
        assert_eq!(schema.version, 1);
        assert!(schema.fields[0].required);
        assert_eq!(schema.fields[1].semantic_type, SemanticType::Currency);
        assert!(!schema.fields[1].required);
    }

    #[test]
    fn test_prompt_description() {
        let schema = ExtractionSchema::new(vec![
            FieldSpec::new("before_tax_total", SemanticType::Currency, true)
                .with_display_name("Before-Tax Total")
                .with_description("Subtotal before taxes are applied")
                .with_hint("Look for 'Subtotal' label"),
            FieldSpec::new("store_phone", SemanticType::Phone, false),
        ]);
        let description = schema.to_prompt_description();
        let lines: Vec<&str> = description.lines().collect();
        assert!(lines[0].starts_with("Extract the following fields"));
        assert_eq!(
            lines[1],
            "- Before-Tax Total (currency) (required): Subtotal before taxes are applied"
        );
        assert_eq!(lines[2], "  • Look for 'Subtotal' label");
        assert_eq!(lines[3], "- store phone (phone) (optional)");
    }

    #[test]
    fn test_field_description_serde() {
        let field: FieldSpec = serde_json::from_str(
            r#"{"name": "total", "type": "currency",
                "description": "Final total including all taxes"}"#,
        )
        .unwrap();
        assert_eq!(field.description.as_deref(), Some("Final total including all taxes"));

        let bare: FieldSpec =
            serde_json::from_str(r#"{"name": "total", "type": "currency"}"#).unwrap();
        assert!(bare.description.is_none());
        assert!(!serde_json::to_string(&bare).unwrap().contains("description"));
    }

    #[test]
    fn test_raw_value_untagged_serde() {
        let values: Vec<RawValue> = serde_json::from_str(r#"[true, 25.99, "ABC Corp"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                RawValue::Bool(true),
                RawValue::Number(25.99),
                RawValue::Text("ABC Corp".to_string())
            ]
        );
    }
}
