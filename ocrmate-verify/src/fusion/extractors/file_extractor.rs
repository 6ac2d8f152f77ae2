// JSON File Extractor
//
// Replays a saved extraction from disk:
// {"fields": {"total": {"value": 25.99, "confidence": 0.7}, ...}}

use super::Extractor;
use crate::error::{VerifyError, VerifyResult};
use crate::types::{DocumentRef, ExtractionSchema, Source, SourceExtraction, SourceField};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ExtractionFile {
    fields: HashMap<String, SourceField>,
}

pub struct JsonFileExtractor {
    source: Source,
    path: PathBuf,
}

impl JsonFileExtractor {
    pub fn new(source: Source, path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            path: path.into(),
        }
    }
}

/// Parse the JSON extraction format for one source
pub fn parse_extraction(source: Source, json: &str) -> VerifyResult<SourceExtraction> {
    let file: ExtractionFile = serde_json::from_str(json).map_err(|e| {
        VerifyError::source_unavailable(source, format!("malformed extraction: {}", e))
    })?;
    Ok(SourceExtraction::new(source, file.fields))
}

#[async_trait]
impl Extractor for JsonFileExtractor {
    fn source(&self) -> Source {
        self.source
    }

    async fn extract(
        &self,
        document: &DocumentRef,
        schema: &ExtractionSchema,
    ) -> VerifyResult<SourceExtraction> {
        debug!(
            "Loading {} extraction for {} from {}",
            self.source,
            document,
            self.path.display()
        );

        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            VerifyError::source_unavailable(
                self.source,
                format!("cannot read {}: {}", self.path.display(), e),
            )
        })?;
        let extraction = parse_extraction(self.source, &content)?;

        let unknown = extraction_fields_outside_schema(&extraction, schema);
        if unknown > 0 {
            warn!(
                "{} extraction has {} field(s) not in the schema; they are ignored",
                self.source, unknown
            );
        }
        Ok(extraction)
    }

    fn is_available(&self) -> bool {
        self.path.exists()
    }
}

fn extraction_fields_outside_schema(
    extraction: &SourceExtraction,
    schema: &ExtractionSchema,
) -> usize {
    let in_schema = schema
        .fields
        .iter()
        .filter(|f| extraction.get(&f.name).is_some())
        .count();
    extraction.len().saturating_sub(in_schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldSpec, RawValue, SemanticType};
    use std::io::Write;

    #[test]
    fn test_parse_extraction() {
        let extraction = parse_extraction(
            Source::Ocr,
            r#"{"fields": {
                "merchant_name": {"value": "ABC Corp", "confidence": 0.7},
                "total": {"value": 25.99, "confidence": 0.7},
                "date": {"value": null, "confidence": 0.2},
                "tip": {"confidence": 0.1}
            }}"#,
        )
        .unwrap();
        assert_eq!(extraction.len(), 4);
        assert_eq!(
            extraction.value("merchant_name"),
            Some((&RawValue::from("ABC Corp"), 0.7))
        );
        assert!(extraction.value("date").is_none());
        assert!(extraction.value("tip").is_none());
    }

    #[test]
    fn test_malformed_json_is_source_unavailable() {
        let err = parse_extraction(Source::Llm, "{not json").unwrap_err();
        assert!(matches!(
            err,
            VerifyError::SourceUnavailable { extractor: Source::Llm, .. }
        ));
    }

    #[tokio::test]
    async fn test_extract_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"fields": {{
                "total": {{"value": "$10.00", "confidence": 0.8}},
                "extra": {{"value": 1, "confidence": 0.5}}
            }}}}"#
        )
        .unwrap();

        let extractor = JsonFileExtractor::new(Source::Llm, file.path());
        assert!(extractor.is_available());
        let schema =
            ExtractionSchema::new(vec![FieldSpec::new("total", SemanticType::Currency, true)]);
        let extraction = extractor.extract(&DocumentRef::new("r.png"), &schema).await.unwrap();
        assert_eq!(extraction.source(), Source::Llm);
        assert_eq!(extraction.value("total"), Some((&RawValue::from("$10.00"), 0.8)));
        assert_eq!(extraction_fields_outside_schema(&extraction, &schema), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_source_unavailable() {
        let extractor = JsonFileExtractor::new(Source::Ocr, "/nonexistent/ocr.json");
        assert!(!extractor.is_available());
        let err = extractor
            .extract(&DocumentRef::new("r.png"), &ExtractionSchema::new(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::SourceUnavailable { extractor: Source::Ocr, .. }));
    }
}
