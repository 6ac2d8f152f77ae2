//! OCR layout model and engine boundary
//!
//! The OCR engine itself is an external service. This module only models
//! what it returns (pages of lines with optional confidence and position) and
//! the trait the keyword extractor consumes it through.

pub mod markdown;

use crate::types::DocumentRef;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Line of text from OCR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    pub text: String,

    /// Engine-reported recognition confidence (0.0-1.0)
    #[serde(default)]
    pub confidence: Option<f64>,

    /// Quadrilateral `[x1, y1, x2, y2, x3, y3, x4, y4]` in page pixels
    #[serde(default)]
    pub bounding_box: Option<Vec<f64>>,
}

impl OcrLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
            bounding_box: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Top edge of the bounding box, if known
    pub fn top(&self) -> Option<f64> {
        self.bounding_box.as_ref().and_then(|b| b.get(1).copied())
    }

    fn intersects(&self, x: f64, y: f64, width: f64, height: f64) -> bool {
        let Some(b) = self.bounding_box.as_ref().filter(|b| b.len() >= 8) else {
            return false;
        };
        let xs = [b[0], b[2], b[4], b[6]];
        let ys = [b[1], b[3], b[5], b[7]];
        let x_min = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let x_max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let y_min = ys.iter().copied().fold(f64::INFINITY, f64::min);
        let y_max = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        !(x_max < x || x_min > x + width || y_max < y || y_min > y + height)
    }
}

/// Single page OCR result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrPage {
    pub page_number: u32,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    pub lines: Vec<OcrLine>,
}

impl OcrPage {
    /// All line text on this page, one line per row
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Text of lines whose bounding box intersects the region
    pub fn text_in_region(&self, x: f64, y: f64, width: f64, height: f64) -> String {
        self.lines
            .iter()
            .filter(|l| l.intersects(x, y, width, height))
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Complete OCR result for a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    #[serde(default = "default_model_id")]
    pub model_id: String,
    pub pages: Vec<OcrPage>,
}

fn default_model_id() -> String {
    "prebuilt-layout".to_string()
}

/// A line containing a searched-for query
#[derive(Debug, Clone, PartialEq)]
pub struct TextMatch<'a> {
    pub page_number: u32,
    pub line: &'a OcrLine,
}

impl OcrResult {
    pub fn page(&self, page_number: u32) -> Option<&OcrPage> {
        self.pages.iter().find(|p| p.page_number == page_number)
    }

    /// All text from all pages
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(OcrPage::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn lines(&self) -> impl Iterator<Item = &OcrLine> {
        self.pages.iter().flat_map(|p| p.lines.iter())
    }

    /// Case-insensitive search, one match per containing line
    pub fn search_text(&self, query: &str) -> Vec<TextMatch<'_>> {
        let query = query.to_lowercase();
        self.pages
            .iter()
            .flat_map(|page| {
                page.lines
                    .iter()
                    .filter(|line| line.text.to_lowercase().contains(&query))
                    .map(move |line| TextMatch {
                        page_number: page.page_number,
                        line,
                    })
            })
            .collect()
    }
}

/// External OCR engine boundary
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine identifier (e.g., "azure-layout", "json-file")
    fn engine_id(&self) -> &'static str;

    /// Recognize text in the referenced document
    async fn recognize(&self, document: &DocumentRef) -> Result<OcrResult>;
}

/// OCR engine replaying a previously saved `OcrResult` JSON file
pub struct JsonOcrEngine {
    path: PathBuf,
}

impl JsonOcrEngine {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl OcrEngine for JsonOcrEngine {
    fn engine_id(&self) -> &'static str {
        "json-file"
    }

    async fn recognize(&self, document: &DocumentRef) -> Result<OcrResult> {
        tracing::debug!(
            "Loading OCR layout for {} from {}",
            document,
            self.path.display()
        );
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read OCR result {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Malformed OCR result {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OcrResult {
        OcrResult {
            model_id: "prebuilt-layout".to_string(),
            pages: vec![
                OcrPage {
                    page_number: 1,
                    width: 800.0,
                    height: 1000.0,
                    lines: vec![
                        OcrLine {
                            text: "ABC Corp".to_string(),
                            confidence: Some(0.98),
                            bounding_box: Some(vec![
                                10.0, 10.0, 200.0, 10.0, 200.0, 40.0, 10.0, 40.0,
                            ]),
                        },
                        OcrLine {
                            text: "Total: $25.99".to_string(),
                            confidence: Some(0.91),
                            bounding_box: Some(vec![
                                10.0, 900.0, 300.0, 900.0, 300.0, 930.0, 10.0, 930.0,
                            ]),
                        },
                    ],
                },
                OcrPage {
                    page_number: 2,
                    width: 800.0,
                    height: 1000.0,
                    lines: vec![OcrLine::new("Thank you")],
                },
            ],
        }
    }

    #[test]
    fn test_full_text_and_pages() {
        let result = sample();
        assert_eq!(result.full_text(), "ABC Corp\nTotal: $25.99\nThank you");
        assert_eq!(result.page(2).unwrap().text(), "Thank you");
        assert!(result.page(3).is_none());
    }

    #[test]
    fn test_search_text_case_insensitive() {
        let result = sample();
        let matches = result.search_text("TOTAL");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].page_number, 1);
        assert_eq!(matches[0].line.confidence, Some(0.91));
    }

    #[test]
    fn test_text_in_region() {
        let page = sample().pages.remove(0);
        assert_eq!(page.text_in_region(0.0, 850.0, 800.0, 150.0), "Total: $25.99");
        assert_eq!(page.text_in_region(500.0, 500.0, 10.0, 10.0), "");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let result: OcrResult = serde_json::from_str(
            r#"{"pages": [{"page_number": 1, "lines": [{"text": "Hello"}]}]}"#,
        )
        .unwrap();
        assert_eq!(result.model_id, "prebuilt-layout");
        assert_eq!(result.pages[0].lines[0].confidence, None);
    }
}
