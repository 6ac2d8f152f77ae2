//! Render OCR results as text or markdown
//!
//! Plain functions with no shared state. Callers pick one and inject it
//! wherever OCR text is needed (see `OcrKeywordExtractor`).

use super::{OcrPage, OcrResult};

/// Renders an OCR result into text
pub type OcrFormatter = fn(&OcrResult) -> String;

/// Vertical gap (pixels) above which a blank line is inserted
const PARAGRAPH_GAP: f64 = 50.0;

/// Longest line still considered a possible header
const MAX_HEADER_LEN: usize = 50;

/// Just the text, with page headings only for multi-page documents
pub fn format_compact(result: &OcrResult) -> String {
    let multi_page = result.pages.len() > 1;
    result
        .pages
        .iter()
        .map(|page| {
            if multi_page {
                format!("## Page {}\n\n{}", page.page_number, page.text())
            } else {
                page.text()
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Full markdown with document header and layout-preserving spacing
pub fn format_markdown(result: &OcrResult) -> String {
    let mut parts = vec![
        "# Document OCR Text\n".to_string(),
        format!("*Extracted using {}*\n", result.model_id),
    ];
    for page in &result.pages {
        parts.push(format!("\n## Page {}", page.page_number));
        parts.push(format_with_spacing(page));
    }
    parts.join("\n")
}

/// Markdown with detected headers, key-value pairs and list items
pub fn format_structured(result: &OcrResult) -> String {
    let multi_page = result.pages.len() > 1;
    result
        .pages
        .iter()
        .map(|page| {
            let body = detect_structure(page);
            if multi_page {
                format!("## Page {}\n\n{}", page.page_number, body)
            } else {
                body
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_with_spacing(page: &OcrPage) -> String {
    let mut lines = Vec::with_capacity(page.lines.len());
    let mut prev_top: Option<f64> = None;

    for line in &page.lines {
        if let Some(top) = line.top() {
            if let Some(prev) = prev_top {
                if top - prev > PARAGRAPH_GAP {
                    lines.push(String::new());
                }
            }
            prev_top = Some(top);
        }
        lines.push(line.text.clone());
    }
    lines.join("\n")
}

fn detect_structure(page: &OcrPage) -> String {
    page.lines
        .iter()
        .filter_map(|line| {
            let text = line.text.trim();
            if text.is_empty() {
                return None;
            }
            Some(if let Some((key, value)) = text.split_once(':').filter(|_| !text.ends_with(':')) {
                format!("**{}**: {}", key.trim(), value.trim())
            } else if is_header(text) {
                format!("### {}\n", text)
            } else if is_list_item(text) {
                format!("- {}", text.trim_start_matches(['•', '-', '*', '·']).trim())
            } else {
                text.to_string()
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_header(text: &str) -> bool {
    if text.chars().count() >= MAX_HEADER_LEN {
        return false;
    }
    let has_letters = text.chars().any(char::is_alphabetic);
    let all_caps = has_letters && !text.chars().any(char::is_lowercase);
    all_caps || is_title_case(text)
}

fn is_title_case(text: &str) -> bool {
    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .collect();
    !words.is_empty()
        && words.iter().all(|w| {
            let mut chars = w.chars();
            chars.next().is_some_and(char::is_uppercase) && chars.all(char::is_lowercase)
        })
}

fn is_list_item(text: &str) -> bool {
    if text.starts_with(['•', '-', '*', '·']) {
        return true;
    }
    let mut chars = text.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(d), Some(p), Some(_)) => d.is_ascii_digit() && (p == '.' || p == ')'),
        _ => false,
    }
}
