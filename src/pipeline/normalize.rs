//! Response normalization: provider JSON → [`CanonicalResult`].
//!
//! The OCR provider's response contract is weakly specified: four distinct
//! shapes have been observed in production, and within a page the text can
//! arrive as typed blocks, flat elements, or a bare string. Rather than
//! chase fields ad hoc, the observed shapes are written down as serde
//! variants and tried in a fixed order; whatever survives is rendered into
//! the canonical per-page model here, so everything downstream sees one
//! contract.
//!
//! ## Failure semantics
//!
//! `normalize` is infallible. When the typed parse fails, the raw value is
//! logged (truncated) and scavenged for whatever page arrays or string
//! fields are present; the parse error is recorded in
//! `document_info.error`. Callers always receive a `CanonicalResult`,
//! possibly with empty pages and the error field set.

use crate::output::{CanonicalResult, DocumentInfo, Page, Usage};
use crate::pipeline::render;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Document-level fields shared by every response shape.
#[derive(Debug, Deserialize)]
struct RawInfo {
    model: Option<String>,
    language: Option<String>,
    #[serde(alias = "processingTime")]
    processing_time: Option<f64>,
    confidence: Option<f64>,
    usage: Option<Usage>,
}

/// The four observed response shapes, tried in order (first match wins):
/// a `pages` array, a `data` array, a document-level `content` string, a
/// document-level `text` string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawResponse {
    Paged {
        pages: Vec<RawPage>,
        text: Option<String>,
        content: Option<String>,
        #[serde(flatten)]
        info: RawInfo,
    },
    Data {
        data: Vec<RawPage>,
        text: Option<String>,
        content: Option<String>,
        #[serde(flatten)]
        info: RawInfo,
    },
    Content {
        content: String,
        #[serde(flatten)]
        info: RawInfo,
    },
    Text {
        text: String,
        #[serde(flatten)]
        info: RawInfo,
    },
}

#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(alias = "pageNumber")]
    page_number: Option<usize>,
    confidence: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    dimensions: Option<RawDimensions>,
    blocks: Option<Vec<Value>>,
    elements: Option<Vec<RawElement>>,
    content: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDimensions {
    width: Option<f64>,
    height: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawElement {
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<String>,
    content: Option<String>,
}

/// Normalize a raw OCR response into the canonical model. Never fails.
pub fn normalize(raw: &Value) -> CanonicalResult {
    // Some gateways return the document text as a bare JSON string.
    if let Value::String(text) = raw {
        return CanonicalResult {
            document_info: DocumentInfo::default(),
            pages: vec![synthesized_page(text.clone(), 0.0)],
            raw_text: None,
        };
    }

    match serde_json::from_value::<RawResponse>(raw.clone()) {
        Ok(shape) => canonicalize(shape),
        Err(err) => {
            warn!(
                "OCR response did not match any known shape ({err}); raw: {}",
                truncate(&raw.to_string(), 512)
            );
            degrade(raw, &err.to_string())
        }
    }
}

fn canonicalize(shape: RawResponse) -> CanonicalResult {
    match shape {
        RawResponse::Paged {
            pages,
            text,
            content,
            info,
        }
        | RawResponse::Data {
            data: pages,
            text,
            content,
            info,
        } => {
            let raw_text = if pages.is_empty() {
                text.or(content).filter(|s| !s.trim().is_empty())
            } else {
                None
            };
            CanonicalResult {
                document_info: document_info(info),
                pages: pages
                    .iter()
                    .enumerate()
                    .map(|(index, page)| normalize_page(page, index))
                    .collect(),
                raw_text,
            }
        }
        RawResponse::Content { content, info } => {
            let confidence = info.confidence.unwrap_or(0.0);
            CanonicalResult {
                document_info: document_info(info),
                pages: vec![synthesized_page(content, confidence)],
                raw_text: None,
            }
        }
        RawResponse::Text { text, info } => {
            let confidence = info.confidence.unwrap_or(0.0);
            CanonicalResult {
                document_info: document_info(info),
                pages: vec![synthesized_page(text, confidence)],
                raw_text: None,
            }
        }
    }
}

fn document_info(info: RawInfo) -> DocumentInfo {
    DocumentInfo {
        model: info.model.unwrap_or_else(|| "unknown".to_string()),
        language: info.language.unwrap_or_else(|| "unknown".to_string()),
        processing_time_seconds: info.processing_time.unwrap_or(0.0),
        overall_confidence: info.confidence.unwrap_or(0.0),
        usage: info.usage,
        error: None,
    }
}

fn normalize_page(page: &RawPage, index: usize) -> Page {
    Page {
        page_number: page.page_number.unwrap_or(index + 1),
        confidence: page.confidence.unwrap_or(0.0),
        width: page
            .width
            .or_else(|| page.dimensions.as_ref().and_then(|d| d.width))
            .unwrap_or(0.0),
        height: page
            .height
            .or_else(|| page.dimensions.as_ref().and_then(|d| d.height))
            .unwrap_or(0.0),
        text: page_text(page),
    }
}

/// Per-page text resolution, in precedence order: rendered blocks, flat
/// elements, a `content` string, a `text` string, empty.
fn page_text(page: &RawPage) -> String {
    if let Some(blocks) = &page.blocks {
        return render::render_blocks(blocks);
    }
    if let Some(elements) = &page.elements {
        return elements
            .iter()
            .map(element_text)
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
    }
    if let Some(content) = &page.content {
        return content.clone();
    }
    page.text.clone().unwrap_or_default()
}

fn element_text(element: &RawElement) -> String {
    if element.kind.as_deref() == Some("text") {
        element.text.clone().unwrap_or_default()
    } else {
        element.content.clone().unwrap_or_default()
    }
}

fn synthesized_page(text: String, confidence: f64) -> Page {
    Page {
        page_number: 1,
        confidence,
        width: 0.0,
        height: 0.0,
        text,
    }
}

/// Best-effort partial result for a response no known shape matched:
/// scavenge page arrays and string fields with minimal per-page fields and
/// record the causing error.
fn degrade(raw: &Value, error: &str) -> CanonicalResult {
    let pages: Vec<Page> = raw
        .get("pages")
        .or_else(|| raw.get("data"))
        .and_then(Value::as_array)
        .map(|array| {
            array
                .iter()
                .enumerate()
                .map(|(index, page)| Page {
                    page_number: page
                        .get("page_number")
                        .or_else(|| page.get("pageNumber"))
                        .and_then(Value::as_u64)
                        .map(|n| n as usize)
                        .unwrap_or(index + 1),
                    confidence: page
                        .get("confidence")
                        .and_then(Value::as_f64)
                        .unwrap_or(0.0),
                    width: 0.0,
                    height: 0.0,
                    text: page
                        .get("text")
                        .or_else(|| page.get("content"))
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    let raw_text = if pages.is_empty() {
        raw.get("text")
            .or_else(|| raw.get("content"))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    } else {
        None
    };

    CanonicalResult {
        document_info: DocumentInfo {
            error: Some(error.to_string()),
            ..DocumentInfo::default()
        },
        pages,
        raw_text,
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn all_four_shapes_yield_one_hello_page() {
        for raw in [
            json!({"content": "hello"}),
            json!({"text": "hello"}),
            json!({"pages": [{"text": "hello"}]}),
            json!({"data": [{"text": "hello"}]}),
        ] {
            let result = normalize(&raw);
            assert_eq!(result.pages.len(), 1, "shape: {raw}");
            assert_eq!(result.pages[0].text, "hello", "shape: {raw}");
            assert_eq!(result.pages[0].page_number, 1, "shape: {raw}");
        }
    }

    #[test]
    fn bare_string_response_becomes_single_page() {
        let result = normalize(&json!("just text"));
        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.pages[0].text, "just text");
    }

    #[test]
    fn pages_shape_wins_over_string_fields() {
        let result = normalize(&json!({
            "pages": [{"text": "from pages"}],
            "text": "from text"
        }));
        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.pages[0].text, "from pages");
        assert!(result.raw_text.is_none());
    }

    #[test]
    fn empty_pages_preserve_document_level_text() {
        let result = normalize(&json!({"pages": [], "text": "raw fallback"}));
        assert!(result.pages.is_empty());
        assert_eq!(result.raw_text.as_deref(), Some("raw fallback"));
    }

    #[test]
    fn document_info_defaults_when_fields_absent() {
        let info = normalize(&json!({"pages": []})).document_info;
        assert_eq!(info.model, "unknown");
        assert_eq!(info.language, "unknown");
        assert_eq!(info.processing_time_seconds, 0.0);
        assert_eq!(info.overall_confidence, 0.0);
        assert!(info.usage.is_none());
    }

    #[test]
    fn document_info_reads_provider_fields() {
        let info = normalize(&json!({
            "model": "ocr-v2",
            "language": "en",
            "processingTime": 1.5,
            "confidence": 0.93,
            "usage": {"promptTokens": 100, "completionTokens": 50, "totalTokens": 150},
            "pages": []
        }))
        .document_info;
        assert_eq!(info.model, "ocr-v2");
        assert_eq!(info.language, "en");
        assert_eq!(info.processing_time_seconds, 1.5);
        assert_eq!(info.overall_confidence, 0.93);
        assert_eq!(info.usage.unwrap().total_tokens, 150);
    }

    #[test]
    fn page_numbers_default_to_index_plus_one() {
        let result = normalize(&json!({"pages": [{"text": "a"}, {"text": "b"}]}));
        assert_eq!(result.pages[0].page_number, 1);
        assert_eq!(result.pages[1].page_number, 2);
    }

    #[test]
    fn explicit_page_numbers_survive_in_both_casings() {
        let result = normalize(&json!({
            "pages": [{"page_number": 4, "text": "a"}, {"pageNumber": 9, "text": "b"}]
        }));
        assert_eq!(result.pages[0].page_number, 4);
        assert_eq!(result.pages[1].page_number, 9);
    }

    #[test]
    fn blocks_take_precedence_and_render() {
        let result = normalize(&json!({
            "pages": [{
                "blocks": [
                    {"type": "heading", "level": 1, "text": "Title"},
                    {"type": "paragraph", "text": "Body"}
                ],
                "text": "ignored"
            }]
        }));
        assert_eq!(result.pages[0].text, "# Title\n\nBody");
    }

    #[test]
    fn elements_map_text_and_content_by_kind() {
        let result = normalize(&json!({
            "pages": [{
                "elements": [
                    {"type": "text", "text": "first"},
                    {"type": "table", "content": "second"},
                    {"type": "text"}
                ]
            }]
        }));
        assert_eq!(result.pages[0].text, "first\n\nsecond");
    }

    #[test]
    fn page_content_string_beats_text_string() {
        let result = normalize(&json!({
            "pages": [{"content": "from content", "text": "from text"}]
        }));
        assert_eq!(result.pages[0].text, "from content");
    }

    #[test]
    fn dimensions_resolve_nested_or_flat() {
        let result = normalize(&json!({
            "pages": [
                {"text": "a", "width": 612.0, "height": 792.0},
                {"text": "b", "dimensions": {"width": 595.0, "height": 842.0}},
                {"text": "c"}
            ]
        }));
        assert_eq!(result.pages[0].width, 612.0);
        assert_eq!(result.pages[1].height, 842.0);
        assert_eq!(result.pages[2].width, 0.0);
    }

    #[test]
    fn unmatched_shape_degrades_with_error_set() {
        let result = normalize(&json!({"pages": 42}));
        assert!(result.pages.is_empty());
        assert!(result.document_info.error.is_some());
    }

    #[test]
    fn degraded_pass_scavenges_page_text() {
        // The second page's non-string text breaks the typed parse for the
        // whole array; the degraded pass still recovers what it can.
        let result = normalize(&json!({
            "pages": [{"text": "ok", "confidence": 0.5}, {"text": 123}]
        }));
        assert!(result.document_info.error.is_some());
        assert_eq!(result.pages.len(), 2);
        assert_eq!(result.pages[0].text, "ok");
        assert_eq!(result.pages[0].confidence, 0.5);
        assert_eq!(result.pages[1].text, "");
    }

    #[test]
    fn degraded_pass_scavenges_document_text() {
        // The string-typed confidence breaks every variant's flattened info,
        // so no shape matches; the degraded pass still keeps the text.
        let result = normalize(&json!({
            "pages": "bogus",
            "text": "salvaged",
            "confidence": "high"
        }));
        assert!(result.document_info.error.is_some());
        assert!(result.pages.is_empty());
        assert_eq!(result.raw_text.as_deref(), Some("salvaged"));
    }

    #[test]
    fn no_shape_and_nothing_to_scavenge_yields_empty_result() {
        let result = normalize(&json!({"status": "queued"}));
        assert!(result.pages.is_empty());
        assert!(result.raw_text.is_none());
        assert!(result.document_info.error.is_some());
    }
}
