//! Output and canonical-model types.
//!
//! [`CanonicalResult`] is the sole contract between the remote orchestrator
//! and the assemblers: whatever shape the OCR provider returned, by the time
//! normalization completes every page holds final rendered Markdown and the
//! document-level info carries defaults for anything the provider omitted.
//! Nothing here outlives a single `convert` call.

use serde::{Deserialize, Serialize};

/// Token accounting reported by the OCR provider, passed through as-is.
///
/// Providers disagree on key casing; both `promptTokens` and
/// `prompt_tokens` deserialize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(alias = "promptTokens", default)]
    pub prompt_tokens: u64,
    #[serde(alias = "completionTokens", default)]
    pub completion_tokens: u64,
    #[serde(alias = "totalTokens", default)]
    pub total_tokens: u64,
}

/// Document-level information extracted from the OCR response.
///
/// Always present in the canonical model; fields default to `"unknown"` / `0`
/// when the provider omits them. Immutable after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub model: String,
    pub language: String,
    pub processing_time_seconds: f64,
    /// Overall recognition confidence in `0..=1`.
    pub overall_confidence: f64,
    pub usage: Option<Usage>,
    /// Set when normalization degraded to a best-effort partial result.
    pub error: Option<String>,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            model: "unknown".to_string(),
            language: "unknown".to_string(),
            processing_time_seconds: 0.0,
            overall_confidence: 0.0,
            usage: None,
            error: None,
        }
    }
}

/// One normalized page.
///
/// `text` is the final rendered Markdown for the page; no unrendered block
/// objects survive normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based; defaults to array index + 1 when the provider omits it.
    pub page_number: usize,
    /// Recognition confidence in `0..=1`, 0 when unreported.
    pub confidence: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
}

/// The normalized OCR result — the contract between the orchestrator and
/// the assemblers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalResult {
    pub document_info: DocumentInfo,
    pub pages: Vec<Page>,
    /// A document-level `text`/`content` string that could not be split into
    /// pages. Only populated when `pages` is empty, so the assembler can
    /// still preserve the extracted content.
    pub raw_text: Option<String>,
}

/// Document metadata from the opaque extractor collaborator.
///
/// Every field is optional; the assembler omits table rows for absent
/// fields rather than printing placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
    pub page_count: Option<usize>,
}

/// The result of a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The assembled Markdown document. Always non-empty.
    pub markdown: String,
    /// Document-level OCR information (model, confidence, usage).
    pub info: DocumentInfo,
    /// Number of pages in the canonical model after `max_pages` truncation.
    pub page_count: usize,
}
