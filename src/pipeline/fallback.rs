//! Fallback assembly: the minimal, always-valid document produced when the
//! pipeline fails.
//!
//! Whatever was salvaged by the time of the failure (metadata, a partial
//! canonical result, nothing at all) is rendered into a document the host
//! application can display in place of the conversion it asked for. Pure
//! string building over optional inputs, so this component cannot itself
//! fail.

use crate::output::{CanonicalResult, DocumentMetadata};

/// Shown when the failure left no extracted content behind.
const NO_CONTENT_NOTICE: &str = "*No OCR content available*";

/// Render the fallback document.
pub fn render(
    error: &str,
    metadata: Option<&DocumentMetadata>,
    partial: Option<&CanonicalResult>,
) -> String {
    let mut out = String::from("# OCR Conversion Result\n");

    out.push_str("\n## Error Information\n\n");
    if error.trim().is_empty() {
        out.push_str("Unknown error\n");
    } else {
        out.push_str(error.trim());
        out.push('\n');
    }

    if let Some(meta) = metadata {
        let rows: Vec<(&str, Option<&str>)> = vec![
            ("Title", meta.title.as_deref()),
            ("Author", meta.author.as_deref()),
            ("Subject", meta.subject.as_deref()),
            ("Creator", meta.creator.as_deref()),
            ("Producer", meta.producer.as_deref()),
        ];
        let page_count = meta.page_count.map(|n| n.to_string());

        let mut lines: Vec<String> = rows
            .iter()
            .filter_map(|(label, value)| value.map(|v| format!("- **{label}:** {v}")))
            .collect();
        if let Some(count) = page_count {
            lines.push(format!("- **Pages:** {count}"));
        }

        if !lines.is_empty() {
            out.push_str("\n## Document Information\n\n");
            out.push_str(&lines.join("\n"));
            out.push('\n');
        }
    }

    out.push_str("\n## OCR Result\n\n");
    out.push_str(&salvaged_content(partial));
    out.push('\n');

    out
}

/// Whatever text survived: the document-level raw string first, else the
/// per-page texts, else the no-content notice.
fn salvaged_content(partial: Option<&CanonicalResult>) -> String {
    let Some(result) = partial else {
        return NO_CONTENT_NOTICE.to_string();
    };

    if let Some(raw) = result.raw_text.as_deref().filter(|s| !s.trim().is_empty()) {
        return raw.trim_end().to_string();
    }

    let page_texts: Vec<&str> = result
        .pages
        .iter()
        .map(|p| p.text.as_str())
        .filter(|t| !t.trim().is_empty())
        .collect();
    if page_texts.is_empty() {
        NO_CONTENT_NOTICE.to_string()
    } else {
        page_texts.join("\n\n")
    }
}
