//! Document assembly: canonical model + metadata → the final Markdown
//! document.
//!
//! Layout, in order: title heading, document-metadata table, an "OCR
//! Information" section, then one section per page. Every field access
//! defends with a default (a row is omitted rather than rendered with a
//! placeholder), so assembly is a total function: the same canonical
//! result and options always produce byte-identical output.

use crate::config::ConversionConfig;
use crate::output::{CanonicalResult, DocumentMetadata, Page};

/// Shown in place of a page body when OCR produced nothing for it.
const EMPTY_PAGE_NOTICE: &str = "*No text content was extracted from this page.*";

/// Shown when the canonical model has no pages at all.
const EMPTY_DOCUMENT_NOTICE: &str = "*No page content was extracted from this document.*";

/// Render the final Markdown document.
pub fn assemble(
    metadata: &DocumentMetadata,
    result: &CanonicalResult,
    config: &ConversionConfig,
) -> String {
    let mut out = String::new();

    let title = config
        .title
        .as_deref()
        .or(metadata.title.as_deref())
        .unwrap_or(&config.name);
    out.push_str(&format!("# {title}\n"));

    push_metadata_table(&mut out, metadata);
    push_ocr_info(&mut out, result);

    if result.pages.is_empty() {
        out.push_str(&format!("\n{EMPTY_DOCUMENT_NOTICE}\n"));
        if let Some(raw) = result.raw_text.as_deref().filter(|s| !s.trim().is_empty()) {
            out.push_str("\n## Document Content\n\n");
            out.push_str(raw.trim_end());
            out.push('\n');
        }
        return out;
    }

    for page in &result.pages {
        push_page(&mut out, page);
    }

    out
}

fn push_metadata_table(out: &mut String, metadata: &DocumentMetadata) {
    let page_count = metadata.page_count.map(|n| n.to_string());
    let rows: Vec<(&str, Option<&str>)> = vec![
        ("Author", metadata.author.as_deref()),
        ("Subject", metadata.subject.as_deref()),
        ("Keywords", metadata.keywords.as_deref()),
        ("Creator", metadata.creator.as_deref()),
        ("Producer", metadata.producer.as_deref()),
        ("Created", metadata.created.as_deref()),
        ("Modified", metadata.modified.as_deref()),
        ("Pages", page_count.as_deref()),
    ];

    push_table(out, &rows);
}

fn push_ocr_info(out: &mut String, result: &CanonicalResult) {
    let info = &result.document_info;

    let processing_time = (info.processing_time_seconds > 0.0)
        .then(|| format!("{:.2}s", info.processing_time_seconds));
    let confidence = (info.overall_confidence > 0.0)
        .then(|| format!("{}%", (info.overall_confidence * 100.0).round() as i64));
    let tokens = info.usage.as_ref().map(|u| {
        format!(
            "{} prompt / {} completion / {} total",
            u.prompt_tokens, u.completion_tokens, u.total_tokens
        )
    });

    let model = (info.model != "unknown").then_some(info.model.as_str());
    let language = (info.language != "unknown").then_some(info.language.as_str());

    let rows: Vec<(&str, Option<&str>)> = vec![
        ("Model", model),
        ("Language", language),
        ("Processing Time", processing_time.as_deref()),
        ("Confidence", confidence.as_deref()),
        ("Tokens", tokens.as_deref()),
        ("Error", info.error.as_deref()),
    ];

    if rows.iter().any(|(_, v)| v.is_some()) {
        out.push_str("\n## OCR Information\n");
        push_table(out, &rows);
    }
}

/// Emit a two-column GFM table from the present rows; nothing when every
/// row is absent.
fn push_table(out: &mut String, rows: &[(&str, Option<&str>)]) {
    let present: Vec<(&str, &str)> = rows
        .iter()
        .filter_map(|(label, value)| value.map(|v| (*label, v)))
        .collect();
    if present.is_empty() {
        return;
    }

    out.push_str("\n| Field | Value |\n|---|---|\n");
    for (label, value) in present {
        out.push_str(&format!("| {label} | {value} |\n"));
    }
}

fn push_page(out: &mut String, page: &Page) {
    out.push_str(&format!("\n## Page {}\n", page.page_number));

    if page.confidence > 0.0 {
        out.push_str(&format!(
            "\n> OCR Confidence: {}%\n",
            (page.confidence * 100.0).round() as i64
        ));
    }
    if page.width > 0.0 && page.height > 0.0 {
        out.push_str(&format!(
            "\n> Dimensions: {} × {}\n",
            format_dimension(page.width),
            format_dimension(page.height)
        ));
    }

    out.push('\n');
    if page.text.trim().is_empty() {
        out.push_str(EMPTY_PAGE_NOTICE);
    } else {
        out.push_str(page.text.trim_end());
    }
    out.push('\n');
}

/// Whole dimensions print without a fractional part; others keep one digit.
fn format_dimension(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConversionConfig;
    use crate::output::{DocumentInfo, Usage};

    fn config_named(name: &str) -> ConversionConfig {
        ConversionConfig::builder().name(name).build().unwrap()
    }

    fn page(n: usize, text: &str) -> Page {
        Page {
            page_number: n,
            confidence: 0.0,
            width: 0.0,
            height: 0.0,
            text: text.to_string(),
        }
    }

    #[test]
    fn title_prefers_config_then_metadata_then_name() {
        let result = CanonicalResult::default();

        let mut config = config_named("fallback-name");
        config.title = Some("Config Title".into());
        let meta = DocumentMetadata {
            title: Some("Meta Title".into()),
            ..Default::default()
        };
        assert!(assemble(&meta, &result, &config).starts_with("# Config Title\n"));

        config.title = None;
        assert!(assemble(&meta, &result, &config).starts_with("# Meta Title\n"));

        let empty_meta = DocumentMetadata::default();
        assert!(assemble(&empty_meta, &result, &config).starts_with("# fallback-name\n"));
    }

    #[test]
    fn metadata_rows_are_omitted_when_absent() {
        let meta = DocumentMetadata {
            author: Some("Ada".into()),
            page_count: Some(3),
            ..Default::default()
        };
        let md = assemble(&meta, &CanonicalResult::default(), &config_named("n"));
        assert!(md.contains("| Author | Ada |"));
        assert!(md.contains("| Pages | 3 |"));
        assert!(!md.contains("| Subject |"));
        assert!(!md.contains("| Producer |"));
    }

    #[test]
    fn ocr_info_section_renders_non_default_fields_only() {
        let result = CanonicalResult {
            document_info: DocumentInfo {
                model: "ocr-v2".into(),
                language: "unknown".into(),
                processing_time_seconds: 2.5,
                overall_confidence: 0.876,
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 20,
                    total_tokens: 30,
                }),
                error: None,
            },
            pages: vec![page(1, "text")],
            raw_text: None,
        };
        let md = assemble(
            &DocumentMetadata::default(),
            &result,
            &config_named("doc"),
        );
        assert!(md.contains("## OCR Information"));
        assert!(md.contains("| Model | ocr-v2 |"));
        assert!(!md.contains("| Language |"));
        assert!(md.contains("| Processing Time | 2.50s |"));
        assert!(md.contains("| Confidence | 88% |"));
        assert!(md.contains("| Tokens | 10 prompt / 20 completion / 30 total |"));
    }

    #[test]
    fn all_default_info_omits_the_ocr_section() {
        let result = CanonicalResult {
            pages: vec![page(1, "text")],
            ..Default::default()
        };
        let md = assemble(&DocumentMetadata::default(), &result, &config_named("doc"));
        assert!(!md.contains("## OCR Information"));
    }

    #[test]
    fn page_sections_carry_confidence_and_dimensions() {
        let result = CanonicalResult {
            pages: vec![Page {
                page_number: 2,
                confidence: 0.914,
                width: 612.0,
                height: 792.5,
                text: "Body".into(),
            }],
            ..Default::default()
        };
        let md = assemble(&DocumentMetadata::default(), &result, &config_named("doc"));
        assert!(md.contains("## Page 2"));
        assert!(md.contains("> OCR Confidence: 91%"));
        assert!(md.contains("> Dimensions: 612 × 792.5"));
        assert!(md.contains("\nBody\n"));
    }

    #[test]
    fn empty_page_text_gets_the_notice() {
        let result = CanonicalResult {
            pages: vec![page(1, "   ")],
            ..Default::default()
        };
        let md = assemble(&DocumentMetadata::default(), &result, &config_named("doc"));
        assert!(md.contains(EMPTY_PAGE_NOTICE));
    }

    #[test]
    fn empty_pages_with_raw_text_emit_document_content_section() {
        let result = CanonicalResult {
            raw_text: Some("raw fallback".into()),
            ..Default::default()
        };
        let md = assemble(&DocumentMetadata::default(), &result, &config_named("doc"));
        assert!(md.contains(EMPTY_DOCUMENT_NOTICE));
        assert!(md.contains("## Document Content"));
        assert!(md.contains("raw fallback"));
    }

    #[test]
    fn empty_pages_without_raw_text_only_notice() {
        let md = assemble(
            &DocumentMetadata::default(),
            &CanonicalResult::default(),
            &config_named("doc"),
        );
        assert!(md.contains(EMPTY_DOCUMENT_NOTICE));
        assert!(!md.contains("## Document Content"));
    }

    #[test]
    fn assembly_is_idempotent() {
        let meta = DocumentMetadata {
            title: Some("T".into()),
            author: Some("A".into()),
            ..Default::default()
        };
        let result = CanonicalResult {
            document_info: DocumentInfo {
                model: "m".into(),
                overall_confidence: 0.5,
                ..Default::default()
            },
            pages: vec![page(1, "one"), page(2, "two")],
            raw_text: None,
        };
        let config = config_named("doc");
        assert_eq!(
            assemble(&meta, &result, &config),
            assemble(&meta, &result, &config)
        );
    }

    #[test]
    fn pages_appear_in_model_order() {
        let result = CanonicalResult {
            pages: vec![page(1, "first"), page(2, "second"), page(3, "third")],
            ..Default::default()
        };
        let md = assemble(&DocumentMetadata::default(), &result, &config_named("doc"));
        let p1 = md.find("## Page 1").unwrap();
        let p2 = md.find("## Page 2").unwrap();
        let p3 = md.find("## Page 3").unwrap();
        assert!(p1 < p2 && p2 < p3);
        assert!(md.find("first").unwrap() > p1);
        assert!(md.find("first").unwrap() < p2, "page text sits under its own heading");
    }
}
