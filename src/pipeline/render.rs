//! Block rendering: one typed content block → one Markdown fragment.
//!
//! The OCR provider's block layer is the least reliable part of its
//! response: block objects arrive with unknown `type` tags, missing fields,
//! or as bare strings. Blocks therefore stay as [`serde_json::Value`] until
//! this module interprets them through [`ContentBlock::from_value`], a total
//! classification into a tagged union, and renders the result.
//!
//! Failure is isolated at the single-block granularity:
//! [`render_block`] returns `Result<String, RenderError>` and
//! [`render_blocks`] unwraps every `Err` to an empty fragment, so one
//! malformed block never invalidates its page.

use crate::error::RenderError;
use serde_json::Value;

/// A typed unit of structured page content.
///
/// Transient: constructed from the provider's JSON during normalization,
/// rendered immediately, never stored in the canonical model.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Heading { level: i64, text: String },
    Paragraph { text: String },
    List { ordered: bool, items: Vec<String> },
    Table { rows: Vec<Vec<String>> },
    Image { caption: String, source: String },
    Code { language: String, code: String },
    Quote { text: String },
    /// A bare string, a block with `text` but no `type`, or an
    /// unrecognized `type`; rendered verbatim.
    Plain { text: String },
}

impl ContentBlock {
    /// Classify a raw JSON value as a content block.
    ///
    /// Objects and strings always classify (unrecognized types fall back to
    /// [`ContentBlock::Plain`]); any other JSON kind is a `RenderError`.
    pub fn from_value(value: &Value) -> Result<ContentBlock, RenderError> {
        let obj = match value {
            Value::String(s) => return Ok(ContentBlock::Plain { text: s.clone() }),
            Value::Object(obj) => obj,
            Value::Null => return Err(RenderError::UnsupportedShape { found: "null" }),
            Value::Bool(_) => return Err(RenderError::UnsupportedShape { found: "a boolean" }),
            Value::Number(_) => return Err(RenderError::UnsupportedShape { found: "a number" }),
            Value::Array(_) => return Err(RenderError::UnsupportedShape { found: "an array" }),
        };

        // A block with text but no type tag is plain text. This must be
        // checked before the type dispatch: some providers emit such blocks
        // alongside typed siblings.
        if !obj.contains_key("type") {
            if let Some(text) = obj.get("text").and_then(Value::as_str) {
                return Ok(ContentBlock::Plain {
                    text: text.to_string(),
                });
            }
        }

        let kind = obj.get("type").and_then(Value::as_str).unwrap_or("");
        let block = match kind {
            "heading" => ContentBlock::Heading {
                level: obj.get("level").and_then(Value::as_i64).unwrap_or(1),
                text: str_field(obj, "text"),
            },
            "paragraph" | "text" => ContentBlock::Paragraph {
                text: str_field(obj, "text"),
            },
            "list" | "bullet_list" | "numbered_list" => ContentBlock::List {
                ordered: obj.get("ordered").and_then(Value::as_bool).unwrap_or(false),
                items: obj
                    .get("items")
                    .and_then(Value::as_array)
                    .map(|items| items.iter().map(value_text).collect())
                    .unwrap_or_default(),
            },
            "table" => ContentBlock::Table {
                rows: obj
                    .get("rows")
                    .and_then(Value::as_array)
                    .map(|rows| rows.iter().map(row_cells).collect())
                    .unwrap_or_default(),
            },
            "image" | "figure" => ContentBlock::Image {
                caption: first_str(obj, &["caption", "alt"]).unwrap_or_else(|| "Image".into()),
                source: first_str(obj, &["src", "source", "url"])
                    .unwrap_or_else(|| "image-reference".into()),
            },
            "code" | "code_block" => ContentBlock::Code {
                language: str_field(obj, "language"),
                code: first_str(obj, &["text", "content", "code"]).unwrap_or_default(),
            },
            "quote" | "blockquote" => ContentBlock::Quote {
                text: first_str(obj, &["text", "content"]).unwrap_or_default(),
            },
            _ => ContentBlock::Plain {
                text: first_str(obj, &["text", "content"]).unwrap_or_default(),
            },
        };

        Ok(block)
    }

    /// Render this block to a Markdown fragment.
    pub fn render(&self) -> String {
        match self {
            ContentBlock::Heading { level, text } => {
                let level = (*level).clamp(1, 6) as usize;
                format!("{} {}", "#".repeat(level), text)
            }
            ContentBlock::Paragraph { text } | ContentBlock::Plain { text } => text.clone(),
            ContentBlock::List { ordered, items } => {
                if items.is_empty() {
                    return String::new();
                }
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        if *ordered {
                            format!("{}. {}", i + 1, item)
                        } else {
                            format!("- {}", item)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            ContentBlock::Table { rows } => render_table(rows),
            ContentBlock::Image { caption, source } => format!("![{caption}]({source})"),
            ContentBlock::Code { language, code } => format!("```{language}\n{code}\n```"),
            ContentBlock::Quote { text } => text
                .lines()
                .map(|line| format!("> {line}"))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Render one raw block value to a Markdown fragment.
pub fn render_block(value: &Value) -> Result<String, RenderError> {
    ContentBlock::from_value(value).map(|block| block.render())
}

/// Render a page's block list: failed or empty blocks are dropped,
/// survivors joined with a blank line.
pub fn render_blocks(blocks: &[Value]) -> String {
    blocks
        .iter()
        .map(|value| render_block(value).unwrap_or_default())
        .filter(|fragment| !fragment.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_table(rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut lines: Vec<String> = Vec::with_capacity(rows.len() + 1);
    for (i, cells) in rows.iter().enumerate() {
        let line = if cells.is_empty() {
            "| |".to_string()
        } else {
            format!("| {} |", cells.join(" | "))
        };

        if i == 0 && rows.len() > 1 {
            // Separator column count comes from the rendered header row so
            // the table stays well-formed even for ragged cell counts.
            let columns = line.matches('|').count().saturating_sub(1).max(1);
            let separator = format!("|{}", "---|".repeat(columns));
            lines.push(line);
            lines.push(separator);
        } else {
            lines.push(line);
        }
    }

    lines.join("\n")
}

/// String content of a cell/item value: strings verbatim, scalars via
/// display, objects through their `text`/`content` fields.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Object(obj) => first_str(obj, &["text", "content"]).unwrap_or_default(),
        Value::Null | Value::Array(_) => String::new(),
    }
}

fn row_cells(row: &Value) -> Vec<String> {
    row.get("cells")
        .and_then(Value::as_array)
        .map(|cells| cells.iter().map(value_text).collect())
        .unwrap_or_default()
}

fn str_field(obj: &serde_json::Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn first_str(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
