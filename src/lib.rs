//! # ocr2md
//!
//! Convert PDF documents to Markdown through a remote OCR API.
//!
//! ## Why this crate?
//!
//! Local text extraction fails on scans and photographed documents: there
//! is no text layer to extract. This crate hands the whole document to a
//! remote OCR service and turns the service's response into clean Markdown.
//! The catch is the response contract: the provider may return any of
//! several JSON shapes, pages may carry typed blocks or bare strings, and
//! fields go missing routinely. The pipeline is built around that reality:
//! it normalizes whatever comes back into one canonical model and always
//! produces a useful document, even under partial failure.
//!
//! ## Pipeline Overview
//!
//! ```text
//! bytes
//!  │
//!  ├─ 1. Stage      write to the file store for upload
//!  ├─ 2. Upload     multipart POST, purpose=ocr → file id
//!  ├─ 3. Signed URL GET /files/{id}/url
//!  ├─ 4. OCR        POST {model, document_url} → provider JSON
//!  ├─ 5. Normalize  any response shape → canonical pages (never fails)
//!  └─ 6. Assemble   metadata + OCR info + per-page Markdown
//!
//!  any failure ──▶ fallback document (always renderable)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocr2md::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key read from MISTRAL_API_KEY unless set on the config
//!     let config = ConversionConfig::builder()
//!         .name("scan.pdf")
//!         .build()?;
//!     let bytes = std::fs::read("scan.pdf")?;
//!     match convert(&bytes, &config).await {
//!         Ok(output) => println!("{}", output.markdown),
//!         // Total failure still yields a renderable Markdown report.
//!         Err(failure) => println!("{}", failure.content),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocr2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! ocr2md = { version = "0.4", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod http;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, DEFAULT_MODEL};
pub use convert::{convert, convert_sync, convert_to_file};
pub use error::{ConversionFailure, OcrMdError, RenderError};
pub use http::{HttpBody, HttpCapability, HttpError, HttpMethod, HttpRequest, HttpResponse};
pub use metadata::{MetadataExtractor, NoMetadata};
pub use output::{
    CanonicalResult, ConversionOutput, DocumentInfo, DocumentMetadata, Page, Usage,
};
pub use progress::{ConversionProgress, ConversionStage, NoopProgress, ProgressCallback};
pub use store::{FileStore, StagedFile, TempDirStore};
