//! Error types for the ocr2md library.
//!
//! Three distinct types reflect three distinct failure modes:
//!
//! * [`OcrMdError`] — **Fatal to the pipeline**: a remote call failed or the
//!   conversion could not be set up. Internal to the pipeline; the public
//!   boundary converts these into [`ConversionFailure`].
//!
//! * [`RenderError`] — **Non-fatal, block-scoped**: a single content block
//!   could not be interpreted. The page-level renderer unwraps every
//!   `Err(RenderError)` to an empty fragment so one malformed block never
//!   invalidates its page.
//!
//! * [`ConversionFailure`] — the caller-visible result of a total failure.
//!   Its `content` field is always renderable Markdown, so a caller that
//!   displays documents unconditionally still has something to show.

use std::path::PathBuf;
use thiserror::Error;

/// All pipeline-fatal errors raised inside the ocr2md library.
///
/// These never cross the public `convert` boundary directly; see
/// [`ConversionFailure`].
#[derive(Debug, Error)]
pub enum OcrMdError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// No API key in the config and none in the environment.
    #[error(
        "No OCR API key configured.\nSet one via ConversionConfig::builder().api_key(..) \
         or export MISTRAL_API_KEY."
    )]
    MissingApiKey,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Remote protocol errors ────────────────────────────────────────────
    /// The HTTP capability failed before any status code was received.
    #[error("HTTP transport error during {stage}: {detail}")]
    Transport { stage: &'static str, detail: String },

    /// The file upload returned a non-2xx status.
    #[error("File upload failed with status {status}: {body}")]
    UploadFailed { status: u16, body: String },

    /// The signed-URL fetch returned a non-2xx status.
    #[error("Signed URL request failed with status {status}: {body}")]
    SignedUrlFailed { status: u16, body: String },

    /// The OCR endpoint returned a non-2xx status.
    ///
    /// `message` is the provider's `error.message` when the body parsed as
    /// JSON, otherwise the raw body. A 500 carries an additional
    /// troubleshooting hint because the provider overloads that status.
    #[error("OCR request failed with status {status}: {message}")]
    OcrApiFailed { status: u16, message: String },

    /// A 2xx response was missing a field the contract requires
    /// (e.g. `id` after upload, `url` after the signed-URL fetch).
    #[error("Malformed {stage} response: {detail}")]
    MalformedResponse { stage: &'static str, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// The file store could not stage the document for upload.
    #[error("Failed to stage document '{name}': {detail}")]
    StagingFailed { name: String, detail: String },

    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A block could not be interpreted as any known content-block shape.
///
/// Raised by [`crate::pipeline::render::render_block`] and always unwrapped
/// to `""` by [`crate::pipeline::render::render_blocks`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    /// The JSON value is neither an object nor a string.
    #[error("content block is {found}, expected an object or string")]
    UnsupportedShape { found: &'static str },
}

/// The caller-visible result of a total conversion failure.
///
/// `convert` never panics and never returns an opaque error: when the
/// pipeline fails outright, the caller receives this structure. `content`
/// holds a Markdown error report: the fallback document when the failure
/// happened mid-pipeline, or a shorter notice when the conversion could not
/// start at all (e.g. missing API key).
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct ConversionFailure {
    /// Short human-readable description of what failed.
    pub error: String,
    /// Full error detail, including the causing variant.
    pub error_details: String,
    /// A renderable Markdown document describing the failure.
    pub content: String,
}
