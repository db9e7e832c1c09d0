//! Progress-callback trait for per-stage conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgress>`] via
//! [`crate::config::ConversionConfigBuilder::progress`] to receive events as
//! the pipeline crosses each stage boundary.
//!
//! # Why callbacks instead of a shared status map?
//!
//! Progress state lives in the per-call pipeline context and is reported
//! outward through this trait, so concurrent conversions share no mutable
//! state. Callers can forward events to a channel, a UI process, or a
//! terminal spinner without the library knowing how the host application
//! communicates. The trait is `Send + Sync` so an implementation may be
//! shared across concurrently running conversions.

use std::sync::Arc;

/// Pipeline stages in execution order.
///
/// Emitted through [`ConversionProgress::on_stage`] immediately before the
/// stage runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStage {
    /// Uploading the document bytes to the provider's file endpoint.
    Uploading,
    /// Fetching the signed URL for the uploaded file.
    FetchingSignedUrl,
    /// Issuing the OCR request against the signed URL.
    RequestingOcr,
    /// Normalizing the provider response into the canonical model.
    Normalizing,
    /// Rendering the canonical model into the final Markdown document.
    Assembling,
}

impl ConversionStage {
    /// Human-readable stage label for logs and progress displays.
    pub fn label(&self) -> &'static str {
        match self {
            ConversionStage::Uploading => "uploading document",
            ConversionStage::FetchingSignedUrl => "fetching signed URL",
            ConversionStage::RequestingOcr => "requesting OCR",
            ConversionStage::Normalizing => "normalizing response",
            ConversionStage::Assembling => "assembling Markdown",
        }
    }
}

/// Called by the conversion pipeline at each stage boundary.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgress: Send + Sync {
    /// Called immediately before each stage runs.
    fn on_stage(&self, stage: ConversionStage) {
        let _ = stage;
    }

    /// Called once when the conversion succeeds.
    ///
    /// # Arguments
    /// * `page_count`   — pages in the final document
    /// * `markdown_len` — byte length of the produced Markdown
    fn on_complete(&self, page_count: usize, markdown_len: usize) {
        let _ = (page_count, markdown_len);
    }

    /// Called once when the conversion fails outright.
    fn on_failure(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgress;

impl ConversionProgress for NoopProgress {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgress>;
