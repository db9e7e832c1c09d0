//! Conversion entry points and the outer failure boundary.
//!
//! ## The boundary contract
//!
//! `convert` never panics and never surfaces an opaque error: the caller
//! either gets a [`ConversionOutput`] or a [`ConversionFailure`] whose
//! `content` field is itself a renderable Markdown document. Failures
//! inside the pipeline route through the fallback assembler with whatever
//! metadata and partial results the per-call context captured; failures
//! before the pipeline starts (no API key) get a shorter report because
//! there is nothing to salvage yet.

use crate::config::ConversionConfig;
use crate::error::{ConversionFailure, OcrMdError};
use crate::http::{HttpCapability, ReqwestCapability};
use crate::metadata::NoMetadata;
use crate::output::{CanonicalResult, ConversionOutput, DocumentMetadata};
use crate::pipeline::{assemble, fallback, remote::RemoteOcr};
use crate::progress::{ConversionProgress, ConversionStage, NoopProgress};
use crate::store::TempDirStore;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything salvaged by the time of a failure, used to build the
/// fallback document. One per call; conversions share no state.
#[derive(Default)]
struct FailureContext {
    metadata: Option<DocumentMetadata>,
    partial: Option<CanonicalResult>,
}

/// Convert document bytes to Markdown via the remote OCR pipeline.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `bytes`  — Raw document bytes (typically a PDF)
/// * `config` — Conversion configuration
///
/// # Returns
/// `Ok(ConversionOutput)` on success. `Err(ConversionFailure)` on total
/// failure; its `content` field is a Markdown error report, so callers
/// that display documents unconditionally still have something to show.
pub async fn convert(
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConversionFailure> {
    let progress: Arc<dyn ConversionProgress> = config
        .progress
        .clone()
        .unwrap_or_else(|| Arc::new(NoopProgress));

    info!("Starting OCR conversion: {}", config.name);

    let Some(api_key) = config.resolve_api_key() else {
        let err = OcrMdError::MissingApiKey;
        let failure = ConversionFailure {
            error: "OCR conversion could not start".to_string(),
            error_details: err.to_string(),
            content: error_report("OCR conversion could not start", &err.to_string()),
        };
        progress.on_failure(&failure.error_details);
        return Err(failure);
    };

    let mut ctx = FailureContext::default();
    let outcome = run_pipeline(bytes, config, &api_key, progress.as_ref(), &mut ctx).await;

    match outcome {
        Ok(output) => {
            info!(
                "Conversion complete: {} pages, {} bytes of Markdown",
                output.page_count,
                output.markdown.len()
            );
            progress.on_complete(output.page_count, output.markdown.len());
            Ok(output)
        }
        Err(err) => {
            warn!("Conversion failed: {err}");
            let failure = ConversionFailure {
                error: "OCR conversion failed".to_string(),
                error_details: err.to_string(),
                content: fallback::render(
                    &err.to_string(),
                    ctx.metadata.as_ref(),
                    ctx.partial.as_ref(),
                ),
            };
            progress.on_failure(&failure.error_details);
            Err(failure)
        }
    }
}

/// The pipeline proper: stage, orchestrate, normalize, assemble.
///
/// `ctx` accumulates whatever later error handling could use; it is only
/// read by the caller on the error path.
async fn run_pipeline(
    bytes: &[u8],
    config: &ConversionConfig,
    api_key: &str,
    progress: &dyn ConversionProgress,
    ctx: &mut FailureContext,
) -> Result<ConversionOutput, OcrMdError> {
    let metadata = config
        .metadata
        .as_deref()
        .unwrap_or(&NoMetadata)
        .extract(bytes);
    ctx.metadata = Some(metadata.clone());

    let http: Arc<dyn HttpCapability> = match config.http.clone() {
        Some(http) => http,
        None => Arc::new(ReqwestCapability::new(config.request_timeout_secs)?),
    };

    let default_store = TempDirStore::new();
    let store = config.store.as_deref().unwrap_or(&default_store);

    // Stage the bytes through the file store; the upload reads the staged
    // copy. The staging directory must go away on every path below, so the
    // remote phase runs to an outcome first and the removal happens before
    // that outcome is inspected.
    let staged = store.stage(&config.name, bytes).await?;

    let remote = RemoteOcr {
        http: http.as_ref(),
        progress,
        upload_base: &config.upload_base,
        ocr_endpoint: &config.ocr_endpoint,
        api_key,
        model: &config.model,
    };

    let outcome = async {
        let file_bytes = tokio::fs::read(&staged.path)
            .await
            .map_err(|e| OcrMdError::Internal(format!("failed to read staged file: {e}")))?;
        remote.run(&config.name, file_bytes).await
    }
    .await;

    if let Err(e) = store.remove(&staged.dir).await {
        // Cleanup problems never mask the conversion's own outcome.
        warn!("Failed to remove staging dir {}: {e}", staged.dir.display());
    }

    let mut canonical = outcome?;

    if canonical.document_info.language == "unknown" {
        if let Some(language) = &config.language {
            canonical.document_info.language = language.clone();
        }
    }

    if let Some(max) = config.max_pages {
        if canonical.pages.len() > max {
            info!(
                "Truncating {} pages to the configured maximum of {max}",
                canonical.pages.len()
            );
            canonical.pages.truncate(max);
        }
    }

    ctx.partial = Some(canonical.clone());

    progress.on_stage(ConversionStage::Assembling);
    let markdown = assemble::assemble(&metadata, &canonical, config);

    Ok(ConversionOutput {
        markdown,
        page_count: canonical.pages.len(),
        info: canonical.document_info,
    })
}

/// Convert and write the Markdown directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    bytes: &[u8],
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConversionFailure> {
    let output = convert(bytes, config).await?;
    let path = output_path.as_ref();

    write_atomic(path, &output.markdown)
        .await
        .map_err(|err| ConversionFailure {
            error: "Failed to write converted document".to_string(),
            error_details: err.to_string(),
            content: error_report("Failed to write converted document", &err.to_string()),
        })?;

    Ok(output)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConversionFailure> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| {
        let err = OcrMdError::Internal(format!("failed to create tokio runtime: {e}"));
        ConversionFailure {
            error: "OCR conversion could not start".to_string(),
            error_details: err.to_string(),
            content: error_report("OCR conversion could not start", &err.to_string()),
        }
    })?;
    runtime.block_on(convert(bytes, config))
}

async fn write_atomic(path: &Path, markdown: &str) -> Result<(), OcrMdError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| OcrMdError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, markdown)
        .await
        .map_err(|e| OcrMdError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| OcrMdError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// The outermost safety net: a short report for failures with nothing to
/// salvage. Deliberately simpler than the fallback document.
fn error_report(error: &str, detail: &str) -> String {
    format!("# Conversion Failed\n\n{error}\n\n```\n{detail}\n```\n")
}
