//! CLI binary for ocr2md.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ocr2md::{
    convert, convert_to_file, ConversionConfig, ConversionProgress, ConversionStage,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Convert a PDF document to Markdown through a remote OCR API.
#[derive(Parser, Debug)]
#[command(name = "ocr2md", version, about)]
struct Cli {
    /// Input document (PDF or other scannable format).
    input: PathBuf,

    /// Write Markdown here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Document title for the output header.
    #[arg(long)]
    title: Option<String>,

    /// Expected document language hint (e.g. "en").
    #[arg(long)]
    language: Option<String>,

    /// OCR model identifier.
    #[arg(long)]
    model: Option<String>,

    /// Keep at most this many pages of the result.
    #[arg(long)]
    max_pages: Option<usize>,

    /// API key; read from the environment when omitted.
    #[arg(long, env = "MISTRAL_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL for the file upload endpoints.
    #[arg(long)]
    upload_base: Option<String>,

    /// Full URL of the OCR endpoint.
    #[arg(long)]
    ocr_endpoint: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    /// Print a JSON summary of the OCR info to stderr after converting.
    #[arg(long)]
    json: bool,

    /// Suppress the progress spinner.
    #[arg(short, long)]
    quiet: bool,
}

/// Terminal progress: one spinner that renames itself at each stage
/// boundary.
struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message("starting…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgress for SpinnerProgress {
    fn on_stage(&self, stage: ConversionStage) {
        self.bar.set_message(stage.label());
    }

    fn on_complete(&self, page_count: usize, markdown_len: usize) {
        self.bar
            .finish_with_message(format!("done — {page_count} pages, {markdown_len} bytes"));
    }

    fn on_failure(&self, error: &str) {
        self.bar.abandon_with_message(format!("failed — {error}"));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let bytes = std::fs::read(&cli.input)
        .with_context(|| format!("failed to read input file {}", cli.input.display()))?;

    let name = cli
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let mut builder = ConversionConfig::builder()
        .name(name)
        .request_timeout_secs(cli.timeout);
    if let Some(title) = cli.title {
        builder = builder.title(title);
    }
    if let Some(language) = cli.language {
        builder = builder.language(language);
    }
    if let Some(model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(max_pages) = cli.max_pages {
        builder = builder.max_pages(max_pages);
    }
    if let Some(api_key) = cli.api_key {
        builder = builder.api_key(api_key);
    }
    if let Some(base) = cli.upload_base {
        builder = builder.upload_base(base);
    }
    if let Some(endpoint) = cli.ocr_endpoint {
        builder = builder.ocr_endpoint(endpoint);
    }
    if !cli.quiet {
        builder = builder.progress(SpinnerProgress::new());
    }

    let config = builder.build().context("invalid configuration")?;

    let outcome = match &cli.output {
        Some(path) => convert_to_file(&bytes, path, &config).await,
        None => convert(&bytes, &config).await,
    };

    match outcome {
        Ok(output) => {
            if cli.output.is_none() {
                println!("{}", output.markdown);
            } else {
                eprintln!(
                    "Wrote {} pages to {}",
                    output.page_count,
                    cli.output.as_ref().map(|p| p.display().to_string()).unwrap_or_default()
                );
            }
            if cli.json {
                eprintln!("{}", serde_json::to_string_pretty(&output.info)?);
            }
            Ok(())
        }
        Err(failure) => {
            // The failure content is itself a Markdown report; keep it
            // available when the caller asked for a file.
            if let Some(path) = &cli.output {
                std::fs::write(path, &failure.content).ok();
            }
            eprintln!("{}", failure.error_details);
            anyhow::bail!("{}", failure.error)
        }
    }
}
