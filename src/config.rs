//! Configuration types for remote-OCR conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`],
//! built via its [`ConversionConfigBuilder`]. Keeping every knob in one
//! struct makes it trivial to share configs across tasks and to diff two
//! runs to understand why their outputs differ.
//!
//! The collaborators the pipeline consumes (HTTP transport, file store,
//! metadata extractor, progress callback) are injected here as trait
//! objects. Tests swap in mocks; the desktop host swaps in its own scratch
//! store and IPC progress bridge; everyone else gets working defaults.

use crate::error::OcrMdError;
use crate::http::HttpCapability;
use crate::metadata::MetadataExtractor;
use crate::progress::ConversionProgress;
use crate::store::FileStore;
use std::fmt;
use std::sync::Arc;

/// Default OCR model requested from the provider.
pub const DEFAULT_MODEL: &str = "mistral-ocr-latest";

/// Default base for the file upload / signed URL endpoints.
pub const DEFAULT_UPLOAD_BASE: &str = "https://api.mistral.ai/v1";

/// Default OCR endpoint.
pub const DEFAULT_OCR_ENDPOINT: &str = "https://api.mistral.ai/v1/ocr";

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "MISTRAL_API_KEY";

/// Configuration for one conversion.
///
/// Built via [`ConversionConfig::builder()`] or [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use ocr2md::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .name("quarterly-report.pdf")
///     .language("en")
///     .max_pages(50)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Document name; used as the upload file name and as the title of last
    /// resort. Default: `"document"`.
    pub name: String,

    /// Explicit document title; overrides extracted metadata.
    pub title: Option<String>,

    /// Expected document language hint. Used for the "Language" row when
    /// the provider does not report one.
    pub language: Option<String>,

    /// OCR model identifier sent to the provider. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Keep at most this many pages of the normalized result. The provider
    /// is still asked for the whole document; truncation happens locally.
    pub max_pages: Option<usize>,

    /// API key. Falls back to the `MISTRAL_API_KEY` environment variable.
    pub api_key: Option<String>,

    /// Base URL for `/files` and `/files/{id}/url`. Override for
    /// self-hosted gateways and tests.
    pub upload_base: String,

    /// Full URL of the OCR endpoint.
    pub ocr_endpoint: String,

    /// Whole-request timeout for each remote call, in seconds. Default: 120.
    ///
    /// OCR of a large scanned document routinely takes tens of seconds; a
    /// short transport timeout here turns slow-but-successful conversions
    /// into spurious failures.
    pub request_timeout_secs: u64,

    /// HTTP transport. Default: a `reqwest` client built per conversion.
    pub http: Option<Arc<dyn HttpCapability>>,

    /// File store for staging the upload. Default: system temp directory.
    pub store: Option<Arc<dyn FileStore>>,

    /// Metadata extractor. Default: reports no metadata.
    pub metadata: Option<Arc<dyn MetadataExtractor>>,

    /// Progress callback fired at each stage boundary.
    pub progress: Option<Arc<dyn ConversionProgress>>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            name: "document".to_string(),
            title: None,
            language: None,
            model: DEFAULT_MODEL.to_string(),
            max_pages: None,
            api_key: None,
            upload_base: DEFAULT_UPLOAD_BASE.to_string(),
            ocr_endpoint: DEFAULT_OCR_ENDPOINT.to_string(),
            request_timeout_secs: 120,
            http: None,
            store: None,
            metadata: None,
            progress: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("language", &self.language)
            .field("model", &self.model)
            .field("max_pages", &self.max_pages)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("upload_base", &self.upload_base)
            .field("ocr_endpoint", &self.ocr_endpoint)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("http", &self.http.as_ref().map(|_| "<dyn HttpCapability>"))
            .field("store", &self.store.as_ref().map(|_| "<dyn FileStore>"))
            .field(
                "metadata",
                &self.metadata.as_ref().map(|_| "<dyn MetadataExtractor>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolve the API key: explicit config first, then the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = Some(language.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = Some(n);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Trailing slashes are trimmed so URL joins stay predictable.
    pub fn upload_base(mut self, base: impl Into<String>) -> Self {
        self.config.upload_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn ocr_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.ocr_endpoint = endpoint.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn http(mut self, http: Arc<dyn HttpCapability>) -> Self {
        self.config.http = Some(http);
        self
    }

    pub fn store(mut self, store: Arc<dyn FileStore>) -> Self {
        self.config.store = Some(store);
        self
    }

    pub fn metadata(mut self, extractor: Arc<dyn MetadataExtractor>) -> Self {
        self.config.metadata = Some(extractor);
        self
    }

    pub fn progress(mut self, progress: Arc<dyn ConversionProgress>) -> Self {
        self.config.progress = Some(progress);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, OcrMdError> {
        let c = &self.config;
        if c.name.trim().is_empty() {
            return Err(OcrMdError::InvalidConfig(
                "Document name must not be empty".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(OcrMdError::InvalidConfig("Model must not be empty".into()));
        }
        if c.upload_base.trim().is_empty() || c.ocr_endpoint.trim().is_empty() {
            return Err(OcrMdError::InvalidConfig(
                "Endpoints must not be empty".into(),
            ));
        }
        if c.max_pages == Some(0) {
            return Err(OcrMdError::InvalidConfig(
                "max_pages must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
