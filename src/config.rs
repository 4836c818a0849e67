//! Process-wide configuration for invoice extraction.
//!
//! Everything the pipeline needs from the outside world — OCR credentials,
//! per-provider API keys, the markdown snapshot directory — lives in one
//! [`ExtractionConfig`], built via its [`ExtractionConfigBuilder`].
//!
//! The environment is read in exactly one place, [`ExtractionConfig::from_env`],
//! called once at process start. Business logic never reads ambient state;
//! every component takes `&ExtractionConfig` explicitly, so tests can inject
//! arbitrary credentials and endpoints without touching the environment.

use crate::error::ExtractError;
use std::fmt;
use std::path::PathBuf;

/// Configuration for one extraction process.
///
/// Built via [`ExtractionConfig::builder()`] or [`ExtractionConfig::from_env()`].
///
/// # Example
/// ```rust
/// use invoice_extract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .ocr_endpoint("https://my-resource.cognitiveservices.azure.com")
///     .ocr_key("secret")
///     .azure_openai_key("secret")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Azure Document Intelligence endpoint, without a trailing slash.
    pub ocr_endpoint: Option<String>,

    /// Azure Document Intelligence API key.
    pub ocr_key: Option<String>,

    /// API key for Azure-hosted OpenAI deployments.
    pub azure_openai_key: Option<String>,

    /// API key for the Anthropic messages API.
    pub anthropic_key: Option<String>,

    /// API key for the Google Gemini generateContent API.
    pub gemini_key: Option<String>,

    /// Directory where the full OCR markdown is snapshotted for inspection.
    /// Default: `data/temp`. Created on demand.
    pub snapshot_dir: PathBuf,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Poll interval for the OCR analyze operation in milliseconds. Default: 2000.
    pub ocr_poll_interval_ms: u64,

    /// Maximum number of OCR polls before giving up. Default: 120.
    pub ocr_poll_limit: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ocr_endpoint: None,
            ocr_key: None,
            azure_openai_key: None,
            anthropic_key: None,
            gemini_key: None,
            snapshot_dir: PathBuf::from("data/temp"),
            download_timeout_secs: 120,
            ocr_poll_interval_ms: 2000,
            ocr_poll_limit: 120,
        }
    }
}

// Hand-written Debug so API keys never end up in logs.
impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(v: &Option<String>) -> &'static str {
            if v.is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }
        f.debug_struct("ExtractionConfig")
            .field("ocr_endpoint", &self.ocr_endpoint)
            .field("ocr_key", &redact(&self.ocr_key))
            .field("azure_openai_key", &redact(&self.azure_openai_key))
            .field("anthropic_key", &redact(&self.anthropic_key))
            .field("gemini_key", &redact(&self.gemini_key))
            .field("snapshot_dir", &self.snapshot_dir)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a configuration from the process environment.
    ///
    /// Recognised variables:
    /// - `AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT` / `AZURE_DOCUMENT_INTELLIGENCE_KEY`
    /// - `AZURE_OPENAI_API_KEY`
    /// - `ANTHROPIC_API_KEY`
    /// - `GOOGLE_AI_API_KEY`, falling back to `GEMINI_API_KEY`
    ///
    /// Missing variables leave the corresponding field unset; the error for
    /// a missing credential surfaces only when a component that needs it is
    /// actually invoked.
    pub fn from_env() -> Self {
        fn var(name: &str) -> Option<String> {
            std::env::var(name).ok().filter(|v| !v.is_empty())
        }

        Self {
            ocr_endpoint: var("AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT")
                .map(|e| e.trim_end_matches('/').to_string()),
            ocr_key: var("AZURE_DOCUMENT_INTELLIGENCE_KEY"),
            azure_openai_key: var("AZURE_OPENAI_API_KEY"),
            anthropic_key: var("ANTHROPIC_API_KEY"),
            gemini_key: var("GOOGLE_AI_API_KEY").or_else(|| var("GEMINI_API_KEY")),
            ..Self::default()
        }
    }

    /// OCR endpoint and key, or an error naming what is missing.
    pub(crate) fn ocr_credentials(&self) -> Result<(&str, &str), ExtractError> {
        let endpoint = self.ocr_endpoint.as_deref().ok_or_else(|| {
            ExtractError::InvalidConfig(
                "OCR endpoint not configured (AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT)".into(),
            )
        })?;
        let key = self.ocr_key.as_deref().ok_or_else(|| {
            ExtractError::InvalidConfig(
                "OCR key not configured (AZURE_DOCUMENT_INTELLIGENCE_KEY)".into(),
            )
        })?;
        Ok((endpoint, key))
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn ocr_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let e: String = endpoint.into();
        self.config.ocr_endpoint = Some(e.trim_end_matches('/').to_string());
        self
    }

    pub fn ocr_key(mut self, key: impl Into<String>) -> Self {
        self.config.ocr_key = Some(key.into());
        self
    }

    pub fn azure_openai_key(mut self, key: impl Into<String>) -> Self {
        self.config.azure_openai_key = Some(key.into());
        self
    }

    pub fn anthropic_key(mut self, key: impl Into<String>) -> Self {
        self.config.anthropic_key = Some(key.into());
        self
    }

    pub fn gemini_key(mut self, key: impl Into<String>) -> Self {
        self.config.gemini_key = Some(key.into());
        self
    }

    pub fn snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.snapshot_dir = dir.into();
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn ocr_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.ocr_poll_interval_ms = ms.max(1);
        self
    }

    pub fn ocr_poll_limit(mut self, n: u32) -> Self {
        self.config.ocr_poll_limit = n.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        if self.config.download_timeout_secs == 0 {
            return Err(ExtractError::InvalidConfig(
                "Download timeout must be ≥ 1s".into(),
            ));
        }
        Ok(self.config)
    }
}
