//! Error types for the invoice-extract library.
//!
//! Every failure in the pipeline is a variant of one enum, [`ExtractError`].
//! The pipeline is fail-fast: no variant is retried automatically, and no
//! partial record is ever returned — extraction either fully succeeds (even
//! with many null fields) or fails outright. The orchestrating layer owns
//! user-visible messaging and cleanup of temporary resources.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the invoice-extract library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Neither a local path nor a URL was supplied to the OCR adapter.
    #[error("No PDF input given: supply either a local file path or an HTTP(S) URL")]
    SourceMissing,

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR provider call failed or returned empty content.
    #[error("OCR service error: {detail}")]
    OcrService { detail: String },

    // ── Model / LLM errors ────────────────────────────────────────────────
    /// The model identifier is not in the recognized catalog.
    #[error("Unknown model '{id}'. Run with a recognised model identifier; see ModelSpec::all().")]
    UnknownModel { id: String },

    /// The LLM API returned a non-retryable error.
    #[error("LLM API error from '{model}': {message}")]
    LlmApi { model: String, message: String },

    /// The LLM call exceeded the model's configured timeout.
    #[error("LLM call timed out after {secs}s for model '{model}'")]
    ProviderTimeout { model: String, secs: u64 },

    // ── Decoding / validation errors ──────────────────────────────────────
    /// Model output could not be parsed as a JSON object, even after
    /// fence-stripping and the permissive literal fallback.
    #[error("Model output is not a JSON object: {detail}")]
    ExtractionFormat { detail: String },

    /// A present value in the parsed object cannot be coerced to its
    /// declared type. Missing fields never produce this error.
    #[error("Invalid invoice field '{field}': {reason}")]
    Validation { field: String, reason: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file (markdown snapshot, CSV).
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed or a required credential is missing.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
