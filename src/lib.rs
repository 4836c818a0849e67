//! # invoice-extract
//!
//! Extract structured invoice records from PDF documents using Azure
//! Document Intelligence OCR and LLM-based field extraction.
//!
//! ## Why this crate?
//!
//! Invoices arrive as PDFs with wildly varied layouts — template-based
//! parsers break on every new vendor. This crate OCRs the document into
//! layout-preserving markdown (tables stay tables), hands that markdown to
//! an instruction-following model with a fixed output schema, then
//! validates the model's JSON into a typed record. Every run is costed:
//! token usage is converted to USD from a per-model rate table, and the
//! OCR page count is billed alongside it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF (path or URL)
//!  │
//!  ├─ 1. OCR       prebuilt-layout analyze → markdown, split per page
//!  ├─ 2. Prompt    embed markdown into the extraction prompt
//!  ├─ 3. Invoke    one chat call (Azure OpenAI / Anthropic / Gemini)
//!  ├─ 4. Decode    strip fences, parse JSON (lax fallback for quirks)
//!  ├─ 5. Validate  coerce into the invoice schema, reject bad types
//!  └─ 6. Account   token + page costs → usage metadata
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use invoice_extract::{process_invoice, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credentials read from AZURE_DOCUMENT_INTELLIGENCE_* and the
//!     // provider API key variables.
//!     let config = ExtractionConfig::from_env();
//!     let result = process_invoice("invoice.pdf", "azure-gpt-4.1", &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&result.envelope.content)?);
//!     eprintln!("cost: ${:.6}", result.envelope.usage.total_cost_usd.unwrap_or(0.0));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `invoice-extract` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! invoice-extract = { version = "0.1", default-features = false }
//! ```
//!
//! ## Choosing a Model
//!
//! | Model | $/1M tokens | Notes |
//! |-------|------------|-------|
//! | `azure-gpt-4.1-mini` | $0.40/$1.60 | Cheap, good on clean invoices |
//! | `azure-gpt-4.1`      | $2.00/$8.00 | Default |
//! | `claude-3-7-sonnet`  | $3.00/$15.00 | Strong on dense tables |
//! | `gemini-2.0-flash`   | $0.10/$0.40 | Cheapest option |
//!
//! The full roster is in [`catalog::MODELS`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod ocr;
pub mod pipeline;
pub mod prompts;
pub mod schema;
pub mod usage;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use catalog::{ModelSpec, ProviderFamily, MODELS};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::ExtractError;
pub use extract::{
    extract, extract_sync, finalize_response, process_invoice, process_invoice_sync,
    ProcessedInvoice, ResultEnvelope,
};
pub use ocr::{extract_text, OcrOutput, OcrPage, OcrSource};
pub use schema::{Address, ContactDetails, InvoiceRecord, LineItem};
pub use usage::UsageMetadata;
