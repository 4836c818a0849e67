//! Extraction pipeline entry points.
//!
//! [`extract`] turns OCR markdown into a validated invoice record:
//! build prompt → resolve model → invoke → decode → validate → cost.
//! [`process_invoice`] runs the whole document flow, OCR included.
//!
//! Execution is single-request and sequential: one invoice end-to-end per
//! invocation, two blocking external calls (OCR, LLM), no retry on
//! transient provider failure — errors propagate unchanged to the caller.

use crate::catalog::ModelSpec;
use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::ocr::{self, OcrOutput, OcrSource};
use crate::pipeline::{chat, decode};
use crate::prompts;
use crate::schema::InvoiceRecord;
use crate::usage::UsageMetadata;
use serde_json::Value;
use tracing::{debug, info};

/// The unit returned by the pipeline: the validated record serialized back
/// to a plain nested mapping, paired with its usage metadata.
#[derive(Debug, Clone)]
pub struct ResultEnvelope {
    pub content: Value,
    pub usage: UsageMetadata,
}

/// Result of the full document flow: OCR output plus the extraction
/// envelope, whose usage carries the combined OCR + LLM cost.
#[derive(Debug, Clone)]
pub struct ProcessedInvoice {
    pub ocr: OcrOutput,
    pub envelope: ResultEnvelope,
}

/// Extract a structured invoice record from OCR markdown.
///
/// The model identifier must be one of the recognised catalog entries;
/// an unknown identifier fails with [`ExtractError::UnknownModel`] before
/// any network call.
pub async fn extract(
    markdown: &str,
    model_id: &str,
    config: &ExtractionConfig,
) -> Result<ResultEnvelope, ExtractError> {
    // ── Step 1–2: prompt + model resolution (no network yet) ─────────────
    let spec = ModelSpec::lookup(model_id)?;
    let client = chat::ChatClient::new(spec, config)?;
    let user_prompt = prompts::build_user_prompt(markdown);
    info!(model = model_id, "invoking extraction model");

    // ── Step 3: invoke the model ─────────────────────────────────────────
    let response = client.chat(prompts::SYSTEM_PROMPT, &user_prompt).await?;

    // ── Steps 4–9: decode, validate, account ─────────────────────────────
    finalize_response(
        spec,
        &response.content,
        response.input_tokens,
        response.output_tokens,
    )
}

/// Decode, validate and account a raw model response.
///
/// This is the network-free tail of [`extract`], public so callers (and
/// tests) can replay captured responses without a live provider.
pub fn finalize_response(
    spec: &'static ModelSpec,
    raw_text: &str,
    input_tokens: u64,
    output_tokens: u64,
) -> Result<ResultEnvelope, ExtractError> {
    let cleaned = decode::strip_code_fences(raw_text);
    let object = decode::parse_object(&cleaned)?;
    let record = InvoiceRecord::validate(&Value::Object(object))?;
    let usage = UsageMetadata::from_tokens(spec, input_tokens, output_tokens);
    debug!(
        model = spec.id,
        items = record.items.len(),
        llm_cost_usd = usage.llm_cost_usd,
        "extraction validated"
    );

    Ok(ResultEnvelope {
        content: record.to_value(),
        usage,
    })
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    markdown: &str,
    model_id: &str,
    config: &ExtractionConfig,
) -> Result<ResultEnvelope, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(extract(markdown, model_id, config))
}

/// Run the full flow for one PDF: OCR → extraction → combined cost.
///
/// `source` is a local file path or an HTTP(S) URL.
pub async fn process_invoice(
    source: &str,
    model_id: &str,
    config: &ExtractionConfig,
) -> Result<ProcessedInvoice, ExtractError> {
    // Validate the identifier before spending an OCR call on it.
    ModelSpec::lookup(model_id)?;

    info!(source, "processing invoice");
    let ocr_output = ocr::extract_text(OcrSource::from_input(source), config).await?;

    let mut envelope = extract(&ocr_output.markdown, model_id, config).await?;
    envelope.usage = envelope.usage.with_ocr_pages(ocr_output.pages.len());

    info!(
        pages = ocr_output.pages.len(),
        total_cost_usd = envelope.usage.total_cost_usd,
        "invoice processed"
    );
    Ok(ProcessedInvoice {
        ocr: ocr_output,
        envelope,
    })
}

/// Synchronous wrapper around [`process_invoice`].
pub fn process_invoice_sync(
    source: &str,
    model_id: &str,
    config: &ExtractionConfig,
) -> Result<ProcessedInvoice, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(process_invoice(source, model_id, config))
}
