//! Integration tests for invoice-extract.
//!
//! Most tests here run offline by replaying captured model responses
//! through the public finalize/export API. Live tests (real OCR and LLM
//! calls against a PDF in `./test_cases/`) are gated behind the
//! `E2E_ENABLED` environment variable so they never run in CI unless
//! explicitly requested.
//!
//! Run the live tests with:
//!   E2E_ENABLED=1 cargo test --test pipeline -- --nocapture

use invoice_extract::{
    export, finalize_response, process_invoice, ExtractError, ExtractionConfig, InvoiceRecord,
    ModelSpec, UsageMetadata,
};
use serde_json::json;
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn spec(id: &str) -> &'static ModelSpec {
    ModelSpec::lookup(id).expect("catalog model")
}

/// A plausible model response for a two-item invoice, fenced the way chat
/// models usually fence JSON.
fn fenced_two_item_response() -> String {
    format!(
        "```json\n{}\n```",
        json!({
            "invoice_id": "2024-0117",
            "invoice_date": "2024-03-05",
            "seller_name": "Nordic Steel AS",
            "buyer_name": "Byggmester Olsen",
            "buyer_address": {
                "street": "Storgata 1",
                "city": "Oslo",
                "state": null,
                "postcode": "0155",
                "country": "NO"
            },
            "invoice_total": 1250.0,
            "invoice_total_currency": "NOK",
            "items": [
                {
                    "description": "HEB 200 beam",
                    "quantity": 4.0,
                    "unit_price": 250.0,
                    "total_price": 1000.0,
                    "vat_rate": 25.0,
                    "currency": "NOK"
                },
                {
                    "description": "Delivery",
                    "quantity": 1.0,
                    "total_price": 250.0,
                    "currency": "NOK"
                }
            ]
        })
    )
}

// ── Offline pipeline tests (always run) ──────────────────────────────────────

#[test]
fn fenced_response_to_validated_record() {
    let envelope =
        finalize_response(spec("azure-gpt-4.1"), &fenced_two_item_response(), 2400, 450).unwrap();

    assert_eq!(envelope.content["invoice_id"], json!("2024-0117"));
    assert_eq!(envelope.content["buyer_address"]["city"], json!("Oslo"));
    assert_eq!(envelope.content["items"].as_array().unwrap().len(), 2);
    // Unanswered fields are explicit nulls, not absent keys.
    assert_eq!(envelope.content["seller_address"]["street"], json!(null));
}

#[test]
fn python_literal_response_is_recovered() {
    // Some models echo Python literals instead of JSON.
    let raw = "{'invoice_id': 'INV-9', 'invoice_total': None, 'items': []}";
    let envelope = finalize_response(spec("azure-gpt-4.1"), raw, 100, 40).unwrap();
    assert_eq!(envelope.content["invoice_id"], json!("INV-9"));
    assert_eq!(envelope.content["invoice_total"], json!(null));
}

#[test]
fn prose_response_is_a_format_error() {
    let err = finalize_response(
        spec("azure-gpt-4.1"),
        "I'm sorry, I cannot find an invoice in this document.",
        100,
        20,
    )
    .unwrap_err();
    assert!(matches!(err, ExtractError::ExtractionFormat { .. }));
}

#[test]
fn wrong_field_type_names_the_field() {
    let raw = json!({"items": [{"description": "x", "quantity": {"n": 2}}]}).to_string();
    let err = finalize_response(spec("azure-gpt-4.1"), &raw, 10, 10).unwrap_err();
    match err {
        ExtractError::Validation { field, .. } => assert_eq!(field, "items[0].quantity"),
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[test]
fn usage_costs_follow_the_rate_table() {
    let envelope =
        finalize_response(spec("azure-gpt-4.1"), &fenced_two_item_response(), 2400, 450).unwrap();
    // 2400 in at $2/1M + 450 out at $8/1M, rounded to 6 decimals.
    assert_eq!(envelope.usage.llm_cost_usd, 0.0084);
    assert_eq!(envelope.usage.input_tokens, 2400);
    assert_eq!(envelope.usage.ocr_cost_usd, None);

    let with_ocr = envelope.usage.with_ocr_pages(3);
    let ocr = with_ocr.ocr_cost_usd.unwrap();
    assert!((ocr - 0.0285).abs() < 1e-9);
    assert!((with_ocr.total_cost_usd.unwrap() - 0.0369).abs() < 1e-9);
}

#[test]
fn reasoning_models_pin_temperature_to_one() {
    for id in ["azure-o4-mini", "azure-o3", "azure-gpt-5"] {
        let m = spec(id);
        assert_eq!(m.temperature, 1.0, "{id}");
        assert_eq!(m.max_tokens, None, "{id}");
    }
    assert_eq!(spec("azure-gpt-4.1").temperature, 0.0);
}

#[test]
fn every_catalog_id_resolves() {
    for id in ModelSpec::all() {
        let m = ModelSpec::lookup(id).unwrap();
        assert!(m.rate_in > 0.0);
        assert!(m.rate_out >= m.rate_in);
        assert!(m.timeout_secs > 0);
    }
}

#[test]
fn record_round_trips_through_csv_export() {
    let envelope =
        finalize_response(spec("azure-gpt-4.1"), &fenced_two_item_response(), 10, 10).unwrap();
    let csv_text = export::to_csv_string(&envelope.content).unwrap();

    let mut lines = csv_text.lines();
    let header = lines.next().unwrap();
    assert!(header.contains("item_description"));
    assert!(header.contains("buyer_address_city"));
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 2, "one CSV row per line item");
    assert!(rows[0].contains("HEB 200 beam"));
    assert!(rows[1].contains("Delivery"));
    // Invoice-level columns repeat on every row.
    for row in rows {
        assert!(row.contains("2024-0117"));
    }
}

#[test]
fn empty_model_answer_exports_as_single_row() {
    let envelope = finalize_response(spec("azure-gpt-4.1"), "{}", 10, 10).unwrap();
    let csv_text = export::to_csv_string(&envelope.content).unwrap();
    assert_eq!(csv_text.lines().count(), 2); // header + one row of empties
}

#[test]
fn validation_is_idempotent() {
    let envelope =
        finalize_response(spec("azure-gpt-4.1"), &fenced_two_item_response(), 10, 10).unwrap();
    let again = InvoiceRecord::validate(&envelope.content).unwrap();
    assert_eq!(again.to_value(), envelope.content);
}

#[test]
fn config_without_ocr_credentials_fails_before_network() {
    let config = ExtractionConfig::default();
    let rt = tokio::runtime::Runtime::new().unwrap();
    let err = rt
        .block_on(process_invoice("missing.pdf", "azure-gpt-4.1", &config))
        .unwrap_err();
    // The local file check runs before credentials are needed.
    assert!(matches!(err, ExtractError::FileNotFound { .. }));
}

#[test]
fn usage_metadata_serialises_without_absent_ocr_cost() {
    let usage = UsageMetadata::from_tokens(spec("gemini-2.0-flash"), 1000, 500);
    let value = serde_json::to_value(&usage).unwrap();
    assert!(value.get("ocr_cost_usd").is_none());
    assert!(value.get("total_cost_usd").is_none());
    assert_eq!(value["model"], json!("gemini-2.0-flash"));
}

// ── Live end-to-end tests (need credentials and a PDF) ───────────────────────

/// Skip unless E2E_ENABLED is set *and* the test PDF exists.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

/// Full flow against a real invoice PDF. Requires the Azure Document
/// Intelligence credentials and the key for the chosen model family.
#[tokio::test]
async fn test_e2e_process_local_invoice() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample_invoice.pdf"));
    let config = ExtractionConfig::from_env();
    if config.ocr_endpoint.is_none() || config.ocr_key.is_none() {
        println!("SKIP — OCR credentials not configured");
        return;
    }

    let model = std::env::var("INVOICE_EXTRACT_MODEL").unwrap_or_else(|_| "azure-gpt-4.1".into());
    let result = process_invoice(path.to_str().unwrap(), &model, &config)
        .await
        .expect("extraction should succeed");

    assert!(!result.ocr.markdown.trim().is_empty());
    assert!(!result.ocr.pages.is_empty());
    assert!(result.envelope.usage.input_tokens > 0);
    assert!(result.envelope.usage.total_cost_usd.unwrap_or(0.0) > 0.0);

    // The snapshot must have been written under the document slug.
    let snapshot = config.snapshot_dir.join(format!("{}.md", result.ocr.doc_slug));
    assert!(snapshot.exists(), "snapshot missing: {}", snapshot.display());

    println!(
        "[e2e] {} pages, {} in / {} out, ${:.6}",
        result.ocr.pages.len(),
        result.envelope.usage.input_tokens,
        result.envelope.usage.output_tokens,
        result.envelope.usage.total_cost_usd.unwrap_or(0.0),
    );
    println!(
        "--- BEGIN RECORD ---\n{}\n--- END RECORD ---",
        serde_json::to_string_pretty(&result.envelope.content).unwrap()
    );
}

/// An unknown model id must fail before any network or OCR work happens.
#[tokio::test]
async fn test_e2e_unknown_model_rejected_early() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP");
        return;
    }
    let config = ExtractionConfig::default();
    let err = process_invoice("whatever.pdf", "gpt-99-ultra", &config)
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::UnknownModel { .. }));
}
