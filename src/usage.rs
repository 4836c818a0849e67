//! Token and cost accounting for one extraction call.
//!
//! A [`UsageMetadata`] is created once per extraction, immutable after
//! construction, and attached to the result envelope. LLM cost is a linear
//! function of token counts at the model's fixed per-million rates, rounded
//! to 6 decimal places; OCR cost is a fixed per-page rate.

use crate::catalog::ModelSpec;
use serde::{Deserialize, Serialize};

/// Per-page OCR cost in USD: 190 USD per 20 000 pages.
const OCR_USD_PER_PAGE: f64 = 190.0 / 20000.0;

/// Usage counters and derived costs for one extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageMetadata {
    /// Model identifier the extraction ran against.
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// LLM cost in USD, rounded to 6 decimal places.
    pub llm_cost_usd: f64,
    /// OCR cost in USD; present only when the OCR page count is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_cost_usd: Option<f64>,
    /// `ocr_cost_usd + llm_cost_usd`; present only alongside `ocr_cost_usd`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost_usd: Option<f64>,
}

impl UsageMetadata {
    /// Build usage metadata from provider token counters and the model's
    /// catalog rates.
    pub fn from_tokens(spec: &ModelSpec, input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            model: spec.id.to_string(),
            input_tokens,
            output_tokens,
            llm_cost_usd: llm_cost_usd(spec, input_tokens, output_tokens),
            ocr_cost_usd: None,
            total_cost_usd: None,
        }
    }

    /// Attach the OCR page count, deriving the OCR and combined costs.
    pub fn with_ocr_pages(mut self, page_count: usize) -> Self {
        let ocr = ocr_cost_usd(page_count);
        self.total_cost_usd = Some(round6(ocr + self.llm_cost_usd));
        self.ocr_cost_usd = Some(ocr);
        self
    }
}

/// `input * rate_in + output * rate_out`, rates per million tokens,
/// rounded to 6 decimal places.
pub fn llm_cost_usd(spec: &ModelSpec, input_tokens: u64, output_tokens: u64) -> f64 {
    let cost = input_tokens as f64 * spec.rate_in / 1_000_000.0
        + output_tokens as f64 * spec.rate_out / 1_000_000.0;
    round6(cost)
}

/// Fixed per-page OCR rate: `page_count * 190 / 20000` USD.
pub fn ocr_cost_usd(page_count: usize) -> f64 {
    round6(page_count as f64 * OCR_USD_PER_PAGE)
}

fn round6(v: f64) -> f64 {
    (v * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModelSpec;

    #[test]
    fn one_million_each_way_at_default_rates() {
        let spec = ModelSpec::lookup("azure-gpt-4.1").unwrap();
        assert_eq!(llm_cost_usd(spec, 1_000_000, 1_000_000), 10.0);
    }

    #[test]
    fn llm_cost_rounds_to_six_decimals() {
        let spec = ModelSpec::lookup("azure-gpt-4.1").unwrap();
        // 1 input token at 2.0/M is 0.000002 exactly; 3 output at 8.0/M is 0.000024.
        assert_eq!(llm_cost_usd(spec, 1, 3), 0.000026);
    }

    #[test]
    fn ocr_cost_at_rate_anchor() {
        assert_eq!(ocr_cost_usd(20000), 190.0);
        assert_eq!(ocr_cost_usd(0), 0.0);
    }

    #[test]
    fn combined_total_is_sum() {
        let spec = ModelSpec::lookup("azure-gpt-4.1").unwrap();
        let usage = UsageMetadata::from_tokens(spec, 1_000_000, 1_000_000).with_ocr_pages(2);
        assert_eq!(usage.llm_cost_usd, 10.0);
        assert_eq!(usage.ocr_cost_usd, Some(0.019));
        assert_eq!(usage.total_cost_usd, Some(10.019));
    }

    #[test]
    fn serialized_shape_matches_cost_contract() {
        let spec = ModelSpec::lookup("azure-gpt-4.1").unwrap();
        let usage = UsageMetadata::from_tokens(spec, 10, 20).with_ocr_pages(1);
        let value = serde_json::to_value(&usage).unwrap();
        for key in [
            "llm_cost_usd",
            "ocr_cost_usd",
            "total_cost_usd",
            "model",
            "input_tokens",
            "output_tokens",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn ocr_fields_absent_until_pages_known() {
        let spec = ModelSpec::lookup("azure-gpt-4.1").unwrap();
        let usage = UsageMetadata::from_tokens(spec, 10, 20);
        let value = serde_json::to_value(&usage).unwrap();
        assert!(value.get("ocr_cost_usd").is_none());
        assert!(value.get("total_cost_usd").is_none());
    }
}
