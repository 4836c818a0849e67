//! CLI binary for invoice-extract.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` and prints the extracted record.

use anyhow::{Context, Result};
use clap::Parser;
use invoice_extract::{export, process_invoice, ExtractionConfig, ModelSpec};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract a local invoice to JSON (stdout)
  invoice-extract invoice.pdf

  # Use a specific model
  invoice-extract --model claude-3-7-sonnet invoice.pdf

  # Extract from a URL to a CSV file, one row per line item
  invoice-extract https://example.com/invoice.pdf --format csv -o invoice.csv

  # List the recognised model identifiers
  invoice-extract --list-models

SUPPORTED MODELS:
  Model                  Input $/1M  Output $/1M
  ─────────────────────  ──────────  ───────────
  azure-gpt-4o           $2.50       $10.00
  azure-gpt-4.1-mini     $0.40       $1.60
  azure-gpt-4.1 (default) $2.00      $8.00
  azure-o4-mini          $1.10       $4.40
  azure-o3               $2.00       $8.00
  azure-gpt-5            $1.25       $10.00
  claude-3-5-sonnet      $3.00       $15.00
  claude-3-7-sonnet      $3.00       $15.00
  gemini-2.0-flash       $0.10       $0.40
  gemini-2.5-flash       $0.30       $2.50
  gemini-2.5-pro         $1.25       $10.00

  OCR is billed separately at $9.50 per 1000 pages (prebuilt-layout).

ENVIRONMENT VARIABLES:
  AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT  OCR service endpoint
  AZURE_DOCUMENT_INTELLIGENCE_KEY       OCR service key
  AZURE_OPENAI_API_KEY                  Azure OpenAI key (azure-* models)
  ANTHROPIC_API_KEY                     Anthropic key (claude-* models)
  GOOGLE_AI_API_KEY / GEMINI_API_KEY    Google key (gemini-* models)

SETUP:
  1. Set the OCR credentials and the key for your chosen model family.
  2. Extract:  invoice-extract invoice.pdf -o invoice.json
"#;

/// Extract structured invoice data from PDF files and URLs.
#[derive(Parser, Debug)]
#[command(
    name = "invoice-extract",
    version,
    about = "Extract structured invoice data from PDF files and URLs",
    long_about = "OCR a PDF invoice (local file or URL) with Azure Document Intelligence, \
extract its fields with an LLM, and print the validated record as JSON or as CSV with one \
row per line item. Every run reports its token usage and USD cost.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    #[arg(required_unless_present = "list_models")]
    input: Option<String>,

    /// Write the result to this file instead of stdout.
    #[arg(short, long, env = "INVOICE_EXTRACT_OUTPUT")]
    output: Option<PathBuf>,

    /// Extraction model ID (see --list-models).
    #[arg(long, env = "INVOICE_EXTRACT_MODEL", default_value = "azure-gpt-4.1")]
    model: String,

    /// Output format.
    #[arg(long, env = "INVOICE_EXTRACT_FORMAT", value_enum, default_value = "json")]
    format: FormatArg,

    /// Directory for OCR markdown snapshots.
    #[arg(long, env = "INVOICE_EXTRACT_SNAPSHOT_DIR")]
    snapshot_dir: Option<PathBuf>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "INVOICE_EXTRACT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// List recognised model identifiers and exit.
    #[arg(long)]
    list_models: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "INVOICE_EXTRACT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the record itself.
    #[arg(short, long, env = "INVOICE_EXTRACT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug, PartialEq)]
enum FormatArg {
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.list_models {
        for id in ModelSpec::all() {
            println!("{id}");
        }
        return Ok(());
    }

    let input = cli
        .input
        .as_deref()
        .context("No input document provided")?;

    // ── Build config ─────────────────────────────────────────────────────
    let mut config = ExtractionConfig::from_env();
    config.download_timeout_secs = cli.download_timeout;
    if let Some(ref dir) = cli.snapshot_dir {
        config.snapshot_dir = dir.clone();
    }

    // ── Run extraction ───────────────────────────────────────────────────
    let result = process_invoice(input, &cli.model, &config)
        .await
        .context("Extraction failed")?;

    let rendered = match cli.format {
        FormatArg::Json => {
            let mut s = serde_json::to_string_pretty(&result.envelope.content)
                .context("Failed to serialise record")?;
            s.push('\n');
            s
        }
        FormatArg::Csv => export::to_csv_string(&result.envelope.content)
            .context("Failed to render CSV")?,
    };

    if let Some(ref output_path) = cli.output {
        export::write_output(output_path, &rendered).context("Failed to write output")?;
        if !cli.quiet {
            eprintln!(
                "{}  {} pages  →  {}",
                green("✔"),
                result.ocr.pages.len(),
                bold(&output_path.display().to_string()),
            );
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?;
    }

    if !cli.quiet {
        let usage = &result.envelope.usage;
        eprintln!(
            "   {} tokens in  /  {} tokens out  —  ${:.6} total",
            dim(&usage.input_tokens.to_string()),
            dim(&usage.output_tokens.to_string()),
            usage.total_cost_usd.unwrap_or(usage.llm_cost_usd),
        );
    }

    Ok(())
}
