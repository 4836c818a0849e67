//! PDF text extraction via Azure Document Intelligence.
//!
//! ## Why prebuilt-layout with markdown output?
//!
//! The layout model preserves table structure as HTML `<table>` blocks and
//! inserts `<!-- PageBreak -->` markers between pages, which is exactly what
//! the downstream prompt needs: the extraction model sees line items as
//! tables rather than a soup of positioned words, and per-page flags
//! (`has_table`, `has_lca`) can be derived with plain string scans.
//!
//! The analyze operation is asynchronous on the service side: submit the
//! document, then poll the `Operation-Location` URL until the job reports
//! `succeeded` or `failed`.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const ANALYZE_API_VERSION: &str = "2024-11-30";
const PAGE_BREAK: &str = "<!-- PageBreak -->";

/// Where the PDF comes from: a local file or an HTTP(S) URL.
#[derive(Debug, Clone)]
pub enum OcrSource {
    Path(PathBuf),
    Url(String),
}

impl OcrSource {
    /// Classify a raw input string as a URL or a local path.
    pub fn from_input(input: &str) -> Self {
        if input.starts_with("http://") || input.starts_with("https://") {
            OcrSource::Url(input.to_string())
        } else {
            OcrSource::Path(PathBuf::from(input))
        }
    }

    /// Build a source from two optional inputs (file picker or URL field).
    /// The file takes precedence when both are given.
    pub fn from_parts(path: Option<PathBuf>, url: Option<String>) -> Result<Self, ExtractError> {
        match (path, url) {
            (Some(p), _) => Ok(OcrSource::Path(p)),
            (None, Some(u)) if !u.trim().is_empty() => Ok(OcrSource::Url(u)),
            _ => Err(ExtractError::SourceMissing),
        }
    }

    /// The URL the document was fetched from, if any.
    fn source_url(&self) -> Option<String> {
        match self {
            OcrSource::Url(u) => Some(u.clone()),
            OcrSource::Path(_) => None,
        }
    }

    /// Human-readable name used to derive the snapshot slug.
    fn display_name(&self) -> String {
        match self {
            OcrSource::Path(p) => p
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document".to_string()),
            OcrSource::Url(u) => u
                .rsplit('/')
                .find(|seg| !seg.is_empty())
                .map(|seg| seg.trim_end_matches(".pdf").to_string())
                .unwrap_or_else(|| "document".to_string()),
        }
    }
}

/// One page of recognized markdown with its content flags.
#[derive(Debug, Clone)]
pub struct OcrPage {
    /// 1-based page number.
    pub page: usize,
    pub content: String,
    /// Page contains at least one HTML table.
    pub has_table: bool,
    /// Page contains a table and mentions "gwp" (global warming potential),
    /// i.e. likely carries life-cycle-assessment data.
    pub has_lca: bool,
    pub source_url: Option<String>,
}

/// The OCR result for one document.
#[derive(Debug, Clone)]
pub struct OcrOutput {
    /// Slug derived from the input name; also the snapshot file stem.
    pub doc_slug: String,
    /// Full recognized markdown, page markers included.
    pub markdown: String,
    pub pages: Vec<OcrPage>,
}

/// Run layout OCR on a PDF and return its markdown, split into pages.
///
/// A snapshot of the full markdown is written to the configured snapshot
/// directory as `<slug>.md`.
pub async fn extract_text(
    source: OcrSource,
    config: &ExtractionConfig,
) -> Result<OcrOutput, ExtractError> {
    let bytes = load_pdf_bytes(&source, config.download_timeout_secs).await?;
    let markdown = analyze_layout(&bytes, config).await?;
    if markdown.trim().is_empty() {
        return Err(ExtractError::OcrService {
            detail: "service returned no text content".to_string(),
        });
    }

    let pages = split_pages(&markdown, source.source_url());
    let doc_slug = slugify(&source.display_name());
    write_snapshot(&config.snapshot_dir, &doc_slug, &markdown)?;
    info!(slug = %doc_slug, pages = pages.len(), "OCR complete");

    Ok(OcrOutput {
        doc_slug,
        markdown,
        pages,
    })
}

// ── Input resolution ─────────────────────────────────────────────────────

/// Load the PDF into memory, validating the `%PDF` magic bytes.
async fn load_pdf_bytes(source: &OcrSource, timeout_secs: u64) -> Result<Vec<u8>, ExtractError> {
    let (bytes, origin) = match source {
        OcrSource::Path(path) => (read_local(path)?, path.display().to_string()),
        OcrSource::Url(url) => (download_url(url, timeout_secs).await?, url.clone()),
    };

    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(ExtractError::NotAPdf {
            path: PathBuf::from(origin),
            magic,
        });
    }
    Ok(bytes)
}

/// Read a local file, mapping the common io failures to their own variants.
fn read_local(path: &Path) -> Result<Vec<u8>, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    match std::fs::read(path) {
        Ok(bytes) => {
            debug!("Read local PDF: {}", path.display());
            Ok(bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(ExtractError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(ExtractError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}

/// Download a URL into memory with a dedicated timeout.
async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, ExtractError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ExtractError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ExtractError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    Ok(bytes.to_vec())
}

// ── Analyze + poll ───────────────────────────────────────────────────────

/// Submit the document to prebuilt-layout and poll until the markdown
/// content is available.
async fn analyze_layout(bytes: &[u8], config: &ExtractionConfig) -> Result<String, ExtractError> {
    let (endpoint, key) = config.ocr_credentials()?;
    let url = format!(
        "{endpoint}/documentintelligence/documentModels/prebuilt-layout:analyze\
         ?api-version={ANALYZE_API_VERSION}&outputContentFormat=markdown"
    );

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.download_timeout_secs))
        .build()
        .map_err(|e| ExtractError::OcrService {
            detail: e.to_string(),
        })?;

    let response = client
        .post(&url)
        .header("Ocp-Apim-Subscription-Key", key)
        .header("Content-Type", "application/octet-stream")
        .body(bytes.to_vec())
        .send()
        .await
        .map_err(|e| ExtractError::OcrService {
            detail: format!("analyze request failed: {e}"),
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ExtractError::OcrService {
            detail: format!("analyze rejected ({status}): {body}"),
        });
    }

    let operation_url = response
        .headers()
        .get("Operation-Location")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| ExtractError::OcrService {
            detail: "no Operation-Location header in analyze response".to_string(),
        })?;
    debug!("Polling OCR operation: {}", operation_url);

    let interval = std::time::Duration::from_millis(config.ocr_poll_interval_ms);
    for _ in 0..config.ocr_poll_limit {
        tokio::time::sleep(interval).await;
        let poll = client
            .get(&operation_url)
            .header("Ocp-Apim-Subscription-Key", key)
            .send()
            .await
            .map_err(|e| ExtractError::OcrService {
                detail: format!("poll request failed: {e}"),
            })?;
        let body: serde_json::Value = poll.json().await.map_err(|e| ExtractError::OcrService {
            detail: format!("poll returned invalid JSON: {e}"),
        })?;

        match body.get("status").and_then(|s| s.as_str()).unwrap_or("") {
            "succeeded" => {
                let content = body
                    .get("analyzeResult")
                    .and_then(|r| r.get("content"))
                    .and_then(|c| c.as_str())
                    .unwrap_or("");
                return Ok(content.to_string());
            }
            "failed" => {
                let message = body
                    .get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown error");
                return Err(ExtractError::OcrService {
                    detail: format!("analysis failed: {message}"),
                });
            }
            // "running" / "notStarted": keep polling.
            _ => {}
        }
    }

    Err(ExtractError::OcrService {
        detail: format!(
            "analysis did not complete within {} polls",
            config.ocr_poll_limit
        ),
    })
}

// ── Page splitting and snapshot ──────────────────────────────────────────

/// Split recognized markdown on page-break markers and tag each page.
fn split_pages(markdown: &str, source_url: Option<String>) -> Vec<OcrPage> {
    markdown
        .split(PAGE_BREAK)
        .enumerate()
        .map(|(i, chunk)| {
            let content = chunk.trim().to_string();
            let has_table = content.contains("<table>");
            let has_lca = has_table && content.to_lowercase().contains("gwp");
            OcrPage {
                page: i + 1,
                content,
                has_table,
                has_lca,
                source_url: source_url.clone(),
            }
        })
        .collect()
}

/// Lowercase a document name to a filesystem-safe slug: alphanumerics kept,
/// every other run of characters collapsed to a single dash.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "document".to_string()
    } else {
        slug
    }
}

/// Persist the full markdown to `<dir>/<slug>.md` for audit and debugging.
fn write_snapshot(dir: &Path, slug: &str, markdown: &str) -> Result<(), ExtractError> {
    std::fs::create_dir_all(dir).map_err(|e| ExtractError::OcrService {
        detail: format!("cannot create snapshot directory {}: {e}", dir.display()),
    })?;
    let path = dir.join(format!("{slug}.md"));
    std::fs::write(&path, markdown).map_err(|e| ExtractError::OcrService {
        detail: format!("cannot write snapshot {}: {e}", path.display()),
    })?;
    debug!("Wrote OCR snapshot: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_input_classifies_urls_and_paths() {
        assert!(matches!(
            OcrSource::from_input("https://example.com/doc.pdf"),
            OcrSource::Url(_)
        ));
        assert!(matches!(
            OcrSource::from_input("http://example.com/doc.pdf"),
            OcrSource::Url(_)
        ));
        assert!(matches!(
            OcrSource::from_input("/tmp/doc.pdf"),
            OcrSource::Path(_)
        ));
        assert!(matches!(
            OcrSource::from_input("doc.pdf"),
            OcrSource::Path(_)
        ));
    }

    #[test]
    fn from_parts_requires_some_source() {
        let err = OcrSource::from_parts(None, None).unwrap_err();
        assert!(matches!(err, ExtractError::SourceMissing));
        let err = OcrSource::from_parts(None, Some("   ".to_string())).unwrap_err();
        assert!(matches!(err, ExtractError::SourceMissing));

        // File wins over URL when both are present.
        let src = OcrSource::from_parts(
            Some(PathBuf::from("a.pdf")),
            Some("https://example.com/b.pdf".to_string()),
        )
        .unwrap();
        assert!(matches!(src, OcrSource::Path(_)));
    }

    #[test]
    fn display_name_from_url_drops_pdf_suffix() {
        let src = OcrSource::from_input("https://example.com/files/Invoice%20A.pdf");
        assert_eq!(src.display_name(), "Invoice%20A");
    }

    #[test]
    fn split_pages_numbers_from_one() {
        let md = "page one\n<!-- PageBreak -->\npage two\n<!-- PageBreak -->\npage three";
        let pages = split_pages(md, None);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].page, 1);
        assert_eq!(pages[2].page, 3);
        assert_eq!(pages[1].content, "page two");
    }

    #[test]
    fn split_pages_single_page_without_marker() {
        let pages = split_pages("only page", None);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page, 1);
    }

    #[test]
    fn page_flags_require_table_for_lca() {
        let md = "intro GWP value\n<!-- PageBreak -->\n<table><tr><td>GWP A1</td></tr></table>\n<!-- PageBreak -->\n<table><tr><td>totals</td></tr></table>";
        let pages = split_pages(md, None);
        // "gwp" without a table does not count as LCA data.
        assert!(!pages[0].has_table);
        assert!(!pages[0].has_lca);
        assert!(pages[1].has_table);
        assert!(pages[1].has_lca);
        assert!(pages[2].has_table);
        assert!(!pages[2].has_lca);
    }

    #[test]
    fn lca_match_is_case_insensitive() {
        let pages = split_pages("<table>gwp-fossil</table>", None);
        assert!(pages[0].has_lca);
    }

    #[test]
    fn source_url_carried_onto_every_page() {
        let url = Some("https://example.com/x.pdf".to_string());
        let pages = split_pages("a<!-- PageBreak -->b", url.clone());
        assert_eq!(pages[0].source_url, url);
        assert_eq!(pages[1].source_url, url);
    }

    #[test]
    fn slugify_collapses_punctuation_runs() {
        assert_eq!(slugify("Invoice 2024 — ACME GmbH.pdf"), "invoice-2024-acme-gmbh-pdf");
        assert_eq!(slugify("  __weird__  "), "weird");
        assert_eq!(slugify("!!!"), "document");
        assert_eq!(slugify("Simple"), "simple");
    }

    #[test]
    fn local_missing_file_is_file_not_found() {
        let err = read_local(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn non_pdf_bytes_rejected_with_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"<html>nope</html>").unwrap();
        let err = load_pdf_bytes(&OcrSource::Path(path), 5).await.unwrap_err();
        match err {
            ExtractError::NotAPdf { magic, .. } => assert_eq!(&magic, b"<htm"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn valid_pdf_magic_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.pdf");
        std::fs::write(&path, b"%PDF-1.7 rest of file").unwrap();
        let bytes = load_pdf_bytes(&OcrSource::Path(path), 5).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn snapshot_written_under_slug() {
        let dir = tempfile::tempdir().unwrap();
        write_snapshot(dir.path(), "acme-invoice", "# content").unwrap();
        let written = std::fs::read_to_string(dir.path().join("acme-invoice.md")).unwrap();
        assert_eq!(written, "# content");
    }
}
