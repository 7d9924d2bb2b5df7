//! Knowledge ingestion — turns a set of reference documents into one text
//! blob for the system instruction.
//!
//! Supported inputs are PDF (all pages, extracted text), `.txt` and `.md`
//! (read verbatim). Anything else is skipped. A document that fails to
//! parse is skipped too: the failure is logged and reported back to the
//! caller as a diagnostic, and the remaining documents are still
//! processed. The output concatenation preserves source order, so the
//! loader is deterministic for stable inputs.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::IngestionError;

/// Extensions the loader recognizes. Everything else is ignored.
const RECOGNIZED_EXTENSIONS: [&str; 3] = ["pdf", "txt", "md"];

static CONTROL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").expect("valid regex"));
static INTRA_LINE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\r\n]+").expect("valid regex"));

/// One knowledge document, either uploaded bytes or a file on disk.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    Bytes { name: String, data: Vec<u8> },
    Path(PathBuf),
}

impl DocumentSource {
    /// Display name used in diagnostics.
    pub fn name(&self) -> String {
        match self {
            Self::Bytes { name, .. } => name.clone(),
            Self::Path(path) => path.display().to_string(),
        }
    }

    fn extension(&self) -> Option<String> {
        let ext = match self {
            Self::Bytes { name, .. } => name.rsplit_once('.')?.1,
            Self::Path(path) => path.extension()?.to_str()?,
        };
        Some(ext.to_ascii_lowercase())
    }
}

/// Outcome of one ingestion pass.
///
/// `blob` holds the order-preserving concatenation of every successfully
/// extracted document, each followed by a newline. `failures` carries the
/// per-document diagnostics for the status sink; they never abort the pass.
#[derive(Debug, Default)]
pub struct IngestionReport {
    pub blob: String,
    pub failures: Vec<IngestionError>,
}

impl IngestionReport {
    /// Human-readable diagnostics, one per failed document.
    pub fn warnings(&self) -> Vec<String> {
        self.failures.iter().map(|e| e.to_string()).collect()
    }
}

/// Extract text from every source and concatenate it in input order.
pub async fn load_knowledge(sources: &[DocumentSource]) -> IngestionReport {
    let mut report = IngestionReport::default();

    for source in sources {
        let Some(ext) = source.extension() else {
            tracing::debug!(source = %source.name(), "Skipping document without extension");
            continue;
        };
        if !RECOGNIZED_EXTENSIONS.contains(&ext.as_str()) {
            tracing::debug!(source = %source.name(), ext, "Skipping unsupported document type");
            continue;
        }

        match extract_text(source, &ext).await {
            Ok(text) => {
                report.blob.push_str(&text);
                report.blob.push('\n');
            }
            Err(e) => {
                tracing::warn!(source = %source.name(), error = %e, "Knowledge document skipped");
                report.failures.push(e);
            }
        }
    }

    report
}

/// List the ingestible documents in a local knowledge folder.
///
/// Non-recursive; entries are sorted by file name so the resulting blob is
/// stable across platforms. A missing directory yields an empty list.
pub async fn scan_folder(dir: &Path) -> Vec<DocumentSource> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "Knowledge folder not readable");
            return Vec::new();
        }
    };

    let mut paths = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let recognized = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| RECOGNIZED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if recognized {
            paths.push(path);
        }
    }

    paths.sort();
    paths.into_iter().map(DocumentSource::Path).collect()
}

async fn extract_text(source: &DocumentSource, ext: &str) -> Result<String, IngestionError> {
    match ext {
        "pdf" => {
            let bytes = match source {
                DocumentSource::Bytes { data, .. } => data.clone(),
                DocumentSource::Path(path) => tokio::fs::read(path).await.map_err(|e| {
                    IngestionError::Unreadable {
                        name: source.name(),
                        source: e,
                    }
                })?,
            };
            extract_pdf_text(source.name(), bytes).await
        }
        // txt / md are read verbatim
        _ => match source {
            DocumentSource::Bytes { data, .. } => {
                Ok(String::from_utf8_lossy(data).into_owned())
            }
            DocumentSource::Path(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                IngestionError::Unreadable {
                    name: source.name(),
                    source: e,
                }
            }),
        },
    }
}

/// Extract text from all pages of a PDF. Parsing is CPU-bound, so it runs
/// on a blocking task.
async fn extract_pdf_text(name: String, bytes: Vec<u8>) -> Result<String, IngestionError> {
    let result = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
    })
    .await;

    match result {
        Ok(Ok(text)) => Ok(clean_extracted_text(&text)),
        Ok(Err(reason)) => Err(IngestionError::Extraction { name, reason }),
        Err(join_err) => Err(IngestionError::Extraction {
            name,
            reason: join_err.to_string(),
        }),
    }
}

/// Strip control characters and collapse intra-line whitespace runs.
/// PDF extraction output is noisy; line structure is preserved.
fn clean_extracted_text(text: &str) -> String {
    let cleaned = CONTROL_CHARS.replace_all(text, "");
    let cleaned = INTRA_LINE_WHITESPACE.replace_all(&cleaned, " ");
    cleaned.trim().to_string()
}
