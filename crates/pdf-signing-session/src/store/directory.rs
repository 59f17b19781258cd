//! Filesystem-backed document store.
//!
//! Layout under the root directory:
//! - `<id>.pdf`: the document to sign
//! - `<id>.json`: its metadata ([`DocumentRecord`])
//! - `signed/<id>_<filename>`: submitted artifacts

use super::{DocumentId, DocumentStore, FetchedDocument, SignedSubmission};
use chrono::{DateTime, Utc};
use pdf_signing::constants::{MAX_FILE_SIZE, PDF_MAGIC};
use pdf_signing::{Result, SignError, inspect_pdf};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

const SIGNED_DIR: &str = "signed";

/// Metadata kept next to each stored document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentRecord {
    pub original_name: String,
    pub title: String,
    pub is_signed: bool,
    pub signed_at: Option<DateTime<Utc>>,
    pub signed_by: Option<String>,
    pub remarks: Option<String>,
    pub signed_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    max_file_size: usize,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_size: MAX_FILE_SIZE,
        }
    }

    /// Reject uploads and signed artifacts larger than `bytes`
    pub fn with_max_file_size(mut self, bytes: usize) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    fn check_pdf_payload(&self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.max_file_size {
            return Err(SignError::input(format!(
                "File exceeds the {} byte limit",
                self.max_file_size
            )));
        }
        if !bytes.starts_with(PDF_MAGIC) {
            return Err(SignError::input("File is not a PDF"));
        }
        Ok(())
    }

    /// Store a new, unsigned document under `id`
    pub async fn add_document(
        &self,
        id: &DocumentId,
        bytes: &[u8],
        original_name: &str,
    ) -> Result<()> {
        validate_id(id)?;
        self.check_pdf_payload(bytes)?;

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.pdf_path(id), bytes).await?;

        let title = Path::new(original_name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let record = DocumentRecord {
            original_name: original_name.to_string(),
            title,
            ..DocumentRecord::default()
        };
        self.write_record(id, &record).await?;

        log::info!("Stored document {} ({})", id, original_name);
        Ok(())
    }

    /// Read the metadata of a stored document
    pub async fn record(&self, id: &DocumentId) -> Result<DocumentRecord> {
        validate_id(id)?;
        let bytes = tokio::fs::read(self.record_path(id))
            .await
            .map_err(|e| store_error(id, e))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| SignError::Format(format!("Corrupt metadata for {}: {}", id, e)))
    }

    async fn write_record(&self, id: &DocumentId, record: &DocumentRecord) -> Result<()> {
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| SignError::Format(format!("Failed to encode metadata: {}", e)))?;
        tokio::fs::write(self.record_path(id), json).await?;
        Ok(())
    }

    fn pdf_path(&self, id: &DocumentId) -> PathBuf {
        self.root.join(format!("{}.pdf", id))
    }

    fn record_path(&self, id: &DocumentId) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }

    fn signed_path(&self, id: &DocumentId, filename: &str) -> PathBuf {
        self.root.join(SIGNED_DIR).join(format!("{}_{}", id, filename))
    }
}

/// Ids become file names, so anything that could escape the root is refused
fn validate_id(id: &DocumentId) -> Result<()> {
    let raw = id.as_str();
    if raw.is_empty() || raw.starts_with('.') || raw.contains(['/', '\\']) {
        return Err(SignError::NotFound(raw.to_string()));
    }
    Ok(())
}

fn store_error(id: &DocumentId, err: io::Error) -> SignError {
    match err.kind() {
        io::ErrorKind::NotFound => SignError::NotFound(id.to_string()),
        _ => SignError::Network(err.to_string()),
    }
}

fn file_name_only(filename: &str) -> Result<&str> {
    Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| SignError::input("Submission has no file name"))
}

impl DocumentStore for DirectoryStore {
    async fn fetch_for_signing(
        &self,
        id: &DocumentId,
        _access_token: Option<&str>,
    ) -> Result<FetchedDocument> {
        let record = self.record(id).await?;
        let bytes = tokio::fs::read(self.pdf_path(id))
            .await
            .map_err(|e| store_error(id, e))?;

        let (bytes, pages) = tokio::task::spawn_blocking(move || {
            let pages = inspect_pdf(&bytes);
            (bytes, pages)
        })
        .await?;
        let page_dimensions = pages?;

        log::debug!(
            "Fetched document {} ({} pages, signed: {})",
            id,
            page_dimensions.len(),
            record.is_signed
        );

        Ok(FetchedDocument {
            bytes,
            page_dimensions,
            already_signed: record.is_signed,
            signed_at: record.signed_at,
            original_name: record.original_name,
        })
    }

    async fn submit_signed(
        &self,
        id: &DocumentId,
        submission: SignedSubmission,
        _access_token: Option<&str>,
    ) -> Result<()> {
        let mut record = self.record(id).await?;
        if record.is_signed {
            return Err(SignError::AlreadySigned);
        }
        self.check_pdf_payload(&submission.artifact)?;
        let signer_name = submission.signer_name.trim();
        if signer_name.is_empty() {
            return Err(SignError::input("Please enter your name"));
        }

        let path = self.signed_path(id, file_name_only(&submission.filename)?);
        tokio::fs::create_dir_all(self.root.join(SIGNED_DIR)).await?;
        tokio::fs::write(&path, &submission.artifact).await?;

        record.is_signed = true;
        record.signed_at = Some(Utc::now());
        record.signed_by = Some(signer_name.to_string());
        record.remarks = Some(submission.remarks).filter(|r| !r.trim().is_empty());
        record.signed_path = Some(path);
        self.write_record(id, &record).await?;

        log::info!("Document {} signed by {}", id, signer_name);
        Ok(())
    }
}
