//! The document store collaborator: where documents come from and where
//! signed artifacts go.

mod directory;

pub use directory::{DirectoryStore, DocumentRecord};

use chrono::{DateTime, Utc};
use pdf_signing::{PageDimensions, Result, SourceDocument};
use std::fmt;
use std::future::Future;

/// Opaque identifier of a stored document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Result of fetching a document for signing
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub bytes: Vec<u8>,
    pub page_dimensions: Vec<PageDimensions>,
    pub already_signed: bool,
    pub signed_at: Option<DateTime<Utc>>,
    pub original_name: String,
}

impl FetchedDocument {
    pub fn into_source(self) -> SourceDocument {
        SourceDocument::new(
            self.bytes,
            self.page_dimensions,
            self.already_signed,
            self.original_name,
        )
    }
}

/// Everything sent back with a signed document
#[derive(Debug, Clone, PartialEq)]
pub struct SignedSubmission {
    pub artifact: Vec<u8>,
    pub filename: String,
    pub signer_name: String,
    pub remarks: String,
}

/// Remote (or local) home of the documents being signed.
///
/// Errors are reported with the shared taxonomy: transport problems as
/// `Network`, unknown ids as `NotFound`, a lost signing race as
/// `AlreadySigned` and rejected payloads as `Input`.
pub trait DocumentStore: Send + Sync {
    fn fetch_for_signing(
        &self,
        id: &DocumentId,
        access_token: Option<&str>,
    ) -> impl Future<Output = Result<FetchedDocument>> + Send;

    fn submit_signed(
        &self,
        id: &DocumentId,
        submission: SignedSubmission,
        access_token: Option<&str>,
    ) -> impl Future<Output = Result<()>> + Send;
}
