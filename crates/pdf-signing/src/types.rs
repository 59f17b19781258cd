use crate::constants::SIGNED_FILENAME_PREFIX;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignError {
    #[error("{0}")]
    Input(String),
    #[error("PDF format error: {0}")]
    Format(String),
    #[error("Signature encoding error: {0}")]
    Encoding(String),
    #[error("Viewer is not ready")]
    ViewerNotReady,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Document has already been signed")]
    AlreadySigned,
    #[error("Session is {0} and no longer accepts changes")]
    Locked(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl From<lopdf::Error> for SignError {
    fn from(err: lopdf::Error) -> Self {
        SignError::Format(err.to_string())
    }
}

impl From<image::ImageError> for SignError {
    fn from(err: image::ImageError) -> Self {
        SignError::Encoding(err.to_string())
    }
}

impl SignError {
    pub fn input(message: impl Into<String>) -> Self {
        SignError::Input(message.into())
    }

    pub fn code(&self) -> ReasonCode {
        match self {
            SignError::Input(_) => ReasonCode::Input,
            SignError::Format(_) => ReasonCode::Format,
            SignError::Encoding(_) => ReasonCode::Encoding,
            SignError::ViewerNotReady => ReasonCode::ViewerNotReady,
            SignError::Network(_) => ReasonCode::Network,
            SignError::NotFound(_) => ReasonCode::NotFound,
            SignError::AlreadySigned => ReasonCode::AlreadySigned,
            SignError::Locked(_) => ReasonCode::Locked,
            SignError::Io(_) | SignError::TaskJoin(_) => ReasonCode::Internal,
        }
    }

    /// Reason code plus the human-readable message shown to the signer
    pub fn reason(&self) -> FailureReason {
        FailureReason {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SignError>;

/// Closed set of failure causes a session can report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReasonCode {
    Input,
    Format,
    Encoding,
    ViewerNotReady,
    Network,
    NotFound,
    AlreadySigned,
    Locked,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FailureReason {
    pub code: ReasonCode,
    pub message: String,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

/// Native size of a page in PDF user space units
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageDimensions {
    pub width: f64,
    pub height: f64,
}

impl PageDimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// The document being signed, exactly as it was fetched.
///
/// Never mutated after construction; the byte buffer is shared with
/// the viewer and the assembler.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    bytes: Arc<[u8]>,
    pages: Vec<PageDimensions>,
    already_signed: bool,
    original_name: String,
}

impl SourceDocument {
    pub fn new(
        bytes: impl Into<Arc<[u8]>>,
        pages: Vec<PageDimensions>,
        already_signed: bool,
        original_name: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            pages,
            already_signed,
            original_name: original_name.into(),
        }
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<PageDimensions> {
        self.pages.get(index).copied()
    }

    pub fn pages(&self) -> &[PageDimensions] {
        &self.pages
    }

    pub fn already_signed(&self) -> bool {
        self.already_signed
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }
}

/// Where the signature goes, in native page coordinates.
///
/// `native_y` is measured from the bottom of the page (PDF user space)
/// and marks the bottom edge of the signature box.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlacementAnchor {
    pub page_index: usize,
    pub native_x: f64,
    pub native_y: f64,
}

impl PlacementAnchor {
    /// Move the anchor so a signature of `new_height` keeps the same top edge
    /// as one of `old_height` did.
    pub fn rebased(self, old_height: f64, new_height: f64) -> Self {
        Self {
            native_y: self.native_y + old_height - new_height,
            ..self
        }
    }
}

/// The final, immutable signed PDF
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedArtifact {
    bytes: Vec<u8>,
    filename: String,
}

impl SignedArtifact {
    pub fn new(bytes: Vec<u8>, original_name: &str) -> Self {
        Self {
            bytes,
            filename: format!("{SIGNED_FILENAME_PREFIX}{original_name}"),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn into_parts(self) -> (Vec<u8>, String) {
        (self.bytes, self.filename)
    }
}

/// Which rendering surface the signer works with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ViewerKind {
    /// Plain page renderer with a separately drawn signature image on top
    #[default]
    Overlay,
    /// Renderer with its own annotation editor
    Interactive,
}

/// How the signature is captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CaptureMode {
    /// Freehand strokes on a canvas
    #[default]
    Draw,
    /// A single image file chosen by the signer
    Upload,
}
