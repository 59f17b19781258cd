//! Viewer capability: the surface the signer looks at and places the signature on
//!
//! Two variants implement [`ViewerCapability`]:
//! - [`OverlayViewer`]: plain page rendering with the signature drawn as a
//!   separate overlay image; placement is pure coordinate math
//! - [`InteractiveViewer`]: owns an annotation store; the signature becomes
//!   a stamp annotation that is flattened at submission

mod interactive;
mod overlay;

pub use interactive::InteractiveViewer;
pub use overlay::OverlayViewer;

use crate::capture::SignatureRaster;
use crate::types::{PlacementAnchor, Result, SourceDocument, ViewerKind};
use tokio::sync::watch;

/// Load progress of a viewer's document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewerStatus {
    /// No document has been handed to the viewer
    #[default]
    Idle,
    Loading,
    Ready,
    /// The document could not be opened by the viewer
    Failed,
}

/// Narrow, typed interface over a PDF rendering surface.
///
/// Bound once per loaded document; every accessor fails fast with
/// `ViewerNotReady` instead of reaching into a half-loaded renderer.
pub trait ViewerCapability: Send {
    fn kind(&self) -> ViewerKind;

    /// Start loading a document. Readiness is reported through [`Self::status`].
    fn load_document(&mut self, document: &SourceDocument);

    fn status(&self) -> ViewerStatus;

    /// Subscribe to status changes, e.g. to await readiness
    fn subscribe(&self) -> watch::Receiver<ViewerStatus>;

    fn is_ready(&self) -> bool {
        self.status() == ViewerStatus::Ready
    }

    /// Number of signable marks the signer has produced in this viewer
    fn annotation_count(&self) -> usize;

    /// Record the signature at `anchor`, replacing any earlier placement
    fn place_signature(
        &mut self,
        anchor: &PlacementAnchor,
        signature: &SignatureRaster,
        width: f64,
    ) -> Result<()>;

    /// Remove the placed signature, if any
    fn clear_signature(&mut self);

    /// Raw PDF bytes including any un-flattened interactive layer
    fn serialize_with_annotations(&self) -> Result<Vec<u8>>;

    /// Drop the loaded document and return to [`ViewerStatus::Idle`]
    fn unload(&mut self);
}

/// Build the viewer variant selected by configuration
pub fn create_viewer(kind: ViewerKind) -> Box<dyn ViewerCapability> {
    match kind {
        ViewerKind::Overlay => Box::new(OverlayViewer::new()),
        ViewerKind::Interactive => Box::new(InteractiveViewer::new()),
    }
}
