use super::{ViewerCapability, ViewerStatus};
use crate::capture::SignatureRaster;
use crate::types::{PlacementAnchor, Result, SignError, SourceDocument, ViewerKind};
use std::sync::Arc;
use tokio::sync::watch;

/// Plain renderer; the signature lives only as an overlay until assembly.
pub struct OverlayViewer {
    document: Option<Arc<[u8]>>,
    placed: Option<PlacementAnchor>,
    status: watch::Sender<ViewerStatus>,
}

impl Default for OverlayViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayViewer {
    pub fn new() -> Self {
        let (status, _) = watch::channel(ViewerStatus::Idle);
        Self {
            document: None,
            placed: None,
            status,
        }
    }

    pub fn placed_anchor(&self) -> Option<&PlacementAnchor> {
        self.placed.as_ref()
    }
}

impl ViewerCapability for OverlayViewer {
    fn kind(&self) -> ViewerKind {
        ViewerKind::Overlay
    }

    fn load_document(&mut self, document: &SourceDocument) {
        self.document = Some(document.bytes().clone());
        self.placed = None;
        self.status.send_replace(ViewerStatus::Ready);
    }

    fn status(&self) -> ViewerStatus {
        *self.status.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<ViewerStatus> {
        self.status.subscribe()
    }

    fn annotation_count(&self) -> usize {
        usize::from(self.placed.is_some())
    }

    fn place_signature(
        &mut self,
        anchor: &PlacementAnchor,
        _signature: &SignatureRaster,
        _width: f64,
    ) -> Result<()> {
        if self.document.is_none() {
            return Err(SignError::ViewerNotReady);
        }
        self.placed = Some(*anchor);
        Ok(())
    }

    fn clear_signature(&mut self) {
        self.placed = None;
    }

    /// The overlay never touches the document, so this is the source as loaded.
    fn serialize_with_annotations(&self) -> Result<Vec<u8>> {
        self.document
            .as_ref()
            .map(|bytes| bytes.to_vec())
            .ok_or(SignError::ViewerNotReady)
    }

    fn unload(&mut self) {
        self.document = None;
        self.placed = None;
        self.status.send_replace(ViewerStatus::Idle);
    }
}
