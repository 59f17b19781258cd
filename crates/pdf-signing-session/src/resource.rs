//! Scoped document handles.
//!
//! A rendered document is backed by a temporary handle that must be
//! released on every exit path. [`DocumentHandle`] releases itself on
//! drop, and [`HandleRegistry`] counts live handles so leaks show up.

use pdf_signing::SourceDocument;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Default)]
pub struct HandleRegistry {
    live: Arc<AtomicUsize>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, document: &SourceDocument) -> DocumentHandle {
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!(
            "Acquired handle for {} ({} live)",
            document.original_name(),
            live
        );
        DocumentHandle {
            document: document.clone(),
            live: Arc::clone(&self.live),
        }
    }

    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

/// Owned reference to the document currently shown to the signer
#[derive(Debug)]
pub struct DocumentHandle {
    document: SourceDocument,
    live: Arc<AtomicUsize>,
}

impl DocumentHandle {
    pub fn document(&self) -> &SourceDocument {
        &self.document
    }
}

impl Drop for DocumentHandle {
    fn drop(&mut self) {
        let remaining = self.live.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        log::debug!(
            "Released handle for {} ({} live)",
            self.document.original_name(),
            remaining
        );
    }
}
