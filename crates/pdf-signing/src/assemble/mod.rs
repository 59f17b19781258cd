//! Signed artifact assembly
//!
//! Two strategies produce the final PDF:
//! 1. Raster composite: draw the signature image onto the source page
//! 2. Annotation flatten: bake an annotated document's interactive
//!    layer into fixed page content

mod flatten;
mod raster;

pub use flatten::flatten_annotations;
pub use raster::composite_signature;

use crate::types::*;
use std::sync::Arc;

/// Which assembly strategy produces the artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyStrategy {
    RasterComposite,
    AnnotationFlatten,
}

impl From<ViewerKind> for AssemblyStrategy {
    fn from(kind: ViewerKind) -> Self {
        match kind {
            ViewerKind::Overlay => AssemblyStrategy::RasterComposite,
            ViewerKind::Interactive => AssemblyStrategy::AnnotationFlatten,
        }
    }
}

/// Inputs for one assembly run
#[derive(Debug, Clone)]
pub enum AssemblyInput {
    RasterComposite {
        source: Arc<[u8]>,
        signature_png: Vec<u8>,
        anchor: PlacementAnchor,
        signature_width: f64,
    },
    AnnotationFlatten {
        annotated: Vec<u8>,
    },
}

impl AssemblyInput {
    pub fn strategy(&self) -> AssemblyStrategy {
        match self {
            AssemblyInput::RasterComposite { .. } => AssemblyStrategy::RasterComposite,
            AssemblyInput::AnnotationFlatten { .. } => AssemblyStrategy::AnnotationFlatten,
        }
    }
}

/// Produce the signed artifact off the async executor
pub async fn assemble(input: AssemblyInput, original_name: &str) -> Result<SignedArtifact> {
    let original_name = original_name.to_owned();
    tokio::task::spawn_blocking(move || assemble_blocking(input, &original_name)).await?
}

pub fn assemble_blocking(input: AssemblyInput, original_name: &str) -> Result<SignedArtifact> {
    let strategy = input.strategy();
    let bytes = match input {
        AssemblyInput::RasterComposite {
            source,
            signature_png,
            anchor,
            signature_width,
        } => composite_signature(&source, &signature_png, &anchor, signature_width)?,
        AssemblyInput::AnnotationFlatten { annotated } => flatten_annotations(&annotated)?,
    };
    log::info!(
        "Assembled {:?} artifact for {} ({} bytes)",
        strategy,
        original_name,
        bytes.len()
    );
    Ok(SignedArtifact::new(bytes, original_name))
}

pub(crate) fn save_to_bytes(doc: &mut lopdf::Document) -> Result<Vec<u8>> {
    let mut writer = Vec::new();
    doc.save_to(&mut writer)?;
    Ok(writer)
}
