use super::{ViewerCapability, ViewerStatus};
use crate::capture::SignatureRaster;
use crate::constants::ANNOT_FLAG_PRINT;
use crate::render::{
    create_image_form, embed_rgba_image, page_box, page_id_at, push_annotation, real_array,
};
use crate::types::{PlacementAnchor, Result, SignError, SourceDocument, ViewerKind};
use image::RgbaImage;
use lopdf::{Document, Object, StringFormat, dictionary};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Document slot filled by the background load.
///
/// `generation` increases on every load/unload so a slow parse of a
/// previous document can never overwrite a newer one.
#[derive(Default)]
struct LoadSlot {
    generation: u64,
    document: Option<Document>,
}

/// A signature stamp waiting in the annotation store
#[derive(Debug, Clone)]
struct PendingStamp {
    anchor: PlacementAnchor,
    image: RgbaImage,
    width: f64,
    height: f64,
}

/// Viewer with its own annotation store.
///
/// Documents are parsed on a blocking task; until that finishes the
/// viewer reports [`ViewerStatus::Loading`] and refuses annotation work.
/// Placed signatures stay in the store as pending stamp annotations and
/// are only written into the document by
/// [`ViewerCapability::serialize_with_annotations`].
pub struct InteractiveViewer {
    slot: Arc<Mutex<LoadSlot>>,
    status: Arc<watch::Sender<ViewerStatus>>,
    pending: Vec<PendingStamp>,
}

impl Default for InteractiveViewer {
    fn default() -> Self {
        Self::new()
    }
}

fn lock(slot: &Mutex<LoadSlot>) -> MutexGuard<'_, LoadSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InteractiveViewer {
    pub fn new() -> Self {
        let (status, _) = watch::channel(ViewerStatus::Idle);
        Self {
            slot: Arc::new(Mutex::new(LoadSlot::default())),
            status: Arc::new(status),
            pending: Vec::new(),
        }
    }
}

impl ViewerCapability for InteractiveViewer {
    fn kind(&self) -> ViewerKind {
        ViewerKind::Interactive
    }

    fn load_document(&mut self, document: &SourceDocument) {
        self.pending.clear();
        let generation = {
            let mut slot = lock(&self.slot);
            slot.generation += 1;
            slot.document = None;
            slot.generation
        };
        self.status.send_replace(ViewerStatus::Loading);

        let bytes = document.bytes().clone();
        let slot = Arc::clone(&self.slot);
        let status = Arc::clone(&self.status);
        let parse = move || {
            let parsed = Document::load_mem(&bytes);
            let mut slot = lock(&slot);
            if slot.generation != generation {
                log::debug!("Discarding superseded viewer load (generation {generation})");
                return;
            }
            match parsed {
                Ok(doc) => {
                    slot.document = Some(doc);
                    status.send_replace(ViewerStatus::Ready);
                }
                Err(e) => {
                    log::warn!("Interactive viewer failed to open document: {e}");
                    status.send_replace(ViewerStatus::Failed);
                }
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(parse);
            }
            Err(_) => parse(),
        }
    }

    fn status(&self) -> ViewerStatus {
        *self.status.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<ViewerStatus> {
        self.status.subscribe()
    }

    fn annotation_count(&self) -> usize {
        self.pending.len()
    }

    fn place_signature(
        &mut self,
        anchor: &PlacementAnchor,
        signature: &SignatureRaster,
        width: f64,
    ) -> Result<()> {
        {
            let slot = lock(&self.slot);
            let doc = slot.document.as_ref().ok_or(SignError::ViewerNotReady)?;
            page_id_at(doc, anchor.page_index)?;
        }

        self.pending = vec![PendingStamp {
            anchor: *anchor,
            image: signature.image().clone(),
            width,
            height: signature.native_height(width),
        }];
        Ok(())
    }

    fn clear_signature(&mut self) {
        self.pending.clear();
    }

    fn serialize_with_annotations(&self) -> Result<Vec<u8>> {
        let mut doc = lock(&self.slot)
            .document
            .clone()
            .ok_or(SignError::ViewerNotReady)?;

        if self.pending.is_empty() {
            return Err(SignError::input(
                "Please place your signature in the document viewer",
            ));
        }

        for stamp in &self.pending {
            add_signature_stamp(&mut doc, stamp)?;
        }

        let mut writer = Vec::new();
        doc.save_to(&mut writer)?;
        Ok(writer)
    }

    fn unload(&mut self) {
        self.pending.clear();
        {
            let mut slot = lock(&self.slot);
            slot.generation += 1;
            slot.document = None;
        }
        self.status.send_replace(ViewerStatus::Idle);
    }
}

/// Write a pending stamp into the document as a Stamp annotation whose
/// normal appearance draws the signature image.
fn add_signature_stamp(doc: &mut Document, stamp: &PendingStamp) -> Result<()> {
    let page_id = page_id_at(doc, stamp.anchor.page_index)?;
    let bounds = page_box(doc, page_id);
    let x = bounds.llx + stamp.anchor.native_x;
    let y = bounds.lly + stamp.anchor.native_y;

    let image_id = embed_rgba_image(doc, &stamp.image);
    let form_id = create_image_form(doc, image_id, stamp.width, stamp.height);

    let annot_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Stamp",
        "Rect" => real_array(&[x, y, x + stamp.width, y + stamp.height]),
        "F" => Object::Integer(ANNOT_FLAG_PRINT),
        "P" => Object::Reference(page_id),
        "Contents" => Object::String(b"Signature".to_vec(), StringFormat::Literal),
        "AP" => dictionary! {
            "N" => Object::Reference(form_id),
        },
    });

    push_annotation(doc, page_id, annot_id)
}
