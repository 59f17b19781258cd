//! Raster composite: embed the signature image on the target page

use crate::constants::SIGNATURE_IMAGE_PREFIX;
use crate::coords::signature_native_height;
use crate::render::{
    append_page_content, draw_xobject_op, embed_rgba_image, page_box, page_id_at,
    register_xobject,
};
use crate::types::*;
use lopdf::Document;

/// Draw a PNG signature onto the source document at `anchor`.
///
/// The signature is `signature_width` native units wide; its height keeps
/// the raster's aspect ratio. Fails with `Format` when the source does not
/// parse and with `Encoding` when the raster cannot be decoded.
pub fn composite_signature(
    source: &[u8],
    signature_png: &[u8],
    anchor: &PlacementAnchor,
    signature_width: f64,
) -> Result<Vec<u8>> {
    if !(signature_width.is_finite() && signature_width > 0.0) {
        return Err(SignError::input("Signature width must be positive"));
    }
    if !(anchor.native_x.is_finite() && anchor.native_y.is_finite()) {
        return Err(SignError::input("Signature position is not a valid page coordinate"));
    }

    let mut doc = Document::load_mem(source)?;

    let image = image::load_from_memory(signature_png)?.to_rgba8();
    let (raster_width, raster_height) = image.dimensions();
    if raster_width == 0 || raster_height == 0 {
        return Err(SignError::Encoding("signature image has no pixels".into()));
    }

    let page_id = page_id_at(&doc, anchor.page_index)?;
    let bounds = page_box(&doc, page_id);
    let height = signature_native_height(raster_width, raster_height, signature_width);

    let image_id = embed_rgba_image(&mut doc, &image);
    let name = register_xobject(&mut doc, page_id, SIGNATURE_IMAGE_PREFIX, image_id)?;

    let operators = draw_xobject_op(
        &name,
        [
            signature_width,
            0.0,
            0.0,
            height,
            bounds.llx + anchor.native_x,
            bounds.lly + anchor.native_y,
        ],
    );
    append_page_content(&mut doc, page_id, &operators)?;

    log::debug!(
        "Composited {}x{} px signature on page {} at ({:.2}, {:.2})",
        raster_width,
        raster_height,
        anchor.page_index + 1,
        anchor.native_x,
        anchor.native_y
    );

    super::save_to_bytes(&mut doc)
}
