//! Annotation flatten: bake annotation appearances into page content

use crate::constants::{ANNOT_FLAG_HIDDEN, ANNOT_FLAG_NO_VIEW, FLATTENED_FORM_PREFIX};
use crate::render::{
    append_page_content, draw_xobject_op, number, prepare_appearance_form, rect,
    register_xobject, resolve,
};
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Convert every annotation and form field into fixed page content.
///
/// Annotations with a normal appearance are drawn into their page at
/// their rectangle; annotations without one (or hidden ones) are dropped.
/// The AcroForm is removed from the catalog. A document with nothing to
/// flatten is re-serialized unchanged in meaning.
pub fn flatten_annotations(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut doc = Document::load_mem(bytes)?;

    let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();
    let mut flattened = 0;
    for page_id in page_ids {
        flattened += flatten_page(&mut doc, page_id)?;
    }
    remove_acroform(&mut doc)?;
    doc.prune_objects();

    log::debug!("Flattened {} annotation appearance(s)", flattened);
    super::save_to_bytes(&mut doc)
}

/// Flatten one page, returning how many appearances were drawn.
fn flatten_page(doc: &mut Document, page_id: ObjectId) -> Result<usize> {
    let annotations = page_annotations(doc, page_id)?;
    let mut operators = String::new();
    let mut drawn = 0;

    for annot in &annotations {
        let Some(annot_rect) = annot.get(b"Rect").ok().and_then(|r| rect(doc, r)) else {
            continue;
        };
        let Some(appearance_id) = visible_appearance(doc, annot) else {
            continue;
        };

        let [rx0, ry0, rx1, ry1] = annot_rect;
        let fallback_bbox = [0.0, 0.0, rx1 - rx0, ry1 - ry0];
        let (bbox, matrix) = prepare_appearance_form(doc, appearance_id, fallback_bbox)?;

        let Some(placement) = placement_matrix(annot_rect, bbox, matrix) else {
            continue;
        };
        let name = register_xobject(doc, page_id, FLATTENED_FORM_PREFIX, appearance_id)?;
        operators.push_str(&draw_xobject_op(&name, placement));
        drawn += 1;
    }

    doc.get_dictionary_mut(page_id)?.remove(b"Annots");
    if !operators.is_empty() {
        append_page_content(doc, page_id, &operators)?;
    }
    Ok(drawn)
}

/// Resolved copies of the page's annotation dictionaries
fn page_annotations(doc: &Document, page_id: ObjectId) -> Result<Vec<Dictionary>> {
    let page = doc.get_dictionary(page_id)?;
    let Ok(annots) = page.get(b"Annots") else {
        return Ok(Vec::new());
    };
    let Ok(entries) = resolve(doc, annots).as_array() else {
        return Ok(Vec::new());
    };

    Ok(entries
        .iter()
        .filter_map(|entry| resolve(doc, entry).as_dict().ok())
        .cloned()
        .collect())
}

/// Object ID of the appearance stream that should be drawn, if any.
///
/// Inline appearance streams are moved into their own objects so they
/// can be referenced from the page resources.
fn visible_appearance(doc: &mut Document, annot: &Dictionary) -> Option<ObjectId> {
    if annot
        .get(b"Subtype")
        .and_then(Object::as_name)
        .is_ok_and(|subtype| subtype == b"Popup")
    {
        return None;
    }

    let flags = annot.get(b"F").ok().and_then(number).unwrap_or(0.0) as i64;
    if flags & (ANNOT_FLAG_HIDDEN | ANNOT_FLAG_NO_VIEW) != 0 {
        return None;
    }

    let normal = {
        let ap = resolve(doc, annot.get(b"AP").ok()?).as_dict().ok()?;
        let normal = ap.get(b"N").ok()?;
        match resolve(doc, normal) {
            Object::Stream(_) => normal.clone(),
            Object::Dictionary(states) => {
                let state = annot.get(b"AS").ok()?.as_name().ok()?;
                states.get(state).ok()?.clone()
            }
            _ => return None,
        }
    };

    match normal {
        Object::Reference(id) => match doc.get_object(id) {
            Ok(Object::Stream(_)) => Some(id),
            _ => None,
        },
        Object::Stream(stream) => Some(doc.add_object(stream)),
        _ => None,
    }
}

/// Matrix mapping the appearance's transformed bounding box onto the
/// annotation rectangle.
fn placement_matrix(rect: [f64; 4], bbox: [f64; 4], matrix: [f64; 6]) -> Option<[f64; 6]> {
    let [a, b, c, d, e, f] = matrix;
    let corners = [
        (bbox[0], bbox[1]),
        (bbox[2], bbox[1]),
        (bbox[0], bbox[3]),
        (bbox[2], bbox[3]),
    ]
    .map(|(x, y)| (a * x + c * y + e, b * x + d * y + f));

    let min_x = corners.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    let box_width = max_x - min_x;
    let box_height = max_y - min_y;
    if box_width.abs() < f64::EPSILON || box_height.abs() < f64::EPSILON {
        return None;
    }

    let sx = (rect[2] - rect[0]) / box_width;
    let sy = (rect[3] - rect[1]) / box_height;
    Some([sx, 0.0, 0.0, sy, rect[0] - min_x * sx, rect[1] - min_y * sy])
}

fn remove_acroform(doc: &mut Document) -> Result<()> {
    let Ok(root_id) = doc.trailer.get(b"Root").and_then(Object::as_reference) else {
        return Ok(());
    };
    if let Ok(catalog) = doc.get_dictionary_mut(root_id) {
        catalog.remove(b"AcroForm");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

    #[test]
    fn placement_maps_bbox_onto_rect() {
        let rect = [100.0, 200.0, 250.0, 250.0];
        let m = placement_matrix(rect, [0.0, 0.0, 150.0, 50.0], IDENTITY).unwrap();
        assert_eq!(m, [1.0, 0.0, 0.0, 1.0, 100.0, 200.0]);
    }

    #[test]
    fn placement_scales_and_offsets_bbox() {
        let rect = [0.0, 0.0, 100.0, 100.0];
        let m = placement_matrix(rect, [10.0, 10.0, 60.0, 60.0], IDENTITY).unwrap();
        assert_eq!(m, [2.0, 0.0, 0.0, 2.0, -20.0, -20.0]);
    }

    #[test]
    fn rotated_appearance_uses_transformed_bbox() {
        // 90 degree rotation turns a 40x20 box into a 20x40 one
        let matrix = [0.0, 1.0, -1.0, 0.0, 0.0, 0.0];
        let m = placement_matrix([0.0, 0.0, 20.0, 40.0], [0.0, 0.0, 40.0, 20.0], matrix).unwrap();
        assert_eq!(m, [1.0, 0.0, 0.0, 1.0, 20.0, 0.0]);
    }

    #[test]
    fn degenerate_bbox_is_skipped() {
        let rect = [0.0, 0.0, 10.0, 10.0];
        assert!(placement_matrix(rect, [5.0, 5.0, 5.0, 9.0], IDENTITY).is_none());
    }
}
