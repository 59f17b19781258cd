//! Page-level PDF manipulation

use crate::constants::{DEFAULT_PAGE_HEIGHT_PT, DEFAULT_PAGE_WIDTH_PT};
use crate::types::{PageDimensions, Result, SignError};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Page box as (llx, lly, width, height)
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PageBox {
    pub llx: f64,
    pub lly: f64,
    pub width: f64,
    pub height: f64,
}

impl PageBox {
    pub fn dimensions(&self) -> PageDimensions {
        PageDimensions::new(self.width, self.height)
    }
}

/// Look up the object ID of a page by zero-based index
pub(crate) fn page_id_at(doc: &Document, page_index: usize) -> Result<ObjectId> {
    let pages = doc.get_pages();
    pages
        .values()
        .nth(page_index)
        .copied()
        .ok_or_else(|| {
            SignError::input(format!(
                "Page {} is out of range (document has {} pages)",
                page_index + 1,
                pages.len()
            ))
        })
}

// =============================================================================
// Inherited Attributes
// =============================================================================

/// Find a page attribute, following the Parent chain for inherited values.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let dict = doc.get_dictionary(id).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(resolve(doc, value));
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// Follow a single reference, if the object is one
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

/// Extract numeric value from a PDF object
pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Read a four-number rectangle, normalized so the first corner is lower-left
pub(crate) fn rect(doc: &Document, obj: &Object) -> Option<[f64; 4]> {
    let arr = resolve(doc, obj).as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let values: Vec<f64> = arr
        .iter()
        .map(|o| number(resolve(doc, o)))
        .collect::<Option<_>>()?;
    Some([
        values[0].min(values[2]),
        values[1].min(values[3]),
        values[0].max(values[2]),
        values[1].max(values[3]),
    ])
}

/// Get the page's MediaBox, falling back to US Letter
pub(crate) fn page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    match inherited(doc, page_id, b"MediaBox").and_then(|mb| rect(doc, mb)) {
        Some([llx, lly, urx, ury]) if urx > llx && ury > lly => PageBox {
            llx,
            lly,
            width: urx - llx,
            height: ury - lly,
        },
        _ => PageBox {
            llx: 0.0,
            lly: 0.0,
            width: DEFAULT_PAGE_WIDTH_PT,
            height: DEFAULT_PAGE_HEIGHT_PT,
        },
    }
}

// =============================================================================
// Resources
// =============================================================================

/// Register an XObject in the page's resources under a fresh name.
///
/// The page ends up with its own direct resource dictionary (inherited or
/// referenced dictionaries are copied in) so other pages are unaffected.
pub(crate) fn register_xobject(
    doc: &mut Document,
    page_id: ObjectId,
    prefix: &str,
    xobject_id: ObjectId,
) -> Result<String> {
    let mut resources = match inherited(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };

    let mut xobjects = match resources.get(b"XObject") {
        Ok(obj) => match resolve(doc, obj) {
            Object::Dictionary(dict) => dict.clone(),
            _ => Dictionary::new(),
        },
        Err(_) => Dictionary::new(),
    };

    let name = (0..)
        .map(|n| format!("{prefix}{n}"))
        .find(|candidate| !xobjects.has(candidate.as_bytes()))
        .unwrap_or_else(|| prefix.to_string());

    xobjects.set(name.as_bytes(), Object::Reference(xobject_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    doc.get_dictionary_mut(page_id)?
        .set("Resources", Object::Dictionary(resources));

    Ok(name)
}

// =============================================================================
// Content Streams
// =============================================================================

/// Append drawing operators after the page's existing content.
///
/// The existing content is wrapped in `q`/`Q` so any graphics state it
/// leaves behind does not leak into the appended operators.
pub(crate) fn append_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    operators: &str,
) -> Result<()> {
    let existing: Vec<Object> = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(arr)) => arr.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(arr)) => arr.clone(),
        _ => Vec::new(),
    };

    let mut contents = Vec::with_capacity(existing.len() + 2);
    if existing.is_empty() {
        let id = doc.add_object(Stream::new(Dictionary::new(), operators.as_bytes().to_vec()));
        contents.push(Object::Reference(id));
    } else {
        let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let close_id = doc.add_object(Stream::new(
            Dictionary::new(),
            format!("\nQ\n{operators}").into_bytes(),
        ));
        contents.push(Object::Reference(open_id));
        contents.extend(existing);
        contents.push(Object::Reference(close_id));
    }

    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// Add an annotation reference to the page's Annots array
pub(crate) fn push_annotation(
    doc: &mut Document,
    page_id: ObjectId,
    annot_id: ObjectId,
) -> Result<()> {
    let annots_ref = match doc.get_dictionary(page_id)?.get(b"Annots") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };

    if let Some(id) = annots_ref {
        if let Ok(Object::Array(arr)) = doc.get_object_mut(id) {
            arr.push(Object::Reference(annot_id));
            return Ok(());
        }
    }

    let page = doc.get_dictionary_mut(page_id)?;
    let has_array = matches!(page.get(b"Annots"), Ok(Object::Array(_)));
    if !has_array {
        page.set("Annots", Object::Array(Vec::new()));
    }
    if let Ok(Object::Array(arr)) = page.get_mut(b"Annots") {
        arr.push(Object::Reference(annot_id));
    }
    Ok(())
}

/// Format a PDF `cm` operator followed by an XObject draw
pub(crate) fn draw_xobject_op(name: &str, matrix: [f64; 6]) -> String {
    format!(
        "q {:.4} {:.4} {:.4} {:.4} {:.4} {:.4} cm /{} Do Q\n",
        matrix[0], matrix[1], matrix[2], matrix[3], matrix[4], matrix[5], name
    )
}
