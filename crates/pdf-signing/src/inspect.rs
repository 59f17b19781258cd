//! Read-only inspection of PDF bytes

use crate::render::{page_box, resolve};
use crate::types::{PageDimensions, Result};
use lopdf::{Document, Object};

/// Native dimensions of every page, in page order
pub fn inspect_pdf(bytes: &[u8]) -> Result<Vec<PageDimensions>> {
    let doc = Document::load_mem(bytes)?;
    Ok(page_dimensions(&doc))
}

pub(crate) fn page_dimensions(doc: &Document) -> Vec<PageDimensions> {
    doc.get_pages()
        .values()
        .map(|&page_id| page_box(doc, page_id).dimensions())
        .collect()
}

/// Count interactive elements: page annotations plus AcroForm fields
pub fn interactive_element_count(bytes: &[u8]) -> Result<usize> {
    let doc = Document::load_mem(bytes)?;
    Ok(count_interactive_elements(&doc))
}

pub(crate) fn count_interactive_elements(doc: &Document) -> usize {
    let annotations: usize = doc
        .get_pages()
        .values()
        .filter_map(|&page_id| doc.get_dictionary(page_id).ok())
        .filter_map(|page| page.get(b"Annots").ok())
        .filter_map(|annots| resolve(doc, annots).as_array().ok())
        .map(Vec::len)
        .sum();

    let fields = doc
        .trailer
        .get(b"Root")
        .ok()
        .map(|root| resolve(doc, root))
        .and_then(|catalog| catalog.as_dict().ok())
        .and_then(|catalog| catalog.get(b"AcroForm").ok())
        .and_then(|form| resolve(doc, form).as_dict().ok())
        .and_then(|form| form.get(b"Fields").ok())
        .and_then(|fields| resolve(doc, fields).as_array().ok())
        .map_or(0, |fields: &Vec<Object>| fields.len());

    annotations + fields
}
