#![allow(dead_code)]

use image::{ImageFormat, Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::io::Cursor;

pub fn save(doc: &mut Document) -> Vec<u8> {
    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    writer
}

/// Build a document whose pages have the given MediaBox sizes
pub fn create_pdf_with_sizes(sizes: &[(i64, i64)]) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for &(width, height) in sizes {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(width),
                    Object::Integer(height),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(sizes.len() as i64)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    doc
}

pub fn create_test_pdf(num_pages: usize) -> Vec<u8> {
    save(&mut create_pdf_with_sizes(&vec![(612, 792); num_pages]))
}

fn appearance(doc: &mut Document, width: i64, height: i64, ops: &str) -> ObjectId {
    doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width),
                Object::Integer(height),
            ],
        },
        ops.as_bytes().to_vec(),
    ))
}

fn rect(x0: i64, y0: i64, x1: i64, y1: i64) -> Object {
    Object::Array(vec![
        Object::Integer(x0),
        Object::Integer(y0),
        Object::Integer(x1),
        Object::Integer(y1),
    ])
}

/// One page carrying a square annotation, a popup, a text field and a
/// checked checkbox field. Six interactive elements in total: four
/// annotations plus two AcroForm fields.
pub fn create_annotated_pdf() -> Vec<u8> {
    let mut doc = create_pdf_with_sizes(&[(612, 792)]);
    let page_id = *doc.get_pages().get(&1).unwrap();

    let square_ap = appearance(&mut doc, 50, 20, "0 0 1 rg 0 0 50 20 re f");
    let square = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Square",
        "Rect" => rect(100, 100, 150, 120),
        "AP" => dictionary! { "N" => square_ap },
    });

    let popup = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Popup",
        "Rect" => rect(200, 200, 300, 260),
    });

    let text_ap = appearance(&mut doc, 120, 18, "/Tx BMC EMC");
    let text_field = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Tx",
        "T" => Object::string_literal("name"),
        "V" => Object::string_literal("Jane Doe"),
        "Rect" => rect(72, 600, 192, 618),
        "AP" => dictionary! { "N" => text_ap },
    });

    let on_ap = appearance(&mut doc, 12, 12, "0 g 2 2 8 8 re f");
    let off_ap = appearance(&mut doc, 12, 12, "");
    let checkbox = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Btn",
        "T" => Object::string_literal("agree"),
        "V" => "Yes",
        "AS" => "Yes",
        "Rect" => rect(72, 560, 84, 572),
        "AP" => dictionary! {
            "N" => dictionary! { "Yes" => on_ap, "Off" => off_ap },
        },
    });

    doc.get_dictionary_mut(page_id).unwrap().set(
        "Annots",
        vec![
            Object::Reference(square),
            Object::Reference(popup),
            Object::Reference(text_field),
            Object::Reference(checkbox),
        ],
    );

    let acroform = doc.add_object(dictionary! {
        "Fields" => vec![Object::Reference(text_field), Object::Reference(checkbox)],
    });
    let root_id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
    doc.get_dictionary_mut(root_id)
        .unwrap()
        .set("AcroForm", acroform);

    save(&mut doc)
}

/// A `width` x `height` PNG with a black diagonal line on transparency
pub fn signature_png(width: u32, height: u32) -> Vec<u8> {
    let mut image = RgbaImage::new(width, height);
    for x in 0..width {
        let y = (x as u64 * height as u64 / width as u64) as u32;
        image.put_pixel(x, y.min(height - 1), Rgba([0, 0, 0, 255]));
    }
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Concatenated content of the page at `index`
pub fn page_content(bytes: &[u8], index: usize) -> String {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = *doc.get_pages().values().nth(index).unwrap();
    String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
}
