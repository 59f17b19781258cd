//! XObject creation for signatures and annotation appearances

use crate::types::Result;
use image::RgbaImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

/// Embed an RGBA raster as an image XObject.
///
/// Colour goes into a DeviceRGB stream and the alpha channel into a
/// DeviceGray soft mask, so transparent background pixels stay
/// transparent on the page.
pub(crate) fn embed_rgba_image(doc: &mut Document, image: &RgbaImage) -> ObjectId {
    let (width, height) = image.dimensions();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for pixel in image.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }

    let smask_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(width as i64),
            "Height" => Object::Integer(height as i64),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => Object::Integer(8),
        },
        alpha,
    ));

    doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(width as i64),
            "Height" => Object::Integer(height as i64),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => Object::Integer(8),
            "SMask" => Object::Reference(smask_id),
        },
        rgb,
    ))
}

/// Create a Form XObject that draws an image XObject over its whole bounding box.
///
/// Used as the normal appearance of a signature stamp annotation.
pub(crate) fn create_image_form(
    doc: &mut Document,
    image_id: ObjectId,
    width: f64,
    height: f64,
) -> ObjectId {
    let resources = dictionary! {
        "XObject" => dictionary! {
            "Sig" => Object::Reference(image_id),
        },
    };
    let content = format!("q {width:.4} 0 0 {height:.4} 0 0 cm /Sig Do Q\n");

    doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "FormType" => Object::Integer(1),
            "BBox" => real_array(&[0.0, 0.0, width, height]),
            "Resources" => resources,
        },
        content.into_bytes(),
    ))
}

/// Make sure an appearance stream is usable as a Form XObject and return
/// its bounding box and matrix.
///
/// Appearance streams may omit Type/Subtype; a missing BBox falls back
/// to `fallback_bbox` (the annotation rectangle re-based at the origin).
pub(crate) fn prepare_appearance_form(
    doc: &mut Document,
    stream_id: ObjectId,
    fallback_bbox: [f64; 4],
) -> Result<([f64; 4], [f64; 6])> {
    let (bbox, matrix) = {
        let dict = &doc.get_object(stream_id)?.as_stream()?.dict;
        let bbox = dict
            .get(b"BBox")
            .ok()
            .and_then(|obj| super::rect(doc, obj))
            .unwrap_or(fallback_bbox);
        let matrix = dict
            .get(b"Matrix")
            .ok()
            .and_then(|obj| super::resolve(doc, obj).as_array().ok())
            .and_then(|arr| {
                let values: Option<Vec<f64>> = arr.iter().map(super::number).collect();
                values.and_then(|v| <[f64; 6]>::try_from(v).ok())
            })
            .unwrap_or([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        (bbox, matrix)
    };

    let dict: &mut Dictionary = &mut doc.get_object_mut(stream_id)?.as_stream_mut()?.dict;
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Form".to_vec()));
    if !dict.has(b"BBox") {
        dict.set("BBox", real_array(&bbox));
    }

    Ok((bbox, matrix))
}

pub(crate) fn real_array(values: &[f64]) -> Object {
    Object::Array(values.iter().map(|v| Object::Real(*v as f32)).collect())
}
