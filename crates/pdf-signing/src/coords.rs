//! Conversions between rendered viewport pixels and native page space.
//!
//! Rendered coordinates have their origin at the top-left of the rendered
//! page and grow downwards. Native coordinates are PDF user space units
//! and are independent of zoom. A [`PlacementAnchor`] is always stored in
//! native space with a bottom-left origin; its on-screen position is
//! recomputed for whatever scale is current.

use crate::types::{PageDimensions, PlacementAnchor};

/// A point in rendered pixels, relative to the top-left of the rendered page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPoint {
    pub x: f64,
    pub y: f64,
}

impl RenderPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point in native units, still measured from the top-left of the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativePoint {
    pub x: f64,
    pub y: f64,
}

impl NativePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Rendered rectangle of the signature overlay, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// `scale` is rendered pixels per native unit and must be positive.
pub fn render_to_native(point: RenderPoint, scale: f64) -> NativePoint {
    NativePoint::new(point.x / scale, point.y / scale)
}

pub fn native_to_render(point: NativePoint, scale: f64) -> RenderPoint {
    RenderPoint::new(point.x * scale, point.y * scale)
}

/// Native height of a signature raster drawn `width` units wide
pub fn signature_native_height(raster_width: u32, raster_height: u32, width: f64) -> f64 {
    if raster_width == 0 {
        return 0.0;
    }
    width * raster_height as f64 / raster_width as f64
}

/// Whether a rendered point falls on the rendered page
pub fn is_within_page(point: RenderPoint, page: PageDimensions, scale: f64) -> bool {
    point.x >= 0.0
        && point.y >= 0.0
        && point.x <= page.width * scale
        && point.y <= page.height * scale
}

/// Anchor a signature whose top-left corner sits under `point`.
pub fn anchor_from_render(
    page_index: usize,
    page: PageDimensions,
    point: RenderPoint,
    scale: f64,
    signature_height: f64,
) -> PlacementAnchor {
    let native = render_to_native(point, scale);
    PlacementAnchor {
        page_index,
        native_x: native.x,
        native_y: page.height - native.y - signature_height,
    }
}

/// Rendered top-left corner of an anchored signature at `scale`
pub fn anchor_to_render(
    anchor: &PlacementAnchor,
    page: PageDimensions,
    scale: f64,
    signature_height: f64,
) -> RenderPoint {
    RenderPoint::new(
        anchor.native_x * scale,
        (page.height - anchor.native_y - signature_height) * scale,
    )
}

/// Rendered box covered by an anchored signature at `scale`
pub fn anchor_render_rect(
    anchor: &PlacementAnchor,
    page: PageDimensions,
    scale: f64,
    signature_width: f64,
    signature_height: f64,
) -> RenderRect {
    let origin = anchor_to_render(anchor, page, scale, signature_height);
    RenderRect {
        x: origin.x,
        y: origin.y,
        width: signature_width * scale,
        height: signature_height * scale,
    }
}
