//! Signature capture: freehand drawing or image upload

use crate::constants::{
    DEFAULT_CANVAS_HEIGHT_PX, DEFAULT_CANVAS_WIDTH_PX, DEFAULT_PEN_WIDTH_PX, STROKE_STEP_PX,
};
use crate::coords::signature_native_height;
use crate::types::{CaptureMode, Result, SignError};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Draw canvas configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CaptureSettings {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub pen_width: f32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            canvas_width: DEFAULT_CANVAS_WIDTH_PX,
            canvas_height: DEFAULT_CANVAS_HEIGHT_PX,
            pen_width: DEFAULT_PEN_WIDTH_PX,
        }
    }
}

/// A single pen-down to pen-up path, in canvas pixels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stroke {
    points: Vec<(f32, f32)>,
}

impl Stroke {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: impl IntoIterator<Item = (f32, f32)>) -> Self {
        Self {
            points: points.into_iter().collect(),
        }
    }

    pub fn push(&mut self, x: f32, y: f32) {
        self.points.push((x, y));
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(f32, f32)] {
        &self.points
    }
}

/// RGBA signature image on a transparent background
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureRaster {
    image: RgbaImage,
}

impl SignatureRaster {
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Decode any supported image format into a raster
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        if image.width() == 0 || image.height() == 0 {
            return Err(SignError::Encoding("signature image has no pixels".into()));
        }
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Native height when drawn `width` units wide
    pub fn native_height(&self, width: f64) -> f64 {
        signature_native_height(self.width(), self.height(), width)
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        self.image.write_to(&mut out, ImageFormat::Png)?;
        Ok(out.into_inner())
    }
}

/// Collects the signer's signature in one of two modes.
///
/// Each mode keeps its own raster; switching modes leaves the other
/// mode's raster alone until [`SignatureCapture::clear`] or a new capture
/// replaces it.
#[derive(Debug, Clone)]
pub struct SignatureCapture {
    settings: CaptureSettings,
    mode: CaptureMode,
    strokes: Vec<Stroke>,
    drawn: Option<SignatureRaster>,
    uploaded: Option<SignatureRaster>,
}

impl Default for SignatureCapture {
    fn default() -> Self {
        Self::new(CaptureSettings::default())
    }
}

impl SignatureCapture {
    pub fn new(settings: CaptureSettings) -> Self {
        Self {
            settings,
            mode: CaptureMode::Draw,
            strokes: Vec::new(),
            drawn: None,
            uploaded: None,
        }
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CaptureMode) {
        self.mode = mode;
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Commit a finished stroke and redraw the canvas raster.
    ///
    /// Strokes without points are ignored. Returns whether a signature is
    /// available afterwards.
    pub fn commit_stroke(&mut self, stroke: Stroke) -> bool {
        if stroke.is_empty() {
            return !self.is_empty();
        }
        self.mode = CaptureMode::Draw;
        self.strokes.push(stroke);
        self.drawn = Some(SignatureRaster::from_image(rasterize_strokes(
            &self.strokes,
            &self.settings,
        )));
        !self.is_empty()
    }

    /// Replace the uploaded raster with a decoded image file
    pub fn load_upload(&mut self, bytes: &[u8]) -> Result<()> {
        let raster = SignatureRaster::decode(bytes)?;
        self.mode = CaptureMode::Upload;
        self.uploaded = Some(raster);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.raster().is_none()
    }

    /// Raster of the active mode, if one has been captured
    pub fn raster(&self) -> Option<&SignatureRaster> {
        match self.mode {
            CaptureMode::Draw => self.drawn.as_ref(),
            CaptureMode::Upload => self.uploaded.as_ref(),
        }
    }

    /// PNG encoding of the active raster
    pub fn export_raster(&self) -> Result<Vec<u8>> {
        self.raster()
            .ok_or_else(|| SignError::input("Please add your signature"))?
            .to_png()
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.drawn = None;
        self.uploaded = None;
    }
}

/// Render strokes as black pen marks on a transparent canvas.
fn rasterize_strokes(strokes: &[Stroke], settings: &CaptureSettings) -> RgbaImage {
    let mut canvas = RgbaImage::new(settings.canvas_width.max(1), settings.canvas_height.max(1));
    let radius = (settings.pen_width / 2.0).max(0.5);

    for stroke in strokes {
        let points = stroke.points();
        if let [only] = points {
            stamp(&mut canvas, only.0, only.1, radius);
            continue;
        }
        for segment in points.windows(2) {
            let (x0, y0) = segment[0];
            let (x1, y1) = segment[1];
            let length = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
            let steps = (length / STROKE_STEP_PX).ceil().max(1.0) as u32;
            for i in 0..=steps {
                let t = i as f32 / steps as f32;
                stamp(&mut canvas, x0 + (x1 - x0) * t, y0 + (y1 - y0) * t, radius);
            }
        }
    }

    canvas
}

/// Stamp an anti-aliased pen disc centred on (cx, cy).
fn stamp(canvas: &mut RgbaImage, cx: f32, cy: f32, radius: f32) {
    let (width, height) = canvas.dimensions();
    let min_x = (cx - radius - 1.0).floor().max(0.0) as u32;
    let min_y = (cy - radius - 1.0).floor().max(0.0) as u32;
    let max_x = ((cx + radius + 1.0).ceil().max(0.0) as u32).min(width);
    let max_y = ((cy + radius + 1.0).ceil().max(0.0) as u32).min(height);

    for y in min_y..max_y {
        for x in min_x..max_x {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let coverage = (radius + 0.5 - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
            if coverage <= 0.0 {
                continue;
            }
            let alpha = (coverage * 255.0).round() as u8;
            let pixel = canvas.get_pixel_mut(x, y);
            if alpha > pixel[3] {
                *pixel = Rgba([0, 0, 0, alpha]);
            }
        }
    }
}
