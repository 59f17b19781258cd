//! Shared constants for signing
//!
//! Magic numbers used by capture, placement and assembly live here.

// =============================================================================
// Signature Geometry
// =============================================================================

/// Width of the placed signature in native units; height follows the raster's aspect ratio
pub const DEFAULT_SIGNATURE_WIDTH: f64 = 150.0;

/// Default draw canvas width (pixels)
pub const DEFAULT_CANVAS_WIDTH_PX: u32 = 500;

/// Default draw canvas height (pixels)
pub const DEFAULT_CANVAS_HEIGHT_PX: u32 = 160;

/// Default pen diameter (pixels)
pub const DEFAULT_PEN_WIDTH_PX: f32 = 2.5;

/// Distance between pen stamps along a stroke segment (pixels)
pub const STROKE_STEP_PX: f32 = 0.5;

// =============================================================================
// Default Page Dimensions
// =============================================================================

/// Default page width in points (US Letter: 8.5" x 11")
pub const DEFAULT_PAGE_WIDTH_PT: f64 = 612.0;

/// Default page height in points (US Letter)
pub const DEFAULT_PAGE_HEIGHT_PT: f64 = 792.0;

// =============================================================================
// Viewer Scale
// =============================================================================

pub const DEFAULT_SCALE: f64 = 1.0;
pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 2.0;
pub const SCALE_STEP: f64 = 0.25;

// =============================================================================
// PDF Naming
// =============================================================================

/// Prefix for the filename of a signed artifact
pub const SIGNED_FILENAME_PREFIX: &str = "signed_";

/// Resource name prefix for embedded signature images
pub const SIGNATURE_IMAGE_PREFIX: &str = "SigImg";

/// Resource name prefix for flattened annotation appearances
pub const FLATTENED_FORM_PREFIX: &str = "FlatAnnot";

/// Every PDF file starts with this
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Largest PDF accepted for upload, in bytes (100 MiB)
pub const MAX_FILE_SIZE: usize = 100 << 20;

// =============================================================================
// Annotation Flags
// =============================================================================

/// Annotation flag: not displayed
pub const ANNOT_FLAG_HIDDEN: i64 = 1 << 1;

/// Annotation flag: printed
pub const ANNOT_FLAG_PRINT: i64 = 1 << 2;

/// Annotation flag: not displayed on screen
pub const ANNOT_FLAG_NO_VIEW: i64 = 1 << 5;
