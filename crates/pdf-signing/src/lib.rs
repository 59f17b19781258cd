pub mod assemble;
mod capture;
pub mod constants;
pub mod coords;
mod inspect;
mod render;
mod types;
pub mod viewer;

pub use assemble::{AssemblyInput, AssemblyStrategy, assemble, assemble_blocking};
pub use capture::{CaptureSettings, SignatureCapture, SignatureRaster, Stroke};
pub use inspect::{inspect_pdf, interactive_element_count};
pub use types::*;
pub use viewer::{ViewerCapability, ViewerStatus, create_viewer};
