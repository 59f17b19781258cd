//! Low-level PDF object helpers shared by assembly and the interactive viewer
//!
//! - Resolving page geometry and resources (including inherited values)
//! - Registering XObjects on a page and appending drawing operators
//! - Building image XObjects from RGBA rasters

mod page;
mod xobject;

pub(crate) use page::*;
pub(crate) use xobject::*;
