//! PDF object model layer
//!
//! This module implements the form document model on top of lopdf: AcroForm
//! traversal, appearance generation, flattening and fixed content.

mod acroform;
mod appearance;
mod content;
mod document;
mod draw;
#[cfg(test)]
pub(crate) mod fixtures;
mod flatten;
mod fonts;
mod objects;
mod raster;

pub use document::LopdfDocument;
pub use fonts::{encode_win_ansi, text_width, wrap_lines};
