//! Overlay compositor: free-form text and images at absolute coordinates

use super::model::{
    Decorations, DocumentModel, ImagePlacement, Rgb, StandardFamily, StandardFont, TextPlacement,
};
use super::types::{ImageOverlayElement, SkipReason, TextOverlayElement};
use crate::error::Result;
use base64::Engine;

/// Wrap width used when an element carries no positive width
pub const DEFAULT_WRAP_WIDTH: f64 = 200.0;

/// Font family used when an element names none
pub const DEFAULT_FONT_FAMILY: &str = "Arial";

const DEFAULT_FONT_SIZE: f64 = 12.0;

/// Outcome of placing overlay elements
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OverlayReport {
    pub placed: u32,
    pub skipped: Vec<SkipReason>,
}

/// Resolve a free-form family name plus style flags to a standard font.
/// Unknown families fall back to Helvetica.
pub fn resolve_font(family: &str, bold: bool, italic: bool) -> StandardFont {
    let key = family.trim();
    let key = if key.is_empty() { DEFAULT_FONT_FAMILY } else { key };
    let family = match key.to_lowercase().as_str() {
        "arial" | "helvetica" | "verdana" => StandardFamily::Helvetica,
        "times" | "times new roman" | "georgia" => StandardFamily::Times,
        "courier" | "courier new" => StandardFamily::Courier,
        "symbol" => StandardFamily::Symbol,
        "zapfdingbats" => StandardFamily::ZapfDingbats,
        _ => StandardFamily::Helvetica,
    };
    StandardFont {
        family,
        bold,
        italic,
    }
}

/// Parse `#RGB` or `#RRGGBB`. Anything else yields `None`.
pub fn parse_hex_color(color: &str) -> Option<Rgb> {
    let hex = color.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    Some(Rgb {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}

/// Turn a text element into a placement
pub fn text_placement(element: &TextOverlayElement) -> TextPlacement {
    let width = if element.bounds.width > 0.0 {
        element.bounds.width
    } else {
        DEFAULT_WRAP_WIDTH
    };
    let size = if element.font_size > 0 {
        f64::from(element.font_size)
    } else {
        DEFAULT_FONT_SIZE
    };
    TextPlacement {
        x: element.bounds.x,
        y: element.bounds.y,
        width,
        text: element.text.clone(),
        font: resolve_font(&element.font_family, element.bold, element.italic),
        size,
        color: parse_hex_color(&element.color),
        decorations: Decorations {
            underline: element.underline,
            strike: element.strike,
        },
    }
}

/// Decode an image element into a placement
pub fn image_placement(element: &ImageOverlayElement) -> Result<ImagePlacement> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(element.image_data.trim())?;
    let fit = (element.bounds.width > 0.0 && element.bounds.height > 0.0)
        .then_some((element.bounds.width, element.bounds.height));
    Ok(ImagePlacement {
        x: element.bounds.x,
        y: element.bounds.y,
        fit,
        bytes,
    })
}

/// Place every text element then every image element. A failing element is
/// logged and skipped; the rest still get placed.
pub fn compose_overlays(
    doc: &mut dyn DocumentModel,
    texts: &[TextOverlayElement],
    images: &[ImageOverlayElement],
) -> OverlayReport {
    let mut report = OverlayReport::default();

    for element in texts {
        let placement = text_placement(element);
        match doc.add_fixed_text(element.page_number, &placement) {
            Ok(()) => report.placed += 1,
            Err(e) => {
                tracing::warn!(id = %element.id, error = %e, "Add text failed");
                report.skipped.push(SkipReason::new(&element.id, e));
            }
        }
    }

    for element in images {
        let placed = image_placement(element)
            .and_then(|placement| doc.add_fixed_image(element.page_number, &placement));
        match placed {
            Ok(()) => report.placed += 1,
            Err(e) => {
                tracing::warn!(id = %element.id, error = %e, "Add image failed");
                report.skipped.push(SkipReason::new(&element.id, e));
            }
        }
    }

    report
}
