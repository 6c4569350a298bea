//! Widget geometry resolution

use super::model::{NativeField, Widget};
use super::types::Bounds;

/// Page number and bounds of a single widget. Never fails: a missing or
/// short rectangle yields the zero rectangle, an unknown page yields 1.
pub fn widget_geometry(widget: &Widget) -> (u32, Bounds) {
    let page = widget.page.unwrap_or(1);
    (page, rect_bounds(widget.rect.as_deref()))
}

/// Geometry of a field addressed directly, taken from its first widget
pub fn field_geometry(field: &NativeField) -> (u32, Bounds) {
    field
        .widgets
        .first()
        .map(widget_geometry)
        .unwrap_or((1, Bounds::default()))
}

/// Width and height are signed differences; inverted rectangles stay negative
fn rect_bounds(rect: Option<&[Option<f64>]>) -> Bounds {
    match rect {
        Some(r) if r.len() >= 4 => {
            let c = |i: usize| r[i].unwrap_or(0.0);
            Bounds {
                x: c(0),
                y: c(1),
                width: c(2) - c(0),
                height: c(3) - c(1),
            }
        }
        _ => Bounds::default(),
    }
}
