//! Form field reconciliation and overlay compositing
//!
//! This module turns a document's native field/widget tree into a
//! client-addressable field list and re-applies client edits to it:
//! - `extract`: page dimensions plus the client field list
//! - `reconcile`: edit grouping and per-widget state decisions
//! - `overlay`: free-form text and image placement
//!
//! It works against the [`DocumentModel`] trait only; see `crate::pdf` for
//! the lopdf-backed implementation.

mod appearance;
mod classify;
mod extract;
mod geometry;
mod model;
mod overlay;
mod reconcile;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use appearance::{base_name, is_true, on_state, widget_index, DEFAULT_ON_STATE, OFF_STATE};
pub use classify::classify;
pub use extract::extract_fields;
pub use geometry::{field_geometry, widget_geometry};
pub use model::{
    Decorations, DocumentModel, FormType, ImagePlacement, NativeField, Rgb, StandardFamily,
    StandardFont, TextPlacement, Widget, WidgetId,
};
pub use overlay::{
    compose_overlays, image_placement, parse_hex_color, resolve_font, text_placement,
    OverlayReport, DEFAULT_WRAP_WIDTH,
};
pub use reconcile::{
    group_edits, plan_widget_states, reconcile_fields, EditGroup, ReconcileReport,
    WidgetStatePlan,
};
pub use types::{
    ApplyReport, Bounds, ClientField, ExtractedForm, FieldType, ImageOverlayElement,
    PageDimension, SkipReason, TextOverlayElement,
};

use crate::error::Result;

/// Apply field edits, flatten the form once, then draw overlays on top.
///
/// Per-group and per-element failures are collected in the report. Only a
/// failing flatten is returned as an error, since the output would still be
/// editable.
pub fn apply_edits(
    doc: &mut dyn DocumentModel,
    edits: &[ClientField],
    texts: &[TextOverlayElement],
    images: &[ImageOverlayElement],
) -> Result<ApplyReport> {
    let reconciled = reconcile_fields(doc, edits);

    doc.flatten_all_fields()?;

    let overlays = compose_overlays(doc, texts, images);

    let mut skipped = reconciled.skipped;
    skipped.extend(overlays.skipped);

    Ok(ApplyReport {
        groups_applied: reconciled.groups_applied,
        groups_ignored: reconciled.groups_ignored,
        overlays_placed: overlays.placed,
        skipped,
    })
}
