//! Field extraction pipeline
//!
//! Builds the client field list from a native document. Checkbox fields
//! backed by more than one widget are expanded into one `name#i`
//! pseudo-field per widget; everything else converts one-to-one.

use super::appearance::{base_name, is_checked_value, on_state, pseudo_field_name};
use super::classify::classify;
use super::geometry::{field_geometry, widget_geometry};
use super::model::{DocumentModel, NativeField};
use super::types::{ClientField, ExtractedForm, FieldType, PageDimension, SkipReason};

/// Read page sizes and all fields. Never fails as a whole: unreadable page
/// sizes become `(0, 0)` and unreadable fields are skipped.
pub fn extract_fields(doc: &dyn DocumentModel) -> ExtractedForm {
    let page_count = doc.page_count();
    let page_dimensions = (1..=page_count)
        .map(|page_number| {
            let (width, height) = doc.page_size(page_number).unwrap_or_else(|e| {
                tracing::warn!(page = page_number, error = %e, "Page size unreadable");
                (0.0, 0.0)
            });
            PageDimension {
                page_number,
                width,
                height,
            }
        })
        .collect();

    let mut fields = Vec::new();
    let mut skipped = Vec::new();

    for (index, native) in doc.fields().into_iter().enumerate() {
        let outcome = native
            .map_err(|e| SkipReason::new(format!("<field {}>", index + 1), e))
            .and_then(|native| convert(&native));
        match outcome {
            Ok(converted) => fields.extend(converted),
            Err(skip) => {
                tracing::warn!(field = %skip.target, reason = %skip.reason, "Extract field failed");
                skipped.push(skip);
            }
        }
    }

    ExtractedForm {
        page_count,
        page_dimensions,
        fields,
        skipped,
    }
}

fn convert(field: &NativeField) -> Result<Vec<ClientField>, SkipReason> {
    if field.name.is_empty() {
        return Err(SkipReason::new("<unnamed>", "field has no name"));
    }
    let field_type = classify(field);
    let pseudo_capable = matches!(field_type, FieldType::Checkbox | FieldType::RadioButton);
    if pseudo_capable && base_name(&field.name) != field.name {
        return Err(SkipReason::new(
            &field.name,
            "checkbox name ends in a reserved '#index' suffix",
        ));
    }
    if field_type == FieldType::Checkbox && field.widgets.len() > 1 {
        return Ok(expand_group(field));
    }
    Ok(vec![convert_direct(field, field_type)])
}

/// One pseudo-field per widget of a multi-widget checkbox
fn expand_group(field: &NativeField) -> Vec<ClientField> {
    let current = field.value_str();
    field
        .widgets
        .iter()
        .enumerate()
        .map(|(i, widget)| {
            let is_on = is_checked_value(current) && current == on_state(field, widget);
            let (page_number, bounds) = widget_geometry(widget);
            ClientField {
                name: pseudo_field_name(&field.name, i + 1),
                field_type: FieldType::Checkbox,
                value: is_on.to_string(),
                is_required: false,
                page_number,
                bounds,
            }
        })
        .collect()
}

fn convert_direct(field: &NativeField, field_type: FieldType) -> ClientField {
    let raw = field.value_str();
    let value = match field_type {
        FieldType::Checkbox => is_checked_value(raw).to_string(),
        _ => raw.to_string(),
    };
    let (page_number, bounds) = field_geometry(field);
    ClientField {
        name: field.name.clone(),
        field_type,
        value,
        is_required: field.required,
        page_number,
        bounds,
    }
}
