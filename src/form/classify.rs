//! Native field classification

use super::model::{FormType, NativeField};
use super::types::FieldType;

/// Map a native field's form type to the client field kind. Unknown tags
/// become [`FieldType::Text`]; push buttons are reported as checkboxes.
pub fn classify(field: &NativeField) -> FieldType {
    match field.form_type {
        FormType::Text => FieldType::Text,
        FormType::Choice => FieldType::ComboBox,
        FormType::Signature => FieldType::Signature,
        FormType::Button if field.radio => FieldType::RadioButton,
        FormType::Button => FieldType::Checkbox,
        FormType::Other(_) => FieldType::Text,
    }
}
