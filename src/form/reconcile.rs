//! Edit reconciliation
//!
//! Client edits are addressed against the extracted field list, where a
//! multi-widget checkbox appears as `name#1..name#N`. Reconciliation groups
//! edits back by base name and writes per-widget appearance states plus one
//! consistent field value.

use super::appearance::{base_name, is_true, on_state, widget_index, DEFAULT_ON_STATE, OFF_STATE};
use super::classify::classify;
use super::model::{DocumentModel, NativeField, WidgetId};
use super::types::{ClientField, FieldType, SkipReason};
use crate::error::Result;

/// Edits sharing one base name, in submission order
#[derive(Debug)]
pub struct EditGroup<'a> {
    pub base_name: &'a str,
    pub edits: Vec<&'a ClientField>,
}

/// Outcome of reconciling all edit groups (before flattening)
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReconcileReport {
    pub groups_applied: u32,
    pub groups_ignored: u32,
    pub skipped: Vec<SkipReason>,
}

/// Group edits by base name, keeping first-appearance order of groups
pub fn group_edits(edits: &[ClientField]) -> Vec<EditGroup<'_>> {
    let mut groups: Vec<EditGroup<'_>> = Vec::new();
    for edit in edits {
        let base = base_name(&edit.name);
        match groups.iter_mut().find(|g| g.base_name == base) {
            Some(group) => group.edits.push(edit),
            None => groups.push(EditGroup {
                base_name: base,
                edits: vec![edit],
            }),
        }
    }
    groups
}

/// Apply every edit group to the document. Unknown names are ignored and a
/// failing group never stops the others. Does not flatten.
pub fn reconcile_fields(doc: &mut dyn DocumentModel, edits: &[ClientField]) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for group in group_edits(edits) {
        let field = match doc.field(group.base_name) {
            None => {
                tracing::debug!(field = group.base_name, "Edit references unknown field");
                report.groups_ignored += 1;
                continue;
            }
            Some(Err(e)) => {
                tracing::warn!(group = group.base_name, error = %e, "Read field failed");
                report.skipped.push(SkipReason::new(group.base_name, e));
                continue;
            }
            Some(Ok(field)) => field,
        };

        match apply_group(doc, &field, &group) {
            Ok(()) => report.groups_applied += 1,
            Err(e) => {
                tracing::warn!(group = group.base_name, error = %e, "Apply group failed");
                report.skipped.push(SkipReason::new(group.base_name, e));
            }
        }
    }

    report
}

fn apply_group(doc: &mut dyn DocumentModel, field: &NativeField, group: &EditGroup<'_>) -> Result<()> {
    match classify(field) {
        FieldType::Checkbox if field.widgets.len() > 1 => {
            let plan = plan_widget_states(field, &group.edits);
            for (widget, state) in &plan.states {
                doc.set_widget_appearance_state(*widget, state)?;
            }
            doc.set_field_value(&field.name, &plan.field_value)
        }
        FieldType::Checkbox => {
            let on = group.edits.iter().any(|e| is_true(&e.value));
            let state = match field.widgets.first() {
                Some(widget) => {
                    let state = if on {
                        on_state(field, widget)
                    } else {
                        OFF_STATE.to_string()
                    };
                    doc.set_widget_appearance_state(widget.id, &state)?;
                    state
                }
                None if on => field
                    .appearance_states
                    .iter()
                    .find(|s| !s.eq_ignore_ascii_case(OFF_STATE))
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_ON_STATE.to_string()),
                None => OFF_STATE.to_string(),
            };
            doc.set_field_value(&field.name, &state)
        }
        FieldType::Text
        | FieldType::RadioButton
        | FieldType::ComboBox
        | FieldType::ListBox
        | FieldType::Signature => match group.edits.first() {
            Some(edit) => doc.set_field_value(&field.name, &edit.value),
            None => Ok(()),
        },
    }
}

/// Per-widget appearance states plus the field value that keeps the stored
/// value consistent with at least one visibly-on widget
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetStatePlan {
    pub states: Vec<(WidgetId, String)>,
    pub field_value: String,
}

/// Decide the state of each widget of a checkbox group from the edits
/// addressed to it by `#index`. Widgets without an edit are turned off.
pub fn plan_widget_states(field: &NativeField, edits: &[&ClientField]) -> WidgetStatePlan {
    let (states, first_on) = field.widgets.iter().enumerate().fold(
        (Vec::with_capacity(field.widgets.len()), None::<String>),
        |(mut states, first_on), (i, widget)| {
            let on = edits
                .iter()
                .find(|e| widget_index(&e.name) == Some(i + 1))
                .is_some_and(|e| is_true(&e.value));
            if on {
                let state = on_state(field, widget);
                let first_on = first_on.or_else(|| Some(state.clone()));
                states.push((widget.id, state));
                (states, first_on)
            } else {
                states.push((widget.id, OFF_STATE.to_string()));
                (states, first_on)
            }
        },
    );

    WidgetStatePlan {
        states,
        field_value: first_on.unwrap_or_else(|| OFF_STATE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::extract::extract_fields;
    use crate::form::model::FormType;
    use crate::form::testing::{checkbox, text_field, widget, MockDocument};
    use pretty_assertions::assert_eq;

    fn group_doc(n: u32) -> MockDocument {
        let mut doc = MockDocument::with_pages(vec![Some((612.0, 792.0))]);
        let widgets = (1..=n)
            .map(|i| {
                let mut w = widget(i, None, [0.0, 20.0 * i as f64, 10.0, 20.0 * i as f64 + 10.0]);
                w.normal_states = Some(vec!["Off".to_string(), format!("Row{}", i)]);
                w
            })
            .collect();
        doc.add_field(checkbox("rows", Some("Off"), widgets));
        doc
    }

    #[test]
    fn test_group_edits_by_base_name() {
        let edits = vec![
            ClientField::edit("rows#2", FieldType::Checkbox, "true"),
            ClientField::edit("name", FieldType::Text, "Ada"),
            ClientField::edit("rows#1", FieldType::Checkbox, "false"),
        ];
        let groups = group_edits(&edits);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].base_name, "rows");
        assert_eq!(groups[0].edits.len(), 2);
        assert_eq!(groups[1].base_name, "name");
    }

    #[test]
    fn test_group_turns_exactly_one_widget_on() {
        for k in 1..=4u32 {
            let mut doc = group_doc(4);
            let edits: Vec<ClientField> = (1..=4u32)
                .map(|i| ClientField::edit(format!("rows#{}", i), FieldType::Checkbox, (i == k).to_string()))
                .collect();

            let report = reconcile_fields(&mut doc, &edits);
            assert_eq!(report.groups_applied, 1);

            for i in 1..=4u32 {
                let expected = if i == k { format!("Row{}", k) } else { "Off".to_string() };
                assert_eq!(doc.widget_states[&WidgetId(i, 0)], expected);
            }
            assert_eq!(doc.field("rows").unwrap().unwrap().value, Some(format!("Row{}", k)));

            let names: Vec<String> = extract_fields(&doc).fields.into_iter().map(|f| f.name).collect();
            assert_eq!(names, vec!["rows#1", "rows#2", "rows#3", "rows#4"]);
        }
    }

    #[test]
    fn test_group_first_on_state_wins() {
        let field = checkbox(
            "dup",
            None,
            vec![
                widget(1, Some(&["Off", "A"]), [0.0; 4]),
                widget(2, Some(&["Off", "B"]), [0.0; 4]),
                widget(3, Some(&["Off", "C"]), [0.0; 4]),
            ],
        );
        let edits = [
            ClientField::edit("dup#3", FieldType::Checkbox, "true"),
            ClientField::edit("dup#2", FieldType::Checkbox, "X"),
        ];
        let refs: Vec<&ClientField> = edits.iter().collect();
        let plan = plan_widget_states(&field, &refs);
        assert_eq!(plan.field_value, "B");
        assert_eq!(
            plan.states,
            vec![
                (WidgetId(1, 0), "Off".to_string()),
                (WidgetId(2, 0), "B".to_string()),
                (WidgetId(3, 0), "C".to_string()),
            ]
        );
    }

    #[test]
    fn test_group_without_on_edits_is_off() {
        let mut doc = group_doc(2);
        reconcile_fields(&mut doc, &[ClientField::edit("rows", FieldType::Checkbox, "true")]);
        assert_eq!(doc.field("rows").unwrap().unwrap().value.as_deref(), Some("Off"));
        assert_eq!(doc.widget_states[&WidgetId(1, 0)], "Off");
        assert_eq!(doc.widget_states[&WidgetId(2, 0)], "Off");
    }

    #[test]
    fn test_single_checkbox_round_trip() {
        let mut doc = MockDocument::with_pages(vec![Some((612.0, 792.0))]);
        doc.add_field(checkbox("ok", None, vec![widget(5, Some(&["Off", "Checked"]), [0.0; 4])]));

        reconcile_fields(&mut doc, &[ClientField::edit("ok", FieldType::Checkbox, "true")]);
        assert_eq!(extract_fields(&doc).fields[0].value, "true");
        assert_eq!(doc.widget_states[&WidgetId(5, 0)], "Checked");

        reconcile_fields(&mut doc, &[ClientField::edit("ok", FieldType::Checkbox, "false")]);
        assert_eq!(extract_fields(&doc).fields[0].value, "false");
        assert_eq!(doc.widget_states[&WidgetId(5, 0)], "Off");
    }

    #[test]
    fn test_single_checkbox_any_true_edit_wins() {
        let mut doc = MockDocument::with_pages(vec![Some((612.0, 792.0))]);
        doc.add_field(checkbox("ok", None, vec![widget(5, None, [0.0; 4])]));
        reconcile_fields(
            &mut doc,
            &[
                ClientField::edit("ok", FieldType::Checkbox, "0"),
                ClientField::edit("ok#1", FieldType::Checkbox, "on"),
            ],
        );
        assert_eq!(doc.field("ok").unwrap().unwrap().value.as_deref(), Some("Yes"));
    }

    #[test]
    fn test_scalar_types_take_first_edit_verbatim() {
        let mut doc = MockDocument::with_pages(vec![Some((612.0, 792.0))]);
        doc.add_field(text_field("name", Some("old"), vec![]));
        let mut radio = checkbox("choice", Some("Off"), vec![widget(1, Some(&["A", "Off"]), [0.0; 4])]);
        radio.radio = true;
        doc.add_field(radio);
        let mut combo = text_field("pick", None, vec![]);
        combo.form_type = FormType::Choice;
        doc.add_field(combo);

        let report = reconcile_fields(
            &mut doc,
            &[
                ClientField::edit("name", FieldType::Text, "first"),
                ClientField::edit("name", FieldType::Text, "second"),
                ClientField::edit("choice", FieldType::RadioButton, "A"),
                ClientField::edit("pick", FieldType::ComboBox, "Blue"),
            ],
        );
        assert_eq!(report.groups_applied, 3);
        assert_eq!(
            doc.value_writes,
            vec![
                ("name".to_string(), "first".to_string()),
                ("choice".to_string(), "A".to_string()),
                ("pick".to_string(), "Blue".to_string()),
            ]
        );
        assert!(doc.widget_states.is_empty());
    }

    #[test]
    fn test_unreadable_field_is_skipped_not_ignored() {
        let mut doc = MockDocument::with_pages(vec![Some((612.0, 792.0))]);
        doc.add_field(text_field("damaged", None, vec![]));
        doc.unreadable_fields.insert("damaged".to_string());

        let report = reconcile_fields(&mut doc, &[ClientField::edit("damaged", FieldType::Text, "x")]);
        assert_eq!(report.groups_ignored, 0);
        assert_eq!(report.groups_applied, 0);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].target, "damaged");
        assert!(report.skipped[0].reason.contains("cannot read damaged"));
        assert!(doc.value_writes.is_empty());
    }

    #[test]
    fn test_unknown_and_failing_groups_do_not_block_others() {
        let mut doc = MockDocument::with_pages(vec![Some((612.0, 792.0))]);
        doc.add_field(text_field("broken", None, vec![]));
        doc.add_field(text_field("fine", None, vec![]));
        doc.failing_fields.insert("broken".to_string());

        let report = reconcile_fields(
            &mut doc,
            &[
                ClientField::edit("ghost", FieldType::Text, "boo"),
                ClientField::edit("broken", FieldType::Text, "x"),
                ClientField::edit("fine", FieldType::Text, "y"),
            ],
        );
        assert_eq!(report.groups_ignored, 1);
        assert_eq!(report.groups_applied, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].target, "broken");
        assert_eq!(doc.field("fine").unwrap().unwrap().value.as_deref(), Some("y"));
    }
}
