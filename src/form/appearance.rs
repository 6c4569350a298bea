//! Appearance state resolution and edit-name helpers

use super::model::{NativeField, Widget};

/// Name of the off appearance state
pub const OFF_STATE: &str = "Off";

/// On-state used when neither the widget nor the field names one
pub const DEFAULT_ON_STATE: &str = "Yes";

fn is_off(state: &str) -> bool {
    state.eq_ignore_ascii_case(OFF_STATE)
}

/// Resolve the "on" appearance state of one widget of a button field.
///
/// The widget's own normal appearance states win; then the field-wide
/// state list; then [`DEFAULT_ON_STATE`].
pub fn on_state(field: &NativeField, widget: &Widget) -> String {
    widget
        .normal_states
        .iter()
        .flatten()
        .chain(field.appearance_states.iter())
        .find(|s| !is_off(s))
        .cloned()
        .unwrap_or_else(|| DEFAULT_ON_STATE.to_string())
}

/// Whether a stored checkbox value means "checked"
pub fn is_checked_value(value: &str) -> bool {
    !value.is_empty() && !is_off(value)
}

/// Whether a client-submitted value means "on"
pub fn is_true(value: &str) -> bool {
    !value.is_empty()
        && !value.eq_ignore_ascii_case("false")
        && !is_off(value)
        && value != "0"
}

/// Strip trailing `#{digits}` widget suffixes
pub fn base_name(name: &str) -> &str {
    let mut base = name;
    while let Some((head, index)) = base.rsplit_once('#') {
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            break;
        }
        base = head;
    }
    base
}

/// Parse the 1-based widget index of an expanded name
pub fn widget_index(name: &str) -> Option<usize> {
    let (_, index) = name.rsplit_once('#')?;
    index.parse().ok()
}

/// Name of the pseudo-field for widget `index` (1-based)
pub fn pseudo_field_name(base: &str, index: usize) -> String {
    format!("{}#{}", base, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::model::{FormType, WidgetId};
    use rstest::rstest;

    fn button(states: &[&str]) -> NativeField {
        NativeField {
            name: "cb".to_string(),
            form_type: FormType::Button,
            value: None,
            required: false,
            radio: false,
            appearance_states: states.iter().map(|s| s.to_string()).collect(),
            widgets: vec![],
        }
    }

    fn widget(states: Option<&[&str]>) -> Widget {
        Widget {
            id: WidgetId(7, 0),
            page: Some(1),
            rect: None,
            normal_states: states.map(|s| s.iter().map(|x| x.to_string()).collect()),
        }
    }

    #[test]
    fn test_on_state_prefers_widget_states() {
        let field = button(&["Off", "Global"]);
        assert_eq!(on_state(&field, &widget(Some(&["OFF", "Check1"]))), "Check1");
    }

    #[test]
    fn test_on_state_falls_back_to_field_states() {
        let field = button(&["off", "Global"]);
        assert_eq!(on_state(&field, &widget(None)), "Global");
        assert_eq!(on_state(&field, &widget(Some(&["Off"]))), "Global");
    }

    #[test]
    fn test_on_state_defaults_to_yes() {
        assert_eq!(on_state(&button(&[]), &widget(None)), "Yes");
        assert_eq!(on_state(&button(&["Off"]), &widget(Some(&[]))), "Yes");
    }

    #[rstest]
    #[case("", false)]
    #[case("false", false)]
    #[case("False", false)]
    #[case("FALSE", false)]
    #[case("Off", false)]
    #[case("off", false)]
    #[case("0", false)]
    #[case("1", true)]
    #[case("on", true)]
    #[case("X", true)]
    #[case("true", true)]
    #[case("00", true)]
    fn test_is_true(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_true(value), expected);
    }

    #[test]
    fn test_is_checked_value() {
        assert!(is_checked_value("Yes"));
        assert!(is_checked_value("0"));
        assert!(!is_checked_value("OFF"));
        assert!(!is_checked_value(""));
    }

    #[rstest]
    #[case("agree#3", "agree")]
    #[case("agree", "agree")]
    #[case("a.b#12", "a.b")]
    #[case("odd#name", "odd#name")]
    #[case("trailing#", "trailing#")]
    #[case("nested#1#2", "nested")]
    fn test_base_name(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(base_name(name), expected);
        assert_eq!(base_name(base_name(name)), base_name(name));
    }

    #[test]
    fn test_widget_index() {
        assert_eq!(widget_index("agree#2"), Some(2));
        assert_eq!(widget_index("agree"), None);
        assert_eq!(widget_index("agree#x"), None);
        assert_eq!(widget_index(&pseudo_field_name("agree", 9)), Some(9));
    }
}
