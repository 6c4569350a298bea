//! AcroForm field tree traversal

use super::objects::{get_dict, get_resolved, name, number, raw_rect, resolve, text_or_name};
use crate::error::{Error, Result};
use crate::form::{FormType, NativeField, Widget, WidgetId};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{HashMap, HashSet};

const MAX_FIELD_DEPTH: usize = 32;

/// `/Ff` bit 2
const FLAG_REQUIRED: i64 = 1 << 1;
/// `/Ff` bit 16
pub(crate) const FLAG_RADIO: i64 = 1 << 15;
/// `/Ff` bit 13
pub(crate) const FLAG_MULTILINE: i64 = 1 << 12;

/// Attributes a field inherits from its ancestors
#[derive(Debug, Clone, Default)]
pub(crate) struct Inherited {
    pub ft: Option<String>,
    pub ff: Option<i64>,
    pub value: Option<Object>,
    pub da: Option<String>,
    pub q: Option<i64>,
}

impl Inherited {
    fn merge(&self, doc: &Document, dict: &Dictionary) -> Inherited {
        Inherited {
            ft: get_resolved(doc, dict, b"FT").and_then(name).or_else(|| self.ft.clone()),
            ff: get_resolved(doc, dict, b"Ff")
                .and_then(|o| o.as_i64().ok())
                .or(self.ff),
            value: get_resolved(doc, dict, b"V").cloned().or_else(|| self.value.clone()),
            da: get_resolved(doc, dict, b"DA")
                .and_then(text_or_name)
                .or_else(|| self.da.clone()),
            q: get_resolved(doc, dict, b"Q").and_then(|o| o.as_i64().ok()).or(self.q),
        }
    }
}

/// A terminal field located in the object graph
#[derive(Debug, Clone)]
pub(crate) struct FieldNode {
    pub id: ObjectId,
    pub name: String,
    pub attrs: Inherited,
    pub widgets: Vec<ObjectId>,
}

impl FieldNode {
    pub fn form_type(&self) -> FormType {
        FormType::from_tag(self.attrs.ft.as_deref().unwrap_or_default())
    }

    pub fn flags(&self) -> i64 {
        self.attrs.ff.unwrap_or(0)
    }
}

/// The catalog's `/AcroForm` dictionary, if any
pub(crate) fn acroform(doc: &Document) -> Option<&Dictionary> {
    let catalog = doc.catalog().ok()?;
    get_dict(doc, catalog, b"AcroForm")
}

/// Walk `/AcroForm/Fields` and collect terminal fields in tree order. A
/// subtree that cannot be read becomes one `Err` entry.
pub(crate) fn terminal_fields(doc: &Document) -> Vec<Result<FieldNode>> {
    let Some(form) = acroform(doc) else {
        return Vec::new();
    };
    let roots = match get_resolved(doc, form, b"Fields") {
        Some(Object::Array(items)) => items.clone(),
        _ => return Vec::new(),
    };

    let base = Inherited {
        da: get_resolved(doc, form, b"DA").and_then(text_or_name),
        q: get_resolved(doc, form, b"Q").and_then(|o| o.as_i64().ok()),
        ..Inherited::default()
    };

    let mut out = Vec::new();
    let mut visited = HashSet::new();
    for root in &roots {
        match root {
            Object::Reference(id) => walk(doc, *id, "", &base, 0, &mut visited, &mut out),
            other => out.push(Err(Error::malformed(format!(
                "field entry is not a reference: {:?}",
                other
            )))),
        }
    }
    out
}

fn walk(
    doc: &Document,
    id: ObjectId,
    parent_name: &str,
    inherited: &Inherited,
    depth: usize,
    visited: &mut HashSet<ObjectId>,
    out: &mut Vec<Result<FieldNode>>,
) {
    if depth > MAX_FIELD_DEPTH || !visited.insert(id) {
        out.push(Err(Error::malformed(format!("field tree cycle at {:?}", id))));
        return;
    }
    let dict = match doc.get_dictionary(id) {
        Ok(dict) => dict,
        Err(e) => {
            out.push(Err(e.into()));
            return;
        }
    };

    let partial = get_resolved(doc, dict, b"T").and_then(text_or_name);
    let full_name = match (&partial, parent_name.is_empty()) {
        (Some(t), true) => t.clone(),
        (Some(t), false) => format!("{}.{}", parent_name, t),
        (None, _) => parent_name.to_string(),
    };
    let attrs = inherited.merge(doc, dict);

    let kids: Vec<ObjectId> = match get_resolved(doc, dict, b"Kids") {
        Some(Object::Array(items)) => items.iter().filter_map(|o| o.as_reference().ok()).collect(),
        _ => Vec::new(),
    };
    let (fields, widgets): (Vec<ObjectId>, Vec<ObjectId>) = kids.into_iter().partition(|kid| {
        doc.get_dictionary(*kid)
            .map(|d| d.has(b"T"))
            .unwrap_or(false)
    });

    if !fields.is_empty() {
        for kid in fields {
            walk(doc, kid, &full_name, &attrs, depth + 1, visited, out);
        }
        return;
    }

    let widgets = if widgets.is_empty() && is_widget(dict) {
        vec![id]
    } else {
        widgets
    };

    out.push(Ok(FieldNode {
        id,
        name: full_name,
        attrs,
        widgets,
    }));
}

pub(crate) fn is_widget(dict: &Dictionary) -> bool {
    matches!(dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Widget")
}

/// Map every annotation referenced from a page's `/Annots` to its page number
pub(crate) fn annotation_pages(doc: &Document) -> HashMap<ObjectId, u32> {
    let mut map = HashMap::new();
    for (number, page_id) in doc.get_pages() {
        let Ok(page) = doc.get_dictionary(page_id) else {
            continue;
        };
        if let Some(Object::Array(annots)) = get_resolved(doc, page, b"Annots") {
            for annot in annots {
                if let Object::Reference(id) = annot {
                    map.entry(*id).or_insert(number);
                }
            }
        }
    }
    map
}

/// State names of a widget's `/AP/<key>` sub-dictionary
pub(crate) fn appearance_state_names(doc: &Document, widget: &Dictionary, key: &[u8]) -> Option<Vec<String>> {
    let ap = get_dict(doc, widget, b"AP")?;
    let states = get_dict(doc, ap, key)?;
    Some(
        states
            .iter()
            .map(|(k, _)| String::from_utf8_lossy(k).into_owned())
            .collect(),
    )
}

/// Build the read-only view of a terminal field
pub(crate) fn native_field(
    doc: &Document,
    node: &FieldNode,
    page_of: &HashMap<ObjectId, u32>,
    page_numbers: &HashMap<ObjectId, u32>,
) -> Result<NativeField> {
    let mut widgets = Vec::with_capacity(node.widgets.len());
    let mut appearance_states: Vec<String> = Vec::new();

    for widget_id in &node.widgets {
        let dict = doc.get_dictionary(*widget_id)?;
        let normal_states = appearance_state_names(doc, dict, b"N");

        let down_states = appearance_state_names(doc, dict, b"D");
        for state in normal_states.iter().chain(down_states.iter()).flatten() {
            if !appearance_states.contains(state) {
                appearance_states.push(state.clone());
            }
        }

        let page = match dict.get(b"P") {
            Ok(Object::Reference(page_id)) => page_numbers.get(page_id).copied(),
            _ => None,
        }
        .or_else(|| page_of.get(widget_id).copied());

        widgets.push(Widget {
            id: WidgetId(widget_id.0, widget_id.1),
            page,
            rect: raw_rect(doc, dict),
            normal_states,
        });
    }

    let form_type = node.form_type();
    let flags = node.flags();

    Ok(NativeField {
        name: node.name.clone(),
        value: node.attrs.value.as_ref().and_then(|v| value_string(doc, v)),
        required: flags & FLAG_REQUIRED != 0,
        radio: form_type == FormType::Button && flags & FLAG_RADIO != 0,
        form_type,
        appearance_states,
        widgets,
    })
}

/// Field value as a string: names and text strings directly, arrays (multi
/// select choice fields) by their first entry
pub(crate) fn value_string(doc: &Document, value: &Object) -> Option<String> {
    let resolved = resolve(doc, value).ok()?;
    match resolved {
        Object::Array(items) => items.first().and_then(|first| value_string(doc, first)),
        Object::Integer(_) | Object::Real(_) => number(resolved).map(|n| n.to_string()),
        other => text_or_name(other),
    }
}

pub(crate) fn is_radio(node: &FieldNode) -> bool {
    node.form_type() == FormType::Button && node.flags() & FLAG_RADIO != 0
}
