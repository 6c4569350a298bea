//! In-memory document model for unit tests

use super::model::{
    DocumentModel, FormType, ImagePlacement, NativeField, TextPlacement, Widget, WidgetId,
};
use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};

pub(crate) fn widget(id: u32, states: Option<&[&str]>, rect: [f64; 4]) -> Widget {
    Widget {
        id: WidgetId(id, 0),
        page: Some(1),
        rect: Some(rect.iter().map(|v| Some(*v)).collect()),
        normal_states: states.map(|s| s.iter().map(|x| x.to_string()).collect()),
    }
}

pub(crate) fn checkbox(name: &str, value: Option<&str>, widgets: Vec<Widget>) -> NativeField {
    let mut appearance_states = Vec::new();
    for state in widgets.iter().flat_map(|w| w.normal_states.iter().flatten()) {
        if !appearance_states.contains(state) {
            appearance_states.push(state.clone());
        }
    }
    NativeField {
        name: name.to_string(),
        form_type: FormType::Button,
        value: value.map(str::to_string),
        required: false,
        radio: false,
        appearance_states,
        widgets,
    }
}

pub(crate) fn text_field(name: &str, value: Option<&str>, widgets: Vec<Widget>) -> NativeField {
    NativeField {
        name: name.to_string(),
        form_type: FormType::Text,
        value: value.map(str::to_string),
        required: false,
        radio: false,
        appearance_states: vec![],
        widgets,
    }
}

#[derive(Default)]
pub(crate) struct MockDocument {
    pub pages: Vec<Option<(f64, f64)>>,
    pub fields: Vec<std::result::Result<NativeField, String>>,
    pub widget_states: HashMap<WidgetId, String>,
    pub value_writes: Vec<(String, String)>,
    pub failing_fields: HashSet<String>,
    pub unreadable_fields: HashSet<String>,
    pub flatten_calls: u32,
    pub texts: Vec<(u32, TextPlacement)>,
    pub images: Vec<(u32, ImagePlacement)>,
    /// Calls in order, for sequencing assertions
    pub journal: Vec<String>,
}

impl MockDocument {
    pub fn with_pages(pages: Vec<Option<(f64, f64)>>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn add_field(&mut self, field: NativeField) {
        self.fields.push(Ok(field));
    }

    pub fn add_broken_field(&mut self, reason: &str) {
        self.fields.push(Err(reason.to_string()));
    }

    fn check_page(&self, page_number: u32) -> Result<()> {
        if page_number == 0 || page_number as usize > self.pages.len() {
            return Err(Error::PageOutOfBounds {
                page: page_number,
                total: self.pages.len() as u32,
            });
        }
        Ok(())
    }
}

impl DocumentModel for MockDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_size(&self, page_number: u32) -> Result<(f64, f64)> {
        self.check_page(page_number)?;
        self.pages[page_number as usize - 1].ok_or_else(|| Error::malformed("missing MediaBox"))
    }

    fn fields(&self) -> Vec<Result<NativeField>> {
        self.fields
            .iter()
            .map(|f| f.clone().map_err(Error::malformed))
            .collect()
    }

    fn field(&self, name: &str) -> Option<Result<NativeField>> {
        let field = self.fields.iter().flatten().find(|f| f.name == name)?;
        if self.unreadable_fields.contains(name) {
            return Some(Err(Error::malformed(format!("cannot read {}", name))));
        }
        Some(Ok(field.clone()))
    }

    fn set_field_value(&mut self, name: &str, value: &str) -> Result<()> {
        self.journal.push(format!("value {}={}", name, value));
        if self.failing_fields.contains(name) {
            return Err(Error::malformed(format!("cannot write {}", name)));
        }
        let field = self
            .fields
            .iter_mut()
            .flatten()
            .find(|f| f.name == name)
            .ok_or_else(|| Error::FieldNotFound {
                name: name.to_string(),
            })?;
        field.value = Some(value.to_string());
        self.value_writes.push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn set_widget_appearance_state(&mut self, widget: WidgetId, state: &str) -> Result<()> {
        self.journal.push(format!("state {}={}", widget.0, state));
        self.widget_states.insert(widget, state.to_string());
        Ok(())
    }

    fn flatten_all_fields(&mut self) -> Result<()> {
        self.journal.push("flatten".to_string());
        self.flatten_calls += 1;
        Ok(())
    }

    fn add_fixed_text(&mut self, page_number: u32, text: &TextPlacement) -> Result<()> {
        self.check_page(page_number)?;
        self.journal.push(format!("text {}", text.text));
        self.texts.push((page_number, text.clone()));
        Ok(())
    }

    fn add_fixed_image(&mut self, page_number: u32, image: &ImagePlacement) -> Result<()> {
        self.check_page(page_number)?;
        self.journal.push("image".to_string());
        self.images.push((page_number, image.clone()));
        Ok(())
    }
}
