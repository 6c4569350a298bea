//! Client-facing form data transfer types

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of field kinds a client can address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub enum FieldType {
    #[default]
    Text,
    Checkbox,
    RadioButton,
    ComboBox,
    ListBox,
    Signature,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "Text",
            FieldType::Checkbox => "Checkbox",
            FieldType::RadioButton => "RadioButton",
            FieldType::ComboBox => "ComboBox",
            FieldType::ListBox => "ListBox",
            FieldType::Signature => "Signature",
        };
        f.write_str(name)
    }
}

/// Rectangle in PDF user space points (origin bottom-left)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One addressable form field as seen by the client
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientField {
    /// Field name; expanded checkbox group members are `"{base}#{index}"`
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Current value; checkbox state is `"true"` or `"false"`
    pub value: String,
    pub is_required: bool,
    /// Page number (1-indexed)
    pub page_number: u32,
    pub bounds: Bounds,
}

impl ClientField {
    /// Build a bare edit entry; only name, type and value are read on apply
    pub fn edit(name: impl Into<String>, field_type: FieldType, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type,
            value: value.into(),
            ..Self::default()
        }
    }
}

/// Size of one page in points
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageDimension {
    pub page_number: u32,
    pub width: f64,
    pub height: f64,
}

/// Free-form text placed on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TextOverlayElement {
    pub id: String,
    pub text: String,
    pub page_number: u32,
    /// `x`/`y` anchor the bottom-left corner; `width` <= 0 wraps at 200pt
    pub bounds: Bounds,
    pub font_family: String,
    pub font_size: i32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    /// `#RGB` or `#RRGGBB`
    pub color: String,
}

impl Default for TextOverlayElement {
    fn default() -> Self {
        Self {
            id: String::new(),
            text: String::new(),
            page_number: 1,
            bounds: Bounds::default(),
            font_family: "Arial".to_string(),
            font_size: 12,
            bold: false,
            italic: false,
            underline: false,
            strike: false,
            color: "#000000".to_string(),
        }
    }
}

/// Raster image placed on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageOverlayElement {
    pub id: String,
    /// Base64 encoded PNG/JPEG/GIF/BMP bytes
    pub image_data: String,
    pub page_number: u32,
    /// Scaled to fit only when both width and height are > 0
    pub bounds: Bounds,
}

impl Default for ImageOverlayElement {
    fn default() -> Self {
        Self {
            id: String::new(),
            image_data: String::new(),
            page_number: 1,
            bounds: Bounds::default(),
        }
    }
}

/// Why one field, edit group or overlay element was dropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SkipReason {
    /// Field name, edit group base name, or overlay element id
    pub target: String,
    pub reason: String,
}

impl SkipReason {
    pub fn new(target: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            target: target.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result of reading a document's editable structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedForm {
    pub page_count: u32,
    pub page_dimensions: Vec<PageDimension>,
    pub fields: Vec<ClientField>,
    pub skipped: Vec<SkipReason>,
}

/// Outcome of applying an edit request to a document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    /// Edit groups written to a native field
    pub groups_applied: u32,
    /// Edit groups whose base name matched no native field
    pub groups_ignored: u32,
    /// Overlay elements drawn
    pub overlays_placed: u32,
    pub skipped: Vec<SkipReason>,
}
