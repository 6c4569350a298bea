//! Abstract PDF document model consumed by the form core
//!
//! The reconciliation and overlay logic never touches PDF objects directly.
//! It reads fields and widgets through these read-only views and mutates the
//! document only through [`DocumentModel`].

use crate::error::Result;

/// Native form-type tag (`/FT`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormType {
    /// `/Tx`
    Text,
    /// `/Btn`
    Button,
    /// `/Ch`
    Choice,
    /// `/Sig`
    Signature,
    /// Missing or unrecognized tag
    Other(String),
}

impl FormType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Tx" => FormType::Text,
            "Btn" => FormType::Button,
            "Ch" => FormType::Choice,
            "Sig" => FormType::Signature,
            other => FormType::Other(other.to_string()),
        }
    }
}

/// Opaque handle to one widget annotation inside a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(pub u32, pub u16);

/// Read-only view of one widget annotation
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub id: WidgetId,
    /// Owning page (1-indexed), if it could be resolved
    pub page: Option<u32>,
    /// Raw `/Rect` components; a non-numeric component is `None`
    pub rect: Option<Vec<Option<f64>>>,
    /// State names of the normal appearance sub-dictionary (`/AP /N`),
    /// or `None` when the widget has no state dictionary
    pub normal_states: Option<Vec<String>>,
}

/// Read-only view of one terminal form field
#[derive(Debug, Clone, PartialEq)]
pub struct NativeField {
    /// Fully qualified field name
    pub name: String,
    pub form_type: FormType,
    /// Value as a string; `None` when the field has no value
    pub value: Option<String>,
    pub required: bool,
    /// Radio flag of a `/Btn` field
    pub radio: bool,
    /// Appearance state names collected across all widgets, in order
    pub appearance_states: Vec<String>,
    /// Widgets in native order
    pub widgets: Vec<Widget>,
}

impl NativeField {
    pub fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}

/// Text decoration flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decorations {
    pub underline: bool,
    pub strike: bool,
}

/// Standard font family available without embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFamily {
    Helvetica,
    Times,
    Courier,
    Symbol,
    ZapfDingbats,
}

/// One of the four style variants of a standard family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StandardFont {
    pub family: StandardFamily,
    pub bold: bool,
    pub italic: bool,
}

impl StandardFont {
    pub const HELVETICA: StandardFont = StandardFont {
        family: StandardFamily::Helvetica,
        bold: false,
        italic: false,
    };

    /// PostScript name of the base font
    pub fn base_font(&self) -> &'static str {
        match (self.family, self.bold, self.italic) {
            (StandardFamily::Helvetica, false, false) => "Helvetica",
            (StandardFamily::Helvetica, true, false) => "Helvetica-Bold",
            (StandardFamily::Helvetica, false, true) => "Helvetica-Oblique",
            (StandardFamily::Helvetica, true, true) => "Helvetica-BoldOblique",
            (StandardFamily::Times, false, false) => "Times-Roman",
            (StandardFamily::Times, true, false) => "Times-Bold",
            (StandardFamily::Times, false, true) => "Times-Italic",
            (StandardFamily::Times, true, true) => "Times-BoldItalic",
            (StandardFamily::Courier, false, false) => "Courier",
            (StandardFamily::Courier, true, false) => "Courier-Bold",
            (StandardFamily::Courier, false, true) => "Courier-Oblique",
            (StandardFamily::Courier, true, true) => "Courier-BoldOblique",
            (StandardFamily::Symbol, _, _) => "Symbol",
            (StandardFamily::ZapfDingbats, _, _) => "ZapfDingbats",
        }
    }
}

/// RGB color with 8-bit components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Fully resolved text placement
#[derive(Debug, Clone, PartialEq)]
pub struct TextPlacement {
    pub x: f64,
    pub y: f64,
    /// Wrap width in points, always > 0
    pub width: f64,
    pub text: String,
    pub font: StandardFont,
    pub size: f64,
    /// `None` keeps the target's default color
    pub color: Option<Rgb>,
    pub decorations: Decorations,
}

/// Fully resolved image placement
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    pub x: f64,
    pub y: f64,
    /// Fit box; `None` renders at native pixel size
    pub fit: Option<(f64, f64)>,
    /// Encoded image bytes (PNG, JPEG, ...)
    pub bytes: Vec<u8>,
}

/// Capabilities the form core needs from a PDF object model
pub trait DocumentModel {
    fn page_count(&self) -> u32;

    /// Page size in points (1-indexed page number)
    fn page_size(&self, page_number: u32) -> Result<(f64, f64)>;

    /// All terminal fields in iteration order; a field that cannot be read
    /// is reported as its own `Err` without affecting the others
    fn fields(&self) -> Vec<Result<NativeField>>;

    /// Look up a terminal field by fully qualified name. `None` means no
    /// field has that name; `Some(Err)` means it exists but cannot be read.
    fn field(&self, name: &str) -> Option<Result<NativeField>>;

    /// Set a field's value. Checkbox fields only record the value; widget
    /// appearance states are set through [`set_widget_appearance_state`].
    ///
    /// [`set_widget_appearance_state`]: DocumentModel::set_widget_appearance_state
    fn set_field_value(&mut self, name: &str, value: &str) -> Result<()>;

    fn set_widget_appearance_state(&mut self, widget: WidgetId, state: &str) -> Result<()>;

    /// Bake every field appearance into page content and drop interactivity
    fn flatten_all_fields(&mut self) -> Result<()>;

    fn add_fixed_text(&mut self, page_number: u32, text: &TextPlacement) -> Result<()>;

    fn add_fixed_image(&mut self, page_number: u32, image: &ImagePlacement) -> Result<()>;
}
