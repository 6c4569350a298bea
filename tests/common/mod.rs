//! PDF builders shared by the integration tests

#![allow(dead_code)]

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

pub fn literal(s: &str) -> Object {
    Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
}

fn rect(r: [f64; 4]) -> Object {
    Object::Array(r.iter().map(|v| Object::Real(*v as f32)).collect())
}

/// Builds small PDFs with pages and AcroForm fields
pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    pages: Vec<ObjectId>,
    fields: Vec<Object>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            pages: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Add a page with a line of text drawn in its own font resource
    pub fn page(mut self, width: f64, height: f64) -> Self {
        let number = self.pages.len() + 1;
        let font = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content = format!("BT /F1 12 Tf 72 72 Td (Original page {}) Tj ET", number);
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => rect([0.0, 0.0, width, height]),
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font } },
        });
        self.pages.push(page);
        self
    }

    pub fn letter_pages(mut self, count: usize) -> Self {
        for _ in 0..count {
            self = self.page(612.0, 792.0);
        }
        self
    }

    fn attach(&mut self, page_number: u32, widget: ObjectId) {
        let page_id = self.pages[page_number as usize - 1];
        let page = self.doc.get_dictionary_mut(page_id).unwrap();
        if !page.has(b"Annots") {
            page.set("Annots", Vec::<Object>::new());
        }
        if let Ok(Object::Array(annots)) = page.get_mut(b"Annots") {
            annots.push(widget.into());
        }
    }

    /// Merged field/widget text field
    pub fn text_field(mut self, page_number: u32, name: &str, value: &str, r: [f64; 4]) -> Self {
        let page_id = self.pages[page_number as usize - 1];
        let id = self.doc.add_object(dictionary! {
            "T" => literal(name),
            "FT" => "Tx",
            "V" => literal(value),
            "DA" => literal("/Helv 0 Tf 0 g"),
            "Type" => "Annot",
            "Subtype" => "Widget",
            "Rect" => rect(r),
            "P" => page_id,
        });
        self.attach(page_number, id);
        self.fields.push(id.into());
        self
    }

    /// Checkbox field with one widget per `(page, on_state, rect)`. `value`
    /// is the native field value (`Off` or one of the on states).
    pub fn checkbox(mut self, name: &str, widgets: &[(u32, &str, [f64; 4])], value: &str) -> Self {
        let field = self.doc.new_object_id();
        let mut kids = Vec::new();
        for (page_number, on_state, r) in widgets {
            let on = self.doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => rect([0.0, 0.0, r[2] - r[0], r[3] - r[1]]),
                },
                b"0 g 1 1 m 9 9 l S".to_vec(),
            ));
            let off = self.doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            let mut normal = Dictionary::new();
            normal.set(*on_state, on);
            normal.set("Off", off);
            let state = if value == *on_state { *on_state } else { "Off" };
            let page_id = self.pages[*page_number as usize - 1];
            let widget = self.doc.add_object(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Widget",
                "Parent" => field,
                "Rect" => rect(*r),
                "AP" => dictionary! { "N" => normal },
                "AS" => state,
                "P" => page_id,
            });
            self.attach(*page_number, widget);
            kids.push(Object::from(widget));
        }
        self.doc.objects.insert(
            field,
            Object::Dictionary(dictionary! {
                "T" => literal(name),
                "FT" => "Btn",
                "V" => Object::Name(value.as_bytes().to_vec()),
                "Kids" => kids,
            }),
        );
        self.fields.push(field.into());
        self
    }

    pub fn document(mut self) -> Document {
        let count = self.pages.len() as i64;
        let kids: Vec<Object> = self.pages.iter().map(|id| Object::from(*id)).collect();
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => count,
                "Kids" => kids,
            }),
        );
        let mut catalog = dictionary! { "Type" => "Catalog", "Pages" => self.pages_id };
        if !self.fields.is_empty() {
            let helv = self.doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
            });
            let acroform = self.doc.add_object(dictionary! {
                "Fields" => self.fields.clone(),
                "DA" => literal("/Helv 0 Tf 0 g"),
                "DR" => dictionary! { "Font" => dictionary! { "Helv" => helv } },
            });
            catalog.set("AcroForm", acroform);
        }
        let catalog_id = self.doc.add_object(catalog);
        self.doc.trailer.set("Root", catalog_id);
        self.doc
    }

    pub fn build(self) -> Vec<u8> {
        save(&mut self.document())
    }
}

pub fn save(doc: &mut Document) -> Vec<u8> {
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Decoded content of every stream in the document, concatenated
pub fn all_stream_text(doc: &Document) -> String {
    let mut text = String::new();
    for object in doc.objects.values() {
        if let Object::Stream(stream) = object {
            let data = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
            text.push_str(&String::from_utf8_lossy(&data));
            text.push('\n');
        }
    }
    text
}

pub fn page_content(doc: &Document, page_number: u32) -> String {
    let page_id = doc.get_pages()[&page_number];
    String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
}

pub fn has_acroform(doc: &Document) -> bool {
    doc.catalog().map(|c| c.has(b"AcroForm")).unwrap_or(false)
}

/// Hex string operand as written by the content generators
pub fn hex(text: &str) -> String {
    let digits: String = text.bytes().map(|b| format!("{:02X}", b)).collect();
    format!("<{}>", digits)
}

/// A small opaque PNG, base64 encoded
pub fn png_base64(width: u32, height: u32) -> String {
    use base64::Engine;
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
    base64::engine::general_purpose::STANDARD.encode(bytes.into_inner())
}
