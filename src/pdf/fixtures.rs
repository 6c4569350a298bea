//! In-memory PDFs for unit tests

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

pub(crate) fn literal(s: &str) -> Object {
    Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
}

fn rect(r: [f64; 4]) -> Object {
    Object::Array(r.iter().map(|v| Object::Real(*v as f32)).collect())
}

/// Letter-sized pages sharing an inherited MediaBox, each with one content stream
pub(crate) fn blank_document(pages: u32) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let kids: Vec<Object> = (1..=pages)
        .map(|n| {
            let content = format!("BT /F1 12 Tf 72 720 Td (Page {}) Tj ET", n);
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            })
            .into()
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => i64::from(pages),
            "Kids" => kids,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        }),
    );
    let catalog = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog);
    doc
}

pub(crate) fn to_bytes(doc: &mut Document) -> Vec<u8> {
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

pub(crate) fn blank_pdf(pages: u32) -> Vec<u8> {
    to_bytes(&mut blank_document(pages))
}

fn page(doc: &Document, number: u32) -> ObjectId {
    doc.get_pages()[&number]
}

fn acroform_id(doc: &mut Document) -> ObjectId {
    let catalog_id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
    if let Ok(Object::Reference(id)) = doc.get_dictionary(catalog_id).unwrap().get(b"AcroForm") {
        return *id;
    }
    let id = doc.add_object(dictionary! {
        "Fields" => Vec::<Object>::new(),
        "DA" => literal("/Helv 0 Tf 0 g"),
    });
    doc.get_dictionary_mut(catalog_id).unwrap().set("AcroForm", id);
    id
}

fn register(doc: &mut Document, field: ObjectId, widgets: &[(u32, ObjectId)]) {
    let acroform = acroform_id(doc);
    if let Ok(Object::Array(fields)) = doc.get_dictionary_mut(acroform).unwrap().get_mut(b"Fields") {
        fields.push(field.into());
    }
    for (page_number, widget) in widgets {
        let page_id = page(doc, *page_number);
        let page = doc.get_dictionary_mut(page_id).unwrap();
        if !page.has(b"Annots") {
            page.set("Annots", Vec::<Object>::new());
        }
        if let Ok(Object::Array(annots)) = page.get_mut(b"Annots") {
            annots.push((*widget).into());
        }
    }
}

/// Merged field/widget text field on the given page
pub(crate) fn add_text_field(
    doc: &mut Document,
    page_number: u32,
    name: &str,
    value: &str,
    r: [f64; 4],
) -> ObjectId {
    let page_id = page(doc, page_number);
    let id = doc.add_object(dictionary! {
        "T" => literal(name),
        "FT" => "Tx",
        "V" => literal(value),
        "Type" => "Annot",
        "Subtype" => "Widget",
        "Rect" => rect(r),
        "P" => page_id,
    });
    register(doc, id, &[(page_number, id)]);
    id
}

/// Checkbox whose widgets each carry their own on state. `value` names the
/// selected state or `Off`.
pub(crate) fn add_checkbox(
    doc: &mut Document,
    name: &str,
    widgets: &[(u32, &str, [f64; 4])],
    value: &str,
) -> (ObjectId, Vec<ObjectId>) {
    let field = doc.new_object_id();
    let mut placed = Vec::new();
    for (page_number, on_state, r) in widgets {
        let on = doc.add_object(Stream::new(
            dictionary! { "BBox" => rect([0.0, 0.0, r[2] - r[0], r[3] - r[1]]) },
            b"0 g 2 2 m 8 8 l S".to_vec(),
        ));
        let off = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let mut normal = Dictionary::new();
        normal.set(*on_state, on);
        normal.set("Off", off);
        let state = if value == *on_state { *on_state } else { "Off" };
        let page_id = page(doc, *page_number);
        let widget = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "Parent" => field,
            "Rect" => rect(*r),
            "AP" => dictionary! { "N" => normal },
            "AS" => state,
            "P" => page_id,
        });
        placed.push((*page_number, widget));
    }
    doc.objects.insert(
        field,
        Object::Dictionary(dictionary! {
            "T" => literal(name),
            "FT" => "Btn",
            "V" => Object::Name(value.as_bytes().to_vec()),
            "Kids" => placed.iter().map(|(_, w)| Object::from(*w)).collect::<Vec<_>>(),
        }),
    );
    register(doc, field, &placed);
    (field, placed.into_iter().map(|(_, w)| w).collect())
}

/// One page with a single text field
pub(crate) fn text_field_pdf(name: &str, value: &str) -> Vec<u8> {
    let mut doc = blank_document(1);
    add_text_field(&mut doc, 1, name, value, [72.0, 700.0, 272.0, 720.0]);
    to_bytes(&mut doc)
}
