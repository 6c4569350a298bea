//! lopdf-backed implementation of the form document model

use super::acroform::{
    acroform, annotation_pages, appearance_state_names, is_radio, native_field, terminal_fields,
    value_string, FieldNode,
};
use super::appearance::text_appearance;
use super::content::{add_page_resource, append_page_content};
use super::draw::{image_ops, text_ops};
use super::flatten::flatten_form;
use super::fonts::standard_font_dict;
use super::objects::{encode_text, get_dict, inherited_page_attr, normalized_rect};
use super::raster::{draw_size, embed_image};
use crate::error::{Error, Result};
use crate::form::{
    DocumentModel, FormType, ImagePlacement, NativeField, TextPlacement, WidgetId, OFF_STATE,
};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{BTreeMap, HashMap, HashSet};

/// An editable PDF held in memory
pub struct LopdfDocument {
    doc: Document,
    /// Pages whose original content is already isolated in `q`/`Q`
    wrapped_pages: HashSet<ObjectId>,
}

impl std::fmt::Debug for LopdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfDocument")
            .field("pages", &self.doc.get_pages().len())
            .finish()
    }
}

impl LopdfDocument {
    /// Parse PDF bytes. Non-PDF input and encrypted documents are rejected.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        if !bytes.starts_with(b"%PDF") {
            return Err(Error::InvalidPdf {
                reason: "missing %PDF header".to_string(),
            });
        }
        let doc = Document::load_mem(bytes).map_err(|e| {
            let reason = e.to_string();
            if reason.to_lowercase().contains("crypt") || has_encrypt_entry(bytes) {
                Error::Encrypted
            } else {
                Error::InvalidPdf { reason }
            }
        })?;
        if doc.trailer.has(b"Encrypt") {
            return Err(Error::Encrypted);
        }
        Ok(Self::from_document(doc))
    }

    pub fn from_document(doc: Document) -> Self {
        Self {
            doc,
            wrapped_pages: HashSet::new(),
        }
    }

    /// Serialize the document, compressing uncompressed streams and dropping
    /// objects nothing refers to any more
    pub fn save(&mut self) -> Result<Vec<u8>> {
        let _ = self.doc.prune_objects();
        let _ = self.doc.compress();
        let mut out = Vec::new();
        self.doc.save_to(&mut out)?;
        Ok(out)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    fn pages(&self) -> BTreeMap<u32, ObjectId> {
        self.doc.get_pages()
    }

    fn page_id(&self, page_number: u32) -> Result<ObjectId> {
        let pages = self.pages();
        pages
            .get(&page_number)
            .copied()
            .ok_or(Error::PageOutOfBounds {
                page: page_number,
                total: pages.len() as u32,
            })
    }

    fn find_node(&self, name: &str) -> Option<FieldNode> {
        terminal_fields(&self.doc)
            .into_iter()
            .flatten()
            .find(|node| node.name == name)
    }

    fn dict_mut(&mut self, id: ObjectId) -> Result<&mut Dictionary> {
        self.doc
            .get_object_mut(id)?
            .as_dict_mut()
            .map_err(|_| Error::malformed(format!("object {:?} is not a dictionary", id)))
    }

    fn set_button_value(&mut self, node: &FieldNode, value: &str) -> Result<()> {
        self.dict_mut(node.id)?
            .set("V", Object::Name(value.as_bytes().to_vec()));

        if !is_radio(node) {
            return Ok(());
        }
        // Radio: exactly the widget owning the chosen state shows it
        for widget_id in &node.widgets {
            let has_state = {
                let widget = self.doc.get_dictionary(*widget_id)?;
                appearance_state_names(&self.doc, widget, b"N")
                    .is_some_and(|states| states.iter().any(|s| s == value))
            };
            let state = if has_state { value } else { OFF_STATE };
            self.dict_mut(*widget_id)?
                .set("AS", Object::Name(state.as_bytes().to_vec()));
        }
        Ok(())
    }

    fn set_text_value(&mut self, node: &FieldNode, value: &str) -> Result<()> {
        {
            let field = self.dict_mut(node.id)?;
            field.set("V", encode_text(value));
            if node.form_type() == FormType::Choice {
                field.remove(b"I");
            }
        }

        for widget_id in &node.widgets {
            self.write_text_appearance(node, *widget_id, value)?;
        }
        Ok(())
    }

    fn write_text_appearance(&mut self, node: &FieldNode, widget_id: ObjectId, value: &str) -> Result<()> {
        let stream = {
            let widget = self.doc.get_dictionary(widget_id)?;
            text_appearance(&self.doc, node, widget, value)
        };
        let Some(stream) = stream else {
            tracing::debug!(field = %node.name, "Widget has no usable rectangle");
            return Ok(());
        };
        let stream_id = self.doc.add_object(stream);
        let mut ap = Dictionary::new();
        ap.set("N", Object::Reference(stream_id));
        self.dict_mut(widget_id)?.set("AP", Object::Dictionary(ap));
        Ok(())
    }

    /// Build appearances for text and choice widgets that have none, so their
    /// values are not lost when the form is flattened. With `/NeedAppearances`
    /// set, every such widget is rebuilt from its value.
    fn refresh_text_appearances(&mut self) -> Result<()> {
        let rebuild_all = acroform(&self.doc)
            .and_then(|form| form.get(b"NeedAppearances").ok())
            .and_then(|flag| flag.as_bool().ok())
            .unwrap_or(false);

        let nodes: Vec<FieldNode> = terminal_fields(&self.doc)
            .into_iter()
            .flatten()
            .filter(|node| matches!(node.form_type(), FormType::Text | FormType::Choice))
            .collect();

        for node in &nodes {
            let value = node
                .attrs
                .value
                .as_ref()
                .and_then(|v| value_string(&self.doc, v))
                .unwrap_or_default();
            for widget_id in &node.widgets {
                let Ok(widget) = self.doc.get_dictionary(*widget_id) else {
                    continue;
                };
                let has_normal = get_dict(&self.doc, widget, b"AP").is_some_and(|ap| ap.has(b"N"));
                if has_normal && !rebuild_all {
                    continue;
                }
                if value.is_empty() && !has_normal {
                    continue;
                }
                tracing::debug!(field = %node.name, "Regenerating appearance before flatten");
                self.write_text_appearance(node, *widget_id, &value)?;
            }
        }
        Ok(())
    }
}

/// Whether the raw file names an `/Encrypt` dictionary anywhere
fn has_encrypt_entry(bytes: &[u8]) -> bool {
    bytes.windows(8).any(|w| w == b"/Encrypt")
}

impl DocumentModel for LopdfDocument {
    fn page_count(&self) -> u32 {
        self.pages().len() as u32
    }

    fn page_size(&self, page_number: u32) -> Result<(f64, f64)> {
        let page_id = self.page_id(page_number)?;
        let media_box = inherited_page_attr(&self.doc, page_id, b"MediaBox")
            .and_then(|mb| normalized_rect(&self.doc, mb))
            .ok_or_else(|| Error::malformed(format!("page {} has no MediaBox", page_number)))?;
        Ok((media_box[2] - media_box[0], media_box[3] - media_box[1]))
    }

    fn fields(&self) -> Vec<Result<NativeField>> {
        let page_of = annotation_pages(&self.doc);
        let page_numbers: HashMap<ObjectId, u32> =
            self.pages().into_iter().map(|(n, id)| (id, n)).collect();

        terminal_fields(&self.doc)
            .into_iter()
            .map(|node| node.and_then(|node| native_field(&self.doc, &node, &page_of, &page_numbers)))
            .collect()
    }

    fn field(&self, name: &str) -> Option<Result<NativeField>> {
        let node = self.find_node(name)?;
        let page_of = annotation_pages(&self.doc);
        let page_numbers: HashMap<ObjectId, u32> =
            self.pages().into_iter().map(|(n, id)| (id, n)).collect();
        Some(native_field(&self.doc, &node, &page_of, &page_numbers))
    }

    fn set_field_value(&mut self, name: &str, value: &str) -> Result<()> {
        let node = self.find_node(name).ok_or_else(|| Error::FieldNotFound {
            name: name.to_string(),
        })?;
        match node.form_type() {
            FormType::Button => self.set_button_value(&node, value),
            FormType::Signature => {
                self.dict_mut(node.id)?.set("V", encode_text(value));
                Ok(())
            }
            FormType::Text | FormType::Choice | FormType::Other(_) => {
                self.set_text_value(&node, value)
            }
        }
    }

    fn set_widget_appearance_state(&mut self, widget: WidgetId, state: &str) -> Result<()> {
        let id = (widget.0, widget.1);
        let dict = self
            .doc
            .get_object_mut(id)
            .ok()
            .and_then(|obj| obj.as_dict_mut().ok())
            .ok_or_else(|| Error::WidgetNotFound {
                reason: format!("{} {} R", widget.0, widget.1),
            })?;
        dict.set("AS", Object::Name(state.as_bytes().to_vec()));
        Ok(())
    }

    fn flatten_all_fields(&mut self) -> Result<()> {
        self.refresh_text_appearances()?;
        flatten_form(&mut self.doc, &mut self.wrapped_pages)
    }

    fn add_fixed_text(&mut self, page_number: u32, text: &TextPlacement) -> Result<()> {
        let page_id = self.page_id(page_number)?;
        let font_id = self
            .doc
            .add_object(standard_font_dict(text.font.base_font()));
        let font = add_page_resource(&mut self.doc, page_id, "Font", "OvF", Object::Reference(font_id))?;
        let ops = text_ops(&font, text);
        append_page_content(&mut self.doc, &mut self.wrapped_pages, page_id, ops.into_bytes())
    }

    fn add_fixed_image(&mut self, page_number: u32, image: &ImagePlacement) -> Result<()> {
        let page_id = self.page_id(page_number)?;
        let embedded = embed_image(&mut self.doc, &image.bytes)?;
        let (width, height) = draw_size(embedded.width, embedded.height, image.fit);
        let name = add_page_resource(
            &mut self.doc,
            page_id,
            "XObject",
            "OvIm",
            Object::Reference(embedded.id),
        )?;
        let ops = image_ops(&name, image.x, image.y, width, height);
        append_page_content(&mut self.doc, &mut self.wrapped_pages, page_id, ops.into_bytes())
    }
}
