//! Page content and resource editing

use super::objects::{get_resolved, inherited_page_attr, resolve};
use crate::error::{Error, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashSet;

/// Register `value` under a fresh name in the page's `/Resources/<category>`
/// and return the name. The page gets its own direct resource dictionary,
/// copied from an inherited or indirect one when needed.
pub(crate) fn add_page_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    prefix: &str,
    value: Object,
) -> Result<String> {
    let mut resources = effective_resources(doc, page_id);

    let mut entries = match resources.get(category.as_bytes()) {
        Ok(obj) => match resolve(doc, obj)? {
            Object::Dictionary(d) => d.clone(),
            _ => Dictionary::new(),
        },
        Err(_) => Dictionary::new(),
    };

    let name = (1..)
        .map(|n| format!("{}{}", prefix, n))
        .find(|candidate| !entries.has(candidate.as_bytes()))
        .ok_or_else(|| Error::malformed("resource names exhausted"))?;

    entries.set(name.as_str(), value);
    resources.set(category, Object::Dictionary(entries));

    page_dict_mut(doc, page_id)?.set("Resources", Object::Dictionary(resources));
    Ok(name)
}

fn effective_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    match inherited_page_attr(doc, page_id, b"Resources") {
        Some(Object::Dictionary(d)) => d.clone(),
        _ => Dictionary::new(),
    }
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    doc.get_object_mut(page_id)?
        .as_dict_mut()
        .map_err(|_| Error::malformed(format!("page {:?} is not a dictionary", page_id)))
}

/// Append a content stream to a page. The first append on a page wraps the
/// existing content in `q`/`Q` so that its graphics state cannot leak into
/// the appended operators.
pub(crate) fn append_page_content(
    doc: &mut Document,
    wrapped: &mut HashSet<ObjectId>,
    page_id: ObjectId,
    ops: Vec<u8>,
) -> Result<()> {
    let existing: Vec<Object> = {
        let page = doc.get_dictionary(page_id)?;
        match page.get(b"Contents") {
            Ok(Object::Array(items)) => items.clone(),
            Ok(Object::Reference(id)) => match doc.get_object(*id)? {
                // An indirect array of streams is flattened into the page
                Object::Array(items) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            _ => Vec::new(),
        }
    };

    let mut contents = Vec::with_capacity(existing.len() + 3);
    if !existing.is_empty() && !wrapped.contains(&page_id) {
        let open = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let close = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
        contents.push(Object::Reference(open));
        contents.extend(existing);
        contents.push(Object::Reference(close));
    } else {
        contents.extend(existing);
    }
    wrapped.insert(page_id);

    let appended = doc.add_object(Stream::new(Dictionary::new(), ops));
    contents.push(Object::Reference(appended));

    page_dict_mut(doc, page_id)?.set("Contents", Object::Array(contents));
    Ok(())
}

/// Remove the given annotations from a page's `/Annots`
pub(crate) fn remove_annotations(
    doc: &mut Document,
    page_id: ObjectId,
    remove: &HashSet<ObjectId>,
) -> Result<()> {
    let annots = {
        let page = doc.get_dictionary(page_id)?;
        match get_resolved(doc, page, b"Annots") {
            Some(Object::Array(items)) => items.clone(),
            _ => return Ok(()),
        }
    };

    let kept: Vec<Object> = annots
        .into_iter()
        .filter(|obj| !matches!(obj, Object::Reference(id) if remove.contains(id)))
        .collect();

    let page = page_dict_mut(doc, page_id)?;
    if kept.is_empty() {
        page.remove(b"Annots");
    } else {
        page.set("Annots", Object::Array(kept));
    }
    Ok(())
}
