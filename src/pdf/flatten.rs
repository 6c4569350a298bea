//! Form flattening: widget appearances become page content

use super::acroform::is_widget;
use super::content::{add_page_resource, append_page_content, remove_annotations};
use super::objects::{fmt_num, get_dict, get_resolved, name, normalized_rect, number, resolve};
use crate::error::{Error, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;
use std::fmt::Write;

/// Annotation flag bits that keep a widget from being drawn
const FLAG_HIDDEN: i64 = 1 << 1;
const FLAG_NO_VIEW: i64 = 1 << 5;

/// One widget appearance to paint on a page
#[derive(Debug, Clone, PartialEq)]
struct Stamp {
    stream: ObjectId,
    rect: [f64; 4],
}

/// Paint every visible widget appearance into its page, remove all widget
/// annotations and drop the interactive form
pub(crate) fn flatten_form(doc: &mut Document, wrapped: &mut HashSet<ObjectId>) -> Result<()> {
    let pages = doc.get_pages();
    let mut stamped = 0usize;

    for (number, page_id) in pages {
        let (widgets, stamps) = collect_widgets(doc, page_id)?;
        if widgets.is_empty() {
            continue;
        }

        let mut ops = String::new();
        for stamp in &stamps {
            if let Some(op) = stamp_ops(doc, page_id, stamp)? {
                ops.push_str(&op);
                stamped += 1;
            }
        }
        if !ops.is_empty() {
            append_page_content(doc, wrapped, page_id, ops.into_bytes())?;
        }
        remove_annotations(doc, page_id, &widgets)?;
        tracing::debug!(page = number, widgets = widgets.len(), "Flattened page widgets");
    }

    remove_acroform(doc)?;
    tracing::debug!(stamped, "Flattened form");
    Ok(())
}

fn collect_widgets(doc: &Document, page_id: ObjectId) -> Result<(HashSet<ObjectId>, Vec<Stamp>)> {
    let page = doc.get_dictionary(page_id)?;
    let annots = match get_resolved(doc, page, b"Annots") {
        Some(Object::Array(items)) => items,
        _ => return Ok((HashSet::new(), Vec::new())),
    };

    let mut widgets = HashSet::new();
    let mut stamps = Vec::new();
    for annot in annots {
        let Object::Reference(id) = annot else {
            continue;
        };
        let Ok(dict) = doc.get_dictionary(*id) else {
            continue;
        };
        if !is_widget(dict) {
            continue;
        }
        widgets.insert(*id);

        let flags = get_resolved(doc, dict, b"F")
            .and_then(|f| f.as_i64().ok())
            .unwrap_or(0);
        if flags & (FLAG_HIDDEN | FLAG_NO_VIEW) != 0 {
            continue;
        }
        let Some(rect) = dict.get(b"Rect").ok().and_then(|r| normalized_rect(doc, r)) else {
            continue;
        };
        if let Some(stream) = selected_appearance(doc, dict) {
            stamps.push(Stamp { stream, rect });
        }
    }
    Ok((widgets, stamps))
}

/// The widget's normal appearance stream, picking the `/AS` state when the
/// normal appearance is a state dictionary
fn selected_appearance(doc: &Document, widget: &Dictionary) -> Option<ObjectId> {
    let ap = get_dict(doc, widget, b"AP")?;
    let (id, normal) = match ap.get(b"N").ok()? {
        Object::Reference(id) => (Some(*id), doc.get_object(*id).ok()?),
        direct => (None, direct),
    };
    match normal {
        Object::Stream(_) => id,
        Object::Dictionary(states) => {
            let state = get_resolved(doc, widget, b"AS").and_then(name)?;
            match states.get(state.as_bytes()).ok()? {
                Object::Reference(stream) => Some(*stream),
                _ => None,
            }
        }
        _ => None,
    }
}

fn matrix(doc: &Document, dict: &Dictionary) -> [f64; 6] {
    let identity = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
    let Some(Object::Array(items)) = get_resolved(doc, dict, b"Matrix") else {
        return identity;
    };
    let values: Vec<f64> = items
        .iter()
        .filter_map(|item| resolve(doc, item).ok().and_then(number))
        .collect();
    match values.as_slice() {
        [a, b, c, d, e, f] => [*a, *b, *c, *d, *e, *f],
        _ => identity,
    }
}

/// Bounding box of `bbox` after applying `m`
fn transformed_bbox(bbox: [f64; 4], m: [f64; 6]) -> [f64; 4] {
    let corners = [
        (bbox[0], bbox[1]),
        (bbox[2], bbox[1]),
        (bbox[0], bbox[3]),
        (bbox[2], bbox[3]),
    ];
    corners.iter().fold(
        [f64::MAX, f64::MAX, f64::MIN, f64::MIN],
        |acc, (x, y)| {
            let tx = m[0] * x + m[2] * y + m[4];
            let ty = m[1] * x + m[3] * y + m[5];
            [acc[0].min(tx), acc[1].min(ty), acc[2].max(tx), acc[3].max(ty)]
        },
    )
}

/// Operators painting one appearance into its widget rectangle, or `None`
/// for a degenerate appearance box
fn stamp_ops(doc: &mut Document, page_id: ObjectId, stamp: &Stamp) -> Result<Option<String>> {
    let [rx0, ry0, rx1, ry1] = stamp.rect;

    let (bbox, m) = {
        let stream = doc
            .get_object(stamp.stream)?
            .as_stream()
            .map_err(|_| Error::malformed("appearance is not a stream"))?;
        let bbox = stream
            .dict
            .get(b"BBox")
            .ok()
            .and_then(|b| normalized_rect(doc, b))
            .unwrap_or([0.0, 0.0, rx1 - rx0, ry1 - ry0]);
        (bbox, matrix(doc, &stream.dict))
    };

    let [tx0, ty0, tx1, ty1] = transformed_bbox(bbox, m);
    if tx1 - tx0 <= f64::EPSILON || ty1 - ty0 <= f64::EPSILON {
        return Ok(None);
    }

    {
        let stream = doc
            .get_object_mut(stamp.stream)?
            .as_stream_mut()
            .map_err(|_| Error::malformed("appearance is not a stream"))?;
        stream.dict.set("Type", "XObject");
        stream.dict.set("Subtype", "Form");
        if !stream.dict.has(b"BBox") {
            stream.dict.set(
                "BBox",
                bbox.iter().map(|v| Object::Real(*v as f32)).collect::<Vec<_>>(),
            );
        }
    }

    let name = add_page_resource(doc, page_id, "XObject", "Fm", Object::Reference(stamp.stream))?;

    let sx = (rx1 - rx0) / (tx1 - tx0);
    let sy = (ry1 - ry0) / (ty1 - ty0);
    let mut ops = String::new();
    let _ = writeln!(
        ops,
        "q {} 0 0 {} {} {} cm /{} Do Q",
        fmt_num(sx),
        fmt_num(sy),
        fmt_num(rx0 - tx0 * sx),
        fmt_num(ry0 - ty0 * sy),
        name
    );
    Ok(Some(ops))
}

fn remove_acroform(doc: &mut Document) -> Result<()> {
    let root = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| Error::malformed("trailer has no catalog reference"))?;
    doc.get_object_mut(root)?
        .as_dict_mut()
        .map_err(|_| Error::malformed("catalog is not a dictionary"))?
        .remove(b"AcroForm");
    Ok(())
}
