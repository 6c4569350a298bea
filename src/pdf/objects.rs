//! Small helpers for reading lopdf object graphs

use crate::error::{Error, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

/// Maximum number of reference hops followed before giving up
const MAX_REFERENCE_DEPTH: usize = 16;

/// Follow indirect references until a direct object is reached
pub(crate) fn resolve<'a>(doc: &'a Document, mut obj: &'a Object) -> Result<&'a Object> {
    for _ in 0..MAX_REFERENCE_DEPTH {
        match obj {
            Object::Reference(id) => obj = doc.get_object(*id)?,
            direct => return Ok(direct),
        }
    }
    Err(Error::malformed("reference chain too deep"))
}

/// Resolve `dict[key]`, returning `None` when absent or dangling
pub(crate) fn get_resolved<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().and_then(|obj| resolve(doc, obj).ok())
}

/// Resolve `dict[key]` as a dictionary (stream dictionaries excluded)
pub(crate) fn get_dict<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    match get_resolved(doc, dict, key)? {
        Object::Dictionary(d) => Some(d),
        _ => None,
    }
}

pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(f64::from(*f)),
        _ => None,
    }
}

pub(crate) fn name(obj: &Object) -> Option<String> {
    match obj {
        Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
        _ => None,
    }
}

/// Decode a PDF text string (UTF-16BE with BOM, UTF-8 with BOM, or
/// PDFDocEncoding, read as Latin-1)
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode a text string, using UTF-16BE only when ASCII does not suffice
pub(crate) fn encode_text(text: &str) -> Object {
    if text.is_ascii() {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Text string or name as a Rust string
pub(crate) fn text_or_name(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text(bytes)),
        Object::Name(_) => name(obj),
        _ => None,
    }
}

/// Raw rectangle components; non-numeric entries become `None`
pub(crate) fn raw_rect(doc: &Document, dict: &Dictionary) -> Option<Vec<Option<f64>>> {
    match get_resolved(doc, dict, b"Rect")? {
        Object::Array(items) => Some(
            items
                .iter()
                .map(|item| resolve(doc, item).ok().and_then(number))
                .collect(),
        ),
        _ => None,
    }
}

/// Normalized rectangle `[llx, lly, urx, ury]` from a four-number array
pub(crate) fn normalized_rect(doc: &Document, obj: &Object) -> Option<[f64; 4]> {
    let items = match resolve(doc, obj).ok()? {
        Object::Array(items) if items.len() >= 4 => items,
        _ => return None,
    };
    let mut v = [0.0; 4];
    for (slot, item) in v.iter_mut().zip(items) {
        *slot = number(resolve(doc, item).ok()?)?;
    }
    Some([v[0].min(v[2]), v[1].min(v[3]), v[0].max(v[2]), v[1].max(v[3])])
}

/// Look up a page attribute, walking `/Parent` for inheritable keys
pub(crate) fn inherited_page_attr<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut dict = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_REFERENCE_DEPTH {
        if let Ok(value) = dict.get(key) {
            return resolve(doc, value).ok();
        }
        dict = match dict.get(b"Parent").ok()? {
            Object::Reference(parent) => doc.get_dictionary(*parent).ok()?,
            _ => return None,
        };
    }
    None
}

/// Format a number for a content stream without trailing zeros
pub(crate) fn fmt_num(value: f64) -> String {
    let s = format!("{:.4}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "" | "-0" | "-" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Hex string literal for a content stream
pub(crate) fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 2);
    out.push('<');
    for b in bytes {
        out.push_str(&format!("{:02X}", b));
    }
    out.push('>');
    out
}
