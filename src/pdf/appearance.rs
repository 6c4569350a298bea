//! Normal appearance streams for variable-text fields

use super::acroform::{acroform, FieldNode, FLAG_MULTILINE};
use super::fonts::{encode_win_ansi, standard_font_dict, text_width, wrap_lines};
use super::objects::{fmt_num, get_dict, get_resolved, hex_string, name, normalized_rect, number, text_or_name};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use std::fmt::Write;

/// Inner padding between the widget border and its text
const PADDING: f64 = 2.0;
const MIN_AUTO_SIZE: f64 = 4.0;
const MAX_AUTO_SIZE: f64 = 12.0;
const FALLBACK_FONT: &str = "Helv";

/// Parsed default appearance string (`/DA`)
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DefaultAppearance {
    pub font: Option<String>,
    /// 0 means auto size
    pub size: f64,
    /// Color operator with operands, e.g. `0 0 1 rg`
    pub color: Option<String>,
}

/// Extract font, size and fill color from a `/DA` string
pub(crate) fn parse_default_appearance(da: &str) -> DefaultAppearance {
    let tokens: Vec<&str> = da.split_whitespace().collect();
    let mut parsed = DefaultAppearance {
        font: None,
        size: 0.0,
        color: None,
    };

    for (i, token) in tokens.iter().enumerate() {
        let operands = match *token {
            "Tf" if i >= 2 => {
                parsed.font = tokens[i - 2].strip_prefix('/').map(str::to_string);
                parsed.size = tokens[i - 1].parse().unwrap_or(0.0);
                continue;
            }
            "g" => 1,
            "rg" => 3,
            "k" => 4,
            _ => continue,
        };
        if i >= operands {
            parsed.color = Some(tokens[i - operands..=i].join(" "));
        }
    }
    parsed
}

/// Font chosen for an appearance: the resource name, the resource object
/// and the base font name used for metrics
struct AppearanceFont {
    name: String,
    resource: Object,
    base_font: String,
}

fn resolve_font(doc: &Document, requested: Option<&str>) -> AppearanceFont {
    let dr_fonts = acroform(doc)
        .and_then(|form| get_dict(doc, form, b"DR"))
        .and_then(|dr| get_dict(doc, dr, b"Font"));

    if let (Some(fonts), Some(requested)) = (dr_fonts, requested) {
        if let Ok(resource) = fonts.get(requested.as_bytes()) {
            let base_font = get_resolved(doc, fonts, requested.as_bytes())
                .and_then(|font| font.as_dict().ok())
                .and_then(|font| get_resolved(doc, font, b"BaseFont"))
                .and_then(name)
                .unwrap_or_else(|| "Helvetica".to_string());
            return AppearanceFont {
                name: requested.to_string(),
                resource: resource.clone(),
                base_font,
            };
        }
    }

    AppearanceFont {
        name: FALLBACK_FONT.to_string(),
        resource: Object::Dictionary(standard_font_dict("Helvetica")),
        base_font: "Helvetica".to_string(),
    }
}

/// Fill color operator from an `/MK` color array
fn color_operator(components: &[Object]) -> Option<String> {
    let values: Vec<String> = components.iter().filter_map(number).map(fmt_num).collect();
    let op = match values.len() {
        1 => "g",
        3 => "rg",
        4 => "k",
        _ => return None,
    };
    Some(format!("{} {}", values.join(" "), op))
}

/// Build the normal appearance of a text or choice widget showing `value`.
/// Returns `None` when the widget has no usable rectangle.
pub(crate) fn text_appearance(
    doc: &Document,
    node: &FieldNode,
    widget: &Dictionary,
    value: &str,
) -> Option<Stream> {
    let rect = normalized_rect(doc, widget.get(b"Rect").ok()?)?;
    let (width, height) = (rect[2] - rect[0], rect[3] - rect[1]);
    if width <= 0.0 || height <= 0.0 {
        return None;
    }

    let da = get_resolved(doc, widget, b"DA")
        .and_then(text_or_name)
        .or_else(|| node.attrs.da.clone())
        .unwrap_or_default();
    let da = parse_default_appearance(&da);
    let quadding = get_resolved(doc, widget, b"Q")
        .and_then(|q| q.as_i64().ok())
        .or(node.attrs.q)
        .unwrap_or(0);
    let multiline = node.flags() & FLAG_MULTILINE != 0;
    let font = resolve_font(doc, da.font.as_deref());

    let inner_width = (width - 2.0 * PADDING).max(1.0);
    let size = if da.size > 0.0 {
        da.size
    } else if multiline {
        MAX_AUTO_SIZE
    } else {
        let by_height = ((height - 2.0 * PADDING) / 1.15).clamp(MIN_AUTO_SIZE, MAX_AUTO_SIZE);
        let unit_width = text_width(&font.base_font, value, 1.0);
        if unit_width > 0.0 {
            by_height.min(inner_width / unit_width).max(MIN_AUTO_SIZE)
        } else {
            by_height
        }
    };

    let lines = if multiline {
        wrap_lines(value, &font.base_font, size, inner_width)
    } else {
        vec![value.replace(['\r', '\n'], " ")]
    };

    let mut ops = String::from("/Tx BMC\n");
    if let Some(Object::Array(bg)) = get_dict(doc, widget, b"MK").and_then(|mk| get_resolved(doc, mk, b"BG")) {
        if let Some(fill) = color_operator(bg) {
            let _ = writeln!(ops, "q {} 0 0 {} {} re f Q", fill, fmt_num(width), fmt_num(height));
        }
    }
    let _ = writeln!(
        ops,
        "q\n1 1 {} {} re W n\nBT\n/{} {} Tf",
        fmt_num(width - 2.0),
        fmt_num(height - 2.0),
        font.name,
        fmt_num(size)
    );
    ops.push_str(da.color.as_deref().unwrap_or("0 g"));
    ops.push('\n');

    let leading = size * 1.15;
    let first_baseline = if multiline {
        height - PADDING - size
    } else {
        (height - size * 0.7) / 2.0
    };
    for (i, line) in lines.iter().enumerate() {
        let line_width = text_width(&font.base_font, line, size);
        let x = match quadding {
            1 => (width - line_width) / 2.0,
            2 => width - PADDING - line_width,
            _ => PADDING,
        };
        let y = first_baseline - i as f64 * leading;
        let _ = writeln!(
            ops,
            "1 0 0 1 {} {} Tm {} Tj",
            fmt_num(x),
            fmt_num(y),
            hex_string(&encode_win_ansi(line))
        );
    }
    ops.push_str("ET\nQ\nEMC\n");

    let mut fonts = Dictionary::new();
    fonts.set(font.name.as_str(), font.resource);
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Form",
        "BBox" => vec![0.into(), 0.into(), Object::Real(width as f32), Object::Real(height as f32)],
        "Resources" => dictionary! { "Font" => fonts },
    };
    Some(Stream::new(dict, ops.into_bytes()))
}
