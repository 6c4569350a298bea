//! Content stream operators for fixed text and images

use super::fonts::{encode_win_ansi, text_width, wrap_lines};
use super::objects::{fmt_num, hex_string};
use crate::form::TextPlacement;
use std::fmt::Write;

/// Line height as a multiple of the font size
pub(crate) const LINE_HEIGHT: f64 = 1.2;

/// Baseline offset above the bottom of the last line
const DESCENT: f64 = 0.2;
const UNDERLINE_OFFSET: f64 = -0.12;
const STRIKE_OFFSET: f64 = 0.28;
const DECORATION_THICKNESS: f64 = 0.05;

/// Operators drawing a wrapped text block whose bottom-left corner is at
/// `(x, y)`, using the font registered as `font_resource`
pub(crate) fn text_ops(font_resource: &str, text: &TextPlacement) -> String {
    let base_font = text.font.base_font();
    let lines = wrap_lines(&text.text, base_font, text.size, text.width);
    let line_height = text.size * LINE_HEIGHT;
    let last_baseline = text.y + text.size * DESCENT;

    let mut ops = String::from("q\n");
    if let Some(c) = text.color {
        let _ = writeln!(
            ops,
            "{} {} {} rg",
            fmt_num(f64::from(c.r) / 255.0),
            fmt_num(f64::from(c.g) / 255.0),
            fmt_num(f64::from(c.b) / 255.0)
        );
    }

    let count = lines.len();
    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let baseline = last_baseline + (count - 1 - i) as f64 * line_height;
        let _ = writeln!(
            ops,
            "BT /{} {} Tf {} {} Td {} Tj ET",
            font_resource,
            fmt_num(text.size),
            fmt_num(text.x),
            fmt_num(baseline),
            hex_string(&encode_win_ansi(line))
        );

        let line_width = text_width(base_font, line, text.size);
        let thickness = (text.size * DECORATION_THICKNESS).max(0.5);
        if text.decorations.underline {
            let _ = writeln!(
                ops,
                "{} {} {} {} re f",
                fmt_num(text.x),
                fmt_num(baseline + text.size * UNDERLINE_OFFSET),
                fmt_num(line_width),
                fmt_num(thickness)
            );
        }
        if text.decorations.strike {
            let _ = writeln!(
                ops,
                "{} {} {} {} re f",
                fmt_num(text.x),
                fmt_num(baseline + text.size * STRIKE_OFFSET),
                fmt_num(line_width),
                fmt_num(thickness)
            );
        }
    }

    ops.push_str("Q\n");
    ops
}

/// Operators painting an image XObject into `width` x `height` at `(x, y)`
pub(crate) fn image_ops(image_resource: &str, x: f64, y: f64, width: f64, height: f64) -> String {
    format!(
        "q {} 0 0 {} {} {} cm /{} Do Q\n",
        fmt_num(width),
        fmt_num(height),
        fmt_num(x),
        fmt_num(y),
        image_resource
    )
}
