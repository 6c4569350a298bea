//! Standard 14 font metrics, WinAnsi encoding and line wrapping

use lopdf::{dictionary, Dictionary};

/// Advance widths (1/1000 em) for ASCII 32..=126
type WidthTable = [u16; 95];

const HELVETICA_WIDTHS: WidthTable = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // sp - /
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0 - 9
    278, 278, 584, 584, 584, 556, 1015, // : - @
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A - M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N - Z
    278, 278, 278, 469, 556, 333, // [ - `
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a - m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n - z
    334, 260, 334, 584, // { - ~
];

const HELVETICA_BOLD_WIDTHS: WidthTable = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

const TIMES_ROMAN_WIDTHS: WidthTable = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    278, 278, 564, 564, 564, 444, 921,
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
    333, 278, 333, 469, 500, 333,
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
    480, 200, 480, 541,
];

/// Width table selection for a base font name
#[derive(Debug, Clone, Copy, PartialEq)]
enum Metrics {
    Table(&'static WidthTable),
    Fixed(u16),
}

fn metrics_for(base_font: &str) -> Metrics {
    if base_font.starts_with("Courier") {
        Metrics::Fixed(600)
    } else if base_font.starts_with("Times") {
        // Times-Bold and the italics are close enough to the roman widths
        Metrics::Table(&TIMES_ROMAN_WIDTHS)
    } else if base_font.starts_with("Helvetica-Bold") || base_font.starts_with("Arial-Bold") {
        Metrics::Table(&HELVETICA_BOLD_WIDTHS)
    } else if base_font == "Symbol" || base_font == "ZapfDingbats" {
        Metrics::Fixed(600)
    } else {
        Metrics::Table(&HELVETICA_WIDTHS)
    }
}

/// Advance width of one character in 1/1000 em
pub fn char_width(base_font: &str, c: char) -> u16 {
    match metrics_for(base_font) {
        Metrics::Fixed(w) => w,
        Metrics::Table(table) => match c as u32 {
            code @ 32..=126 => table[(code - 32) as usize],
            // Latin-1 letters and punctuation: use the width of 'n'
            _ => table[(b'n' - 32) as usize],
        },
    }
}

/// Width of a string in points at the given size
pub fn text_width(base_font: &str, text: &str, size: f64) -> f64 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(base_font, c))).sum();
    f64::from(units) * size / 1000.0
}

/// Encode text as WinAnsi bytes. Unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter(|c| *c != '\n' && *c != '\r')
        .map(|c| match c as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => match c {
                '€' => 0x80,
                '‚' => 0x82,
                '„' => 0x84,
                '…' => 0x85,
                '‘' => 0x91,
                '’' => 0x92,
                '“' => 0x93,
                '”' => 0x94,
                '•' => 0x95,
                '–' => 0x96,
                '—' => 0x97,
                '™' => 0x99,
                '\t' => b' ',
                _ => b'?',
            },
        })
        .collect()
}

/// Wrap text into lines no wider than `max_width`. Explicit newlines always
/// break; a single word wider than the line is split by character.
pub fn wrap_lines(text: &str, base_font: &str, size: f64, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let mut current = String::new();

        for word in paragraph.split(' ') {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if text_width(base_font, &candidate, size) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for c in word.chars() {
                current.push(c);
                if current.chars().count() > 1 && text_width(base_font, &current, size) > max_width {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }
        lines.push(current);
    }

    lines
}

/// Font resource dictionary for a standard 14 font
pub fn standard_font_dict(base_font: &str) -> Dictionary {
    let mut dict = dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
    };
    if base_font != "Symbol" && base_font != "ZapfDingbats" {
        dict.set("Encoding", "WinAnsiEncoding");
    }
    dict
}
