use pdf_writer::{Name, Pdf, Ref};

use crate::model::FontStyle;

pub(crate) const PT_TO_MM: f32 = 25.4 / 72.0;

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
}

/// Helvetica advance widths (1000 units/em) for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold advance widths for ASCII 32..=126.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a-m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n-z
    389, 280, 389, 584, // '{'..'~'
];

impl FontStyle {
    fn base_font(self) -> &'static [u8] {
        match self {
            FontStyle::Regular => b"Helvetica",
            FontStyle::Bold => b"Helvetica-Bold",
            FontStyle::Italic => b"Helvetica-Oblique",
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            FontStyle::Bold => &HELVETICA_BOLD_WIDTHS,
            // Oblique shares the upright metrics
            FontStyle::Regular | FontStyle::Italic => &HELVETICA_WIDTHS,
        }
    }
}

fn char_width_1000(style: FontStyle, ch: char) -> f32 {
    let code = ch as u32;
    if (32..=126).contains(&code) {
        style.widths()[(code - 32) as usize] as f32
    } else {
        // Sanitized text never gets here; measure like a digit.
        556.0
    }
}

/// Width of `text` in millimetres at `size` points.
pub(crate) fn text_width(text: &str, style: FontStyle, size: f32) -> f32 {
    let units: f32 = text.chars().map(|ch| char_width_1000(style, ch)).sum();
    units * size / 1000.0 * PT_TO_MM
}

/// Font size in points expressed in millimetres.
pub(crate) fn size_mm(size: f32) -> f32 {
    size * PT_TO_MM
}

/// Encode sanitized text for a WinAnsi-encoded Type1 font. ASCII maps to
/// itself; anything else is replaced so the stream stays single-byte.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| if (' '..='~').contains(&c) { c as u8 } else { b'?' })
        .collect()
}

/// Write the three standard Helvetica faces as WinAnsi Type1 fonts.
pub(crate) fn register_fonts(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
) -> Vec<(FontStyle, FontEntry)> {
    [FontStyle::Regular, FontStyle::Bold, FontStyle::Italic]
        .into_iter()
        .enumerate()
        .map(|(i, style)| {
            let font_ref = alloc();
            pdf.type1_font(font_ref)
                .base_font(Name(style.base_font()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            let entry = FontEntry {
                pdf_name: format!("F{}", i + 1),
                font_ref,
            };
            (style, entry)
        })
        .collect()
}
