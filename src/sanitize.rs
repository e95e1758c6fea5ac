//! Reduction of free text to the character repertoire of the built-in PDF
//! fonts. Everything that reaches a content stream goes through here.

/// Semantic replacements applied before the catch-all. Every replacement is
/// printable ASCII so a second pass finds nothing to change.
fn substitute(c: char) -> Option<&'static str> {
    let s = match c {
        'à' | 'â' | 'ä' | 'á' | 'ã' | 'å' => "a",
        'À' | 'Â' | 'Ä' | 'Á' | 'Ã' | 'Å' => "A",
        'é' | 'è' | 'ê' | 'ë' => "e",
        'É' | 'È' | 'Ê' | 'Ë' => "E",
        'î' | 'ï' | 'í' | 'ì' => "i",
        'Î' | 'Ï' | 'Í' | 'Ì' => "I",
        'ô' | 'ö' | 'ó' | 'ò' | 'õ' => "o",
        'Ô' | 'Ö' | 'Ó' | 'Ò' | 'Õ' => "O",
        'û' | 'ü' | 'ù' | 'ú' => "u",
        'Û' | 'Ü' | 'Ù' | 'Ú' => "U",
        'ÿ' => "y",
        'Ÿ' => "Y",
        'ç' => "c",
        'Ç' => "C",
        'ñ' => "n",
        'Ñ' => "N",
        'œ' => "oe",
        'Œ' => "OE",
        'æ' => "ae",
        'Æ' => "AE",
        'ß' => "ss",
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => "'",
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '«' | '»' => "\"",
        '\u{2013}' | '\u{2014}' | '\u{2011}' | '\u{2212}' => "-",
        '\u{2026}' => "...",
        '\u{2022}' | '·' => "-",
        '\u{2705}' | '\u{2714}' | '\u{2713}' => "+",
        '\u{274C}' | '\u{2716}' | '\u{2717}' => "-",
        '°' => " degres ",
        '²' => "2",
        '³' => "3",
        '€' => "EUR",
        '\u{00A0}' | '\u{202F}' | '\u{2009}' => " ",
        _ => return None,
    };
    Some(s)
}

/// Map arbitrary text onto printable ASCII (`0x20..=0x7E`).
///
/// Known characters are transliterated; anything else, control characters
/// included, becomes a single space. Character order is preserved and the
/// function is idempotent.
pub fn sanitize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if let Some(rep) = substitute(c) {
            out.push_str(rep);
        } else if (' '..='~').contains(&c) {
            out.push(c);
        } else {
            out.push(' ');
        }
    }
    out
}

/// Sanitize a multi-line field line by line, keeping explicit line breaks.
pub(crate) fn sanitize_lines(text: &str) -> Vec<String> {
    text.lines().map(sanitize_text).collect()
}
