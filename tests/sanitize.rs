use visit_report::sanitize_text;

fn is_printable_ascii(s: &str) -> bool {
    s.chars().all(|c| (' '..='~').contains(&c))
}

#[test]
fn french_text_is_transliterated() {
    assert_eq!(
        sanitize_text("Façade à rénover, œuvre « urgente »"),
        "Facade a renover, oeuvre \" urgente \""
    );
    assert_eq!(sanitize_text("Température 19°"), "Temperature 19 degres ");
    assert_eq!(sanitize_text("Devis 1 200 €"), "Devis 1 200 EUR");
}

#[test]
fn symbols_become_plus_and_minus() {
    assert_eq!(sanitize_text("✅ fait ❌ non fait"), "+ fait - non fait");
    assert_eq!(sanitize_text("l\u{2019}escalier \u{2013} étage"), "l'escalier - etage");
}

#[test]
fn unknown_and_control_characters_become_spaces() {
    assert_eq!(sanitize_text("a\tb\nc"), "a b c");
    assert_eq!(sanitize_text("日本"), "  ");
    assert_eq!(sanitize_text("🏠ok"), " ok");
}

#[test]
fn output_is_printable_and_idempotent() {
    let samples = [
        "",
        "plain ascii ~!@#",
        "Héllo wörld ÀÉÎÕÜ çÇ ñ ß æŒ",
        "tabs\tand\r\nnewlines",
        "“quotes” ‘single’ … — – •",
        "✔ ✓ ✖ ✗ ² ³ m²",
        "mixed 🚧 emoji ☃ and 中文",
        "\u{00A0}nbsp\u{202F}narrow\u{2009}thin",
    ];
    for s in samples {
        let once = sanitize_text(s);
        assert!(is_printable_ascii(&once), "{s:?} -> {once:?}");
        assert_eq!(sanitize_text(&once), once, "not idempotent for {s:?}");
    }
}

#[test]
fn printable_ascii_passes_through_unchanged() {
    let all: String = (' '..='~').collect();
    assert_eq!(sanitize_text(&all), all);
}
