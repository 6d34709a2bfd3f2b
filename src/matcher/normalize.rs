//! Text canonicalization for resilient phrase matching.
//!
//! Pipeline:
//! 1. NFKD (compatibility decomposition)
//! 2. lower-case, then NFKD again (lower-casing can emit new marks, e.g. `İ`)
//! 3. drop every char with a non-zero canonical combining class
//! 4. fold script letter variants through [`LETTER_FOLDS`]
//! 5. collapse whitespace runs to one space and trim
//! 6. NFC recomposition
//!
//! The output is stable under re-application.

use unicode_normalization::char::canonical_combining_class;
use unicode_normalization::UnicodeNormalization;

/// Letter variants folded to one representative. `None` removes the char.
///
/// Alef forms with hamza/madda decompose under NFKD already; they are listed
/// so the table reads as the complete equivalence set.
pub const LETTER_FOLDS: &[(char, Option<char>)] = &[
    ('\u{0623}', Some('\u{0627}')), // alef with hamza above -> alef
    ('\u{0625}', Some('\u{0627}')), // alef with hamza below -> alef
    ('\u{0622}', Some('\u{0627}')), // alef with madda -> alef
    ('\u{0671}', Some('\u{0627}')), // alef wasla -> alef
    ('\u{0649}', Some('\u{064A}')), // alef maksura -> yeh
    ('\u{06CC}', Some('\u{064A}')), // farsi yeh -> yeh
    ('\u{0626}', Some('\u{064A}')), // yeh with hamza -> yeh
    ('\u{0624}', Some('\u{0648}')), // waw with hamza -> waw
    ('\u{0629}', Some('\u{0647}')), // teh marbuta -> heh
    ('\u{0640}', None),             // tatweel
];

/// Canonicalize `text` for containment checks.
pub fn normalize(text: &str) -> String {
    let lowered = text.nfkd().collect::<String>().to_lowercase();

    let stripped: String = lowered
        .nfkd()
        .filter(|c| canonical_combining_class(*c) == 0)
        .filter_map(fold_letter)
        .collect();

    collapse_whitespace(&stripped).nfc().collect()
}

fn fold_letter(c: char) -> Option<char> {
    match LETTER_FOLDS.iter().find(|(from, _)| *from == c) {
        Some((_, to)) => *to,
        None => Some(c),
    }
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_trims() {
        assert_eq!(normalize("  Hello   World \n"), "hello world");
    }

    #[test]
    fn test_strips_latin_diacritics() {
        assert_eq!(normalize("Wörld"), "world");
        assert_eq!(normalize("Crème Brûlée"), "creme brulee");
    }

    #[test]
    fn test_precomposed_and_decomposed_agree() {
        assert_eq!(normalize("caf\u{00E9}"), normalize("cafe\u{0301}"));
    }

    #[test]
    fn test_compatibility_forms() {
        // fullwidth letters and the fi ligature fold under NFKD
        assert_eq!(normalize("ＡＢＣ"), "abc");
        assert_eq!(normalize("\u{FB01}nd"), "find");
    }

    #[test]
    fn test_arabic_harakat_removed() {
        // "register now" with fatha/sukun marks
        assert_eq!(normalize("سَجِّلْ الآن"), normalize("سجل الان"));
    }

    #[test]
    fn test_arabic_alef_variants_fold() {
        let plain = normalize("\u{0627}حمد");
        assert_eq!(normalize("\u{0623}حمد"), plain);
        assert_eq!(normalize("\u{0625}حمد"), plain);
        assert_eq!(normalize("\u{0622}حمد"), plain);
    }

    #[test]
    fn test_arabic_yeh_waw_teh_marbuta_fold() {
        assert_eq!(normalize("على"), normalize("علي"));
        assert_eq!(normalize("مسؤول"), normalize("مسوول"));
        assert_eq!(normalize("مدرسة"), normalize("مدرسه"));
        assert_eq!(normalize("شاطئ"), normalize("شاطي"));
    }

    #[test]
    fn test_tatweel_removed() {
        assert_eq!(normalize("سـجـل"), "سجل");
    }

    #[test]
    fn test_arabic_presentation_forms() {
        // isolated/final presentation forms decompose to base letters
        assert_eq!(normalize("\u{FEB3}\u{FEA0}\u{FEDE}"), normalize("سجل"));
    }

    #[test]
    fn test_empty_and_whitespace_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t\n "), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Hello  Wörld",
            "سَجِّلْ الآن",
            "İstanbul",
            "ℌello ＷＯＲＬＤ",
            "한국어 텍스트",
            "Ǆemal",
            "ﷺ ﷲ",
            "a\u{0301}\u{0327}b",
            "\u{0B92}\u{0BD7}",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_hangul_survives() {
        assert_eq!(normalize("한국어"), "한국어");
    }
}
