//! Mapping of letters and digits to the Unicode Mathematical Alphanumeric
//! Symbols block for each font style.

use crate::model::FontStyle;

const GREEK_CAPITAL_START: u32 = 0x0391;
const GREEK_CAPITAL_END: u32 = 0x03A9;
const GREEK_LOWER_START: u32 = 0x03B1;
const GREEK_LOWER_END: u32 = 0x03C9;
const PLANCK_CONSTANT: u32 = 0x210E;

const MATH_CAPITAL_ITALIC_START: u32 = 0x1D434;
const MATH_LOWER_ITALIC_START: u32 = 0x1D44E;
const MATH_CAPITAL_BOLD_START: u32 = 0x1D400;
const MATH_LOWER_BOLD_START: u32 = 0x1D41A;
const NUMBER_BOLD_START: u32 = 0x1D7CE;
const MATH_CAPITAL_BOLD_ITALIC_START: u32 = 0x1D468;
const MATH_LOWER_BOLD_ITALIC_START: u32 = 0x1D482;

const GREEK_CAPITAL_ITALIC_START: u32 = 0x1D6E2;
const GREEK_LOWER_ITALIC_START: u32 = 0x1D6FC;
const GREEK_SYMBOL_ITALIC_START: u32 = 0x1D716;
const GREEK_CAPITAL_BOLD_START: u32 = 0x1D6A8;
const GREEK_LOWER_BOLD_START: u32 = 0x1D6C2;
const GREEK_SYMBOL_BOLD_START: u32 = 0x1D6DC;
const GREEK_CAPITAL_BOLD_ITALIC_START: u32 = 0x1D71C;
const GREEK_LOWER_BOLD_ITALIC_START: u32 = 0x1D736;
const GREEK_SYMBOL_BOLD_ITALIC_START: u32 = 0x1D750;

const MATH_CAPITAL_SCRIPT_START: u32 = 0x1D49C;
const MATH_CAPITAL_TT_START: u32 = 0x1D670;
const MATH_LOWER_TT_START: u32 = 0x1D68A;
const NUMBER_TT_START: u32 = 0x1D7F6;
const MATH_CAPITAL_SANS_SERIF_START: u32 = 0x1D5A0;
const MATH_LOWER_SANS_SERIF_START: u32 = 0x1D5BA;
const NUMBER_SANS_SERIF_START: u32 = 0x1D7E2;
const MATH_CAPITAL_FRAKTUR_START: u32 = 0x1D504;
const MATH_LOWER_FRAKTUR_START: u32 = 0x1D51E;
const MATH_CAPITAL_BLACKBOARD_START: u32 = 0x1D538;
const MATH_LOWER_BLACKBOARD_START: u32 = 0x1D552;
const NUMBER_BLACKBOARD_START: u32 = 0x1D7D8;

/// epsilon, vartheta, varkappa, phi, varrho, varpi in the order the styled
/// blocks list them after the alphabet
const GREEK_SYMBOLS: [u32; 6] = [0x03F5, 0x03D1, 0x03F0, 0x03D5, 0x03F1, 0x03D6];

/// The character class used to pick an offset into a styled block
enum CharClass {
    UpperLatin(u32),
    LowerLatin(u32),
    Digit(u32),
    UpperGreek(u32),
    LowerGreek(u32),
    GreekSymbol(u32),
    Other,
}

fn classify(ch: char) -> CharClass {
    let code = ch as u32;
    match ch {
        'A'..='Z' => CharClass::UpperLatin(code - 'A' as u32),
        'a'..='z' => CharClass::LowerLatin(code - 'a' as u32),
        '0'..='9' => CharClass::Digit(code - '0' as u32),
        _ if (GREEK_CAPITAL_START..=GREEK_CAPITAL_END).contains(&code) => {
            CharClass::UpperGreek(code - GREEK_CAPITAL_START)
        }
        _ if (GREEK_LOWER_START..=GREEK_LOWER_END).contains(&code) => {
            CharClass::LowerGreek(code - GREEK_LOWER_START)
        }
        _ => match GREEK_SYMBOLS.iter().position(|&symbol| symbol == code) {
            Some(order) => CharClass::GreekSymbol(order as u32),
            None => CharClass::Other,
        },
    }
}

fn offset(start: u32, delta: u32) -> Option<u32> {
    Some(start + delta)
}

fn italic(ch: char) -> Option<u32> {
    if ch == 'h' {
        return Some(PLANCK_CONSTANT);
    }
    match classify(ch) {
        CharClass::UpperLatin(d) => offset(MATH_CAPITAL_ITALIC_START, d),
        CharClass::LowerLatin(d) => offset(MATH_LOWER_ITALIC_START, d),
        CharClass::UpperGreek(d) => offset(GREEK_CAPITAL_ITALIC_START, d),
        CharClass::LowerGreek(d) => offset(GREEK_LOWER_ITALIC_START, d),
        CharClass::GreekSymbol(d) => offset(GREEK_SYMBOL_ITALIC_START, d),
        CharClass::Digit(_) | CharClass::Other => None,
    }
}

fn bold(ch: char) -> Option<u32> {
    match classify(ch) {
        CharClass::UpperLatin(d) => offset(MATH_CAPITAL_BOLD_START, d),
        CharClass::LowerLatin(d) => offset(MATH_LOWER_BOLD_START, d),
        CharClass::UpperGreek(d) => offset(GREEK_CAPITAL_BOLD_START, d),
        CharClass::LowerGreek(d) => offset(GREEK_LOWER_BOLD_START, d),
        CharClass::GreekSymbol(d) => offset(GREEK_SYMBOL_BOLD_START, d),
        CharClass::Digit(d) => offset(NUMBER_BOLD_START, d),
        CharClass::Other => None,
    }
}

fn bold_italic(ch: char) -> Option<u32> {
    match classify(ch) {
        CharClass::UpperLatin(d) => offset(MATH_CAPITAL_BOLD_ITALIC_START, d),
        CharClass::LowerLatin(d) => offset(MATH_LOWER_BOLD_ITALIC_START, d),
        CharClass::UpperGreek(d) => offset(GREEK_CAPITAL_BOLD_ITALIC_START, d),
        CharClass::LowerGreek(d) => offset(GREEK_LOWER_BOLD_ITALIC_START, d),
        CharClass::GreekSymbol(d) => offset(GREEK_SYMBOL_BOLD_ITALIC_START, d),
        // No bold italic digits
        CharClass::Digit(d) => offset(NUMBER_BOLD_START, d),
        CharClass::Other => None,
    }
}

/// Letters and lowercase Greek are italic; digits and capital Greek stay roman.
fn default_style(ch: char) -> Option<u32> {
    match classify(ch) {
        CharClass::UpperLatin(_)
        | CharClass::LowerLatin(_)
        | CharClass::LowerGreek(_)
        | CharClass::GreekSymbol(_) => italic(ch),
        _ => None,
    }
}

fn caligraphic(ch: char) -> Option<u32> {
    let letterlike = match ch {
        'B' => 0x212C,
        'E' => 0x2130,
        'F' => 0x2131,
        'H' => 0x210B,
        'I' => 0x2110,
        'L' => 0x2112,
        'M' => 0x2133,
        'R' => 0x211B,
        'e' => 0x212F,
        'g' => 0x210A,
        'o' => 0x2134,
        _ => 0,
    };
    if letterlike != 0 {
        return Some(letterlike);
    }
    match classify(ch) {
        CharClass::UpperLatin(d) => offset(MATH_CAPITAL_SCRIPT_START, d),
        _ => default_style(ch),
    }
}

fn typewriter(ch: char) -> Option<u32> {
    match classify(ch) {
        CharClass::UpperLatin(d) => offset(MATH_CAPITAL_TT_START, d),
        CharClass::LowerLatin(d) => offset(MATH_LOWER_TT_START, d),
        CharClass::Digit(d) => offset(NUMBER_TT_START, d),
        _ => default_style(ch),
    }
}

fn sans_serif(ch: char) -> Option<u32> {
    match classify(ch) {
        CharClass::UpperLatin(d) => offset(MATH_CAPITAL_SANS_SERIF_START, d),
        CharClass::LowerLatin(d) => offset(MATH_LOWER_SANS_SERIF_START, d),
        CharClass::Digit(d) => offset(NUMBER_SANS_SERIF_START, d),
        _ => default_style(ch),
    }
}

fn fraktur(ch: char) -> Option<u32> {
    match ch {
        'C' => return Some(0x212D),
        'H' => return Some(0x210C),
        'I' => return Some(0x2111),
        'R' => return Some(0x211C),
        'Z' => return Some(0x2128),
        _ => {}
    }
    match classify(ch) {
        CharClass::UpperLatin(d) => offset(MATH_CAPITAL_FRAKTUR_START, d),
        CharClass::LowerLatin(d) => offset(MATH_LOWER_FRAKTUR_START, d),
        _ => default_style(ch),
    }
}

fn blackboard(ch: char) -> Option<u32> {
    match ch {
        'C' => return Some(0x2102),
        'H' => return Some(0x210D),
        'N' => return Some(0x2115),
        'P' => return Some(0x2119),
        'Q' => return Some(0x211A),
        'R' => return Some(0x211D),
        'Z' => return Some(0x2124),
        _ => {}
    }
    match classify(ch) {
        CharClass::UpperLatin(d) => offset(MATH_CAPITAL_BLACKBOARD_START, d),
        CharClass::LowerLatin(d) => offset(MATH_LOWER_BLACKBOARD_START, d),
        CharClass::Digit(d) => offset(NUMBER_BLACKBOARD_START, d),
        _ => default_style(ch),
    }
}

/// Map one character to its styled form. Characters with no styled form are
/// returned unchanged.
pub fn style_char(ch: char, style: FontStyle) -> char {
    let mapped = match style {
        FontStyle::Default => default_style(ch),
        FontStyle::Roman => None,
        FontStyle::Bold => bold(ch),
        FontStyle::Italic => italic(ch),
        FontStyle::BoldItalic => bold_italic(ch),
        FontStyle::Caligraphic => caligraphic(ch),
        FontStyle::Typewriter => typewriter(ch),
        FontStyle::SansSerif => sans_serif(ch),
        FontStyle::Fraktur => fraktur(ch),
        FontStyle::Blackboard => blackboard(ch),
    };
    mapped.and_then(char::from_u32).unwrap_or(ch)
}

/// Map every character of `text` to the given style
pub fn change_font(text: &str, style: FontStyle) -> String {
    text.chars().map(|ch| style_char(ch, style)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style() {
        assert_eq!(change_font("x", FontStyle::Default), "\u{1D465}");
        assert_eq!(change_font("h", FontStyle::Default), "\u{210E}");
        assert_eq!(change_font("12.5", FontStyle::Default), "12.5");
        assert_eq!(change_font("\u{0393}", FontStyle::Default), "\u{0393}");
        assert_eq!(change_font("\u{03B1}", FontStyle::Default), "\u{1D6FC}");
        assert_eq!(change_font("\u{03F5}", FontStyle::Default), "\u{1D716}");
    }

    #[test]
    fn test_roman_is_identity() {
        assert_eq!(change_font("sin x", FontStyle::Roman), "sin x");
    }

    #[test]
    fn test_bold() {
        assert_eq!(change_font("A1", FontStyle::Bold), "\u{1D400}\u{1D7CF}");
        assert_eq!(change_font("2", FontStyle::BoldItalic), "\u{1D7D0}");
    }

    #[test]
    fn test_letterlike_exceptions() {
        assert_eq!(change_font("R", FontStyle::Blackboard), "\u{211D}");
        assert_eq!(change_font("A", FontStyle::Blackboard), "\u{1D538}");
        assert_eq!(change_font("H", FontStyle::Fraktur), "\u{210C}");
        assert_eq!(change_font("L", FontStyle::Caligraphic), "\u{2112}");
        assert_eq!(change_font("A", FontStyle::Caligraphic), "\u{1D49C}");
    }

    #[test]
    fn test_fallback_to_default() {
        assert_eq!(change_font("a", FontStyle::Caligraphic), "\u{1D44E}");
        assert_eq!(change_font("\u{03B1}", FontStyle::Typewriter), "\u{1D6FC}");
        assert_eq!(change_font("+", FontStyle::SansSerif), "+");
    }
}
