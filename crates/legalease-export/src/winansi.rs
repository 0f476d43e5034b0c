//! WinAnsiEncoding (Windows-1252) for the standard Type1 fonts.
//!
//! Latin-1 covers everything except 0x80..=0x9F, where Windows-1252 places
//! typographic quotes, dashes, the euro sign and a few letters.

/// Characters at 0x80..=0x9F. `None` marks the five unassigned codes.
const HIGH: [Option<char>; 32] = [
    Some('\u{20ac}'), // 0x80 €
    None,
    Some('\u{201a}'), // ‚
    Some('\u{0192}'), // ƒ
    Some('\u{201e}'), // „
    Some('\u{2026}'), // …
    Some('\u{2020}'), // †
    Some('\u{2021}'), // ‡
    Some('\u{02c6}'), // ˆ
    Some('\u{2030}'), // ‰
    Some('\u{0160}'), // Š
    Some('\u{2039}'), // ‹
    Some('\u{0152}'), // Œ
    None,
    Some('\u{017d}'), // Ž
    None,
    None,             // 0x90
    Some('\u{2018}'), // ‘
    Some('\u{2019}'), // ’
    Some('\u{201c}'), // “
    Some('\u{201d}'), // ”
    Some('\u{2022}'), // •
    Some('\u{2013}'), // –
    Some('\u{2014}'), // —
    Some('\u{02dc}'), // ˜
    Some('\u{2122}'), // ™
    Some('\u{0161}'), // š
    Some('\u{203a}'), // ›
    Some('\u{0153}'), // œ
    None,
    Some('\u{017e}'), // ž
    Some('\u{0178}'), // Ÿ
];

/// The WinAnsi byte for `c`, if the encoding has one.
pub(crate) fn encode_char(c: char) -> Option<u8> {
    match u32::from(c) {
        code @ (0x00..=0x7f | 0xa0..=0xff) => u8::try_from(code).ok(),
        _ => HIGH
            .iter()
            .position(|&high| high == Some(c))
            .and_then(|i| u8::try_from(0x80 + i).ok()),
    }
}

/// Encode a line, replacing characters the encoding lacks with `?`.
pub(crate) fn encode(text: &str) -> Vec<u8> {
    text.chars().map(|c| encode_char(c).unwrap_or(b'?')).collect()
}

/// The character a WinAnsi byte shows. Unassigned codes map to themselves.
pub(crate) fn decode_byte(b: u8) -> char {
    match b {
        0x80..=0x9f => HIGH[usize::from(b - 0x80)].unwrap_or(char::from(b)),
        _ => char::from(b),
    }
}
