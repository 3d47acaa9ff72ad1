//! Half-width / full-width character handling.
//!
//! Japanese form input mixes full-width (zenkaku) and half-width
//! (hankaku) spellings of the same characters; validators normalize to
//! one width before checking. Conversion covers the ASCII range and its
//! full-width block (U+FF01..=U+FF5E) plus the ideographic space.

/// Half-width letters.
pub const HAN_ALPH: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Half-width digits.
pub const HAN_NUM: &str = "0123456789";

/// Half-width symbols. Hyphen and period sit at the tail so the name
/// validators can exempt them.
pub const HAN_SYM: &str = "!\"#$%&'()*+,/:;<=>?@[\\]^_`{|}~-.";

/// Half-width symbols without the hyphen/period exemptions.
pub const HAN_SYM_STRICT: &str = "!\"#$%&'()*+,/:;<=>?@[\\]^_`{|}~";

/// Full-width symbols, same order as [`HAN_SYM`].
pub const ZEN_SYM: &str = "！＂＃＄％＆＇（）＊＋，／：；＜＝＞？＠［＼］＾＿｀｛｜｝～－．";

/// Full-width symbols without the hyphen/period exemptions.
pub const ZEN_SYM_STRICT: &str = "！＂＃＄％＆＇（）＊＋，／：；＜＝＞？＠［＼］＾＿｀｛｜｝～";

const WIDTH_OFFSET: u32 = 0xFEE0;
const IDEOGRAPHIC_SPACE: char = '\u{3000}';

/// Convert full-width ASCII-range characters to their half-width forms.
/// Everything else passes through unchanged.
pub fn to_half_width(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            '\u{FF01}'..='\u{FF5E}' => {
                char::from_u32(ch as u32 - WIDTH_OFFSET).unwrap_or(ch)
            }
            IDEOGRAPHIC_SPACE => ' ',
            other => other,
        })
        .collect()
}

/// Convert half-width ASCII characters to their full-width forms.
/// Everything else passes through unchanged.
pub fn to_full_width(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            '!'..='~' => char::from_u32(ch as u32 + WIDTH_OFFSET).unwrap_or(ch),
            ' ' => IDEOGRAPHIC_SPACE,
            other => other,
        })
        .collect()
}

/// Count how many characters of `text` appear in `set`.
pub fn contains_any(text: &str, set: &str) -> usize {
    text.chars().filter(|ch| set.contains(*ch)).count()
}

/// Whether `text` spells an integer: an optional leading minus sign
/// followed by at least one digit.
pub fn is_integer_str(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit())
}
