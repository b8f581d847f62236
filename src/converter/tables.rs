//! Read-only character translation tables shared by the pipeline stages.
//!
//! Everything here is a pure per-character mapping constructed at compile
//! time; stages that need position- or run-aware rewriting live in their own
//! modules.

/// Kanji numerals indexed by digit value.
pub const KANJI_DIGITS: [char; 10] = ['〇', '一', '二', '三', '四', '五', '六', '七', '八', '九'];

/// Decorative characters that make up a border line on their own.
pub const BORDER_CHARS: &str = "◆◇■□●○★☆";

/// Numeric value of a half-width or full-width ASCII digit.
pub fn digit_value(c: char) -> Option<u32> {
    match c {
        '0'..='9' => Some(c as u32 - '0' as u32),
        '０'..='９' => Some(c as u32 - '０' as u32),
        _ => None,
    }
}

/// Numeric value of a kanji numeral from [`KANJI_DIGITS`].
pub fn kanji_digit_value(c: char) -> Option<u32> {
    KANJI_DIGITS.iter().position(|&k| k == c).map(|i| i as u32)
}

/// Map every half-width and full-width digit to its kanji numeral, leaving all
/// other characters alone: `"123４５６abc７８９0"` → `"一二三四五六abc七八九〇"`.
pub fn digits_to_kanji(text: &str) -> String {
    text.chars()
        .map(|c| match digit_value(c) {
            Some(d) => KANJI_DIGITS[d as usize],
            None => c,
        })
        .collect()
}

/// Map half-width digits to their full-width forms.
pub fn digits_to_fullwidth(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '0'..='9' => fullwidth_digit(c as u32 - '0' as u32),
            _ => c,
        })
        .collect()
}

/// Map kanji numerals back to full-width digits (the unit-context exception).
pub fn kanji_digits_to_fullwidth(text: &str) -> String {
    text.chars()
        .map(|c| match kanji_digit_value(c) {
            Some(d) => fullwidth_digit(d),
            None => c,
        })
        .collect()
}

fn fullwidth_digit(value: u32) -> char {
    char::from_u32('０' as u32 + value).unwrap_or('０')
}

/// Map ASCII letters to their full-width forms; everything else is unchanged.
pub fn letters_to_fullwidth(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphabetic() {
                // Full-width Latin block sits at a fixed offset from ASCII.
                char::from_u32(c as u32 + 0xFEE0).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Per-character symbol table for the zenkaku pass. Half-width punctuation and
/// a few stray full-width variants are normalized to the forms the vertical
/// typesetter expects; the backslash becomes a yen sign.
pub fn symbol_to_zenkaku(c: char) -> char {
    match c {
        '-' => '－',
        '=' => '＝',
        '+' => '＋',
        '/' => '／',
        '*' => '＊',
        '《' => '≪',
        '》' => '≫',
        '\'' => '’',
        '"' => '〝',
        '%' => '％',
        '$' => '＄',
        '#' => '＃',
        '&' => '＆',
        '!' => '！',
        '?' => '？',
        '<' => '〈',
        '>' => '〉',
        '＜' => '〈',
        '＞' => '〉',
        '(' => '（',
        ')' => '）',
        '|' => '｜',
        '‐' => '－',
        ',' => '，',
        '.' => '．',
        '_' => '＿',
        ';' => '；',
        ':' => '：',
        '[' => '［',
        ']' => '］',
        '{' => '｛',
        '}' => '｝',
        '\\' => '￥',
        _ => c,
    }
}
