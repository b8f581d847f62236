//! Symbol and digit normalization.
//!
//! Quotation variants are unified, ASCII punctuation goes full-width, and
//! digit runs are rewritten per text kind: headings keep short runs as
//! tatechuyoko spans, everything else becomes kanji numerals except
//! comma-grouped figures (stashed) and numbers sitting next to unit symbols
//! (converted back to full-width digits afterwards).

use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::stash;
use super::tables;
use super::typography::tcy;
use crate::text_kind::TextKind;

static RE_SINGLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[‘’']([^\"\n]+?)[‘’']").unwrap());
static RE_DOUBLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[“”〝〟\"]([^\"\n]+?)[“”〝〟\"]").unwrap());
static RE_DECIMAL_POINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\d〇一二三四五六七八九]+?)[\.．]([\d〇一二三四五六七八九]+?)").unwrap()
});
static RE_NUMBER_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\d,，]+").unwrap());
static RE_DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static RE_LATIN_THEN_NUMERALS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([Ａ-Ｚａ-ｚ])([〇一二三四五六七八九・～]+)").unwrap());
static RE_NUMERALS_THEN_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([〇一二三四五六七八九・～]+)([Ａ-Ｚａ-ｚ％㎜㎝㎞㎎㎏㏄㎡㎥])").unwrap()
});

/// Unify smart-quote variants and push ASCII punctuation to full-width.
pub fn symbols_to_zenkaku(text: &str) -> String {
    let text = RE_SINGLE_QUOTED.replace_all(text, "〝${1}〟");
    let text = RE_DOUBLE_QUOTED.replace_all(&text, "〝${1}〟");
    text.chars().map(tables::symbol_to_zenkaku).collect()
}

/// Digit/number conversion, parameterized by text kind. Returns the converted
/// text plus the comma-grouped spans stashed along the way (empty for the
/// heading kinds, which never group).
pub fn convert_numbers(text: &str, kind: TextKind) -> (String, Vec<String>) {
    // A decimal point between digit-class characters reads as a nakaten.
    let text = RE_DECIMAL_POINT.replace_all(text, "${1}・${2}").into_owned();
    if kind.uses_mixed_digits() {
        return (mixed_digit_runs(&text, kind), Vec::new());
    }
    let mut grouped: Vec<String> = Vec::new();
    let replaced = RE_NUMBER_RUN
        .replace_all(&text, |caps: &Captures| {
            let token = &caps[0];
            if token.contains(',') || token.contains('，') {
                if token.chars().any(|c| tables::digit_value(c).is_some()) {
                    let placeholder = stash::NUMBER_SENTINELS.placeholder(grouped.len());
                    grouped.push(token.replace('，', ","));
                    return placeholder;
                }
                // Commas with no digit around them are ordinary punctuation.
                return token.to_string();
            }
            tables::digits_to_kanji(token)
        })
        .into_owned();
    (replaced, grouped)
}

/// Tatechuyoko treatment for digit runs in headings: a 2-digit run is set
/// horizontally inline; a 3-digit run only when it opens a subtitle; longer
/// runs go full-width digit by digit.
fn mixed_digit_runs(text: &str, kind: TextKind) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in RE_DIGIT_RUN.find_iter(text) {
        out.push_str(&text[last..m.start()]);
        out.push_str(&mixed_digit_token(m.as_str(), m.start(), kind));
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

fn mixed_digit_token(token: &str, offset: usize, kind: TextKind) -> String {
    let len = token.chars().count();
    if len == 2 {
        return tcy(token);
    }
    if len == 3 && kind == TextKind::Subtitle && offset == 0 {
        return tcy(token);
    }
    tables::digits_to_fullwidth(token)
}

/// Undo the kanji-numeral rule where a number borders a full-width Latin
/// letter or unit symbol; measurements read better as digits.
pub fn reconvert_units(text: &str) -> String {
    let text = RE_LATIN_THEN_NUMERALS.replace_all(text, |caps: &Captures| {
        format!("{}{}", &caps[1], tables::kanji_digits_to_fullwidth(&caps[2]))
    });
    RE_NUMERALS_THEN_UNIT
        .replace_all(&text, |caps: &Captures| {
            format!("{}{}", tables::kanji_digits_to_fullwidth(&caps[1]), &caps[2])
        })
        .into_owned()
}
