//! HTML-fragment normalization: the first pipeline stage.
//!
//! Fragments arrive as loose, often malformed HTML. Select tags are converted
//! to inline Aozora annotations; everything else is stripped. Stripping is a
//! fixed-point loop so tags nested inside attribute values or broken markup
//! still disappear, with an iteration cap so crafted input cannot spin.

use quick_xml::escape::resolve_html5_entity;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Tag-strip passes before giving up and returning the partial result.
const TAG_STRIP_MAX_PASSES: usize = 16;

static RE_RAW_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\r\n]+").unwrap());
static RE_BR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br.*?>").unwrap());
static RE_P_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\n?</p>").unwrap());
static RE_RUBY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<ruby>(.+?)</ruby>").unwrap());
static RE_RT_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<rt>").unwrap());
static RE_RP_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<rp>").unwrap());
static RE_DOTS_ONLY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[・、]+$").unwrap());
static RE_BOLD_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<b>").unwrap());
static RE_BOLD_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</b>").unwrap());
static RE_ITALIC_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<i>").unwrap());
static RE_ITALIC_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</i>").unwrap());
static RE_STRIKE_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<s>").unwrap());
static RE_STRIKE_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</s>").unwrap());
static RE_IMG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<img.+?src="(.+?)".*?>"#).unwrap());
static RE_EM_DOTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<em class="emphasisDots">(.+?)</em>"#).unwrap());
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<.+?>").unwrap());

/// Convert an HTML-ish fragment into tag-free text with inline Aozora markers.
///
/// `pre_html` is true for fragments that are already plain text with literal
/// newlines; for those the raw newlines are kept instead of collapsed.
pub fn html_to_aozora(value: &str, pre_html: bool) -> String {
    if value.is_empty() {
        return String::new();
    }
    let mut text = value.to_string();
    if !pre_html {
        text = RE_RAW_NEWLINES.replace_all(&text, "").into_owned();
        text = RE_BR.replace_all(&text, "\n").into_owned();
    }
    text = RE_P_CLOSE.replace_all(&text, "\n").into_owned();
    text = RE_RUBY
        .replace_all(&text, |caps: &Captures| ruby_replacement(&caps[1]))
        .into_owned();
    text = RE_BOLD_OPEN.replace_all(&text, "［＃太字］").into_owned();
    text = RE_BOLD_CLOSE.replace_all(&text, "［＃太字終わり］").into_owned();
    text = RE_ITALIC_OPEN.replace_all(&text, "［＃斜体］").into_owned();
    text = RE_ITALIC_CLOSE.replace_all(&text, "［＃斜体終わり］").into_owned();
    text = RE_STRIKE_OPEN.replace_all(&text, "［＃取消線］").into_owned();
    text = RE_STRIKE_CLOSE.replace_all(&text, "［＃取消線終わり］").into_owned();
    text = RE_IMG.replace_all(&text, "［＃挿絵（${1}）入る］").into_owned();
    text = RE_EM_DOTS
        .replace_all(&text, "［＃傍点］${1}［＃傍点終わり］")
        .into_owned();
    text = delete_tags(&text);
    decode_entities(&text)
}

/// `<ruby>` inner content → `｜base《reading》`, or an emphasis-dots wrapper
/// when the reading is nothing but dot/comma marks.
fn ruby_replacement(inner: &str) -> String {
    let parts: Vec<&str> = RE_RT_OPEN.split(inner).collect();
    if parts.len() < 2 {
        return delete_tags(parts.first().copied().unwrap_or_default());
    }
    let base = delete_tags(rp_head(parts[0]));
    let reading = delete_tags(rp_head(parts[1]));
    if RE_DOTS_ONLY.is_match(&reading) {
        format!("［＃傍点］{base}［＃傍点終わり］")
    } else {
        format!("｜{base}《{reading}》")
    }
}

/// Text before the first `<rp>` (the fallback-parenthesis side is dropped).
fn rp_head(side: &str) -> &str {
    RE_RP_OPEN.splitn(side, 2).next().unwrap_or_default()
}

/// Remove `<...>` spans until the text stops changing, bounded by
/// [`TAG_STRIP_MAX_PASSES`]. On cap exhaustion the partial result is returned;
/// malformed markup is never an error.
pub(crate) fn delete_tags(text: &str) -> String {
    strip_tag_passes(text, TAG_STRIP_MAX_PASSES)
}

fn strip_tag_passes(text: &str, max_passes: usize) -> String {
    let mut current = text.to_string();
    for _ in 0..max_passes {
        let stripped = RE_TAG.replace_all(&current, "");
        if stripped == current {
            break;
        }
        current = stripped.into_owned();
    }
    current
}

/// Lenient HTML character-reference decoding. Named references resolve via
/// the HTML5 entity table, numeric references accept decimal and hex forms,
/// and the terminating semicolon is optional. Anything that does not parse
/// stays in the text verbatim.
pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match decode_reference(&rest[1..]) {
            Some((decoded, consumed)) => {
                out.push_str(&decoded);
                rest = &rest[1 + consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode one character reference starting right after the ampersand.
/// Returns the replacement text and the number of bytes consumed. The
/// terminating semicolon is optional: a numeric reference stops at the first
/// non-digit, and a named reference takes the longest known entity name.
fn decode_reference(rest: &str) -> Option<(String, usize)> {
    if let Some(number) = rest.strip_prefix('#') {
        let (hex, digits) = match number.strip_prefix(['x', 'X']) {
            Some(stripped) => (true, stripped),
            None => (false, number),
        };
        let radix = if hex { 16 } else { 10 };
        let len = digits.chars().take_while(|c| c.is_digit(radix)).count();
        if len == 0 || len > 8 {
            return None;
        }
        let value = u32::from_str_radix(&digits[..len], radix).ok()?;
        let decoded = char::from_u32(value).map(String::from)?;
        let mut consumed = 1 + usize::from(hex) + len;
        if rest[consumed..].starts_with(';') {
            consumed += 1;
        }
        return Some((decoded, consumed));
    }
    // A reference name longer than 32 chars is not worth chasing.
    let name_len = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .count()
        .min(32);
    for len in (1..=name_len).rev() {
        if let Some(decoded) = resolve_html5_entity(&rest[..len]) {
            let mut consumed = len;
            if rest[consumed..].starts_with(';') {
                consumed += 1;
            }
            return Some((decoded.to_string(), consumed));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn br_becomes_newline_and_raw_newlines_collapse() {
        assert_eq!(html_to_aozora("一行目\n二行目<br>三行目", false), "一行目二行目\n三行目");
        assert_eq!(html_to_aozora("<BR />あ", false), "\nあ");
    }

    #[test]
    fn pre_html_keeps_raw_newlines() {
        assert_eq!(html_to_aozora("一行目\n二行目", true), "一行目\n二行目");
    }

    #[test]
    fn paragraph_close_becomes_newline() {
        assert_eq!(html_to_aozora("<p>段落</p><p>次</p>", false), "段落\n次\n");
    }

    #[test]
    fn ruby_with_reading() {
        assert_eq!(
            html_to_aozora("<ruby>本文<rt>ほんぶん</rt></ruby>", false),
            "｜本文《ほんぶん》"
        );
    }

    #[test]
    fn ruby_with_rp_fallbacks() {
        assert_eq!(
            html_to_aozora("<ruby>漢字<rp>（</rp><rt>かんじ</rt><rp>）</rp></ruby>", false),
            "｜漢字《かんじ》"
        );
    }

    #[test]
    fn ruby_dot_reading_becomes_emphasis_dots() {
        assert_eq!(
            html_to_aozora("<ruby>強調<rt>・・</rt></ruby>", false),
            "［＃傍点］強調［＃傍点終わり］"
        );
    }

    #[test]
    fn ruby_without_reading_is_stripped() {
        assert_eq!(html_to_aozora("<ruby><span>裸</span></ruby>", false), "裸");
    }

    #[test]
    fn inline_style_tags_become_markers() {
        assert_eq!(html_to_aozora("<b>太い</b>", false), "［＃太字］太い［＃太字終わり］");
        assert_eq!(html_to_aozora("<I>斜め</I>", false), "［＃斜体］斜め［＃斜体終わり］");
        assert_eq!(html_to_aozora("<s>消す</s>", false), "［＃取消線］消す［＃取消線終わり］");
    }

    #[test]
    fn img_becomes_illustration_marker() {
        assert_eq!(
            html_to_aozora(r#"<img class="x" src="cover.png" alt="y">"#, false),
            "［＃挿絵（cover.png）入る］"
        );
    }

    #[test]
    fn emphasis_dots_span() {
        assert_eq!(
            html_to_aozora(r#"<em class="emphasisDots">ここ</em>"#, false),
            "［＃傍点］ここ［＃傍点終わり］"
        );
    }

    #[test]
    fn nested_and_unknown_tags_are_fully_stripped() {
        assert_eq!(html_to_aozora("<div><span>中身</span></div>", false), "中身");
        // A tag hidden inside an attribute value survives one pass but not two.
        assert_eq!(html_to_aozora("<a href=\"<x>\">リンク</a>", false), "\">リンク");
    }

    #[test]
    fn deeply_nested_brackets_settle_within_the_pass_cap() {
        let input = format!("{}奥{}", "<".repeat(40), ">".repeat(40));
        // The lazy span swallows every open bracket up to the first close;
        // the leftover closers have no opener and are final.
        assert_eq!(delete_tags(&input), ">".repeat(39));
    }

    #[test]
    fn exhausted_pass_budget_returns_the_partial_text() {
        let input = "<<b>残り</b>>";
        assert_eq!(strip_tag_passes(input, 0), input);
        assert_eq!(strip_tag_passes(input, 1), "残り>");
        assert_eq!(delete_tags(input), "残り>");
    }

    #[test]
    fn entities_decode_leniently() {
        assert_eq!(decode_entities("a&amp;b"), "a&b");
        assert_eq!(decode_entities("&#x3042;&#12354;"), "ああ");
        assert_eq!(decode_entities("&nbsp;"), "\u{a0}");
        // Stray ampersands and unknown names pass through.
        assert_eq!(decode_entities("a & b"), "a & b");
        assert_eq!(decode_entities("&zzqq;"), "&zzqq;");
        assert_eq!(decode_entities("終&"), "終&");
    }

    #[test]
    fn semicolon_less_references_decode_too() {
        assert_eq!(decode_entities("a&amp b"), "a& b");
        assert_eq!(decode_entities("隙間&nbsp空白"), "隙間\u{a0}空白");
        assert_eq!(decode_entities("&#38円"), "&円");
        // The longest known name wins; the tail stays literal.
        assert_eq!(decode_entities("&ampx"), "&x");
        assert_eq!(decode_entities("&notin;"), "∉");
    }

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(html_to_aozora("", false), "");
    }
}
