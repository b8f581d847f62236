//! Line-level layout normalization: auto-joining wrapped lines, half-width
//! bracket indentation, and the blank-line/border-line packing state machine.

use regex::Regex;
use std::sync::LazyLock;

use super::tables::BORDER_CHARS;

const LINE_PADDING: &[char] = &[' ', '　', '\t'];

static RE_AUTO_JOIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("([^、])、\n(?:[ \t　]*\n)*　([^「『(（【<＜〈《≪・■…‥―　１-９一-九])").unwrap()
});
static RE_LINE_OPEN_BRACKET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("(?m)^[ \t　]*((?:[〔「『(（【〈《≪〝])|(?:※［＃始め二重山括弧］))").unwrap()
});

/// Rejoin a line wrapped after a touten: `…、\n` plus blank lines plus a
/// single full-width-space indent continues the same sentence, unless the
/// continuation opens with a quote, list marker, digit, or similar.
pub fn auto_join_lines(text: &str) -> String {
    RE_AUTO_JOIN.replace_all(text, "${1}、${2}").into_owned()
}

/// Lines opening with a bracket (or the gaiji form of a double angle bracket)
/// get a half-width indent annotation; original leading whitespace is dropped.
pub fn half_indent_brackets(text: &str) -> String {
    RE_LINE_OPEN_BRACKET.replace_all(text, "［＃二分アキ］${1}").into_owned()
}

/// A border line is nothing but ≥ 5 asterisks (half- or full-width) or a run
/// of decorative marks. Returns the normalized line body, or None for
/// ordinary and blank lines.
fn normalize_border_line(line: &str) -> Option<String> {
    let stripped = line.trim_matches(LINE_PADDING);
    if stripped.is_empty() {
        return None;
    }
    if stripped.chars().count() >= 5 && stripped.chars().all(|c| c == '＊' || c == '*') {
        return Some(stripped.replace('*', "＊"));
    }
    if stripped.chars().all(|c| BORDER_CHARS.contains(c)) {
        return Some(stripped.to_string());
    }
    None
}

fn is_blank(line: &str) -> bool {
    line.trim_matches(LINE_PADDING).is_empty()
}

fn push_blanks(packed: &mut Vec<String>, count: usize) {
    for _ in 0..count {
        packed.push(String::new());
    }
}

/// Collapse blank-line runs over the whole fragment.
///
/// Blank lines are never emitted verbatim; they are counted and re-emitted
/// when the next visible line arrives. Around border lines a run of 1 or 3
/// keeps one blank and anything else keeps two; between ordinary lines a run
/// needs length ≥ 2 to keep one blank, with an extra blank for each of the
/// thresholds 4, 8 and 10. A run at the very start keeps exactly one blank
/// and trailing runs are dropped. Border lines are re-emitted with a
/// four-space full-width indent, and `！」`/`？」` stranded at a line start
/// are joined back onto the previous line.
pub fn pack_blank_lines(text: &str) -> String {
    let mut packed: Vec<String> = Vec::new();
    let mut blank_run = 0usize;
    let mut prev_border = false;
    for line in text.split('\n') {
        if is_blank(line) {
            blank_run += 1;
            continue;
        }
        if let Some(border) = normalize_border_line(line) {
            if blank_run > 0 {
                push_blanks(&mut packed, if blank_run == 1 || blank_run == 3 { 1 } else { 2 });
            } else if packed.last().is_some_and(|last| !last.is_empty()) {
                packed.push(String::new());
            }
            blank_run = 0;
            packed.push(format!("　　　　{border}"));
            prev_border = true;
            continue;
        }
        if packed.is_empty() && blank_run >= 1 {
            packed.push(String::new());
        } else if prev_border && blank_run >= 1 {
            push_blanks(&mut packed, if blank_run == 1 || blank_run == 3 { 1 } else { 2 });
        } else if blank_run >= 2 && packed.last().is_some_and(|last| !last.is_empty()) {
            packed.push(String::new());
            if blank_run >= 4 {
                packed.push(String::new());
            }
            if blank_run >= 8 {
                packed.push(String::new());
            }
            if blank_run >= 10 {
                packed.push(String::new());
            }
        }
        blank_run = 0;
        prev_border = false;
        packed.push(line.trim_end_matches(LINE_PADDING).to_string());
    }
    while packed.last().is_some_and(|last| last.is_empty()) {
        packed.pop();
    }
    let joined = packed.join("\n");
    let joined = joined.replace("\n！」", "！」");
    joined.replace("\n？」", "？」")
}
