//! The staged fragment-to-Aozora transducer.
//!
//! One entry point, [`convert_fragment`], runs a fixed linear pipeline. The
//! stage order is a hard contract: protected spans must be stashed before the
//! global symbol/digit rewriting and restored after every stage that touches
//! ordinary text, number conversion must precede the unit-exception pass, and
//! ruby restoration must follow ellipsis folding so punctuation-only readings
//! are rejected correctly.

pub mod html;
pub mod layout;
pub mod stash;
pub mod tables;
pub mod typography;
pub mod zenkaku;

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::text_kind::TextKind;

static RE_KEYBOARD_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new("(?i)<KBR>").unwrap());
static RE_PAGE_BREAK_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new("(?i)<PBR>").unwrap());
static RE_WIDE_SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new("　{3,}").unwrap());
static RE_LINE_TRAILING_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)[ \t　]+$").unwrap());

/// Convert one raw fragment into Aozora bracket notation.
///
/// The transducer is a pure function of its input: it holds no state across
/// calls and never fails — malformed markup degrades to literal text.
pub fn convert_fragment(value: &str, kind: TextKind) -> String {
    if value.is_empty() {
        return String::new();
    }
    // Story blurbs sometimes arrive as plain text with literal newlines.
    let pre_html = kind == TextKind::Story && !value.contains('<') && !value.contains('>');
    debug!(?kind, pre_html, bytes = value.len(), "converting fragment");

    let text = html::html_to_aozora(value, pre_html);
    let text = normalize_dash_variants(&text);
    let text = layout::auto_join_lines(&text);
    let text = text.replace("【改ページ】", "");
    let text = RE_KEYBOARD_BREAK.replace_all(&text, "\n").into_owned();
    let text = RE_PAGE_BREAK_TAG.replace_all(&text, "\n").into_owned();

    let (text, urls) = stash::stash_urls(&text);
    let (text, english) = stash::stash_english_runs(&text);
    let text = stash::stash_reference_mark(&text);

    let text = zenkaku::symbols_to_zenkaku(&text);
    let (text, grouped) = zenkaku::convert_numbers(&text, kind);
    let text = if kind.uses_mixed_digits() {
        text
    } else {
        zenkaku::reconvert_units(&text)
    };

    let text = typography::insert_separator_space(&text);
    let text = typography::convert_tatechuyoko(&text);
    let text = typography::apply_novel_rule(&text);
    let text = typography::fold_ellipsis_runs(&text);
    let text = typography::restore_explicit_ruby(&text);
    let text = typography::escape_vertical_bars(&text);
    let text = typography::double_angle_to_gaiji(&text);

    let text = stash::restore_english_runs(&text, &english);
    let text = stash::restore_grouped_numbers(&text, &grouped);
    let text = stash::restore_urls(&text, &urls);
    let text = stash::restore_reference_mark(&text);

    let text = RE_WIDE_SPACE_RUN.replace_all(&text, "　　").into_owned();
    let text = if kind.wants_indent() {
        let text = layout::half_indent_brackets(&text);
        let text = layout::pack_blank_lines(&text);
        // Packing can join lines and create fresh `！`/`？` adjacencies.
        typography::convert_tatechuyoko(&text)
    } else if kind.wants_packing_only() {
        layout::pack_blank_lines(&text)
    } else {
        text
    };
    let text = RE_LINE_TRAILING_WS.replace_all(&text, "").into_owned();
    text.trim_end_matches(char::is_whitespace).to_string()
}

/// Keep dash handling in parity with the half/full-width conversion the
/// upstream scrapers apply: the full-width hyphen-minus becomes a minus sign
/// and the em dash becomes a horizontal bar.
fn normalize_dash_variants(text: &str) -> String {
    text.replace('－', "−").replace('—', "―")
}
