//! Protected-span stash/restore.
//!
//! URLs, foreign-language runs, and comma-grouped numbers must survive the
//! global symbol/digit rewriting untouched. Each category swaps its matches
//! for a three-character placeholder (open sentinel, private-use index
//! codepoint, close sentinel) drawn from codepoint ranges that are disjoint
//! between categories and never occur in real novel text. Restoration is a
//! single forward scan keyed on the open sentinel, so a second restore call is
//! a no-op and entries come back in the order they were stashed.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::tables;

/// Sentinel alphabet for one protected-span category.
#[derive(Copy, Clone, Debug)]
pub struct SentinelSet {
    pub open: char,
    pub close: char,
    pub index_base: u32,
}

pub const URL_SENTINELS: SentinelSet = SentinelSet {
    open: '\u{E000}',
    close: '\u{E001}',
    index_base: 0xE100,
};

pub const ENGLISH_SENTINELS: SentinelSet = SentinelSet {
    open: '\u{E002}',
    close: '\u{E003}',
    index_base: 0xE200,
};

pub const NUMBER_SENTINELS: SentinelSet = SentinelSet {
    open: '\u{E005}',
    close: '\u{E006}',
    index_base: 0xE300,
};

/// The reference mark (※) uses a single dedicated sentinel with no index.
pub const REFERENCE_MARK_SENTINEL: char = '\u{E004}';

impl SentinelSet {
    /// Placeholder for the table entry at `index`.
    pub fn placeholder(&self, index: usize) -> String {
        let marker = char::from_u32(self.index_base + index as u32).unwrap_or('\u{FFFD}');
        let mut out = String::with_capacity(12);
        out.push(self.open);
        out.push(marker);
        out.push(self.close);
        out
    }
}

static RE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[A-Za-z0-9\-._~:/?#\[\]@!$&'()*+,;=%]+").unwrap()
});
static RE_ASCII_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[A-Za-z0-9_.,!?"' &:;-]+"#).unwrap());

/// Swap every URL for a placeholder, returning the span table.
pub fn stash_urls(text: &str) -> (String, Vec<String>) {
    let mut spans: Vec<String> = Vec::new();
    let replaced = RE_URL
        .replace_all(text, |caps: &Captures| {
            let placeholder = URL_SENTINELS.placeholder(spans.len());
            spans.push(caps[0].to_string());
            placeholder
        })
        .into_owned();
    (replaced, spans)
}

/// Restore URLs as self-referencing anchors.
pub fn restore_urls(text: &str, spans: &[String]) -> String {
    restore_spans(text, URL_SENTINELS, spans, |url| {
        format!("<a href=\"{url}\">{url}</a>")
    })
}

/// Swap sentence-like or long ASCII runs for placeholders. Short runs are not
/// protected: they are transliterated to full-width letters on the spot and
/// left to the later stages.
pub fn stash_english_runs(text: &str) -> (String, Vec<String>) {
    let mut spans: Vec<String> = Vec::new();
    let replaced = RE_ASCII_RUN
        .replace_all(text, |caps: &Captures| {
            let token = &caps[0];
            if is_sentence_like(token) || is_long_ascii_word(token) {
                let placeholder = ENGLISH_SENTINELS.placeholder(spans.len());
                spans.push(token.to_string());
                placeholder
            } else {
                tables::letters_to_fullwidth(token)
            }
        })
        .into_owned();
    (replaced, spans)
}

/// Restore protected ASCII runs verbatim.
pub fn restore_english_runs(text: &str, spans: &[String]) -> String {
    restore_spans(text, ENGLISH_SENTINELS, spans, str::to_string)
}

/// Restore comma-grouped numbers verbatim. The table entries were normalized
/// to half-width commas at stash time (see the number-conversion stage).
pub fn restore_grouped_numbers(text: &str, spans: &[String]) -> String {
    restore_spans(text, NUMBER_SENTINELS, spans, str::to_string)
}

/// Shield the reference mark before punctuation rewriting.
pub fn stash_reference_mark(text: &str) -> String {
    text.replace('※', "\u{E004}")
}

/// Bring the reference mark back as its fixed gaiji annotation.
pub fn restore_reference_mark(text: &str) -> String {
    text.replace(REFERENCE_MARK_SENTINEL, "※［＃米印、1-2-8］")
}

/// At least two space-separated tokens: reads like a sentence, not a stray
/// identifier.
fn is_sentence_like(token: &str) -> bool {
    token.split(' ').filter(|chunk| !chunk.is_empty()).count() >= 2
}

fn is_long_ascii_word(token: &str) -> bool {
    token.chars().count() >= 8 && token.chars().any(|c| c.is_ascii_alphabetic())
}

/// Single-pass indexed substitution. Placeholders whose index has no table
/// entry (or that lost their close sentinel) are left as-is.
fn restore_spans(
    text: &str,
    set: SentinelSet,
    spans: &[String],
    render: impl Fn(&str) -> String,
) -> String {
    if spans.is_empty() || !text.contains(set.open) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != set.open {
            out.push(c);
            continue;
        }
        let mut lookahead = chars.clone();
        match (lookahead.next(), lookahead.next()) {
            (Some(marker), Some(close)) if close == set.close => {
                let index = (marker as u32).wrapping_sub(set.index_base) as usize;
                match spans.get(index) {
                    Some(original) => {
                        out.push_str(&render(original));
                        chars = lookahead;
                    }
                    None => out.push(c),
                }
            }
            _ => out.push(c),
        }
    }
    out
}
