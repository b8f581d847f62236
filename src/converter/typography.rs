//! Typographic post-processing: exclamation/question runs, ellipsis folding,
//! novel-style quotation fixups, ruby restoration, and vertical-bar escaping.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Closing characters after which a `!`/`?` run needs no separating space.
const SEPARATOR_EXEMPT: &str = "」］｝] }』】〉》〕＞>≫)）\"”’〟　☆★♪［―";

static RE_BANG_THEN_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([!?！？]+)([^!?！？])").unwrap());
static RE_BANG_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new("！+").unwrap());
static RE_MIXED_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new("[！？]+").unwrap());
static RE_PERIOD_BEFORE_CLOSER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("。([」』）])").unwrap());
static RE_ELLIPSIS_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new("…+").unwrap());
static RE_TWO_DOT_LEADER_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new("‥+").unwrap());
static RE_NAKAGURO_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new("・{3,}").unwrap());
static RE_KUTEN_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new("。{3,}").unwrap());
static RE_TOUTEN_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new("、{3,}").unwrap());
static RE_FW_PERIOD_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new("．{3,}").unwrap());
static RE_ANGLE_RUBY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("｜([^｜≪≫\n]+)≪([^≪≫\n]+)≫").unwrap());
static RE_PUNCT_ONLY_READING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[…‥。．、,\-]+$").unwrap());
static RE_RUBY_FORM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("｜([^｜《》\n]+)《([^《》\n]+)》").unwrap());

/// Wrap a value in a vertical-mixed-script (tatechuyoko) annotation pair.
pub(crate) fn tcy(value: &str) -> String {
    format!("［＃縦中横］{value}［＃縦中横終わり］")
}

/// Insert a full-width space after a `!`/`?` run unless the next character
/// already implies separation; a plain space or sentence punctuation right
/// after the run is normalized to a single full-width space.
pub fn insert_separator_space(text: &str) -> String {
    RE_BANG_THEN_CHAR
        .replace_all(text, |caps: &Captures| {
            let run = &caps[1];
            let mut follower = &caps[2];
            if matches!(follower, " " | "　" | "、" | "。") {
                follower = "　";
            }
            if SEPARATOR_EXEMPT.contains(follower) {
                format!("{run}{follower}")
            } else {
                format!("{run}　{follower}")
            }
        })
        .into_owned()
}

/// Rewrite `！`/`？` runs into tatechuyoko spans.
///
/// Pure `！` runs: a neighbor `？` leaves the run to the mixed rule; length 3
/// becomes one `!!!` span; length ≥ 4 is rounded up to even and split into
/// `!!` spans. Mixed runs: exactly 2 characters, or the 3-character shapes
/// `！！？`/`？！！`, are transliterated to ASCII and wrapped once.
pub fn convert_tatechuyoko(text: &str) -> String {
    let text = replace_bang_runs(text);
    RE_MIXED_RUN
        .replace_all(&text, |caps: &Captures| {
            let run = &caps[0];
            let len = run.chars().count();
            if len == 2 || (len == 3 && (run == "！！？" || run == "？！！")) {
                tcy(&to_ascii_marks(run))
            } else {
                run.to_string()
            }
        })
        .into_owned()
}

fn replace_bang_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in RE_BANG_RUN.find_iter(text) {
        let left = text[..m.start()].chars().next_back();
        let right = text[m.end()..].chars().next();
        out.push_str(&text[last..m.start()]);
        out.push_str(&bang_run_replacement(m.as_str(), left, right));
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

fn bang_run_replacement(run: &str, left: Option<char>, right: Option<char>) -> String {
    if left == Some('？') || right == Some('？') {
        return run.to_string();
    }
    let mut len = run.chars().count();
    if len == 3 {
        return tcy("!!!");
    }
    if len >= 4 {
        if len % 2 == 1 {
            len += 1;
        }
        return tcy("!!").repeat(len / 2);
    }
    run.to_string()
}

fn to_ascii_marks(run: &str) -> String {
    run.chars()
        .map(|c| match c {
            '！' => '!',
            '？' => '?',
            _ => c,
        })
        .collect()
}

/// Novel-style quotation fixups: a kuten before a closing bracket is dropped,
/// odd-length ellipsis runs are evened out, and a kuten followed by a
/// full-width space loses the space.
pub fn apply_novel_rule(text: &str) -> String {
    let text = RE_PERIOD_BEFORE_CLOSER.replace_all(text, "${1}");
    let text = RE_ELLIPSIS_RUN.replace_all(&text, |caps: &Captures| even_run(&caps[0], '…'));
    let text = RE_TWO_DOT_LEADER_RUN.replace_all(&text, |caps: &Captures| even_run(&caps[0], '‥'));
    text.replace("。　", "。")
}

fn even_run(run: &str, filler: char) -> String {
    if run.chars().count() % 2 == 0 {
        run.to_string()
    } else {
        let mut evened = run.to_string();
        evened.push(filler);
        evened
    }
}

/// Fold runs (≥ 3) of middle dots, kuten, touten, or full-width periods into
/// ellipses: `ceil(n / 6) * 2` of `…`. Runs touching a dash are decorative
/// and stay. Leftover doubled kuten/touten collapse to one.
pub fn fold_ellipsis_runs(text: &str) -> String {
    let mut text = text.to_string();
    for re in [&RE_NAKAGURO_RUN, &RE_KUTEN_RUN, &RE_TOUTEN_RUN, &RE_FW_PERIOD_RUN] {
        text = fold_runs(&text, re);
    }
    let text = text.replace("。。", "。");
    text.replace("、、", "、")
}

fn fold_runs(text: &str, re: &Regex) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in re.find_iter(text) {
        let before = text[..m.start()].chars().next_back();
        let after = text[m.end()..].chars().next();
        out.push_str(&text[last..m.start()]);
        if before == Some('―') || after == Some('―') {
            out.push_str(m.as_str());
        } else {
            let count = m.as_str().chars().count();
            out.push_str(&"…".repeat((count + 5) / 6 * 2));
        }
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Reconstitute ruby whose reading brackets were caught by the zenkaku pass:
/// `｜base≪reading≫` → `｜base《reading》`, except punctuation-only readings,
/// which are literal text rather than ruby.
pub fn restore_explicit_ruby(text: &str) -> String {
    RE_ANGLE_RUBY
        .replace_all(text, |caps: &Captures| {
            if RE_PUNCT_ONLY_READING.is_match(&caps[2]) {
                caps[0].to_string()
            } else {
                format!("｜{}《{}》", &caps[1], &caps[2])
            }
        })
        .into_owned()
}

/// Once ruby has been handled, any bare vertical bar is an ordinary glyph.
/// Ruby delimiters are shielded, the rest become a gaiji annotation, and the
/// shield comes off again.
pub fn escape_vertical_bars(text: &str) -> String {
    let text = RE_RUBY_FORM.replace_all(text, "［＃ルビ用縦線］${1}《${2}》");
    let text = text.replace('｜', "※［＃縦線］");
    text.replace("［＃ルビ用縦線］", "｜")
}

/// Remaining double-angle quotation marks were never ruby; emit them as gaiji.
pub fn double_angle_to_gaiji(text: &str) -> String {
    let text = text.replace('≪', "※［＃始め二重山括弧］");
    text.replace('≫', "※［＃終わり二重山括弧］")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_space_inserted_after_bang() {
        assert_eq!(insert_separator_space("やった！次だ"), "やった！　次だ");
        assert_eq!(insert_separator_space("え？　まさか"), "え？　まさか");
    }

    #[test]
    fn separator_space_skips_closers() {
        assert_eq!(insert_separator_space("「やった！」"), "「やった！」");
        assert_eq!(insert_separator_space("すごい！―"), "すごい！―");
    }

    #[test]
    fn separator_normalizes_following_punctuation() {
        assert_eq!(insert_separator_space("ええ！。そうだ"), "ええ！　そうだ");
        assert_eq!(insert_separator_space("ええ！ そうだ"), "ええ！　そうだ");
    }

    #[test]
    fn bang_run_of_three_wraps_once() {
        assert_eq!(convert_tatechuyoko("すごい！！！"), format!("すごい{}", tcy("!!!")));
    }

    #[test]
    fn bang_run_of_five_becomes_three_pairs() {
        assert_eq!(
            convert_tatechuyoko("わあ！！！！！"),
            format!("わあ{}{}{}", tcy("!!"), tcy("!!"), tcy("!!"))
        );
    }

    #[test]
    fn bang_run_of_four_becomes_two_pairs() {
        assert_eq!(convert_tatechuyoko("お！！！！"), format!("お{}{}", tcy("!!"), tcy("!!")));
    }

    #[test]
    fn mixed_pair_wraps_as_ascii() {
        assert_eq!(convert_tatechuyoko("えっ！？"), format!("えっ{}", tcy("!?")));
        assert_eq!(convert_tatechuyoko("えっ？！！"), format!("えっ{}", tcy("?!!")));
    }

    #[test]
    fn double_bang_wraps_via_mixed_rule() {
        assert_eq!(convert_tatechuyoko("おお！！"), format!("おお{}", tcy("!!")));
    }

    #[test]
    fn bang_run_next_to_question_is_left_for_mixed_rule() {
        // ？！！！ is neither a pure-run shape nor a recognized mixed shape.
        assert_eq!(convert_tatechuyoko("？！！！"), "？！！！");
    }

    #[test]
    fn novel_rule_drops_kuten_before_closer() {
        assert_eq!(apply_novel_rule("「そうだ。」"), "「そうだ」");
        assert_eq!(apply_novel_rule("『まさか。』"), "『まさか』");
    }

    #[test]
    fn novel_rule_evens_ellipsis_runs() {
        assert_eq!(apply_novel_rule("………"), "…………");
        assert_eq!(apply_novel_rule("‥"), "‥‥");
        assert_eq!(apply_novel_rule("……"), "……");
    }

    #[test]
    fn novel_rule_drops_space_after_kuten() {
        assert_eq!(apply_novel_rule("終わり。　次"), "終わり。次");
    }

    #[test]
    fn seven_dots_fold_to_four_ellipses() {
        assert_eq!(fold_ellipsis_runs("待って・・・・・・・"), "待って…………");
    }

    #[test]
    fn dash_adjacent_runs_are_kept() {
        assert_eq!(fold_ellipsis_runs("―・・・"), "―・・・");
        assert_eq!(fold_ellipsis_runs("・・・―"), "・・・―");
    }

    #[test]
    fn doubled_kuten_collapses() {
        assert_eq!(fold_ellipsis_runs("駄目。。"), "駄目。");
        assert_eq!(fold_ellipsis_runs("まだ、、"), "まだ、");
    }

    #[test]
    fn explicit_ruby_restores_angle_brackets() {
        assert_eq!(restore_explicit_ruby("｜本文≪ほんぶん≫"), "｜本文《ほんぶん》");
    }

    #[test]
    fn punctuation_only_reading_is_not_ruby() {
        assert_eq!(restore_explicit_ruby("｜えー≪……≫"), "｜えー≪……≫");
    }

    #[test]
    fn bare_vertical_bar_becomes_gaiji() {
        assert_eq!(escape_vertical_bars("あ｜い"), "あ※［＃縦線］い");
    }

    #[test]
    fn ruby_vertical_bar_survives_escaping() {
        assert_eq!(escape_vertical_bars("｜本文《ほんぶん》と｜"), "｜本文《ほんぶん》と※［＃縦線］");
    }

    #[test]
    fn leftover_double_angles_become_gaiji() {
        assert_eq!(
            double_angle_to_gaiji("≪あ≫"),
            "※［＃始め二重山括弧］あ※［＃終わり二重山括弧］"
        );
    }
}
