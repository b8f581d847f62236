//! Assembly of converted fragments into one Aozora text document.
//!
//! The document is what the downstream EPUB converter consumes: title and
//! author header, divider lines, the story blurb, then one page-broken block
//! per section with chapter/subtitle headings and front/back matter, closed by
//! a fixed end-of-book phrase.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::info;
use url::Url;

use crate::converter::{convert_fragment, html};
use crate::text_kind::TextKind;

/// Divider directive between the header blocks.
pub const DIVIDER_LINE: &str = "［＃区切り線］";

/// Fixed closing phrase on the last line of every document.
pub const END_OF_BOOK_MARKER: &str =
    "［＃ここから地付き］［＃小書き］（本を読み終わりました）［＃小書き終わり］［＃ここで地付き終わり］";

/// Novel-level metadata, one per document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Novel {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub story: String,
    #[serde(default)]
    pub toc_url: String,
}

/// One downloaded episode with its surrounding matter. All fields are raw
/// HTML-ish fragments; conversion happens during rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub chapter: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub introduction: String,
    pub body: String,
    #[serde(default)]
    pub postscript: String,
}

/// Render the full Aozora document. Every fragment runs through the
/// transducer with its matching text kind; the result is newline-terminated.
pub fn render_document(novel: &Novel, sections: &[Section]) -> String {
    let title = plain_text(&novel.title);
    let author = plain_text(&novel.author);
    let story = convert_fragment(&novel.story, TextKind::Story);
    let toc_url = normalize_toc_url(&plain_text(&novel.toc_url));

    let mut lines: Vec<String> = Vec::new();
    lines.push(title.clone());
    lines.push(author);
    // Cover annotation slot; stays blank when no cover directive is emitted.
    lines.push(String::new());
    lines.push(DIVIDER_LINE.to_string());
    if !story.is_empty() {
        lines.push("あらすじ：".to_string());
        lines.push(story);
        lines.push(String::new());
    }
    if !toc_url.is_empty() {
        lines.push("掲載ページ:".to_string());
        lines.push(format!("<a href=\"{toc_url}\">{toc_url}</a>"));
    }
    lines.push(DIVIDER_LINE.to_string());
    lines.push(String::new());

    let mut previous_chapter = String::new();
    for section in sections {
        let chapter = convert_fragment(&section.chapter, TextKind::Chapter).trim().to_string();
        let subtitle = convert_fragment(&section.subtitle, TextKind::Subtitle).trim().to_string();
        let introduction = convert_fragment(&section.introduction, TextKind::Introduction);
        let body = convert_fragment(&section.body, TextKind::Body);
        let postscript = convert_fragment(&section.postscript, TextKind::Postscript);

        lines.push("［＃改ページ］".to_string());
        let chapter_changed = !chapter.is_empty() && chapter != previous_chapter;
        if !chapter_changed {
            lines.push(String::new());
        }
        if chapter_changed {
            lines.push("［＃ページの左右中央］".to_string());
            lines.push(format!("［＃ここから柱］{title}［＃ここで柱終わり］"));
            lines.push(format!("［＃３字下げ］［＃大見出し］{chapter}［＃大見出し終わり］"));
            lines.push("［＃改ページ］".to_string());
            lines.push(String::new());
        }
        if !chapter.is_empty() {
            previous_chapter = chapter;
        }
        if !subtitle.is_empty() {
            lines.push(format!("［＃３字下げ］［＃中見出し］{subtitle}［＃中見出し終わり］"));
            if introduction.is_empty() {
                lines.push(String::new());
                lines.push(String::new());
            }
        }
        if !introduction.is_empty() {
            lines.push("［＃ここから前書き］".to_string());
            lines.push(introduction);
            lines.push("［＃ここで前書き終わり］".to_string());
            lines.push(String::new());
            lines.push(String::new());
        }
        if !body.is_empty() {
            lines.push(body);
        }
        if !postscript.is_empty() {
            lines.push("［＃ここから後書き］".to_string());
            lines.push(postscript);
            lines.push("［＃ここで後書き終わり］".to_string());
        }
    }
    lines.push(String::new());
    lines.push(END_OF_BOOK_MARKER.to_string());

    let mut text = lines.join("\n").trim().to_string();
    text.push('\n');
    text
}

/// Render and write `<title>.aozora.txt` under `output_dir`.
pub fn write_document(novel: &Novel, sections: &[Section], output_dir: &Path) -> Result<PathBuf> {
    if sections.is_empty() {
        anyhow::bail!("no sections to render");
    }
    let text = render_document(novel, sections);
    let title = plain_text(&novel.title);
    let stem = if title.is_empty() { "book".to_string() } else { title };
    let path = output_dir.join(format!("{}.aozora.txt", safe_filename(&stem)));
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    std::fs::write(&path, &text)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = text.len(), "wrote aozora document");
    Ok(path)
}

static RE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static RE_SCRIPT_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?>.*?</script>|<style\b.*?>.*?</style>").unwrap()
});
static RE_SIMPLE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static RE_SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static RE_CARRIAGE_RETURN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n?").unwrap());
static RE_NEWLINE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static RE_UNSAFE_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|]"#).unwrap());
static RE_WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Best-effort plain text for fields that are not Aozora fragments (title,
/// author, URL): tags and comments dropped, entities decoded, whitespace
/// collapsed.
pub fn plain_text(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let text = RE_COMMENT.replace_all(value, "");
    let text = RE_SCRIPT_STYLE.replace_all(&text, "");
    let text = RE_SIMPLE_TAG.replace_all(&text, "");
    let text = html::decode_entities(&text);
    let text = text.replace('\u{a0}', " ");
    let text = RE_SPACE_RUN.replace_all(&text, " ");
    let text = RE_CARRIAGE_RETURN.replace_all(&text, "\n");
    let text = RE_NEWLINE_RUN.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// The public listing for syosetu novels lives on the adult host; link there
/// so the anchor keeps working for restricted works.
pub fn normalize_toc_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    match Url::parse(url) {
        Ok(parsed) if parsed.host_str() == Some("ncode.syosetu.com") => {
            format!("https://novel18.syosetu.com{}", parsed.path())
        }
        _ => url.to_string(),
    }
}

fn safe_filename(text: &str) -> String {
    let cleaned = RE_UNSAFE_FILENAME.replace_all(text, "_");
    let cleaned = RE_WHITESPACE_RUN.replace_all(&cleaned, " ");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "book".to_string()
    } else {
        cleaned.to_string()
    }
}
