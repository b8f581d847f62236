// Full-document assembly and file output

use aozorify::document::{DIVIDER_LINE, END_OF_BOOK_MARKER};
use aozorify::{render_document, write_document, Novel, Section};

fn fixture_novel() -> Novel {
    Novel {
        title: "テスト作品".to_string(),
        author: "作者A".to_string(),
        story: "これは<br>あらすじ".to_string(),
        toc_url: "https://ncode.syosetu.com/n0001aa/".to_string(),
    }
}

fn fixture_section() -> Section {
    Section {
        chapter: "第一章".to_string(),
        subtitle: "第一話".to_string(),
        introduction: "前書き".to_string(),
        body: "本文".to_string(),
        postscript: "後書き".to_string(),
    }
}

#[test]
fn document_opens_with_header_and_closes_with_end_marker() {
    let text = render_document(&fixture_novel(), &[fixture_section()]);
    assert!(text.starts_with(&format!("テスト作品\n作者A\n\n{DIVIDER_LINE}\n")));
    assert!(text.ends_with(&format!("\n\n{END_OF_BOOK_MARKER}\n")));
    assert_eq!(text.lines().last(), Some(END_OF_BOOK_MARKER));
}

#[test]
fn story_and_listing_link_appear_between_dividers() {
    let text = render_document(&fixture_novel(), &[fixture_section()]);
    assert!(text.contains("あらすじ：\nこれは\nあらすじ\n"));
    // The public listing host is rewritten to the unrestricted mirror.
    assert!(text.contains(
        "掲載ページ:\n<a href=\"https://novel18.syosetu.com/n0001aa/\">https://novel18.syosetu.com/n0001aa/</a>"
    ));
}

#[test]
fn new_chapter_emits_a_heading_page() {
    let text = render_document(&fixture_novel(), &[fixture_section()]);
    assert!(text.contains(
        "［＃改ページ］\n［＃ページの左右中央］\n［＃ここから柱］テスト作品［＃ここで柱終わり］\n［＃３字下げ］［＃大見出し］第一章［＃大見出し終わり］\n［＃改ページ］\n"
    ));
    assert!(text.contains("［＃３字下げ］［＃中見出し］第一話［＃中見出し終わり］"));
    assert!(text.contains("［＃ここから前書き］\n前書き\n［＃ここで前書き終わり］"));
    assert!(text.contains("［＃ここから後書き］\n後書き\n［＃ここで後書き終わり］"));
}

#[test]
fn repeated_chapter_heading_is_not_reemitted() {
    let mut second = fixture_section();
    second.subtitle = "第二話".to_string();
    second.introduction = String::new();
    second.body = "続き".to_string();
    second.postscript = String::new();
    let text = render_document(&fixture_novel(), &[fixture_section(), second]);
    assert_eq!(text.matches("［＃大見出し］").count(), 1);
    // A section without a new chapter opens with a bare page break.
    assert!(text.contains("［＃改ページ］\n\n［＃３字下げ］［＃中見出し］第二話"));
}

#[test]
fn subtitle_without_introduction_gets_blank_padding() {
    let mut section = fixture_section();
    section.introduction = String::new();
    let text = render_document(&fixture_novel(), &[section]);
    assert!(text.contains("［＃中見出し終わり］\n\n\n本文"));
}

#[test]
fn write_document_names_file_after_the_title() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_document(&fixture_novel(), &[fixture_section()], dir.path()).unwrap();
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some("テスト作品.aozora.txt")
    );
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.ends_with(&format!("{END_OF_BOOK_MARKER}\n")));
}

#[test]
fn write_document_rejects_an_empty_section_list() {
    let dir = tempfile::tempdir().unwrap();
    let err = write_document(&fixture_novel(), &[], dir.path()).unwrap_err();
    assert!(err.to_string().contains("no sections"));
}

#[test]
fn sections_deserialize_with_optional_fields_defaulted() {
    let section: Section = serde_json::from_str(r#"{"body": "本文"}"#).unwrap();
    assert_eq!(section.body, "本文");
    assert!(section.chapter.is_empty());
    assert!(section.postscript.is_empty());
}
