pub mod converter;
pub mod document;
pub mod text_kind;

// Re-export the main entry points for convenient access
pub use converter::convert_fragment;
pub use converter::layout::pack_blank_lines;
pub use converter::tables::digits_to_kanji;
pub use document::{render_document, write_document, Novel, Section};
pub use text_kind::TextKind;
