use serde::{Deserialize, Serialize};

/// Which logical unit of a novel a fragment belongs to.
///
/// The conversion pipeline branches on this in exactly two places: the numeric
/// path (short headings typeset digit runs horizontally inline, so they skip
/// the kanji-numeral and unit-exception passes) and the layout pass (only
/// body-like text gets blank-line packing and bracket indentation).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    Title,
    Story,
    Chapter,
    Subtitle,
    Introduction,
    Body,
    Postscript,
    Textfile,
}

impl TextKind {
    /// Heading-like kinds keep short digit runs in tatechuyoko form and never
    /// see the comma-grouping or unit-exception passes.
    pub fn uses_mixed_digits(self) -> bool {
        matches!(self, TextKind::Subtitle | TextKind::Chapter | TextKind::Story)
    }

    /// Full body text: bracket indentation plus blank-line packing.
    pub fn wants_indent(self) -> bool {
        matches!(self, TextKind::Body | TextKind::Textfile)
    }

    /// Front and back matter: blank-line packing without indentation.
    pub fn wants_packing_only(self) -> bool {
        matches!(self, TextKind::Introduction | TextKind::Postscript)
    }
}
