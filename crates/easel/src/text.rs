//! Rich text implementation.

pub mod layout;
pub mod markup;

use palette::Srgba;

use crate::font::Query;

/// Some rich text. Implemented as a list of [`TextSection`]s.
///
/// `Text` is deliberately not `Clone`: creating a paragraph consumes it,
/// so a parsed text cannot be laid out twice.
#[derive(Debug, PartialEq)]
pub struct Text {
    sections: Vec<TextSection>,
}

impl Text {
    pub fn from_sections(sections: Vec<TextSection>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[TextSection] {
        &self.sections
    }
}

/// A run of text with the same style, or an inline icon.
#[derive(Debug, Clone, PartialEq)]
pub enum TextSection {
    Text {
        text: String,
        style: TextStyle,
    },
    /// Embed an icon inside text.
    Icon {
        /// Name of a sprite in the sprite registry.
        name: String,
        /// Height of the icon. Matches the size of a glyph with the same size.
        size: f32,
    },
}

/// Style of a text section.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Text color.
    pub color: Srgba<u8>,
    /// Font size in logical pixels.
    pub size: f32,
    /// The font to use. Accounts for bold and italics too.
    pub font: Query,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Srgba::new(0, 0, 0, u8::MAX),
            size: 12.0,
            font: Query::default(),
        }
    }
}
