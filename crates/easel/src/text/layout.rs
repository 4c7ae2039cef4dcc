use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::canvas::ContextId;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(C)]
pub enum Align {
    /// Top or left
    Start,
    /// Middle or center
    Center,
    /// Bottom or right
    End,
}

/// Defines the baseline of a line of text.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(C)]
pub enum Baseline {
    Top,
    Middle,
    Alphabetic,
    Bottom,
}

/// Settings for laying out text.
#[derive(Debug, Clone, PartialEq)]
#[repr(C)]
pub struct TextLayout {
    /// The maximum dimensions of the formatted text.
    ///
    /// Excess text is hidden.
    pub max_dimensions: Vec2,
    /// Whether to overflow onto a new line when the maximum width is reached.
    ///
    /// If false, then excess characters are omitted.
    pub line_breaks: bool,
    /// The baseline to use.
    pub baseline: Baseline,
    /// Horizontal alignment to apply to the text.
    pub align_h: Align,
    /// Vertical alignment to apply to the text.
    pub align_v: Align,
}

/// A paragraph of rich text, laid out by the engine and ready to draw.
///
/// The engine owns the laid-out data; this wrapper carries the opaque
/// handle plus the dimensions last applied, so an equal-dimension resize
/// can skip the engine round trip. Valid only for the lifetime of the
/// canvas that created it.
#[derive(Debug)]
pub struct Paragraph {
    pub(crate) raw: u64,
    pub(crate) context: ContextId,
    pub(crate) max_dimensions: Vec2,
}

impl Paragraph {
    /// The maximum dimensions last applied by `create_paragraph` or
    /// `resize_paragraph`.
    pub fn max_dimensions(&self) -> Vec2 {
        self.max_dimensions
    }
}
