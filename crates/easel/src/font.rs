//! Font selection vocabulary carried inside text styles.
//!
//! Font files themselves are raw bytes handed to the engine through
//! `Canvas::load_font`; matching a query against loaded faces happens
//! engine-side.

use serde::{Deserialize, Serialize};

/// A font weight, indicating how dark it appears.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(C)]
pub enum Weight {
    Thin,
    ExtraLight,
    Light,
    Normal,
    Medium,
    SemiBold,
    Bold,
    ExtraBold,
    Black,
}

impl Default for Weight {
    fn default() -> Self {
        Self::Normal
    }
}

/// Font style: normal or italic. We do not support
/// oblique fonts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(C)]
pub enum Style {
    Normal,
    Italic,
}

impl Default for Style {
    fn default() -> Self {
        Self::Normal
    }
}

/// A font query. Specifies which fonts can
/// be used in a given context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    pub family: String,
    pub style: Style,
    pub weight: Weight,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            family: "Merriweather".to_owned(),
            style: Style::default(),
            weight: Weight::default(),
        }
    }
}
