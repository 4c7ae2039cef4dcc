//! 2D canvas facade over an external GPU renderer.
//!
//! The renderer lives behind a foreign-function boundary and is reached
//! only through the [`Engine`] trait; `easel` owns the bookkeeping that
//! makes that boundary safe to program against: a name registry for
//! sprite handles, the path/paint state machine, the transform and
//! scissor state, and the markup-to-paragraph text pipeline.
//!
//! Drawing goes through a single [`Canvas`], which holds the engine
//! context exclusively and tears it down on drop. With the `ffi` feature
//! enabled, `FfiEngine` binds the canvas to the engine's C entry
//! points; anything else implementing [`Engine`] (software renderers,
//! test doubles) works the same way.

mod canvas;
mod engine;
mod error;
pub mod font;
mod path;
mod rect;
mod sprite;
mod text;

pub use canvas::Canvas;
pub use engine::Engine;
#[cfg(feature = "ffi")]
pub use engine::ffi::FfiEngine;
pub use error::Error;
pub use font::{Query, Style, Weight};
pub use path::{Paint, PathCommand};
pub use rect::Rect;
pub use sprite::SpriteId;
pub use text::{
    layout::{Align, Baseline, Paragraph, TextLayout},
    markup, Text, TextSection, TextStyle,
};

pub use palette::Srgba;
