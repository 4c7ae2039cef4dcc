//! The boundary between the canvas and the external renderer.

use glam::{UVec2, Vec2};

use crate::{
    error::Error,
    path::{Paint, PathCommand},
    rect::Rect,
    text::{layout::TextLayout, Text},
};

#[cfg(feature = "ffi")]
pub mod ffi;

/// The rendering engine contract.
///
/// One method per engine entry point: resource uploads, paragraph
/// layout, path submission, transform/scissor updates, draw calls and
/// the per-frame `render` flush. Sprite and paragraph handles are the
/// engine's opaque 64-bit identifiers; the canvas wraps them in typed
/// handles and never hands the raw values out.
///
/// Implementations are not expected to be thread-safe; the canvas owns
/// its engine exclusively and drives it from a single thread. Dropping
/// the engine releases the context and every resource it owns.
pub trait Engine: 'static {
    fn resize(&mut self, new_size: UVec2);

    fn load_font(&mut self, data: &[u8]);

    fn create_sprite_from_encoded(&mut self, name: &str, data: &[u8]) -> Result<u64, Error>;

    fn create_sprite_from_rgba(
        &mut self,
        name: &str,
        data: &mut [u8],
        size: UVec2,
    ) -> Result<u64, Error>;

    fn sprite_size(&self, sprite: u64) -> UVec2;

    fn create_paragraph(&mut self, text: &Text, layout: &TextLayout) -> Result<u64, Error>;

    fn resize_paragraph(&mut self, paragraph: u64, new_max_dimensions: Vec2);

    fn paragraph_width(&self, paragraph: u64) -> f32;

    fn paragraph_height(&self, paragraph: u64) -> f32;

    fn stroke_path(&mut self, commands: &[PathCommand], paint: &Paint, stroke_width: f32);

    fn fill_path(&mut self, commands: &[PathCommand], paint: &Paint);

    fn translate(&mut self, vector: Vec2);

    fn scale(&mut self, scale: f32);

    fn reset_transform(&mut self);

    fn set_scissor(&mut self, rect: Rect);

    fn clear_scissor(&mut self);

    fn draw_sprite(&mut self, sprite: u64, pos: Vec2, width: f32);

    fn draw_paragraph(&mut self, paragraph: u64, pos: Vec2);

    fn render(&mut self);
}
