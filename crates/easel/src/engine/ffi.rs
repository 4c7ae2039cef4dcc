//! Bindings to the external renderer's C entry points.
//!
//! Everything here marshals the [`Engine`] trait onto the engine
//! library's stable C contract. Binaries using [`FfiEngine`] must link
//! against that library; the rest of the crate never references these
//! symbols, which is why this module sits behind the `ffi` feature.

use std::{ffi::c_void, os::raw::c_ulong};

use glam::{UVec2, Vec2};
use palette::Srgba;
use raw_window_handle::{unix::XlibHandle, HasRawWindowHandle, RawWindowHandle};

use crate::{
    engine::Engine,
    error::Error,
    font::{Style, Weight},
    path::{Paint, PathCommand},
    rect::Rect,
    text::{layout::TextLayout, Text, TextSection, TextStyle},
};

#[repr(C)]
struct EngineCtx {
    _private: [u8; 0],
}

#[repr(C)]
struct EngineText {
    _private: [u8; 0],
}

#[repr(C)]
struct EngineParagraph {
    _private: [u8; 0],
}

#[repr(C)]
struct RawWindow {
    window: c_ulong,
    display: *mut c_void,
}

#[repr(C)]
struct CTextStyle {
    family_name: *const u8,
    family_name_len: usize,
    weight: Weight,
    style: Style,
    size: f32,
    color: *const u8,
}

#[repr(C)]
struct Variable {
    value: *const u8,
    len: usize,
}

type ResolveVariable = extern "C" fn(*mut c_void, *const u8, usize) -> Variable;

extern "C" {
    fn easel_init(width: u32, height: u32, window: RawWindow) -> *mut EngineCtx;
    fn easel_free(ctx: *mut EngineCtx);
    fn easel_resize(ctx: *mut EngineCtx, new_width: u32, new_height: u32);
    fn easel_load_font(ctx: *mut EngineCtx, data: *const u8, len: usize);

    fn easel_create_sprite_from_encoded(
        ctx: *mut EngineCtx,
        name: *const u8,
        name_len: usize,
        data: *const u8,
        data_len: usize,
    ) -> u64;
    fn easel_create_sprite_from_rgba(
        ctx: *mut EngineCtx,
        name: *const u8,
        name_len: usize,
        data: *mut u8,
        data_len: usize,
        width: u32,
        height: u32,
    ) -> u64;
    fn easel_get_sprite_size(ctx: *mut EngineCtx, sprite: u64) -> Vec2;

    fn easel_parse_markup(
        markup: *const u8,
        markup_len: usize,
        default_style: CTextStyle,
        userdata: *mut c_void,
        resolve_variable: ResolveVariable,
    ) -> *mut EngineText;
    fn easel_create_paragraph(
        ctx: *mut EngineCtx,
        text: *mut EngineText,
        layout: TextLayout,
    ) -> *mut EngineParagraph;
    fn easel_paragraph_resize(
        ctx: *mut EngineCtx,
        paragraph: *mut EngineParagraph,
        new_max_dimensions: Vec2,
    );
    fn easel_paragraph_width(paragraph: *const EngineParagraph) -> f32;
    fn easel_paragraph_height(paragraph: *const EngineParagraph) -> f32;

    fn easel_begin_path(ctx: *mut EngineCtx);
    fn easel_move_to(ctx: *mut EngineCtx, pos: Vec2);
    fn easel_line_to(ctx: *mut EngineCtx, pos: Vec2);
    fn easel_quad_to(ctx: *mut EngineCtx, control: Vec2, pos: Vec2);
    fn easel_cubic_to(ctx: *mut EngineCtx, control1: Vec2, control2: Vec2, pos: Vec2);
    fn easel_arc(
        ctx: *mut EngineCtx,
        center: Vec2,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
    );
    fn easel_stroke_width(ctx: *mut EngineCtx, width: f32);
    fn easel_solid_color(ctx: *mut EngineCtx, color: &[u8; 4]);
    fn easel_linear_gradient(
        ctx: *mut EngineCtx,
        point_a: Vec2,
        point_b: Vec2,
        color_a: &[u8; 4],
        color_b: &[u8; 4],
    );
    fn easel_stroke(ctx: *mut EngineCtx);
    fn easel_fill(ctx: *mut EngineCtx);

    fn easel_translate(ctx: *mut EngineCtx, vector: Vec2);
    fn easel_scale(ctx: *mut EngineCtx, scale: f32);
    fn easel_reset_transform(ctx: *mut EngineCtx);
    fn easel_scissor_rect(ctx: *mut EngineCtx, pos: Vec2, size: Vec2);
    fn easel_clear_scissor(ctx: *mut EngineCtx);

    fn easel_draw_sprite(ctx: *mut EngineCtx, pos: Vec2, width: f32, sprite: u64);
    fn easel_draw_paragraph(ctx: *mut EngineCtx, pos: Vec2, paragraph: *const EngineParagraph);

    fn easel_render(ctx: *mut EngineCtx);
}

/// [`Engine`] implementation backed by the engine's C library.
pub struct FfiEngine {
    ctx: *mut EngineCtx,
}

impl FfiEngine {
    /// Initializes an engine context of `initial_size` pixels targeting
    /// `window`. Only X11 windows are supported.
    ///
    /// # Panics
    /// Panics if the window is not an X11 window or the engine fails to
    /// initialize.
    pub fn new(initial_size: UVec2, window: &impl HasRawWindowHandle) -> Self {
        let window = match window.raw_window_handle() {
            RawWindowHandle::Xlib(XlibHandle {
                window, display, ..
            }) => RawWindow { window, display },
            _ => panic!("the engine only supports X11 windows"),
        };

        let ctx = unsafe { easel_init(initial_size.x, initial_size.y, window) };
        assert!(!ctx.is_null(), "engine initialization failed");
        Self { ctx }
    }

    fn replay_path(&mut self, commands: &[PathCommand]) {
        unsafe {
            easel_begin_path(self.ctx);
            for command in commands {
                match *command {
                    PathCommand::MoveTo(pos) => easel_move_to(self.ctx, pos),
                    PathCommand::LineTo(pos) => easel_line_to(self.ctx, pos),
                    PathCommand::QuadTo(control, pos) => easel_quad_to(self.ctx, control, pos),
                    PathCommand::CubicTo(control1, control2, pos) => {
                        easel_cubic_to(self.ctx, control1, control2, pos)
                    }
                    PathCommand::Arc {
                        center,
                        radius,
                        start_angle,
                        end_angle,
                    } => easel_arc(self.ctx, center, radius, start_angle, end_angle),
                }
            }
        }
    }

    fn apply_paint(&mut self, paint: &Paint) {
        unsafe {
            match *paint {
                Paint::Solid(color) => easel_solid_color(self.ctx, &color_bytes(color)),
                Paint::LinearGradient {
                    point_a,
                    point_b,
                    color_a,
                    color_b,
                } => easel_linear_gradient(
                    self.ctx,
                    point_a,
                    point_b,
                    &color_bytes(color_a),
                    &color_bytes(color_b),
                ),
            }
        }
    }
}

impl Engine for FfiEngine {
    fn resize(&mut self, new_size: UVec2) {
        unsafe { easel_resize(self.ctx, new_size.x, new_size.y) }
    }

    fn load_font(&mut self, data: &[u8]) {
        unsafe { easel_load_font(self.ctx, data.as_ptr(), data.len()) }
    }

    fn create_sprite_from_encoded(&mut self, name: &str, data: &[u8]) -> Result<u64, Error> {
        let raw = unsafe {
            easel_create_sprite_from_encoded(
                self.ctx,
                name.as_ptr(),
                name.len(),
                data.as_ptr(),
                data.len(),
            )
        };
        sprite_or_exhausted(raw)
    }

    fn create_sprite_from_rgba(
        &mut self,
        name: &str,
        data: &mut [u8],
        size: UVec2,
    ) -> Result<u64, Error> {
        let raw = unsafe {
            easel_create_sprite_from_rgba(
                self.ctx,
                name.as_ptr(),
                name.len(),
                data.as_mut_ptr(),
                data.len(),
                size.x,
                size.y,
            )
        };
        sprite_or_exhausted(raw)
    }

    fn sprite_size(&self, sprite: u64) -> UVec2 {
        unsafe { easel_get_sprite_size(self.ctx, sprite) }.as_uvec2()
    }

    fn create_paragraph(&mut self, text: &Text, layout: &TextLayout) -> Result<u64, Error> {
        let (markup, section_texts) = encode_sections(text);

        // Section text travels through the resolver channel, the
        // engine's injection-safe path for literal bytes.
        let default_style = TextStyle::default();
        let default_color = color_bytes(default_style.color);
        let c_style = CTextStyle {
            family_name: default_style.font.family.as_ptr(),
            family_name_len: default_style.font.family.len(),
            weight: default_style.font.weight,
            style: default_style.font.style,
            size: default_style.size,
            color: default_color.as_ptr(),
        };

        let engine_text = unsafe {
            easel_parse_markup(
                markup.as_ptr(),
                markup.len(),
                c_style,
                &section_texts as *const Vec<String> as *mut c_void,
                resolve_section_text,
            )
        };
        if engine_text.is_null() {
            return Err(Error::ResourceExhausted);
        }

        let paragraph = unsafe { easel_create_paragraph(self.ctx, engine_text, layout.clone()) };
        if paragraph.is_null() {
            return Err(Error::ResourceExhausted);
        }
        Ok(paragraph as u64)
    }

    fn resize_paragraph(&mut self, paragraph: u64, new_max_dimensions: Vec2) {
        unsafe {
            easel_paragraph_resize(
                self.ctx,
                paragraph as *mut EngineParagraph,
                new_max_dimensions,
            )
        }
    }

    fn paragraph_width(&self, paragraph: u64) -> f32 {
        unsafe { easel_paragraph_width(paragraph as *const EngineParagraph) }
    }

    fn paragraph_height(&self, paragraph: u64) -> f32 {
        unsafe { easel_paragraph_height(paragraph as *const EngineParagraph) }
    }

    fn stroke_path(&mut self, commands: &[PathCommand], paint: &Paint, stroke_width: f32) {
        self.replay_path(commands);
        self.apply_paint(paint);
        unsafe {
            easel_stroke_width(self.ctx, stroke_width);
            easel_stroke(self.ctx);
        }
    }

    fn fill_path(&mut self, commands: &[PathCommand], paint: &Paint) {
        self.replay_path(commands);
        self.apply_paint(paint);
        unsafe { easel_fill(self.ctx) }
    }

    fn translate(&mut self, vector: Vec2) {
        unsafe { easel_translate(self.ctx, vector) }
    }

    fn scale(&mut self, scale: f32) {
        unsafe { easel_scale(self.ctx, scale) }
    }

    fn reset_transform(&mut self) {
        unsafe { easel_reset_transform(self.ctx) }
    }

    fn set_scissor(&mut self, rect: Rect) {
        unsafe { easel_scissor_rect(self.ctx, rect.pos, rect.size) }
    }

    fn clear_scissor(&mut self) {
        unsafe { easel_clear_scissor(self.ctx) }
    }

    fn draw_sprite(&mut self, sprite: u64, pos: Vec2, width: f32) {
        unsafe { easel_draw_sprite(self.ctx, pos, width, sprite) }
    }

    fn draw_paragraph(&mut self, paragraph: u64, pos: Vec2) {
        unsafe { easel_draw_paragraph(self.ctx, pos, paragraph as *const EngineParagraph) }
    }

    fn render(&mut self) {
        unsafe { easel_render(self.ctx) }
    }
}

impl Drop for FfiEngine {
    fn drop(&mut self) {
        unsafe { easel_free(self.ctx) }
    }
}

fn sprite_or_exhausted(raw: u64) -> Result<u64, Error> {
    // The engine reports allocation failure with the null handle.
    match raw {
        0 => Err(Error::ResourceExhausted),
        raw => Ok(raw),
    }
}

fn color_bytes(color: Srgba<u8>) -> [u8; 4] {
    [
        color.color.red,
        color.color.green,
        color.color.blue,
        color.alpha,
    ]
}

/// Serializes parsed sections back into the engine's canonical markup.
///
/// Each section's literal text is referenced as `%sN` and supplied by
/// [`resolve_section_text`], so text containing markup characters is
/// never re-interpreted. Weights other than bold have no markup
/// directive; `@bold` stands in for semibold and heavier.
fn encode_sections(text: &Text) -> (String, Vec<String>) {
    let mut markup = String::new();
    let mut section_texts = Vec::new();

    for section in text.sections() {
        match section {
            TextSection::Text { text, style } => {
                let reference = format!("%s{}", section_texts.len());
                section_texts.push(text.clone());

                let color = color_bytes(style.color);
                markup.push_str(&format!("@font{{{}}}{{", style.font.family));
                markup.push_str(&format!("@size{{{}}}{{", style.size));
                markup.push_str(&format!(
                    "@color{{rgba({},{},{},{})}}{{",
                    color[0], color[1], color[2], color[3]
                ));
                let mut depth = 3;
                if style.font.weight >= Weight::SemiBold {
                    markup.push_str("@bold{");
                    depth += 1;
                }
                if style.font.style == Style::Italic {
                    markup.push_str("@italic{");
                    depth += 1;
                }
                markup.push_str(&reference);
                for _ in 0..depth {
                    markup.push('}');
                }
            }
            TextSection::Icon { name, size } => {
                markup.push_str(&format!("@size{{{}}}{{@icon{{{}}}}}", size, name));
            }
        }
    }

    (markup, section_texts)
}

extern "C" fn resolve_section_text(
    userdata: *mut c_void,
    name: *const u8,
    len: usize,
) -> Variable {
    let section_texts = unsafe { &*(userdata as *const Vec<String>) };
    let name = unsafe { std::str::from_utf8_unchecked(std::slice::from_raw_parts(name, len)) };

    let value = name
        .strip_prefix('s')
        .and_then(|index| index.parse::<usize>().ok())
        .and_then(|index| section_texts.get(index));

    match value {
        Some(value) => Variable {
            value: value.as_ptr(),
            len: value.len(),
        },
        None => Variable {
            value: std::ptr::null(),
            len: 0,
        },
    }
}
