use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use glam::{Affine2, UVec2, Vec2};
use palette::Srgba;

use crate::{
    engine::Engine,
    error::Error,
    path::{Paint, PathCommand},
    rect::Rect,
    sprite::{SpriteId, SpriteRegistry},
    text::{
        layout::{Paragraph, TextLayout},
        Text,
    },
};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies the canvas context that minted a handle. Handles carry it
/// so that cross-context or post-teardown use is detected instead of
/// silently addressing a foreign resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ContextId(u64);

impl ContextId {
    pub(crate) fn next() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum PathState {
    Idle,
    Building,
}

/// A 2D canvas over an external rendering engine. Modeled after the
/// HTML5 canvas API.
///
/// The canvas is the exclusive owner of its engine context: every
/// engine mutation goes through it, and dropping it frees the context
/// together with all sprites, paragraphs and fonts the engine holds.
///
/// Paths are built between [`begin_path`](Self::begin_path) and a
/// terminal [`stroke`](Self::stroke)/[`fill`](Self::fill) call, which
/// submits the buffered commands under whatever transform and scissor
/// are active at that moment. Paint settings persist across paths and
/// frames; the transform and scissor persist until explicitly reset.
pub struct Canvas {
    engine: Box<dyn Engine>,
    context: ContextId,
    size: UVec2,

    sprites: SpriteRegistry,

    path: Vec<PathCommand>,
    path_state: PathState,
    stroke_width: f32,
    paint: Paint,

    transform: Affine2,
    transform_scale: f32,
    scissor: Option<Rect>,
}

impl Canvas {
    /// Creates a canvas over `engine`, which must have been initialized
    /// with `initial_size` pixel dimensions.
    pub fn new(engine: impl Engine, initial_size: UVec2) -> Self {
        Self {
            engine: Box::new(engine),
            context: ContextId::next(),
            size: initial_size,
            sprites: SpriteRegistry::default(),
            path: Vec::new(),
            path_state: PathState::Idle,
            stroke_width: 1.0,
            paint: Paint::Solid(Srgba::new(u8::MAX, u8::MAX, u8::MAX, u8::MAX)),
            transform: Affine2::IDENTITY,
            transform_scale: 1.0,
            scissor: None,
        }
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.x
    }

    pub fn height(&self) -> u32 {
        self.size.y
    }

    /// Resizes the drawing surface. Call whenever the target window is
    /// resized.
    pub fn resize(&mut self, new_size: UVec2) {
        log::debug!("resizing canvas to {}x{}", new_size.x, new_size.y);
        self.engine.resize(new_size);
        self.size = new_size;
    }

    /// Hands a font file's raw bytes to the engine.
    pub fn load_font(&mut self, data: &[u8]) {
        log::debug!("loading font ({} bytes)", data.len());
        self.engine.load_font(data);
    }

    /// Flushes the frame. Call exactly once per frame, after all draw
    /// calls for that frame; calling with no pending draws is valid.
    pub fn render(&mut self) {
        self.engine.render();
    }

    fn check_handle(&self, context: ContextId, what: &str) {
        if context != self.context {
            panic!(
                "{} handle was created by a different canvas context; \
                 handles must not outlive or cross their owning context",
                what
            );
        }
    }
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("size", &self.size)
            .field("transform", &self.transform)
            .field("scissor", &self.scissor)
            .finish_non_exhaustive()
    }
}

/// Sprites
impl Canvas {
    /// Uploads an encoded image (PNG, JPEG, ...) and registers the
    /// resulting sprite under `name`.
    pub fn create_sprite_from_encoded(
        &mut self,
        name: &str,
        data: &[u8],
    ) -> Result<SpriteId, Error> {
        let raw = self.engine.create_sprite_from_encoded(name, data)?;
        Ok(self.register_sprite(name, raw))
    }

    /// Uploads raw RGBA pixels and registers the resulting sprite under
    /// `name`. `data` must be exactly `size.x * size.y * 4` bytes; the
    /// engine may convert the pixel data in place.
    pub fn create_sprite_from_rgba(
        &mut self,
        name: &str,
        data: &mut [u8],
        size: UVec2,
    ) -> Result<SpriteId, Error> {
        let expected = size.x as usize * size.y as usize * 4;
        if data.len() != expected {
            return Err(Error::SpriteDataSize {
                width: size.x,
                height: size.y,
                expected,
                actual: data.len(),
            });
        }

        let raw = self.engine.create_sprite_from_rgba(name, data, size)?;
        Ok(self.register_sprite(name, raw))
    }

    fn register_sprite(&mut self, name: &str, raw: u64) -> SpriteId {
        let sprite = SpriteId {
            raw,
            context: self.context,
        };
        self.sprites.insert(name, sprite);
        sprite
    }

    /// Looks up a sprite registered under `name`.
    pub fn sprite(&self, name: &str) -> Result<SpriteId, Error> {
        self.sprites
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_owned()))
    }

    /// Size of the sprite in pixels.
    pub fn sprite_size(&self, sprite: SpriteId) -> UVec2 {
        self.check_handle(sprite.context, "sprite");
        self.engine.sprite_size(sprite.raw)
    }

    /// Draws a sprite with its top-left corner at `pos`.
    ///
    /// `width` is the on-canvas width; the height follows from the
    /// sprite's aspect ratio.
    pub fn draw_sprite(&mut self, sprite: SpriteId, pos: Vec2, width: f32) -> &mut Self {
        self.check_handle(sprite.context, "sprite");
        self.engine.draw_sprite(sprite.raw, pos, width);
        self
    }

    /// Looks up `name` and draws it. Fails with [`Error::NotFound`] for
    /// unregistered names, which callers may treat as "skip the draw".
    pub fn draw_sprite_by_name(
        &mut self,
        name: &str,
        pos: Vec2,
        width: f32,
    ) -> Result<&mut Self, Error> {
        let sprite = self.sprite(name)?;
        Ok(self.draw_sprite(sprite, pos, width))
    }
}

/// Text
impl Canvas {
    /// Lays out `text` within `layout`, consuming it: a [`Text`] can
    /// back at most one paragraph.
    pub fn create_paragraph(&mut self, text: Text, layout: TextLayout) -> Result<Paragraph, Error> {
        let raw = self.engine.create_paragraph(&text, &layout)?;
        Ok(Paragraph {
            raw,
            context: self.context,
            max_dimensions: layout.max_dimensions,
        })
    }

    /// Re-flows the paragraph to new maximum dimensions without
    /// re-parsing its markup. A resize to the current dimensions is a
    /// no-op.
    pub fn resize_paragraph(&mut self, paragraph: &mut Paragraph, new_max_dimensions: Vec2) {
        self.check_handle(paragraph.context, "paragraph");
        if paragraph.max_dimensions == new_max_dimensions {
            return;
        }
        self.engine.resize_paragraph(paragraph.raw, new_max_dimensions);
        paragraph.max_dimensions = new_max_dimensions;
    }

    /// Width of the last computed layout.
    pub fn paragraph_width(&self, paragraph: &Paragraph) -> f32 {
        self.check_handle(paragraph.context, "paragraph");
        self.engine.paragraph_width(paragraph.raw)
    }

    /// Height of the last computed layout.
    pub fn paragraph_height(&self, paragraph: &Paragraph) -> f32 {
        self.check_handle(paragraph.context, "paragraph");
        self.engine.paragraph_height(paragraph.raw)
    }

    /// Draws a paragraph with its top-left corner at `pos`.
    pub fn draw_paragraph(&mut self, paragraph: &Paragraph, pos: Vec2) -> &mut Self {
        self.check_handle(paragraph.context, "paragraph");
        self.engine.draw_paragraph(paragraph.raw, pos);
        self
    }
}

/// Path building and painting
impl Canvas {
    /// Starts a new path, discarding any unterminated one.
    pub fn begin_path(&mut self) -> &mut Self {
        self.path.clear();
        self.path_state = PathState::Building;
        self
    }

    pub fn move_to(&mut self, pos: Vec2) -> Result<&mut Self, Error> {
        self.push_command("move_to", PathCommand::MoveTo(pos))
    }

    pub fn line_to(&mut self, pos: Vec2) -> Result<&mut Self, Error> {
        self.push_command("line_to", PathCommand::LineTo(pos))
    }

    pub fn quad_to(&mut self, control: Vec2, pos: Vec2) -> Result<&mut Self, Error> {
        self.push_command("quad_to", PathCommand::QuadTo(control, pos))
    }

    pub fn cubic_to(&mut self, control1: Vec2, control2: Vec2, pos: Vec2) -> Result<&mut Self, Error> {
        self.push_command("cubic_to", PathCommand::CubicTo(control1, control2, pos))
    }

    pub fn arc(
        &mut self,
        center: Vec2,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
    ) -> Result<&mut Self, Error> {
        self.push_command(
            "arc",
            PathCommand::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            },
        )
    }

    fn push_command(
        &mut self,
        operation: &'static str,
        command: PathCommand,
    ) -> Result<&mut Self, Error> {
        if self.path_state != PathState::Building {
            return Err(Error::InvalidState { operation });
        }
        self.path.push(command);
        Ok(self)
    }

    /// Sets the stroke width for subsequent strokes. Persists across
    /// paths.
    pub fn stroke_width(&mut self, width: f32) -> &mut Self {
        self.stroke_width = width;
        self
    }

    /// Sets the paint to a solid color. Persists across paths.
    pub fn solid_color(&mut self, color: impl Into<Srgba<u8>>) -> &mut Self {
        self.paint = Paint::Solid(color.into());
        self
    }

    /// Sets the paint to a linear gradient between two points. Persists
    /// across paths.
    pub fn linear_gradient(
        &mut self,
        point_a: Vec2,
        point_b: Vec2,
        color_a: impl Into<Srgba<u8>>,
        color_b: impl Into<Srgba<u8>>,
    ) -> &mut Self {
        self.paint = Paint::LinearGradient {
            point_a,
            point_b,
            color_a: color_a.into(),
            color_b: color_b.into(),
        };
        self
    }

    /// Strokes the current path and resets it, keeping the paint and
    /// stroke width. Stroking an empty path is a no-op.
    pub fn stroke(&mut self) -> &mut Self {
        self.path_state = PathState::Idle;
        if !self.path.is_empty() {
            self.engine
                .stroke_path(&self.path, &self.paint, self.stroke_width);
            self.path.clear();
        }
        self
    }

    /// Fills the current path and resets it, keeping the paint. Filling
    /// an empty path is a no-op.
    pub fn fill(&mut self) -> &mut Self {
        self.path_state = PathState::Idle;
        if !self.path.is_empty() {
            self.engine.fill_path(&self.path, &self.paint);
            self.path.clear();
        }
        self
    }
}

/// Transform and scissor
impl Canvas {
    /// Translates the canvas.
    pub fn translate(&mut self, vector: Vec2) -> &mut Self {
        self.transform.translation += vector;
        self.engine.translate(vector);
        self
    }

    /// Scales the canvas uniformly.
    pub fn scale(&mut self, scale: f32) -> &mut Self {
        self.transform = self.transform * Affine2::from_scale(Vec2::splat(scale));
        self.transform_scale *= scale;
        self.engine.scale(scale);
        self
    }

    /// Resets the current transformation to the identity matrix.
    pub fn reset_transform(&mut self) -> &mut Self {
        self.transform = Affine2::IDENTITY;
        self.transform_scale = 1.0;
        self.engine.reset_transform();
        self
    }

    pub fn transform(&self) -> Affine2 {
        self.transform
    }

    pub fn transform_scale(&self) -> f32 {
        self.transform_scale
    }

    /// Sets the scissor region, replacing any existing one.
    pub fn scissor_rect(&mut self, rect: Rect) -> &mut Self {
        self.scissor = Some(rect);
        self.engine.set_scissor(rect);
        self
    }

    /// Clears the scissor region.
    pub fn clear_scissor(&mut self) -> &mut Self {
        self.scissor = None;
        self.engine.clear_scissor();
        self
    }

    pub fn scissor(&self) -> Option<Rect> {
        self.scissor
    }
}

#[cfg(test)]
mod tests {
    use glam::{uvec2, vec2};

    use super::*;
    use crate::{
        engine::testing::{Call, CallLog, RecordingEngine},
        text::{layout::{Align, Baseline}, markup, TextStyle},
    };

    fn canvas() -> (Canvas, CallLog) {
        let (engine, calls) = RecordingEngine::new();
        (Canvas::new(engine, uvec2(1920, 1080)), calls)
    }

    fn layout(max_dimensions: Vec2) -> TextLayout {
        TextLayout {
            max_dimensions,
            line_breaks: true,
            baseline: Baseline::Top,
            align_h: Align::Start,
            align_v: Align::Start,
        }
    }

    fn parse(markup_str: &str) -> Text {
        markup::parse(markup_str, TextStyle::default(), |_| None).unwrap()
    }

    #[test]
    fn upload_then_lookup_returns_the_uploaded_handle() {
        let (mut canvas, _calls) = canvas();

        let size = uvec2(fastrand::u32(1..64), fastrand::u32(1..64));
        let mut data: Vec<u8> = (0..size.x * size.y * 4).map(|_| fastrand::u8(..)).collect();

        let sprite = canvas
            .create_sprite_from_rgba("noise", &mut data, size)
            .unwrap();
        assert_eq!(canvas.sprite("noise").unwrap(), sprite);
    }

    #[test]
    fn rgba_length_must_match_dimensions() {
        let (mut canvas, calls) = canvas();

        let mut data = vec![0u8; 16];
        let err = canvas
            .create_sprite_from_rgba("broken", &mut data, uvec2(4, 4))
            .unwrap_err();

        assert!(matches!(
            err,
            Error::SpriteDataSize {
                expected: 64,
                actual: 16,
                ..
            }
        ));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn lookup_of_unregistered_name_fails() {
        let (canvas, _calls) = canvas();
        assert!(matches!(canvas.sprite("ghost"), Err(Error::NotFound(_))));
    }

    #[test]
    fn reregistered_name_overwrites_lookup_but_old_handle_still_draws() {
        let (mut canvas, calls) = canvas();

        let old = canvas
            .create_sprite_from_encoded("unit", &[1, 2, 3])
            .unwrap();
        let new = canvas
            .create_sprite_from_encoded("unit", &[4, 5, 6])
            .unwrap();

        assert_ne!(old, new);
        assert_eq!(canvas.sprite("unit").unwrap(), new);

        canvas.draw_sprite(old, Vec2::ZERO, 10.0);
        assert_eq!(
            *calls.borrow().last().unwrap(),
            Call::DrawSprite {
                sprite: old.raw,
                pos: Vec2::ZERO,
                width: 10.0
            }
        );
    }

    #[test]
    fn missing_sprite_draw_is_recoverable_and_draws_nothing() {
        let (mut canvas, calls) = canvas();

        let err = canvas
            .draw_sprite_by_name("ghost", Vec2::ZERO, 10.0)
            .unwrap_err();

        assert!(matches!(err, Error::NotFound(ref name) if name == "ghost"));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn stroke_submits_buffered_commands_with_current_paint() {
        let (mut canvas, calls) = canvas();

        let red: Srgba<u8> = Srgba::new(255, 0, 0, 255);
        canvas.solid_color(red).stroke_width(2.0);
        canvas.begin_path();
        canvas.move_to(vec2(0.0, 0.0)).unwrap();
        canvas.line_to(vec2(10.0, 0.0)).unwrap();
        canvas.stroke();

        assert_eq!(
            *calls.borrow(),
            vec![Call::StrokePath {
                commands: vec![
                    PathCommand::MoveTo(vec2(0.0, 0.0)),
                    PathCommand::LineTo(vec2(10.0, 0.0)),
                ],
                paint: Paint::Solid(red),
                stroke_width: 2.0,
            }]
        );
    }

    #[test]
    fn terminal_call_without_rebuilding_is_a_noop() {
        let (mut canvas, calls) = canvas();

        canvas.begin_path();
        canvas.move_to(vec2(0.0, 0.0)).unwrap();
        canvas.line_to(vec2(10.0, 0.0)).unwrap();
        canvas.stroke();
        assert_eq!(calls.borrow().len(), 1);

        canvas.fill();
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn empty_path_is_a_noop() {
        let (mut canvas, calls) = canvas();

        canvas.begin_path();
        canvas.stroke();
        canvas.fill();

        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn path_ops_outside_building_fail_without_corrupting_state() {
        let (mut canvas, calls) = canvas();

        let err = canvas.move_to(vec2(1.0, 1.0)).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidState {
                operation: "move_to"
            }
        ));

        canvas.begin_path();
        canvas.move_to(vec2(1.0, 1.0)).unwrap();
        canvas.stroke();
        assert!(matches!(canvas.line_to(Vec2::ZERO), Err(Error::InvalidState { .. })));

        // The failed calls must not have leaked commands into the path.
        assert_eq!(calls.borrow().len(), 1);
        assert!(matches!(
            &calls.borrow()[0],
            Call::StrokePath { commands, .. } if commands.len() == 1
        ));
    }

    #[test]
    fn nested_begin_path_discards_the_unterminated_path() {
        let (mut canvas, calls) = canvas();

        canvas.begin_path();
        canvas.move_to(vec2(1.0, 1.0)).unwrap();
        canvas.begin_path();
        canvas.move_to(vec2(5.0, 5.0)).unwrap();
        canvas.line_to(vec2(6.0, 5.0)).unwrap();
        canvas.fill();

        assert_eq!(
            *calls.borrow(),
            vec![Call::FillPath {
                commands: vec![
                    PathCommand::MoveTo(vec2(5.0, 5.0)),
                    PathCommand::LineTo(vec2(6.0, 5.0)),
                ],
                paint: Paint::Solid(Srgba::new(255, 255, 255, 255)),
            }]
        );
    }

    #[test]
    fn paint_persists_across_path_resets() {
        let (mut canvas, calls) = canvas();

        let color_a: Srgba<u8> = Srgba::new(1, 2, 3, 255);
        let color_b: Srgba<u8> = Srgba::new(4, 5, 6, 255);
        let paint = Paint::LinearGradient {
            point_a: Vec2::ZERO,
            point_b: vec2(0.0, 100.0),
            color_a,
            color_b,
        };
        canvas.linear_gradient(Vec2::ZERO, vec2(0.0, 100.0), color_a, color_b);

        for _ in 0..2 {
            canvas.begin_path();
            canvas.move_to(Vec2::ZERO).unwrap();
            canvas.line_to(vec2(1.0, 0.0)).unwrap();
            canvas.stroke();
        }

        for call in calls.borrow().iter() {
            assert!(matches!(call, Call::StrokePath { paint: p, .. } if *p == paint));
        }
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn paragraph_resize_is_idempotent_for_equal_dimensions() {
        let (mut canvas, calls) = canvas();

        let text = parse("@bold{Dume}");
        let mut paragraph = canvas.create_paragraph(text, layout(vec2(100.0, 50.0))).unwrap();

        canvas.resize_paragraph(&mut paragraph, vec2(300.0, 200.0));
        let width = canvas.paragraph_width(&paragraph);
        let height = canvas.paragraph_height(&paragraph);

        canvas.resize_paragraph(&mut paragraph, vec2(300.0, 200.0));
        assert_eq!(canvas.paragraph_width(&paragraph), width);
        assert_eq!(canvas.paragraph_height(&paragraph), height);

        let resizes = calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, Call::ResizeParagraph { .. }))
            .count();
        assert_eq!(resizes, 1);
        assert_eq!(paragraph.max_dimensions(), vec2(300.0, 200.0));
    }

    #[test]
    fn draw_paragraph_forwards_the_handle() {
        let (mut canvas, calls) = canvas();

        let paragraph = canvas
            .create_paragraph(parse("hello"), layout(vec2(100.0, 50.0)))
            .unwrap();
        canvas.draw_paragraph(&paragraph, vec2(3.0, 4.0));

        assert_eq!(
            *calls.borrow().last().unwrap(),
            Call::DrawParagraph {
                paragraph: paragraph.raw,
                pos: vec2(3.0, 4.0)
            }
        );
    }

    #[test]
    fn transform_ops_mirror_and_forward() {
        let (mut canvas, calls) = canvas();

        canvas.translate(vec2(5.0, 4.0)).scale(2.0);
        assert_eq!(canvas.transform().translation, vec2(5.0, 4.0));
        assert_eq!(canvas.transform_scale(), 2.0);

        canvas.reset_transform();
        assert_eq!(canvas.transform(), Affine2::IDENTITY);
        assert_eq!(canvas.transform_scale(), 1.0);

        let clip = Rect::new(vec2(0.0, 0.0), vec2(64.0, 64.0));
        canvas.scissor_rect(clip);
        assert_eq!(canvas.scissor(), Some(clip));
        canvas.clear_scissor();
        assert_eq!(canvas.scissor(), None);

        assert_eq!(
            *calls.borrow(),
            vec![
                Call::Translate(vec2(5.0, 4.0)),
                Call::Scale(2.0),
                Call::ResetTransform,
                Call::SetScissor(clip),
                Call::ClearScissor,
            ]
        );
    }

    #[test]
    fn resize_updates_dimensions_and_reaches_the_engine() {
        let (mut canvas, calls) = canvas();

        canvas.resize(uvec2(800, 600));

        assert_eq!(canvas.size(), uvec2(800, 600));
        assert_eq!(canvas.width(), 800);
        assert_eq!(canvas.height(), 600);
        assert_eq!(*calls.borrow(), vec![Call::Resize(uvec2(800, 600))]);
    }

    #[test]
    fn render_flushes_through_the_engine() {
        let (mut canvas, calls) = canvas();
        canvas.render();
        assert_eq!(*calls.borrow(), vec![Call::Render]);
    }

    #[test]
    #[should_panic(expected = "different canvas context")]
    fn cross_context_handle_use_is_fatal() {
        let (mut first, _calls) = canvas();
        let (mut second, _other) = canvas();

        let sprite = first
            .create_sprite_from_encoded("unit", &[1, 2, 3])
            .unwrap();
        second.draw_sprite(sprite, Vec2::ZERO, 10.0);
    }
}
