use glam::Vec2;
use palette::Srgba;

/// A single command of a path under construction.
///
/// Commands are buffered by the canvas between `begin_path` and the
/// terminal `stroke`/`fill` call, then submitted to the engine in order.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PathCommand {
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadTo(Vec2, Vec2),
    CubicTo(Vec2, Vec2, Vec2),
    Arc {
        center: Vec2,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
    },
}

/// How strokes and fills are painted.
///
/// Paint settings outlive the path they were set for: a terminal call
/// resets the path but keeps the paint.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Paint {
    Solid(Srgba<u8>),
    LinearGradient {
        point_a: Vec2,
        point_b: Vec2,
        color_a: Srgba<u8>,
        color_b: Srgba<u8>,
    },
}
