use crate::text::markup::MarkupError;

/// Errors reported by canvas operations.
///
/// `NotFound` is the only locally recoverable class (skip the draw);
/// everything else propagates upward. A failed call leaves the
/// path/paint/transform state exactly as it was. Using a handle from a
/// different canvas context is not an `Error` at all: it is a caller
/// contract violation and panics.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no sprite registered under the name '{0}'")]
    NotFound(String),
    #[error("`{operation}` requires an active path; call `begin_path` first")]
    InvalidState { operation: &'static str },
    #[error(transparent)]
    MarkupSyntax(#[from] MarkupError),
    #[error("the engine could not allocate the requested resource")]
    ResourceExhausted,
    #[error("RGBA data for a {width}x{height} sprite must be {expected} bytes, got {actual}")]
    SpriteDataSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}
