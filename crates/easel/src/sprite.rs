use ahash::AHashMap;

use crate::canvas::ContextId;

/// Handle to a sprite uploaded to the engine.
///
/// The wrapped identifier is engine-allocated and opaque; it is only
/// meaningful to the canvas context that created it, and only for that
/// context's lifetime.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SpriteId {
    pub(crate) raw: u64,
    pub(crate) context: ContextId,
}

/// Maps caller-chosen sprite names to handles.
///
/// Re-registering a name overwrites the mapping. The superseded handle
/// stays valid engine-side until the context is freed; the registry
/// never frees it.
#[derive(Debug, Default)]
pub(crate) struct SpriteRegistry {
    by_name: AHashMap<String, SpriteId>,
}

impl SpriteRegistry {
    pub fn insert(&mut self, name: &str, sprite: SpriteId) {
        if self.by_name.insert(name.to_owned(), sprite).is_some() {
            log::warn!("duplicate sprite name '{}'; last registration wins", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<SpriteId> {
        self.by_name.get(name).copied()
    }
}
