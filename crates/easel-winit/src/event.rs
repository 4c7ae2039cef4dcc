use glam::{uvec2, vec2, UVec2, Vec2};
use winit::event::{
    ElementState, ModifiersState, MouseButton, MouseScrollDelta, VirtualKeyCode, WindowEvent,
};

/// Whether a key or mouse button was pressed or released.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Press,
    Release,
}

impl From<ElementState> for Action {
    fn from(state: ElementState) -> Self {
        match state {
            ElementState::Pressed => Action::Press,
            ElementState::Released => Action::Release,
        }
    }
}

/// Modifier keys held while an event fired.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub control: bool,
    pub alt: bool,
    pub shift: bool,
}

impl From<ModifiersState> for Modifiers {
    fn from(state: ModifiersState) -> Self {
        Modifiers {
            control: state.contains(ModifiersState::CTRL),
            alt: state.contains(ModifiersState::ALT),
            shift: state.contains(ModifiersState::SHIFT),
        }
    }
}

/// The uniform event record delivered to an `Application`.
///
/// Mouse clicks and scrolls do not carry a position of their own on the
/// platform side; they reuse the most recent cursor-move position.
/// Window lifecycle events (close request, redraw request, events
/// cleared) are consumed by the bridge and never appear here.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum CanvasEvent {
    Key {
        key: VirtualKeyCode,
        action: Action,
        modifiers: Modifiers,
    },
    Char {
        c: char,
    },
    CursorMove {
        pos: Vec2,
    },
    MouseClick {
        button: MouseButton,
        action: Action,
        modifiers: Modifiers,
        pos: Vec2,
    },
    Scroll {
        offset: Vec2,
        pos: Vec2,
    },
    Resized {
        new_size: UVec2,
    },
}

/// Converts platform window events into [`CanvasEvent`]s.
///
/// The translator is stateful: it follows the modifier state and caches
/// the cursor position, which starts at `(0, 0)` until the first
/// cursor-move arrives. Events come out in exactly the order they went
/// in; nothing is reordered or batched.
#[derive(Debug, Default)]
pub struct EventTranslator {
    modifiers: ModifiersState,
    cursor_pos: Vec2,
}

impl EventTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last position reported by a cursor-move event.
    pub fn cursor_pos(&self) -> Vec2 {
        self.cursor_pos
    }

    /// Translates one window event. Returns `None` for events that are
    /// not deliverable (modifier changes, unmapped keys, lifecycle
    /// events, and anything this bridge does not understand).
    pub fn window_event(&mut self, event: &WindowEvent) -> Option<CanvasEvent> {
        match event {
            WindowEvent::Resized(new_size) => Some(CanvasEvent::Resized {
                new_size: uvec2(new_size.width, new_size.height),
            }),
            WindowEvent::ReceivedCharacter(c) => Some(CanvasEvent::Char { c: *c }),
            WindowEvent::KeyboardInput { input, .. } => input
                .virtual_keycode
                .map(|key| self.key_input(key, input.state.into())),
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = *modifiers;
                None
            }
            WindowEvent::CursorMoved { position, .. } => {
                Some(self.cursor_moved(vec2(position.x as f32, position.y as f32)))
            }
            WindowEvent::MouseInput { state, button, .. } => {
                Some(self.mouse_input(*button, (*state).into()))
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let offset = match delta {
                    MouseScrollDelta::LineDelta(x, y) => vec2(*x, *y),
                    MouseScrollDelta::PixelDelta(delta) => vec2(delta.x as f32, delta.y as f32),
                };
                Some(self.scrolled(offset))
            }
            _ => None,
        }
    }

    pub fn key_input(&self, key: VirtualKeyCode, action: Action) -> CanvasEvent {
        CanvasEvent::Key {
            key,
            action,
            modifiers: self.modifiers.into(),
        }
    }

    pub fn cursor_moved(&mut self, pos: Vec2) -> CanvasEvent {
        self.cursor_pos = pos;
        CanvasEvent::CursorMove { pos }
    }

    pub fn mouse_input(&mut self, button: MouseButton, action: Action) -> CanvasEvent {
        CanvasEvent::MouseClick {
            button,
            action,
            modifiers: self.modifiers.into(),
            pos: self.cursor_pos,
        }
    }

    pub fn scrolled(&mut self, offset: Vec2) -> CanvasEvent {
        CanvasEvent::Scroll {
            offset,
            pos: self.cursor_pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use winit::dpi::PhysicalSize;

    use super::*;

    #[test]
    fn click_before_any_cursor_move_is_at_the_origin() {
        let mut translator = EventTranslator::new();

        let event = translator.mouse_input(MouseButton::Left, Action::Press);

        assert_eq!(
            event,
            CanvasEvent::MouseClick {
                button: MouseButton::Left,
                action: Action::Press,
                modifiers: Modifiers::default(),
                pos: Vec2::ZERO,
            }
        );
    }

    #[test]
    fn clicks_and_scrolls_reuse_the_cached_cursor_position() {
        let mut translator = EventTranslator::new();

        translator.cursor_moved(vec2(10.0, 20.0));

        let click = translator.mouse_input(MouseButton::Right, Action::Release);
        assert!(matches!(
            click,
            CanvasEvent::MouseClick { pos, .. } if pos == vec2(10.0, 20.0)
        ));

        let scroll = translator.scrolled(vec2(0.0, -1.0));
        assert_eq!(
            scroll,
            CanvasEvent::Scroll {
                offset: vec2(0.0, -1.0),
                pos: vec2(10.0, 20.0),
            }
        );

        translator.cursor_moved(vec2(1.0, 2.0));
        assert!(matches!(
            translator.mouse_input(MouseButton::Left, Action::Press),
            CanvasEvent::MouseClick { pos, .. } if pos == vec2(1.0, 2.0)
        ));
    }

    #[test]
    fn modifier_changes_are_tracked_but_not_delivered() {
        let mut translator = EventTranslator::new();

        assert_eq!(
            translator.window_event(&WindowEvent::ModifiersChanged(ModifiersState::CTRL)),
            None
        );

        let event = translator.key_input(VirtualKeyCode::A, Action::Press);
        assert_eq!(
            event,
            CanvasEvent::Key {
                key: VirtualKeyCode::A,
                action: Action::Press,
                modifiers: Modifiers {
                    control: true,
                    alt: false,
                    shift: false,
                },
            }
        );
    }

    #[test]
    fn resize_and_char_events_translate() {
        let mut translator = EventTranslator::new();

        assert_eq!(
            translator.window_event(&WindowEvent::Resized(PhysicalSize::new(800, 600))),
            Some(CanvasEvent::Resized {
                new_size: uvec2(800, 600)
            })
        );
        assert_eq!(
            translator.window_event(&WindowEvent::ReceivedCharacter('q')),
            Some(CanvasEvent::Char { c: 'q' })
        );
    }
}
