//! `winit` bridge for [`easel`].
//!
//! [`WindowBridge`] owns the canvas, the event translator and the
//! window, and drives an [`Application`] from the platform event loop:
//! redraw requests call `draw` followed by the frame flush, window
//! events are translated into [`CanvasEvent`]s and handed to
//! `handle_event` in the order the platform delivered them.
//!
//! The bridge never forwards lifecycle events. A close request exits
//! the loop, and once the queued events are cleared a native redraw is
//! requested so the application keeps animating.

mod event;

pub use event::{Action, CanvasEvent, EventTranslator, Modifiers};

use easel::Canvas;
use glam::uvec2;
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::Window,
};

/// Implemented by the host (or the scripting layer's host-side shim) to
/// receive draw callbacks and translated events.
pub trait Application {
    /// Called once per frame, before the canvas flushes.
    fn draw(&mut self, canvas: &mut Canvas);

    /// Called for every translated event.
    fn handle_event(&mut self, canvas: &mut Canvas, event: &CanvasEvent) {
        let _ = (canvas, event);
    }
}

/// Binds a canvas and an event translator to a window.
pub struct WindowBridge {
    canvas: Canvas,
    translator: EventTranslator,
    window: Window,
}

impl WindowBridge {
    pub fn new(canvas: Canvas, window: Window) -> Self {
        Self {
            canvas,
            translator: EventTranslator::new(),
            window,
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn canvas(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    /// Runs the event loop until the window is closed.
    ///
    /// Everything happens on the loop thread: event delivery, `draw`
    /// and the render flush.
    pub fn run(mut self, event_loop: EventLoop<()>, mut application: impl Application + 'static) -> ! {
        event_loop.run(move |event, _, control_flow| {
            *control_flow = ControlFlow::Poll;

            match event {
                Event::MainEventsCleared => self.window.request_redraw(),
                Event::RedrawRequested(_) => {
                    application.draw(&mut self.canvas);
                    self.canvas.render();
                }
                Event::WindowEvent { event, .. } => {
                    if let WindowEvent::CloseRequested = event {
                        *control_flow = ControlFlow::Exit;
                        return;
                    }
                    dispatch_window_event(
                        &mut self.canvas,
                        &mut self.translator,
                        &event,
                        &mut application,
                    );
                }
                _ => {}
            }
        })
    }
}

/// Applies a window event to the canvas, then forwards the translated
/// event to the application. For resizes the engine learns the new
/// dimensions before the handler observes them.
fn dispatch_window_event(
    canvas: &mut Canvas,
    translator: &mut EventTranslator,
    event: &WindowEvent,
    application: &mut impl Application,
) {
    if let WindowEvent::Resized(new_size) = event {
        canvas.resize(uvec2(new_size.width, new_size.height));
    }

    if let Some(event) = translator.window_event(event) {
        application.handle_event(canvas, &event);
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use easel::{Engine, Error, Paint, PathCommand, Rect, Text, TextLayout};
    use glam::{uvec2, UVec2, Vec2};
    use winit::dpi::PhysicalSize;

    use super::*;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Engine stub that records resizes into a shared log so ordering
    /// against handler callbacks is observable.
    struct StubEngine {
        log: Log,
    }

    impl Engine for StubEngine {
        fn resize(&mut self, new_size: UVec2) {
            self.log
                .borrow_mut()
                .push(format!("engine resize {}x{}", new_size.x, new_size.y));
        }

        fn load_font(&mut self, _data: &[u8]) {}

        fn create_sprite_from_encoded(&mut self, _name: &str, _data: &[u8]) -> Result<u64, Error> {
            Ok(1)
        }

        fn create_sprite_from_rgba(
            &mut self,
            _name: &str,
            _data: &mut [u8],
            _size: UVec2,
        ) -> Result<u64, Error> {
            Ok(1)
        }

        fn sprite_size(&self, _sprite: u64) -> UVec2 {
            UVec2::ZERO
        }

        fn create_paragraph(&mut self, _text: &Text, _layout: &TextLayout) -> Result<u64, Error> {
            Ok(1)
        }

        fn resize_paragraph(&mut self, _paragraph: u64, _new_max_dimensions: Vec2) {}

        fn paragraph_width(&self, _paragraph: u64) -> f32 {
            0.0
        }

        fn paragraph_height(&self, _paragraph: u64) -> f32 {
            0.0
        }

        fn stroke_path(&mut self, _commands: &[PathCommand], _paint: &Paint, _stroke_width: f32) {}

        fn fill_path(&mut self, _commands: &[PathCommand], _paint: &Paint) {}

        fn translate(&mut self, _vector: Vec2) {}

        fn scale(&mut self, _scale: f32) {}

        fn reset_transform(&mut self) {}

        fn set_scissor(&mut self, _rect: Rect) {}

        fn clear_scissor(&mut self) {}

        fn draw_sprite(&mut self, _sprite: u64, _pos: Vec2, _width: f32) {}

        fn draw_paragraph(&mut self, _paragraph: u64, _pos: Vec2) {}

        fn render(&mut self) {}
    }

    struct RecordingApp {
        log: Log,
    }

    impl Application for RecordingApp {
        fn draw(&mut self, _canvas: &mut Canvas) {}

        fn handle_event(&mut self, _canvas: &mut Canvas, event: &CanvasEvent) {
            let line = match event {
                CanvasEvent::Resized { new_size } => {
                    format!("handler resized {}x{}", new_size.x, new_size.y)
                }
                other => format!("handler {:?}", other),
            };
            self.log.borrow_mut().push(line);
        }
    }

    #[test]
    fn resize_reaches_the_engine_before_the_handler() {
        let log = Log::default();
        let mut canvas = Canvas::new(StubEngine { log: Rc::clone(&log) }, uvec2(640, 480));
        let mut translator = EventTranslator::new();
        let mut app = RecordingApp { log: Rc::clone(&log) };

        dispatch_window_event(
            &mut canvas,
            &mut translator,
            &WindowEvent::Resized(PhysicalSize::new(800, 600)),
            &mut app,
        );

        assert_eq!(
            *log.borrow(),
            vec![
                "engine resize 800x600".to_owned(),
                "handler resized 800x600".to_owned(),
            ]
        );
        assert_eq!(canvas.size(), uvec2(800, 600));
    }

    #[test]
    fn translated_events_are_forwarded_in_order() {
        let log = Log::default();
        let mut canvas = Canvas::new(StubEngine { log: Rc::clone(&log) }, uvec2(640, 480));
        let mut translator = EventTranslator::new();
        let mut app = RecordingApp { log: Rc::clone(&log) };

        dispatch_window_event(
            &mut canvas,
            &mut translator,
            &WindowEvent::ReceivedCharacter('a'),
            &mut app,
        );
        dispatch_window_event(
            &mut canvas,
            &mut translator,
            &WindowEvent::ReceivedCharacter('b'),
            &mut app,
        );

        assert_eq!(
            *log.borrow(),
            vec![
                "handler Char { c: 'a' }".to_owned(),
                "handler Char { c: 'b' }".to_owned(),
            ]
        );
    }
}
