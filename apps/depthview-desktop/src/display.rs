use std::collections::VecDeque;

use depthview_common::{PointerButton, RgbImage};
use depthview_input::{Key, PointerEvent, PointerHandler};
use depthview_session::{Display, FrameStatus};
use winit::event::{ElementState, MouseButton, MouseScrollDelta};
use winit::keyboard::{Key as WinitKey, NamedKey};

pub fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Tertiary),
        _ => None,
    }
}

/// Vertical scroll amount; positive scrolls away from the user.
pub fn scroll_amount(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(position) => position.y as f32,
    }
}

pub fn viewer_key(key: &WinitKey) -> Option<Key> {
    match key {
        WinitKey::Named(NamedKey::Escape) => Some(Key::Escape),
        WinitKey::Character(text) => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(Key::character(c)),
                _ => None,
            }
        }
        _ => None,
    }
}

/// [`Display`] fed by the winit event loop.
///
/// Window events are queued as they arrive and drained by the frame loop on
/// the next step. Presented frames are held until the GPU side takes them.
#[derive(Debug, Default)]
pub struct WinitDisplay {
    cursor: (f32, f32),
    pointer: VecDeque<PointerEvent>,
    keys: VecDeque<Key>,
    frame: Option<RgbImage>,
    fresh: bool,
    status: Option<FrameStatus>,
    closed: bool,
}

impl WinitDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        self.cursor = (x, y);
        self.pointer.push_back(PointerEvent::moved(x, y));
    }

    pub fn mouse_input(&mut self, state: ElementState, button: MouseButton) {
        let Some(button) = pointer_button(button) else {
            return;
        };
        let (x, y) = self.cursor;
        self.pointer.push_back(match state {
            ElementState::Pressed => PointerEvent::pressed(button, x, y),
            ElementState::Released => PointerEvent::released(button, x, y),
        });
    }

    /// Horizontal-only scrolling is dropped.
    pub fn mouse_wheel(&mut self, delta: MouseScrollDelta) {
        let amount = scroll_amount(delta);
        if amount != 0.0 {
            let (x, y) = self.cursor;
            self.pointer.push_back(PointerEvent::wheel(amount, x, y));
        }
    }

    pub fn key_pressed(&mut self, key: &WinitKey) {
        if let Some(key) = viewer_key(key) {
            self.keys.push_back(key);
        }
    }

    /// The last presented frame, if it has not been taken since.
    pub fn take_frame(&mut self) -> Option<&RgbImage> {
        if !std::mem::take(&mut self.fresh) {
            return None;
        }
        self.frame.as_ref()
    }

    pub fn status(&self) -> Option<&FrameStatus> {
        self.status.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Display for WinitDisplay {
    fn present(&mut self, frame: &RgbImage, status: &FrameStatus) {
        match &mut self.frame {
            Some(last) if last.width() == frame.width() && last.height() == frame.height() => {
                last.pixels_mut().copy_from_slice(frame.pixels());
            }
            slot => *slot = Some(frame.clone()),
        }
        self.fresh = true;
        self.status = Some(*status);
    }

    fn dispatch_pointer_events(&mut self, handler: &mut dyn PointerHandler) {
        for event in self.pointer.drain(..) {
            handler.on_pointer(event);
        }
    }

    fn poll_key(&mut self) -> Option<Key> {
        self.keys.pop_front()
    }

    fn close(&mut self) {
        self.closed = true;
        self.pointer.clear();
        self.keys.clear();
        tracing::debug!("window display closed");
    }
}
