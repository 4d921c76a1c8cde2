use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use depthview_common::RgbImage;
use depthview_input::{Key, PointerEvent, PointerHandler};
use depthview_render::RenderStats;

use crate::LoopState;

/// What the frame loop reports alongside each presented frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStatus {
    pub state: LoopState,
    /// Number of the last frame set acquired.
    pub frame_number: u64,
    pub decimation_level: u8,
    pub scale_to_decimation: bool,
    pub use_color: bool,
    /// Whether the last frame set carried a color frame.
    pub color_available: bool,
    pub stats: RenderStats,
    pub frame_time: Duration,
}

/// Window-side collaborator of a frame loop.
///
/// All methods are called from the frame loop's thread.
pub trait Display {
    /// Show a finished frame.
    fn present(&mut self, frame: &RgbImage, status: &FrameStatus);

    /// Deliver pending pointer events, in arrival order, to `handler`.
    fn dispatch_pointer_events(&mut self, handler: &mut dyn PointerHandler);

    /// Next pending key press, without blocking.
    fn poll_key(&mut self) -> Option<Key>;

    /// Tear down the window. Called once, when the loop stops.
    fn close(&mut self);
}

impl<D: Display + ?Sized> Display for Box<D> {
    fn present(&mut self, frame: &RgbImage, status: &FrameStatus) {
        (**self).present(frame, status);
    }

    fn dispatch_pointer_events(&mut self, handler: &mut dyn PointerHandler) {
        (**self).dispatch_pointer_events(handler);
    }

    fn poll_key(&mut self) -> Option<Key> {
        (**self).poll_key()
    }

    fn close(&mut self) {
        (**self).close();
    }
}

#[derive(Debug, Default)]
struct Recorded {
    presented: u64,
    last_frame: Option<RgbImage>,
    last_status: Option<FrameStatus>,
    closed: bool,
}

/// Read access to what a [`HeadlessDisplay`] has recorded, usable after the
/// display itself has moved to another thread.
#[derive(Debug, Clone)]
pub struct DisplayProbe(Arc<Mutex<Recorded>>);

impl DisplayProbe {
    pub fn frames_presented(&self) -> u64 {
        self.lock().presented
    }

    pub fn last_frame(&self) -> Option<RgbImage> {
        self.lock().last_frame.clone()
    }

    pub fn last_status(&self) -> Option<FrameStatus> {
        self.lock().last_status
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Display without a window: replays scripted input and records frames.
///
/// Each `poll_key` call consumes one scripted key slot and each
/// `dispatch_pointer_events` call consumes one scripted batch of pointer
/// events. Once a script runs out, the display reports no input.
#[derive(Debug, Default)]
pub struct HeadlessDisplay {
    keys: VecDeque<Option<Key>>,
    pointer: VecDeque<Vec<PointerEvent>>,
    idle_wait: Duration,
    recorded: Arc<Mutex<Recorded>>,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long in every `poll_key`, like a GUI key wait.
    pub fn with_idle_wait(mut self, wait: Duration) -> Self {
        self.idle_wait = wait;
        self
    }

    /// Queue a key press for the next free poll slot.
    pub fn script_key(&mut self, key: Key) -> &mut Self {
        self.keys.push_back(Some(key));
        self
    }

    /// Queue `polls` key polls that return nothing.
    pub fn script_idle(&mut self, polls: usize) -> &mut Self {
        self.keys.extend(std::iter::repeat_n(None, polls));
        self
    }

    /// Queue pointer events for the next free dispatch slot.
    pub fn script_pointer(&mut self, events: Vec<PointerEvent>) -> &mut Self {
        self.pointer.push_back(events);
        self
    }

    pub fn probe(&self) -> DisplayProbe {
        DisplayProbe(Arc::clone(&self.recorded))
    }

    fn record(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Display for HeadlessDisplay {
    fn present(&mut self, frame: &RgbImage, status: &FrameStatus) {
        let mut recorded = self.record();
        recorded.presented += 1;
        recorded.last_status = Some(*status);
        match &mut recorded.last_frame {
            Some(last) if last.width() == frame.width() && last.height() == frame.height() => {
                last.pixels_mut().copy_from_slice(frame.pixels());
            }
            slot => *slot = Some(frame.clone()),
        }
    }

    fn dispatch_pointer_events(&mut self, handler: &mut dyn PointerHandler) {
        for event in self.pointer.pop_front().unwrap_or_default() {
            handler.on_pointer(event);
        }
    }

    fn poll_key(&mut self) -> Option<Key> {
        if !self.idle_wait.is_zero() {
            std::thread::sleep(self.idle_wait);
        }
        self.keys.pop_front().flatten()
    }

    fn close(&mut self) {
        self.record().closed = true;
        tracing::debug!("headless display closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depthview_camera::CameraState;
    use depthview_input::InputController;

    fn status() -> FrameStatus {
        FrameStatus {
            state: LoopState::Running,
            frame_number: 7,
            decimation_level: 1,
            scale_to_decimation: true,
            use_color: false,
            color_available: false,
            stats: RenderStats::default(),
            frame_time: Duration::from_millis(3),
        }
    }

    #[test]
    fn keys_replay_in_script_order() {
        let mut display = HeadlessDisplay::new();
        display.script_idle(1).script_key(Key::character('p'));

        assert_eq!(display.poll_key(), None);
        assert_eq!(display.poll_key(), Some(Key::Char('p')));
        assert_eq!(display.poll_key(), None);
    }

    #[test]
    fn pointer_batches_are_dispatched_one_per_call() {
        let mut display = HeadlessDisplay::new();
        display.script_pointer(vec![PointerEvent::wheel(1.0, 0.0, 0.0), PointerEvent::wheel(1.0, 0.0, 0.0)]);

        let mut camera = CameraState::new();
        let input = InputController::new(10, 10);
        display.dispatch_pointer_events(&mut input.bind(&mut camera));
        assert!((camera.distance - 1.8).abs() < 1e-6);

        display.dispatch_pointer_events(&mut input.bind(&mut camera));
        assert!((camera.distance - 1.8).abs() < 1e-6);
    }

    #[test]
    fn probe_sees_frames_and_close() {
        let mut display = HeadlessDisplay::new();
        let probe = display.probe();

        let mut frame = RgbImage::new(2, 2);
        display.present(&frame, &status());
        frame.set(1, 1, [9, 9, 9]);
        display.present(&frame, &status());

        assert_eq!(probe.frames_presented(), 2);
        assert_eq!(probe.last_frame().unwrap().get(1, 1), Some([9, 9, 9]));
        assert_eq!(probe.last_status().unwrap().frame_number, 7);
        assert!(!probe.is_closed());

        display.close();
        assert!(probe.is_closed());
    }
}
