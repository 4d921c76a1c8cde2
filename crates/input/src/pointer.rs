use depthview_camera::CameraState;
use depthview_common::PointerButton;
use glam::{Vec2, Vec3};

/// Dolly distance per pixel of tertiary-drag motion.
const DRAG_DOLLY_STEP: f32 = 0.01;
/// Dolly distance per wheel tick.
const WHEEL_DOLLY_STEP: f32 = 0.1;

/// What happened to the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEventKind {
    Pressed(PointerButton),
    Released(PointerButton),
    Moved,
    /// Scroll with the given signed delta; positive scrolls away from the user.
    Wheel(f32),
}

/// A pointer event in viewport pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub position: Vec2,
}

impl PointerEvent {
    pub fn pressed(button: PointerButton, x: f32, y: f32) -> Self {
        Self {
            kind: PointerEventKind::Pressed(button),
            position: Vec2::new(x, y),
        }
    }

    pub fn released(button: PointerButton, x: f32, y: f32) -> Self {
        Self {
            kind: PointerEventKind::Released(button),
            position: Vec2::new(x, y),
        }
    }

    pub fn moved(x: f32, y: f32) -> Self {
        Self {
            kind: PointerEventKind::Moved,
            position: Vec2::new(x, y),
        }
    }

    pub fn wheel(delta: f32, x: f32, y: f32) -> Self {
        Self {
            kind: PointerEventKind::Wheel(delta),
            position: Vec2::new(x, y),
        }
    }
}

/// Synchronous sink for pointer events, invoked by the display layer.
pub trait PointerHandler {
    fn on_pointer(&mut self, event: PointerEvent);
}

/// Translates pointer events into camera motion, scaled to the viewport so
/// angular speed does not depend on window size.
#[derive(Debug, Clone, Copy)]
pub struct InputController {
    width: f32,
    height: f32,
}

impl InputController {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.max(1) as f32,
            height: height.max(1) as f32,
        }
    }

    /// Apply one pointer event to the camera.
    pub fn handle(&self, camera: &mut CameraState, event: PointerEvent) {
        match event.kind {
            PointerEventKind::Pressed(button) => camera.buttons.set(button, true),
            PointerEventKind::Released(button) => camera.buttons.set(button, false),
            PointerEventKind::Moved => self.drag(camera, event.position - camera.prev_pointer),
            PointerEventKind::Wheel(delta) => {
                let dz = if delta < 0.0 {
                    -WHEEL_DOLLY_STEP
                } else {
                    WHEEL_DOLLY_STEP
                };
                dolly(camera, dz);
            }
        }
        camera.prev_pointer = event.position;
    }

    /// Pair the controller with a camera so a display can feed it events.
    pub fn bind<'a>(&'a self, camera: &'a mut CameraState) -> BoundController<'a> {
        BoundController {
            controller: self,
            camera,
        }
    }

    // One drag mode at a time: primary beats secondary beats tertiary.
    fn drag(&self, camera: &mut CameraState, delta: Vec2) {
        if camera.buttons.is_held(PointerButton::Primary) {
            camera.yaw += delta.x / self.width * 2.0;
            camera.pitch -= delta.y / self.height * 2.0;
        } else if camera.buttons.is_held(PointerButton::Secondary) {
            let dp = Vec3::new(delta.x / self.width, delta.y / self.height, 0.0);
            camera.translation -= camera.rotation() * dp;
        } else if camera.buttons.is_held(PointerButton::Tertiary) {
            // Upward motion (negative dy) dollies forward; no vertical motion counts as upward.
            let sign = if delta.y > 0.0 { -1.0 } else { 1.0 };
            dolly(camera, delta.length() * sign * DRAG_DOLLY_STEP);
        }
    }
}

/// Move the camera and its pivot distance in lockstep.
fn dolly(camera: &mut CameraState, dz: f32) {
    camera.translation.z += dz;
    camera.distance -= dz;
}

/// An `InputController` bound to the camera it drives.
pub struct BoundController<'a> {
    controller: &'a InputController,
    camera: &'a mut CameraState,
}

impl PointerHandler for BoundController<'_> {
    fn on_pointer(&mut self, event: PointerEvent) {
        self.controller.handle(self.camera, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    fn controller() -> InputController {
        InputController::new(200, 100)
    }

    #[test]
    fn move_without_buttons_only_tracks_position() {
        let mut cam = CameraState::new();
        let before = cam.pose();

        controller().handle(&mut cam, PointerEvent::moved(40.0, 30.0));

        assert_eq!(cam.prev_pointer, Vec2::new(40.0, 30.0));
        assert_eq!(cam.pose(), before);
    }

    #[test]
    fn press_and_release_toggle_buttons_and_track_position() {
        let mut cam = CameraState::new();
        let input = controller();

        input.handle(&mut cam, PointerEvent::pressed(PointerButton::Secondary, 5.0, 6.0));
        assert!(cam.buttons.is_held(PointerButton::Secondary));
        assert_eq!(cam.prev_pointer, Vec2::new(5.0, 6.0));

        input.handle(&mut cam, PointerEvent::released(PointerButton::Secondary, 7.0, 8.0));
        assert!(!cam.buttons.any());
        assert_eq!(cam.prev_pointer, Vec2::new(7.0, 8.0));
    }

    #[test]
    fn primary_drag_orbits_scaled_to_viewport() {
        let mut cam = CameraState::new();
        let input = controller();
        input.handle(&mut cam, PointerEvent::pressed(PointerButton::Primary, 10.0, 10.0));
        input.handle(&mut cam, PointerEvent::moved(60.0, 35.0));

        assert!((cam.yaw - 0.5).abs() < EPS);
        assert!((cam.pitch + 0.5).abs() < EPS);
        assert_eq!(cam.translation, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn first_move_after_press_uses_press_position() {
        let mut cam = CameraState::new();
        let input = controller();
        input.handle(&mut cam, PointerEvent::moved(0.0, 0.0));
        // Press far from the last move; the next delta must start from here.
        input.handle(&mut cam, PointerEvent::pressed(PointerButton::Primary, 100.0, 50.0));
        input.handle(&mut cam, PointerEvent::moved(100.0, 50.0));

        assert_eq!(cam.yaw, 0.0);
        assert_eq!(cam.pitch, 0.0);
    }

    #[test]
    fn secondary_drag_pans_through_rotation() {
        let mut cam = CameraState::new();
        let input = controller();
        input.handle(&mut cam, PointerEvent::pressed(PointerButton::Secondary, 0.0, 0.0));
        input.handle(&mut cam, PointerEvent::moved(20.0, 0.0));
        assert!(cam.translation.abs_diff_eq(Vec3::new(-0.1, 0.0, -1.0), EPS));

        // With a quarter-turn yaw, a horizontal drag moves along world Z.
        cam.translation = Vec3::ZERO;
        cam.yaw = std::f32::consts::FRAC_PI_2;
        input.handle(&mut cam, PointerEvent::moved(40.0, 0.0));
        assert!(cam.translation.abs_diff_eq(Vec3::new(0.0, 0.0, 0.1), 1e-5));
    }

    #[test]
    fn tertiary_drag_dollies_by_motion_length() {
        let mut cam = CameraState::new();
        let input = controller();
        input.handle(&mut cam, PointerEvent::pressed(PointerButton::Tertiary, 10.0, 10.0));
        input.handle(&mut cam, PointerEvent::moved(13.0, 6.0));

        assert!((cam.translation.z - (-0.95)).abs() < EPS);
        assert!((cam.distance - 1.95).abs() < EPS);

        input.handle(&mut cam, PointerEvent::moved(13.0, 16.0));
        assert!((cam.translation.z - (-1.05)).abs() < EPS);
        assert!((cam.distance - 2.05).abs() < EPS);
    }

    #[test]
    fn horizontal_tertiary_drag_counts_as_forward() {
        let mut cam = CameraState::new();
        let input = controller();
        input.handle(&mut cam, PointerEvent::pressed(PointerButton::Tertiary, 0.0, 0.0));
        input.handle(&mut cam, PointerEvent::moved(10.0, 0.0));
        assert!((cam.translation.z - (-0.9)).abs() < EPS);
        assert!((cam.distance - 1.9).abs() < EPS);
    }

    #[test]
    fn primary_wins_when_several_buttons_are_held() {
        let mut cam = CameraState::new();
        let input = controller();
        input.handle(&mut cam, PointerEvent::pressed(PointerButton::Primary, 0.0, 0.0));
        input.handle(&mut cam, PointerEvent::pressed(PointerButton::Secondary, 0.0, 0.0));
        input.handle(&mut cam, PointerEvent::moved(20.0, 0.0));

        assert!((cam.yaw - 0.2).abs() < EPS);
        assert_eq!(cam.translation, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn wheel_dollies_a_fixed_step() {
        let mut cam = CameraState::new();
        let input = controller();
        input.handle(&mut cam, PointerEvent::wheel(-120.0, 3.0, 4.0));
        assert!((cam.translation.z - (-1.1)).abs() < EPS);
        assert!((cam.distance - 2.1).abs() < EPS);
        assert_eq!(cam.prev_pointer, Vec2::new(3.0, 4.0));

        input.handle(&mut cam, PointerEvent::wheel(0.5, 3.0, 4.0));
        input.handle(&mut cam, PointerEvent::wheel(0.5, 3.0, 4.0));
        assert!((cam.translation.z - (-0.9)).abs() < 1e-5);
        assert!((cam.distance - 1.9).abs() < 1e-5);
    }

    #[test]
    fn bound_controller_forwards_events() {
        let mut cam = CameraState::new();
        let input = controller();
        {
            let mut handler = input.bind(&mut cam);
            handler.on_pointer(PointerEvent::wheel(1.0, 0.0, 0.0));
        }
        assert!((cam.distance - 1.9).abs() < EPS);
    }
}
