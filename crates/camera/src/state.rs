use depthview_common::PointerButton;
use glam::{Mat3, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Highest decimation level; cycling wraps back to 0 after it.
pub const MAX_DECIMATION_LEVEL: u8 = 2;

const DEFAULT_TRANSLATION: Vec3 = Vec3::new(0.0, 0.0, -1.0);
const DEFAULT_DISTANCE: f32 = 2.0;

/// Which pointer buttons are currently held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonMask([bool; 3]);

impl ButtonMask {
    pub fn set(&mut self, button: PointerButton, held: bool) {
        self.0[button.index()] = held;
    }

    pub fn is_held(&self, button: PointerButton) -> bool {
        self.0[button.index()]
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(|held| *held)
    }
}

/// The pose part of the camera state: everything `reset()` restores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// Rotation about the X axis, radians.
    pub pitch: f32,
    /// Rotation about the Y axis, radians.
    pub yaw: f32,
    pub translation: Vec3,
    /// Offset from the camera to the orbit pivot along +Z.
    pub distance: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            pitch: 0.0,
            yaw: 0.0,
            translation: DEFAULT_TRANSLATION,
            distance: DEFAULT_DISTANCE,
        }
    }
}

/// Virtual camera and interaction toggles for one viewing session.
///
/// Created once per session and mutated by pointer input and key commands.
/// Projection and rasterization only read it.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    pub pitch: f32,
    pub yaw: f32,
    pub translation: Vec3,
    pub distance: f32,
    /// Last pointer position seen, in viewport pixels.
    pub prev_pointer: Vec2,
    pub buttons: ButtonMask,
    pub paused: bool,
    decimation: u8,
    /// Shrink projected coordinates by `0.5^level` to follow decimation.
    pub scale_to_decimation: bool,
    /// Texture from the color stream instead of the colorized depth map.
    pub use_color: bool,
}

impl Default for CameraState {
    fn default() -> Self {
        let pose = CameraPose::default();
        Self {
            pitch: pose.pitch,
            yaw: pose.yaw,
            translation: pose.translation,
            distance: pose.distance,
            prev_pointer: Vec2::ZERO,
            buttons: ButtonMask::default(),
            paused: false,
            decimation: 1,
            scale_to_decimation: true,
            use_color: false,
        }
    }
}

impl CameraState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore the default pose. Toggles and pointer tracking are untouched.
    pub fn reset(&mut self) {
        self.set_pose(CameraPose::default());
        tracing::debug!("camera reset");
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            pitch: self.pitch,
            yaw: self.yaw,
            translation: self.translation,
            distance: self.distance,
        }
    }

    pub fn set_pose(&mut self, pose: CameraPose) {
        self.pitch = pose.pitch;
        self.yaw = pose.yaw;
        self.translation = pose.translation;
        self.distance = pose.distance;
    }

    /// `Ry(yaw) * Rx(pitch)`: pitch first, then yaw in the world frame.
    pub fn rotation(&self) -> Mat3 {
        Mat3::from_rotation_y(self.yaw) * Mat3::from_rotation_x(self.pitch)
    }

    /// Point the camera orbits around.
    pub fn pivot(&self) -> Vec3 {
        self.translation + Vec3::new(0.0, 0.0, self.distance)
    }

    pub fn decimation_level(&self) -> u8 {
        self.decimation
    }

    /// Set the decimation level, clamped to `0..=MAX_DECIMATION_LEVEL`.
    pub fn set_decimation_level(&mut self, level: u8) {
        self.decimation = level.min(MAX_DECIMATION_LEVEL);
    }

    /// Advance 0 -> 1 -> 2 -> 0 and return the new level.
    pub fn cycle_decimation(&mut self) -> u8 {
        self.decimation = (self.decimation + 1) % (MAX_DECIMATION_LEVEL + 1);
        self.decimation
    }

    /// Filter magnitude for the upstream decimation stage: `2^level`.
    pub fn decimation_magnitude(&self) -> u32 {
        1 << self.decimation
    }

    /// Factor applied to projected coordinates: `0.5^level` when scaling is on.
    pub fn projection_scale(&self) -> f32 {
        if self.scale_to_decimation {
            0.5_f32.powi(self.decimation as i32)
        } else {
            1.0
        }
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn toggle_scale(&mut self) -> bool {
        self.scale_to_decimation = !self.scale_to_decimation;
        self.scale_to_decimation
    }

    pub fn toggle_color(&mut self) -> bool {
        self.use_color = !self.use_color;
        self.use_color
    }
}
