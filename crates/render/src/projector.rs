use depthview_camera::CameraState;
use glam::{Vec2, Vec3};

/// Near clipping distance in view space (meters).
pub const ZNEAR: f32 = 0.03;

/// Batch view and perspective transforms for a fixed viewport.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    width: f32,
    height: f32,
    znear: f32,
}

impl Projector {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
            znear: ZNEAR,
        }
    }

    pub fn with_znear(mut self, znear: f32) -> Self {
        self.znear = znear;
        self
    }

    /// Perspective-project view-space points to pixel coordinates.
    ///
    /// `(x, y) / z * (w * h / w, h) + (w / 2, h / 2)`. Points with `z` at or
    /// behind the near plane (including NaN depths) yield `Vec2::NAN`.
    pub fn project(&self, points: &[Vec3]) -> Vec<Vec2> {
        let aspect = self.height / self.width;
        let scale = Vec2::new(self.width * aspect, self.height);
        let center = Vec2::new(self.width / 2.0, self.height / 2.0);

        points
            .iter()
            .map(|v| {
                if v.z > self.znear {
                    Vec2::new(v.x, v.y) / v.z * scale + center
                } else {
                    Vec2::NAN
                }
            })
            .collect()
    }

    /// Apply the camera's view transform: `(v - pivot) * R + pivot - translation`.
    ///
    /// The row-vector product rotates about the pivot rather than the origin,
    /// giving orbit-around-target behavior.
    pub fn view(&self, camera: &CameraState, points: &[Vec3]) -> Vec<Vec3> {
        let pivot = camera.pivot();
        let inverse = camera.rotation().transpose();
        let offset = pivot - camera.translation;

        points.iter().map(|v| inverse * (*v - pivot) + offset).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_points() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(-1.5, 2.0, 3.25),
            Vec3::new(10.0, -4.0, -2.0),
            Vec3::new(0.3, 0.7, 0.0),
        ]
    }

    #[test]
    fn view_is_identity_without_rotation_or_translation() {
        let mut cam = CameraState::new();
        cam.translation = Vec3::ZERO;
        cam.distance = 7.5;

        let points = sample_points();
        let viewed = Projector::new(64, 48).view(&cam, &points);
        for (a, b) in points.iter().zip(&viewed) {
            assert!(a.abs_diff_eq(*b, 1e-5), "{a:?} -> {b:?}");
        }
    }

    #[test]
    fn view_orbits_around_the_pivot() {
        let mut cam = CameraState::new();
        cam.translation = Vec3::ZERO;
        cam.distance = 2.0;
        cam.yaw = std::f32::consts::PI;

        let projector = Projector::new(64, 48);
        // The pivot itself stays put under any rotation.
        let viewed = projector.view(&cam, &[cam.pivot(), Vec3::new(0.0, 0.0, 3.0)]);
        assert!(viewed[0].abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-5));
        // A half turn mirrors a point through the pivot.
        assert!(viewed[1].abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-5));
    }

    #[test]
    fn view_subtracts_translation() {
        let mut cam = CameraState::new();
        cam.translation = Vec3::new(1.0, 2.0, 3.0);
        let viewed = Projector::new(8, 8).view(&cam, &[Vec3::new(1.0, 2.0, 4.0)]);
        assert!(viewed[0].abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-5));
    }

    #[test]
    fn project_centers_the_optical_axis() {
        let projected = Projector::new(200, 100).project(&[Vec3::new(0.0, 0.0, 5.0)]);
        assert_eq!(projected[0], Vec2::new(100.0, 50.0));
    }

    #[test]
    fn project_scales_both_axes_by_height() {
        let projected = Projector::new(200, 100).project(&[Vec3::new(1.0, -0.5, 2.0)]);
        assert!(projected[0].abs_diff_eq(Vec2::new(150.0, 25.0), 1e-4));
    }

    #[test]
    fn project_clips_at_and_behind_the_near_plane() {
        let projector = Projector::new(64, 48);
        let projected = projector.project(&[
            Vec3::new(0.1, 0.1, ZNEAR),
            Vec3::new(0.1, 0.1, 0.01),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.1, 0.1, -1.0),
            Vec3::new(0.1, 0.1, f32::NAN),
            Vec3::new(0.1, 0.1, 0.5),
        ]);
        for p in &projected[..5] {
            assert!(!p.is_finite(), "expected sentinel, got {p:?}");
        }
        assert!(projected[5].is_finite());
    }

    #[test]
    fn custom_near_plane_is_honored() {
        let projector = Projector::new(64, 48).with_znear(1.0);
        let projected = projector.project(&[Vec3::new(0.0, 0.0, 0.5)]);
        assert!(projected[0].is_nan());
    }

    #[test]
    fn empty_batches_project_to_nothing() {
        let projector = Projector::new(64, 48);
        assert!(projector.project(&[]).is_empty());
        assert!(projector.view(&CameraState::new(), &[]).is_empty());
    }
}
