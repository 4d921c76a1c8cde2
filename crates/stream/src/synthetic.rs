use std::time::{Duration, Instant};

use depthview_common::{Rgb, RgbImage};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::{ColorFrame, DepthFrame, DeviceRegistry, FrameSet, FrameSource, Intrinsics, StreamError};

/// Depth-only synthetic device id.
const DEPTH_DEVICE: &str = "synthetic";
/// Depth + color synthetic device id.
const RGBD_DEVICE: &str = "synthetic-rgbd";

const WALL_Z: f32 = 2.5;
const SPHERE_RADIUS: f32 = 0.35;
const SPHERE_Z: f32 = 1.5;
const SPHERE_SWING: f32 = 0.4;
/// Sphere phase advance per frame, radians.
const SPHERE_SPEED: f32 = 0.05;
/// Left band of the depth image without data, as on a stereo depth sensor.
const INVALID_BAND: f32 = 0.04;
const CHECKER_SIZE: f32 = 0.25;

/// Stream layout of a synthetic device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub width: usize,
    pub height: usize,
    /// Depth focal length in pixels.
    pub focal: f32,
    pub color_width: usize,
    pub color_height: usize,
    /// Meters per raw depth unit.
    pub depth_scale: f32,
    /// Pace `wait_for_frames` to this rate; unpaced when `None`.
    pub fps: Option<u32>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            focal: 385.0,
            color_width: 640,
            color_height: 480,
            depth_scale: 0.001,
            fps: Some(30),
        }
    }
}

/// Procedural depth camera: a checkered back wall with a sphere swinging in
/// front of it. Deterministic for a given frame number.
#[derive(Debug)]
pub struct SyntheticSource {
    config: SyntheticConfig,
    depth: Intrinsics,
    color: Option<Intrinsics>,
    frame_number: u64,
    next_deadline: Option<Instant>,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig, with_color: bool) -> Self {
        let depth = Intrinsics::centered(config.width, config.height, config.focal);
        // Same field of view as depth, at the color resolution.
        let color = with_color.then(|| {
            let focal = config.focal * config.color_width as f32 / config.width.max(1) as f32;
            Intrinsics::centered(config.color_width, config.color_height, focal)
        });
        Self {
            config,
            depth,
            color,
            frame_number: 0,
            next_deadline: None,
        }
    }

    pub fn has_color(&self) -> bool {
        self.color.is_some()
    }

    fn sphere_center(&self, frame: u64) -> Vec3 {
        let phase = frame as f32 * SPHERE_SPEED;
        Vec3::new(SPHERE_SWING * phase.sin(), 0.0, SPHERE_Z)
    }

    fn render_depth(&self, center: Vec3) -> Result<DepthFrame, StreamError> {
        let intr = self.depth;
        let band = (intr.width as f32 * INVALID_BAND) as usize;
        let mut data = Vec::with_capacity(intr.pixel_count());
        for row in 0..intr.height {
            for col in 0..intr.width {
                if col < band {
                    data.push(0);
                    continue;
                }
                let hit = cast(&intr, col, row, center);
                data.push((hit.point.z / self.config.depth_scale).round() as u16);
            }
        }
        DepthFrame::new(intr, self.config.depth_scale, data)
    }

    fn render_color(&self, intr: Intrinsics, center: Vec3) -> Result<ColorFrame, StreamError> {
        let mut pixels = Vec::with_capacity(intr.pixel_count());
        for row in 0..intr.height {
            for col in 0..intr.width {
                pixels.push(shade(&cast(&intr, col, row, center)));
            }
        }
        let image = RgbImage::from_pixels(intr.width, intr.height, pixels).map_err(|_| {
            StreamError::InvalidFrame {
                expected: intr.pixel_count(),
                actual: 0,
            }
        })?;
        Ok(ColorFrame {
            intrinsics: intr,
            image,
        })
    }

    fn pace(&mut self) {
        let Some(fps) = self.config.fps.filter(|fps| *fps > 0) else {
            return;
        };
        let interval = Duration::from_secs(1) / fps;
        let now = Instant::now();
        if let Some(wait) = self.next_deadline.and_then(|d| d.checked_duration_since(now)) {
            std::thread::sleep(wait);
        }
        self.next_deadline = Some(self.next_deadline.unwrap_or(now).max(now) + interval);
    }
}

impl FrameSource for SyntheticSource {
    fn depth_intrinsics(&self) -> Result<Intrinsics, StreamError> {
        if self.depth.pixel_count() == 0 {
            return Err(StreamError::Intrinsics(format!(
                "degenerate depth resolution {}x{}",
                self.depth.width, self.depth.height
            )));
        }
        Ok(self.depth)
    }

    fn wait_for_frames(&mut self) -> Result<FrameSet, StreamError> {
        self.pace();
        self.frame_number += 1;
        let center = self.sphere_center(self.frame_number);

        let depth = self.render_depth(center)?;
        let color = match self.color {
            Some(intr) => Some(self.render_color(intr, center)?),
            None => None,
        };
        tracing::trace!(frame = self.frame_number, color = color.is_some(), "synthetic frame");

        Ok(FrameSet {
            number: self.frame_number,
            depth,
            color,
        })
    }
}

enum Surface {
    Wall,
    Sphere { normal: Vec3 },
}

struct Hit {
    point: Vec3,
    surface: Surface,
}

/// First surface along the ray through pixel `(col, row)`.
fn cast(intr: &Intrinsics, col: usize, row: usize, center: Vec3) -> Hit {
    let dir = intr.deproject(Vec2::new(col as f32, row as f32), 1.0);

    // |t * dir - center|^2 = r^2
    let a = dir.length_squared();
    let b = -2.0 * dir.dot(center);
    let c = center.length_squared() - SPHERE_RADIUS * SPHERE_RADIUS;
    let disc = b * b - 4.0 * a * c;
    if disc >= 0.0 {
        let t = (-b - disc.sqrt()) / (2.0 * a);
        if t > 0.0 {
            let point = dir * t;
            return Hit {
                point,
                surface: Surface::Sphere {
                    normal: (point - center) / SPHERE_RADIUS,
                },
            };
        }
    }

    Hit {
        point: dir * WALL_Z,
        surface: Surface::Wall,
    }
}

fn shade(hit: &Hit) -> Rgb {
    match hit.surface {
        Surface::Wall => {
            let cell = (hit.point.x / CHECKER_SIZE).floor() as i32 + (hit.point.y / CHECKER_SIZE).floor() as i32;
            if cell.rem_euclid(2) == 0 { [200, 200, 190] } else { [90, 110, 140] }
        }
        Surface::Sphere { normal } => {
            let light = Vec3::new(-0.4, -0.6, -0.7).normalize();
            let lambert = normal.dot(light).max(0.0);
            let k = 0.25 + 0.75 * lambert;
            [(230.0 * k) as u8, (90.0 * k) as u8, (60.0 * k) as u8]
        }
    }
}

/// Registry exposing the two synthetic devices.
#[derive(Debug, Clone, Default)]
pub struct SyntheticRegistry {
    config: SyntheticConfig,
}

impl SyntheticRegistry {
    pub fn new(config: SyntheticConfig) -> Self {
        Self { config }
    }
}

impl DeviceRegistry for SyntheticRegistry {
    fn devices(&self) -> Vec<String> {
        vec![DEPTH_DEVICE.to_string(), RGBD_DEVICE.to_string()]
    }

    fn open(&self, id: &str) -> Result<Box<dyn FrameSource + Send>, StreamError> {
        let with_color = match id {
            DEPTH_DEVICE => false,
            RGBD_DEVICE => true,
            _ => {
                return Err(StreamError::DeviceNotFound { id: id.to_string() });
            }
        };
        tracing::info!(device = id, width = self.config.width, height = self.config.height, "opening synthetic device");
        Ok(Box::new(SyntheticSource::new(self.config.clone(), with_color)))
    }
}
