use depthview_common::RgbImage;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::StreamError;

/// Pinhole camera model for one stream. No lens distortion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub width: usize,
    pub height: usize,
    /// Focal length in pixels along X.
    pub fx: f32,
    /// Focal length in pixels along Y.
    pub fy: f32,
    /// Principal point, pixels.
    pub ppx: f32,
    pub ppy: f32,
}

impl Intrinsics {
    /// Intrinsics with the principal point at the image center.
    pub fn centered(width: usize, height: usize, focal: f32) -> Self {
        Self {
            width,
            height,
            fx: focal,
            fy: focal,
            ppx: width as f32 / 2.0,
            ppy: height as f32 / 2.0,
        }
    }

    /// Lift a pixel at depth `z` (meters) to a 3D point in the stream's frame.
    pub fn deproject(&self, pixel: Vec2, z: f32) -> Vec3 {
        Vec3::new(
            (pixel.x - self.ppx) / self.fx * z,
            (pixel.y - self.ppy) / self.fy * z,
            z,
        )
    }

    /// Pixel coordinates of a 3D point. Non-finite for `z == 0`.
    pub fn project(&self, point: Vec3) -> Vec2 {
        Vec2::new(
            point.x / point.z * self.fx + self.ppx,
            point.y / point.z * self.fy + self.ppy,
        )
    }

    /// Intrinsics of the same camera sampled `factor` times more coarsely.
    pub fn scaled_down(&self, factor: u32) -> Self {
        let f = factor.max(1) as f32;
        Self {
            width: self.width / factor.max(1) as usize,
            height: self.height / factor.max(1) as usize,
            fx: self.fx / f,
            fy: self.fy / f,
            ppx: self.ppx / f,
            ppy: self.ppy / f,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}

/// Row-major 16-bit depth image. Raw units times `depth_scale` give meters;
/// 0 means no measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthFrame {
    intrinsics: Intrinsics,
    depth_scale: f32,
    data: Vec<u16>,
}

impl DepthFrame {
    pub fn new(intrinsics: Intrinsics, depth_scale: f32, data: Vec<u16>) -> Result<Self, StreamError> {
        if data.len() != intrinsics.pixel_count() {
            return Err(StreamError::InvalidFrame {
                expected: intrinsics.pixel_count(),
                actual: data.len(),
            });
        }
        Ok(Self {
            intrinsics,
            depth_scale,
            data,
        })
    }

    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    pub fn width(&self) -> usize {
        self.intrinsics.width
    }

    pub fn height(&self) -> usize {
        self.intrinsics.height
    }

    pub fn depth_scale(&self) -> f32 {
        self.depth_scale
    }

    pub fn data(&self) -> &[u16] {
        &self.data
    }

    /// Raw depth at a pixel, if in range.
    pub fn get(&self, row: usize, col: usize) -> Option<u16> {
        if row < self.height() && col < self.width() {
            Some(self.data[row * self.width() + col])
        } else {
            None
        }
    }

    /// Depth in meters at a pixel; 0.0 where there is no data.
    pub fn meters(&self, row: usize, col: usize) -> Option<f32> {
        self.get(row, col).map(|raw| raw as f32 * self.depth_scale)
    }
}

/// One color image together with the intrinsics of the sensor that took it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorFrame {
    pub intrinsics: Intrinsics,
    pub image: RgbImage,
}

/// Frames delivered together by one `wait_for_frames` call.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSet {
    /// Monotonic frame counter, starting at 1.
    pub number: u64,
    pub depth: DepthFrame,
    pub color: Option<ColorFrame>,
}
