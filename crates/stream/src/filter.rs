use depthview_common::{Rgb, RgbImage};

use crate::DepthFrame;

/// Largest supported decimation magnitude.
pub const MAX_DECIMATION_MAGNITUDE: u32 = 8;

/// Reduces depth resolution by an integer factor.
///
/// Each output pixel is the median of the non-zero samples in its
/// `magnitude x magnitude` input block, or 0 when the block holds no data.
/// Trailing rows and columns that do not fill a whole block are dropped.
#[derive(Debug, Clone)]
pub struct DecimationFilter {
    magnitude: u32,
}

impl Default for DecimationFilter {
    fn default() -> Self {
        Self { magnitude: 1 }
    }
}

impl DecimationFilter {
    pub fn new(magnitude: u32) -> Self {
        let mut filter = Self::default();
        filter.set_magnitude(magnitude);
        filter
    }

    pub fn magnitude(&self) -> u32 {
        self.magnitude
    }

    /// Set the block size, clamped to `1..=MAX_DECIMATION_MAGNITUDE`.
    pub fn set_magnitude(&mut self, magnitude: u32) {
        let clamped = magnitude.clamp(1, MAX_DECIMATION_MAGNITUDE);
        if clamped != magnitude {
            tracing::warn!(requested = magnitude, applied = clamped, "decimation magnitude clamped");
        }
        self.magnitude = clamped;
    }

    pub fn process(&self, frame: &DepthFrame) -> DepthFrame {
        let m = self.magnitude as usize;
        if m == 1 {
            return frame.clone();
        }

        let intrinsics = frame.intrinsics().scaled_down(self.magnitude);
        let mut out = Vec::with_capacity(intrinsics.pixel_count());
        let mut block = Vec::with_capacity(m * m);

        for row in 0..intrinsics.height {
            for col in 0..intrinsics.width {
                block.clear();
                for r in row * m..(row + 1) * m {
                    let start = r * frame.width() + col * m;
                    block.extend(frame.data()[start..start + m].iter().copied().filter(|d| *d != 0));
                }
                out.push(median(&mut block));
            }
        }

        // Shape is derived from `intrinsics`, so the length always matches.
        match DepthFrame::new(intrinsics, frame.depth_scale(), out) {
            Ok(decimated) => decimated,
            Err(err) => {
                tracing::error!(%err, "decimation produced a malformed frame");
                frame.clone()
            }
        }
    }
}

/// Upper median; 0 for an empty block.
fn median(values: &mut [u16]) -> u16 {
    if values.is_empty() {
        return 0;
    }
    values.sort_unstable();
    values[values.len() / 2]
}

/// Maps depth to a jet color ramp: near is blue, far is red, no data is black.
#[derive(Debug, Clone)]
pub struct Colorizer {
    /// Depth (meters) mapped to the blue end of the ramp.
    pub min_distance: f32,
    /// Depth (meters) mapped to the red end of the ramp.
    pub max_distance: f32,
}

impl Default for Colorizer {
    fn default() -> Self {
        Self {
            min_distance: 0.3,
            max_distance: 4.0,
        }
    }
}

impl Colorizer {
    pub fn new(min_distance: f32, max_distance: f32) -> Self {
        Self {
            min_distance,
            max_distance,
        }
    }

    pub fn colorize(&self, frame: &DepthFrame) -> RgbImage {
        let scale = frame.depth_scale();
        let span = (self.max_distance - self.min_distance).max(f32::EPSILON);
        let pixels = frame
            .data()
            .iter()
            .map(|&raw| {
                if raw == 0 {
                    [0; 3]
                } else {
                    let t = (raw as f32 * scale - self.min_distance) / span;
                    jet(t.clamp(0.0, 1.0))
                }
            })
            .collect();

        RgbImage::from_pixels(frame.width(), frame.height(), pixels)
            .unwrap_or_else(|_| RgbImage::new(frame.width(), frame.height()))
    }
}

fn jet(t: f32) -> Rgb {
    let channel = |offset: f32| {
        let v = (1.5 - (4.0 * t - offset).abs()).clamp(0.0, 1.0);
        (v * 255.0).round() as u8
    };
    [channel(3.0), channel(2.0), channel(1.0)]
}
