//! Rendering: project a point batch through the orbit camera and composite it
//! into an RGB framebuffer on the CPU.
//!
//! # Invariants
//! - Degenerate projections (behind the camera, on or before the near plane)
//!   become NaN sentinels and are filtered, never raised as errors.
//! - Writes are bounds-checked; texel reads are clamped.
//! - With the painter's algorithm on, the nearest point wins each pixel.

mod projector;
mod rasterizer;

pub use projector::{Projector, ZNEAR};
pub use rasterizer::{PointCloudRenderer, RenderStats, Renderer};

pub fn crate_info() -> &'static str {
    "depthview-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
