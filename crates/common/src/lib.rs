//! Shared types for the depthview point cloud viewer.
//!
//! # Invariants
//! - `RgbImage` storage is row-major and always holds `width * height` pixels.
//! - `PointBatch` vertices and texture coordinates are index-aligned and equal in length.
//! - Texel lookups clamp to the image, they never index out of range.

mod batch;
mod image;
mod types;

pub use batch::PointBatch;
pub use image::{Rgb, RgbImage};
pub use types::{CommonError, PointerButton};

pub fn crate_info() -> &'static str {
    "depthview-common v0.1.0"
}
