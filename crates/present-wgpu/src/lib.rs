//! wgpu presentation backend for depthview.
//!
//! The point cloud is rasterized on the CPU; this crate only moves the
//! finished framebuffer onto a window surface. The frame is uploaded into an
//! sRGB texture and drawn with a single fullscreen triangle, letterboxed so
//! its aspect ratio survives any surface size.
//!
//! # Invariants
//! - The presenter never modifies the framebuffer it is given.
//! - Framebuffer pixels map to texels one-to-one; sampling is nearest.
//! - Regions of the surface outside the letterboxed frame are black.

mod gpu;
mod shaders;

pub use gpu::{FramebufferPresenter, letterbox_scale};

pub fn crate_info() -> &'static str {
    "depthview-present-wgpu v0.1.0"
}
