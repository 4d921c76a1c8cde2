//! Acquisition: the frame-source interface a rendering session pulls from,
//! plus the processing stages between raw depth and a renderable point batch.
//!
//! # Invariants
//! - A depth value of 0 means "no data" at every stage and is never deprojected.
//! - Filters never change the meaning of depth units; only `depth_scale` converts to meters.
//! - `wait_for_frames` may block; callers own the pacing of their loop.

mod error;
mod filter;
mod frame;
mod pointcloud;
mod source;
mod synthetic;

pub use error::StreamError;
pub use filter::{Colorizer, DecimationFilter, MAX_DECIMATION_MAGNITUDE};
pub use frame::{ColorFrame, DepthFrame, FrameSet, Intrinsics};
pub use pointcloud::{PointCloudBuilder, TextureSpace};
pub use source::{DeviceRegistry, FrameSource};
pub use synthetic::{SyntheticConfig, SyntheticRegistry, SyntheticSource};

pub fn crate_info() -> &'static str {
    "depthview-stream v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("stream"));
    }
}
