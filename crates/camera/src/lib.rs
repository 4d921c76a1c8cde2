//! Camera state: the explicit context object shared by input handling,
//! projection, rasterization, and the frame loop.
//!
//! # Invariants
//! - `rotation()` is always orthonormal: it is the product of two elementary rotations.
//! - `distance` is never clamped; the camera may pass through the pivot.
//! - Only input handling and command dispatch mutate the state.

pub mod state;

pub use state::{ButtonMask, CameraPose, CameraState, MAX_DECIMATION_LEVEL};

pub fn crate_info() -> &'static str {
    "depthview-camera v0.1.0"
}
