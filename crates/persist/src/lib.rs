//! Persistence: write what the viewer shows to disk.
//!
//! # Invariants
//! - Files are written whole or the call fails; nothing is retried.
//! - Exported colors are sampled with the same texel rule the rasterizer uses.

mod error;
mod ply;
mod snapshot;

pub use error::PersistError;
pub use ply::export_ply;
pub use snapshot::save_png;

pub fn crate_info() -> &'static str {
    "depthview-persist v0.1.0"
}
