//! Sessions: the per-device frame loop and the manager that starts and stops it.
//!
//! # Invariants
//! - A frame loop owns its camera and framebuffer; only the stop signal crosses threads.
//! - At most one session runs at a time; starting a new one joins the previous one first.
//! - Failure to read the depth intrinsics is the only error that aborts a session.
//!   Every later failure is logged and the loop moves on to the next iteration.

mod config;
mod display;
mod error;
mod frame_loop;
mod manager;
mod signal;
mod timer;

pub use config::{ConfigError, ViewerConfig};
pub use display::{Display, DisplayProbe, FrameStatus, HeadlessDisplay};
pub use error::SessionError;
pub use frame_loop::{FrameLoop, LoopState, SessionReport};
pub use manager::{DisplayFactory, SessionManager};
pub use signal::StopSignal;
pub use timer::FrameTimer;

pub fn crate_info() -> &'static str {
    "depthview-session v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("session"));
    }
}
