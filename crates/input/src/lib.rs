//! Input: pointer events drive the orbit camera, keys map to viewer commands.
//!
//! # Invariants
//! - Every pointer event updates the tracked pointer position, whatever its kind.
//! - A move with no button held never changes the camera pose.
//! - Key handling never touches the camera directly; it yields a `Command`.

pub mod command;
pub mod pointer;

pub use command::{Command, Key, KeyBindings};
pub use pointer::{BoundController, InputController, PointerEvent, PointerEventKind, PointerHandler};

pub fn crate_info() -> &'static str {
    "depthview-input v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}
