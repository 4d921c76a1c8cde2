use serde::{Deserialize, Serialize};

/// One of the three pointer buttons the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerButton {
    /// Left button: orbit.
    Primary,
    /// Right button: pan.
    Secondary,
    /// Middle button: dolly.
    Tertiary,
}

impl PointerButton {
    pub const ALL: [PointerButton; 3] = [Self::Primary, Self::Secondary, Self::Tertiary];

    /// Slot of this button in a three-entry button mask.
    pub fn index(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
            Self::Tertiary => 2,
        }
    }
}

/// Errors raised when constructing shared types from inconsistent parts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommonError {
    #[error("point batch length mismatch: {vertices} vertices, {texcoords} texture coordinates")]
    LengthMismatch { vertices: usize, texcoords: usize },
    #[error("image buffer holds {actual} pixels, expected {expected} for {width}x{height}")]
    ImageSize {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_indices_are_distinct() {
        let indices: Vec<usize> = PointerButton::ALL.iter().map(|b| b.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn error_messages_name_the_counts() {
        let err = CommonError::LengthMismatch {
            vertices: 3,
            texcoords: 2,
        };
        assert!(err.to_string().contains("3 vertices"));
    }
}
