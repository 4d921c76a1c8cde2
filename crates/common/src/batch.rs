use glam::{Vec2, Vec3};

use crate::CommonError;

/// One frame's worth of geometry: vertices and the texture coordinates that
/// address the frame's color source, index-aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointBatch {
    vertices: Vec<Vec3>,
    texcoords: Vec<Vec2>,
}

impl PointBatch {
    /// Build a batch from parallel arrays. Fails if the lengths differ.
    pub fn new(vertices: Vec<Vec3>, texcoords: Vec<Vec2>) -> Result<Self, CommonError> {
        if vertices.len() != texcoords.len() {
            return Err(CommonError::LengthMismatch {
                vertices: vertices.len(),
                texcoords: texcoords.len(),
            });
        }
        Ok(Self {
            vertices,
            texcoords,
        })
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
            texcoords: Vec::with_capacity(capacity),
        }
    }

    /// Append one vertex together with its texture coordinate.
    pub fn push(&mut self, vertex: Vec3, texcoord: Vec2) {
        self.vertices.push(vertex);
        self.texcoords.push(texcoord);
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn texcoords(&self) -> &[Vec2] {
        &self.texcoords
    }

    /// Iterate `(vertex, texcoord)` pairs in batch order.
    pub fn iter(&self) -> impl Iterator<Item = (Vec3, Vec2)> + '_ {
        self.vertices
            .iter()
            .copied()
            .zip(self.texcoords.iter().copied())
    }
}
