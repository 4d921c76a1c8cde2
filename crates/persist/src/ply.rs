use std::path::Path;

use depthview_common::{PointBatch, RgbImage};
use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType, ScalarType,
};
use ply_rs::writer::Writer;

use crate::PersistError;

/// Write the points of `batch` that carry depth as a binary little-endian PLY.
///
/// Each vertex gets float `x y z` and uchar `red green blue` sampled from
/// `texture` at its texture coordinate. Returns the number of vertices written.
pub fn export_ply(batch: &PointBatch, texture: &RgbImage, path: impl AsRef<Path>) -> Result<usize, PersistError> {
    let path = path.as_ref();
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::BinaryLittleEndian;
    ply.header
        .comments
        .push(format!("depthview export, texture {}x{}", texture.width(), texture.height()));

    let mut vertex_def = ElementDef::new("vertex".to_string());
    for name in ["x", "y", "z"] {
        vertex_def
            .properties
            .add(PropertyDef::new(name.to_string(), PropertyType::Scalar(ScalarType::Float)));
    }
    for name in ["red", "green", "blue"] {
        vertex_def
            .properties
            .add(PropertyDef::new(name.to_string(), PropertyType::Scalar(ScalarType::UChar)));
    }

    let mut vertices = Vec::with_capacity(batch.len());
    for (v, uv) in batch.iter().filter(|(v, _)| v.z != 0.0) {
        let [r, g, b] = texture.sample(uv);
        let mut vertex = DefaultElement::new();
        vertex.insert("x".to_string(), Property::Float(v.x));
        vertex.insert("y".to_string(), Property::Float(v.y));
        vertex.insert("z".to_string(), Property::Float(v.z));
        vertex.insert("red".to_string(), Property::UChar(r));
        vertex.insert("green".to_string(), Property::UChar(g));
        vertex.insert("blue".to_string(), Property::UChar(b));
        vertices.push(vertex);
    }
    let count = vertices.len();
    vertex_def.count = count;
    ply.header.elements.add(vertex_def);
    ply.payload.insert("vertex".to_string(), vertices);

    // Encode in memory first: the writer unwraps its own flush.
    let mut bytes = Vec::new();
    Writer::new().write_ply(&mut bytes, &mut ply)?;
    std::fs::write(path, &bytes)?;

    tracing::info!(path = %path.display(), vertices = count, skipped = batch.len() - count, "point cloud exported");
    Ok(count)
}
