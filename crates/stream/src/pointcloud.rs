use depthview_common::PointBatch;
use glam::{Vec2, Vec3};

use crate::{DepthFrame, Intrinsics};

/// Which image the texture coordinates of a point batch address.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum TextureSpace {
    /// The depth frame itself (or an image of the same shape, such as its colorization).
    #[default]
    Depth,
    /// A color stream with these intrinsics, sharing the depth sensor's origin and axes.
    Color(Intrinsics),
}

/// Turns depth frames into vertex/texcoord batches.
#[derive(Debug, Clone, Default)]
pub struct PointCloudBuilder {
    space: TextureSpace,
}

impl PointCloudBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the image the next batches' texture coordinates refer to.
    pub fn map_to(&mut self, space: TextureSpace) {
        self.space = space;
    }

    pub fn texture_space(&self) -> TextureSpace {
        self.space
    }

    /// One vertex per depth pixel, in row-major order.
    ///
    /// Pixels without depth yield a zero vertex and a zero texcoord; the
    /// renderer's near-plane clip discards them.
    pub fn calculate(&self, frame: &DepthFrame) -> PointBatch {
        let intr = frame.intrinsics();
        let width = frame.width();
        let mut batch = PointBatch::with_capacity(intr.pixel_count());

        for (i, &raw) in frame.data().iter().enumerate() {
            if raw == 0 {
                batch.push(Vec3::ZERO, Vec2::ZERO);
                continue;
            }
            let pixel = Vec2::new((i % width) as f32, (i / width) as f32);
            let vertex = intr.deproject(pixel, raw as f32 * frame.depth_scale());
            let texcoord = match &self.space {
                TextureSpace::Depth => pixel / Vec2::new(width as f32, frame.height() as f32),
                TextureSpace::Color(color) => {
                    color.project(vertex) / Vec2::new(color.width as f32, color.height as f32)
                }
            };
            batch.push(vertex, texcoord);
        }

        tracing::trace!(points = batch.len(), space = ?self.space, "point cloud calculated");
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depthview_common::RgbImage;

    fn frame() -> DepthFrame {
        let intr = Intrinsics::centered(4, 2, 2.0);
        DepthFrame::new(intr, 0.001, vec![1000, 0, 2000, 1000, 500, 500, 500, 500]).unwrap()
    }

    #[test]
    fn one_aligned_point_per_pixel() {
        let batch = PointCloudBuilder::new().calculate(&frame());
        assert_eq!(batch.len(), 8);
        assert_eq!(batch.vertices().len(), batch.texcoords().len());
    }

    #[test]
    fn missing_depth_maps_to_origin() {
        let batch = PointCloudBuilder::new().calculate(&frame());
        assert_eq!(batch.vertices()[1], Vec3::ZERO);
        assert_eq!(batch.texcoords()[1], Vec2::ZERO);
    }

    #[test]
    fn vertices_are_deprojected_in_meters() {
        let batch = PointCloudBuilder::new().calculate(&frame());
        // Pixel (col 2, row 0) at 2 m: x = (2 - 2) / 2 * 2, y = (0 - 1) / 2 * 2.
        assert!(batch.vertices()[2].abs_diff_eq(Vec3::new(0.0, -1.0, 2.0), 1e-6));
    }

    #[test]
    fn depth_texcoords_sample_their_own_pixel() {
        let depth = frame();
        let batch = PointCloudBuilder::new().calculate(&depth);
        let probe = RgbImage::new(depth.width(), depth.height());

        for (i, uv) in batch.texcoords().iter().enumerate() {
            if depth.data()[i] == 0 {
                continue;
            }
            let expected = (i / depth.width(), i % depth.width());
            assert_eq!(probe.texel_at(*uv), Some(expected), "point {i}");
        }
    }

    #[test]
    fn color_texcoords_follow_color_intrinsics() {
        let depth = frame();
        let color = Intrinsics::centered(8, 4, 4.0);
        let mut builder = PointCloudBuilder::new();
        builder.map_to(TextureSpace::Color(color));
        let batch = builder.calculate(&depth);

        // Same optics at twice the resolution: the normalized coordinate is unchanged.
        let plain = PointCloudBuilder::new().calculate(&depth);
        for (a, b) in batch.texcoords().iter().zip(plain.texcoords()) {
            assert!(a.abs_diff_eq(*b, 1e-5), "{a:?} vs {b:?}");
        }
        assert_eq!(builder.texture_space(), TextureSpace::Color(color));
    }
}
