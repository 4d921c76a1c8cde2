use depthview_camera::CameraState;
use depthview_common::{PointBatch, RgbImage};
use glam::Vec3;

use crate::projector::Projector;

/// Renderer interface used by the frame loop.
///
/// A renderer reads the camera and one frame's geometry and writes into a
/// caller-owned target. It never retains the target or the batch.
pub trait Renderer {
    /// Per-frame result reported back to the caller.
    type Output;

    /// Composite `batch`, textured from `texture`, into `target`.
    fn render(
        &self,
        target: &mut RgbImage,
        batch: &PointBatch,
        texture: &RgbImage,
        camera: &CameraState,
    ) -> Self::Output;
}

/// Counts from one rasterization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Points in the batch.
    pub input: usize,
    /// Points whose projection was finite.
    pub finite: usize,
    /// Points written to the framebuffer.
    pub drawn: usize,
}

/// Scatter-writes textured points into an RGB framebuffer, one pixel each.
#[derive(Debug, Clone, Copy)]
pub struct PointCloudRenderer {
    painter: bool,
}

impl Default for PointCloudRenderer {
    fn default() -> Self {
        Self { painter: true }
    }
}

impl PointCloudRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable back-to-front sorting (painter's algorithm).
    pub fn with_painter(mut self, painter: bool) -> Self {
        self.painter = painter;
        self
    }
}

impl Renderer for PointCloudRenderer {
    type Output = RenderStats;

    fn render(
        &self,
        target: &mut RgbImage,
        batch: &PointBatch,
        texture: &RgbImage,
        camera: &CameraState,
    ) -> RenderStats {
        let _span = tracing::trace_span!("rasterize", points = batch.len()).entered();

        let projector = Projector::new(target.width(), target.height());
        let viewed = projector.view(camera, batch.vertices());
        let order = draw_order(&viewed, self.painter);
        let ordered: Vec<Vec3> = order.iter().map(|&i| viewed[i]).collect();
        let projected = projector.project(&ordered);

        let scale = camera.projection_scale();
        let texcoords = batch.texcoords();
        let rows = target.height() as i64;
        let cols = target.width() as i64;
        let mut stats = RenderStats {
            input: batch.len(),
            ..RenderStats::default()
        };

        // Later writes win, so farther points must come first.
        for (&index, point) in order.iter().zip(&projected) {
            let point = *point * scale;
            if !point.is_finite() {
                continue;
            }
            stats.finite += 1;

            let col = point.x.round_ties_even() as i64;
            let row = point.y.round_ties_even() as i64;
            if row < 0 || row >= rows || col < 0 || col >= cols {
                continue;
            }

            target.set(row as usize, col as usize, texture.sample(texcoords[index]));
            stats.drawn += 1;
        }

        tracing::trace!(
            input = stats.input,
            finite = stats.finite,
            drawn = stats.drawn,
            "rasterized point batch"
        );
        stats
    }
}

/// Indices in write order: farthest view depth first when `painter` is set,
/// otherwise input order. The sort is stable.
fn draw_order(viewed: &[Vec3], painter: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..viewed.len()).collect();
    if painter {
        order.sort_by(|&a, &b| viewed[b].z.total_cmp(&viewed[a].z));
    }
    order
}
