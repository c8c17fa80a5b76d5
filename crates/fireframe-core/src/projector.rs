//! Perspective projection with near-plane clipping.

use crate::geometry::{Transform, Vec3};
use crate::material::PixelSource;
use crate::mesh::Mesh;
use crate::raster::LineSink;

/// Camera-space depth at or below which points are behind the viewer.
pub const NEAR_PLANE: f64 = 0.1;

/// Point on the near plane between `behind` and `in_front`.
pub fn clip_to_near(behind: Vec3, in_front: Vec3) -> Vec3 {
    let t = (NEAR_PLANE - behind.z) / (in_front.z - behind.z);
    let mut p = behind.lerp(in_front, t);
    p.z = NEAR_PLANE;
    p
}

/// Clip a camera-space segment against the near plane.
///
/// Returns `None` when both ends are behind it.
pub fn clip_segment(a: Vec3, b: Vec3) -> Option<(Vec3, Vec3)> {
    match (a.z <= NEAR_PLANE, b.z <= NEAR_PLANE) {
        (true, true) => None,
        (true, false) => Some((clip_to_near(a, b), b)),
        (false, true) => Some((a, clip_to_near(b, a))),
        (false, false) => Some((a, b)),
    }
}

/// Maps camera space to screen pixels for one viewport size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projector {
    center_x: i32,
    center_y: i32,
}

impl Projector {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            center_x: (width / 2) as i32,
            center_y: (height / 2) as i32,
        }
    }

    /// Screen position of a point in front of the near plane. Halves round
    /// up.
    #[inline]
    pub fn project_point(&self, p: Vec3, scale: f64) -> (i32, i32) {
        let sx = (scale * p.x / p.z + 0.5).floor() as i32;
        let sy = (scale * p.y / p.z + 0.5).floor() as i32;
        (sx.saturating_add(self.center_x), sy.saturating_add(self.center_y))
    }

    /// Transform, clip and project one model-space segment into `sink`.
    pub fn draw_segment(
        &self,
        sink: &mut impl LineSink,
        a: Vec3,
        b: Vec3,
        transform: &Transform,
        pixels: &mut impl PixelSource,
    ) {
        let Some((a, b)) = clip_segment(transform.apply(a), transform.apply(b)) else {
            return;
        };
        let from = self.project_point(a, transform.scale);
        let to = self.project_point(b, transform.scale);
        sink.line(from, to, pixels);
    }

    pub fn draw_mesh(
        &self,
        sink: &mut impl LineSink,
        mesh: &Mesh,
        transform: &Transform,
        pixels: &mut impl PixelSource,
    ) {
        for (a, b) in mesh.segments() {
            self.draw_segment(sink, a, b, transform, pixels);
        }
    }
}
