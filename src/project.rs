//! World-to-screen projection
//!
//! Pure and stateless, so both presentation modes share it and tests
//! cover it directly. The view matrix is the remote's row-major
//! world-to-clip matrix; the point is dotted against rows of its
//! transpose, rejected when its clip depth is at or behind the camera,
//! then perspective-divided into pixel coordinates.

use glam::{Mat4, Vec2, Vec3};

/// Clip depth at or below this counts as behind the camera.
pub const DEPTH_EPSILON: f32 = 0.001;

/// Viewport size in pixels.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.x <= self.width && point.y >= 0.0 && point.y <= self.height
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1920.0, 1080.0)
    }
}

/// Map a world-space point to screen pixels, `None` when behind or at
/// the camera plane.
pub fn project(world: Vec3, view_matrix: Mat4, viewport: Viewport) -> Option<Vec2> {
    let v = view_matrix.transpose();
    let point = world.extend(1.0);

    let x = v.row(1).dot(point);
    let y = v.row(2).dot(point);
    let depth = v.row(3).dot(point);

    if depth <= DEPTH_EPSILON {
        return None;
    }

    let inv = 1.0 / depth;
    let ndc_x = x * inv;
    let ndc_y = y * inv;

    Some(Vec2::new(
        viewport.width / 2.0 + (0.5 * ndc_x * viewport.width + 0.5),
        viewport.height / 2.0 - (0.5 * ndc_y * viewport.height + 0.5),
    ))
}
