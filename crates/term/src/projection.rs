//! Perspective projection from world space onto terminal cells.
//!
//! Terminal cells are roughly twice as tall as they are wide, so the projection
//! aspect is computed in "square" units before mapping back to cells.

use glam::{Mat4, Vec3, Vec4};

use crate::core::camera::{Camera, CAMERA_NEAR};

/// Height / width of a terminal cell
pub const CELL_ASPECT: f32 = 2.0;

/// A projected point in cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    /// Distance in front of the camera (view-space depth)
    pub depth: f32,
}

impl ScreenPoint {
    pub fn col(&self) -> i32 {
        self.x.floor() as i32
    }

    pub fn row(&self) -> i32 {
        self.y.floor() as i32
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Projector {
    view_proj: Mat4,
    origin_x: f32,
    origin_y: f32,
    width: f32,
    height: f32,
    /// Cells per world unit at depth 1
    focal_x: f32,
    focal_y: f32,
}

impl Projector {
    /// Projector for a `width` x `height` cell region at `(x, y)`.
    pub fn new(camera: &Camera, x: u16, y: u16, width: u16, height: u16) -> Self {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        let aspect = w / (h * CELL_ASPECT);
        let proj = camera.projection_matrix(aspect);
        Self {
            view_proj: proj * camera.view_matrix(),
            origin_x: x as f32,
            origin_y: y as f32,
            width: w,
            height: h,
            focal_x: proj.x_axis.x * w / 2.0,
            focal_y: proj.y_axis.y * h / 2.0,
        }
    }

    /// Project a world point. Points behind the near plane return None.
    pub fn project(&self, p: Vec3) -> Option<ScreenPoint> {
        let clip = self.view_proj * Vec4::new(p.x, p.y, p.z, 1.0);
        if clip.w <= CAMERA_NEAR {
            return None;
        }
        let nx = clip.x / clip.w;
        let ny = clip.y / clip.w;
        Some(ScreenPoint {
            x: self.origin_x + (nx + 1.0) * 0.5 * self.width,
            y: self.origin_y + (1.0 - ny) * 0.5 * self.height,
            depth: clip.w,
        })
    }

    /// Width in cells of `size` world units at `depth`.
    pub fn cells_wide(&self, size: f32, depth: f32) -> f32 {
        size * self.focal_x / depth.max(CAMERA_NEAR)
    }

    /// Height in cells of `size` world units at `depth`.
    pub fn cells_tall(&self, size: f32, depth: f32) -> f32 {
        size * self.focal_y / depth.max(CAMERA_NEAR)
    }

    pub fn contains(&self, sp: &ScreenPoint) -> bool {
        sp.x >= self.origin_x
            && sp.y >= self.origin_y
            && sp.x < self.origin_x + self.width
            && sp.y < self.origin_y + self.height
    }
}
