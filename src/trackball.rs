//! Virtual trackball rotation.
//!
//! # Mapping
//!
//! Pointer positions are mapped onto a unit hemisphere centered on the
//! canvas, facing the viewer:
//! - X: positive right
//! - Y: positive up
//! - Z: positive toward the viewer
//!
//! Points outside the unit disk land on the rim (z = 0). Dragging from p0 to
//! p1 rotates about p0 × p1 by the angle between the two points. Rotations
//! are expressed in eye space and accumulate on the left.

use crate::math::{Mat4, Vec3};

#[derive(Debug, Clone)]
pub struct Trackball {
    rotation: Mat4,
    view_distance: f32,
    width: u32,
    height: u32,
    drag_from: Option<Vec3>,
}

impl Trackball {
    /// Creates a trackball over a `width` x `height` canvas.
    ///
    /// `view_distance` moves the eye back along z after the rotation. Zero
    /// leaves the view a pure rotation.
    pub fn new(width: u32, height: u32, view_distance: f32) -> Self {
        Self {
            rotation: Mat4::identity(),
            view_distance,
            width,
            height,
            drag_from: None,
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    // =========================================================================
    // View
    // =========================================================================

    pub fn view_matrix(&self) -> Mat4 {
        if self.view_distance == 0.0 {
            self.rotation
        } else {
            Mat4::translation(0.0, 0.0, -self.view_distance) * self.rotation
        }
    }

    /// Replaces the accumulated rotation. Any translation in `view` is kept as-is.
    pub fn set_view(&mut self, view: Mat4) {
        self.rotation = view;
    }

    pub fn reset(&mut self) {
        self.rotation = Mat4::identity();
        self.drag_from = None;
    }

    // =========================================================================
    // Dragging
    // =========================================================================

    /// Maps a canvas pixel onto the hemisphere.
    fn project(&self, x: f32, y: f32) -> Vec3 {
        let w = self.width.max(1) as f32;
        let h = self.height.max(1) as f32;
        let px = 2.0 * x / w - 1.0;
        let py = 1.0 - 2.0 * y / h;

        let d2 = px * px + py * py;
        if d2 >= 1.0 {
            let d = d2.sqrt();
            Vec3::new(px / d, py / d, 0.0)
        } else {
            Vec3::new(px, py, (1.0 - d2).sqrt())
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_from.is_some()
    }

    pub fn begin_drag(&mut self, x: f32, y: f32) {
        self.drag_from = Some(self.project(x, y));
    }

    /// Rotates by the drag from the previous position. Returns true when the view changed.
    pub fn drag_to(&mut self, x: f32, y: f32) -> bool {
        let Some(from) = self.drag_from else {
            return false;
        };
        let to = self.project(x, y);

        let axis = from.cross(to);
        let angle = from.dot(to).clamp(-1.0, 1.0).acos();
        if axis.magnitude() < 1e-6 || angle < 1e-6 {
            return false;
        }

        self.rotation = Mat4::axis_rotation(axis, angle) * self.rotation;
        self.drag_from = Some(to);
        true
    }

    pub fn end_drag(&mut self) {
        self.drag_from = None;
    }
}
