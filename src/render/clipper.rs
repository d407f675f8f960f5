//! Clip-space clipping against the homogeneous clip cube.
//!
//! Clipping occurs after the vertex kernel, before the perspective divide.
//! The clip volume is:
//!
//! ```text
//! -w <= x <= w
//! -w <= y <= w
//! -w <= z <= w   (OpenGL-style [-1, 1] depth range)
//! ```

use super::Varyings;
use crate::math::Vec4;

/// A vertex in homogeneous clip space with its interpolatable varyings.
#[derive(Clone, Copy, Debug)]
pub struct ClipSpaceVertex {
    /// Position in clip space (x, y, z, w), before perspective divide
    pub position: Vec4,
    pub varyings: Varyings,
}

impl ClipSpaceVertex {
    pub fn new(position: Vec4, varyings: Varyings) -> Self {
        Self { position, varyings }
    }

    /// Linearly interpolate all attributes between two vertices.
    /// Used when a polygon edge crosses a clipping plane.
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            varyings: self.varyings.lerp(&other.varyings, t),
        }
    }
}

/// The 6 planes of the canonical clip-space cube.
#[derive(Clone, Copy, Debug)]
pub enum ClipPlane {
    Left,
    Right,
    Bottom,
    Top,
    Near,
    Far,
}

impl ClipPlane {
    const ALL: [ClipPlane; 6] = [
        ClipPlane::Left,
        ClipPlane::Right,
        ClipPlane::Bottom,
        ClipPlane::Top,
        ClipPlane::Near,
        ClipPlane::Far,
    ];

    /// Signed distance to this plane. Positive = inside the clip volume.
    pub fn signed_distance(&self, v: &ClipSpaceVertex) -> f32 {
        let p = v.position;
        match self {
            Self::Left => p.w + p.x,
            Self::Right => p.w - p.x,
            Self::Bottom => p.w + p.y,
            Self::Top => p.w - p.y,
            Self::Near => p.w + p.z,
            Self::Far => p.w - p.z,
        }
    }
}

/// A convex polygon in clip space.
///
/// Starts as a triangle, grows or shrinks while being clipped, and is fanned
/// back into triangles for rasterization.
pub struct ClipSpacePolygon {
    pub vertices: Vec<ClipSpaceVertex>,
}

impl ClipSpacePolygon {
    pub fn from_triangle(v0: ClipSpaceVertex, v1: ClipSpaceVertex, v2: ClipSpaceVertex) -> Self {
        Self {
            vertices: vec![v0, v1, v2],
        }
    }

    /// Returns true if the polygon has been completely clipped away.
    pub fn is_empty(&self) -> bool {
        self.vertices.len() < 3
    }

    /// Sutherland-Hodgman step against a single plane.
    pub fn clip_against_plane(&self, plane: ClipPlane) -> Self {
        if self.is_empty() {
            return Self { vertices: vec![] };
        }

        let count = self.vertices.len();
        let mut output = Vec::with_capacity(count + 2);

        for i in 0..count {
            let current = &self.vertices[i];
            let next = &self.vertices[(i + 1) % count];

            let d1 = plane.signed_distance(current);
            let d2 = plane.signed_distance(next);

            if d1 >= 0.0 {
                output.push(*current);
            }
            // Edge crosses the plane
            if (d1 >= 0.0) != (d2 >= 0.0) {
                output.push(current.lerp(next, d1 / (d1 - d2)));
            }
        }

        Self { vertices: output }
    }

    /// Fan-triangulates this convex polygon.
    pub fn triangulate(
        &self,
    ) -> impl Iterator<Item = (&ClipSpaceVertex, &ClipSpaceVertex, &ClipSpaceVertex)> {
        (1..self.vertices.len().saturating_sub(1))
            .map(move |i| (&self.vertices[0], &self.vertices[i], &self.vertices[i + 1]))
    }
}

/// Clips polygons against the canonical clip-space cube.
#[derive(Default)]
pub struct ClipSpaceClipper;

impl ClipSpaceClipper {
    pub fn new() -> Self {
        Self
    }

    /// Returns true when every vertex of the triangle is inside all planes,
    /// letting the caller skip the polygon allocation entirely.
    pub fn fully_inside(&self, vertices: [&ClipSpaceVertex; 3]) -> bool {
        ClipPlane::ALL
            .iter()
            .all(|plane| vertices.iter().all(|v| plane.signed_distance(v) >= 0.0))
    }

    /// Returns true when all vertices lie outside the same plane.
    pub fn trivially_outside(&self, vertices: [&ClipSpaceVertex; 3]) -> bool {
        ClipPlane::ALL
            .iter()
            .any(|plane| vertices.iter().all(|v| plane.signed_distance(v) < 0.0))
    }

    /// Clip a polygon against all 6 planes of the clip cube.
    pub fn clip_polygon(&self, polygon: ClipSpacePolygon) -> ClipSpacePolygon {
        let mut result = polygon;
        for plane in ClipPlane::ALL {
            if result.is_empty() {
                break;
            }
            result = result.clip_against_plane(plane);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f32, y: f32, z: f32) -> ClipSpaceVertex {
        ClipSpaceVertex::new(Vec4::new(x, y, z, 1.0), Varyings::default())
    }

    #[test]
    fn triangle_inside_is_untouched() {
        let clipper = ClipSpaceClipper::new();
        let (a, b, c) = (vertex(0.0, 0.0, 0.0), vertex(0.5, 0.0, 0.0), vertex(0.0, 0.5, 0.0));
        assert!(clipper.fully_inside([&a, &b, &c]));
        let clipped = clipper.clip_polygon(ClipSpacePolygon::from_triangle(a, b, c));
        assert_eq!(clipped.vertices.len(), 3);
    }

    #[test]
    fn triangle_beyond_far_plane_is_rejected() {
        let clipper = ClipSpaceClipper::new();
        let (a, b, c) = (vertex(0.0, 0.0, 2.0), vertex(0.5, 0.0, 2.0), vertex(0.0, 0.5, 3.0));
        assert!(clipper.trivially_outside([&a, &b, &c]));
        assert!(clipper.clip_polygon(ClipSpacePolygon::from_triangle(a, b, c)).is_empty());
    }

    #[test]
    fn crossing_one_plane_yields_quad() {
        let clipper = ClipSpaceClipper::new();
        let polygon = ClipSpacePolygon::from_triangle(
            vertex(0.0, 0.0, 0.0),
            vertex(2.0, 0.0, 0.0),
            vertex(0.0, 0.5, 0.0),
        );
        let clipped = clipper.clip_polygon(polygon);
        assert_eq!(clipped.vertices.len(), 4);
        assert_eq!(clipped.triangulate().count(), 2);
    }
}
