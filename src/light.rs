//! Point light driven by a single offset, and the surface material.

use crate::math::Vec3;

/// Light position for a given offset.
///
/// The light swings along x with `sin(offset) * 1.2` and rises along z with
/// the square of that swing. The offset is unbounded.
pub fn light_coordinates(offset: f32) -> Vec3 {
    let coord = offset.sin() * 1.2;
    Vec3::new(coord, -2.0, coord * coord)
}

/// Fixed direction uploaded alongside the position.
pub const LIGHT_DIRECTION: Vec3 = Vec3::X;

/// Phong material constants. Components above 1.0 are intentional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: [f32; 4],
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 0.0, 1.0],
            ambient: Vec3::new(0.5, 0.0, 0.4),
            diffuse: Vec3::new(3.3, 1.5, 5.0),
            specular: Vec3::new(2.0, 1.0, 3.0),
            shininess: 1.0,
        }
    }
}
