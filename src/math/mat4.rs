//! 4x4 transformation matrix.
//!
//! # Convention
//! - Vectors are **column vectors** on the right: `Mat4 * Vec`
//! - Translation is stored in the **last column**
//! - Transforms chain **right-to-left**: `A * B * v` applies B first, then A
//! - Right-handed, OpenGL-style clip space (depth in [-1, 1])
//!
//! Matrices cross the device boundary as 16 floats in column-major order,
//! see [`Mat4::to_cols_array`] and [`Mat4::from_cols_array`].

use std::ops::Mul;

use super::vec3::Vec3;
use super::vec4::Vec4;

/// 4x4 matrix stored as `data[row][col]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    data: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    pub fn new(data: [[f32; 4]; 4]) -> Self {
        Mat4 { data }
    }

    pub fn identity() -> Self {
        Mat4::new([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a translation matrix.
    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        Mat4::new([
            [1.0, 0.0, 0.0, x],
            [0.0, 1.0, 0.0, y],
            [0.0, 0.0, 1.0, z],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a counter-clockwise rotation of `angle` radians about `axis`.
    ///
    /// The axis does not need to be normalized. A zero axis yields identity.
    pub fn axis_rotation(axis: Vec3, angle: f32) -> Self {
        if axis.magnitude() <= f32::EPSILON {
            return Self::identity();
        }
        let Vec3 { x, y, z } = axis.normalize();
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;

        Mat4::new([
            [t * x * x + c, t * x * y - s * z, t * x * z + s * y, 0.0],
            [t * x * y + s * z, t * y * y + c, t * y * z - s * x, 0.0],
            [t * x * z - s * y, t * y * z + s * x, t * z * z + c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a right-handed perspective projection mapping depth to [-1, 1].
    ///
    /// The camera looks down -Z; `near` and `far` are positive distances.
    pub fn perspective(fov_y: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov_y / 2.0).tan();
        let range_inv = 1.0 / (near - far);
        Mat4::new([
            [f / aspect_ratio, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, (near + far) * range_inv, 2.0 * near * far * range_inv],
            [0.0, 0.0, -1.0, 0.0],
        ])
    }

    pub fn transpose(&self) -> Self {
        let mut out = [[0.0f32; 4]; 4];
        for (row, values) in self.data.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                out[col][row] = *value;
            }
        }
        Mat4::new(out)
    }

    /// Computes the inverse of the matrix, if it exists.
    /// Returns `None` if the matrix is singular (determinant is zero).
    ///
    /// Uses the 2x2 sub-determinant expansion: six minors from the top two
    /// rows and six from the bottom two rows.
    pub fn inverse(&self) -> Option<Mat4> {
        let [[m00, m01, m02, m03], [m10, m11, m12, m13], [m20, m21, m22, m23], [m30, m31, m32, m33]] =
            self.data;

        let s0 = m00 * m11 - m10 * m01;
        let s1 = m00 * m12 - m10 * m02;
        let s2 = m00 * m13 - m10 * m03;
        let s3 = m01 * m12 - m11 * m02;
        let s4 = m01 * m13 - m11 * m03;
        let s5 = m02 * m13 - m12 * m03;

        let c5 = m22 * m33 - m32 * m23;
        let c4 = m21 * m33 - m31 * m23;
        let c3 = m21 * m32 - m31 * m22;
        let c2 = m20 * m33 - m30 * m23;
        let c1 = m20 * m32 - m30 * m22;
        let c0 = m20 * m31 - m30 * m21;

        let det = s0 * c5 - s1 * c4 + s2 * c3 + s3 * c2 - s4 * c1 + s5 * c0;
        if det.abs() < f32::EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let adjugate = [
            [
                m11 * c5 - m12 * c4 + m13 * c3,
                -m01 * c5 + m02 * c4 - m03 * c3,
                m31 * s5 - m32 * s4 + m33 * s3,
                -m21 * s5 + m22 * s4 - m23 * s3,
            ],
            [
                -m10 * c5 + m12 * c2 - m13 * c1,
                m00 * c5 - m02 * c2 + m03 * c1,
                -m30 * s5 + m32 * s2 - m33 * s1,
                m20 * s5 - m22 * s2 + m23 * s1,
            ],
            [
                m10 * c4 - m11 * c2 + m13 * c0,
                -m00 * c4 + m01 * c2 - m03 * c0,
                m30 * s4 - m31 * s2 + m33 * s0,
                -m20 * s4 + m21 * s2 - m23 * s0,
            ],
            [
                -m10 * c3 + m11 * c1 - m12 * c0,
                m00 * c3 - m01 * c1 + m02 * c0,
                -m30 * s3 + m31 * s1 - m32 * s0,
                m20 * s3 - m21 * s1 + m22 * s0,
            ],
        ];

        Some(Mat4::new(adjugate.map(|row| row.map(|v| v * inv_det))))
    }

    /// Access element at [row][col].
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row][col]
    }

    /// Flattens to column-major order, the layout uniform uploads expect.
    pub fn to_cols_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = self.data[row][col];
            }
        }
        out
    }

    /// Inverse of [`Mat4::to_cols_array`].
    pub fn from_cols_array(values: &[f32; 16]) -> Self {
        let mut data = [[0.0; 4]; 4];
        for col in 0..4 {
            for row in 0..4 {
                data[row][col] = values[col * 4 + row];
            }
        }
        Mat4::new(data)
    }

    /// Largest absolute element-wise difference, handy for comparisons.
    pub fn max_abs_diff(&self, other: &Mat4) -> f32 {
        self.data
            .iter()
            .flatten()
            .zip(other.data.iter().flatten())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max)
    }
}

/// Matrix multiplication: Mat4 * Mat4.
///
/// `A * B * v` applies B first, then A.
impl Mul<Mat4> for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Self::Output {
        let mut result = [[0.0f32; 4]; 4];
        for (row, out_row) in result.iter_mut().enumerate() {
            for (col, out) in out_row.iter_mut().enumerate() {
                *out = (0..4).map(|k| self.data[row][k] * rhs.data[k][col]).sum();
            }
        }
        Mat4::new(result)
    }
}

/// Transform a Vec4 by a matrix: Mat4 * Vec4 (column vector).
impl Mul<Vec4> for Mat4 {
    type Output = Vec4;

    fn mul(self, v: Vec4) -> Self::Output {
        let row = |r: usize| {
            let d = self.data[r];
            d[0] * v.x + d[1] * v.y + d[2] * v.z + d[3] * v.w
        };
        Vec4::new(row(0), row(1), row(2), row(3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    #[test]
    fn inverse_of_rigid_transform_round_trips() {
        let m = Mat4::translation(1.0, -2.0, 3.0) * Mat4::axis_rotation(Vec3::new(1.0, 1.0, 0.0), 0.7);
        let inv = m.inverse().expect("rigid transforms are invertible");
        assert!((m * inv).max_abs_diff(&Mat4::identity()) < 1e-5);
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let zero = Mat4::new([[0.0; 4]; 4]);
        assert!(zero.inverse().is_none());
    }

    #[test]
    fn axis_rotation_about_x_is_counter_clockwise() {
        let r = Mat4::axis_rotation(Vec3::X, FRAC_PI_2);
        let v = r * Vec4::direction(Vec3::Y);
        assert_relative_eq!(v.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(v.z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn perspective_maps_near_and_far_to_clip_bounds() {
        let p = Mat4::perspective(FRAC_PI_4, 1.0, 1.0, 12.0);
        let near = p * Vec4::new(0.0, 0.0, -1.0, 1.0);
        let far = p * Vec4::new(0.0, 0.0, -12.0, 1.0);
        assert_relative_eq!(near.z / near.w, -1.0, epsilon = 1e-5);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn column_major_layout_puts_translation_last() {
        let cols = Mat4::translation(4.0, 5.0, 6.0).to_cols_array();
        assert_eq!(&cols[12..15], &[4.0, 5.0, 6.0]);
        assert_eq!(Mat4::from_cols_array(&cols), Mat4::translation(4.0, 5.0, 6.0));
    }

    #[test]
    fn transpose_swaps_rows_and_columns() {
        let t = Mat4::translation(1.0, 2.0, 3.0).transpose();
        assert_eq!(t.get(3, 0), 1.0);
        assert_eq!(t.get(3, 2), 3.0);
        assert_eq!(t.get(0, 3), 0.0);
    }
}
