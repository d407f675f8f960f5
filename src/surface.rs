//! Parametric twisted-knot surface.
//!
//! The surface is sampled on a regular (u, v) grid. For each sample:
//!
//! ```text
//! x0 = c (cos 3v + 3 cos v) / 4
//! y0 = c (3 sin v - sin 3v) / 4
//! r  = a + x0 cos θ + y0 sin θ
//! P  = (r cos u, r sin u, b u - x0 sin θ + y0 cos θ)
//! ```
//!
//! Vertices are emitted row-major: u is the outer loop, v the inner one.
//! Sample coordinates are computed from integer step indices in f64 so the
//! grid never drifts, then stored as f32.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Where the normal attribute data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalSource {
    /// Normalized ∂P/∂u × ∂P/∂v.
    #[default]
    Analytic,
    /// The position data reused as normals.
    Aliased,
}

/// How the row-major grid is turned into a triangle strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Adjacent rows interleaved, rows joined by degenerate triangles.
    #[default]
    Stitched,
    /// The row-major list drawn as a single strip.
    Raw,
}

/// Shape constants and sampling grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceParams {
    pub a: f64,
    pub c: f64,
    pub theta: f64,
    pub b: f64,
    pub u_start: f64,
    pub u_end: f64,
    pub v_start: f64,
    pub v_end: f64,
    pub step: f64,
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            a: 0.0,
            c: 1.0,
            theta: 0.0,
            b: 1.0 / PI,
            u_start: -10.0,
            u_end: 10.0,
            v_start: -10.0,
            v_end: 10.0,
            step: 0.1,
        }
    }
}

/// Largest grid the generator will sample.
pub const MAX_VERTICES: usize = 4_000_000;

/// Number of samples in `[start, end)` at `step`.
///
/// A span within 1e-6 of a whole number of steps counts as exactly that many.
/// Returns `None` for non-finite input or a count above [`MAX_VERTICES`].
fn step_count(start: f64, end: f64, step: f64) -> Option<usize> {
    if !(start.is_finite() && end.is_finite() && step.is_finite()) {
        return None;
    }
    if step <= 0.0 || end <= start {
        return Some(0);
    }
    let span = (end - start) / step;
    let nearest = span.round();
    let count = if (span - nearest).abs() < 1e-6 { nearest } else { span.ceil() };
    if !count.is_finite() || count > MAX_VERTICES as f64 {
        return None;
    }
    Some(count as usize)
}

impl SurfaceParams {
    /// Grid dimensions, or `None` when the grid is not finite or exceeds
    /// [`MAX_VERTICES`] samples.
    pub fn checked_grid_dims(&self) -> Option<(usize, usize)> {
        let rows = step_count(self.u_start, self.u_end, self.step)?;
        let cols = step_count(self.v_start, self.v_end, self.step)?;
        rows.checked_mul(cols)
            .filter(|&n| n <= MAX_VERTICES)
            .map(|_| (rows, cols))
    }

    /// Number of (u, v) samples. Rows are u, columns are v.
    ///
    /// A grid that cannot be sampled is empty.
    pub fn grid_dims(&self) -> (usize, usize) {
        self.checked_grid_dims().unwrap_or((0, 0))
    }

    pub fn vertex_count(&self) -> usize {
        let (rows, cols) = self.grid_dims();
        rows * cols
    }

    fn u(&self, i: usize) -> f64 {
        self.u_start + i as f64 * self.step
    }

    fn v(&self, j: usize) -> f64 {
        self.v_start + j as f64 * self.step
    }

    /// Profile curve (x0, y0) and its derivative with respect to v.
    fn profile(&self, v: f64) -> ([f64; 2], [f64; 2]) {
        let c = self.c;
        let x0 = c * ((3.0 * v).cos() + 3.0 * v.cos()) / 4.0;
        let y0 = c * (3.0 * v.sin() - (3.0 * v).sin()) / 4.0;
        let dx0 = c * (-3.0 * (3.0 * v).sin() - 3.0 * v.sin()) / 4.0;
        let dy0 = c * (3.0 * v.cos() - 3.0 * (3.0 * v).cos()) / 4.0;
        ([x0, y0], [dx0, dy0])
    }

    /// Surface point at (u, v).
    pub fn point(&self, u: f64, v: f64) -> [f64; 3] {
        let ([x0, y0], _) = self.profile(v);
        let (sin_t, cos_t) = self.theta.sin_cos();
        let r = self.a + x0 * cos_t + y0 * sin_t;
        [r * u.cos(), r * u.sin(), self.b * u - x0 * sin_t + y0 * cos_t]
    }

    /// Unit normal at (u, v).
    ///
    /// Where the tangents are parallel the radial direction (cos u, sin u, 0)
    /// is returned instead.
    pub fn normal(&self, u: f64, v: f64) -> [f64; 3] {
        let ([x0, y0], [dx0, dy0]) = self.profile(v);
        let (sin_t, cos_t) = self.theta.sin_cos();
        let (sin_u, cos_u) = u.sin_cos();
        let r = self.a + x0 * cos_t + y0 * sin_t;
        let dr = dx0 * cos_t + dy0 * sin_t;

        let du = [-r * sin_u, r * cos_u, self.b];
        let dv = [dr * cos_u, dr * sin_u, -dx0 * sin_t + dy0 * cos_t];
        let n = [
            du[1] * dv[2] - du[2] * dv[1],
            du[2] * dv[0] - du[0] * dv[2],
            du[0] * dv[1] - du[1] * dv[0],
        ];

        let length = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        if length < 1e-9 {
            [cos_u, sin_u, 0.0]
        } else {
            [n[0] / length, n[1] / length, n[2] / length]
        }
    }

    fn sample(&self, f: impl Fn(&Self, f64, f64) -> [f64; 3]) -> Vec<f32> {
        let (rows, cols) = self.grid_dims();
        let mut out = Vec::with_capacity(rows * cols * 3);
        for i in 0..rows {
            let u = self.u(i);
            for j in 0..cols {
                out.extend(f(self, u, self.v(j)).map(|c| c as f32));
            }
        }
        out
    }

    /// Flat row-major position list, three floats per vertex.
    pub fn generate_vertices(&self) -> Vec<f32> {
        self.sample(Self::point)
    }

    /// Flat row-major normal list, in the same order as [`generate_vertices`](Self::generate_vertices).
    pub fn generate_normals(&self) -> Vec<f32> {
        self.sample(Self::normal)
    }
}

/// Reorders a row-major grid of 3-float vertices into a single stitched strip.
///
/// Each pair of adjacent rows is emitted column by column, alternating
/// between the upper and lower row. Consecutive row pairs are joined by
/// repeating the last vertex of one pair and the first vertex of the next,
/// which produces zero-area triangles and keeps the winding parity.
pub fn stitched_strip(values: &[f32], rows: usize, cols: usize) -> Vec<f32> {
    if rows < 2 || cols == 0 || values.len() < rows * cols * 3 {
        return Vec::new();
    }
    let vertex = |row: usize, col: usize| {
        let at = (row * cols + col) * 3;
        &values[at..at + 3]
    };

    let pairs = rows - 1;
    let mut out = Vec::with_capacity((pairs * 2 * cols + (pairs - 1) * 2) * 3);
    for row in 0..pairs {
        if row > 0 {
            out.extend_from_slice(vertex(row, cols - 1));
            out.extend_from_slice(vertex(row, 0));
        }
        for col in 0..cols {
            out.extend_from_slice(vertex(row, col));
            out.extend_from_slice(vertex(row + 1, col));
        }
    }
    out
}

/// Mesh generation options beyond the shape itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshOptions {
    pub normals: NormalSource,
    pub connectivity: Connectivity,
}

/// Position and normal streams ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMesh {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
}

impl SurfaceMesh {
    pub fn build(params: &SurfaceParams, options: MeshOptions) -> Self {
        let positions = params.generate_vertices();
        let normals = match options.normals {
            NormalSource::Analytic => params.generate_normals(),
            NormalSource::Aliased => positions.clone(),
        };

        match options.connectivity {
            Connectivity::Raw => Self { positions, normals },
            Connectivity::Stitched => {
                let (rows, cols) = params.grid_dims();
                Self {
                    positions: stitched_strip(&positions, rows, cols),
                    normals: stitched_strip(&normals, rows, cols),
                }
            }
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}
