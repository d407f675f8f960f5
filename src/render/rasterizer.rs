//! Edge function-based triangle rasterization.
//!
//! For an edge from point A to point B, the edge function at point P is:
//!
//! ```text
//! E(P) = (P.x - A.x) * (B.y - A.y) - (P.y - A.y) * (B.x - A.x)
//! ```
//!
//! A pixel is inside the triangle when all three edge functions share the
//! sign of the triangle's signed area. Normalized edge values are the
//! barycentric weights used to interpolate depth and varyings.
//!
//! Varyings are interpolated perspective-correctly: each vertex carries its
//! varyings pre-multiplied by 1/w, the weighted sum is divided by the
//! interpolated 1/w at the pixel.

use super::framebuffer::FrameBuffer;
use super::Varyings;

/// Fragment stage: computes a pixel color from interpolated varyings.
pub trait FragmentShader {
    fn shade(&self, varyings: &Varyings) -> u32;
}

/// A vertex after perspective divide and viewport mapping.
#[derive(Clone, Copy, Debug)]
pub struct ScreenVertex {
    pub x: f32,
    pub y: f32,
    /// Reciprocal of clip-space w (larger = closer).
    pub inv_w: f32,
    /// Varyings multiplied by `inv_w`.
    pub varyings_over_w: Varyings,
}

impl ScreenVertex {
    pub fn new(x: f32, y: f32, inv_w: f32, varyings: &Varyings) -> Self {
        Self {
            x,
            y,
            inv_w,
            varyings_over_w: varyings.scaled(inv_w),
        }
    }
}

/// Triangle rasterizer using the edge function algorithm.
///
/// Iterates over the pixels of the triangle's bounding box. Depth testing
/// happens before the fragment shader runs, so hidden fragments are never shaded.
#[derive(Default)]
pub struct EdgeFunctionRasterizer;

impl EdgeFunctionRasterizer {
    pub fn new() -> Self {
        EdgeFunctionRasterizer
    }

    #[inline]
    fn edge_function(a: &ScreenVertex, b: &ScreenVertex, px: f32, py: f32) -> f32 {
        (px - a.x) * (b.y - a.y) - (py - a.y) * (b.x - a.x)
    }

    /// Fills one triangle. Returns the number of fragments written.
    pub fn fill_triangle<S: FragmentShader + ?Sized>(
        &self,
        vertices: [&ScreenVertex; 3],
        buffer: &mut FrameBuffer,
        shader: &S,
        depth_test: bool,
    ) -> usize {
        let [v0, v1, v2] = vertices;

        let area = Self::edge_function(v0, v1, v2.x, v2.y);
        if area.abs() < f32::EPSILON {
            return 0; // Degenerate triangle
        }
        let inv_area = 1.0 / area;

        let min_x = (v0.x.min(v1.x).min(v2.x).floor() as i32).max(0);
        let max_x = (v0.x.max(v1.x).max(v2.x).ceil() as i32).min(buffer.width() as i32 - 1);
        let min_y = (v0.y.min(v1.y).min(v2.y).floor() as i32).max(0);
        let max_y = (v0.y.max(v1.y).max(v2.y).ceil() as i32).min(buffer.height() as i32 - 1);

        let mut written = 0;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                // Sample at pixel center
                let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);

                let w0 = Self::edge_function(v1, v2, px, py);
                let w1 = Self::edge_function(v2, v0, px, py);
                let w2 = Self::edge_function(v0, v1, px, py);

                let inside = if area > 0.0 {
                    w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
                } else {
                    w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0
                };
                if !inside {
                    continue;
                }

                let lambda = [w0 * inv_area, w1 * inv_area, w2 * inv_area];
                let inv_w = lambda[0] * v0.inv_w + lambda[1] * v1.inv_w + lambda[2] * v2.inv_w;

                if depth_test && !buffer.depth_passes(x, y, inv_w) {
                    continue;
                }

                let varyings = Varyings::weighted(
                    [&v0.varyings_over_w, &v1.varyings_over_w, &v2.varyings_over_w],
                    lambda,
                )
                .scaled(1.0 / inv_w);

                let color = shader.shade(&varyings);
                if depth_test {
                    buffer.write(x, y, inv_w, color);
                } else {
                    buffer.set_pixel(x, y, color);
                }
                written += 1;
            }
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Solid(u32);

    impl FragmentShader for Solid {
        fn shade(&self, _varyings: &Varyings) -> u32 {
            self.0
        }
    }

    fn screen(x: f32, y: f32, inv_w: f32) -> ScreenVertex {
        ScreenVertex::new(x, y, inv_w, &Varyings::default())
    }

    #[test]
    fn closer_triangle_wins_depth_test() {
        let mut color = vec![0u32; 16 * 16];
        let mut depth = vec![0.0f32; 16 * 16];
        let mut fb = FrameBuffer::new(&mut color, &mut depth, 16, 16);
        let raster = EdgeFunctionRasterizer::new();

        let (a, b, c) = (screen(0.0, 0.0, 0.5), screen(16.0, 0.0, 0.5), screen(0.0, 16.0, 0.5));
        raster.fill_triangle([&a, &b, &c], &mut fb, &Solid(1), true);

        let (d, e, f) = (screen(0.0, 0.0, 0.1), screen(16.0, 0.0, 0.1), screen(0.0, 16.0, 0.1));
        let written = raster.fill_triangle([&d, &e, &f], &mut fb, &Solid(2), true);
        assert_eq!(written, 0);
        assert_eq!(color[0], 1);
    }

    #[test]
    fn degenerate_triangle_writes_nothing() {
        let mut color = vec![0u32; 4 * 4];
        let mut depth = vec![0.0f32; 4 * 4];
        let mut fb = FrameBuffer::new(&mut color, &mut depth, 4, 4);
        let (a, b) = (screen(0.0, 0.0, 1.0), screen(3.0, 3.0, 1.0));
        let written = EdgeFunctionRasterizer::new().fill_triangle([&a, &b, &b], &mut fb, &Solid(7), true);
        assert_eq!(written, 0);
    }

    #[test]
    fn varyings_interpolate_perspective_correctly() {
        struct Probe;
        impl FragmentShader for Probe {
            fn shade(&self, varyings: &Varyings) -> u32 {
                (varyings.0[0] * 100.0).round() as u32
            }
        }

        let mut color = vec![0u32; 8 * 8];
        let mut depth = vec![0.0f32; 8 * 8];
        let mut fb = FrameBuffer::new(&mut color, &mut depth, 8, 8);
        let mut value = Varyings::default();
        value.0[0] = 0.5;
        // Constant varying must stay constant regardless of per-vertex w.
        let a = ScreenVertex::new(0.0, 0.0, 1.0, &value);
        let b = ScreenVertex::new(8.0, 0.0, 0.25, &value);
        let c = ScreenVertex::new(0.0, 8.0, 0.5, &value);
        EdgeFunctionRasterizer::new().fill_triangle([&a, &b, &c], &mut fb, &Probe, true);
        assert_eq!(color[8 + 1], 50);
    }
}
