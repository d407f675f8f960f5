//! CPU rasterization back end behind the [`crate::gl`] device.
//!
//! The device hands clip-space triangles to this module, which clips them
//! against the canonical cube, maps them to the viewport and fills them with
//! perspective-correct varyings.

mod clipper;
mod framebuffer;
mod rasterizer;
mod renderer;

pub use clipper::{ClipSpaceClipper, ClipSpacePolygon, ClipSpaceVertex};
pub use framebuffer::FrameBuffer;
pub use rasterizer::{EdgeFunctionRasterizer, FragmentShader, ScreenVertex};
pub use renderer::Renderer;

/// Maximum number of interpolated floats a vertex kernel can emit.
pub const MAX_VARYINGS: usize = 12;

/// Per-vertex values interpolated across a triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Varyings(pub [f32; MAX_VARYINGS]);

impl Default for Varyings {
    fn default() -> Self {
        Self([0.0; MAX_VARYINGS])
    }
}

impl Varyings {
    #[inline]
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        let mut out = [0.0; MAX_VARYINGS];
        for (i, value) in out.iter_mut().enumerate() {
            *value = self.0[i] + (other.0[i] - self.0[i]) * t;
        }
        Self(out)
    }

    #[inline]
    pub fn scaled(&self, factor: f32) -> Self {
        Self(self.0.map(|v| v * factor))
    }

    /// Weighted sum of three varying sets, used for barycentric interpolation.
    #[inline]
    pub fn weighted(sets: [&Varyings; 3], weights: [f32; 3]) -> Self {
        let mut out = [0.0; MAX_VARYINGS];
        for (i, value) in out.iter_mut().enumerate() {
            *value = sets[0].0[i] * weights[0] + sets[1].0[i] * weights[1] + sets[2].0[i] * weights[2];
        }
        Self(out)
    }
}
