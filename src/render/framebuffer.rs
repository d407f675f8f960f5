//! Frame buffer abstraction for 2D pixel access.
//!
//! Provides a bounds-checked view into color and depth buffers.

/// A view into color and depth buffers.
///
/// This is a borrowed view, not an owning type. It is created per draw call
/// to pass buffers and dimensions together to the rasterizer.
///
/// # Depth Buffer
///
/// The depth buffer stores 1/w values (reciprocal of clip-space W) for each pixel.
/// 1/w interpolates linearly in screen space. Larger values are closer to the
/// camera; a cleared buffer holds 0.0 (infinitely far).
pub struct FrameBuffer<'a> {
    color_buffer: &'a mut [u32],
    depth_buffer: &'a mut [f32],
    width: u32,
    height: u32,
}

impl<'a> FrameBuffer<'a> {
    pub fn new(
        color_buffer: &'a mut [u32],
        depth_buffer: &'a mut [f32],
        width: u32,
        height: u32,
    ) -> Self {
        debug_assert_eq!(color_buffer.len(), (width * height) as usize);
        debug_assert_eq!(depth_buffer.len(), (width * height) as usize);
        Self {
            color_buffer,
            depth_buffer,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            Some((y as u32 * self.width + x as u32) as usize)
        } else {
            None
        }
    }

    /// Returns true when `inv_depth` would pass the depth test at (x, y).
    #[inline]
    pub fn depth_passes(&self, x: i32, y: i32, inv_depth: f32) -> bool {
        self.index(x, y)
            .is_some_and(|idx| inv_depth > self.depth_buffer[idx])
    }

    /// Writes color and depth at (x, y). Callers test depth first.
    #[inline]
    pub fn write(&mut self, x: i32, y: i32, inv_depth: f32, color: u32) {
        if let Some(idx) = self.index(x, y) {
            self.depth_buffer[idx] = inv_depth;
            self.color_buffer[idx] = color;
        }
    }

    /// Set a pixel without touching depth.
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if let Some(idx) = self.index(x, y) {
            self.color_buffer[idx] = color;
        }
    }
}
