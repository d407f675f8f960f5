//! Owns the color and depth buffers the device draws into.

use image::RgbaImage;

use super::framebuffer::FrameBuffer;
use crate::colors;

pub struct Renderer {
    color_buffer: Vec<u32>,
    depth_buffer: Vec<f32>,
    width: u32,
    height: u32,
}

impl Renderer {
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width * height) as usize;
        Self {
            color_buffer: vec![colors::BLACK; size],
            depth_buffer: vec![0.0; size], // 0.0 = infinitely far (1/w where w -> infinity)
            width,
            height,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        *self = Self::new(width, height);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, color: u32) {
        self.color_buffer.fill(color);
    }

    /// Sets all depths to 0.0 (infinitely far, since we store 1/w).
    pub fn clear_depth(&mut self) {
        self.depth_buffer.fill(0.0);
    }

    /// Color at (x, y), or None if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        (x < self.width && y < self.height)
            .then(|| self.color_buffer[(y * self.width + x) as usize])
    }

    /// Raw ARGB8888 bytes in native endianness, ready for a streaming texture.
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: u32 has no padding and u8 has alignment 1, so viewing the
        // color buffer as bytes is valid for its whole length.
        unsafe {
            std::slice::from_raw_parts(
                self.color_buffer.as_ptr() as *const u8,
                self.color_buffer.len() * 4,
            )
        }
    }

    /// Copies the color buffer into an RGBA image.
    pub fn capture(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let argb = self.color_buffer[(y * self.width + x) as usize];
            image::Rgba([
                (argb >> 16) as u8,
                (argb >> 8) as u8,
                argb as u8,
                (argb >> 24) as u8,
            ])
        })
    }

    /// Get a mutable FrameBuffer view into the color and depth buffers.
    pub fn as_framebuffer(&mut self) -> FrameBuffer<'_> {
        FrameBuffer::new(
            &mut self.color_buffer,
            &mut self.depth_buffer,
            self.width,
            self.height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_converts_argb_to_rgba() {
        let mut renderer = Renderer::new(2, 1);
        renderer.clear(0xFF11_2233);
        let image = renderer.capture();
        assert_eq!(image.get_pixel(1, 0).0, [0x11, 0x22, 0x33, 0xFF]);
    }

    #[test]
    fn pixel_out_of_bounds_is_none() {
        let renderer = Renderer::new(2, 2);
        assert_eq!(renderer.pixel(2, 0), None);
        assert_eq!(renderer.pixel(1, 1), Some(colors::BLACK));
    }
}
