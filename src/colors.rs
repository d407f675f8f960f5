//! Color packing helpers for the ARGB8888 framebuffer.

/// Opaque black, the clear color of every frame.
pub const BLACK: u32 = 0xFF00_0000;

/// Packs normalized RGBA components into an ARGB8888 pixel.
///
/// Components are clamped to [0, 1], so oversaturated lighting results
/// saturate instead of wrapping.
#[inline]
pub fn pack_color(r: f32, g: f32, b: f32, a: f32) -> u32 {
    let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
    (to_byte(a) << 24) | (to_byte(r) << 16) | (to_byte(g) << 8) | to_byte(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversaturated_components_clamp() {
        assert_eq!(pack_color(3.3, 1.5, 5.0, 1.0), 0xFFFF_FFFF);
        assert_eq!(pack_color(-1.0, 0.0, 0.0, 1.0), BLACK);
    }

    #[test]
    fn channels_land_in_argb_order() {
        assert_eq!(pack_color(1.0, 0.0, 0.5, 1.0), 0xFFFF_0080);
    }
}
