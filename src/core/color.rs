use nalgebra::Vector3;

/// Clamps a linear RGB color to [0, 1] and packs it into a 32-bit RGBA value
/// with an opaque alpha (0xRRGGBBAA).
pub fn pack_rgba(color: &Vector3<f32>) -> u32 {
    let r = (color.x.clamp(0.0, 1.0) * 255.0) as u32;
    let g = (color.y.clamp(0.0, 1.0) * 255.0) as u32;
    let b = (color.z.clamp(0.0, 1.0) * 255.0) as u32;
    (r << 24) | (g << 16) | (b << 8) | 0xFF
}

/// Unpacks a 0xRRGGBBAA value back into linear RGB bytes.
pub fn unpack_rgba(pixel: u32) -> [u8; 4] {
    [
        ((pixel >> 24) & 0xFF) as u8,
        ((pixel >> 16) & 0xFF) as u8,
        ((pixel >> 8) & 0xFF) as u8,
        (pixel & 0xFF) as u8,
    ]
}
