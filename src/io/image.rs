use crate::core::color::unpack_rgba;
use image::{ImageBuffer, Rgba};
use log::info;
use std::path::Path;

/// Saves a packed 0xRRGGBBAA pixel buffer (row-major, top-left origin) to an
/// image file; the format follows the path's extension.
pub fn save_buffer_to_image(
    buffer: &[u32],
    width: usize,
    height: usize,
    path: &str,
) -> Result<(), String> {
    if buffer.len() != width * height {
        return Err(format!(
            "pixel buffer has {} entries, expected {}x{}",
            buffer.len(),
            width,
            height
        ));
    }

    let mut img_buf = ImageBuffer::new(width as u32, height as u32);
    for (x, y, pixel) in img_buf.enumerate_pixels_mut() {
        let rgba = unpack_rgba(buffer[y as usize * width + x as usize]);
        *pixel = Rgba(rgba);
    }

    img_buf
        .save(Path::new(path))
        .map_err(|e| format!("failed to save image to '{}': {}", path, e))?;
    info!("Saved {}x{} image to {}", width, height, path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_buffer_size_is_rejected() {
        let buffer = vec![0u32; 5];
        assert!(save_buffer_to_image(&buffer, 2, 2, "/tmp/never-written.png").is_err());
    }
}
