use log::info;
use nalgebra::Vector3;
use std::path::Path;
use std::sync::Arc;

/// A pure UV -> color supplier: an image, a procedural checker, or a 1x1
/// constant color. Sampling is nearest-neighbor with the conventional
/// v-flip so v = 0 maps to the bottom image row.
///
/// Texel storage is shared, so cloning a texture is cheap.
#[derive(Debug, Clone)]
pub struct Texture {
    width: usize,
    height: usize,
    texels: Arc<Vec<Vector3<f32>>>,
}

impl Texture {
    /// Loads an image file (any format the `image` crate decodes).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path_ref = path.as_ref();
        let img = image::open(path_ref)
            .map_err(|e| format!("failed to load texture {:?}: {}", path_ref, e))?
            .to_rgb8();

        let (width, height) = img.dimensions();
        info!("Loaded texture: {:?} ({}x{})", path_ref, width, height);

        let texels = img
            .pixels()
            .map(|p| Vector3::new(p[0] as f32, p[1] as f32, p[2] as f32) / 255.0)
            .collect();

        Ok(Self {
            width: width as usize,
            height: height as usize,
            texels: Arc::new(texels),
        })
    }

    /// A 1x1 constant-color texture.
    pub fn color(color: Vector3<f32>) -> Self {
        Self {
            width: 1,
            height: 1,
            texels: Arc::new(vec![color]),
        }
    }

    /// A black-and-white checkerboard with the given cell grid.
    pub fn checker(width: usize, height: usize) -> Self {
        let mut texels = Vec::with_capacity(width * height);
        for i in 0..height {
            for j in 0..width {
                let on = ((i + j) % 2) as f32;
                texels.push(Vector3::new(on, on, on));
            }
        }
        Self {
            width,
            height,
            texels: Arc::new(texels),
        }
    }

    /// Nearest-neighbor lookup. Coordinates wrap (repeat mode) and v is
    /// flipped to match image row order.
    pub fn sample(&self, u: f32, v: f32) -> Vector3<f32> {
        let u = wrap(u);
        let v = 1.0 - wrap(v);

        let x = ((u * self.width as f32) as usize).min(self.width - 1);
        let y = ((v * self.height as f32) as usize).min(self.height - 1);
        self.texels[y * self.width + x]
    }
}

#[inline(always)]
fn wrap(t: f32) -> f32 {
    let f = t.fract();
    if f < 0.0 { f + 1.0 } else { f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constant_color_ignores_uv() {
        let tex = Texture::color(Vector3::new(0.2, 0.4, 0.6));
        assert_relative_eq!(tex.sample(0.0, 0.0).y, 0.4);
        assert_relative_eq!(tex.sample(0.9, 0.3).y, 0.4);
    }

    #[test]
    fn checker_alternates_cells() {
        let tex = Texture::checker(2, 2);
        // Top image row is (dark, light); v near 1 samples that row.
        assert_relative_eq!(tex.sample(0.1, 0.9).x, 0.0);
        assert_relative_eq!(tex.sample(0.9, 0.9).x, 1.0);
        assert_relative_eq!(tex.sample(0.1, 0.1).x, 1.0);
    }

    #[test]
    fn coordinates_wrap_around() {
        let tex = Texture::checker(2, 2);
        assert_relative_eq!(tex.sample(0.1, 0.9).x, tex.sample(1.1, 0.9).x);
        assert_relative_eq!(tex.sample(0.1, 0.9).x, tex.sample(-0.9, 0.9).x);
    }
}
