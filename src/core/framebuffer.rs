use crate::core::color::pack_rgba;
use nalgebra::Vector3;
use rayon::prelude::*;

/// Per-pixel record produced by rasterization and consumed by the deferred
/// shading pass. One fragment exists per screen pixel for the lifetime of the
/// buffer; rasterization mutates it in place under a "closer wins" rule.
#[derive(Debug, Clone, Copy)]
pub struct Fragment {
    /// Winning NDC depth so far. Initialized to +infinity so any real
    /// geometry beats the background.
    pub depth: f32,
    /// Sampled base color of the winning surface.
    pub color: Vector3<f32>,
    /// Interpolated unit normal in view space.
    pub normal: Vector3<f32>,
    /// Interpolated position in view space.
    pub position: Vector3<f32>,
    /// Specular exponent of the winning surface.
    pub shininess: f32,
    /// Fragment belongs to a light source: shading passes its color through.
    pub is_light: bool,
    /// No geometry has covered this pixel yet (or the skybox wrote it).
    pub is_background: bool,
}

impl Fragment {
    /// The per-frame reset state: infinitely far background of the given color.
    pub fn background(color: Vector3<f32>) -> Self {
        Self {
            depth: f32::INFINITY,
            color,
            normal: Vector3::zeros(),
            position: Vector3::zeros(),
            shininess: 1.0,
            is_light: false,
            is_background: true,
        }
    }
}

/// Owns the renderer's per-pixel state: the fragment records written during
/// rasterization, the packed RGBA output pixels written during shading, and
/// the fixed per-pixel view directions derived from the camera field of view.
///
/// Allocated once for a fixed resolution. Everything in it is rewritten every
/// frame; nothing persists across render calls.
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub fragments: Vec<Fragment>,
    pub pixels: Vec<u32>,
    /// Unit vectors pointing from each pixel's surface sample *toward* the
    /// camera, in view space. Depends only on resolution and field of view.
    pub view_dirs: Vec<Vector3<f32>>,
    cached_fov_y: f32,
}

impl FrameBuffer {
    /// Creates the buffers for a fixed resolution.
    ///
    /// This is the only fatal failure point of the renderer: a zero-sized or
    /// absurdly large resolution is rejected before any rendering is
    /// attempted. Per-frame geometry problems are never fatal.
    pub fn new(width: usize, height: usize) -> Result<Self, String> {
        if width == 0 || height == 0 {
            return Err(format!("invalid resolution {}x{}", width, height));
        }
        let size = width
            .checked_mul(height)
            .filter(|&n| n <= 1 << 28)
            .ok_or_else(|| format!("resolution {}x{} exceeds buffer limits", width, height))?;

        Ok(Self {
            width,
            height,
            fragments: vec![Fragment::background(Vector3::zeros()); size],
            pixels: vec![0; size],
            view_dirs: vec![Vector3::new(0.0, 0.0, 1.0); size],
            cached_fov_y: f32::NAN,
        })
    }

    #[inline(always)]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Resets all fragments to the background state and fills the pixel
    /// buffer with the packed background color.
    pub fn reset(&mut self, background: Vector3<f32>) {
        let fragment = Fragment::background(background);
        self.fragments.par_iter_mut().for_each(|f| *f = fragment);
        self.pixels.fill(pack_rgba(&background));
    }

    /// Recomputes the per-pixel view directions for a (vertical) field of
    /// view. Cached: cheap when the camera fov is unchanged between frames.
    ///
    /// The ray through pixel (x, y) in view space is (px, py, -1) with
    /// px, py derived from the pixel center and fov; the stored direction is
    /// its negation, normalized, i.e. it points back at the camera.
    pub fn update_view_dirs(&mut self, fov_y_rad: f32) {
        if self.cached_fov_y == fov_y_rad {
            return;
        }
        self.cached_fov_y = fov_y_rad;

        let width = self.width;
        let height = self.height;
        let aspect = width as f32 / height as f32;
        let half_tan = (fov_y_rad / 2.0).tan();

        self.view_dirs
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                let py = (1.0 - 2.0 * (y as f32 + 0.5) / height as f32) * half_tan;
                for (x, dir) in row.iter_mut().enumerate() {
                    let px = (2.0 * (x as f32 + 0.5) / width as f32 - 1.0) * half_tan * aspect;
                    *dir = Vector3::new(-px, -py, 1.0).normalize();
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_resolution_is_rejected() {
        assert!(FrameBuffer::new(0, 480).is_err());
        assert!(FrameBuffer::new(640, 0).is_err());
    }

    #[test]
    fn reset_restores_background_state() {
        let mut fb = FrameBuffer::new(4, 4).unwrap();
        fb.fragments[5].depth = 0.25;
        fb.fragments[5].is_background = false;

        fb.reset(Vector3::new(0.1, 0.2, 0.3));

        assert!(fb.fragments[5].depth.is_infinite());
        assert!(fb.fragments[5].is_background);
        assert_relative_eq!(fb.fragments[5].color.z, 0.3);
    }

    #[test]
    fn center_view_dir_points_at_camera() {
        let mut fb = FrameBuffer::new(101, 101).unwrap();
        fb.update_view_dirs(60.0_f32.to_radians());

        // The center pixel looks straight down -Z, so the direction back to
        // the camera is +Z.
        let center = fb.view_dirs[fb.index(50, 50)];
        assert_relative_eq!(center.x, 0.0, epsilon = 1e-2);
        assert_relative_eq!(center.y, 0.0, epsilon = 1e-2);
        assert!(center.z > 0.99);
    }

    #[test]
    fn corner_view_dirs_tilt_outward() {
        let mut fb = FrameBuffer::new(100, 100).unwrap();
        fb.update_view_dirs(90.0_f32.to_radians());

        // Top-left pixel: the ray goes up-left, so the return direction
        // points down-right in view space.
        let corner = fb.view_dirs[fb.index(0, 0)];
        assert!(corner.x > 0.0);
        assert!(corner.y < 0.0);
        assert!(corner.norm() > 0.999 && corner.norm() < 1.001);
    }
}
