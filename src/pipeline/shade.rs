use crate::core::color::pack_rgba;
use crate::core::framebuffer::FrameBuffer;
use nalgebra::Vector3;
use rayon::prelude::*;

const EPSILON: f32 = 1e-6;

/// A point light captured at the start of the frame, already transformed
/// into camera space. Copying the state up front means a light moved by the
/// caller mid-frame cannot retroactively change this frame's shading.
#[derive(Debug, Clone, Copy)]
pub struct CollectedLight {
    /// Position in view space.
    pub position: Vector3<f32>,
    pub color: Vector3<f32>,
    pub intensity: f32,
}

/// The deferred pass: one sweep over the fragment buffer computing the final
/// packed color per pixel.
///
/// Background and light-source fragments pass their stored color straight
/// through. Everything else gets ambient plus, per light, inverse-square
/// attenuated diffuse and specular terms, multiplied by the fragment's base
/// color and clamped on packing.
///
/// Rows are shaded in parallel; the pass reads fragments and view directions
/// and writes only its own row of pixels, so the result is deterministic.
pub fn shade(fb: &mut FrameBuffer, lights: &[CollectedLight], ambient: f32) {
    let width = fb.width;
    let fragments = &fb.fragments;
    let view_dirs = &fb.view_dirs;

    fb.pixels
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, pixel) in row.iter_mut().enumerate() {
                let index = y * width + x;
                let fragment = &fragments[index];

                if fragment.is_background || fragment.is_light {
                    *pixel = pack_rgba(&fragment.color);
                    continue;
                }

                let mut total = Vector3::repeat(ambient);
                for light in lights {
                    total += light_contribution(
                        light,
                        &fragment.position,
                        &fragment.normal,
                        &view_dirs[index],
                        fragment.shininess,
                    );
                }

                *pixel = pack_rgba(&total.component_mul(&fragment.color));
            }
        });
}

/// Diffuse + specular contribution of a single light at a surface sample.
fn light_contribution(
    light: &CollectedLight,
    position: &Vector3<f32>,
    normal: &Vector3<f32>,
    view_dir: &Vector3<f32>,
    shininess: f32,
) -> Vector3<f32> {
    let to_light = light.position - position;
    let dist_sq = to_light.norm_squared();
    if dist_sq < EPSILON {
        return Vector3::zeros();
    }

    let attenuated = light.color * (light.intensity / dist_sq);
    let light_dir = to_light / dist_sq.sqrt();

    let diffuse = attenuated * normal.dot(&light_dir).max(0.0);

    // reflect(l, n) = 2 (n.l) n - l; the (1 - 1/shininess) factor tempers
    // the peak so low-shininess materials do not oversaturate.
    let reflected = normal * (2.0 * normal.dot(&light_dir)) - light_dir;
    let temper = (1.0 - 1.0 / shininess.max(1.0)).max(0.0);
    let specular = attenuated * reflected.dot(view_dir).max(0.0).powf(shininess) * temper;

    diffuse + specular
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::color::unpack_rgba;
    use crate::core::framebuffer::Fragment;

    fn buffer_with_fragment(fragment: Fragment) -> FrameBuffer {
        let mut fb = FrameBuffer::new(1, 1).unwrap();
        fb.update_view_dirs(60.0_f32.to_radians());
        fb.fragments[0] = fragment;
        fb
    }

    fn surface_fragment() -> Fragment {
        Fragment {
            depth: 0.5,
            color: Vector3::new(1.0, 1.0, 1.0),
            normal: Vector3::new(0.0, 0.0, 1.0),
            position: Vector3::new(0.0, 0.0, -2.0),
            shininess: 32.0,
            is_light: false,
            is_background: false,
        }
    }

    #[test]
    fn light_source_fragment_keeps_its_flat_color() {
        let mut fragment = surface_fragment();
        fragment.is_light = true;
        fragment.color = Vector3::new(1.0, 0.0, 0.0);
        let mut fb = buffer_with_fragment(fragment);

        // A bright light nearby must not alter the emitter's own color.
        let lights = [CollectedLight {
            position: Vector3::new(0.0, 0.0, 0.0),
            color: Vector3::new(0.0, 1.0, 0.0),
            intensity: 1000.0,
        }];
        shade(&mut fb, &lights, 0.5);

        assert_eq!(unpack_rgba(fb.pixels[0]), [255, 0, 0, 255]);
    }

    #[test]
    fn background_fragment_passes_through() {
        let mut fb = FrameBuffer::new(1, 1).unwrap();
        fb.update_view_dirs(60.0_f32.to_radians());
        fb.reset(Vector3::new(0.0, 0.0, 1.0));

        shade(&mut fb, &[], 1.0);
        assert_eq!(unpack_rgba(fb.pixels[0]), [0, 0, 255, 255]);
    }

    #[test]
    fn no_lights_leaves_ambient_only() {
        let mut fb = buffer_with_fragment(surface_fragment());
        shade(&mut fb, &[], 0.25);

        let [r, g, b, _] = unpack_rgba(fb.pixels[0]);
        assert_eq!(r, 63);
        assert_eq!(g, 63);
        assert_eq!(b, 63);
    }

    #[test]
    fn head_on_light_saturates_at_unit_attenuation() {
        // Fragment 2 units away, intensity 4: attenuation 4 / 2^2 = 1 and
        // the light is dead ahead of the normal, so diffuse alone reaches 1.
        let mut fb = buffer_with_fragment(surface_fragment());
        let lights = [CollectedLight {
            position: Vector3::new(0.0, 0.0, 0.0),
            color: Vector3::new(1.0, 1.0, 1.0),
            intensity: 4.0,
        }];
        shade(&mut fb, &lights, 0.0);

        let [r, g, b, _] = unpack_rgba(fb.pixels[0]);
        assert_eq!(r, 255);
        assert_eq!(g, 255);
        assert_eq!(b, 255);
    }

    #[test]
    fn light_behind_surface_adds_nothing() {
        let mut fb = buffer_with_fragment(surface_fragment());
        let lights = [CollectedLight {
            position: Vector3::new(0.0, 0.0, -10.0), // Behind the surface.
            color: Vector3::new(1.0, 1.0, 1.0),
            intensity: 100.0,
        }];
        shade(&mut fb, &lights, 0.0);

        // Diffuse clamps at zero and the specular lobe cannot fire either.
        let [r, _, _, _] = unpack_rgba(fb.pixels[0]);
        assert_eq!(r, 0);
    }
}
