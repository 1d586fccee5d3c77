use crate::core::framebuffer::{Fragment, FrameBuffer};
use crate::core::math::interpolation::{
    BaryWeights, blend_weights, corner_weight, perspective_correct,
};
use crate::scene::texture::Texture;
use nalgebra::{Vector2, Vector3};

const EPSILON: f32 = 1e-6;

/// A triangle corner after projection and viewport mapping, carrying the
/// view-space attributes that survive into fragments.
#[derive(Debug, Clone, Copy)]
pub struct ScreenVertex {
    /// Screen position in pixels.
    pub x: f32,
    pub y: f32,
    /// NDC depth (0 at the near plane, 1 at the far plane). Linear in screen
    /// space, so it interpolates with uncorrected weights.
    pub depth: f32,
    /// View-space distance along the camera axis; divisor for perspective
    /// correction.
    pub view_z: f32,
    pub view_pos: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub uv: Vector2<f32>,
}

/// How a primitive's fragments are classified downstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimitiveFlags {
    /// Light-source geometry: shading passes the sampled color through.
    pub is_light: bool,
    /// Background/skybox geometry: bypasses the depth test and back-face
    /// rejection, never writes depth, and always loses to real geometry.
    pub is_background: bool,
}

/// Scan-converts one screen-space triangle into the fragment buffer.
///
/// Two-slope scanline fill: corners are sorted by ascending screen y, each
/// raster row is bounded by the long edge (top to bottom corner) and the
/// active short edge, and barycentric weight triples are carried along the
/// edges and blended across the row. Attributes are interpolated with
/// perspective-corrected weights; screen depth with the uncorrected ones.
///
/// Degenerate input (zero-height triangle, zero-length span, zero view depth)
/// rasterizes to nothing; a bad primitive never aborts the frame.
pub fn rasterize_triangle(
    fb: &mut FrameBuffer,
    verts: &[ScreenVertex; 3],
    texture: &Texture,
    shininess: f32,
    flags: PrimitiveFlags,
) {
    // Sort corner indices by screen y; weight triples keep referring to the
    // original (a, b, c) order so attribute lookups stay stable.
    let mut order = [0usize, 1, 2];
    order.sort_by(|&i, &j| verts[i].y.total_cmp(&verts[j].y));
    let [top, mid, bot] = order;

    let (va, wa) = (&verts[top], corner_weight(top));
    let (vb, wb) = (&verts[mid], corner_weight(mid));
    let (vc, wc) = (&verts[bot], corner_weight(bot));

    if (vc.y - va.y).abs() < EPSILON {
        return; // Zero-height triangle.
    }

    let y_start = ((va.y - 0.5).ceil() as i32).max(0);
    let y_end = ((vc.y - 0.5).floor() as i32).min(fb.height as i32 - 1);

    for y in y_start..=y_end {
        let yc = y as f32 + 0.5;

        let Some(long) = edge_intersection(va, vc, &wa, &wc, yc) else {
            continue;
        };

        // Pick the active short edge for this row, falling back across a
        // flat top or flat bottom.
        let short = if yc < vb.y {
            edge_intersection(va, vb, &wa, &wb, yc)
                .or_else(|| edge_intersection(vb, vc, &wb, &wc, yc))
        } else {
            edge_intersection(vb, vc, &wb, &wc, yc)
                .or_else(|| edge_intersection(va, vb, &wa, &wb, yc))
        };
        let Some(short) = short else { continue };

        let (left, right) = if long.0 <= short.0 {
            (long, short)
        } else {
            (short, long)
        };

        fill_span(fb, verts, texture, shininess, flags, y as usize, left, right);
    }
}

/// Intersects an edge with the horizontal line through a row of pixel
/// centers, yielding the x-coordinate and blended weight triple.
/// Returns `None` for rows a degenerate (near-horizontal) edge cannot bound.
fn edge_intersection(
    v0: &ScreenVertex,
    v1: &ScreenVertex,
    w0: &BaryWeights,
    w1: &BaryWeights,
    yc: f32,
) -> Option<(f32, BaryWeights)> {
    let dy = v1.y - v0.y;
    if dy.abs() < EPSILON {
        return None;
    }
    let t = ((yc - v0.y) / dy).clamp(0.0, 1.0);
    let x = v0.x + (v1.x - v0.x) * t;
    Some((x, blend_weights(w0, w1, t)))
}

#[allow(clippy::too_many_arguments)]
fn fill_span(
    fb: &mut FrameBuffer,
    verts: &[ScreenVertex; 3],
    texture: &Texture,
    shininess: f32,
    flags: PrimitiveFlags,
    y: usize,
    (xl, wl): (f32, BaryWeights),
    (xr, wr): (f32, BaryWeights),
) {
    let x_start = ((xl - 0.5).ceil() as i32).max(0);
    let x_end = ((xr - 0.5).floor() as i32).min(fb.width as i32 - 1);
    let span = xr - xl;

    for x in x_start..=x_end {
        let xc = x as f32 + 0.5;
        let s = if span.abs() < EPSILON {
            0.0
        } else {
            (xc - xl) / span
        };
        let weights = blend_weights(&wl, &wr, s);

        // Screen depth interpolates with the uncorrected weights.
        let depth =
            weights.x * verts[0].depth + weights.y * verts[1].depth + weights.z * verts[2].depth;

        let index = fb.index(x as usize, y);

        if flags.is_background {
            // Skybox: no depth test, no depth write, no back-face check.
            let corrected =
                perspective_correct(&weights, verts[0].view_z, verts[1].view_z, verts[2].view_z)
                    .unwrap_or(weights);
            let uv = interpolate_uv(verts, &corrected);
            let fragment = &mut fb.fragments[index];
            fragment.color = texture.sample(uv.x, uv.y);
            fragment.is_background = true;
            continue;
        }

        if depth >= fb.fragments[index].depth {
            continue; // An earlier, nearer surface owns this pixel.
        }

        let Some(corrected) =
            perspective_correct(&weights, verts[0].view_z, verts[1].view_z, verts[2].view_z)
        else {
            continue;
        };

        let normal = verts[0].normal * corrected.x
            + verts[1].normal * corrected.y
            + verts[2].normal * corrected.z;
        let Some(normal) = normal.try_normalize(EPSILON) else {
            continue;
        };

        // The surface faces away from the camera at this pixel.
        if normal.dot(&fb.view_dirs[index]) < 0.0 {
            continue;
        }

        let position = verts[0].view_pos * corrected.x
            + verts[1].view_pos * corrected.y
            + verts[2].view_pos * corrected.z;
        let uv = interpolate_uv(verts, &corrected);

        fb.fragments[index] = Fragment {
            depth,
            color: texture.sample(uv.x, uv.y),
            normal,
            position,
            shininess,
            is_light: flags.is_light,
            is_background: false,
        };
    }
}

#[inline(always)]
fn interpolate_uv(verts: &[ScreenVertex; 3], weights: &BaryWeights) -> Vector2<f32> {
    verts[0].uv * weights.x + verts[1].uv * weights.y + verts[2].uv * weights.z
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn screen_vertex(x: f32, y: f32, depth: f32) -> ScreenVertex {
        ScreenVertex {
            x,
            y,
            depth,
            view_z: 1.0,
            view_pos: Vector3::new(0.0, 0.0, -1.0),
            normal: Vector3::new(0.0, 0.0, 1.0),
            uv: Vector2::zeros(),
        }
    }

    fn buffer() -> FrameBuffer {
        let mut fb = FrameBuffer::new(16, 16).unwrap();
        fb.update_view_dirs(90.0_f32.to_radians());
        fb.reset(Vector3::zeros());
        fb
    }

    #[test]
    fn covers_interior_pixels() {
        let mut fb = buffer();
        let tri = [
            screen_vertex(1.0, 1.0, 0.5),
            screen_vertex(14.0, 1.0, 0.5),
            screen_vertex(1.0, 14.0, 0.5),
        ];
        rasterize_triangle(&mut fb, &tri, &Texture::color(Vector3::new(1.0, 0.0, 0.0)), 32.0, PrimitiveFlags::default());

        let center = fb.fragments[fb.index(4, 4)];
        assert!(!center.is_background);
        assert_relative_eq!(center.depth, 0.5);
        assert_relative_eq!(center.color.x, 1.0);

        // A pixel outside the hypotenuse stays untouched.
        assert!(fb.fragments[fb.index(14, 14)].is_background);
    }

    #[test]
    fn closer_triangle_wins_regardless_of_order() {
        let red = Texture::color(Vector3::new(1.0, 0.0, 0.0));
        let blue = Texture::color(Vector3::new(0.0, 0.0, 1.0));
        let tri_near = [
            screen_vertex(0.0, 0.0, 0.2),
            screen_vertex(15.0, 0.0, 0.2),
            screen_vertex(0.0, 15.0, 0.2),
        ];
        let tri_far = [
            screen_vertex(0.0, 0.0, 0.8),
            screen_vertex(15.0, 0.0, 0.8),
            screen_vertex(0.0, 15.0, 0.8),
        ];

        let mut fb = buffer();
        rasterize_triangle(&mut fb, &tri_near, &red, 32.0, PrimitiveFlags::default());
        rasterize_triangle(&mut fb, &tri_far, &blue, 32.0, PrimitiveFlags::default());
        let first = fb.fragments[fb.index(3, 3)];

        let mut fb = buffer();
        rasterize_triangle(&mut fb, &tri_far, &blue, 32.0, PrimitiveFlags::default());
        rasterize_triangle(&mut fb, &tri_near, &red, 32.0, PrimitiveFlags::default());
        let second = fb.fragments[fb.index(3, 3)];

        assert_relative_eq!(first.color.x, 1.0);
        assert_relative_eq!(second.color.x, 1.0);
        assert_relative_eq!(first.depth, second.depth);
    }

    #[test]
    fn zero_area_triangle_draws_nothing() {
        let mut fb = buffer();
        let tri = [
            screen_vertex(2.0, 5.0, 0.5),
            screen_vertex(9.0, 5.0, 0.5),
            screen_vertex(13.0, 5.0, 0.5),
        ];
        rasterize_triangle(&mut fb, &tri, &Texture::color(Vector3::new(1.0, 1.0, 1.0)), 32.0, PrimitiveFlags::default());

        assert!(fb.fragments.iter().all(|f| f.is_background));
    }

    #[test]
    fn back_facing_fragments_are_rejected() {
        let mut fb = buffer();
        let mut tri = [
            screen_vertex(1.0, 1.0, 0.5),
            screen_vertex(14.0, 1.0, 0.5),
            screen_vertex(1.0, 14.0, 0.5),
        ];
        for v in &mut tri {
            v.normal = Vector3::new(0.0, 0.0, -1.0); // Facing away.
        }
        rasterize_triangle(&mut fb, &tri, &Texture::color(Vector3::new(1.0, 1.0, 1.0)), 32.0, PrimitiveFlags::default());

        assert!(fb.fragments.iter().all(|f| f.is_background));
    }

    #[test]
    fn background_never_writes_depth() {
        let mut fb = buffer();
        let tri = [
            screen_vertex(0.0, 0.0, 0.1),
            screen_vertex(15.0, 0.0, 0.1),
            screen_vertex(0.0, 15.0, 0.1),
        ];
        let flags = PrimitiveFlags {
            is_light: false,
            is_background: true,
        };
        rasterize_triangle(&mut fb, &tri, &Texture::color(Vector3::new(0.2, 0.4, 0.6)), 32.0, flags);

        let frag = fb.fragments[fb.index(3, 3)];
        assert!(frag.is_background);
        assert!(frag.depth.is_infinite());
        assert_relative_eq!(frag.color.z, 0.6);
    }
}
