use nalgebra::Vector3;

const EPSILON: f32 = 1e-6;

/// Barycentric weight triples used by the scanline rasterizer.
///
/// A weight triple expresses a point as a combination of the three original
/// triangle corners (a, b, c). Corner weights are the unit triples; weights at
/// edge intersections and along pixel spans are linear blends of them, so the
/// components always sum to 1.
pub type BaryWeights = Vector3<f32>;

/// The unit weight triple for corner `i` (0 = a, 1 = b, 2 = c).
#[inline(always)]
pub fn corner_weight(i: usize) -> BaryWeights {
    let mut w = Vector3::zeros();
    w[i] = 1.0;
    w
}

/// Blends two weight triples. Used both along triangle edges (per row) and
/// along the pixel span between the two edge intersections.
#[inline(always)]
pub fn blend_weights(a: &BaryWeights, b: &BaryWeights, t: f32) -> BaryWeights {
    a + (b - a) * t
}

/// Corrects screen-space-linear barycentric weights for perspective.
///
/// Screen-space interpolation of attributes is not perspective-correct; the
/// correction divides each weight by that corner's view-space depth and
/// renormalizes:
///   wa' = (wa / za) / sum, ...
///
/// The *uncorrected* weights remain the right choice for interpolating screen
/// depth, which is itself linear in screen space.
///
/// Returns `None` when a corner depth or the weight sum is too close to zero
/// to divide safely (the affected pixel is skipped).
pub fn perspective_correct(
    weights: &BaryWeights,
    za: f32,
    zb: f32,
    zc: f32,
) -> Option<BaryWeights> {
    if za.abs() < EPSILON || zb.abs() < EPSILON || zc.abs() < EPSILON {
        return None;
    }

    let wa = weights.x / za;
    let wb = weights.y / zb;
    let wc = weights.z / zc;

    let sum = wa + wb + wc;
    if sum.abs() < EPSILON {
        return None;
    }

    let inv_sum = 1.0 / sum;
    Some(Vector3::new(wa * inv_sum, wb * inv_sum, wc * inv_sum))
}
