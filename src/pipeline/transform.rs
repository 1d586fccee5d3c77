use crate::core::math::transform::{TransformFactory, apply_perspective_division, ndc_to_screen};
use crate::core::rasterizer::ScreenVertex;
use crate::scene::mesh::Mesh;
use nalgebra::{Matrix3, Matrix4, Vector2, Vector3, Vector4};
use std::collections::HashMap;

const EPSILON: f32 = 1e-6;

/// A mesh corner after the vertex stage: clip-space position plus the
/// view-space attributes that will be interpolated across triangles.
#[derive(Debug, Clone, Copy)]
pub struct RenderVertex {
    pub clip: Vector4<f32>,
    pub view: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub uv: Vector2<f32>,
}

/// Per-frame arena for transient vertex records.
///
/// Faces reference vertices by index into this arena instead of by pointer;
/// clipping appends synthesized vertices, and the whole arena is discarded in
/// one `clear` at the start of the next object instead of freeing records
/// individually. The backing allocation is reused across objects and frames.
#[derive(Default)]
pub struct VertexArena {
    vertices: Vec<RenderVertex>,
}

impl VertexArena {
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn push(&mut self, vertex: RenderVertex) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    #[inline]
    pub fn get(&self, index: usize) -> &RenderVertex {
        &self.vertices[index]
    }
}

/// The per-object matrices of the vertex stage, composed once per object
/// rather than once per vertex.
pub struct ObjectTransforms {
    pub model_view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    /// Inverse-transpose of the full local-to-view linear map (rotation and
    /// non-uniform scale included), so normals stay perpendicular under
    /// non-uniform scale. Falls back to the plain rotation block when the
    /// map is singular (e.g. a zero scale axis).
    pub normal_matrix: Matrix3<f32>,
    pub scale: Vector3<f32>,
}

impl ObjectTransforms {
    pub fn new(
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
        position: &Vector3<f32>,
        euler_degrees: &Vector3<f32>,
        scale: &Vector3<f32>,
    ) -> Self {
        let model_view = view * TransformFactory::model(position, euler_degrees);
        let rotation: Matrix3<f32> = model_view.fixed_view::<3, 3>(0, 0).into();
        let linear = rotation * Matrix3::from_diagonal(scale);
        let normal_matrix = linear
            .try_inverse()
            .map(|inv| inv.transpose())
            .unwrap_or(rotation);

        Self {
            model_view,
            projection: *projection,
            normal_matrix,
            scale: *scale,
        }
    }

    /// Transforms one mesh corner into a render vertex: scale applied to the
    /// local position, model-view to reach view space, projection to reach
    /// clip space, and the normal matrix for the normal.
    fn transform(&self, position: &Vector3<f32>, normal: &Vector3<f32>, uv: Vector2<f32>) -> RenderVertex {
        let scaled = position.component_mul(&self.scale);
        let view4 = self.model_view * Vector4::new(scaled.x, scaled.y, scaled.z, 1.0);
        let view = view4.xyz();
        let clip = self.projection * view4;
        let normal = (self.normal_matrix * normal)
            .try_normalize(EPSILON)
            .unwrap_or(*normal);

        RenderVertex {
            clip,
            view,
            normal,
            uv,
        }
    }
}

/// Runs the vertex stage for one object: deduplicates mesh corners into the
/// arena, transforms each unique corner exactly once, and clips every face
/// against the near plane. Output triangles are arena index triples.
///
/// Corners are deduplicated by their (position, normal, uv) index triple so
/// shared edges interpolate consistently. Meshes without normals get a flat
/// normal synthesized per face from two edges; those corners are deliberately
/// *not* shared between faces (flat shading needs unshared normals).
pub fn assemble_and_clip(
    mesh: &Mesh,
    transforms: &ObjectTransforms,
    arena: &mut VertexArena,
    triangles: &mut Vec<[usize; 3]>,
) {
    let positions = mesh.positions();
    let normals = mesh.normals();
    let uvs = mesh.uvs();

    let mut dedup: HashMap<(usize, usize, usize), usize> = HashMap::new();

    for face in mesh.faces() {
        let tri = if mesh.has_normals() {
            face.map(|corner| {
                *dedup
                    .entry((corner.position, corner.normal, corner.uv))
                    .or_insert_with(|| {
                        let normal = normals[corner.normal];
                        let uv = if mesh.has_uvs() {
                            uvs[corner.uv]
                        } else {
                            Vector2::zeros()
                        };
                        arena.push(transforms.transform(&positions[corner.position], &normal, uv))
                    })
            })
        } else {
            // Flat shading: synthesize the face normal from two edges and
            // keep these corners private to this face.
            let p0 = positions[face[0].position];
            let p1 = positions[face[1].position];
            let p2 = positions[face[2].position];
            let Some(flat) = (p1 - p0).cross(&(p2 - p0)).try_normalize(EPSILON) else {
                continue; // Degenerate face, nothing to rasterize anyway.
            };

            face.map(|corner| {
                let uv = if mesh.has_uvs() {
                    uvs[corner.uv]
                } else {
                    Vector2::zeros()
                };
                arena.push(transforms.transform(&positions[corner.position], &flat, uv))
            })
        };

        clip_triangle_near(arena, tri, triangles);
    }
}

/// Clips one triangle against the near plane in homogeneous clip space.
///
/// The visible half-space is `clip.z > 0` — this pairs exactly with the sign
/// convention of [`TransformFactory::perspective`]. Edges crossing the plane
/// get a synthesized vertex at `t = z_a / (z_a - z_b)`, the z = 0 crossing,
/// with position, view position, normal and UV linearly interpolated.
///
/// Outputs zero triangles (fully behind), the triangle unchanged (fully in
/// front), or one/two triangles from the clipped polygon (quad split along
/// its diagonal).
pub fn clip_triangle_near(
    arena: &mut VertexArena,
    tri: [usize; 3],
    triangles: &mut Vec<[usize; 3]>,
) {
    let inside = |arena: &VertexArena, i: usize| arena.get(i).clip.z > 0.0;

    // Single-plane Sutherland-Hodgman pass; a triangle yields at most 4
    // polygon vertices.
    let mut poly = [0usize; 4];
    let mut count = 0;

    for e in 0..3 {
        let curr = tri[e];
        let prev = tri[(e + 2) % 3];
        let (ci, pi) = (inside(arena, curr), inside(arena, prev));

        if ci != pi {
            let za = arena.get(prev).clip.z;
            let zb = arena.get(curr).clip.z;
            // Coincident z means no real crossing; skip the synthesized vertex.
            if (za - zb).abs() >= EPSILON {
                let t = za / (za - zb);
                let v = lerp_vertex(arena.get(prev), arena.get(curr), t);
                poly[count] = arena.push(v);
                count += 1;
            }
        }
        if ci {
            poly[count] = curr;
            count += 1;
        }
    }

    match count {
        3 => triangles.push([poly[0], poly[1], poly[2]]),
        4 => {
            triangles.push([poly[0], poly[1], poly[2]]);
            triangles.push([poly[0], poly[2], poly[3]]);
        }
        _ => {}
    }
}

fn lerp_vertex(a: &RenderVertex, b: &RenderVertex, t: f32) -> RenderVertex {
    RenderVertex {
        clip: a.clip + (b.clip - a.clip) * t,
        view: a.view + (b.view - a.view) * t,
        normal: a.normal + (b.normal - a.normal) * t,
        uv: a.uv + (b.uv - a.uv) * t,
    }
}

/// Maps a clipped arena vertex to screen coordinates. Returns `None` when the
/// homogeneous w is too small to divide by (the triangle is skipped).
pub fn to_screen(vertex: &RenderVertex, width: usize, height: usize) -> Option<ScreenVertex> {
    let w = vertex.clip.w;
    if w.abs() < EPSILON {
        return None;
    }

    let ndc = apply_perspective_division(&vertex.clip);
    let screen = ndc_to_screen(ndc.x, ndc.y, width as f32, height as f32);

    Some(ScreenVertex {
        x: screen.x,
        y: screen.y,
        depth: ndc.z,
        view_z: w,
        view_pos: vertex.view,
        normal: vertex.normal,
        uv: vertex.uv,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::mesh::Mesh;
    use approx::assert_relative_eq;
    use nalgebra::Matrix4;

    fn identity_transforms() -> ObjectTransforms {
        ObjectTransforms::new(
            &Matrix4::identity(),
            &TransformFactory::perspective(1.0, 90.0_f32.to_radians(), 1.0, 100.0),
            &Vector3::zeros(),
            &Vector3::zeros(),
            &Vector3::new(1.0, 1.0, 1.0),
        )
    }

    /// One triangle at the given view-space depths (negative z is in front
    /// of the camera).
    fn triangle_at(depths: [f32; 3]) -> Mesh {
        let positions = vec![
            Vector3::new(-1.0, -1.0, depths[0]),
            Vector3::new(1.0, -1.0, depths[1]),
            Vector3::new(0.0, 1.0, depths[2]),
        ];
        Mesh::from_positions(positions, vec![[0, 1, 2]]).unwrap()
    }

    fn run(mesh: &Mesh) -> (VertexArena, Vec<[usize; 3]>) {
        let mut arena = VertexArena::default();
        let mut triangles = Vec::new();
        assemble_and_clip(mesh, &identity_transforms(), &mut arena, &mut triangles);
        (arena, triangles)
    }

    #[test]
    fn fully_visible_triangle_passes_unchanged() {
        let (arena, triangles) = run(&triangle_at([-5.0, -5.0, -5.0]));
        assert_eq!(triangles.len(), 1);
        // No synthesized vertices: the three flat-shaded corners only.
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn fully_behind_triangle_is_discarded() {
        let (_, triangles) = run(&triangle_at([-0.5, -0.5, -0.2]));
        assert!(triangles.is_empty());
    }

    #[test]
    fn one_corner_behind_yields_two_triangles() {
        let (arena, triangles) = run(&triangle_at([-5.0, -5.0, -0.5]));
        assert_eq!(triangles.len(), 2);

        // Every surviving corner sits on or in front of the near plane.
        for tri in &triangles {
            for &i in tri {
                assert!(arena.get(i).clip.z > -1e-4);
            }
        }
    }

    #[test]
    fn two_corners_behind_yield_one_triangle() {
        let (_, triangles) = run(&triangle_at([-5.0, -0.5, -0.5]));
        assert_eq!(triangles.len(), 1);
    }

    #[test]
    fn synthesized_vertices_sit_on_the_near_plane() {
        let (arena, triangles) = run(&triangle_at([-5.0, -0.5, -0.5]));
        let tri = triangles[0];

        let mut on_plane = 0;
        for &i in &tri {
            if arena.get(i).clip.z.abs() < 1e-4 {
                on_plane += 1;
            }
        }
        assert_eq!(on_plane, 2);
    }

    #[test]
    fn shared_corners_are_deduplicated() {
        // A plane has 4 unique (position, normal, uv) triples across its
        // 2 faces / 6 corners.
        let mesh = Mesh::plane();
        let mut arena = VertexArena::default();
        let mut triangles = Vec::new();

        let transforms = ObjectTransforms::new(
            &TransformFactory::translation(&Vector3::new(0.0, 0.0, -5.0)),
            &TransformFactory::perspective(1.0, 90.0_f32.to_radians(), 0.1, 100.0),
            &Vector3::zeros(),
            &Vector3::new(90.0, 0.0, 0.0), // Face the camera.
            &Vector3::new(1.0, 1.0, 1.0),
        );
        assemble_and_clip(&mesh, &transforms, &mut arena, &mut triangles);

        assert_eq!(arena.len(), 4);
        assert_eq!(triangles.len(), 2);
    }

    #[test]
    fn flat_shaded_corners_stay_private_per_face() {
        // The cube mesh has no normals: every face owns its 3 corners, so
        // 12 faces produce 36 arena vertices.
        let mesh = Mesh::cube();
        let mut arena = VertexArena::default();
        let mut triangles = Vec::new();

        let transforms = ObjectTransforms::new(
            &TransformFactory::translation(&Vector3::new(0.0, 0.0, -5.0)),
            &TransformFactory::perspective(1.0, 90.0_f32.to_radians(), 0.1, 100.0),
            &Vector3::zeros(),
            &Vector3::zeros(),
            &Vector3::new(1.0, 1.0, 1.0),
        );
        assemble_and_clip(&mesh, &transforms, &mut arena, &mut triangles);

        assert_eq!(arena.len(), 36);
        assert_eq!(triangles.len(), 12);
    }

    #[test]
    fn nonuniform_scale_keeps_normals_perpendicular() {
        // A unit sphere squashed on Y: at the "equator" point (1, 0, 0) the
        // correct normal is still (1, 0, 0) in view space, while at a 45
        // degree latitude the naive rotated normal would be wrong.
        let transforms = ObjectTransforms::new(
            &Matrix4::identity(),
            &TransformFactory::perspective(1.0, 1.0, 0.1, 100.0),
            &Vector3::zeros(),
            &Vector3::zeros(),
            &Vector3::new(1.0, 0.25, 1.0),
        );

        let n = Vector3::new(1.0, 1.0, 0.0).normalize();
        let transformed = (transforms.normal_matrix * n).normalize();

        // Squashing in Y tilts surface normals *toward* the Y axis's
        // reciprocal: the y component must grow, not shrink.
        assert!(transformed.y > n.y);
        assert_relative_eq!(transformed.norm(), 1.0, epsilon = 1e-5);
    }
}
