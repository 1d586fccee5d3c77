use nalgebra::{Vector2, Vector3};
use std::f32::consts::TAU;

/// One corner of a triangle face: indices into the mesh's position, normal
/// and UV arrays. The normal/uv indices are meaningless when the mesh does
/// not carry the corresponding array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Corner {
    pub position: usize,
    pub normal: usize,
    pub uv: usize,
}

impl Corner {
    fn position_only(position: usize) -> Self {
        Self {
            position,
            normal: 0,
            uv: 0,
        }
    }
}

/// An immutable triangle mesh: deduplicated vertex positions, optional
/// per-vertex normals and UVs, and a face table of corner index triples.
///
/// Built once by a procedural generator or a loader, then consumed read-only
/// by the render stage for the lifetime of the owning object. Construction
/// validates that every face index is in bounds, so downstream stages index
/// the arrays without re-checking.
#[derive(Debug, Clone)]
pub struct Mesh {
    positions: Vec<Vector3<f32>>,
    normals: Vec<Vector3<f32>>,
    uvs: Vec<Vector2<f32>>,
    faces: Vec<[Corner; 3]>,
}

impl Mesh {
    /// Creates a mesh from full attribute arrays. `normals` and `uvs` may be
    /// empty; faces referencing an absent array are fine (those indices are
    /// ignored), but an index into a *present* array must be in bounds.
    pub fn new(
        positions: Vec<Vector3<f32>>,
        normals: Vec<Vector3<f32>>,
        uvs: Vec<Vector2<f32>>,
        faces: Vec<[Corner; 3]>,
    ) -> Result<Self, String> {
        for (i, face) in faces.iter().enumerate() {
            for corner in face {
                if corner.position >= positions.len() {
                    return Err(format!(
                        "face {}: position index {} out of bounds ({} positions)",
                        i,
                        corner.position,
                        positions.len()
                    ));
                }
                if !normals.is_empty() && corner.normal >= normals.len() {
                    return Err(format!(
                        "face {}: normal index {} out of bounds ({} normals)",
                        i,
                        corner.normal,
                        normals.len()
                    ));
                }
                if !uvs.is_empty() && corner.uv >= uvs.len() {
                    return Err(format!(
                        "face {}: uv index {} out of bounds ({} uvs)",
                        i,
                        corner.uv,
                        uvs.len()
                    ));
                }
            }
        }

        Ok(Self {
            positions,
            normals,
            uvs,
            faces,
        })
    }

    /// Creates a position-only mesh (no normals, no UVs) from plain index
    /// triples. The renderer flat-shades such meshes.
    pub fn from_positions(
        positions: Vec<Vector3<f32>>,
        faces: Vec<[usize; 3]>,
    ) -> Result<Self, String> {
        let faces = faces
            .into_iter()
            .map(|f| f.map(Corner::position_only))
            .collect();
        Self::new(positions, Vec::new(), Vec::new(), faces)
    }

    pub fn positions(&self) -> &[Vector3<f32>] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vector3<f32>] {
        &self.normals
    }

    pub fn uvs(&self) -> &[Vector2<f32>] {
        &self.uvs
    }

    pub fn faces(&self) -> &[[Corner; 3]] {
        &self.faces
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    /// Unit cube centered at the origin. Carries no normals: faces are
    /// flat-shaded, which is exactly right for hard cube edges.
    pub fn cube() -> Self {
        let mut positions = Vec::with_capacity(8);
        for i in 0..2 {
            for j in 0..2 {
                for k in 0..2 {
                    positions.push(Vector3::new(
                        i as f32 - 0.5,
                        j as f32 - 0.5,
                        k as f32 - 0.5,
                    ));
                }
            }
        }

        // Wound so that (p1-p0) x (p2-p0) points outward on every face.
        let faces = vec![
            [0, 1, 3],
            [3, 2, 0],
            [0, 2, 6],
            [6, 4, 0],
            [0, 4, 5],
            [5, 1, 0],
            [1, 5, 7],
            [7, 3, 1],
            [2, 3, 7],
            [7, 6, 2],
            [5, 4, 6],
            [6, 7, 5],
        ];

        Self::from_positions(positions, faces).expect("cube mesh is statically valid")
    }

    /// Unit quad in the XZ plane facing +Y, with UVs spanning it once.
    pub fn plane() -> Self {
        let positions = vec![
            Vector3::new(-0.5, 0.0, -0.5),
            Vector3::new(0.5, 0.0, -0.5),
            Vector3::new(0.5, 0.0, 0.5),
            Vector3::new(-0.5, 0.0, 0.5),
        ];
        let normals = vec![Vector3::new(0.0, 1.0, 0.0)];
        let uvs = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(0.0, 1.0),
        ];

        let corner = |position: usize| Corner {
            position,
            normal: 0,
            uv: position,
        };
        let faces = vec![
            [corner(0), corner(2), corner(1)],
            [corner(0), corner(3), corner(2)],
        ];

        Mesh::new(positions, normals, uvs, faces).expect("plane mesh is statically valid")
    }

    /// Unit sphere from a latitude/longitude grid: `resolution` stacks and
    /// `2 * resolution` slices, with analytic normals and equirectangular
    /// UVs (seam column duplicated for clean wrapping).
    pub fn sphere(resolution: usize) -> Self {
        let stacks = resolution.max(2);
        let slices = stacks * 2;

        let mut positions = Vec::new();
        let mut uvs = Vec::new();
        for i in 0..=stacks {
            let theta = std::f32::consts::PI * i as f32 / stacks as f32;
            let (sin_t, cos_t) = theta.sin_cos();
            for j in 0..=slices {
                let phi = TAU * j as f32 / slices as f32;
                let (sin_p, cos_p) = phi.sin_cos();
                positions.push(Vector3::new(sin_t * sin_p, cos_t, sin_t * cos_p));
                uvs.push(Vector2::new(
                    j as f32 / slices as f32,
                    1.0 - i as f32 / stacks as f32,
                ));
            }
        }
        // Unit sphere: the normal at each vertex is the vertex itself.
        let normals = positions.clone();

        let mut faces = Vec::new();
        let ring = slices + 1;
        let corner = |index: usize| Corner {
            position: index,
            normal: index,
            uv: index,
        };
        for i in 0..stacks {
            for j in 0..slices {
                let a = i * ring + j;
                let b = a + ring;
                let c = b + 1;
                let d = a + 1;
                // The cells touching a pole collapse one triangle each.
                if i != stacks - 1 {
                    faces.push([corner(a), corner(b), corner(c)]);
                }
                if i != 0 {
                    faces.push([corner(a), corner(c), corner(d)]);
                }
            }
        }

        Mesh::new(positions, normals, uvs, faces).expect("sphere mesh is statically valid")
    }

    /// Torus around the Y axis with major radius 1 and the given tube
    /// `thickness`; analytic normals, UVs wrapping once around each way.
    pub fn torus(thickness: f32, resolution: usize) -> Self {
        let rings = resolution.max(3);
        let tube = resolution.max(3);

        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut uvs = Vec::new();
        for i in 0..=rings {
            let alpha = TAU * i as f32 / rings as f32;
            let (sin_a, cos_a) = alpha.sin_cos();
            for j in 0..=tube {
                let beta = TAU * j as f32 / tube as f32;
                let (sin_b, cos_b) = beta.sin_cos();
                let normal = Vector3::new(cos_b * cos_a, sin_b, cos_b * sin_a);
                positions.push(Vector3::new(cos_a, 0.0, sin_a) + normal * thickness);
                normals.push(normal);
                uvs.push(Vector2::new(i as f32 / rings as f32, j as f32 / tube as f32));
            }
        }

        let mut faces = Vec::new();
        let ring = tube + 1;
        let corner = |index: usize| Corner {
            position: index,
            normal: index,
            uv: index,
        };
        for i in 0..rings {
            for j in 0..tube {
                let a = i * ring + j;
                let b = a + ring;
                let c = b + 1;
                let d = a + 1;
                faces.push([corner(a), corner(b), corner(c)]);
                faces.push([corner(a), corner(c), corner(d)]);
            }
        }

        Mesh::new(positions, normals, uvs, faces).expect("torus mesh is statically valid")
    }

    /// Sphere used as a panoramic background: rendered around the camera
    /// with an equirectangular texture, depth test bypassed.
    pub fn skybox() -> Self {
        Self::sphere(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cube_has_eight_corners_and_twelve_faces() {
        let cube = Mesh::cube();
        assert_eq!(cube.positions().len(), 8);
        assert_eq!(cube.faces().len(), 12);
        assert!(!cube.has_normals());
        assert!(!cube.has_uvs());
    }

    #[test]
    fn cube_faces_wind_outward() {
        let cube = Mesh::cube();
        for face in cube.faces() {
            let p0 = cube.positions()[face[0].position];
            let p1 = cube.positions()[face[1].position];
            let p2 = cube.positions()[face[2].position];
            let normal = (p1 - p0).cross(&(p2 - p0));
            let center = (p0 + p1 + p2) / 3.0;
            // Outward: the face normal points away from the cube center.
            assert!(normal.dot(&center) > 0.0);
        }
    }

    #[test]
    fn out_of_bounds_face_index_is_rejected() {
        let positions = vec![Vector3::zeros(), Vector3::x(), Vector3::y()];
        assert!(Mesh::from_positions(positions.clone(), vec![[0, 1, 2]]).is_ok());
        assert!(Mesh::from_positions(positions, vec![[0, 1, 3]]).is_err());
    }

    #[test]
    fn absent_arrays_ignore_their_indices() {
        // uv index 7 is meaningless (and legal) because the mesh has no UVs.
        let positions = vec![Vector3::zeros(), Vector3::x(), Vector3::y()];
        let face = [
            Corner {
                position: 0,
                normal: 0,
                uv: 7,
            },
            Corner {
                position: 1,
                normal: 0,
                uv: 7,
            },
            Corner {
                position: 2,
                normal: 0,
                uv: 7,
            },
        ];
        assert!(Mesh::new(positions, Vec::new(), Vec::new(), vec![face]).is_ok());
    }

    #[test]
    fn sphere_vertices_sit_on_the_unit_sphere() {
        let sphere = Mesh::sphere(8);
        assert!(sphere.has_normals());
        assert!(sphere.has_uvs());
        for (p, n) in sphere.positions().iter().zip(sphere.normals()) {
            assert_relative_eq!(p.norm(), 1.0, epsilon = 1e-5);
            assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn sphere_uvs_cover_the_unit_square() {
        let sphere = Mesh::sphere(6);
        for uv in sphere.uvs() {
            assert!((0.0..=1.0).contains(&uv.x));
            assert!((0.0..=1.0).contains(&uv.y));
        }
    }

    #[test]
    fn torus_normals_point_away_from_the_ring() {
        let torus = Mesh::torus(0.3, 12);
        for (p, n) in torus.positions().iter().zip(torus.normals()) {
            // Walking back along the normal by the tube thickness lands on
            // the unit ring in the XZ plane.
            let center = p - n * 0.3;
            assert_relative_eq!(center.y, 0.0, epsilon = 1e-5);
            assert_relative_eq!(center.xz().norm(), 1.0, epsilon = 1e-4);
        }
    }
}
