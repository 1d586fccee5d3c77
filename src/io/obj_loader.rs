use crate::scene::mesh::{Corner, Mesh};
use log::{info, warn};
use nalgebra::{Vector2, Vector3};
use std::path::Path;

/// Loads an OBJ file into a single [`Mesh`], merging all sub-models.
///
/// Faces are triangulated and indices unified on load, so every corner's
/// position, normal and UV share one index. If any sub-model lacks normals
/// the merged mesh carries none at all and the renderer flat-shades it,
/// which beats inventing a fake normal.
pub fn load_obj(path: &str) -> Result<Mesh, String> {
    let path_obj = Path::new(path);
    if !path_obj.exists() {
        return Err(format!("file not found: {}", path));
    }

    info!("Loading OBJ file: {}", path);

    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };

    let (models, _materials) = tobj::load_obj(path_obj, &load_options)
        .map_err(|e| format!("failed to load OBJ {}: {}", path, e))?;

    if models.is_empty() {
        return Err(format!("OBJ {} contains no geometry", path));
    }

    let all_have_normals = models.iter().all(|m| !m.mesh.normals.is_empty());
    let all_have_uvs = models.iter().all(|m| !m.mesh.texcoords.is_empty());
    if !all_have_normals {
        warn!("OBJ {} is missing normals; faces will be flat-shaded", path);
    }

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut faces = Vec::new();

    for model in &models {
        let mesh = &model.mesh;
        let offset = positions.len();

        for p in mesh.positions.chunks_exact(3) {
            positions.push(Vector3::new(p[0], p[1], p[2]));
        }
        if all_have_normals {
            for n in mesh.normals.chunks_exact(3) {
                normals.push(Vector3::new(n[0], n[1], n[2]));
            }
        }
        if all_have_uvs {
            for t in mesh.texcoords.chunks_exact(2) {
                uvs.push(Vector2::new(t[0], t[1]));
            }
        }

        // single_index: one shared index per corner across all attributes.
        for tri in mesh.indices.chunks_exact(3) {
            faces.push([0, 1, 2].map(|k| {
                let index = tri[k] as usize + offset;
                Corner {
                    position: index,
                    normal: index,
                    uv: index,
                }
            }));
        }
    }

    info!(
        "OBJ loaded: {} vertices, {} faces ({} models merged)",
        positions.len(),
        faces.len(),
        models.len()
    );

    Mesh::new(positions, normals, uvs, faces)
}
