use crate::core::framebuffer::FrameBuffer;
use crate::core::rasterizer::{PrimitiveFlags, rasterize_triangle};
use crate::pipeline::shade::{CollectedLight, shade};
use crate::pipeline::transform::{ObjectTransforms, VertexArena, assemble_and_clip, to_screen};
use crate::scene::Scene;
use crate::scene::mesh::Mesh;
use crate::scene::object::Payload;
use crate::scene::texture::Texture;
use log::debug;
use nalgebra::{Vector3, Vector4};

/// The top-level renderer: owns the fragment buffer and the per-frame scratch
/// state, and turns a [`Scene`] into packed RGBA pixels.
///
/// One frame is a fixed sequence of passes: reset, light collection, the
/// optional panoramic background, one geometry pass per scene object, then
/// the deferred shading sweep. The scene is borrowed read-only for the whole
/// call, so nothing the renderer does can mutate it mid-frame.
pub struct Renderer {
    framebuffer: FrameBuffer,
    arena: VertexArena,
    triangles: Vec<[usize; 3]>,
    light_mesh: Mesh,
    skybox_mesh: Mesh,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Result<Self, String> {
        Ok(Self {
            framebuffer: FrameBuffer::new(width, height)?,
            arena: VertexArena::default(),
            triangles: Vec::new(),
            light_mesh: Mesh::cube(),
            skybox_mesh: Mesh::skybox(),
        })
    }

    pub fn width(&self) -> usize {
        self.framebuffer.width
    }

    pub fn height(&self) -> usize {
        self.framebuffer.height
    }

    /// Renders one frame and returns the packed 0xRRGGBBAA pixels, row-major
    /// from the top-left. The slice stays valid until the next render call.
    pub fn render(&mut self, scene: &Scene) -> &[u32] {
        let fb = &mut self.framebuffer;
        fb.update_view_dirs(scene.camera.fov.to_radians());
        fb.reset(Vector3::zeros());

        let aspect = fb.width as f32 / fb.height as f32;
        let view = scene.camera.view_matrix();
        let projection = scene.camera.projection_matrix(aspect);

        // Snapshot every light into camera space before any geometry is
        // drawn; all fragments of the frame shade against the same lights.
        let lights: Vec<CollectedLight> = scene
            .objects()
            .filter_map(|(_, object)| match object.payload {
                Payload::Emitter { intensity, color } => {
                    let p = object.position;
                    let position = (view * Vector4::new(p.x, p.y, p.z, 1.0)).xyz();
                    Some(CollectedLight {
                        position,
                        color,
                        intensity,
                    })
                }
                Payload::Surface { .. } => None,
            })
            .collect();

        debug!(
            "rendering frame: {} objects, {} lights",
            scene.len(),
            lights.len()
        );

        // The background sphere travels with the camera and is scaled well
        // past all geometry; its flags exempt it from depth and facing rules.
        if let Some(skybox) = &scene.skybox {
            let transforms = ObjectTransforms::new(
                &view,
                &projection,
                &scene.camera.position,
                &Vector3::zeros(),
                &Vector3::repeat(scene.camera.far * 0.5),
            );
            draw_mesh(
                fb,
                &mut self.arena,
                &mut self.triangles,
                &self.skybox_mesh,
                &transforms,
                skybox,
                1.0,
                PrimitiveFlags {
                    is_light: false,
                    is_background: true,
                },
            );
        }

        for (_, object) in scene.objects() {
            let transforms = ObjectTransforms::new(
                &view,
                &projection,
                &object.position,
                &object.euler_angles,
                &object.scale,
            );

            match &object.payload {
                Payload::Surface {
                    mesh,
                    texture,
                    shininess,
                } => draw_mesh(
                    fb,
                    &mut self.arena,
                    &mut self.triangles,
                    mesh,
                    &transforms,
                    texture,
                    *shininess,
                    PrimitiveFlags::default(),
                ),
                Payload::Emitter { color, .. } => draw_mesh(
                    fb,
                    &mut self.arena,
                    &mut self.triangles,
                    &self.light_mesh,
                    &transforms,
                    &Texture::color(*color),
                    1.0,
                    PrimitiveFlags {
                        is_light: true,
                        is_background: false,
                    },
                ),
            }
        }

        shade(fb, &lights, scene.ambient_light);
        &fb.pixels
    }
}

/// Geometry pass for one mesh: vertex stage into the arena, then scanline
/// rasterization of every surviving triangle. A vertex whose projection is
/// unusable drops its triangle, never the frame.
#[allow(clippy::too_many_arguments)]
fn draw_mesh(
    fb: &mut FrameBuffer,
    arena: &mut VertexArena,
    triangles: &mut Vec<[usize; 3]>,
    mesh: &Mesh,
    transforms: &ObjectTransforms,
    texture: &Texture,
    shininess: f32,
    flags: PrimitiveFlags,
) {
    arena.clear();
    triangles.clear();
    assemble_and_clip(mesh, transforms, arena, triangles);

    for tri in triangles.iter() {
        let Some(a) = to_screen(arena.get(tri[0]), fb.width, fb.height) else {
            continue;
        };
        let Some(b) = to_screen(arena.get(tri[1]), fb.width, fb.height) else {
            continue;
        };
        let Some(c) = to_screen(arena.get(tri[2]), fb.width, fb.height) else {
            continue;
        };
        rasterize_triangle(fb, &[a, b, c], texture, shininess, flags);
    }
}
