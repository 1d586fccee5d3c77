use crate::scene::mesh::Mesh;
use crate::scene::texture::Texture;
use nalgebra::Vector3;
use std::sync::Arc;

/// What a scene object contributes to the frame. The variant is chosen
/// explicitly at construction; there is no runtime type inspection.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Lit, textured geometry.
    Surface {
        mesh: Arc<Mesh>,
        texture: Texture,
        shininess: f32,
    },
    /// A point light. Its fragments render as this flat color, and its
    /// world position and color feed the shading pass. Drawn as a small
    /// cube so lights are visible in the frame.
    Emitter { intensity: f32, color: Vector3<f32> },
}

/// A renderable entry in the scene: placement plus a tagged payload.
///
/// Created and mutated by scene-authoring code between frames; the renderer
/// only reads it during a render call.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub position: Vector3<f32>,
    /// Orientation as Euler angles in degrees, applied Z * Y * X.
    pub euler_angles: Vector3<f32>,
    pub scale: Vector3<f32>,
    pub payload: Payload,
}

impl SceneObject {
    /// A lit surface with the default shininess.
    pub fn surface(mesh: Arc<Mesh>, texture: Texture) -> Self {
        Self {
            position: Vector3::zeros(),
            euler_angles: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            payload: Payload::Surface {
                mesh,
                texture,
                shininess: 32.0,
            },
        }
    }

    /// A point light, drawn as a 0.1-scale cube of its own color.
    pub fn light(intensity: f32, color: Vector3<f32>) -> Self {
        Self {
            position: Vector3::zeros(),
            euler_angles: Vector3::zeros(),
            scale: Vector3::new(0.1, 0.1, 0.1),
            payload: Payload::Emitter { intensity, color },
        }
    }

    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.position = position;
        self
    }

    pub fn with_euler_angles(mut self, euler_degrees: Vector3<f32>) -> Self {
        self.euler_angles = euler_degrees;
        self
    }

    pub fn with_scale(mut self, scale: Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        if let Payload::Surface {
            shininess: ref mut s,
            ..
        } = self.payload
        {
            *s = shininess;
        }
        self
    }
}
