use crate::core::math::transform::TransformFactory;
use nalgebra::{Matrix4, Vector3};

/// The scene's viewpoint: position, Euler orientation in degrees (x = pitch,
/// y = yaw), vertical field of view in degrees, and the near/far planes.
///
/// Mutated freely by scene-authoring code between frames; the renderer reads
/// it once per render call to derive the view and projection matrices.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vector3<f32>,
    pub euler_angles: Vector3<f32>,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            euler_angles: Vector3::zeros(),
            fov: 60.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    /// World -> camera transform for the current position and orientation.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        TransformFactory::view_from_euler(&self.position, &self.euler_angles)
    }

    /// Camera -> clip transform for the given output aspect ratio.
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Matrix4<f32> {
        TransformFactory::perspective(aspect_ratio, self.fov.to_radians(), self.near, self.far)
    }
}
