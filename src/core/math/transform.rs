use nalgebra::{Matrix4, Point2, Point3, Vector3, Vector4};

//=================================
// Transform Matrix Factory
//=================================

/// Factory for creating the transformation matrices used by the pipeline.
/// Manually implemented to keep full control over the coordinate conventions
/// (right-handed, camera looking down -Z, NDC depth in [0, 1]).
pub struct TransformFactory;

#[rustfmt::skip]
impl TransformFactory {
    /// Creates a rotation matrix around the X-axis.
    pub fn rotation_x(angle_rad: f32) -> Matrix4<f32> {
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, c,  -s,   0.0,
            0.0, s,   c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Creates a rotation matrix around the Y-axis.
    pub fn rotation_y(angle_rad: f32) -> Matrix4<f32> {
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        Matrix4::new(
            c,   0.0, s,   0.0,
            0.0, 1.0, 0.0, 0.0,
           -s,   0.0, c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Creates a rotation matrix around the Z-axis.
    pub fn rotation_z(angle_rad: f32) -> Matrix4<f32> {
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        Matrix4::new(
            c,  -s,   0.0, 0.0,
            s,   c,   0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Creates a translation matrix.
    pub fn translation(translation: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new(
            1.0, 0.0, 0.0, translation.x,
            0.0, 1.0, 0.0, translation.y,
            0.0, 0.0, 1.0, translation.z,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Creates a non-uniform scaling matrix.
    pub fn scaling_nonuniform(scale: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new(
            scale.x, 0.0,     0.0,     0.0,
            0.0,     scale.y, 0.0,     0.0,
            0.0,     0.0,     scale.z, 0.0,
            0.0,     0.0,     0.0,     1.0,
        )
    }
}

impl TransformFactory {
    /// Creates a rotation matrix from Euler angles in degrees, applied in
    /// Z * Y * X order (the object-orientation convention of the scene model).
    pub fn euler_rotation(degrees: &Vector3<f32>) -> Matrix4<f32> {
        Self::rotation_z(degrees.z.to_radians())
            * Self::rotation_y(degrees.y.to_radians())
            * Self::rotation_x(degrees.x.to_radians())
    }

    /// Creates an object model matrix: translation followed by Euler rotation.
    /// Scale is deliberately not folded in here; the vertex stage applies it
    /// to local positions so the normal matrix can be derived separately.
    pub fn model(position: &Vector3<f32>, euler_degrees: &Vector3<f32>) -> Matrix4<f32> {
        Self::translation(position) * Self::euler_rotation(euler_degrees)
    }

    /// Creates a View matrix from a camera position and Euler angles (degrees):
    /// the inverse rotation (yaw, then pitch, both negated) composed with the
    /// inverse translation. Camera roll is not part of the view model.
    pub fn view_from_euler(position: &Vector3<f32>, euler_degrees: &Vector3<f32>) -> Matrix4<f32> {
        Self::rotation_x(-euler_degrees.x.to_radians())
            * Self::rotation_y(-euler_degrees.y.to_radians())
            * Self::translation(&-position)
    }

    /// Creates a Perspective Projection matrix.
    ///
    /// Maps the view frustum to NDC with x, y in [-1, 1] and z in [0, 1]
    /// (z = 0 at the near plane, z = 1 at the far plane). With the -1 in the
    /// w-row, clip-space w equals the view-space distance along the camera
    /// axis, and geometry in front of the near plane satisfies `clip.z > 0` —
    /// the exact test the near-plane clipper applies. Changing these row signs
    /// requires flipping that test in lockstep.
    #[rustfmt::skip]
    pub fn perspective(aspect_ratio: f32, fov_y_rad: f32, near: f32, far: f32) -> Matrix4<f32> {
        let s = 1.0 / (fov_y_rad / 2.0).tan();
        let range = far - near;

        Matrix4::new(
            s / aspect_ratio, 0.0, 0.0,               0.0,
            0.0,              s,   0.0,               0.0,
            0.0,              0.0, -far / range,      -far * near / range,
            0.0,              0.0, -1.0,              0.0,
        )
    }
}

//=================================
// Core Transformation Functions
//=================================

/// Performs perspective division: Clip Space -> NDC.
#[inline]
pub fn apply_perspective_division(clip: &Vector4<f32>) -> Point3<f32> {
    let w = clip.w;
    if w.abs() > 1e-6 {
        Point3::new(clip.x / w, clip.y / w, clip.z / w)
    } else {
        Point3::origin()
    }
}

/// Converts NDC coordinates to Screen coordinates (Viewport Transform).
/// Note: Y-axis is flipped (NDC +Y is up, Screen +Y is down).
#[inline]
pub fn ndc_to_screen(ndc_x: f32, ndc_y: f32, width: f32, height: f32) -> Point2<f32> {
    Point2::new((ndc_x + 1.0) * 0.5 * width, (-ndc_y + 1.0) * 0.5 * height)
}
