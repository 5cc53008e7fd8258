//! Uniform buffer definitions.
//!
//! These structs must match the GLSL uniform block layouts exactly, so
//! they are `#[repr(C)]` and byte-castable via bytemuck.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Camera uniforms (set 0, binding 0).
///
/// Layout: view (64) + projection (64) + position (12) + pad (4) = 144
/// bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct CameraUbo {
    /// World-to-view matrix.
    pub view: Mat4,
    /// View-to-clip matrix (Vulkan Y-flip already applied).
    pub projection: Mat4,
    /// Camera world position.
    pub position: Vec3,
    /// Pad to a 16-byte boundary.
    pub _pad: f32,
}

impl CameraUbo {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Builds the UBO from camera matrices and position.
    pub fn new(view: Mat4, projection: Mat4, position: Vec3) -> Self {
        Self {
            view,
            projection,
            position,
            _pad: 0.0,
        }
    }
}

/// Per-object uniforms (set 0, binding 1).
///
/// Layout: model (64) + normal matrix (64) = 128 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct ObjectUbo {
    /// Object-to-world matrix.
    pub model: Mat4,
    /// Transpose of the inverse model matrix, for normals.
    pub normal_matrix: Mat4,
}

impl ObjectUbo {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Builds the UBO from a model matrix.
    pub fn new(model: Mat4) -> Self {
        Self {
            model,
            normal_matrix: model.inverse().transpose(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_ubo_layout() {
        // 2 Mat4 + Vec3 + pad
        assert_eq!(CameraUbo::SIZE, 144);
        assert_eq!(std::mem::align_of::<CameraUbo>(), 16);
    }

    #[test]
    fn object_ubo_layout() {
        assert_eq!(ObjectUbo::SIZE, 128);
        assert_eq!(std::mem::align_of::<ObjectUbo>(), 16);
    }

    #[test]
    fn normal_matrix_is_inverse_transpose() {
        let model = Mat4::from_scale(Vec3::new(2.0, 2.0, 2.0));
        let ubo = ObjectUbo::new(model);
        assert_eq!(ubo.normal_matrix, model.inverse().transpose());
    }

    #[test]
    fn ubos_cast_to_bytes() {
        let camera = CameraUbo::default();
        assert_eq!(bytemuck::bytes_of(&camera).len(), CameraUbo::SIZE);

        let object = ObjectUbo::new(Mat4::IDENTITY);
        assert_eq!(bytemuck::bytes_of(&object).len(), ObjectUbo::SIZE);
    }
}
