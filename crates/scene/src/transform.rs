//! Position / rotation / scale transform.

use glam::{Mat4, Quat, Vec3};

/// A TRS transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Translation.
    pub position: Vec3,
    /// Rotation.
    pub rotation: Quat,
    /// Non-uniform scale.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform with only a translation.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// The object-to-world matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_matrix() {
        assert_eq!(Transform::new().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn translation_lands_in_last_column() {
        let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let m = transform.matrix();
        assert_relative_eq!(m.w_axis.x, 1.0);
        assert_relative_eq!(m.w_axis.y, 2.0);
        assert_relative_eq!(m.w_axis.z, 3.0);
    }

    #[test]
    fn scale_applies_before_translation() {
        let transform = Transform {
            position: Vec3::new(10.0, 0.0, 0.0),
            rotation: Quat::IDENTITY,
            scale: Vec3::splat(2.0),
        };
        let p = transform.matrix().transform_point3(Vec3::X);
        assert_relative_eq!(p.x, 12.0);
    }
}
