//! Camera systems.

use glam::{Mat4, Quat, Vec3};

/// Projection type for the camera.
#[derive(Clone, Debug)]
pub enum Projection {
    /// Perspective projection.
    Perspective {
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    /// Orthographic projection.
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
}

/// A camera positioned in world space.
#[derive(Clone, Debug)]
pub struct Camera {
    /// Position in world space.
    pub position: Vec3,
    /// Orientation.
    pub rotation: Quat,
    /// Projection settings.
    pub projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            rotation: Quat::IDENTITY,
            projection: Projection::Perspective {
                fov_y: 45.0_f32.to_radians(),
                aspect: 16.0 / 9.0,
                near: 0.1,
                far: 1000.0,
            },
        }
    }
}

impl Camera {
    /// Create a camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a perspective projection.
    pub fn set_perspective(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) {
        self.projection = Projection::Perspective {
            fov_y,
            aspect,
            near,
            far,
        };
    }

    /// Update the aspect ratio (perspective projections only).
    pub fn set_aspect(&mut self, aspect: f32) {
        if let Projection::Perspective {
            fov_y, near, far, ..
        } = self.projection
        {
            self.projection = Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            };
        }
    }

    /// View matrix (world to view space).
    pub fn view_matrix(&self) -> Mat4 {
        let forward = self.rotation * Vec3::NEG_Z;
        Mat4::look_at_rh(self.position, self.position + forward, Vec3::Y)
    }

    /// Projection matrix with the Vulkan Y-flip applied.
    pub fn projection_matrix(&self) -> Mat4 {
        let mut proj = match self.projection {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh(fov_y, aspect, near, far),
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => Mat4::orthographic_rh(left, right, bottom, top, near, far),
        };
        // Vulkan clip space has Y pointing down.
        proj.y_axis.y *= -1.0;
        proj
    }

    /// Combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Forward direction vector.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Orient the camera toward a target position.
    pub fn look_at(&mut self, target: Vec3) {
        let to_target = target - self.position;
        if to_target.length_squared() > 0.0 {
            self.rotation = Quat::from_rotation_arc(Vec3::NEG_Z, to_target.normalize());
        }
    }
}

/// Orbit camera controller.
///
/// Keeps the camera on a sphere around a focus point; mouse drag changes
/// yaw/pitch, scroll changes the orbit radius.
#[derive(Clone, Debug)]
pub struct OrbitController {
    /// Point the camera orbits and looks at.
    pub target: Vec3,
    /// Distance from the target.
    pub radius: f32,
    /// Rotation around the Y axis, radians.
    pub yaw: f32,
    /// Elevation angle, radians. Clamped short of the poles.
    pub pitch: f32,
    /// Radians per pixel of mouse drag.
    pub sensitivity: f32,
    /// Radius change per scroll step.
    pub zoom_speed: f32,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            radius: 4.0,
            yaw: 0.0,
            pitch: 0.3,
            sensitivity: 0.005,
            zoom_speed: 0.4,
        }
    }
}

impl OrbitController {
    /// Maximum elevation, just short of straight up/down.
    const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;
    const MIN_RADIUS: f32 = 0.5;
    const MAX_RADIUS: f32 = 100.0;

    /// Create a controller orbiting `target` at `radius`.
    pub fn new(target: Vec3, radius: f32) -> Self {
        Self {
            target,
            radius: radius.clamp(Self::MIN_RADIUS, Self::MAX_RADIUS),
            ..Self::default()
        }
    }

    /// Apply a mouse drag delta in pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * self.sensitivity;
        self.pitch = (self.pitch + dy * self.sensitivity)
            .clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    /// Apply a scroll delta in steps.
    pub fn zoom(&mut self, steps: f32) {
        self.radius =
            (self.radius - steps * self.zoom_speed).clamp(Self::MIN_RADIUS, Self::MAX_RADIUS);
    }

    /// Camera position implied by the current orbit state.
    pub fn eye(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target
            + Vec3::new(
                self.radius * cos_pitch * sin_yaw,
                self.radius * sin_pitch,
                self.radius * cos_pitch * cos_yaw,
            )
    }

    /// Write the orbit state into a camera.
    pub fn apply(&self, camera: &mut Camera) {
        camera.position = self.eye();
        camera.look_at(self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn projection_flips_y_for_vulkan() {
        let camera = Camera::new();
        let proj = camera.projection_matrix();
        assert!(proj.y_axis.y < 0.0);
    }

    #[test]
    fn view_matrix_looks_down_negative_z_by_default() {
        let camera = Camera::new();
        let view = camera.view_matrix();
        // A point in front of the camera lands on the negative Z axis in
        // view space.
        let in_front = view.transform_point3(Vec3::new(0.0, 0.0, 0.0));
        assert!(in_front.z < 0.0);
    }

    #[test]
    fn set_aspect_only_touches_perspective() {
        let mut camera = Camera::new();
        camera.set_aspect(2.0);
        match camera.projection {
            Projection::Perspective { aspect, .. } => assert_relative_eq!(aspect, 2.0),
            _ => panic!("expected perspective projection"),
        }
    }

    #[test]
    fn look_at_points_forward_at_target() {
        let mut camera = Camera::new();
        camera.position = Vec3::new(0.0, 0.0, 5.0);
        camera.look_at(Vec3::ZERO);
        let forward = camera.forward();
        assert_relative_eq!(forward.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(forward.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(forward.z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn orbit_eye_stays_on_radius() {
        let mut controller = OrbitController::new(Vec3::ZERO, 4.0);
        controller.orbit(120.0, -45.0);
        let eye = controller.eye();
        assert_relative_eq!(eye.length(), 4.0, epsilon = 1e-4);
    }

    #[test]
    fn orbit_pitch_is_clamped() {
        let mut controller = OrbitController::default();
        controller.orbit(0.0, 1e6);
        assert!(controller.pitch < std::f32::consts::FRAC_PI_2);
        controller.orbit(0.0, -2e6);
        assert!(controller.pitch > -std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut controller = OrbitController::default();
        controller.zoom(1e6);
        assert_relative_eq!(controller.radius, 0.5);
        controller.zoom(-1e6);
        assert_relative_eq!(controller.radius, 100.0);
    }

    #[test]
    fn apply_faces_the_target() {
        let controller = OrbitController::new(Vec3::new(1.0, 2.0, 3.0), 5.0);
        let mut camera = Camera::new();
        controller.apply(&mut camera);

        let to_target = (controller.target - camera.position).normalize();
        let forward = camera.forward();
        assert_relative_eq!(forward.dot(to_target), 1.0, epsilon = 1e-4);
    }
}
