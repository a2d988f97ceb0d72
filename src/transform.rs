//! Matrix construction from navigation state.
//!
//! Every matrix here follows glam's convention: column-major storage, column
//! vectors, right-handed world space and a `[0, 1]` clip depth range, which is
//! what wgpu expects. Products always read right to left: in `a * b`, `b` is
//! applied first.

use glam::{Mat4, Vec3};

/// World up axis shared by every look-at in the viewer.
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Vertical field of view of the rasterized camera, in radians.
pub const CAMERA_FOV_Y: f32 = std::f32::consts::FRAC_PI_3;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 100.0;

/// Axis-aligned box for an orthographic projection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrthoBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl OrthoBounds {
    pub fn symmetric(half_extent: f32, near: f32, far: f32) -> Self {
        Self {
            left: -half_extent,
            right: half_extent,
            bottom: -half_extent,
            top: half_extent,
            near,
            far,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::orthographic_rh(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.near,
            self.far,
        )
    }
}

/// Matrices derived from the camera each frame. Never stored across frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraMatrices {
    /// Rasterized camera: world to view, then view to clip.
    Raster { view: Mat4, projection: Mat4 },
    /// Ray-cast camera: camera space to world space.
    Ray { ray_matrix: Mat4 },
}

impl CameraMatrices {
    /// Combined `projection * view` for the raster camera.
    pub fn view_projection(&self) -> Option<Mat4> {
        match self {
            Self::Raster { view, projection } => Some(*projection * *view),
            Self::Ray { .. } => None,
        }
    }
}

/// View matrix looking from `position` along `forward`.
pub fn view_matrix(position: Vec3, forward: Vec3) -> Mat4 {
    Mat4::look_at_rh(position, position + forward, WORLD_UP)
}

/// Perspective projection for the rasterized camera.
pub fn projection_matrix(aspect: f32) -> Mat4 {
    let aspect = if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    };
    Mat4::perspective_rh(CAMERA_FOV_Y, aspect, CAMERA_NEAR, CAMERA_FAR)
}

/// Camera-to-world matrix for ray generation.
///
/// A ray direction built in camera space is rotated by pitch about X, then by
/// yaw about Y, then the origin is moved to `position`.
pub fn ray_matrix(position: Vec3, yaw: f32, pitch: f32) -> Mat4 {
    Mat4::from_translation(position) * Mat4::from_rotation_y(yaw) * Mat4::from_rotation_x(pitch)
}

/// Light view-projection: orthographic box looking from `light` at `target`.
pub fn light_space(light: Vec3, target: Vec3, bounds: &OrthoBounds) -> Mat4 {
    bounds.matrix() * Mat4::look_at_rh(light, target, WORLD_UP)
}

/// Translate-rotate-scale model matrix, applied scale first.
pub fn model_matrix(translation: Vec3, rotation: glam::Quat, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, rotation, translation)
}

/// Inverse-transpose used to carry normals through non-uniform scale.
pub fn normal_matrix(model: Mat4) -> Mat4 {
    model.inverse().transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec4};
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_6, PI};

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn ray_matrix_rotates_before_translating() {
        let position = Vec3::new(0.0, 4.0, 7.0);
        let m = ray_matrix(position, FRAC_PI_2, 0.0);

        // The camera origin lands on the position.
        let origin = m * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(close(origin.truncate(), position));

        // A direction is rotated only: -Z turned a quarter about Y is -X.
        let dir = m * Vec4::new(0.0, 0.0, -1.0, 0.0);
        assert!(close(dir.truncate(), Vec3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn ray_matrix_applies_pitch_before_yaw() {
        let m = ray_matrix(Vec3::ZERO, FRAC_PI_2, -FRAC_PI_6);
        let dir = (m * Vec4::new(0.0, 0.0, -1.0, 0.0)).truncate();

        // Pitch tilts the ray down first, yaw then swings it; the vertical
        // component must survive the yaw unchanged.
        assert!((dir.y - (-FRAC_PI_6).sin()).abs() < 1e-5);

        let swapped = Mat4::from_rotation_x(-FRAC_PI_6) * Mat4::from_rotation_y(FRAC_PI_2);
        let wrong = (swapped * Vec4::new(0.0, 0.0, -1.0, 0.0)).truncate();
        assert!(!close(dir, wrong));
    }

    #[test]
    fn view_matrix_puts_target_on_negative_z() {
        let position = Vec3::new(1.0, 2.0, 3.0);
        let forward = Vec3::new(0.0, 0.0, 1.0);
        let view = view_matrix(position, forward);
        let target = view.transform_point3(position + forward * 5.0);
        assert!(close(target, Vec3::new(0.0, 0.0, -5.0)));
    }

    #[test]
    fn light_space_is_bit_identical_across_calls() {
        let light = Vec3::new(-3.0, 4.0, -1.5);
        let bounds = OrthoBounds::symmetric(10.0, 0.1, 8.0);
        let a = light_space(light, Vec3::ZERO, &bounds);
        let b = light_space(light, Vec3::ZERO, &bounds);
        assert_eq!(a.to_cols_array(), b.to_cols_array());
    }

    #[test]
    fn light_space_maps_origin_inside_depth_range() {
        let light = Vec3::new(-3.0, 4.0, -1.5);
        let bounds = OrthoBounds::symmetric(10.0, 0.1, 8.0);
        let clip = light_space(light, Vec3::ZERO, &bounds).project_point3(Vec3::ZERO);
        let expected = (light.length() - 0.1) / (8.0 - 0.1);
        assert!(clip.x.abs() < 1e-5 && clip.y.abs() < 1e-5);
        assert!((clip.z - expected).abs() < 1e-5);
    }

    #[test]
    fn view_projection_is_projection_times_view() {
        let view = view_matrix(Vec3::new(0.0, 1.0, 5.0), Vec3::NEG_Z);
        let projection = projection_matrix(16.0 / 9.0);
        let matrices = CameraMatrices::Raster { view, projection };
        let p = Vec3::new(0.3, 0.8, -2.0);

        let combined = matrices.view_projection().map(|m| m.project_point3(p));
        let stepwise = projection.project_point3(view.transform_point3(p));
        assert!(close(combined.unwrap_or(Vec3::NAN), stepwise));
        assert!(CameraMatrices::Ray { ray_matrix: Mat4::IDENTITY }
            .view_projection()
            .is_none());
    }

    #[test]
    fn model_matrix_scales_then_rotates_then_translates() {
        let m = model_matrix(
            Vec3::new(1.0, 0.0, 0.0),
            Quat::from_rotation_z(PI),
            Vec3::splat(0.5),
        );
        let p = m.transform_point3(Vec3::new(2.0, 0.0, 0.0));
        assert!(close(p, Vec3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn degenerate_aspect_falls_back_to_square() {
        assert_eq!(projection_matrix(0.0), projection_matrix(1.0));
        assert_eq!(projection_matrix(f32::NAN), projection_matrix(1.0));
    }
}
