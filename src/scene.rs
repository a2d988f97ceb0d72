//! Object instances, their animation and the light.

use std::f32::consts::{PI, TAU};

use glam::{Mat4, Quat, Vec3};

use crate::resources::{DrawableId, TextureId};
use crate::transform::{self, OrthoBounds};

/// Closed path made of two circles that meet tangentially.
///
/// For the first half of the period the object circles the anchor at the
/// inner radius. For the second half it circles a point `inner + outer` to
/// the right of the anchor at the outer radius, in the opposite direction.
/// Both circles pass through `anchor + (inner, 0, 0)`, which is where the
/// path switches over.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitPath {
    pub anchor: Vec3,
    pub inner_radius: f32,
    pub outer_radius: f32,
    /// Seconds for one full loop.
    pub period: f32,
    pub scale: f32,
}

impl Default for OrbitPath {
    fn default() -> Self {
        Self {
            anchor: Vec3::new(-1.5, 0.7, 0.0),
            inner_radius: 1.3,
            outer_radius: 2.5,
            period: 2.0 * TAU,
            scale: 0.5,
        }
    }
}

impl OrbitPath {
    /// Radians swept per second.
    pub fn angular_rate(&self) -> f32 {
        2.0 * TAU / self.period
    }

    /// `t` reduced into `[0, period)`.
    pub fn phase(&self, t: f32) -> f32 {
        t.rem_euclid(self.period)
    }

    pub fn position(&self, t: f32) -> Vec3 {
        let t = self.phase(t);
        let angle = self.angular_rate() * t;

        if t < self.period / 2.0 {
            self.anchor + self.inner_radius * Vec3::new(angle.cos(), 0.0, -angle.sin())
        } else {
            let angle = PI + angle;
            self.anchor
                + self.outer_radius * Vec3::new(angle.cos(), 0.0, angle.sin())
                + Vec3::new(self.inner_radius + self.outer_radius, 0.0, 0.0)
        }
    }

    /// Model matrix at time `t`: upside down, spinning about its own axis.
    pub fn model(&self, t: f32) -> Mat4 {
        let spin = self.angular_rate() * self.phase(t);
        Mat4::from_translation(self.position(t))
            * Mat4::from_rotation_z(PI)
            * Mat4::from_rotation_y(spin)
            * Mat4::from_scale(Vec3::splat(self.scale))
    }
}

/// Time-driven motion of an instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Animation {
    Orbit(OrbitPath),
}

impl Animation {
    pub fn model(&self, t: f32) -> Mat4 {
        match self {
            Self::Orbit(path) => path.model(t),
        }
    }
}

/// One placement of a drawable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectInstance {
    pub drawable: DrawableId,
    /// Used as-is when there is no animation.
    pub transform: Mat4,
    pub animation: Option<Animation>,
    pub texture: Option<TextureId>,
}

impl ObjectInstance {
    pub fn fixed(drawable: DrawableId, transform: Mat4) -> Self {
        Self {
            drawable,
            transform,
            animation: None,
            texture: None,
        }
    }

    pub fn animated(drawable: DrawableId, animation: Animation) -> Self {
        Self {
            drawable,
            transform: Mat4::IDENTITY,
            animation: Some(animation),
            texture: None,
        }
    }

    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn model(&self, t: f32) -> Mat4 {
        match &self.animation {
            Some(animation) => animation.model(t),
            None => self.transform,
        }
    }
}

/// Handles the default scene is assembled from.
#[derive(Clone, Copy, Debug)]
pub struct SceneAssets {
    pub cube: DrawableId,
    pub plane: DrawableId,
    pub tetrahedron: DrawableId,
    pub box_texture: TextureId,
    pub ground_texture: TextureId,
    pub orbiter_texture: TextureId,
}

/// Every object drawn by the shadow-mapping renderer.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub instances: Vec<ObjectInstance>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, instance: ObjectInstance) -> usize {
        self.instances.push(instance);
        self.instances.len() - 1
    }

    /// Two boxes on a grass square with a tetrahedron looping around them.
    pub fn stock(assets: &SceneAssets) -> Self {
        let mut scene = Self::new();
        scene.add(
            ObjectInstance::fixed(
                assets.cube,
                Mat4::from_translation(Vec3::new(1.5, 1.0, 0.0)),
            )
            .with_texture(assets.box_texture),
        );
        scene.add(
            ObjectInstance::fixed(
                assets.cube,
                transform::model_matrix(
                    Vec3::new(-1.3, 1.0, 0.0),
                    Quat::IDENTITY,
                    Vec3::new(0.5, 1.0, 0.5),
                ),
            )
            .with_texture(assets.box_texture),
        );
        scene.add(
            ObjectInstance::fixed(assets.plane, Mat4::from_scale(Vec3::splat(2.0)))
                .with_texture(assets.ground_texture),
        );
        scene.add(
            ObjectInstance::animated(
                assets.tetrahedron,
                Animation::Orbit(OrbitPath::default()),
            )
            .with_texture(assets.orbiter_texture),
        );
        scene
    }

    /// Model matrices of every instance at `t`, in instance order.
    pub fn evaluate(&self, t: f32) -> Vec<Mat4> {
        self.instances.iter().map(|i| i.model(t)).collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// The single directional light. Fixed for the session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightState {
    pub position: Vec3,
    pub target: Vec3,
    pub bounds: OrthoBounds,
    light_space: Mat4,
}

impl LightState {
    pub fn new(position: Vec3, target: Vec3, bounds: OrthoBounds) -> Self {
        Self {
            position,
            target,
            bounds,
            light_space: transform::light_space(position, target, &bounds),
        }
    }

    /// Orthographic view-projection from the light, computed once.
    pub fn light_space(&self) -> Mat4 {
        self.light_space
    }
}

impl Default for LightState {
    fn default() -> Self {
        Self::new(
            Vec3::new(-3.0, 4.0, -1.5),
            Vec3::ZERO,
            OrthoBounds::symmetric(10.0, 0.1, 8.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn assets() -> SceneAssets {
        SceneAssets {
            cube: DrawableId(0),
            plane: DrawableId(1),
            tetrahedron: DrawableId(2),
            box_texture: TextureId(0),
            ground_texture: TextureId(1),
            orbiter_texture: TextureId(2),
        }
    }

    #[test]
    fn orbit_starts_on_inner_circle() {
        let path = OrbitPath::default();
        let p = path.position(0.0);
        assert!((p - Vec3::new(-1.5 + 1.3, 0.7, 0.0)).length() < EPS);

        // A quarter of the inner loop goes toward -z.
        let q = path.position(path.period / 8.0);
        assert!((q - Vec3::new(-1.5, 0.7, -1.3)).length() < EPS);
    }

    #[test]
    fn orbit_is_continuous_at_the_switch() {
        let path = OrbitPath::default();
        let half = path.period / 2.0;
        let eps = 1e-3;
        let before = path.position(half - eps);
        let after = path.position(half + eps);
        assert!((before - after).length() < 0.02);
        assert!((path.position(half) - Vec3::new(-0.2, 0.7, 0.0)).length() < EPS);
    }

    #[test]
    fn orbit_is_continuous_at_the_wrap() {
        let path = OrbitPath::default();
        let eps = 1e-3;
        let end = path.position(path.period - eps);
        let start = path.position(path.period + eps);
        assert!((end - start).length() < 0.02);
        assert!((path.position(path.period) - path.position(0.0)).length() < EPS);
    }

    #[test]
    fn outer_loop_reaches_far_side() {
        let path = OrbitPath::default();
        // Midway through the outer loop the object is diametrically opposite
        // the switch point on the outer circle.
        let p = path.position(path.period * 0.75);
        let center = path.anchor + Vec3::new(3.8, 0.0, 0.0);
        assert!(((p - center).length() - 2.5).abs() < EPS);
        assert!((p.x - (center.x + 2.5)).abs() < EPS);
    }

    #[test]
    fn orbit_model_places_and_shrinks() {
        let path = OrbitPath::default();
        let m = path.model(1.0);
        let origin = m.transform_point3(Vec3::ZERO);
        assert!((origin - path.position(1.0)).length() < EPS);

        // Upside down: a point above the local origin ends up below it.
        let tip = m.transform_point3(Vec3::new(0.0, 2.0_f32.sqrt(), 0.0));
        assert!(tip.y < origin.y);
        assert!(((tip - origin).length() - 0.5 * 2.0_f32.sqrt()).abs() < EPS);
    }

    #[test]
    fn negative_time_wraps() {
        let path = OrbitPath::default();
        let a = path.position(-1.0);
        let b = path.position(path.period - 1.0);
        assert!((a - b).length() < EPS);
    }

    #[test]
    fn stock_scene_layout() {
        let scene = Scene::stock(&assets());
        assert_eq!(scene.len(), 4);
        assert_eq!(scene.instances.iter().filter(|i| i.animation.is_some()).count(), 1);
        assert!(scene.instances.iter().all(|i| i.texture.is_some()));

        let models = scene.evaluate(0.0);
        let box_b = models[1].transform_point3(Vec3::new(1.0, 1.0, 1.0));
        assert!((box_b - Vec3::new(-0.8, 2.0, 0.5)).length() < EPS);
        let ground = models[2].transform_point3(Vec3::new(2.0, 0.0, 2.0));
        assert!((ground - Vec3::new(4.0, 0.0, 4.0)).length() < EPS);
    }

    #[test]
    fn evaluate_reuses_one_time_sample() {
        let scene = Scene::stock(&assets());
        assert_eq!(scene.evaluate(3.25), scene.evaluate(3.25));
        assert_ne!(scene.evaluate(3.25)[3], scene.evaluate(3.5)[3]);
        // Fixed instances ignore time.
        assert_eq!(scene.evaluate(0.0)[0], scene.evaluate(100.0)[0]);
    }

    #[test]
    fn light_space_is_cached() {
        let light = LightState::default();
        let expected = transform::light_space(light.position, light.target, &light.bounds);
        assert_eq!(light.light_space().to_cols_array(), expected.to_cols_array());
        assert_eq!(
            light.light_space().to_cols_array(),
            light.light_space().to_cols_array()
        );
    }
}
