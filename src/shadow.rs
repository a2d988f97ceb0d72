//! The shadow test.
//!
//! `shaders/lighting.wgsl` runs this per fragment on the GPU. The functions
//! here are the same arithmetic on the CPU, along with a small depth image
//! that stands in for the shadow map so the whole round trip can be checked
//! without a device.
//!
//! Texture space has its origin at the top-left texel, so clip-space `y` is
//! flipped when mapped to `v`.

use glam::{Mat4, Vec2, Vec3};

use crate::error::Result;
use crate::resources;

/// Depth offset subtracted from the fragment's light-space depth before the
/// comparison. Suppresses self-shadowing acne.
pub const DEFAULT_DEPTH_BIAS: f32 = 0.005;

/// Where a world point lands in the shadow map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowCoord {
    /// Texture coordinate in `[0, 1]^2`.
    pub uv: Vec2,
    /// Light-space depth in `[0, 1]`.
    pub depth: f32,
}

/// Project a world point into shadow-map space.
///
/// Returns `None` when the point falls outside the light's frustum, which
/// callers treat as lit.
pub fn project(light_space: Mat4, world: Vec3) -> Option<ShadowCoord> {
    let clip = light_space * world.extend(1.0);
    if clip.w.abs() <= f32::EPSILON {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    let uv = Vec2::new(ndc.x * 0.5 + 0.5, -ndc.y * 0.5 + 0.5);

    let inside = (0.0..=1.0).contains(&uv.x)
        && (0.0..=1.0).contains(&uv.y)
        && ndc.z <= 1.0;
    inside.then_some(ShadowCoord { uv, depth: ndc.z })
}

/// A fragment is shadowed when something nearer the light was recorded at its
/// texel.
pub fn is_shadowed(sampled_depth: f32, fragment_depth: f32, bias: f32) -> bool {
    sampled_depth < fragment_depth - bias
}

/// A CPU depth buffer with the shadow map's addressing.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthImage {
    width: u32,
    height: u32,
    texels: Vec<f32>,
}

impl DepthImage {
    /// A cleared image: every texel at the far plane. Both sides must be
    /// non-zero.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        resources::validate_extent(width, height, u32::MAX)?;
        Ok(Self {
            width,
            height,
            texels: vec![1.0; width as usize * height as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Nearest texel for a coordinate in `[0, 1]^2`.
    pub fn texel(&self, uv: Vec2) -> (u32, u32) {
        let x = (uv.x * self.width as f32).floor() as i64;
        let y = (uv.y * self.height as f32).floor() as i64;
        (
            x.clamp(0, self.width as i64 - 1) as u32,
            y.clamp(0, self.height as i64 - 1) as u32,
        )
    }

    /// Record a depth, keeping the nearer of old and new (depth test `Less`).
    pub fn store(&mut self, uv: Vec2, depth: f32) {
        let (x, y) = self.texel(uv);
        let texel = &mut self.texels[(y * self.width + x) as usize];
        if depth < *texel {
            *texel = depth;
        }
    }

    pub fn sample(&self, uv: Vec2) -> f32 {
        let (x, y) = self.texel(uv);
        self.texels[(y * self.width + x) as usize]
    }

    /// Rasterize points as seen from the light.
    pub fn record(&mut self, light_space: Mat4, points: impl IntoIterator<Item = Vec3>) {
        for point in points {
            if let Some(coord) = project(light_space, point) {
                self.store(coord.uv, coord.depth);
            }
        }
    }
}

/// 0.0 if `world` is in shadow, 1.0 if lit.
pub fn shadow_factor(map: &DepthImage, light_space: Mat4, world: Vec3, bias: f32) -> f32 {
    match project(light_space, world) {
        Some(coord) if is_shadowed(map.sample(coord.uv), coord.depth, bias) => 0.0,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::LightState;

    fn light() -> Mat4 {
        LightState::default().light_space()
    }

    #[test]
    fn stored_depth_reads_back_unchanged() {
        let mut map = DepthImage::new(1024, 1024).unwrap();
        let uv = Vec2::new(0.3, 0.7);
        map.store(uv, 0.42);
        assert_eq!(map.sample(uv), 0.42);
        assert!(!is_shadowed(map.sample(uv), 0.42, 0.0));
    }

    #[test]
    fn projected_point_round_trips_with_zero_bias() {
        let mut map = DepthImage::new(1024, 1024).unwrap();
        let p = Vec3::new(0.5, 1.0, 0.25);
        map.record(light(), [p]);
        let coord = project(light(), p).unwrap();
        assert_eq!(map.sample(coord.uv), coord.depth);
        assert_eq!(shadow_factor(&map, light(), p, 0.0), 1.0);
    }

    #[test]
    fn occluder_between_light_and_point_casts_shadow() {
        let light_state = LightState::default();
        let ground = Vec3::new(1.0, 0.0, 0.5);
        // Moved toward the light along its view axis: same texel, nearer depth.
        let occluder = ground + (light_state.position - light_state.target) * 0.5;

        let mut map = DepthImage::new(64, 64).unwrap();
        map.record(light(), [occluder, ground]);

        assert_eq!(shadow_factor(&map, light(), ground, DEFAULT_DEPTH_BIAS), 0.0);
        assert_eq!(shadow_factor(&map, light(), occluder, DEFAULT_DEPTH_BIAS), 1.0);
    }

    #[test]
    fn bias_suppresses_near_equal_depths() {
        assert!(is_shadowed(0.50, 0.51, 0.005));
        assert!(!is_shadowed(0.508, 0.51, 0.005));
        assert!(!is_shadowed(0.51, 0.51, 0.0));
    }

    #[test]
    fn points_outside_the_light_box_are_lit() {
        let map = DepthImage::new(16, 16).unwrap();
        // Far outside the 20 x 20 ortho box.
        let outside = Vec3::new(40.0, 0.0, 40.0);
        assert!(project(light(), outside).is_none());
        assert_eq!(shadow_factor(&map, light(), outside, 0.0), 1.0);

        // Behind the far plane along the light direction.
        let far = LightState::default().position * -3.0;
        assert!(project(light(), far).is_none());
    }

    #[test]
    fn texture_v_is_flipped() {
        let up = project(light(), Vec3::new(0.0, 2.0, 0.0));
        let down = project(light(), Vec3::new(0.0, -2.0, 0.0));
        let (up, down) = (up.unwrap(), down.unwrap());
        // Higher in the world is higher on screen, i.e. smaller v.
        assert!(up.uv.y < down.uv.y);
    }

    #[test]
    fn store_keeps_nearest() {
        let mut map = DepthImage::new(4, 4).unwrap();
        let uv = Vec2::new(0.6, 0.1);
        map.store(uv, 0.8);
        map.store(uv, 0.3);
        map.store(uv, 0.5);
        assert_eq!(map.sample(uv), 0.3);
        assert_eq!(map.texel(uv), (2, 0));
        assert_eq!(map.sample(Vec2::new(0.0, 0.9)), 1.0);
    }

    #[test]
    fn zero_sized_image_is_rejected() {
        assert!(DepthImage::new(0, 16).is_err());
        assert!(DepthImage::new(16, 0).is_err());

        let single = DepthImage::new(1, 1).unwrap();
        assert_eq!(single.texel(Vec2::new(0.99, 0.99)), (0, 0));
    }
}
