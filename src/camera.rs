//! A first-person free-look camera controller.
//!
//! [`CameraController`] owns a [`NavigationState`] and is the only thing that
//! mutates it. Pointer deltas turn the camera, movement commands translate it
//! along a basis derived from yaw and pitch, and [`CameraController::reset`]
//! snaps back to the start pose.
//!
//! The two render techniques disagree on what "forward" means, so the
//! controller carries a [`NavigationBasis`]:
//!
//! - **Raster**: forward follows the full look direction, including pitch.
//!   Used with a `look_at` view matrix.
//! - **RayCast**: forward stays in the ground plane (its length shrinks with
//!   `cos(pitch)`), and because the ray camera looks down its local -Z, moving
//!   forward subtracts the basis vector.
//!
//! # Example
//!
//! ```
//! use duskview::{CameraController, MoveDirection, NavigationBasis, NavigationConfig};
//!
//! let mut camera = CameraController::new(NavigationBasis::RayCast, NavigationConfig::default());
//! camera.apply_pointer_delta(-12.0, 4.0);
//! camera.apply_movement(MoveDirection::Forward, 0.05);
//! let pose = camera.current_pose();
//! assert!(pose.position.z < 7.0);
//! ```

use std::f32::consts::{FRAC_PI_2, FRAC_PI_6, PI};

use glam::Vec3;

use crate::transform::{self, CameraMatrices, WORLD_UP};

/// Which movement basis the controller uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationBasis {
    Raster,
    RayCast,
}

impl NavigationBasis {
    /// Fixed pose the camera starts in and returns to on reset.
    pub fn start_pose(self) -> StartPose {
        match self {
            Self::Raster => StartPose {
                position: Vec3::new(-4.2, 4.0, 4.5),
                yaw: -1.25 * PI,
                pitch: -PI / 5.0,
            },
            Self::RayCast => StartPose {
                position: Vec3::new(0.0, 4.0, 7.0),
                yaw: 0.0,
                pitch: -FRAC_PI_6,
            },
        }
    }
}

/// Position and orientation restored by [`CameraController::reset`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StartPose {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

/// A logical movement command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

/// Tunables for navigation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NavigationConfig {
    /// Movement speed in units per second.
    pub speed: f32,
    /// Radians of turn per pixel of pointer offset.
    pub sensitivity: f32,
    /// Time step applied per movement key event, in seconds.
    pub key_step: f32,
    /// Symmetric pitch clamp in radians. `None` leaves pitch unbounded.
    pub pitch_limit: Option<f32>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            speed: 2.0,
            sensitivity: 0.05 * 0.05,
            key_step: 0.05,
            pitch_limit: Some(FRAC_PI_2 - 0.01),
        }
    }
}

impl NavigationConfig {
    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn key_step(mut self, seconds: f32) -> Self {
        self.key_step = seconds;
        self
    }

    pub fn pitch_limit(mut self, limit: Option<f32>) -> Self {
        self.pitch_limit = limit.map(f32::abs);
        self
    }
}

/// Scalar navigation state read every frame to derive camera matrices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NavigationState {
    pub position: Vec3,
    /// Horizontal angle in radians.
    pub yaw: f32,
    /// Vertical angle in radians. Positive looks up.
    pub pitch: f32,
    pub speed: f32,
    pub sensitivity: f32,
}

impl NavigationState {
    /// Look direction including pitch. Unit length.
    pub fn look_direction(&self) -> Vec3 {
        Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        )
    }

    /// Ground-plane heading scaled by `cos(pitch)`.
    pub fn planar_forward(&self) -> Vec3 {
        Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            0.0,
            self.pitch.cos() * self.yaw.cos(),
        )
    }

    /// Strafe axis. Unit length and horizontal.
    pub fn right(&self) -> Vec3 {
        let angle = self.yaw - FRAC_PI_2;
        Vec3::new(angle.sin(), 0.0, angle.cos())
    }
}

/// First-person camera controller.
///
/// # Controls
///
/// The controller knows nothing about keys. [`crate::input::Bindings`] maps
/// keys to [`MoveDirection`]s and the frame loop forwards them here.
#[derive(Clone, Debug)]
pub struct CameraController {
    state: NavigationState,
    basis: NavigationBasis,
    config: NavigationConfig,
}

impl CameraController {
    pub fn new(basis: NavigationBasis, config: NavigationConfig) -> Self {
        let start = basis.start_pose();
        Self {
            state: NavigationState {
                position: start.position,
                yaw: start.yaw,
                pitch: start.pitch,
                speed: config.speed,
                sensitivity: config.sensitivity,
            },
            basis,
            config,
        }
    }

    /// Turn the camera by a pointer offset from the viewport center.
    ///
    /// `dx = center_x - x` and `dy = center_y - y`, so moving the pointer
    /// right or down gives negative deltas.
    pub fn apply_pointer_delta(&mut self, dx: f32, dy: f32) {
        self.state.yaw += self.state.sensitivity * dx;
        self.state.pitch += self.state.sensitivity * dy;

        if let Some(limit) = self.config.pitch_limit {
            self.state.pitch = self.state.pitch.clamp(-limit, limit);
        }
    }

    /// Turn the camera from an absolute pointer position in a viewport.
    pub fn apply_pointer_position(&mut self, x: f32, y: f32, width: u32, height: u32) {
        let center_x = width as f32 / 2.0;
        let center_y = height as f32 / 2.0;
        self.apply_pointer_delta(center_x - x, center_y - y);
    }

    /// Translate the camera for `dt` seconds in a logical direction.
    pub fn apply_movement(&mut self, direction: MoveDirection, dt: f32) {
        let step = self.state.speed * dt;
        let (forward, right, sign) = match self.basis {
            NavigationBasis::Raster => (self.state.look_direction(), self.state.right(), 1.0),
            NavigationBasis::RayCast => (self.state.planar_forward(), self.state.right(), -1.0),
        };

        let delta = match direction {
            MoveDirection::Forward => forward * sign,
            MoveDirection::Back => -forward * sign,
            MoveDirection::Right => right * sign,
            MoveDirection::Left => -right * sign,
            MoveDirection::Up => WORLD_UP,
            MoveDirection::Down => -WORLD_UP,
        };

        self.state.position += delta * step;
    }

    /// Apply one key event worth of movement.
    pub fn step(&mut self, direction: MoveDirection) {
        self.apply_movement(direction, self.config.key_step);
    }

    /// Restore the start pose. Speed and sensitivity are left alone.
    pub fn reset(&mut self) {
        let start = self.basis.start_pose();
        self.state.position = start.position;
        self.state.yaw = start.yaw;
        self.state.pitch = start.pitch;
    }

    pub fn current_pose(&self) -> NavigationState {
        self.state
    }

    /// Derive this frame's camera matrices.
    pub fn matrices(&self, aspect: f32) -> CameraMatrices {
        let s = &self.state;
        match self.basis {
            NavigationBasis::Raster => CameraMatrices::Raster {
                view: transform::view_matrix(s.position, s.look_direction()),
                projection: transform::projection_matrix(aspect),
            },
            NavigationBasis::RayCast => CameraMatrices::Ray {
                ray_matrix: transform::ray_matrix(s.position, s.yaw, s.pitch),
            },
        }
    }
}
