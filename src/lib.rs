//! # duskview
//!
//! An interactive 3D viewer with two rendering techniques: full-screen ray
//! casting, and two-pass shadow mapping with a depth pass from the light.
//!
//! ```no_run
//! use duskview::{Technique, ViewerConfig};
//!
//! fn main() -> duskview::Result<()> {
//!     duskview::run(
//!         ViewerConfig::new()
//!             .technique(Technique::ShadowMap)
//!             .asset_dir("textures"),
//!     )
//! }
//! ```
//!
//! Everything that decides what a frame draws is plain data and runs without
//! a GPU: camera navigation in [`camera`], matrices in [`transform`], the
//! animated scene in [`scene`], the shadow test in [`shadow`] and frame plans
//! in [`render::plan`].

mod app;
pub mod camera;
pub mod config;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod input;
pub mod logging;
pub mod render;
pub mod resources;
pub mod scene;
pub mod shadow;
pub mod texture;
pub mod transform;

pub use app::run;
pub use camera::{
    CameraController, MoveDirection, NavigationBasis, NavigationConfig, NavigationState,
};
pub use config::{SceneTextures, Technique, ViewerConfig};
pub use error::{Result, ViewerError};
pub use gpu::GpuContext;
pub use input::{Action, Bindings, InputEvent, InputQueue, KeyAction};
pub use logging::{LoggingConfig, init_logging};
pub use render::{
    FrameExecutor, FrameInputs, FramePlan, RayCastRenderer, RenderTechnique, ShadowMapRenderer,
    ShadowQuality,
};
pub use resources::{DrawableId, ResourceSet, TargetId, TextureId};
pub use scene::{LightState, ObjectInstance, OrbitPath, Scene};
pub use transform::CameraMatrices;
