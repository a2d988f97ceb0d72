//! Frame plans: what a frame draws, in what order, before any GPU work.
//!
//! A technique turns the frame's inputs into a [`FramePlan`], a flat list of
//! passes and flushes. The executor walks that list against real resources.
//! Keeping the plan separate makes pass ordering testable without a device.
//!
//! ```text
//! shadow map:  Depth(ShadowMap) ─▶ Flush ─▶ Lighting(Screen, samples ShadowMap)
//! debug view:  Depth(ShadowMap) ─▶ Flush ─▶ DepthDebug(Screen, samples ShadowMap)
//! ray cast:    RayCast(Screen)
//! ```

use glam::Mat4;

use crate::error::{Result, ViewerError};
use crate::resources::{DrawableId, TextureId};

/// A render target as passes see it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetRef {
    /// The swapchain image plus the screen depth buffer.
    Screen,
    /// The offscreen depth-only target rendered from the light.
    ShadowMap,
}

/// What a pass does. The kind fixes which attachments it writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Depth from the light, no color.
    Depth,
    /// Lit, textured scene with the shadow test.
    Lighting,
    /// Raw shadow-map depth on a full-screen quad.
    DepthDebug,
    /// Per-pixel rays from the camera.
    RayCast,
}

impl PassKind {
    pub fn writes_color(self) -> bool {
        !matches!(self, Self::Depth)
    }

    pub fn writes_depth(self) -> bool {
        matches!(self, Self::Depth | Self::Lighting)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Depth => "depth pass",
            Self::Lighting => "lighting pass",
            Self::DepthDebug => "depth debug pass",
            Self::RayCast => "ray cast pass",
        }
    }
}

/// Attachment clear values. `None` loads the previous contents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Clear {
    pub color: Option<[f64; 4]>,
    pub depth: Option<f32>,
}

impl Clear {
    pub const DEPTH_ONLY: Self = Self {
        color: None,
        depth: Some(1.0),
    };

    pub fn color_and_depth(rgb: [f64; 3]) -> Self {
        Self {
            color: Some([rgb[0], rgb[1], rgb[2], 1.0]),
            depth: Some(1.0),
        }
    }

    pub fn color(rgb: [f64; 3]) -> Self {
        Self {
            color: Some([rgb[0], rgb[1], rgb[2], 1.0]),
            depth: None,
        }
    }
}

/// Pixel rectangle starting at the target origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// One draw inside a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawItem {
    pub drawable: DrawableId,
    /// Index into [`FramePlan::instances`], for draws with a model matrix.
    pub instance: Option<usize>,
    pub texture: Option<TextureId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PassPlan {
    pub kind: PassKind,
    pub target: TargetRef,
    pub clear: Clear,
    pub viewport: Viewport,
    /// Target read by this pass. Must be flushed before the pass runs.
    pub sampled: Option<TargetRef>,
    pub draws: Vec<DrawItem>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FrameStep {
    Pass(PassPlan),
    /// Submit everything recorded so far before recording further passes.
    Flush,
}

/// Everything one frame renders.
#[derive(Clone, Debug, PartialEq)]
pub struct FramePlan {
    pub steps: Vec<FrameStep>,
    /// Model matrices for this frame, evaluated once from [`FramePlan::time`].
    pub instances: Vec<Mat4>,
    pub time: f32,
}

impl FramePlan {
    pub fn passes(&self) -> impl Iterator<Item = &PassPlan> {
        self.steps.iter().filter_map(|step| match step {
            FrameStep::Pass(pass) => Some(pass),
            FrameStep::Flush => None,
        })
    }

    pub fn kinds(&self) -> Vec<PassKind> {
        self.passes().map(|p| p.kind).collect()
    }

    /// Check ordering rules: a sampled target must have been written and then
    /// flushed earlier in the frame, and a pass may not sample the target it
    /// renders to. Every instance index must be in range.
    pub fn validate(&self) -> Result<()> {
        let mut written_unflushed: Vec<TargetRef> = Vec::new();
        let mut flushed: Vec<TargetRef> = Vec::new();

        for step in &self.steps {
            match step {
                FrameStep::Flush => flushed.append(&mut written_unflushed),
                FrameStep::Pass(pass) => {
                    if let Some(sampled) = pass.sampled {
                        if sampled == pass.target {
                            return Err(ViewerError::GpuValidation(format!(
                                "{} samples its own target {sampled:?}",
                                pass.kind.label()
                            )));
                        }
                        if !flushed.contains(&sampled) {
                            return Err(ViewerError::GpuValidation(format!(
                                "{} samples {sampled:?} before it was written and flushed",
                                pass.kind.label()
                            )));
                        }
                    }
                    if let Some(bad) = pass
                        .draws
                        .iter()
                        .filter_map(|d| d.instance)
                        .find(|&i| i >= self.instances.len())
                    {
                        return Err(ViewerError::GpuValidation(format!(
                            "{} draws instance {bad} of {}",
                            pass.kind.label(),
                            self.instances.len()
                        )));
                    }
                    written_unflushed.push(pass.target);
                }
            }
        }
        Ok(())
    }
}
