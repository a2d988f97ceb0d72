//! Per-frame rendering: planning, GPU renderers and execution.
//!
//! Each frame the viewer asks its [`RenderTechnique`] for a
//! [`plan::FramePlan`], lets it upload uniforms in `prepare`, then hands the
//! plan to the [`executor::FrameExecutor`], which opens the passes and calls
//! back into the technique to record draws.

pub mod executor;
pub mod plan;
pub mod ray_cast;
pub mod shadow_map;

use glam::Vec3;

use crate::error::{Result, ViewerError};
use crate::geometry::VertexLayout;
use crate::gpu::GpuContext;
use crate::input::Action;
use crate::resources::{DrawableId, ResourceSet, TargetId};
use crate::transform::CameraMatrices;

pub use executor::FrameExecutor;
pub use plan::{Clear, DrawItem, FramePlan, FrameStep, PassKind, PassPlan, TargetRef, Viewport};
pub use ray_cast::{RayCastRenderer, ShadowQuality};
pub use shadow_map::ShadowMapRenderer;

/// Values sampled once at the start of a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInputs {
    /// Seconds since the viewer started.
    pub time: f32,
    pub camera: CameraMatrices,
    pub camera_position: Vec3,
    pub viewport: Viewport,
}

/// A rendering technique driven by the frame loop.
pub trait RenderTechnique {
    /// Decide this frame's passes.
    fn plan(&self, inputs: &FrameInputs) -> FramePlan;

    /// Upload per-frame data for `plan`.
    fn prepare(
        &mut self,
        gpu: &GpuContext,
        inputs: &FrameInputs,
        plan: &FramePlan,
    ) -> Result<()>;

    /// Record the draws of one pass into an open render pass.
    fn encode(
        &self,
        pass: &PassPlan,
        render_pass: &mut wgpu::RenderPass<'_>,
        resources: &ResourceSet,
    ) -> Result<()>;

    /// Resource backing a logical target, if the technique owns one.
    fn target(&self, target: TargetRef) -> Option<TargetId>;

    /// React to a non-movement action. Returns true if it was used.
    fn handle_action(&mut self, action: Action) -> bool;

    /// Follow a window resize.
    fn resize(
        &mut self,
        gpu: &GpuContext,
        resources: &mut ResourceSet,
        width: u32,
        height: u32,
    ) -> Result<()>;
}

/// Vertex data a pipeline was built to consume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexInput {
    pub layout: VertexLayout,
    pub topology: wgpu::PrimitiveTopology,
}

impl VertexInput {
    pub const fn new(layout: VertexLayout, topology: wgpu::PrimitiveTopology) -> Self {
        Self { layout, topology }
    }

    /// Fail if a drawable of `layout` and `topology` cannot feed this input.
    pub fn check(
        self,
        drawable: DrawableId,
        layout: VertexLayout,
        topology: wgpu::PrimitiveTopology,
    ) -> Result<()> {
        if layout != self.layout || topology != self.topology {
            return Err(ViewerError::GpuValidation(format!(
                "drawable {drawable:?} is {layout:?}/{topology:?}, pipeline expects {:?}/{:?}",
                self.layout, self.topology
            )));
        }
        Ok(())
    }
}

/// Bind and draw one drawable after checking it matches the bound pipeline.
pub(crate) fn draw_drawable(
    render_pass: &mut wgpu::RenderPass<'_>,
    resources: &ResourceSet,
    id: DrawableId,
    input: VertexInput,
) -> Result<()> {
    let drawable = resources
        .drawable(id)
        .ok_or_else(|| ViewerError::GpuValidation(format!("drawable {id:?} missing")))?;
    input.check(id, drawable.layout, drawable.topology)?;
    render_pass.set_vertex_buffer(0, drawable.buffer.slice(..));
    render_pass.draw(0..drawable.vertex_count, 0..1);
    Ok(())
}

/// Compile WGSL inside an error scope.
pub(crate) fn build_shader(
    gpu: &GpuContext,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderModule> {
    let module = gpu
        .validated(|device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        })
        .map_err(|e| ViewerError::ShaderBuild {
            label: label.to_string(),
            message: e.to_string(),
        })?;
    log::debug!("built shader '{label}'");
    Ok(module)
}

/// Create a render pipeline inside an error scope.
///
/// Interface mismatches between shader stages and the layout surface here, so
/// failures are reported as shader build errors.
pub(crate) fn build_pipeline(
    gpu: &GpuContext,
    descriptor: &wgpu::RenderPipelineDescriptor<'_>,
) -> Result<wgpu::RenderPipeline> {
    let label = descriptor.label.unwrap_or("pipeline");
    gpu.validated(|device| device.create_render_pipeline(descriptor))
        .map_err(|e| ViewerError::ShaderBuild {
            label: label.to_string(),
            message: e.to_string(),
        })
}

/// Uniform buffer sized for `T`.
pub(crate) fn uniform_buffer<T>(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: std::mem::size_of::<T>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

pub(crate) fn uniform_layout_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}
