//! Full-screen ray casting.
//!
//! One pass covers the viewport with a four-vertex triangle strip. The
//! fragment stage builds a ray per pixel from the camera-to-world matrix and
//! traces a small analytic scene, falling back to a cubemap for rays that
//! escape.

use glam::Mat4;

use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};
use crate::geometry::{self, VertexLayout};
use crate::gpu::GpuContext;
use crate::input::Action;
use crate::render::plan::{
    Clear, DrawItem, FramePlan, FrameStep, PassKind, PassPlan, TargetRef,
};
use crate::render::shadow_map::CLEAR_COLOR;
use crate::render::{self as render, FrameInputs, RenderTechnique, VertexInput};
use crate::resources::{DrawableId, ResourceSet, TargetId};
use crate::texture::Cubemap;
use crate::transform::CameraMatrices;

const STRIP: VertexInput =
    VertexInput::new(VertexLayout::Flat2d, wgpu::PrimitiveTopology::TriangleStrip);

/// Shadow rays: one hard test, or a penumbra estimate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShadowQuality {
    #[default]
    Sharp,
    Soft,
}

impl ShadowQuality {
    pub fn toggled(self) -> Self {
        match self {
            Self::Sharp => Self::Soft,
            Self::Soft => Self::Sharp,
        }
    }

    fn flag(self) -> u32 {
        match self {
            Self::Sharp => 0,
            Self::Soft => 1,
        }
    }
}

/// Uniforms for `shaders/ray_cast.wgsl`, bound at `@group(0) @binding(0)`.
///
/// ```wgsl
/// struct Uniforms {
///     ray_matrix: mat4x4f,
///     resolution: vec2f,
///     time: f32,
///     soft_shadows: u32,
/// }
/// ```
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RayUniforms {
    pub ray_matrix: [[f32; 4]; 4],
    pub resolution: [f32; 2],
    pub time: f32,
    pub soft_shadows: u32,
}

impl RayUniforms {
    pub fn new(inputs: &FrameInputs, quality: ShadowQuality) -> Self {
        // A raster camera still yields a usable camera-to-world matrix.
        let ray_matrix = match inputs.camera {
            CameraMatrices::Ray { ray_matrix } => ray_matrix,
            CameraMatrices::Raster { view, .. } => view.inverse(),
        };
        Self {
            ray_matrix: ray_matrix.to_cols_array_2d(),
            resolution: [
                inputs.viewport.width as f32,
                inputs.viewport.height as f32,
            ],
            time: inputs.time,
            soft_shadows: quality.flag(),
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.ray_matrix)
    }
}

/// A single cleared screen pass drawing `strip`.
pub fn plan_frame(strip: DrawableId, inputs: &FrameInputs) -> FramePlan {
    FramePlan {
        steps: vec![FrameStep::Pass(PassPlan {
            kind: PassKind::RayCast,
            target: TargetRef::Screen,
            clear: Clear::color(CLEAR_COLOR),
            viewport: inputs.viewport,
            sampled: None,
            draws: vec![DrawItem {
                drawable: strip,
                instance: None,
                texture: None,
            }],
        })],
        instances: Vec::new(),
        time: inputs.time,
    }
}

pub struct RayCastRenderer {
    strip: DrawableId,
    quality: ShadowQuality,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    skybox_bind_group: wgpu::BindGroup,
}

impl RayCastRenderer {
    pub fn new(
        gpu: &GpuContext,
        resources: &mut ResourceSet,
        config: &ViewerConfig,
    ) -> Result<Self> {
        let device = &gpu.device;

        let strip = resources.create_drawable(
            gpu,
            "screen strip",
            &geometry::screen_strip(),
            STRIP.layout,
            STRIP.topology,
        )?;
        let cubemap = Cubemap::load(gpu, &config.asset_dir, &config.cubemap)?;
        log::info!("skybox cubemap {0}x{0} per face", cubemap.size);
        let skybox = resources.insert_cubemap(cubemap);
        let skybox = resources
            .cubemap(skybox)
            .ok_or_else(|| ViewerError::resource("skybox cubemap missing"))?;

        let shader = render::build_shader(
            gpu,
            "ray cast shader",
            include_str!("../shaders/ray_cast.wgsl"),
        )?;

        let uniform_buffer = render::uniform_buffer::<RayUniforms>(device, "ray cast uniforms");
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ray cast uniform layout"),
            entries: &[render::uniform_layout_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ray cast uniform bind group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let skybox_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("skybox layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let skybox_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("skybox bind group"),
            layout: &skybox_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&skybox.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&skybox.sampler),
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ray cast pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &skybox_layout],
            push_constant_ranges: &[],
        });

        let pipeline = render::build_pipeline(
            gpu,
            &wgpu::RenderPipelineDescriptor {
                label: Some("ray cast pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs"),
                    buffers: &[STRIP.layout.buffer_layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: STRIP.topology,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            },
        )?;

        Ok(Self {
            strip,
            quality: ShadowQuality::default(),
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            skybox_bind_group,
        })
    }
}

/// Apply an action to the shadow quality. Returns true if it was used.
fn apply_action(quality: &mut ShadowQuality, action: Action) -> bool {
    match action {
        Action::ToggleQuality => {
            *quality = quality.toggled();
            log::debug!("ray cast shadows: {quality:?}");
            true
        }
        Action::ResetCamera => {
            *quality = ShadowQuality::Sharp;
            true
        }
        _ => false,
    }
}

impl RenderTechnique for RayCastRenderer {
    fn plan(&self, inputs: &FrameInputs) -> FramePlan {
        plan_frame(self.strip, inputs)
    }

    fn prepare(
        &mut self,
        gpu: &GpuContext,
        inputs: &FrameInputs,
        _plan: &FramePlan,
    ) -> Result<()> {
        let uniforms = RayUniforms::new(inputs, self.quality);
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
        Ok(())
    }

    fn encode(
        &self,
        pass: &PassPlan,
        render_pass: &mut wgpu::RenderPass<'_>,
        resources: &ResourceSet,
    ) -> Result<()> {
        if pass.kind != PassKind::RayCast {
            return Err(ViewerError::GpuValidation(format!(
                "ray casting cannot record a {}",
                pass.kind.label()
            )));
        }
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_bind_group(1, &self.skybox_bind_group, &[]);
        for item in &pass.draws {
            render::draw_drawable(render_pass, resources, item.drawable, STRIP)?;
        }
        Ok(())
    }

    fn target(&self, _target: TargetRef) -> Option<TargetId> {
        None
    }

    fn handle_action(&mut self, action: Action) -> bool {
        apply_action(&mut self.quality, action)
    }

    fn resize(
        &mut self,
        _gpu: &GpuContext,
        _resources: &mut ResourceSet,
        _width: u32,
        _height: u32,
    ) -> Result<()> {
        // Resolution travels in the uniforms; nothing is sized to the window.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraController, NavigationBasis, NavigationConfig};
    use crate::render::plan::Viewport;
    use glam::{Vec3, Vec4};

    fn inputs(time: f32) -> FrameInputs {
        let camera = CameraController::new(NavigationBasis::RayCast, NavigationConfig::default());
        FrameInputs {
            time,
            camera: camera.matrices(1.0),
            camera_position: camera.current_pose().position,
            viewport: Viewport {
                width: 512,
                height: 512,
            },
        }
    }

    #[test]
    fn single_cleared_screen_pass() {
        let plan = plan_frame(DrawableId(4), &inputs(1.0));
        assert_eq!(plan.kinds(), vec![PassKind::RayCast]);
        assert!(plan.validate().is_ok());
        assert!(plan.instances.is_empty());

        let pass = plan.passes().next().expect("ray cast pass");
        assert_eq!(pass.target, TargetRef::Screen);
        assert_eq!(pass.clear, Clear::color([0.1, 0.1, 0.1]));
        assert_eq!(pass.clear.depth, None);
        assert_eq!(pass.draws.len(), 1);
        assert_eq!(pass.draws[0].drawable, DrawableId(4));
    }

    #[test]
    fn uniforms_follow_the_frame() {
        let uniforms = RayUniforms::new(&inputs(3.25), ShadowQuality::Soft);
        assert_eq!(uniforms.resolution, [512.0, 512.0]);
        assert_eq!(uniforms.time, 3.25);
        assert_eq!(uniforms.soft_shadows, 1);
        assert_eq!(std::mem::size_of::<RayUniforms>(), 80);

        // The matrix moves the camera-space origin to the start position.
        let origin = uniforms.matrix() * Vec4::W;
        assert!((origin.truncate() - Vec3::new(0.0, 4.0, 7.0)).length() < 1e-5);
    }

    #[test]
    fn quality_toggles_and_resets() {
        let mut quality = ShadowQuality::default();
        assert_eq!(quality, ShadowQuality::Sharp);

        assert!(apply_action(&mut quality, Action::ToggleQuality));
        assert_eq!(quality, ShadowQuality::Soft);
        assert!(apply_action(&mut quality, Action::ToggleQuality));
        assert_eq!(quality, ShadowQuality::Sharp);

        apply_action(&mut quality, Action::ToggleQuality);
        assert!(apply_action(&mut quality, Action::ResetCamera));
        assert_eq!(quality, ShadowQuality::Sharp);

        assert!(!apply_action(&mut quality, Action::ToggleDebugView));
        assert!(!apply_action(&mut quality, Action::Quit));
    }
}
