//! Two-pass shadow mapping.
//!
//! The depth pass renders the scene from the light into an offscreen depth
//! target. After a flush, the lighting pass renders the scene from the camera
//! and compares each fragment's light-space depth against that target. With
//! the debug view on, the lighting pass is replaced by a full-screen quad that
//! shows the raw depth target.
//!
//! # Bind groups
//!
//! | Group | Depth pass | Lighting pass | Debug pass |
//! |-------|------------|---------------|------------|
//! | 0 | frame uniforms | frame uniforms | shadow map |
//! | 1 | model slot | model slot | |
//! | 2 | | surface texture | |
//! | 3 | | shadow map | |
//!
//! Every instance owns a model slot for the frame, so both passes read the
//! same matrices from a single upload.

use std::collections::HashMap;

use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};
use crate::geometry::{self, VertexLayout};
use crate::gpu::GpuContext;
use crate::input::Action;
use crate::render::plan::{
    Clear, DrawItem, FramePlan, FrameStep, PassKind, PassPlan, TargetRef, Viewport,
};
use crate::render::{self as render, FrameInputs, RenderTechnique, VertexInput};
use crate::resources::{DrawableId, ResourceSet, TargetId, TextureId, DEPTH_FORMAT};
use crate::scene::{LightState, Scene, SceneAssets};
use crate::texture::Texture;
use crate::transform;

/// Background of every technique's screen pass.
pub const CLEAR_COLOR: [f64; 3] = [0.1, 0.1, 0.1];

const LIT: VertexInput =
    VertexInput::new(VertexLayout::Lit, wgpu::PrimitiveTopology::TriangleList);
const QUAD: VertexInput =
    VertexInput::new(VertexLayout::Textured, wgpu::PrimitiveTopology::TriangleList);

/// Per-frame uniforms shared by the depth and lighting passes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub light_space: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub depth_bias: f32,
    pub light_pos: [f32; 3],
    pub _padding: f32,
}

impl FrameUniforms {
    pub fn new(inputs: &FrameInputs, light: &LightState, depth_bias: f32) -> Self {
        let aspect = inputs.viewport.width as f32 / inputs.viewport.height.max(1) as f32;
        let view_proj = inputs
            .camera
            .view_projection()
            .unwrap_or_else(|| transform::projection_matrix(aspect));
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            light_space: light.light_space().to_cols_array_2d(),
            camera_pos: inputs.camera_position.to_array(),
            depth_bias,
            light_pos: light.position.to_array(),
            _padding: 0.0,
        }
    }
}

/// Per-instance model uniforms.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniforms {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
}

impl ModelUniforms {
    pub fn new(model: glam::Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: transform::normal_matrix(model).to_cols_array_2d(),
        }
    }
}

/// Build the frame's pass list.
///
/// Model matrices come from one evaluation of the scene at `inputs.time` and
/// are shared by every pass.
pub fn plan_frame(
    scene: &Scene,
    quad: DrawableId,
    shadow_size: u32,
    debug_view: bool,
    inputs: &FrameInputs,
) -> FramePlan {
    let instances = scene.evaluate(inputs.time);

    let depth = PassPlan {
        kind: PassKind::Depth,
        target: TargetRef::ShadowMap,
        clear: Clear::DEPTH_ONLY,
        viewport: Viewport {
            width: shadow_size,
            height: shadow_size,
        },
        sampled: None,
        draws: scene
            .instances
            .iter()
            .enumerate()
            .map(|(slot, instance)| DrawItem {
                drawable: instance.drawable,
                instance: Some(slot),
                texture: None,
            })
            .collect(),
    };

    let second = if debug_view {
        PassPlan {
            kind: PassKind::DepthDebug,
            target: TargetRef::Screen,
            clear: Clear::color(CLEAR_COLOR),
            viewport: inputs.viewport,
            sampled: Some(TargetRef::ShadowMap),
            draws: vec![DrawItem {
                drawable: quad,
                instance: None,
                texture: None,
            }],
        }
    } else {
        PassPlan {
            kind: PassKind::Lighting,
            target: TargetRef::Screen,
            clear: Clear::color_and_depth(CLEAR_COLOR),
            viewport: inputs.viewport,
            sampled: Some(TargetRef::ShadowMap),
            draws: scene
                .instances
                .iter()
                .enumerate()
                .map(|(slot, instance)| DrawItem {
                    drawable: instance.drawable,
                    instance: Some(slot),
                    texture: instance.texture,
                })
                .collect(),
        }
    };

    FramePlan {
        steps: vec![FrameStep::Pass(depth), FrameStep::Flush, FrameStep::Pass(second)],
        instances,
        time: inputs.time,
    }
}

struct ModelSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// GPU side of shadow mapping.
pub struct ShadowMapRenderer {
    scene: Scene,
    light: LightState,
    depth_bias: f32,
    debug_view: bool,
    shadow_size: u32,

    shadow_target: TargetId,
    screen_depth: TargetId,
    quad: DrawableId,

    depth_pipeline: wgpu::RenderPipeline,
    lighting_pipeline: wgpu::RenderPipeline,
    debug_pipeline: wgpu::RenderPipeline,

    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    model_layout: wgpu::BindGroupLayout,
    model_slots: Vec<ModelSlot>,
    materials: HashMap<TextureId, wgpu::BindGroup>,
    fallback_material: wgpu::BindGroup,
    shadow_bind_group: wgpu::BindGroup,
}

impl ShadowMapRenderer {
    /// Load the stock scene and build every pipeline and target.
    pub fn new(
        gpu: &GpuContext,
        resources: &mut ResourceSet,
        config: &ViewerConfig,
    ) -> Result<Self> {
        let device = &gpu.device;

        let load = |resources: &mut ResourceSet, name: &str| -> Result<TextureId> {
            let texture = Texture::load_or_placeholder(gpu, &config.asset_path(name))?;
            Ok(resources.insert_texture(texture))
        };
        let box_texture = load(resources, &config.textures.boxes)?;
        let ground_texture = load(resources, &config.textures.ground)?;
        let orbiter_texture = load(resources, &config.textures.orbiter)?;
        let fallback_texture = resources.insert_texture(Texture::placeholder(gpu, 8, 7)?);

        let cube =
            resources.create_drawable(gpu, "cube", &geometry::cube(), LIT.layout, LIT.topology)?;
        let plane = resources.create_drawable(
            gpu,
            "ground plane",
            &geometry::plane(),
            LIT.layout,
            LIT.topology,
        )?;
        let tetrahedron = resources.create_drawable(
            gpu,
            "tetrahedron",
            &geometry::tetrahedron(),
            LIT.layout,
            LIT.topology,
        )?;
        let quad = resources.create_drawable(
            gpu,
            "debug quad",
            &geometry::screen_quad(),
            QUAD.layout,
            QUAD.topology,
        )?;

        let shadow_size = config.shadow_map_size;
        let shadow_target =
            resources.create_render_target(gpu, "shadow map", shadow_size, shadow_size, false)?;
        let screen_depth =
            resources.create_render_target(gpu, "screen", gpu.width(), gpu.height(), false)?;

        let scene = Scene::stock(&SceneAssets {
            cube,
            plane,
            tetrahedron,
            box_texture,
            ground_texture,
            orbiter_texture,
        });

        let depth_shader =
            render::build_shader(gpu, "depth shader", include_str!("../shaders/depth.wgsl"))?;
        let lighting_shader = render::build_shader(
            gpu,
            "lighting shader",
            include_str!("../shaders/lighting.wgsl"),
        )?;
        let debug_shader = render::build_shader(
            gpu,
            "depth debug shader",
            include_str!("../shaders/depth_debug.wgsl"),
        )?;

        let vertex_and_fragment = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;

        // group 0: frame uniforms
        let frame_buffer = render::uniform_buffer::<FrameUniforms>(device, "shadow frame uniforms");
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow frame layout"),
            entries: &[render::uniform_layout_entry(0, vertex_and_fragment)],
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow frame bind group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        // group 1: model slot
        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("model layout"),
            entries: &[render::uniform_layout_entry(0, wgpu::ShaderStages::VERTEX)],
        });

        // group 2: surface texture
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
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

        // group 3 (lighting) and group 0 (debug): the shadow map, read texel by texel
        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow map layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Depth,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });
        let shadow_view = resources
            .target(shadow_target)
            .map(|t| t.depth_view())
            .ok_or_else(|| ViewerError::resource("shadow map target missing"))?;
        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow map bind group"),
            layout: &shadow_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(shadow_view),
            }],
        });

        let material_bind_group = |id: TextureId| -> Result<wgpu::BindGroup> {
            let texture = resources
                .texture(id)
                .ok_or_else(|| ViewerError::resource(format!("texture {id:?} missing")))?;
            Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("material bind group"),
                layout: &material_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&texture.sampler),
                    },
                ],
            }))
        };
        let mut materials = HashMap::new();
        for id in scene.instances.iter().filter_map(|i| i.texture) {
            if !materials.contains_key(&id) {
                materials.insert(id, material_bind_group(id)?);
            }
        }
        let fallback_material = material_bind_group(fallback_texture)?;

        let depth_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("depth pipeline layout"),
            bind_group_layouts: &[&frame_layout, &model_layout],
            push_constant_ranges: &[],
        });
        let lighting_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lighting pipeline layout"),
            bind_group_layouts: &[&frame_layout, &model_layout, &material_layout, &shadow_layout],
            push_constant_ranges: &[],
        });
        let debug_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("depth debug pipeline layout"),
            bind_group_layouts: &[&shadow_layout],
            push_constant_ranges: &[],
        });

        let depth_state = wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        };
        let color_target = [Some(wgpu::ColorTargetState {
            format: gpu.config.format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let depth_pipeline = render::build_pipeline(
            gpu,
            &wgpu::RenderPipelineDescriptor {
                label: Some("depth pipeline"),
                layout: Some(&depth_layout),
                vertex: wgpu::VertexState {
                    module: &depth_shader,
                    entry_point: Some("vs"),
                    buffers: &[LIT.layout.buffer_layout()],
                    compilation_options: Default::default(),
                },
                fragment: None,
                primitive: wgpu::PrimitiveState {
                    topology: LIT.topology,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(depth_state.clone()),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            },
        )?;

        let lighting_pipeline = render::build_pipeline(
            gpu,
            &wgpu::RenderPipelineDescriptor {
                label: Some("lighting pipeline"),
                layout: Some(&lighting_layout),
                vertex: wgpu::VertexState {
                    module: &lighting_shader,
                    entry_point: Some("vs"),
                    buffers: &[LIT.layout.buffer_layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &lighting_shader,
                    entry_point: Some("fs"),
                    targets: &color_target,
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: LIT.topology,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(depth_state),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            },
        )?;

        let debug_pipeline = render::build_pipeline(
            gpu,
            &wgpu::RenderPipelineDescriptor {
                label: Some("depth debug pipeline"),
                layout: Some(&debug_layout),
                vertex: wgpu::VertexState {
                    module: &debug_shader,
                    entry_point: Some("vs"),
                    buffers: &[QUAD.layout.buffer_layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &debug_shader,
                    entry_point: Some("fs"),
                    targets: &color_target,
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: QUAD.topology,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            },
        )?;

        log::info!(
            "shadow mapping ready: {} instances, {shadow_size}x{shadow_size} shadow map, bias {}",
            scene.len(),
            config.depth_bias
        );

        Ok(Self {
            scene,
            light: LightState::default(),
            depth_bias: config.depth_bias,
            debug_view: false,
            shadow_size,
            shadow_target,
            screen_depth,
            quad,
            depth_pipeline,
            lighting_pipeline,
            debug_pipeline,
            frame_buffer,
            frame_bind_group,
            model_layout,
            model_slots: Vec::new(),
            materials,
            fallback_material,
            shadow_bind_group,
        })
    }

    fn ensure_model_slots(&mut self, device: &wgpu::Device, count: usize) {
        while self.model_slots.len() < count {
            let index = self.model_slots.len();
            let buffer = render::uniform_buffer::<ModelUniforms>(
                device,
                &format!("model slot {index}"),
            );
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("model slot {index} bind group")),
                layout: &self.model_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            self.model_slots.push(ModelSlot { buffer, bind_group });
        }
    }

    fn draw_instances(
        &self,
        pass: &PassPlan,
        render_pass: &mut wgpu::RenderPass<'_>,
        resources: &ResourceSet,
        textured: bool,
    ) -> Result<()> {
        for item in &pass.draws {
            let slot = item
                .instance
                .and_then(|i| self.model_slots.get(i))
                .ok_or_else(|| {
                    ViewerError::GpuValidation(format!("no model slot for {item:?}"))
                })?;

            render_pass.set_bind_group(1, &slot.bind_group, &[]);
            if textured {
                let material = item
                    .texture
                    .and_then(|id| self.materials.get(&id))
                    .unwrap_or(&self.fallback_material);
                render_pass.set_bind_group(2, material, &[]);
            }
            render::draw_drawable(render_pass, resources, item.drawable, LIT)?;
        }
        Ok(())
    }
}

impl RenderTechnique for ShadowMapRenderer {
    fn plan(&self, inputs: &FrameInputs) -> FramePlan {
        plan_frame(
            &self.scene,
            self.quad,
            self.shadow_size,
            self.debug_view,
            inputs,
        )
    }

    fn prepare(
        &mut self,
        gpu: &GpuContext,
        inputs: &FrameInputs,
        plan: &FramePlan,
    ) -> Result<()> {
        let frame = FrameUniforms::new(inputs, &self.light, self.depth_bias);
        gpu.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::cast_slice(&[frame]));

        self.ensure_model_slots(&gpu.device, plan.instances.len());
        for (slot, model) in self.model_slots.iter().zip(&plan.instances) {
            gpu.queue.write_buffer(
                &slot.buffer,
                0,
                bytemuck::cast_slice(&[ModelUniforms::new(*model)]),
            );
        }
        Ok(())
    }

    fn encode(
        &self,
        pass: &PassPlan,
        render_pass: &mut wgpu::RenderPass<'_>,
        resources: &ResourceSet,
    ) -> Result<()> {
        match pass.kind {
            PassKind::Depth => {
                render_pass.set_pipeline(&self.depth_pipeline);
                render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
                self.draw_instances(pass, render_pass, resources, false)
            }
            PassKind::Lighting => {
                render_pass.set_pipeline(&self.lighting_pipeline);
                render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
                render_pass.set_bind_group(3, &self.shadow_bind_group, &[]);
                self.draw_instances(pass, render_pass, resources, true)
            }
            PassKind::DepthDebug => {
                render_pass.set_pipeline(&self.debug_pipeline);
                render_pass.set_bind_group(0, &self.shadow_bind_group, &[]);
                for item in &pass.draws {
                    render::draw_drawable(render_pass, resources, item.drawable, QUAD)?;
                }
                Ok(())
            }
            PassKind::RayCast => Err(ViewerError::GpuValidation(
                "shadow mapping cannot record a ray cast pass".into(),
            )),
        }
    }

    fn target(&self, target: TargetRef) -> Option<TargetId> {
        match target {
            TargetRef::Screen => Some(self.screen_depth),
            TargetRef::ShadowMap => Some(self.shadow_target),
        }
    }

    fn handle_action(&mut self, action: Action) -> bool {
        apply_action(&mut self.debug_view, action)
    }

    fn resize(
        &mut self,
        gpu: &GpuContext,
        resources: &mut ResourceSet,
        width: u32,
        height: u32,
    ) -> Result<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        resources.resize_target(gpu, self.screen_depth, width, height)
    }
}

/// Apply an action to the debug view flag. Returns true if it was used.
fn apply_action(debug_view: &mut bool, action: Action) -> bool {
    match action {
        Action::ToggleDebugView => {
            *debug_view = !*debug_view;
            log::debug!("debug view {}", if *debug_view { "on" } else { "off" });
            true
        }
        Action::ResetCamera => {
            *debug_view = false;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraController, NavigationBasis, NavigationConfig};

    fn scene() -> Scene {
        Scene::stock(&SceneAssets {
            cube: DrawableId(0),
            plane: DrawableId(1),
            tetrahedron: DrawableId(2),
            box_texture: TextureId(0),
            ground_texture: TextureId(1),
            orbiter_texture: TextureId(2),
        })
    }

    fn inputs(time: f32) -> FrameInputs {
        let camera = CameraController::new(NavigationBasis::Raster, NavigationConfig::default());
        FrameInputs {
            time,
            camera: camera.matrices(800.0 / 600.0),
            camera_position: camera.current_pose().position,
            viewport: Viewport {
                width: 800,
                height: 600,
            },
        }
    }

    fn quad() -> DrawableId {
        DrawableId(3)
    }

    fn second_pass(plan: &FramePlan) -> &PassPlan {
        plan.passes().nth(1).expect("two passes")
    }

    #[test]
    fn lit_frame_is_depth_flush_lighting() {
        let plan = plan_frame(&scene(), quad(), 1024, false, &inputs(0.0));
        assert_eq!(plan.kinds(), vec![PassKind::Depth, PassKind::Lighting]);
        assert!(matches!(plan.steps[1], FrameStep::Flush));
        assert!(plan.validate().is_ok());

        let lighting = second_pass(&plan);
        assert_eq!(lighting.sampled, Some(TargetRef::ShadowMap));
        assert_eq!(lighting.target, TargetRef::Screen);
        assert_eq!(lighting.clear, Clear::color_and_depth([0.1, 0.1, 0.1]));
    }

    #[test]
    fn debug_frame_replaces_lighting() {
        let plan = plan_frame(&scene(), quad(), 1024, true, &inputs(0.0));
        assert_eq!(plan.kinds(), vec![PassKind::Depth, PassKind::DepthDebug]);
        assert!(!plan.kinds().contains(&PassKind::Lighting));
        assert!(plan.validate().is_ok());

        let debug = second_pass(&plan);
        assert_eq!(debug.sampled, Some(TargetRef::ShadowMap));
        assert_eq!(debug.draws.len(), 1);
        assert_eq!(debug.draws[0].drawable, quad());
    }

    #[test]
    fn depth_pass_uses_shadow_resolution() {
        let plan = plan_frame(&scene(), quad(), 2048, false, &inputs(0.0));
        let depth = plan.passes().next().expect("depth pass");
        assert_eq!(depth.target, TargetRef::ShadowMap);
        assert_eq!(depth.clear, Clear::DEPTH_ONLY);
        assert_eq!(depth.viewport, Viewport { width: 2048, height: 2048 });
        assert_eq!(second_pass(&plan).viewport, Viewport { width: 800, height: 600 });
    }

    #[test]
    fn both_passes_share_one_evaluation() {
        let s = scene();
        let plan = plan_frame(&s, quad(), 1024, false, &inputs(2.5));
        assert_eq!(plan.instances, s.evaluate(2.5));
        assert_eq!(plan.time, 2.5);

        let depth = plan.passes().next().expect("depth pass");
        let lighting = second_pass(&plan);
        let slots = |p: &PassPlan| p.draws.iter().map(|d| d.instance).collect::<Vec<_>>();
        assert_eq!(slots(depth), slots(lighting));
        assert_eq!(depth.draws.len(), s.len());
        assert!(depth.draws.iter().all(|d| d.texture.is_none()));
        assert!(lighting.draws.iter().all(|d| d.texture.is_some()));
    }

    #[test]
    fn frame_uniforms_carry_light_and_bias() {
        let light = LightState::default();
        let uniforms = FrameUniforms::new(&inputs(0.0), &light, 0.005);
        assert_eq!(uniforms.light_space, light.light_space().to_cols_array_2d());
        assert_eq!(uniforms.depth_bias, 0.005);
        assert_eq!(uniforms.light_pos, [-3.0, 4.0, -1.5]);
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<ModelUniforms>(), 128);
    }

    #[test]
    fn debug_view_toggles_and_reset_leaves_it() {
        let mut debug_view = false;

        assert!(apply_action(&mut debug_view, Action::ToggleDebugView));
        assert!(debug_view);
        assert!(apply_action(&mut debug_view, Action::ToggleDebugView));
        assert!(!debug_view);

        apply_action(&mut debug_view, Action::ToggleDebugView);
        assert!(apply_action(&mut debug_view, Action::ResetCamera));
        assert!(!debug_view);
        assert!(apply_action(&mut debug_view, Action::ResetCamera));
        assert!(!debug_view);
    }

    #[test]
    fn other_actions_leave_debug_view_alone() {
        let mut debug_view = true;
        assert!(!apply_action(&mut debug_view, Action::ToggleQuality));
        assert!(!apply_action(&mut debug_view, Action::Quit));
        assert!(!apply_action(
            &mut debug_view,
            Action::Move(crate::camera::MoveDirection::Forward)
        ));
        assert!(debug_view);
    }

    #[test]
    fn toggled_flag_drives_the_plan() {
        let mut debug_view = false;
        apply_action(&mut debug_view, Action::ToggleDebugView);
        let plan = plan_frame(&scene(), quad(), 1024, debug_view, &inputs(0.0));
        assert_eq!(plan.kinds(), vec![PassKind::Depth, PassKind::DepthDebug]);

        apply_action(&mut debug_view, Action::ResetCamera);
        let plan = plan_frame(&scene(), quad(), 1024, debug_view, &inputs(0.0));
        assert_eq!(plan.kinds(), vec![PassKind::Depth, PassKind::Lighting]);
    }
}
