//! Records and submits a [`FramePlan`].

use crate::error::{Result, ViewerError};
use crate::gpu::GpuContext;
use crate::render::plan::{FramePlan, FrameStep, PassPlan, TargetRef};
use crate::render::RenderTechnique;
use crate::resources::ResourceSet;

/// Walks a frame plan in order.
///
/// Passes between two flushes share one command encoder. A
/// [`FrameStep::Flush`] submits the encoder before recording continues, so a
/// target written before the flush is complete when later passes sample it.
/// The whole frame runs inside a validation error scope. A captured error ends
/// the session as [`ViewerError::GpuValidation`].
#[derive(Debug, Default)]
pub struct FrameExecutor {
    frames: u64,
}

impl FrameExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames presented so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Render and present one frame. Returns false if the frame was dropped.
    pub fn execute(
        &mut self,
        gpu: &mut GpuContext,
        resources: &ResourceSet,
        technique: &dyn RenderTechnique,
        plan: &FramePlan,
    ) -> Result<bool> {
        plan.validate()?;

        let Some(frame) = gpu.acquire_frame()? else {
            return Ok(false);
        };
        let screen_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let gpu = &*gpu;
        let recorded = gpu.validated(|device| -> Result<()> {
            let mut encoder = Self::encoder(device, 0);
            let mut batch = 0;

            for step in &plan.steps {
                match step {
                    FrameStep::Pass(pass) => {
                        Self::record_pass(
                            &mut encoder,
                            pass,
                            &screen_view,
                            resources,
                            technique,
                        )?;
                    }
                    FrameStep::Flush => {
                        batch += 1;
                        let finished = std::mem::replace(&mut encoder, Self::encoder(device, batch));
                        gpu.queue.submit(std::iter::once(finished.finish()));
                    }
                }
            }

            gpu.queue.submit(std::iter::once(encoder.finish()));
            Ok(())
        });

        match recorded {
            Err(error) => return Err(ViewerError::GpuValidation(error.to_string())),
            Ok(Err(error)) => return Err(error),
            Ok(Ok(())) => {}
        }

        frame.present();
        self.frames += 1;
        if self.frames == 1 {
            log::debug!("first frame presented: {:?}", plan.kinds());
        }
        Ok(true)
    }

    fn encoder(device: &wgpu::Device, batch: u32) -> wgpu::CommandEncoder {
        device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(&format!("frame encoder {batch}")),
        })
    }

    fn record_pass(
        encoder: &mut wgpu::CommandEncoder,
        pass: &PassPlan,
        screen_view: &wgpu::TextureView,
        resources: &ResourceSet,
        technique: &dyn RenderTechnique,
    ) -> Result<()> {
        let owned = technique
            .target(pass.target)
            .and_then(|id| resources.target(id));

        let color_view = if pass.kind.writes_color() {
            let view = match pass.target {
                TargetRef::Screen => Some(screen_view),
                TargetRef::ShadowMap => owned.and_then(|t| t.color_view()),
            };
            Some(view.ok_or_else(|| {
                ViewerError::GpuValidation(format!(
                    "{} needs a color attachment on {:?}",
                    pass.kind.label(),
                    pass.target
                ))
            })?)
        } else {
            None
        };

        let depth_view = if pass.kind.writes_depth() {
            Some(owned.map(|t| t.depth_view()).ok_or_else(|| {
                ViewerError::GpuValidation(format!(
                    "{} needs a depth attachment on {:?}",
                    pass.kind.label(),
                    pass.target
                ))
            })?)
        } else {
            None
        };

        let color_load = match pass.clear.color {
            Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
            None => wgpu::LoadOp::Load,
        };
        let depth_load = match pass.clear.depth {
            Some(depth) => wgpu::LoadOp::Clear(depth),
            None => wgpu::LoadOp::Load,
        };

        let color_attachments = [color_view.map(|view| wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: color_load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })];

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(pass.kind.label()),
            color_attachments: &color_attachments[..usize::from(color_view.is_some())],
            depth_stencil_attachment: depth_view.map(|view| {
                wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_viewport(
            0.0,
            0.0,
            pass.viewport.width as f32,
            pass.viewport.height as f32,
            0.0,
            1.0,
        );

        technique.encode(pass, &mut render_pass, resources)
    }
}
