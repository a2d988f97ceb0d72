use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::camera::CameraController;
use crate::config::{Technique, ViewerConfig};
use crate::error::{Result, ViewerError};
use crate::gpu::GpuContext;
use crate::input::{Action, Bindings, InputEvent, InputQueue};
use crate::render::{
    FrameExecutor, FrameInputs, RayCastRenderer, RenderTechnique, ShadowMapRenderer, Viewport,
};
use crate::resources::ResourceSet;

/// What one frame's input asks of the rest of the viewer.
#[derive(Debug, Default, PartialEq)]
struct Routed {
    /// Actions for the renderer, in arrival order.
    actions: Vec<Action>,
    /// Latest non-zero window size.
    resize: Option<(u32, u32)>,
    quit: bool,
}

/// Apply a frame's worth of events to the camera and collect the rest.
///
/// Pointer positions are read against `viewport`, whose center is where the
/// pointer was parked at the end of the previous frame.
fn route_events(
    events: impl IntoIterator<Item = InputEvent>,
    bindings: &Bindings,
    camera: &mut CameraController,
    viewport: Viewport,
) -> Routed {
    let mut routed = Routed::default();
    for event in events {
        match event {
            InputEvent::PointerMoved { x, y } => {
                camera.apply_pointer_position(x, y, viewport.width, viewport.height);
            }
            InputEvent::Key { key, action } => match bindings.resolve(key, action) {
                Some(Action::Move(direction)) => camera.step(direction),
                Some(Action::Quit) => routed.quit = true,
                Some(Action::ResetCamera) => {
                    camera.reset();
                    routed.actions.push(Action::ResetCamera);
                }
                Some(other) => routed.actions.push(other),
                None => {}
            },
            InputEvent::Resized { width, height } => {
                if width > 0 && height > 0 {
                    routed.resize = Some((width, height));
                }
            }
        }
    }
    routed
}

/// A running viewer: window, device, renderer and navigation.
struct Viewer {
    // Dropped in order: renderer state before the resources it points into,
    // resources before the device.
    technique: Box<dyn RenderTechnique>,
    resources: ResourceSet,
    gpu: GpuContext,
    window: Arc<Window>,

    executor: FrameExecutor,
    camera: CameraController,
    bindings: Bindings,
    input: InputQueue,
    start_time: Instant,
}

impl Viewer {
    fn new(event_loop: &ActiveEventLoop, config: &ViewerConfig) -> Result<Self> {
        let attributes = WindowAttributes::default()
            .with_title(config.title.as_str())
            .with_inner_size(PhysicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let gpu = GpuContext::new(window.clone(), config.vsync)?;
        let mut resources = ResourceSet::new();
        let technique: Box<dyn RenderTechnique> = match config.technique {
            Technique::ShadowMap => {
                Box::new(ShadowMapRenderer::new(&gpu, &mut resources, config)?)
            }
            Technique::RayCast => Box::new(RayCastRenderer::new(&gpu, &mut resources, config)?),
        };

        window.set_cursor_visible(false);
        park_pointer(&window, gpu.width(), gpu.height());
        log::info!(
            "{} viewer running at {}x{}",
            config.technique.name(),
            gpu.width(),
            gpu.height()
        );

        Ok(Self {
            technique,
            resources,
            gpu,
            window,
            executor: FrameExecutor::new(),
            camera: CameraController::new(
                config.technique.navigation_basis(),
                config.navigation,
            ),
            bindings: Bindings::for_technique(config.technique),
            input: InputQueue::new(),
            start_time: Instant::now(),
        })
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            width: self.gpu.width(),
            height: self.gpu.height(),
        }
    }

    /// Run one frame. Returns false once the viewer should close.
    fn frame(&mut self) -> Result<bool> {
        let time = self.start_time.elapsed().as_secs_f32();

        let events: Vec<InputEvent> = self.input.drain().collect();
        let viewport = self.viewport();
        let routed = route_events(events, &self.bindings, &mut self.camera, viewport);
        if routed.quit || self.input.close_requested() {
            return Ok(false);
        }

        for action in routed.actions {
            self.technique.handle_action(action);
        }
        if let Some((width, height)) = routed.resize {
            self.gpu.resize(width, height);
            self.technique
                .resize(&self.gpu, &mut self.resources, width, height)?;
            log::debug!("resized to {width}x{height}");
        }
        // Offsets next frame are measured from the center of the current size.
        park_pointer(&self.window, self.gpu.width(), self.gpu.height());

        let viewport = self.viewport();
        let inputs = FrameInputs {
            time,
            camera: self.camera.matrices(self.gpu.aspect()),
            camera_position: self.camera.current_pose().position,
            viewport,
        };

        let plan = self.technique.plan(&inputs);
        self.technique.prepare(&self.gpu, &inputs, &plan)?;
        self.executor.execute(
            &mut self.gpu,
            &self.resources,
            self.technique.as_ref(),
            &plan,
        )?;
        Ok(true)
    }
}

/// Where the pointer rests between frames: the viewport center.
fn parked_position(width: u32, height: u32) -> PhysicalPosition<f64> {
    PhysicalPosition::new(f64::from(width) / 2.0, f64::from(height) / 2.0)
}

fn park_pointer(window: &Window, width: u32, height: u32) {
    if let Err(err) = window.set_cursor_position(parked_position(width, height)) {
        log::trace!("cannot re-center pointer: {err}");
    }
}

enum ViewerApp {
    Pending(ViewerConfig),
    Running(Box<Viewer>),
    Failed(ViewerError),
    Closed,
}

impl ViewerApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: ViewerError) {
        log::error!("{error}");
        *self = Self::Failed(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Self::Pending(config) = self else {
            return;
        };
        match Viewer::new(event_loop, config) {
            Ok(viewer) => {
                viewer.window.request_redraw();
                *self = Self::Running(Box::new(viewer));
            }
            Err(error) => self.fail(event_loop, error),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Self::Running(viewer) = self else {
            return;
        };

        viewer.input.handle_window_event(&event);

        if let WindowEvent::RedrawRequested = event {
            match viewer.frame() {
                Ok(true) => viewer.window.request_redraw(),
                Ok(false) => {
                    log::info!("closing after {} frames", viewer.executor.frames());
                    *self = Self::Closed;
                    event_loop.exit();
                }
                Err(error) => self.fail(event_loop, error),
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Self::Running(viewer) = self {
            viewer.window.request_redraw();
        }
    }
}

/// Open the window and run the viewer until it is closed.
///
/// Startup failures and validation errors during a frame are returned. GPU
/// resources are released before this returns.
pub fn run(config: ViewerConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::Pending(config);
    event_loop.run_app(&mut app)?;

    match app {
        ViewerApp::Failed(error) => Err(error),
        _ => Ok(()),
    }
}
