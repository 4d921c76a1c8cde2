mod display;

use anyhow::{Context, Result};
use clap::Parser;
use depthview_camera::CameraPose;
use depthview_input::{Command, KeyBindings};
use depthview_present_wgpu::FramebufferPresenter;
use depthview_session::{Display, FrameLoop, FrameStatus, LoopState, StopSignal, ViewerConfig};
use depthview_stream::{DeviceRegistry, FrameSource, SyntheticConfig, SyntheticRegistry};
use display::WinitDisplay;
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "depthview-desktop", about = "Live depth camera point cloud viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Viewer config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Device to open
    #[arg(short, long, default_value = "synthetic-rgbd")]
    device: String,

    /// Initial decimation level (0-2)
    #[arg(long)]
    decimation: Option<u8>,

    /// Start textured from the color stream
    #[arg(long)]
    color: bool,

    /// Composite points in arrival order instead of depth order
    #[arg(long)]
    no_painter: bool,

    /// Snapshot output path
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Point cloud export path
    #[arg(long)]
    export: Option<PathBuf>,

    /// Depth stream width
    #[arg(long, default_value_t = 640)]
    width: usize,

    /// Depth stream height
    #[arg(long, default_value_t = 480)]
    height: usize,

    /// Depth stream frame rate
    #[arg(long, default_value_t = 30)]
    fps: u32,
}

impl Cli {
    fn viewer_config(&self) -> Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)
                .with_context(|| format!("loading viewer config {}", path.display()))?,
            None => ViewerConfig::default(),
        };
        if let Some(level) = self.decimation {
            config.decimation_level = level;
        }
        if self.color {
            config.use_color = true;
        }
        if self.no_painter {
            config.painter = false;
        }
        if let Some(path) = &self.snapshot {
            config.snapshot_path = path.clone();
        }
        if let Some(path) = &self.export {
            config.export_path = path.clone();
        }
        config.validate()?;
        Ok(config)
    }

    fn stream_config(&self) -> SyntheticConfig {
        SyntheticConfig {
            width: self.width,
            height: self.height,
            color_width: self.width,
            color_height: self.height,
            fps: Some(self.fps),
            ..SyntheticConfig::default()
        }
    }
}

/// Window, device and the passes drawn into the surface.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    presenter: FramebufferPresenter,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(
        event_loop: &ActiveEventLoop,
        egui_ctx: &EguiContext,
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(false);
        let window = Arc::new(event_loop.create_window(attrs).context("creating window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).context("creating surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("depthview_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("creating device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut presenter = FramebufferPresenter::new(&device, surface_format, width, height);
        presenter.resize(&queue, config.width, config.height);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            ?surface_format,
            "GPU initialized"
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            presenter,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.presenter.resize(&self.queue, self.config.width, self.config.height);
    }

    /// Run `ui` and paint its output over `view`.
    fn paint_ui(&mut self, egui_ctx: &EguiContext, view: &wgpu::TextureView, ui: impl FnMut(&EguiContext)) {
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, ui);
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

/// Status overlay, toggled with F1.
fn draw_overlay(
    ctx: &EguiContext,
    device: &str,
    status: &FrameStatus,
    pose: &CameraPose,
    fps: f64,
    keys: &KeyBindings,
) {
    egui::Window::new("depthview")
        .default_pos([8.0, 8.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(format!("Device: {device}"));
            ui.label(format!("State: {:?}  Frame: {}", status.state, status.frame_number));
            ui.label(format!(
                "Points: {} drawn / {} valid / {} total",
                status.stats.drawn, status.stats.finite, status.stats.input
            ));
            ui.label(format!(
                "Frame time: {:.1} ms ({fps:.0} fps)",
                status.frame_time.as_secs_f64() * 1000.0
            ));
            ui.separator();

            ui.label(format!(
                "Decimation: level {} (x{})",
                status.decimation_level,
                1u32 << status.decimation_level
            ));
            ui.label(format!("Scale to decimation: {}", status.scale_to_decimation));
            let color = match (status.use_color, status.color_available) {
                (false, _) => "off",
                (true, true) => "on",
                (true, false) => "on (no color stream)",
            };
            ui.label(format!("Color: {color}"));
            ui.separator();

            ui.label(format!(
                "Pitch {:.1}°  Yaw {:.1}°  Distance {:.2}",
                pose.pitch.to_degrees(),
                pose.yaw.to_degrees(),
                pose.distance
            ));
            ui.label(format!(
                "Translation: ({:.2}, {:.2}, {:.2})",
                pose.translation.x, pose.translation.y, pose.translation.z
            ));
            ui.separator();

            ui.small(format!(
                "F1 overlay | {} reset | {} pause | {} decimate | {} scale | {} color | {} snapshot | {} export | {} quit",
                keys.reset,
                keys.pause,
                keys.decimate,
                keys.scale,
                keys.color,
                keys.snapshot,
                keys.export,
                keys.quit.join("/"),
            ));
        });
}

struct GpuApp {
    device: String,
    title: String,
    keys: KeyBindings,
    frame_loop: FrameLoop<Box<dyn FrameSource + Send>>,
    display: WinitDisplay,
    show_overlay: bool,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(device: String, config: ViewerConfig, frame_loop: FrameLoop<Box<dyn FrameSource + Send>>) -> Self {
        Self {
            device,
            title: config.window_title,
            keys: config.keys,
            frame_loop,
            display: WinitDisplay::new(),
            show_overlay: true,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    /// Stop the frame loop if it is still running, then leave the event loop.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if !self.display.is_closed() {
            if self.frame_loop.state() != LoopState::Stopped {
                self.frame_loop.apply(Command::Quit);
            }
            self.display.close();
            let report = self.frame_loop.report();
            tracing::info!(
                device = %report.device,
                frames = report.frames_rendered,
                errors = report.acquisition_errors,
                snapshots = report.snapshots,
                exports = report.exports,
                "viewer closed"
            );
        }
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if self.frame_loop.step(&mut self.display) == LoopState::Stopped {
            self.shutdown(event_loop);
            return;
        }

        let Some(gpu) = &mut self.gpu else {
            return;
        };
        if let Some(frame) = self.display.take_frame() {
            gpu.presenter.upload(&gpu.device, &gpu.queue, frame);
        }

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.presenter.render(&gpu.device, &gpu.queue, &view);

        if self.show_overlay {
            let status = self.frame_loop.status();
            let pose = self.frame_loop.camera().pose();
            let fps = self.frame_loop.timer().fps();
            let (device, keys) = (&self.device, &self.keys);
            gpu.paint_ui(&self.egui_ctx, &view, |ctx| {
                draw_overlay(ctx, device, &status, &pose, fps, keys);
            });
        } else {
            gpu.paint_ui(&self.egui_ctx, &view, |_| {});
        }

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let framebuffer = self.frame_loop.framebuffer();
        let (width, height) = (framebuffer.width() as u32, framebuffer.height() as u32);
        match Gpu::new(event_loop, &self.egui_ctx, &self.title, width, height) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("failed to initialize graphics: {e:#}");
                self.shutdown(event_loop);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let consumed = match &mut self.gpu {
            Some(gpu) => gpu.egui_winit.on_window_event(&gpu.window, &event).consumed,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.display
                    .cursor_moved(position.x as f32, position.y as f32);
            }
            // Releases always reach the camera so a drag never sticks under the overlay.
            WindowEvent::MouseInput { state, button, .. }
                if !consumed || state == ElementState::Released =>
            {
                self.display.mouse_input(state, button);
            }
            WindowEvent::MouseWheel { delta, .. } if !consumed => {
                self.display.mouse_wheel(delta);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key,
                        logical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } if !consumed => {
                if physical_key == PhysicalKey::Code(KeyCode::F1) {
                    self.show_overlay = !self.show_overlay;
                } else {
                    self.display.key_pressed(&logical_key);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("depthview-desktop starting");

    let config = cli.viewer_config()?;
    let registry = SyntheticRegistry::new(cli.stream_config());
    let source = registry
        .open(&cli.device)
        .with_context(|| format!("opening device {}", cli.device))?;
    let frame_loop = FrameLoop::new(source, config.clone(), StopSignal::new())?.named(cli.device.as_str());

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(cli.device, config, frame_loop);
    event_loop.run_app(&mut app)?;

    Ok(())
}
