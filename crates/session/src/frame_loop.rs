use std::time::{Duration, Instant};

use depthview_camera::{CameraPose, CameraState};
use depthview_common::{PointBatch, RgbImage};
use depthview_input::{Command, InputController};
use depthview_persist::{export_ply, save_png};
use depthview_render::{PointCloudRenderer, RenderStats, Renderer};
use depthview_stream::{
    Colorizer, DecimationFilter, FrameSource, Intrinsics, PointCloudBuilder, TextureSpace,
};
use serde::Serialize;

use crate::{Display, FrameStatus, FrameTimer, SessionError, StopSignal, ViewerConfig};

const TIMER_CAPACITY: usize = 120;

/// Run state of a frame loop. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoopState {
    Running,
    Paused,
    Stopped,
}

/// Summary returned when a frame loop ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub device: String,
    pub frames_rendered: u64,
    pub acquisition_errors: u64,
    pub snapshots: u64,
    pub exports: u64,
    pub average_frame_time: Duration,
    pub final_pose: CameraPose,
}

/// Geometry and texture of the last rendered frame, kept for export.
struct RetainedFrame {
    batch: PointBatch,
    texture: RgbImage,
}

/// Per-device render loop: acquire, build geometry, render, present, then
/// handle input.
///
/// Drive it with [`FrameLoop::run`] on a dedicated thread, or call
/// [`FrameLoop::step`] from an event loop that owns the window.
pub struct FrameLoop<S: FrameSource> {
    device: String,
    source: S,
    config: ViewerConfig,
    stop: StopSignal,
    stopped: bool,
    camera: CameraState,
    input: InputController,
    renderer: Box<dyn Renderer<Output = RenderStats> + Send>,
    decimate: DecimationFilter,
    colorizer: Colorizer,
    builder: PointCloudBuilder,
    intrinsics: Intrinsics,
    framebuffer: RgbImage,
    retained: Option<RetainedFrame>,
    timer: FrameTimer,
    frame_number: u64,
    color_available: bool,
    last_stats: RenderStats,
    last_frame_time: Duration,
    frames_rendered: u64,
    acquisition_errors: u64,
    snapshots: u64,
    exports: u64,
}

impl<S: FrameSource> FrameLoop<S> {
    /// Prepare a session on `source`.
    ///
    /// Reads the depth intrinsics, which is the only fatal step: the
    /// framebuffer takes the full depth resolution from them.
    pub fn new(source: S, config: ViewerConfig, stop: StopSignal) -> Result<Self, SessionError> {
        config.validate()?;
        let intrinsics = source.depth_intrinsics()?;

        let mut camera = CameraState::new();
        camera.set_decimation_level(config.decimation_level);
        camera.scale_to_decimation = config.scale_to_decimation;
        camera.use_color = config.use_color;
        if let Some(pose) = config.camera {
            camera.set_pose(pose);
        }

        tracing::info!(
            width = intrinsics.width,
            height = intrinsics.height,
            decimation = camera.decimation_level(),
            "frame loop ready"
        );

        Ok(Self {
            device: "session".to_string(),
            input: InputController::new(intrinsics.width, intrinsics.height),
            renderer: Box::new(PointCloudRenderer::new().with_painter(config.painter)),
            decimate: DecimationFilter::new(camera.decimation_magnitude()),
            colorizer: Colorizer::default(),
            builder: PointCloudBuilder::new(),
            framebuffer: RgbImage::new(intrinsics.width, intrinsics.height),
            intrinsics,
            source,
            config,
            stop,
            stopped: false,
            camera,
            retained: None,
            timer: FrameTimer::new(TIMER_CAPACITY),
            frame_number: 0,
            color_available: false,
            last_stats: RenderStats::default(),
            last_frame_time: Duration::ZERO,
            frames_rendered: 0,
            acquisition_errors: 0,
            snapshots: 0,
            exports: 0,
        })
    }

    /// Label used in logs and the session report.
    pub fn named(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    pub fn state(&self) -> LoopState {
        if self.stopped {
            LoopState::Stopped
        } else if self.camera.paused {
            LoopState::Paused
        } else {
            LoopState::Running
        }
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn framebuffer(&self) -> &RgbImage {
        &self.framebuffer
    }

    /// Full-resolution depth intrinsics read at start-up.
    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    /// Magnitude currently applied by the decimation stage.
    pub fn decimation_magnitude(&self) -> u32 {
        self.decimate.magnitude()
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    pub fn status(&self) -> FrameStatus {
        FrameStatus {
            state: self.state(),
            frame_number: self.frame_number,
            decimation_level: self.camera.decimation_level(),
            scale_to_decimation: self.camera.scale_to_decimation,
            use_color: self.camera.use_color,
            color_available: self.color_available,
            stats: self.last_stats,
            frame_time: self.last_frame_time,
        }
    }

    /// One iteration: render a frame unless paused, then dispatch pointer
    /// events and handle at most one key.
    pub fn step<D: Display + ?Sized>(&mut self, display: &mut D) -> LoopState {
        if self.stop.is_stopped() && !self.stopped {
            tracing::info!(device = %self.device, "stop signal received");
            self.stopped = true;
        }
        if self.stopped {
            return LoopState::Stopped;
        }

        if !self.camera.paused {
            self.render_frame(display);
        }

        display.dispatch_pointer_events(&mut self.input.bind(&mut self.camera));

        if let Some(key) = display.poll_key() {
            match self.config.keys.command_for(key) {
                Some(command) => self.apply(command),
                None => tracing::trace!(?key, "key ignored"),
            }
        }

        self.state()
    }

    /// Step until stopped, close the display and report.
    pub fn run<D: Display + ?Sized>(&mut self, display: &mut D) -> SessionReport {
        tracing::info!(device = %self.device, "session started");
        while self.step(display) != LoopState::Stopped {}
        display.close();

        let report = self.report();
        tracing::info!(
            device = %report.device,
            frames = report.frames_rendered,
            errors = report.acquisition_errors,
            "session ended"
        );
        report
    }

    /// Step until `frames` frames have rendered, the loop stops, or
    /// `max_failures` acquisitions have failed. Returns the frames rendered
    /// by this call.
    pub fn render_frames<D: Display + ?Sized>(&mut self, display: &mut D, frames: u64, max_failures: u64) -> u64 {
        let rendered_before = self.frames_rendered;
        let failed_before = self.acquisition_errors;
        while self.frames_rendered - rendered_before < frames {
            if self.acquisition_errors - failed_before >= max_failures {
                tracing::warn!(
                    device = %self.device,
                    failures = max_failures,
                    "giving up after repeated acquisition failures"
                );
                break;
            }
            if self.step(display) == LoopState::Stopped {
                break;
            }
        }
        self.frames_rendered - rendered_before
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            device: self.device.clone(),
            frames_rendered: self.frames_rendered,
            acquisition_errors: self.acquisition_errors,
            snapshots: self.snapshots,
            exports: self.exports,
            average_frame_time: self.timer.average(),
            final_pose: self.camera.pose(),
        }
    }

    /// Execute a viewer command.
    pub fn apply(&mut self, command: Command) {
        tracing::debug!(?command, "applying command");
        match command {
            Command::ResetCamera => self.camera.reset(),
            Command::TogglePause => {
                let paused = self.camera.toggle_pause();
                tracing::info!(paused, "pause toggled");
            }
            Command::CycleDecimation => {
                let level = self.camera.cycle_decimation();
                self.decimate.set_magnitude(self.camera.decimation_magnitude());
                tracing::info!(level, magnitude = self.decimate.magnitude(), "decimation changed");
            }
            Command::ToggleScale => {
                let scale = self.camera.toggle_scale();
                tracing::info!(scale, "scale-to-decimation toggled");
            }
            Command::ToggleColor => {
                let color = self.camera.toggle_color();
                if color && !self.color_available {
                    tracing::info!("color requested but the device has no color stream; using depth colormap");
                } else {
                    tracing::info!(color, "color mode toggled");
                }
            }
            Command::SaveSnapshot => match save_png(&self.framebuffer, &self.config.snapshot_path) {
                Ok(()) => self.snapshots += 1,
                Err(err) => tracing::error!(%err, "snapshot failed"),
            },
            Command::ExportPointCloud => self.export(),
            Command::Quit => {
                tracing::info!(device = %self.device, "quit requested");
                self.stopped = true;
                self.stop.stop();
            }
        }
    }

    fn export(&mut self) {
        let Some(frame) = &self.retained else {
            tracing::warn!("no frame rendered yet; nothing to export");
            return;
        };
        match export_ply(&frame.batch, &frame.texture, &self.config.export_path) {
            Ok(_) => self.exports += 1,
            Err(err) => tracing::error!(%err, "point cloud export failed"),
        }
    }

    fn render_frame<D: Display + ?Sized>(&mut self, display: &mut D) {
        let _span = tracing::info_span!("frame", device = %self.device).entered();
        let start = Instant::now();

        let frames = match self.source.wait_for_frames() {
            Ok(frames) => frames,
            Err(err) => {
                self.acquisition_errors += 1;
                tracing::warn!(%err, "frame acquisition failed");
                return;
            }
        };
        self.frame_number = frames.number;
        self.color_available = frames.color.is_some();

        let depth = self.decimate.process(&frames.depth);
        let texture = match frames.color {
            Some(color) if self.camera.use_color => {
                self.builder.map_to(TextureSpace::Color(color.intrinsics));
                color.image
            }
            _ => {
                self.builder.map_to(TextureSpace::Depth);
                self.colorizer.colorize(&depth)
            }
        };
        let batch = self.builder.calculate(&depth);

        self.framebuffer.clear();
        let stats = self
            .renderer
            .render(&mut self.framebuffer, &batch, &texture, &self.camera);

        self.last_stats = stats;
        self.last_frame_time = start.elapsed();
        self.timer.record(self.last_frame_time);
        self.frames_rendered += 1;
        self.retained = Some(RetainedFrame { batch, texture });

        display.present(&self.framebuffer, &self.status());

        let interval = self.config.stats_interval;
        if interval > 0 && self.frames_rendered % interval == 0 {
            tracing::info!(
                frames = self.frames_rendered,
                avg_ms = self.timer.average().as_secs_f64() * 1e3,
                min_ms = self.timer.min().as_secs_f64() * 1e3,
                max_ms = self.timer.max().as_secs_f64() * 1e3,
                fps = self.timer.fps(),
                drawn = stats.drawn,
                "frame stats"
            );
        }
    }
}
