use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use depthview_camera::CameraPose;
use depthview_input::Command;
use depthview_session::{
    Display, DisplayFactory, FrameLoop, HeadlessDisplay, SessionManager, StopSignal,
    ViewerConfig,
};
use depthview_stream::{DeviceRegistry, FrameSource, SyntheticConfig, SyntheticRegistry};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "depthview-cli", about = "CLI tool for depthview operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StreamArgs {
    /// Depth stream width
    #[arg(long, default_value_t = 640)]
    width: usize,

    /// Depth stream height
    #[arg(long, default_value_t = 480)]
    height: usize,

    /// Depth stream frame rate; 0 delivers frames as fast as they are requested
    #[arg(long, default_value_t = 30)]
    fps: u32,
}

impl StreamArgs {
    fn registry(&self) -> SyntheticRegistry {
        SyntheticRegistry::new(SyntheticConfig {
            width: self.width,
            height: self.height,
            color_width: self.width,
            color_height: self.height,
            fps: (self.fps > 0).then_some(self.fps),
            ..SyntheticConfig::default()
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info, available devices and their depth intrinsics
    Info {
        #[command(flatten)]
        stream: StreamArgs,
    },
    /// Render a fixed number of frames without a window
    Render {
        /// Device to open
        #[arg(short, long, default_value = "synthetic")]
        device: String,
        /// Number of frames to render
        #[arg(short = 'n', long, default_value = "30")]
        frames: u64,
        /// Give up after this many failed frame acquisitions
        #[arg(long, default_value = "30")]
        max_failures: u64,
        /// Viewer config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Decimation level (0-2)
        #[arg(long)]
        decimation: Option<u8>,
        /// Texture from the color stream
        #[arg(long)]
        color: bool,
        /// Orbit yaw in degrees
        #[arg(long, default_value = "0")]
        yaw: f32,
        /// Orbit pitch in degrees
        #[arg(long, default_value = "0")]
        pitch: f32,
        /// Write the last frame as PNG
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Write the last point cloud as PLY
        #[arg(long)]
        export: Option<PathBuf>,
        #[command(flatten)]
        stream: StreamArgs,
    },
    /// Run a background session for a while, then stop it
    Run {
        /// Device to open
        #[arg(short, long, default_value = "synthetic")]
        device: String,
        /// Seconds to keep the session running
        #[arg(short, long, default_value = "2")]
        seconds: f64,
        /// Viewer config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        stream: StreamArgs,
    },
    /// Write the default viewer config as JSON
    Config {
        /// Output file; stdout when absent
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ViewerConfig> {
    match path {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("loading viewer config {}", path.display())),
        None => Ok(ViewerConfig::default()),
    }
}

fn session_duration(seconds: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(seconds.max(0.0))
        .with_context(|| format!("--seconds {seconds} is not a usable duration"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info { stream } => {
            println!("depthview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", depthview_common::crate_info());
            println!("camera: {}", depthview_camera::crate_info());
            println!("input: {}", depthview_input::crate_info());
            println!("render: {}", depthview_render::crate_info());
            println!("stream: {}", depthview_stream::crate_info());
            println!("persist: {}", depthview_persist::crate_info());
            println!("session: {}", depthview_session::crate_info());

            let registry = stream.registry();
            for device in registry.devices() {
                let source = registry.open(&device)?;
                let intrinsics = source.depth_intrinsics()?;
                println!("device {device}: {}", serde_json::to_string(&intrinsics)?);
            }
        }
        Commands::Render {
            device,
            frames,
            max_failures,
            config,
            decimation,
            color,
            yaw,
            pitch,
            snapshot,
            export,
            stream,
        } => {
            let mut config = load_config(config.as_ref())?;
            if let Some(level) = decimation {
                config.decimation_level = level;
            }
            config.use_color |= color;
            if yaw != 0.0 || pitch != 0.0 {
                let base = config.camera.unwrap_or_default();
                config.camera = Some(CameraPose {
                    yaw: yaw.to_radians(),
                    pitch: pitch.to_radians(),
                    ..base
                });
            }
            if let Some(path) = &snapshot {
                config.snapshot_path = path.clone();
            }
            if let Some(path) = &export {
                config.export_path = path.clone();
            }

            let source = stream.registry().open(&device)?;
            let mut frame_loop = FrameLoop::new(source, config, StopSignal::new())?.named(device.as_str());
            let mut display = HeadlessDisplay::new();

            let rendered = frame_loop.render_frames(&mut display, frames, max_failures);
            if rendered < frames {
                tracing::warn!(rendered, requested = frames, "rendered fewer frames than requested");
            }
            if snapshot.is_some() {
                frame_loop.apply(Command::SaveSnapshot);
            }
            if export.is_some() {
                frame_loop.apply(Command::ExportPointCloud);
            }
            frame_loop.apply(Command::Quit);
            display.close();

            let status = frame_loop.status();
            tracing::info!(
                drawn = status.stats.drawn,
                finite = status.stats.finite,
                input = status.stats.input,
                "last frame"
            );
            println!("{}", serde_json::to_string_pretty(&frame_loop.report())?);
        }
        Commands::Run {
            device,
            seconds,
            config,
            stream,
        } => {
            let config = load_config(config.as_ref())?;
            let factory: DisplayFactory = Box::new(|_: &str, _: &ViewerConfig| -> Box<dyn Display + Send> {
                Box::new(HeadlessDisplay::new().with_idle_wait(Duration::from_millis(1)))
            });
            let manager = SessionManager::new(Arc::new(stream.registry()), factory, config);

            let duration = session_duration(seconds)?;
            manager.start(&device)?;
            std::thread::sleep(duration);
            let reports = manager.stop();
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        Commands::Config { output } => {
            let config = ViewerConfig::default();
            match output {
                Some(path) => {
                    config.save(&path)?;
                    println!("Wrote {}", path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&config)?),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_seconds_clamp_to_zero() {
        assert_eq!(session_duration(-3.0).unwrap(), Duration::ZERO);
        assert_eq!(session_duration(1.5).unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn unbounded_seconds_are_rejected() {
        assert!(session_duration(f64::INFINITY).is_err());
        assert!(session_duration(1e30).is_err());
    }
}
