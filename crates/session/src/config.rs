use std::path::{Path, PathBuf};

use depthview_camera::{CameraPose, MAX_DECIMATION_LEVEL};
use depthview_input::KeyBindings;
use serde::{Deserialize, Serialize};

/// Errors from loading or validating a viewer configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("decimation level {0} out of range (max {max})", max = MAX_DECIMATION_LEVEL)]
    DecimationLevel(u8),

    #[error("unknown key names in bindings: {0:?}")]
    KeyNames(Vec<String>),
}

/// Settings for one viewing session. Every field has a default, so a config
/// file only needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window_title: String,
    /// Where the snapshot command writes the framebuffer.
    pub snapshot_path: PathBuf,
    /// Where the export command writes the point cloud.
    pub export_path: PathBuf,
    /// Depth-sort points before compositing.
    pub painter: bool,
    pub decimation_level: u8,
    pub scale_to_decimation: bool,
    pub use_color: bool,
    /// Initial pose; the default pose when absent.
    pub camera: Option<CameraPose>,
    pub keys: KeyBindings,
    /// Log frame statistics every this many rendered frames; 0 disables.
    pub stats_interval: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_title: "RealSense".to_string(),
            snapshot_path: PathBuf::from("./out.png"),
            export_path: PathBuf::from("./out.ply"),
            painter: true,
            decimation_level: 1,
            scale_to_decimation: true,
            use_color: false,
            camera: None,
            keys: KeyBindings::default(),
            stats_interval: 120,
        }
    }
}

impl ViewerConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config: Self = serde_json::from_reader(std::fs::File::open(path)?)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "viewer config loaded");
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        serde_json::to_writer_pretty(std::fs::File::create(path)?, self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decimation_level > MAX_DECIMATION_LEVEL {
            return Err(ConfigError::DecimationLevel(self.decimation_level));
        }
        let invalid = self.keys.invalid_names();
        if !invalid.is_empty() {
            return Err(ConfigError::KeyNames(invalid.into_iter().map(str::to_string).collect()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depthview_input::{Command, Key};

    #[test]
    fn defaults_match_the_classic_viewer() {
        let config = ViewerConfig::default();
        assert_eq!(config.window_title, "RealSense");
        assert_eq!(config.snapshot_path, PathBuf::from("./out.png"));
        assert_eq!(config.export_path, PathBuf::from("./out.ply"));
        assert!(config.painter);
        assert_eq!(config.decimation_level, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.json");
        std::fs::write(
            &path,
            r#"{ "use_color": true, "keys": { "quit": ["x"] }, "camera": { "pitch": 0.1, "yaw": 0.0, "translation": [0.0, 0.0, 0.0], "distance": 1.0 } }"#,
        )
        .unwrap();

        let config = ViewerConfig::load(&path).unwrap();
        assert!(config.use_color);
        assert_eq!(config.decimation_level, 1);
        assert_eq!(config.camera.unwrap().distance, 1.0);
        assert_eq!(config.keys.command_for(Key::character('x')), Some(Command::Quit));
        assert_eq!(config.keys.command_for(Key::character('r')), Some(Command::ResetCamera));
    }

    #[test]
    fn save_then_load_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.json");
        let config = ViewerConfig {
            painter: false,
            stats_interval: 5,
            ..ViewerConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ViewerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn out_of_range_decimation_is_rejected() {
        let config = ViewerConfig {
            decimation_level: 3,
            ..ViewerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::DecimationLevel(3))));
    }

    #[test]
    fn bad_key_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.json");
        std::fs::write(&path, r#"{ "keys": { "pause": "space" } }"#).unwrap();
        match ViewerConfig::load(&path) {
            Err(ConfigError::KeyNames(names)) => assert_eq!(names, vec!["space".to_string()]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ViewerConfig::load("/nonexistent/viewer.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
