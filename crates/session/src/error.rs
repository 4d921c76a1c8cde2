use depthview_persist::PersistError;
use depthview_stream::StreamError;

use crate::ConfigError;

/// Errors that prevent a session from starting.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("persist error: {0}")]
    Persist(#[from] PersistError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to spawn render thread: {0}")]
    Spawn(std::io::Error),
}
