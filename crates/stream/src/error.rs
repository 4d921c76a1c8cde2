/// Errors raised by frame sources and device lookup.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("device not found: {id}")]
    DeviceNotFound { id: String },

    #[error("failed to query stream intrinsics: {0}")]
    Intrinsics(String),

    #[error("device disconnected")]
    Disconnected,

    #[error("frame has {actual} samples, expected {expected}")]
    InvalidFrame { expected: usize, actual: usize },
}
