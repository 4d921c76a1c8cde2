use std::path::PathBuf;

/// Errors from writing snapshots and exports.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("cannot save an empty {width}x{height} image to {}", path.display())]
    EmptyImage {
        width: usize,
        height: usize,
        path: PathBuf,
    },
}
