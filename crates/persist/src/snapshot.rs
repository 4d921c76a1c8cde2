use std::path::Path;

use depthview_common::RgbImage;

use crate::PersistError;

/// Encode the framebuffer as an 8-bit RGB PNG.
pub fn save_png(frame: &RgbImage, path: impl AsRef<Path>) -> Result<(), PersistError> {
    let path = path.as_ref();
    let empty = || PersistError::EmptyImage {
        width: frame.width(),
        height: frame.height(),
        path: path.to_path_buf(),
    };
    if frame.is_empty() {
        return Err(empty());
    }

    let (width, height) = (
        u32::try_from(frame.width()).map_err(|_| empty())?,
        u32::try_from(frame.height()).map_err(|_| empty())?,
    );
    let buffer = image::RgbImage::from_raw(width, height, frame.as_bytes().to_vec()).ok_or_else(empty)?;
    buffer.save_with_format(path, image::ImageFormat::Png)?;

    tracing::info!(path = %path.display(), width, height, "snapshot saved");
    Ok(())
}
