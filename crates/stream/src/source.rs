use crate::{FrameSet, Intrinsics, StreamError};

/// A live depth stream, optionally paired with a color stream.
pub trait FrameSource {
    /// Intrinsics of the full-resolution depth stream.
    ///
    /// Queried once at session start; failure there aborts the session.
    fn depth_intrinsics(&self) -> Result<Intrinsics, StreamError>;

    /// Block until the next frame set is available.
    fn wait_for_frames(&mut self) -> Result<FrameSet, StreamError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn depth_intrinsics(&self) -> Result<Intrinsics, StreamError> {
        (**self).depth_intrinsics()
    }

    fn wait_for_frames(&mut self) -> Result<FrameSet, StreamError> {
        (**self).wait_for_frames()
    }
}

/// Lookup of attached devices by identifier.
pub trait DeviceRegistry: Send + Sync {
    /// Identifiers of the devices that can currently be opened.
    fn devices(&self) -> Vec<String>;

    /// Open a device and start its streams.
    fn open(&self, id: &str) -> Result<Box<dyn FrameSource + Send>, StreamError>;
}
