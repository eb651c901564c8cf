use std::path::Path;

use crate::shared::frame::Frame;

/// Decodes a still image into a [`Frame`].
pub trait ImageReader: Send {
    /// Reads the image at `path`, tagging the frame with `index`.
    fn read(&self, path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>>;
}
