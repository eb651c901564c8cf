use std::path::Path;

use crate::imaging::domain::image_reader::ImageReader;
use crate::shared::frame::{ChannelOrder, Frame};

/// Decodes still images with the `image` crate into RGB frames.
///
/// Any alpha channel is dropped; grayscale and palette images are expanded
/// to three channels.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
        let img = image::open(path)
            .map_err(|e| format!("failed to decode {}: {e}", path.display()))?
            .to_rgb8();
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(format!("{} has no pixels", path.display()).into());
        }
        log::debug!("Decoded {} ({width}x{height})", path.display());
        Ok(Frame::new(img.into_raw(), width, height, 3, index).with_channel_order(ChannelOrder::Rgb))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_test_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([50, 100, 200]);
        }
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_read_returns_rgb_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), "test.png", 100, 80);

        let frame = ImageFileReader::new().read(&path, 4).unwrap();
        assert_eq!((frame.width(), frame.height()), (100, 80));
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 4);
        assert_eq!(frame.channel_order(), ChannelOrder::Rgb);
        assert_eq!(&frame.data()[..3], &[50, 100, 200]);
    }

    #[test]
    fn test_read_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alpha.png");
        image::RgbaImage::from_pixel(4, 4, image::Rgba([1, 2, 3, 128]))
            .save(&path)
            .unwrap();

        let frame = ImageFileReader::new().read(&path, 0).unwrap();
        assert_eq!(frame.data().len(), 4 * 4 * 3);
        assert_eq!(&frame.data()[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_read_nonexistent_fails() {
        let result = ImageFileReader::new().read(Path::new("/nonexistent/test.png"), 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_read_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(ImageFileReader::new().read(&path, 0).is_err());
    }
}
