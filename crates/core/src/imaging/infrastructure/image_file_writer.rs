use std::path::Path;

use crate::imaging::domain::image_writer::ImageWriter;
use crate::shared::frame::{ChannelOrder, Frame};

/// Writes a single frame to an image file using the `image` crate.
///
/// BGR frames are converted to RGB before encoding. Supports optional
/// resizing for thumbnails.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        size: Option<(u32, u32)>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return Err(format!("cannot encode a {}-channel frame", frame.channels()).into());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let rgb = frame.to_channel_order(ChannelOrder::Rgb);
        let img = image::RgbImage::from_raw(rgb.width(), rgb.height(), rgb.data().to_vec())
            .ok_or("Failed to create image from frame data")?;

        let img = if let Some((w, h)) = size {
            image::imageops::resize(&img, w, h, image::imageops::FilterType::Triangle)
        } else {
            img
        };

        img.save(path)?;
        Ok(())
    }
}
