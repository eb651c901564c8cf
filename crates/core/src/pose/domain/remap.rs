//! Conversion of crop-normalized landmarks into full-frame coordinates.

use thiserror::Error;

use super::landmark::{Landmark, LandmarkSet};
use crate::shared::bounding_box::CropWindow;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RemapError {
    #[error("crop has zero area ({width}x{height})")]
    DegenerateCrop { width: u32, height: u32 },
    #[error("frame has zero area ({width}x{height})")]
    DegenerateFrame { width: u32, height: u32 },
}

/// Maps landmarks normalized to `crop` into coordinates normalized to the
/// full `frame_w` x `frame_h` frame.
///
/// `full_x = (x * cw + x1) / fw`, `full_y = (y * ch + y1) / fh`; depth and
/// visibility are carried over unchanged.
pub fn remap_to_frame(
    landmarks: &LandmarkSet,
    crop: &CropWindow,
    frame_w: u32,
    frame_h: u32,
) -> Result<LandmarkSet, RemapError> {
    if crop.is_empty() {
        return Err(RemapError::DegenerateCrop {
            width: crop.width,
            height: crop.height,
        });
    }
    if frame_w == 0 || frame_h == 0 {
        return Err(RemapError::DegenerateFrame {
            width: frame_w,
            height: frame_h,
        });
    }

    let (cx, cy) = (crop.x as f64, crop.y as f64);
    let (cw, ch) = (crop.width as f64, crop.height as f64);
    let (fw, fh) = (frame_w as f64, frame_h as f64);

    Ok(landmarks.map(|lm| Landmark {
        x: (lm.x * cw + cx) / fw,
        y: (lm.y * ch + cy) / fh,
        ..*lm
    }))
}
