//! Aspect-preserving resize into a square model input tensor.

use ndarray::Array4;

use super::frame::{ChannelOrder, Frame};

/// Memory layout of the produced input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorLayout {
    /// `[1, 3, H, W]`
    Nchw,
    /// `[1, H, W, 3]`
    Nhwc,
}

/// Geometry of a letterboxed image inside the square model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f64,
    pub pad_x: u32,
    pub pad_y: u32,
}

impl Letterbox {
    /// Maps a point in model-input pixels back to source-image pixels.
    pub fn unmap(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

/// Letterbox-resize a frame to `target_size` x `target_size`.
///
/// Pixels are scaled to [0, 1] and always emitted in RGB channel order,
/// whatever the frame's own order. Padding is filled with `pad_value`.
pub fn letterbox(
    frame: &Frame,
    target_size: u32,
    layout: TensorLayout,
    pad_value: f32,
) -> (Array4<f32>, Letterbox) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let t = target_size as usize;
    let shape = match layout {
        TensorLayout::Nchw => (1, 3, t, t),
        TensorLayout::Nhwc => (1, t, t, 3),
    };
    let mut tensor = Array4::<f32>::from_elem(shape, pad_value);

    let rgb_index: [usize; 3] = match frame.channel_order() {
        ChannelOrder::Rgb => [0, 1, 2],
        ChannelOrder::Bgr => [2, 1, 0],
    };

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbor resize into the padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for (c, &sc) in rgb_index.iter().enumerate() {
                let v = src[[src_y, src_x, sc]] as f32 / 255.0;
                match layout {
                    TensorLayout::Nchw => tensor[[0, c, ty, tx]] = v,
                    TensorLayout::Nhwc => tensor[[0, ty, tx, c]] = v,
                }
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x,
            pad_y,
        },
    )
}
