//! Simulated load heatmap: a blurred ellipse over the person box, colored
//! with a jet palette and blended onto the frame.

use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

use super::canvas::{Canvas, Rgb};

const MASK_KERNEL_SIZE: usize = 99;
const HEAT_ALPHA: f64 = 0.6;

/// Precompute a normalized 1D Gaussian kernel; sigma is `kernel_size / 6`.
fn gaussian_kernel_1d(kernel_size: usize) -> Vec<f32> {
    let kernel_size = kernel_size.max(1) | 1;
    let sigma = kernel_size as f64 / 6.0;
    let half = (kernel_size / 2) as f64;
    let raw: Vec<f64> = (0..kernel_size)
        .map(|i| {
            let x = i as f64 - half;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = raw.iter().sum();
    raw.iter().map(|&v| (v / sum) as f32).collect()
}

/// Filled ellipse inscribed in `bbox`: 255 inside, 0 outside.
fn ellipse_mask(bbox: &BoundingBox, width: usize, height: usize) -> Vec<f32> {
    let (cx, cy) = bbox.center();
    let semi_a = (bbox.width() / 2).max(1) as f64;
    let semi_b = (bbox.height() / 2).max(1) as f64;
    let inv_a_sq = 1.0 / (semi_a * semi_a);
    let inv_b_sq = 1.0 / (semi_b * semi_b);

    let mut mask = vec![0.0f32; width * height];
    for y in 0..height {
        let dy = y as f64 - cy as f64;
        for x in 0..width {
            let dx = x as f64 - cx as f64;
            if dx * dx * inv_a_sq + dy * dy * inv_b_sq <= 1.0 {
                mask[y * width + x] = 255.0;
            }
        }
    }
    mask
}

/// Separable blur of a single-channel mask with edge clamping.
fn blur_mask(mask: &mut [f32], width: usize, height: usize, kernel: &[f32]) {
    if kernel.len() <= 1 || width == 0 || height == 0 {
        return;
    }
    let half = (kernel.len() / 2) as isize;
    let mut temp = vec![0.0f32; mask.len()];

    // Horizontal pass: mask → temp
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0f32;
            for (k, &w) in kernel.iter().enumerate() {
                let sx = (x as isize + k as isize - half).clamp(0, width as isize - 1) as usize;
                sum += mask[y * width + sx] * w;
            }
            temp[y * width + x] = sum;
        }
    }

    // Vertical pass: temp → mask
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0f32;
            for (k, &w) in kernel.iter().enumerate() {
                let sy = (y as isize + k as isize - half).clamp(0, height as isize - 1) as usize;
                sum += temp[sy * width + x] * w;
            }
            mask[y * width + x] = sum;
        }
    }
}

/// Jet palette for `v` in [0, 1]: dark blue through cyan, yellow, dark red.
fn jet(v: f64) -> Rgb {
    let v = v.clamp(0.0, 1.0);
    let channel = |offset: f64| {
        ((1.5 - (4.0 * v - offset).abs()).clamp(0.0, 1.0) * 255.0).round() as u8
    };
    [channel(3.0), channel(2.0), channel(1.0)]
}

/// Returns a copy of `frame` with a heat overlay centred on `bbox`.
pub(crate) fn render_stress_map(frame: &Frame, bbox: &BoundingBox) -> Frame {
    let mut out = frame.clone();
    let (w, h) = (frame.width() as usize, frame.height() as usize);
    if w == 0 || h == 0 {
        return out;
    }

    let mut mask = ellipse_mask(bbox, w, h);
    blur_mask(&mut mask, w, h, &gaussian_kernel_1d(MASK_KERNEL_SIZE));

    let mut canvas = Canvas::new(&mut out);
    for y in 0..h {
        for x in 0..w {
            let heat = jet(mask[y * w + x] as f64 / 255.0);
            canvas.blend(x as i64, y as i64, heat, HEAT_ALPHA);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_sums_to_one_and_is_symmetric() {
        let k = gaussian_kernel_1d(7);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        for i in 0..k.len() / 2 {
            assert!((k[i] - k[k.len() - 1 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_even_kernel_size_is_made_odd() {
        assert_eq!(gaussian_kernel_1d(8).len(), 9);
    }

    #[test]
    fn test_jet_endpoints() {
        assert_eq!(jet(0.0), [0, 0, 128]);
        assert_eq!(jet(0.5), [128, 255, 128]);
        assert_eq!(jet(1.0), [128, 0, 0]);
    }

    #[test]
    fn test_blur_spreads_mask_edge() {
        let (w, h) = (40, 40);
        let bbox = BoundingBox::new(10, 10, 30, 30, 0.9).unwrap();
        let mut mask = ellipse_mask(&bbox, w, h);
        assert_eq!(mask[20 * w + 20], 255.0);
        assert_eq!(mask[20 * w + 2], 0.0);

        blur_mask(&mut mask, w, h, &gaussian_kernel_1d(9));
        assert!(mask[20 * w + 20] > 200.0);
        assert!(mask[20 * w + 8] > 0.0);
        assert!(mask[20 * w + 8] < 255.0);
    }

    #[test]
    fn test_stress_map_is_hotter_at_box_centre() {
        let frame = Frame::new(vec![0u8; 200 * 200 * 3], 200, 200, 3, 0);
        let bbox = BoundingBox::new(60, 60, 140, 140, 0.9).unwrap();
        let out = render_stress_map(&frame, &bbox);

        let px = |x: usize, y: usize| {
            let i = (y * 200 + x) * 3;
            [out.data()[i], out.data()[i + 1], out.data()[i + 2]]
        };
        // Far corner stays on the cold end of the palette: blue dominates
        let corner = px(0, 199);
        assert!(corner[2] > corner[0]);
        // Centre moves toward the hot end: red dominates
        let centre = px(100, 100);
        assert!(centre[0] > centre[2]);
        assert!(frame.data().iter().all(|&v| v == 0));
    }
}
