use serde::{Deserialize, Serialize};

/// A detected person's axis-aligned box in full-frame pixel space.
///
/// Corners are integer pixels with `x1 < x2` and `y1 < y2`; `confidence`
/// is the detector score in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub confidence: f64,
}

/// A pixel rectangle inside a frame, already clamped to the frame bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropWindow {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl BoundingBox {
    /// Builds a box from corner coordinates, rejecting inverted or
    /// zero-extent corners.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32, confidence: f64) -> Option<Self> {
        if x1 >= x2 || y1 >= y2 {
            return None;
        }
        Some(Self {
            x1,
            y1,
            x2,
            y2,
            confidence,
        })
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    pub fn center(&self) -> (i32, i32) {
        ((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }

    /// Grows the box by `margin` pixels on every side and clamps it to a
    /// `frame_w` x `frame_h` frame.
    ///
    /// A box lying entirely outside the frame yields an empty window.
    pub fn padded_window(&self, margin: u32, frame_w: u32, frame_h: u32) -> CropWindow {
        let m = margin as i64;
        let x1 = (self.x1 as i64 - m).clamp(0, frame_w as i64);
        let y1 = (self.y1 as i64 - m).clamp(0, frame_h as i64);
        let x2 = (self.x2 as i64 + m).clamp(0, frame_w as i64);
        let y2 = (self.y2 as i64 + m).clamp(0, frame_h as i64);

        CropWindow {
            x: x1 as u32,
            y: y1 as u32,
            width: (x2 - x1).max(0) as u32,
            height: (y2 - y1).max(0) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn bbox(x1: i32, y1: i32, x2: i32, y2: i32) -> BoundingBox {
        BoundingBox::new(x1, y1, x2, y2, 0.9).unwrap()
    }

    #[rstest]
    #[case::inverted_x(10, 0, 5, 10)]
    #[case::inverted_y(0, 10, 10, 5)]
    #[case::zero_width(5, 0, 5, 10)]
    #[case::zero_height(0, 5, 10, 5)]
    fn test_new_rejects_degenerate_corners(
        #[case] x1: i32,
        #[case] y1: i32,
        #[case] x2: i32,
        #[case] y2: i32,
    ) {
        assert!(BoundingBox::new(x1, y1, x2, y2, 0.5).is_none());
    }

    #[test]
    fn test_area_and_center() {
        let b = bbox(10, 20, 110, 220);
        assert_eq!(b.area(), 100 * 200);
        assert_eq!(b.center(), (60, 120));
    }

    #[test]
    fn test_padded_window_inside_frame() {
        let w = bbox(50, 50, 150, 150).padded_window(10, 400, 300);
        assert_eq!(
            w,
            CropWindow {
                x: 40,
                y: 40,
                width: 120,
                height: 120
            }
        );
    }

    #[test]
    fn test_padded_window_clamped_at_edges() {
        let w = bbox(5, 2, 395, 298).padded_window(10, 400, 300);
        assert_eq!(
            w,
            CropWindow {
                x: 0,
                y: 0,
                width: 400,
                height: 300
            }
        );
    }

    #[test]
    fn test_padded_window_outside_frame_is_empty() {
        let w = bbox(500, 400, 600, 500).padded_window(10, 400, 300);
        assert!(w.is_empty());
    }

    #[test]
    fn test_padded_window_negative_box_is_empty() {
        let w = bbox(-200, -200, -50, -50).padded_window(10, 400, 300);
        assert!(w.is_empty());
    }
}
