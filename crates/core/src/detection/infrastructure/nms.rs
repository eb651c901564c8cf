//! Greedy non-maximum suppression over raw detector boxes.

/// A candidate box in frame pixels before suppression.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RawDetection {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub confidence: f64,
}

impl RawDetection {
    fn corners(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// Sort by confidence descending, then drop every box whose IoU with an
/// already-kept box exceeds `iou_thresh`.
pub(crate) fn nms(dets: &mut [RawDetection], iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        for j in (i + 1)..dets.len() {
            if !suppressed[j] && bbox_iou(&dets[i].corners(), &dets[j].corners()) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

/// IoU between two boxes represented as `[x1, y1, x2, y2]`.
pub(crate) fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f64, y1: f64, x2: f64, y2: f64, confidence: f64) -> RawDetection {
        RawDetection {
            x1,
            y1,
            x2,
            y2,
            confidence,
        }
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let mut dets = vec![
            det(0.0, 0.0, 100.0, 100.0, 0.9),
            det(5.0, 5.0, 105.0, 105.0, 0.8),
        ];
        let kept = nms(&mut dets, 0.45);
        assert_eq!(kept.len(), 1);
        assert!((kept[0].confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_nms_keeps_non_overlapping_in_confidence_order() {
        let mut dets = vec![
            det(0.0, 0.0, 50.0, 50.0, 0.4),
            det(200.0, 200.0, 250.0, 250.0, 0.8),
        ];
        let kept = nms(&mut dets, 0.45);
        assert_eq!(kept.len(), 2);
        assert!((kept[0].confidence - 0.8).abs() < 1e-9);
        assert!((kept[1].confidence - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_nms_empty_input() {
        let mut dets: Vec<RawDetection> = Vec::new();
        assert!(nms(&mut dets, 0.45).is_empty());
    }

    #[test]
    fn test_bbox_iou_perfect_and_disjoint() {
        let b = [0.0, 0.0, 10.0, 10.0];
        assert!((bbox_iou(&b, &b) - 1.0).abs() < 1e-9);
        assert_eq!(bbox_iou(&b, &[20.0, 20.0, 30.0, 30.0]), 0.0);
    }

    #[test]
    fn test_bbox_iou_partial_overlap_and_touching_edges() {
        let a = [0.0, 0.0, 100.0, 100.0];
        assert!((bbox_iou(&a, &[50.0, 0.0, 150.0, 100.0]) - 5000.0 / 15000.0).abs() < 1e-9);
        assert_eq!(bbox_iou(&a, &[100.0, 0.0, 150.0, 100.0]), 0.0);
    }
}
