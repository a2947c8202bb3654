//! Box geometry shared by the YOLO-style detectors.

/// IoU between two bounding boxes represented as `[x1, y1, x2, y2]`.
pub fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
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

/// A decoded model box in original-frame coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredBox {
    pub bbox: [f64; 4],
    pub confidence: f64,
    pub class_id: usize,
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
///
/// Only boxes of the same class suppress each other.
pub fn nms(mut boxes: Vec<ScoredBox>, iou_thresh: f64) -> Vec<ScoredBox> {
    boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut suppressed = vec![false; boxes.len()];
    let mut keep = Vec::new();

    for i in 0..boxes.len() {
        if suppressed[i] {
            continue;
        }
        for j in (i + 1)..boxes.len() {
            if !suppressed[j]
                && boxes[i].class_id == boxes[j].class_id
                && bbox_iou(&boxes[i].bbox, &boxes[j].bbox) > iou_thresh
            {
                suppressed[j] = true;
            }
        }
        keep.push(boxes[i].clone());
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scored(bbox: [f64; 4], confidence: f64, class_id: usize) -> ScoredBox {
        ScoredBox {
            bbox,
            confidence,
            class_id,
        }
    }

    #[test]
    fn test_bbox_iou_no_overlap() {
        let a = [0.0, 0.0, 10.0, 10.0];
        let b = [20.0, 20.0, 30.0, 30.0];
        assert_eq!(bbox_iou(&a, &b), 0.0);
    }

    #[test]
    fn test_bbox_iou_perfect_overlap() {
        let a = [0.0, 0.0, 10.0, 10.0];
        assert_relative_eq!(bbox_iou(&a, &a), 1.0);
    }

    #[test]
    fn test_bbox_iou_partial_overlap() {
        let a = [0.0, 0.0, 10.0, 10.0];
        let b = [5.0, 5.0, 15.0, 15.0];
        assert_relative_eq!(bbox_iou(&a, &b), 25.0 / 175.0);
    }

    #[test]
    fn test_nms_keeps_most_confident_of_overlapping_pair() {
        let kept = nms(
            vec![
                scored([0.0, 0.0, 100.0, 100.0], 0.5, 0),
                scored([2.0, 2.0, 102.0, 102.0], 0.9, 0),
            ],
            0.45,
        );
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_nms_keeps_disjoint_boxes_in_confidence_order() {
        let kept = nms(
            vec![
                scored([0.0, 0.0, 50.0, 50.0], 0.6, 0),
                scored([200.0, 200.0, 250.0, 250.0], 0.8, 0),
            ],
            0.45,
        );
        let confidences: Vec<f64> = kept.iter().map(|b| b.confidence).collect();
        assert_eq!(confidences, vec![0.8, 0.6]);
    }

    #[test]
    fn test_nms_does_not_suppress_across_classes() {
        let kept = nms(
            vec![
                scored([0.0, 0.0, 100.0, 100.0], 0.9, 0),
                scored([0.0, 0.0, 100.0, 100.0], 0.8, 16),
            ],
            0.45,
        );
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_nms_empty_input() {
        assert!(nms(Vec::new(), 0.45).is_empty());
    }
}
