/// COCO object detector (YOLOv8-style export) used to find person bodies.
use std::path::Path;

use crate::detection::domain::object_detector::{Detection, ObjectDetector};
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

use super::math::{nms, ScoredBox};
use super::onnx_session::{load_session, model_input_size};
use super::yolo::{infer_rows, Letterbox, DEFAULT_INPUT_SIZE, NMS_IOU_THRESH};

/// Default confidence threshold for object detection.
pub const DEFAULT_CONFIDENCE: f64 = 0.4;

/// Class names in COCO training order.
pub const COCO_LABELS: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch", "potted plant",
    "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy bear", "hair drier", "toothbrush",
];

pub struct OnnxPersonDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxPersonDetector {
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        let input_size = model_input_size(&session).unwrap_or(DEFAULT_INPUT_SIZE);
        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl ObjectDetector for OnnxPersonDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let (rows, letterbox) = infer_rows(&mut self.session, frame, self.input_size)?;
        let detections =
            decode_objects(&rows, &letterbox, self.confidence, frame.width(), frame.height());
        log::debug!(
            "Detected {} objects ({} people)",
            detections.len(),
            detections.iter().filter(|d| d.label == COCO_LABELS[0]).count()
        );
        Ok(detections)
    }
}

/// Decodes rows of `[cx, cy, w, h, class scores...]`.
///
/// Each anchor takes its best-scoring class; NMS runs per class.
fn decode_objects(
    rows: &[Vec<f32>],
    letterbox: &Letterbox,
    confidence: f64,
    width: u32,
    height: u32,
) -> Vec<Detection> {
    let boxes: Vec<ScoredBox> = rows
        .iter()
        .filter(|row| row.len() > 4)
        .filter_map(|row| {
            let (class_id, score) = row[4..]
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))?;
            let score = *score as f64;
            (score >= confidence).then(|| ScoredBox {
                bbox: letterbox.unmap(row[0] as f64, row[1] as f64, row[2] as f64, row[3] as f64),
                confidence: score,
                class_id,
            })
        })
        .collect();

    nms(boxes, NMS_IOU_THRESH)
        .into_iter()
        .filter_map(|b| {
            let label = COCO_LABELS.get(b.class_id)?;
            let rect = Rect::from_xyxy(b.bbox[0], b.bbox[1], b.bbox[2], b.bbox[3])
                .clip_to_bounds(width, height)
                .ok()?;
            Some(Detection::new(rect, *label, b.confidence))
        })
        .collect()
}
