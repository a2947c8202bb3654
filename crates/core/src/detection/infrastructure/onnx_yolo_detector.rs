/// YOLO face detector using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference and NMS, then maps the
/// surviving boxes back into frame coordinates.
use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

use super::math::{nms, ScoredBox};
use super::onnx_session::{load_session, model_input_size};
use super::yolo::{infer_rows, Letterbox, DEFAULT_INPUT_SIZE, NMS_IOU_THRESH};

/// Default confidence threshold for face detection.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// YOLO face detector backed by an ONNX Runtime session.
pub struct OnnxYoloFaceDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloFaceDetector {
    /// Load a YOLO face model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
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

impl FaceDetector for OnnxYoloFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Rect>, Box<dyn std::error::Error>> {
        let (rows, letterbox) = infer_rows(&mut self.session, frame, self.input_size)?;
        let faces = decode_faces(&rows, &letterbox, self.confidence, frame.width(), frame.height());
        log::debug!("Detected {} faces", faces.len());
        Ok(faces)
    }
}

/// Turns raw rows `[cx, cy, w, h, conf, keypoints...]` into frame rectangles.
///
/// Boxes below `confidence` are dropped, overlapping boxes are suppressed,
/// and whatever remains is clipped to the frame. Boxes that fall entirely
/// outside the frame disappear.
fn decode_faces(
    rows: &[Vec<f32>],
    letterbox: &Letterbox,
    confidence: f64,
    width: u32,
    height: u32,
) -> Vec<Rect> {
    let boxes: Vec<ScoredBox> = rows
        .iter()
        .filter(|row| row.len() >= 5)
        .filter(|row| row[4] as f64 >= confidence)
        .map(|row| ScoredBox {
            bbox: letterbox.unmap(row[0] as f64, row[1] as f64, row[2] as f64, row[3] as f64),
            confidence: row[4] as f64,
            class_id: 0,
        })
        .collect();

    nms(boxes, NMS_IOU_THRESH)
        .into_iter()
        .filter_map(|b| {
            Rect::from_xyxy(b.bbox[0], b.bbox[1], b.bbox[2], b.bbox[3])
                .clip_to_bounds(width, height)
                .ok()
        })
        .collect()
}
