use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// One labelled box from a general object detector.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub rect: Rect,
    pub label: String,
    pub confidence: f64,
}

impl Detection {
    pub fn new(rect: Rect, label: impl Into<String>, confidence: f64) -> Self {
        Self {
            rect,
            label: label.into(),
            confidence,
        }
    }
}

/// Domain interface for object/body detection.
///
/// The label space must include `"person"`; output order is the detector's
/// own order and is preserved downstream.
pub trait ObjectDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;
}
