use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// Domain interface for face detection.
///
/// An image with no faces yields an empty list, not an error. `&mut self`
/// lets implementations reuse inference buffers between calls.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Rect>, Box<dyn std::error::Error>>;
}
