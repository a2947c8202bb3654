use crate::shared::error::RedactionError;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// Domain interface for irreversibly concealing one region of an image.
///
/// Implementations modify the frame in place and return the region that was
/// actually composited (the target after padding and clipping).
pub trait RegionRedactor: Send {
    fn redact(&self, frame: &mut Frame, target: &Rect) -> Result<Rect, RedactionError>;
}
