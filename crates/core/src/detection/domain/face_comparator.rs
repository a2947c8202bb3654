use crate::shared::frame::Frame;

/// Outcome of comparing the dominant face of two images.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceComparison {
    pub is_match: bool,
    /// Embedding distance, `>= 0`. Smaller means more alike.
    pub distance: f64,
}

impl FaceComparison {
    /// Result reported when either image has no detectable face.
    pub const NO_FACE: FaceComparison = FaceComparison {
        is_match: false,
        distance: 0.0,
    };
}

/// Domain interface for face identity comparison.
///
/// An image without a detectable face must produce
/// [`FaceComparison::NO_FACE`]; `Err` is reserved for genuine failures such
/// as a broken model session.
pub trait FaceComparator: Send {
    fn compare(
        &mut self,
        candidate: &Frame,
        reference: &Frame,
    ) -> Result<FaceComparison, Box<dyn std::error::Error>>;
}
