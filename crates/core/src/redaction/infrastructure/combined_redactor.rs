use crate::redaction::domain::region_redactor::RegionRedactor;
use crate::shared::error::RedactionError;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

use super::feathered_blurrer::FeatheredBlurrer;
use super::feathered_pixelator::FeatheredPixelator;

/// Pixelates the target, then blurs over the pixelated result.
///
/// The returned region is the union of both composited regions. Both stages
/// run on a scratch copy, so a failure in either leaves `frame` untouched.
pub struct CombinedRedactor {
    pixelator: FeatheredPixelator,
    blurrer: FeatheredBlurrer,
}

impl CombinedRedactor {
    pub fn new(pixelator: FeatheredPixelator, blurrer: FeatheredBlurrer) -> Self {
        Self { pixelator, blurrer }
    }
}

impl Default for CombinedRedactor {
    fn default() -> Self {
        Self::new(FeatheredPixelator::default(), FeatheredBlurrer::default())
    }
}

impl RegionRedactor for CombinedRedactor {
    fn redact(&self, frame: &mut Frame, target: &Rect) -> Result<Rect, RedactionError> {
        let mut scratch = frame.clone();
        let pixelated = self.pixelator.redact(&mut scratch, target)?;
        let blurred = self.blurrer.redact(&mut scratch, target)?;
        *frame = scratch;
        Ok(Rect::new(
            pixelated.top.min(blurred.top),
            pixelated.right.max(blurred.right),
            pixelated.bottom.max(blurred.bottom),
            pixelated.left.min(blurred.left),
        ))
    }
}
