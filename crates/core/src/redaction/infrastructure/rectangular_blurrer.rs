use crate::redaction::domain::region_redactor::RegionRedactor;
use crate::shared::error::RedactionError;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

use super::gaussian::GaussianBlur;

/// Hard-edged Gaussian blur of exactly the target rectangle.
///
/// Unlike the feathered operators the target is not padded or clipped: it
/// must be non-empty and lie inside the image.
pub struct RectangularBlurrer {
    blur: GaussianBlur,
}

impl RectangularBlurrer {
    pub fn new(kernel_size: usize, sigma: f64) -> Self {
        Self {
            blur: GaussianBlur::new(kernel_size, sigma),
        }
    }
}

impl RegionRedactor for RectangularBlurrer {
    fn redact(&self, frame: &mut Frame, target: &Rect) -> Result<Rect, RedactionError> {
        if target.is_empty() || !frame.bounds().contains(target) {
            return Err(RedactionError::InvalidRegion {
                rect: *target,
                width: frame.width(),
                height: frame.height(),
            });
        }

        let mut roi = frame.crop(target);
        let (w, h, c) = (
            roi.width() as usize,
            roi.height() as usize,
            roi.channels() as usize,
        );
        self.blur.apply(roi.data_mut(), w, h, c);
        frame.paste(target, &roi);
        Ok(*target)
    }
}
