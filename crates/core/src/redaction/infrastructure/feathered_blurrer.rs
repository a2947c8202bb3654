use crate::redaction::domain::region_redactor::RegionRedactor;
use crate::shared::error::RedactionError;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;
use crate::shared::settings::BlurSettings;

use super::feathering::Feather;
use super::gaussian::GaussianBlur;

/// Gaussian blur over a padded region, blended in through a radial mask.
///
/// The center of the region is fully blurred; the edge fades back to the
/// original image so there is no visible seam.
pub struct FeatheredBlurrer {
    blur: GaussianBlur,
    feather: Feather,
}

impl FeatheredBlurrer {
    pub fn new(settings: &BlurSettings) -> Self {
        Self {
            blur: GaussianBlur::new(settings.kernel_size, settings.sigma),
            feather: Feather::new(
                settings.padding,
                settings.fade_size,
                settings.mask_kernel_size,
            ),
        }
    }
}

impl Default for FeatheredBlurrer {
    fn default() -> Self {
        Self::new(&BlurSettings::default())
    }
}

impl RegionRedactor for FeatheredBlurrer {
    fn redact(&self, frame: &mut Frame, target: &Rect) -> Result<Rect, RedactionError> {
        self.feather.composite(frame, target, |region| {
            let mut blurred = region.clone();
            let (w, h, c) = (
                region.width() as usize,
                region.height() as usize,
                region.channels() as usize,
            );
            self.blur.apply(blurred.data_mut(), w, h, c);
            blurred
        })
    }
}
