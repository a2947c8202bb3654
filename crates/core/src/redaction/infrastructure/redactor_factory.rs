use crate::redaction::domain::region_redactor::RegionRedactor;
use crate::shared::settings::{RedactionMode, Settings};

use super::combined_redactor::CombinedRedactor;
use super::feathered_blurrer::FeatheredBlurrer;
use super::feathered_pixelator::FeatheredPixelator;
use super::rectangular_blurrer::RectangularBlurrer;

/// Builds the redaction operator selected by `settings.mode`.
pub fn create_redactor(settings: &Settings) -> Box<dyn RegionRedactor> {
    log::info!(
        "Using {} redaction (blur kernel={}, granularity={})",
        settings.mode,
        settings.blur.kernel_size,
        settings.pixelate.granularity
    );
    match settings.mode {
        RedactionMode::Blur => Box::new(FeatheredBlurrer::new(&settings.blur)),
        RedactionMode::Pixelate => Box::new(FeatheredPixelator::new(&settings.pixelate)),
        RedactionMode::Combined => Box::new(CombinedRedactor::new(
            FeatheredPixelator::new(&settings.pixelate),
            FeatheredBlurrer::new(&settings.blur),
        )),
        RedactionMode::Rectangle => Box::new(RectangularBlurrer::new(
            settings.blur.kernel_size,
            settings.blur.sigma,
        )),
    }
}
