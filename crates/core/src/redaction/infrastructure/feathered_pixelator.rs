use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage, RgbaImage};

use crate::redaction::domain::region_redactor::RegionRedactor;
use crate::shared::error::RedactionError;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;
use crate::shared::settings::PixelateSettings;

use super::feathering::Feather;

/// Block pixelation over a padded region, blended in through a radial mask.
pub struct FeatheredPixelator {
    granularity: u32,
    feather: Feather,
}

impl FeatheredPixelator {
    pub fn new(settings: &PixelateSettings) -> Self {
        Self {
            granularity: settings.granularity.max(1),
            feather: Feather::new(
                settings.padding,
                settings.fade_size,
                settings.mask_kernel_size,
            ),
        }
    }
}

impl Default for FeatheredPixelator {
    fn default() -> Self {
        Self::new(&PixelateSettings::default())
    }
}

impl RegionRedactor for FeatheredPixelator {
    fn redact(&self, frame: &mut Frame, target: &Rect) -> Result<Rect, RedactionError> {
        self.feather
            .composite(frame, target, |region| pixelate(region, self.granularity))
    }
}

/// Size of one pixel block for a `width` x `height` region.
///
/// The longer side ends up roughly `granularity` blocks across.
pub fn block_factor(width: u32, height: u32, granularity: u32) -> u32 {
    (width.max(height) / granularity.max(1)).max(1)
}

/// Downscales with linear filtering, then upscales with nearest neighbour.
pub fn pixelate(region: &Frame, granularity: u32) -> Frame {
    let (w, h) = (region.width(), region.height());
    let factor = block_factor(w, h, granularity);
    if factor <= 1 {
        return region.clone();
    }
    let (sw, sh) = ((w / factor).max(1), (h / factor).max(1));
    let data = region.data().to_vec();

    let pixels = match region.channels() {
        1 => GrayImage::from_raw(w, h, data).map(|img| {
            let small = imageops::resize(&img, sw, sh, FilterType::Triangle);
            imageops::resize(&small, w, h, FilterType::Nearest).into_raw()
        }),
        3 => RgbImage::from_raw(w, h, data).map(|img| {
            let small = imageops::resize(&img, sw, sh, FilterType::Triangle);
            imageops::resize(&small, w, h, FilterType::Nearest).into_raw()
        }),
        4 => RgbaImage::from_raw(w, h, data).map(|img| {
            let small = imageops::resize(&img, sw, sh, FilterType::Triangle);
            imageops::resize(&small, w, h, FilterType::Nearest).into_raw()
        }),
        other => {
            log::warn!("Cannot pixelate {other}-channel image, leaving region untouched");
            None
        }
    };

    match pixels {
        Some(pixels) => Frame::new(pixels, w, h, region.channels()),
        None => region.clone(),
    }
}
