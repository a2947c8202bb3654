use crate::redaction::domain::feather_mask::{blend, RadialMask};
use crate::shared::error::RedactionError;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

use super::gaussian::GaussianBlur;

/// Shared pad → clip → transform → feathered blend → write-back pipeline.
#[derive(Clone, Debug)]
pub struct Feather {
    padding: u32,
    fade_size: u32,
    smoothing: GaussianBlur,
}

impl Feather {
    /// `mask_kernel_size` controls how much the radial mask itself is
    /// smoothed before blending; 1 disables smoothing.
    pub fn new(padding: u32, fade_size: u32, mask_kernel_size: usize) -> Self {
        Self {
            padding,
            fade_size,
            smoothing: GaussianBlur::new(mask_kernel_size, 0.0),
        }
    }

    /// Smoothed radial mask for a `width` x `height` region.
    pub fn mask(&self, width: usize, height: usize) -> RadialMask {
        let mut mask = RadialMask::feathered(width, height, self.fade_size);
        self.smoothing.apply_plane(mask.values_mut(), width, height);
        for v in mask.values_mut() {
            *v = v.clamp(0.0, 1.0);
        }
        mask
    }

    /// Composites `transform(region)` into `frame` around `target`.
    pub fn composite<F>(
        &self,
        frame: &mut Frame,
        target: &Rect,
        transform: F,
    ) -> Result<Rect, RedactionError>
    where
        F: FnOnce(&Frame) -> Frame,
    {
        let (fw, fh) = (frame.width(), frame.height());
        let region = target.pad(self.padding, fw, fh).clip_to_bounds(fw, fh)?;

        let original = frame.crop(&region);
        let transformed = transform(&original);
        let mask = self.mask(original.width() as usize, original.height() as usize);
        let blended = blend(&original, &transformed, &mask);

        frame.paste(&region, &blended);
        Ok(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invert(frame: &Frame) -> Frame {
        let data = frame.data().iter().map(|v| 255 - v).collect();
        Frame::new(data, frame.width(), frame.height(), frame.channels())
    }

    #[test]
    fn test_region_is_padded_and_clipped() {
        let mut frame = Frame::filled(100, 100, 3, 0);
        let feather = Feather::new(10, 5, 1);
        let region = feather
            .composite(&mut frame, &Rect::new(5, 50, 50, 20), invert)
            .unwrap();
        assert_eq!(region, Rect::new(0, 60, 60, 10));
    }

    #[test]
    fn test_pixels_outside_region_untouched() {
        let mut frame = Frame::filled(100, 100, 3, 40);
        let feather = Feather::new(5, 5, 3);
        feather
            .composite(&mut frame, &Rect::new(40, 60, 60, 40), invert)
            .unwrap();
        assert_eq!(frame.pixel(0, 0), &[40, 40, 40]);
        assert_eq!(frame.pixel(99, 99), &[40, 40, 40]);
        assert_eq!(frame.pixel(34, 50), &[40, 40, 40]);
    }

    #[test]
    fn test_center_takes_transformed_and_corner_keeps_original() {
        let mut frame = Frame::filled(100, 100, 3, 40);
        let feather = Feather::new(0, 10, 1);
        feather
            .composite(&mut frame, &Rect::new(20, 80, 80, 20), invert)
            .unwrap();
        assert_eq!(frame.pixel(50, 50), &[215, 215, 215]);
        assert_eq!(frame.pixel(20, 20), &[40, 40, 40]);
    }

    #[test]
    fn test_smoothed_mask_stays_in_unit_range_and_softens_edge() {
        let hard = Feather::new(0, 0, 1).mask(60, 60);
        let soft = Feather::new(0, 0, 15).mask(60, 60);
        assert!(soft.values().iter().all(|v| (0.0..=1.0).contains(v)));
        // Just outside the hard disc the smoothed mask picks up some weight.
        assert_eq!(hard.get(5, 5), 0.0);
        assert!(soft.get(5, 5) > 0.0);
    }

    #[test]
    fn test_target_outside_image_is_invalid() {
        let mut frame = Frame::filled(50, 50, 3, 0);
        let err = Feather::new(0, 5, 1)
            .composite(&mut frame, &Rect::new(60, 90, 90, 60), invert)
            .unwrap_err();
        assert!(matches!(err, RedactionError::InvalidRegion { .. }));
    }
}
