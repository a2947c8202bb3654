use crate::shared::error::RedactionError;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// RGBA mask for an inpainting collaborator.
///
/// Opaque white everywhere except `rect`, whose alpha is 0 (the area the
/// collaborator may repaint).
pub fn transparency_mask(width: u32, height: u32, rect: &Rect) -> Result<Frame, RedactionError> {
    let hole = rect.clip_to_bounds(width, height)?;
    let mut mask = Frame::filled(width, height, 4, 255);
    {
        let mut pixels = mask.as_ndarray_mut();
        for y in hole.top as usize..hole.bottom as usize {
            for x in hole.left as usize..hole.right as usize {
                pixels[[y, x, 3]] = 0;
            }
        }
    }
    Ok(mask)
}
