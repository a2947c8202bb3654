use crate::shared::error::RedactionError;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// A square window around a region, plus its pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct SquareCrop {
    pub rect: Rect,
    pub frame: Frame,
}

/// Smallest allowed size that covers the longer side of `rect`.
///
/// `allowed` is expected in ascending order.
pub fn choose_square_size(rect: &Rect, allowed: &[u32]) -> Result<u32, RedactionError> {
    let needed = rect.width().max(rect.height());
    allowed
        .iter()
        .copied()
        .find(|&size| size >= needed)
        .ok_or_else(|| RedactionError::RegionTooLarge {
            width: rect.width(),
            height: rect.height(),
            allowed: allowed.to_vec(),
        })
}

/// Centers a `size` square on `rect`, sliding it back inside the image.
pub fn position_square(
    rect: &Rect,
    size: u32,
    width: u32,
    height: u32,
) -> Result<Rect, RedactionError> {
    let (cx, cy) = rect.center();
    let x0 = slide_into(cx as i64 - size as i64 / 2, size, width);
    let y0 = slide_into(cy as i64 - size as i64 / 2, size, height);

    let fits = x0 >= 0
        && y0 >= 0
        && x0 + size as i64 <= width as i64
        && y0 + size as i64 <= height as i64;
    let cannot_position = || RedactionError::CannotPosition {
        rect: *rect,
        size,
        width,
        height,
    };
    if !fits {
        return Err(cannot_position());
    }

    let square = Rect::new(y0 as u32, x0 as u32 + size, y0 as u32 + size, x0 as u32);
    if !square.contains(rect) {
        return Err(cannot_position());
    }
    Ok(square)
}

/// Pushes a window start so `[start, start + size)` ends inside `[0, limit]`,
/// then so it starts at or after 0.
fn slide_into(start: i64, size: u32, limit: u32) -> i64 {
    let overflow = start + size as i64 - limit as i64;
    let start = if overflow > 0 { start - overflow } else { start };
    start.max(0)
}

/// Extracts the smallest allowed square that fully contains `rect`.
pub fn extract_bounded_square(
    frame: &Frame,
    rect: &Rect,
    allowed: &[u32],
) -> Result<SquareCrop, RedactionError> {
    let size = choose_square_size(rect, allowed)?;
    let square = position_square(rect, size, frame.width(), frame.height())?;
    Ok(SquareCrop {
        rect: square,
        frame: frame.crop(&square),
    })
}
