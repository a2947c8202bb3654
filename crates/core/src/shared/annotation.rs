use image::{ImageBuffer, Pixel, Rgb, Rgba};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect as PixelRect;

use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// Draws a rectangle outline of `thickness` pixels just inside `rect`.
///
/// The outline is clipped to the frame. RGBA frames get an opaque outline;
/// other channel layouts are left untouched.
pub fn draw_outline(frame: &mut Frame, rect: &Rect, color: [u8; 3], thickness: u32) {
    let Ok(rect) = rect.clip_to_bounds(frame.width(), frame.height()) else {
        return;
    };
    let [r, g, b] = color;
    match frame.channels() {
        3 => outline_on(frame, &rect, Rgb([r, g, b]), thickness),
        4 => outline_on(frame, &rect, Rgba([r, g, b, 255]), thickness),
        n => log::warn!("Cannot annotate a {n}-channel frame"),
    }
}

fn outline_on<P>(frame: &mut Frame, rect: &Rect, color: P, thickness: u32)
where
    P: Pixel<Subpixel = u8>,
{
    let Some(mut canvas) =
        ImageBuffer::<P, Vec<u8>>::from_raw(frame.width(), frame.height(), frame.data().to_vec())
    else {
        return;
    };

    for inset in 0..thickness.max(1) {
        let width = rect.width().saturating_sub(2 * inset);
        let height = rect.height().saturating_sub(2 * inset);
        if width == 0 || height == 0 {
            break;
        }
        let ring = PixelRect::at((rect.left + inset) as i32, (rect.top + inset) as i32)
            .of_size(width, height);
        draw_hollow_rect_mut(&mut canvas, ring, color);
    }

    frame.data_mut().copy_from_slice(canvas.as_raw());
}
