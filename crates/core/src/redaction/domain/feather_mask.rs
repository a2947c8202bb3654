use crate::shared::frame::Frame;

/// Per-pixel alpha over a region, values in `[0, 1]`.
///
/// 1 means "take the transformed pixel", 0 means "keep the original".
#[derive(Clone, Debug, PartialEq)]
pub struct RadialMask {
    values: Vec<f32>,
    width: usize,
    height: usize,
}

impl RadialMask {
    pub fn uniform(width: usize, height: usize, value: f32) -> Self {
        Self {
            values: vec![value.clamp(0.0, 1.0); width * height],
            width,
            height,
        }
    }

    /// Fully opaque disc in the middle, fading linearly to 0 over `fade_size`.
    ///
    /// Pixels closer to the center than `min(w, h) / 2 - fade_size` get 1;
    /// further out the value drops by `1 / fade_size` per pixel of distance.
    pub fn feathered(width: usize, height: usize, fade_size: u32) -> Self {
        let cx = (width / 2) as f32;
        let cy = (height / 2) as f32;
        let fade = fade_size as f32;
        let solid_radius = width.min(height) as f32 / 2.0 - fade;

        let mut values = Vec::with_capacity(width * height);
        for y in 0..height {
            let dy = y as f32 - cy;
            for x in 0..width {
                let dx = x as f32 - cx;
                values.push(radial_alpha((dx * dx + dy * dy).sqrt(), solid_radius, fade));
            }
        }
        Self {
            values,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.width + x]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Mutable plane access for smoothing; callers keep values in `[0, 1]`.
    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }
}

fn radial_alpha(distance: f32, solid_radius: f32, fade: f32) -> f32 {
    if distance <= solid_radius {
        1.0
    } else if fade <= 0.0 {
        0.0
    } else {
        (1.0 - (distance - solid_radius) / fade).clamp(0.0, 1.0)
    }
}

/// `original * (1 - mask) + transformed * mask`, per channel.
///
/// The mask is broadcast across channels. A mask of exactly 0 reproduces
/// `original` byte for byte and a mask of exactly 1 reproduces `transformed`.
pub fn blend(original: &Frame, transformed: &Frame, mask: &RadialMask) -> Frame {
    debug_assert_eq!(
        (original.width(), original.height(), original.channels()),
        (transformed.width(), transformed.height(), transformed.channels())
    );
    debug_assert_eq!(
        (mask.width, mask.height),
        (original.width() as usize, original.height() as usize)
    );

    let channels = original.channels() as usize;
    let data = original
        .data()
        .chunks_exact(channels)
        .zip(transformed.data().chunks_exact(channels))
        .zip(mask.values.iter())
        .flat_map(|((o, t), &m)| {
            o.iter().zip(t.iter()).map(move |(&o, &t)| {
                let v = o as f32 * (1.0 - m) + t as f32 * m;
                v.round().clamp(0.0, 255.0) as u8
            })
        })
        .collect();

    Frame::new(data, original.width(), original.height(), original.channels())
}
