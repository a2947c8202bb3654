/// Rounds a requested kernel size up to the next odd value (minimum 1).
pub fn odd_kernel_size(kernel_size: usize) -> usize {
    kernel_size | 1
}

/// Sigma used when none is given, following OpenCV's `getGaussianKernel`.
pub fn default_sigma(kernel_size: usize) -> f64 {
    0.3 * ((kernel_size as f64 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1D Gaussian weights.
///
/// `kernel_size` must be odd. A non-positive `sigma` is replaced by
/// [`default_sigma`].
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f64) -> Vec<f32> {
    debug_assert!(kernel_size % 2 == 1);
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        default_sigma(kernel_size)
    };
    let center = (kernel_size / 2) as f64;
    let weights: Vec<f64> = (0..kernel_size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| (w / total) as f32).collect()
}

/// Separable Gaussian blur, borders clamped to the edge pixel.
///
/// Kernels of 100 taps or more run on a box-shrunk copy with a matching
/// smaller kernel, then get stretched back bilinearly.
#[derive(Clone, Debug)]
pub struct GaussianBlur {
    full: Vec<f32>,
    reduced: Vec<f32>,
    factor: usize,
}

impl GaussianBlur {
    pub fn new(kernel_size: usize, sigma: f64) -> Self {
        let kernel_size = odd_kernel_size(kernel_size);
        let factor = (kernel_size / 50).max(1);
        let reduced_sigma = if sigma > 0.0 {
            sigma / factor as f64
        } else {
            0.0
        };
        Self {
            full: gaussian_kernel_1d(kernel_size, sigma),
            reduced: gaussian_kernel_1d((kernel_size / factor) | 1, reduced_sigma),
            factor,
        }
    }

    pub fn kernel_size(&self) -> usize {
        self.full.len()
    }

    /// Blurs `width * height` interleaved 8-bit pixels in place.
    pub fn apply(&self, data: &mut [u8], width: usize, height: usize, channels: usize) {
        let len = width * height * channels;
        let mut values: Vec<f32> = data[..len].iter().map(|&v| v as f32).collect();

        if self.factor > 1 && width >= self.factor * 2 && height >= self.factor * 2 {
            let (mut small, sw, sh) = shrink(&values, width, height, channels, self.factor);
            separable(&mut small, sw, sh, channels, &self.reduced);
            values = stretch(&small, sw, sh, channels, width, height);
        } else {
            separable(&mut values, width, height, channels, &self.full);
        }

        for (out, v) in data[..len].iter_mut().zip(values) {
            *out = v.round().clamp(0.0, 255.0) as u8;
        }
    }

    /// Blurs a single float plane in place, always at full resolution.
    pub fn apply_plane(&self, plane: &mut [f32], width: usize, height: usize) {
        separable(&mut plane[..width * height], width, height, 1, &self.full);
    }
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

fn separable(values: &mut [f32], width: usize, height: usize, channels: usize, kernel: &[f32]) {
    if kernel.len() <= 1 || width == 0 || height == 0 {
        return;
    }
    let mut temp = vec![0.0f32; values.len()];
    convolve(values, &mut temp, width, height, channels, kernel, Axis::Horizontal);
    convolve(&temp, values, width, height, channels, kernel, Axis::Vertical);
}

/// One pass of `kernel` along `axis` from `src` into `dst`.
fn convolve(
    src: &[f32],
    dst: &mut [f32],
    width: usize,
    height: usize,
    channels: usize,
    kernel: &[f32],
    axis: Axis,
) {
    let half = (kernel.len() / 2) as isize;
    let (len, stride) = match axis {
        Axis::Horizontal => (width, channels),
        Axis::Vertical => (height, width * channels),
    };

    for y in 0..height {
        for x in 0..width {
            let pos = match axis {
                Axis::Horizontal => x,
                Axis::Vertical => y,
            };
            let pixel = (y * width + x) * channels;
            // Start of the row (horizontal) or column (vertical) holding the pixel.
            let line = pixel - pos * stride;
            for c in 0..channels {
                dst[pixel + c] = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, &w)| {
                        let i = (pos as isize + k as isize - half).clamp(0, len as isize - 1);
                        src[line + i as usize * stride + c] * w
                    })
                    .sum();
            }
        }
    }
}

/// Box-averages `factor x factor` blocks; leftover edge pixels are dropped.
fn shrink(
    src: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    factor: usize,
) -> (Vec<f32>, usize, usize) {
    let (sw, sh) = (width / factor, height / factor);
    let area = (factor * factor) as f32;
    let mut out = Vec::with_capacity(sw * sh * channels);

    for y in 0..sh {
        for x in 0..sw {
            for c in 0..channels {
                let mut sum = 0.0f32;
                for row in y * factor..(y + 1) * factor {
                    for col in x * factor..(x + 1) * factor {
                        sum += src[(row * width + col) * channels + c];
                    }
                }
                out.push(sum / area);
            }
        }
    }
    (out, sw, sh)
}

/// Bilinear resize with the corner samples aligned.
fn stretch(
    src: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    target_w: usize,
    target_h: usize,
) -> Vec<f32> {
    let cols = sample_positions(width, target_w);
    let rows = sample_positions(height, target_h);
    let at = |x: usize, y: usize, c: usize| src[(y * width + x) * channels + c];

    let mut out = Vec::with_capacity(target_w * target_h * channels);
    for &(y0, y1, fy) in &rows {
        for &(x0, x1, fx) in &cols {
            for c in 0..channels {
                let top = at(x0, y0, c) + (at(x1, y0, c) - at(x0, y0, c)) * fx;
                let bottom = at(x0, y1, c) + (at(x1, y1, c) - at(x0, y1, c)) * fx;
                out.push(top + (bottom - top) * fy);
            }
        }
    }
    out
}

/// For each output index: both source neighbours and the weight of the second.
fn sample_positions(src_len: usize, dst_len: usize) -> Vec<(usize, usize, f32)> {
    let last = src_len.saturating_sub(1);
    let step = if dst_len > 1 {
        last as f32 / (dst_len - 1) as f32
    } else {
        0.0
    };
    (0..dst_len)
        .map(|i| {
            let pos = i as f32 * step;
            let lo = (pos.floor() as usize).min(last);
            let hi = (lo + 1).min(last);
            (lo, hi, pos - lo as f32)
        })
        .collect()
}
