use crate::shared::error::RedactionError;

/// Axis-aligned box in image pixel coordinates.
///
/// Stored as `top, right, bottom, left` with exclusive `right`/`bottom`,
/// so `width = right - left`. Detector output in `(x1, y1, x2, y2)` form is
/// converted once at the detector boundary via [`Rect::from_xyxy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Rect {
    pub fn new(top: u32, right: u32, bottom: u32, left: u32) -> Self {
        debug_assert!(
            top <= bottom && left <= right,
            "rect must satisfy top <= bottom and left <= right"
        );
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Builds a rect from float corner coordinates.
    ///
    /// Corners may arrive swapped or negative from a model; both are
    /// normalized here so the rest of the crate never sees them.
    pub fn from_xyxy(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let to_px = |v: f64| v.round().max(0.0) as u32;
        let (l, r) = (to_px(x1.min(x2)), to_px(x1.max(x2)));
        let (t, b) = (to_px(y1.min(y2)), to_px(y1.max(y2)));
        Self::new(t, r, b, l)
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Center as `(x, y)`, rounded down.
    pub fn center(&self) -> (u32, u32) {
        (
            self.left + self.width() / 2,
            self.top + self.height() / 2,
        )
    }

    /// True when `inner` lies entirely within `self`. Edges may coincide.
    pub fn contains(&self, inner: &Rect) -> bool {
        self.top <= inner.top
            && self.left <= inner.left
            && self.right >= inner.right
            && self.bottom >= inner.bottom
    }

    /// Clamps every coordinate into the image and rejects empty results.
    pub fn clip_to_bounds(&self, width: u32, height: u32) -> Result<Rect, RedactionError> {
        let clipped = Rect {
            top: self.top.min(height),
            right: self.right.min(width),
            bottom: self.bottom.min(height),
            left: self.left.min(width),
        };
        if clipped.top >= clipped.bottom || clipped.left >= clipped.right {
            return Err(RedactionError::InvalidRegion {
                rect: *self,
                width,
                height,
            });
        }
        Ok(clipped)
    }

    /// Grows every side by `amount`, saturating at the image edges.
    pub fn pad(&self, amount: u32, width: u32, height: u32) -> Rect {
        Rect {
            top: self.top.saturating_sub(amount).min(height),
            right: self.right.saturating_add(amount).min(width),
            bottom: self.bottom.saturating_add(amount).min(height),
            left: self.left.saturating_sub(amount).min(width),
        }
    }

    pub fn iou(&self, other: &Rect) -> f64 {
        let ix1 = self.left.max(other.left);
        let iy1 = self.top.max(other.top);
        let ix2 = self.right.min(other.right);
        let iy2 = self.bottom.min(other.bottom);

        let inter = ix2.saturating_sub(ix1) as f64 * iy2.saturating_sub(iy1) as f64;
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() as f64 + other.area() as f64 - inter)
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(top={}, right={}, bottom={}, left={})",
            self.top, self.right, self.bottom, self.left
        )
    }
}
