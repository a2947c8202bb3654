use ndarray::{ArrayView3, ArrayViewMut3};

use crate::shared::rect::Rect;

/// A decoded image: contiguous interleaved bytes in row-major order.
///
/// Photos are 3-channel RGB; mask outputs are 4-channel RGBA. Codec work
/// happens at the I/O boundary only.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    /// A frame with every byte set to `value`.
    pub fn filled(width: u32, height: u32, channels: u8, value: u8) -> Self {
        let len = width as usize * height as usize * channels as usize;
        Self::new(vec![value; len], width, height, channels)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// The full-image rectangle.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, self.width, self.height, 0)
    }

    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let c = self.channels as usize;
        let offset = (y as usize * self.width as usize + x as usize) * c;
        &self.data[offset..offset + c]
    }

    /// Copies the pixels under `rect` into a new, independently owned frame.
    ///
    /// `rect` must already lie within the frame.
    pub fn crop(&self, rect: &Rect) -> Frame {
        debug_assert!(self.bounds().contains(rect), "crop rect must lie within the frame");
        let c = self.channels as usize;
        let fw = self.width as usize;
        let row_len = rect.width() as usize * c;
        let mut data = Vec::with_capacity(row_len * rect.height() as usize);
        for row in rect.top as usize..rect.bottom as usize {
            let start = (row * fw + rect.left as usize) * c;
            data.extend_from_slice(&self.data[start..start + row_len]);
        }
        Frame::new(data, rect.width(), rect.height(), self.channels)
    }

    /// Writes `patch` back at the position of `rect`; sizes must agree.
    pub fn paste(&mut self, rect: &Rect, patch: &Frame) {
        debug_assert_eq!((patch.width, patch.height), (rect.width(), rect.height()));
        debug_assert_eq!(patch.channels, self.channels);
        let c = self.channels as usize;
        let fw = self.width as usize;
        let row_len = rect.width() as usize * c;
        for (i, row) in (rect.top as usize..rect.bottom as usize).enumerate() {
            let dst = (row * fw + rect.left as usize) * c;
            let src = i * row_len;
            self.data[dst..dst + row_len].copy_from_slice(&patch.data[src..src + row_len]);
        }
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
