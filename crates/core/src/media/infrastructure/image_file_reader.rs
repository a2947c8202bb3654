use std::path::Path;

use crate::media::domain::image_reader::ImageReader;
use crate::shared::frame::Frame;

/// Decodes image files with the `image` crate, converting to 8-bit RGB.
///
/// Alpha is dropped; the format is guessed from the file contents.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        let img = image::ImageReader::open(path)?
            .with_guessed_format()?
            .decode()?
            .to_rgb8();
        let (width, height) = img.dimensions();
        log::debug!("Read {}x{} image from {}", width, height, path.display());
        Ok(Frame::new(img.into_raw(), width, height, 3))
    }
}
