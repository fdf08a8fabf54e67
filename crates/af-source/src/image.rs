use std::path::Path;

use af_core::frame::{FramePair, RgbFrame};
use af_core::traits::FrameSource;
use anyhow::{Context, Result};
use image::imageops::FilterType;

/// Source d'image statique. Retourne toujours la même frame.
///
/// Une source "live" : elle ne signale jamais la fin du flux.
///
/// # Example
/// ```no_run
/// use af_source::image::ImageSource;
/// use std::path::Path;
/// let source = ImageSource::open(Path::new("test.png"), 640, 360).unwrap();
/// ```
pub struct ImageSource {
    frame: FramePair,
}

impl ImageSource {
    /// Charge une image, réduite à `max_width × max_height` au plus (ratio
    /// conservé).
    ///
    /// # Errors
    /// Returns an error if the image cannot be loaded.
    pub fn open(path: &Path, max_width: u32, max_height: u32) -> Result<Self> {
        let img = image::open(path)
            .with_context(|| format!("Impossible de charger {}", path.display()))?;
        let img = if img.width() > max_width || img.height() > max_height {
            img.resize(max_width, max_height, FilterType::Triangle)
        } else {
            img
        };
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        log::info!("Image {}: {width}x{height}", path.display());
        Ok(Self::from_frame(RgbFrame::from_raw(width, height, rgb.into_raw())?))
    }

    /// Source servant `rgb` indéfiniment.
    #[must_use]
    pub fn from_frame(rgb: RgbFrame) -> Self {
        Self {
            frame: FramePair::from_rgb(rgb),
        }
    }
}

impl FrameSource for ImageSource {
    fn next_frame(&mut self) -> Result<Option<&FramePair>> {
        Ok(Some(&self.frame))
    }

    fn dimensions(&self) -> (u32, u32) {
        self.frame.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_and_downscales() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        let img = image::RgbImage::from_pixel(200, 100, image::Rgb([0, 128, 255]));
        img.save(&path).unwrap();

        let mut source = ImageSource::open(&path, 100, 100).unwrap();
        assert_eq!(source.dimensions(), (100, 50));
        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!(frame.rgb.pixel(10, 10), (0, 128, 255));
        assert_eq!(frame.gray.value(10, 10), af_core::frame::luma_bt601(0, 128, 255));
    }

    #[test]
    fn never_ends() {
        let mut source = ImageSource::from_frame(RgbFrame::new(4, 4));
        for _ in 0..100 {
            assert!(source.next_frame().unwrap().is_some());
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(ImageSource::open(Path::new("/nonexistent.png"), 64, 64).is_err());
    }
}
