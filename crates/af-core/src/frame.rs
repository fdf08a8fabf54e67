use crate::error::CoreError;

/// Buffer RGB24 réutilisable, row-major, 3 bytes par pixel.
///
/// # Example
/// ```
/// use af_core::frame::RgbFrame;
/// let fb = RgbFrame::new(10, 10);
/// assert_eq!(fb.data.len(), 300);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbFrame {
    /// Pixels RGB, row-major, 3 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl RgbFrame {
    /// Crée un buffer noir aux dimensions données.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 3],
            width,
            height,
        }
    }

    /// Wrap raw RGB24 bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if `data` is not `width × height × 3` bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CoreError> {
        if data.len() != width as usize * height as usize * 3 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Accès au pixel (x, y) → (r, g, b).
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        (self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }

    /// Write one pixel.
    #[inline(always)]
    pub fn set_pixel(&mut self, x: u32, y: u32, (r, g, b): (u8, u8, u8)) {
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.data[idx] = r;
        self.data[idx + 1] = g;
        self.data[idx + 2] = b;
    }

    /// Fill every pixel with one color.
    ///
    /// # Example
    /// ```
    /// use af_core::frame::RgbFrame;
    /// let mut fb = RgbFrame::new(2, 2);
    /// fb.fill((1, 2, 3));
    /// assert_eq!(fb.pixel(1, 1), (1, 2, 3));
    /// ```
    pub fn fill(&mut self, (r, g, b): (u8, u8, u8)) {
        for px in self.data.chunks_exact_mut(3) {
            px[0] = r;
            px[1] = g;
            px[2] = b;
        }
    }
}

/// Luminance BT.601 entière, arrondie (même pondération qu'une conversion BGR→GRAY).
///
/// # Example
/// ```
/// use af_core::frame::luma_bt601;
/// assert_eq!(luma_bt601(255, 255, 255), 255);
/// assert_eq!(luma_bt601(0, 0, 0), 0);
/// ```
#[inline(always)]
#[must_use]
pub fn luma_bt601(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114 + 500) / 1000) as u8
}

/// Buffer de niveaux de gris, un byte par pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayFrame {
    /// Gray samples, row-major.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl GrayFrame {
    /// Black gray buffer.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize],
            width,
            height,
        }
    }

    /// Derive a gray buffer from an RGB frame.
    ///
    /// # Example
    /// ```
    /// use af_core::frame::{GrayFrame, RgbFrame};
    /// let mut rgb = RgbFrame::new(1, 1);
    /// rgb.fill((255, 255, 255));
    /// assert_eq!(GrayFrame::from_rgb(&rgb).value(0, 0), 255);
    /// ```
    #[must_use]
    pub fn from_rgb(rgb: &RgbFrame) -> Self {
        let mut gray = Self::new(rgb.width, rgb.height);
        gray.update_from(rgb);
        gray
    }

    /// Recompute in place from `rgb`, reallocating only if the size changed.
    pub fn update_from(&mut self, rgb: &RgbFrame) {
        let len = rgb.width as usize * rgb.height as usize;
        self.width = rgb.width;
        self.height = rgb.height;
        self.data.resize(len, 0);
        for (dst, px) in self.data.iter_mut().zip(rgb.data.chunks_exact(3)) {
            *dst = luma_bt601(px[0], px[1], px[2]);
        }
    }

    /// Gray value at (x, y).
    #[inline(always)]
    #[must_use]
    pub fn value(&self, x: u32, y: u32) -> u8 {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        self.data[y as usize * self.width as usize + x as usize]
    }
}

/// One tick's worth of input: the color frame and its gray counterpart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramePair {
    /// Color samples.
    pub rgb: RgbFrame,
    /// Gray samples, same extent as `rgb`.
    pub gray: GrayFrame,
}

impl FramePair {
    /// Build a pair, deriving gray from `rgb`.
    #[must_use]
    pub fn from_rgb(rgb: RgbFrame) -> Self {
        let gray = GrayFrame::from_rgb(&rgb);
        Self { rgb, gray }
    }

    /// Re-derive `gray` after `rgb` was overwritten in place.
    pub fn refresh_gray(&mut self) {
        self.gray.update_from(&self.rgb);
    }

    /// (width, height) of the color frame.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.rgb.width, self.rgb.height)
    }
}

/// Bitmap RGBA d'un glyphe rendu. Alpha = couverture.
///
/// # Example
/// ```
/// use af_core::frame::Bitmap;
/// let mut bm = Bitmap::new(2, 3);
/// bm.set_pixel(1, 2, (9, 8, 7, 255));
/// assert_eq!(bm.pixel(1, 2), (9, 8, 7, 255));
/// assert_eq!(bm.pixel(0, 0), (0, 0, 0, 0));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    /// Pixels RGBA, row-major.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Bitmap {
    /// Fully transparent bitmap.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// Pixel (x, y) → (r, g, b, a).
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        (
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        )
    }

    /// Write one pixel.
    #[inline(always)]
    pub fn set_pixel(&mut self, x: u32, y: u32, (r, g, b, a): (u8, u8, u8, u8)) {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.data[idx] = r;
        self.data[idx + 1] = g;
        self.data[idx + 2] = b;
        self.data[idx + 3] = a;
    }

    /// True if no pixel has any coverage.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_checks_length() {
        assert!(RgbFrame::from_raw(2, 2, vec![0; 12]).is_ok());
        assert!(matches!(
            RgbFrame::from_raw(2, 2, vec![0; 11]),
            Err(CoreError::InvalidDimensions { width: 2, height: 2 })
        ));
    }

    #[test]
    fn gray_tracks_rgb_refresh() {
        let mut pair = FramePair::from_rgb(RgbFrame::new(3, 2));
        assert_eq!(pair.gray.value(2, 1), 0);
        pair.rgb.set_pixel(2, 1, (255, 0, 0));
        pair.refresh_gray();
        assert_eq!(pair.gray.value(2, 1), luma_bt601(255, 0, 0));
        assert_eq!(pair.gray.value(0, 0), 0);
    }

    #[test]
    fn luma_weights_green_most() {
        assert!(luma_bt601(0, 255, 0) > luma_bt601(255, 0, 0));
        assert!(luma_bt601(255, 0, 0) > luma_bt601(0, 0, 255));
        assert_eq!(luma_bt601(200, 200, 200), 200);
    }
}
