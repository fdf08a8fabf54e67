use af_core::frame::{Bitmap, FramePair};
use af_core::quantize::ColorKey;

use crate::palette::GlyphCache;

/// Instruction de placement : un bitmap de la palette et sa position en pixels.
///
/// Éphémère, valide pour un tick.
#[derive(Clone, Copy, Debug)]
pub struct Placement<'a> {
    /// Bitmap borrowed from the glyph cache.
    pub bitmap: &'a Bitmap,
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
}

/// Échantillonne une frame sur une grille et émet les placements de glyphes.
///
/// # Example
/// ```
/// use af_ascii::mapper::FrameMapper;
/// let mapper = FrameMapper::new(6);
/// assert_eq!(mapper.cell_bound(120, 90), 300);
/// assert_eq!(mapper.cell_bound(121, 90), 315);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameMapper {
    step: u32,
}

impl FrameMapper {
    /// Mapper with a grid step in pixels.
    ///
    /// # Panics
    /// Panics if `step` is zero.
    #[must_use]
    pub fn new(step: u32) -> Self {
        assert!(step >= 1, "le pas de grille doit être ≥ 1");
        Self { step }
    }

    /// Grid step in pixels.
    #[must_use]
    pub fn step(&self) -> u32 {
        self.step
    }

    /// Upper bound on placements for a `width × height` frame:
    /// `⌈width/step⌉ × ⌈height/step⌉`.
    #[must_use]
    pub fn cell_bound(&self, width: u32, height: u32) -> usize {
        width.div_ceil(self.step) as usize * height.div_ceil(self.step) as usize
    }

    /// Map one frame, appending placements to `out` (cleared first).
    ///
    /// Cells whose luminance quantizes to 0 emit nothing. Row-major order.
    ///
    /// # Panics
    /// Panics if the RGB and gray buffers differ in size.
    pub fn map_into<'a>(
        &self,
        frame: &FramePair,
        cache: &'a GlyphCache,
        out: &mut Vec<Placement<'a>>,
    ) {
        let (width, height) = frame.dimensions();
        assert_eq!(
            (width, height),
            (frame.gray.width, frame.gray.height),
            "buffers RGB et gris de tailles différentes"
        );

        out.clear();
        let luminance = cache.luminance_quantizer();
        let color = cache.color_quantizer();
        let step = self.step as usize;

        for y in (0..height).step_by(step) {
            for x in (0..width).step_by(step) {
                let glyph = usize::from(luminance.quantize(frame.gray.value(x, y)));
                if glyph == 0 {
                    continue;
                }
                let key = ColorKey::from_rgb(color, frame.rgb.pixel(x, y));
                out.push(Placement {
                    bitmap: cache.glyph(glyph, key),
                    x,
                    y,
                });
            }
        }
    }

    /// Allocating convenience over [`FrameMapper::map_into`].
    #[must_use]
    pub fn map<'a>(&self, frame: &FramePair, cache: &'a GlyphCache) -> Vec<Placement<'a>> {
        let (width, height) = frame.dimensions();
        let mut out = Vec::with_capacity(self.cell_bound(width, height));
        self.map_into(frame, cache, &mut out);
        out
    }
}
