use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, point};
use af_core::frame::Bitmap;
use af_core::traits::GlyphRasterizer;
use anyhow::{Context, Result};

/// Polices bold sans-serif usuelles, par ordre de préférence.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// First existing font among well-known system locations.
#[must_use]
pub fn discover_font() -> Option<PathBuf> {
    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Rasteriseur de glyphes ab_glyph.
///
/// Pré-calcule les masques de couverture des plages courantes (ASCII,
/// Latin-1, blocs) ; le coloriage est fait à chaque appel de `render`.
pub struct FontRasterizer {
    font: FontVec,
    scale: PxScale,
    ascent_px: f32,
    char_width: u32,
    char_height: u32,
    antialias: bool,
    /// Maps a char to its 1D alpha buffer (size = char_width * char_height)
    masks: HashMap<char, Vec<u8>>,
}

impl FontRasterizer {
    /// Charge une police depuis ses octets, à `font_size` pixels.
    ///
    /// # Errors
    /// Retourne une erreur si la police fournie est invalide.
    pub fn new(font_data: Vec<u8>, font_size: u32, antialias: bool) -> Result<Self> {
        let font = FontVec::try_from_vec(font_data).context("Police invalide")?;
        let scale = PxScale::from(font_size as f32);

        let v_advance = font.ascent_unscaled() - font.descent_unscaled() + font.line_gap_unscaled();
        let height = (v_advance * scale.y / font.height_unscaled()).ceil() as u32;

        let m_glyph = font.glyph_id('M');
        let h_advance = font.h_advance_unscaled(m_glyph);
        let width = (h_advance * scale.x / font.height_unscaled()).ceil() as u32;
        let ascent_px = font.ascent_unscaled() * scale.y / font.height_unscaled();

        let mut rasterizer = Self {
            font,
            scale,
            ascent_px,
            char_width: width.max(1),
            char_height: height.max(1),
            antialias,
            masks: HashMap::new(),
        };

        rasterizer.cache_range(32..=126);
        rasterizer.cache_range(0x00A0..=0x00FF);
        rasterizer.cache_range(0x2580..=0x259F);

        log::info!(
            "Rasteriseur : {}×{} px par glyphe, {} masques pré-calculés",
            rasterizer.char_width,
            rasterizer.char_height,
            rasterizer.masks.len()
        );
        Ok(rasterizer)
    }

    /// Charge une police depuis un fichier TTF/OTF.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a font.
    pub fn from_file(path: &Path, font_size: u32, antialias: bool) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Impossible de lire la police {}", path.display()))?;
        Self::new(data, font_size, antialias)
            .with_context(|| format!("Police inutilisable : {}", path.display()))
    }

    fn cache_range(&mut self, range: std::ops::RangeInclusive<u32>) {
        for codepoint in range {
            if let Some(ch) = char::from_u32(codepoint)
                && let Some(mask) = self.rasterize(ch)
            {
                self.masks.insert(ch, mask);
            }
        }
    }

    /// Coverage mask of `ch`, `None` if the font lacks the glyph.
    fn rasterize(&self, ch: char) -> Option<Vec<u8>> {
        // glyph_id 0 = .notdef : pas de boîte "?" dans la palette.
        let gid = self.font.glyph_id(ch);
        if gid.0 == 0 {
            return None;
        }

        let mut buffer = vec![0u8; (self.char_width * self.char_height) as usize];
        let glyph = gid.with_scale_and_position(self.scale, point(0.0, self.ascent_px));

        if let Some(outline) = self.font.outline_glyph(glyph) {
            let bounds = outline.px_bounds();
            #[allow(clippy::cast_possible_wrap)]
            outline.draw(|x, y, v| {
                let px = (x as i32 + bounds.min.x as i32).max(0) as u32;
                let py = (y as i32 + bounds.min.y as i32).max(0) as u32;
                if px < self.char_width && py < self.char_height {
                    let idx = (py * self.char_width + px) as usize;
                    buffer[idx] = buffer[idx].max((v * 255.0).round() as u8);
                }
            });
        }
        Some(buffer)
    }
}

impl GlyphRasterizer for FontRasterizer {
    fn render(&self, ch: char, color: (u8, u8, u8)) -> Bitmap {
        let (w, h) = (self.char_width, self.char_height);
        match self.masks.get(&ch) {
            Some(mask) => colorize(mask, w, h, color, self.antialias),
            None => match self.rasterize(ch) {
                Some(mask) => colorize(&mask, w, h, color, self.antialias),
                None => Bitmap::new(w, h),
            },
        }
    }

    fn glyph_size(&self) -> (u32, u32) {
        (self.char_width, self.char_height)
    }
}

/// Teinte un masque de couverture. Sans antialias, la couverture est
/// seuillée à 50 %.
///
/// # Example
/// ```
/// use af_export::rasterizer::colorize;
/// let bm = colorize(&[0, 100, 200, 255], 2, 2, (10, 20, 30), false);
/// assert_eq!(bm.pixel(0, 0), (10, 20, 30, 0));
/// assert_eq!(bm.pixel(1, 0), (10, 20, 30, 0));
/// assert_eq!(bm.pixel(0, 1), (10, 20, 30, 255));
/// ```
#[must_use]
pub fn colorize(mask: &[u8], width: u32, height: u32, (r, g, b): (u8, u8, u8), antialias: bool) -> Bitmap {
    let mut bitmap = Bitmap::new(width, height);
    for (px, &coverage) in bitmap.data.chunks_exact_mut(4).zip(mask) {
        let alpha = if antialias {
            coverage
        } else if coverage >= 128 {
            255
        } else {
            0
        };
        px[0] = r;
        px[1] = g;
        px[2] = b;
        px[3] = alpha;
    }
    bitmap
}
