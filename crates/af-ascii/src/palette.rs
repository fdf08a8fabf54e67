use std::time::Instant;

use af_core::charset::CharacterSet;
use af_core::frame::Bitmap;
use af_core::params::ConversionParams;
use af_core::quantize::{ColorKey, Quantizer};
use af_core::traits::GlyphRasterizer;
use rayon::prelude::*;

/// Clé composite de la palette : index de densité du glyphe + clé couleur.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphKey {
    /// Index in the character set.
    pub glyph: usize,
    /// Quantized color.
    pub color: ColorKey,
}

/// Palette précalculée : un bitmap par (caractère, couleur quantifiée).
///
/// Construite une fois avant la boucle, immuable ensuite. Stockage plat
/// indexé par `glyph × n³ + (r × n + g) × n + b`, où `n` est le nombre de
/// clés atteignables par canal.
///
/// Le cache embarque les quantificateurs utilisés à la construction ; le
/// mapper les lui emprunte, si bien que requête et construction partagent
/// toujours la même largeur de bucket.
pub struct GlyphCache {
    charset: CharacterSet,
    color: Quantizer,
    keys_per_channel: usize,
    glyph_size: (u32, u32),
    bitmaps: Vec<Bitmap>,
}

impl GlyphCache {
    /// Render every character of the set in every representative color.
    ///
    /// Cost is `chars × n³` rasterizer calls, spread over the rayon pool.
    ///
    /// # Example
    /// ```
    /// use af_ascii::palette::GlyphCache;
    /// use af_core::config::PipelineConfig;
    /// use af_core::frame::Bitmap;
    /// use af_core::params::ConversionParams;
    /// use af_core::traits::GlyphRasterizer;
    ///
    /// struct Blank;
    /// impl GlyphRasterizer for Blank {
    ///     fn render(&self, _ch: char, _color: (u8, u8, u8)) -> Bitmap { Bitmap::new(2, 2) }
    ///     fn glyph_size(&self) -> (u32, u32) { (2, 2) }
    /// }
    ///
    /// let config = PipelineConfig { character_set: " #".into(), color_level_count: 4, ..Default::default() };
    /// let params = ConversionParams::from_config(&config).unwrap();
    /// let cache = GlyphCache::build(&params, &Blank);
    /// assert_eq!(cache.len(), 2 * 4 * 4 * 4);
    /// ```
    pub fn build<R: GlyphRasterizer + ?Sized>(params: &ConversionParams, rasterizer: &R) -> Self {
        let start = Instant::now();
        let charset = params.charset().clone();
        let colors = params.colors();
        let palette: Vec<(u8, u8, u8)> = colors.palette().map(|(_, color)| color).collect();
        let per_glyph = palette.len();
        let glyph_size = rasterizer.glyph_size();

        let chars = charset.chars();
        let bitmaps: Vec<Bitmap> = (0..chars.len() * per_glyph)
            .into_par_iter()
            .map(|slot| {
                let bitmap = rasterizer.render(chars[slot / per_glyph], palette[slot % per_glyph]);
                debug_assert_eq!((bitmap.width, bitmap.height), glyph_size);
                bitmap
            })
            .collect();

        let bytes: usize = bitmaps.iter().map(|b| b.data.len()).sum();
        log::info!(
            "Palette : {} glyphes × {} couleurs = {} bitmaps ({} Kio) en {:.0?}",
            chars.len(),
            per_glyph,
            bitmaps.len(),
            bytes / 1024,
            start.elapsed()
        );

        Self {
            charset,
            color: colors.quantizer(),
            keys_per_channel: colors.keys_per_channel(),
            glyph_size,
            bitmaps,
        }
    }

    /// Number of cached bitmaps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bitmaps.len()
    }

    /// True only for a cache built from an empty palette.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bitmaps.is_empty()
    }

    /// Charset the cache was built for.
    #[must_use]
    pub fn charset(&self) -> &CharacterSet {
        &self.charset
    }

    /// Quantificateur de luminance de la construction.
    #[must_use]
    pub fn luminance_quantizer(&self) -> Quantizer {
        self.charset.luminance_quantizer()
    }

    /// Quantificateur couleur de la construction.
    #[must_use]
    pub fn color_quantizer(&self) -> Quantizer {
        self.color
    }

    /// Reachable keys per RGB channel.
    #[must_use]
    pub fn keys_per_channel(&self) -> usize {
        self.keys_per_channel
    }

    /// Size of every cached bitmap.
    #[must_use]
    pub fn glyph_size(&self) -> (u32, u32) {
        self.glyph_size
    }

    /// True if `params` would produce exactly this cache's key space.
    ///
    /// A `false` means the cache must be rebuilt.
    #[must_use]
    pub fn matches(&self, params: &ConversionParams) -> bool {
        self.charset == *params.charset() && self.color == params.color()
    }

    #[inline(always)]
    fn slot(&self, glyph: usize, key: ColorKey) -> usize {
        let n = self.keys_per_channel;
        glyph * n * n * n + (usize::from(key.r) * n + usize::from(key.g)) * n + usize::from(key.b)
    }

    /// Hot-path lookup by density index.
    ///
    /// # Panics
    /// Panics if `glyph` or a channel of `key` lies outside the key space the
    /// cache was built for (a caller contract violation).
    #[inline(always)]
    #[must_use]
    pub fn glyph(&self, glyph: usize, key: ColorKey) -> &Bitmap {
        let n = self.keys_per_channel;
        assert!(
            usize::from(key.r.max(key.g).max(key.b)) < n,
            "clé couleur {key:?} hors palette (n={n})"
        );
        &self.bitmaps[self.slot(glyph, key)]
    }

    /// Checked lookup by composite key.
    #[must_use]
    pub fn lookup(&self, key: GlyphKey) -> Option<&Bitmap> {
        let n = self.keys_per_channel;
        let c = key.color;
        if key.glyph >= self.charset.len() || usize::from(c.r.max(c.g).max(c.b)) >= n {
            return None;
        }
        self.bitmaps.get(self.slot(key.glyph, c))
    }

    /// Checked lookup by character.
    ///
    /// # Example
    /// ```
    /// # use af_ascii::palette::GlyphCache;
    /// # use af_core::{config::PipelineConfig, frame::Bitmap, params::ConversionParams, quantize::ColorKey};
    /// # use af_core::traits::GlyphRasterizer;
    /// # struct Blank;
    /// # impl GlyphRasterizer for Blank {
    /// #     fn render(&self, _ch: char, _color: (u8, u8, u8)) -> Bitmap { Bitmap::new(1, 1) }
    /// #     fn glyph_size(&self) -> (u32, u32) { (1, 1) }
    /// # }
    /// let params = ConversionParams::from_config(&PipelineConfig::default()).unwrap();
    /// let cache = GlyphCache::build(&params, &Blank);
    /// assert!(cache.get('8', ColorKey { r: 11, g: 0, b: 14 }).is_some());
    /// assert!(cache.get('?', ColorKey { r: 0, g: 0, b: 0 }).is_none());
    /// ```
    #[must_use]
    pub fn get(&self, ch: char, color: ColorKey) -> Option<&Bitmap> {
        let glyph = self.charset.position(ch)?;
        self.lookup(GlyphKey { glyph, color })
    }

    /// Every key present in the cache, in storage order.
    pub fn keys(&self) -> impl Iterator<Item = GlyphKey> + '_ {
        let n = self.keys_per_channel;
        (0..self.bitmaps.len()).map(move |slot| {
            let per_glyph = n * n * n;
            let rest = slot % per_glyph;
            GlyphKey {
                glyph: slot / per_glyph,
                color: ColorKey {
                    r: (rest / (n * n)) as u8,
                    g: (rest / n % n) as u8,
                    b: (rest % n) as u8,
                },
            }
        })
    }
}
