use crate::error::CoreError;

/// Quantificateur à pas constant : `index = value / bucket_width` (division entière).
///
/// Le même quantificateur doit servir à construire la palette et à l'interroger.
///
/// # Example
/// ```
/// use af_core::quantize::Quantizer;
/// let q = Quantizer::for_color_levels(16).unwrap();
/// assert_eq!(q.bucket_width(), 17);
/// assert_eq!(q.quantize(200), 11);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quantizer {
    bucket_width: u16,
}

impl Quantizer {
    /// Create a quantizer with an explicit bucket width.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if `bucket_width` is zero.
    pub fn new(bucket_width: u16) -> Result<Self, CoreError> {
        if bucket_width == 0 {
            return Err(CoreError::Config(
                "largeur de quantification nulle".to_string(),
            ));
        }
        Ok(Self { bucket_width })
    }

    /// Luminance quantizer for a character set of `len` glyphs: width `256 / (len - 1)`.
    ///
    /// Every gray value in `[0, 255]` lands in `[0, len - 1]`.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if `len` is outside `2..=257`.
    ///
    /// # Example
    /// ```
    /// use af_core::quantize::Quantizer;
    /// assert_eq!(Quantizer::for_charset_len(16).unwrap().bucket_width(), 17);
    /// assert_eq!(Quantizer::for_charset_len(2).unwrap().bucket_width(), 256);
    /// ```
    pub fn for_charset_len(len: usize) -> Result<Self, CoreError> {
        if !(2..=257).contains(&len) {
            return Err(CoreError::Config(format!(
                "le charset doit contenir entre 2 et 257 caractères (reçu {len})"
            )));
        }
        Self::new((256 / (len - 1)) as u16)
    }

    /// Per-channel color quantizer for `levels` steps: width `255 / (levels - 1)`.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if `levels` is outside `2..=256`.
    pub fn for_color_levels(levels: u16) -> Result<Self, CoreError> {
        if !(2..=256).contains(&levels) {
            return Err(CoreError::Config(format!(
                "color_level_count doit être dans 2..=256 (reçu {levels})"
            )));
        }
        Self::new(255 / (levels - 1))
    }

    /// Largeur d'un bucket.
    #[must_use]
    pub fn bucket_width(self) -> u16 {
        self.bucket_width
    }

    /// Floor-divide `value` by the bucket width.
    #[inline(always)]
    #[must_use]
    pub fn quantize(self, value: u8) -> u8 {
        (u16::from(value) / self.bucket_width) as u8
    }

    /// Number of distinct indices reachable from inputs in `[0, 255]`.
    ///
    /// # Example
    /// ```
    /// use af_core::quantize::Quantizer;
    /// assert_eq!(Quantizer::for_color_levels(16).unwrap().bucket_count(), 16);
    /// assert_eq!(Quantizer::for_color_levels(17).unwrap().bucket_count(), 18);
    /// ```
    #[must_use]
    pub fn bucket_count(self) -> usize {
        usize::from(255 / self.bucket_width) + 1
    }
}

/// Nombre maximal de bitmaps de la palette (`glyphes × n³`).
///
/// 2²² bitmaps de 6×12 RGBA occupent déjà environ 1,2 Gio.
pub const MAX_PALETTE_BITMAPS: usize = 1 << 22;

/// Vérifie que `glyphs × keys_per_channel³` reste sous [`MAX_PALETTE_BITMAPS`].
///
/// # Errors
/// Returns [`CoreError::Config`] naming the palette size when it is too large.
///
/// # Example
/// ```
/// use af_core::quantize::check_palette_size;
/// assert!(check_palette_size(16, 16).is_ok());
/// assert!(check_palette_size(16, 256).is_err());
/// ```
pub fn check_palette_size(glyphs: usize, keys_per_channel: usize) -> Result<(), CoreError> {
    let bitmaps = keys_per_channel
        .checked_pow(3)
        .and_then(|cube| cube.checked_mul(glyphs));
    match bitmaps {
        Some(n) if n <= MAX_PALETTE_BITMAPS => Ok(()),
        _ => Err(CoreError::Config(format!(
            "palette trop grande : {glyphs} glyphes × {keys_per_channel}³ couleurs \
             dépasse {MAX_PALETTE_BITMAPS} bitmaps (réduire color_level_count ou le charset)"
        ))),
    }
}

/// Clé couleur quantifiée (un index de bucket par canal).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorKey {
    /// Red bucket.
    pub r: u8,
    /// Green bucket.
    pub g: u8,
    /// Blue bucket.
    pub b: u8,
}

impl ColorKey {
    /// Quantize an RGB triple channel by channel.
    ///
    /// # Example
    /// ```
    /// use af_core::quantize::{ColorKey, Quantizer};
    /// let q = Quantizer::for_color_levels(16).unwrap();
    /// let key = ColorKey::from_rgb(q, (200, 10, 250));
    /// assert_eq!(key, ColorKey { r: 11, g: 0, b: 14 });
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn from_rgb(quantizer: Quantizer, (r, g, b): (u8, u8, u8)) -> Self {
        Self {
            r: quantizer.quantize(r),
            g: quantizer.quantize(g),
            b: quantizer.quantize(b),
        }
    }
}

/// Niveaux de couleur par canal et leurs couleurs représentatives.
///
/// `count` valeurs équidistantes dans `[0, 255]` (troncature entière). Chaque
/// index atteignable par le quantificateur reçoit un représentant, y compris
/// quand la troncature de la largeur en produit plus que `count`.
///
/// # Example
/// ```
/// use af_core::quantize::ColorLevels;
/// let levels = ColorLevels::new(16).unwrap();
/// assert_eq!(levels.keys_per_channel(), 16);
/// assert_eq!(levels.representative(11), 187);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorLevels {
    count: u16,
    quantizer: Quantizer,
    /// Indexed by channel key.
    representatives: Vec<u8>,
}

impl ColorLevels {
    /// Build the levels for `count` steps per channel.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if `count` is outside `2..=256`.
    pub fn new(count: u16) -> Result<Self, CoreError> {
        let quantizer = Quantizer::for_color_levels(count)?;
        let keys = quantizer.bucket_count();

        let mut slots: Vec<Option<u8>> = vec![None; keys];
        for value in evenly_spaced(count) {
            let slot = &mut slots[usize::from(quantizer.quantize(value))];
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        let width = usize::from(quantizer.bucket_width());
        let representatives: Vec<u8> = slots
            .into_iter()
            .enumerate()
            .map(|(key, slot)| slot.unwrap_or_else(|| (key * width).min(255) as u8))
            .collect();

        if keys != usize::from(count) {
            log::warn!(
                "color_level_count={count} : largeur {width} → {keys} buckets par canal atteignables"
            );
        }

        Ok(Self {
            count,
            quantizer,
            representatives,
        })
    }

    /// Requested number of levels.
    #[must_use]
    pub fn count(&self) -> u16 {
        self.count
    }

    /// Quantificateur partagé par la palette et le mapper.
    #[must_use]
    pub fn quantizer(&self) -> Quantizer {
        self.quantizer
    }

    /// Number of reachable keys per channel.
    #[must_use]
    pub fn keys_per_channel(&self) -> usize {
        self.representatives.len()
    }

    /// Representative channel value for a key.
    ///
    /// Keys past the reachable range clamp to the last representative.
    #[must_use]
    pub fn representative(&self, key: u8) -> u8 {
        let idx = usize::from(key).min(self.representatives.len() - 1);
        self.representatives[idx]
    }

    /// Cartesian product of all reachable keys with their representative colors,
    /// red-major.
    pub fn palette(&self) -> impl Iterator<Item = (ColorKey, (u8, u8, u8))> + '_ {
        let n = self.representatives.len();
        (0..n).flat_map(move |r| {
            (0..n).flat_map(move |g| {
                (0..n).map(move |b| {
                    let key = ColorKey {
                        r: r as u8,
                        g: g as u8,
                        b: b as u8,
                    };
                    let color = (
                        self.representatives[r],
                        self.representatives[g],
                        self.representatives[b],
                    );
                    (key, color)
                })
            })
        })
    }
}

/// `count` entiers équidistants de 0 à 255 inclus, tronqués.
fn evenly_spaced(count: u16) -> impl Iterator<Item = u8> {
    let steps = u32::from(count) - 1;
    (0..u32::from(count)).map(move |i| (i * 255 / steps) as u8)
}
