use crate::error::CoreError;
use crate::quantize::Quantizer;

/// 16 caractères: du vide au plus dense, le charset par défaut.
pub const CHARSET_DEFAULT: &str = " ixzao*#MW&8%B@$";

/// 10 caractères: compact, bon contraste.
pub const CHARSET_COMPACT: &str = " .:-=+*#%@";

/// 70 caractères: Paul Bourke extended, bon équilibre.
pub const CHARSET_STANDARD: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

/// Blocs Unicode: pseudo-pixels.
pub const CHARSET_BLOCKS: &str = " ░▒▓█";

/// Minimal: haut contraste.
pub const CHARSET_MINIMAL: &str = " .:░▒▓█";

/// Look up a built-in charset by name.
///
/// # Example
/// ```
/// use af_core::charset::{preset, CHARSET_DEFAULT};
/// assert_eq!(preset("default"), Some(CHARSET_DEFAULT));
/// assert_eq!(preset("nope"), None);
/// ```
#[must_use]
pub fn preset(name: &str) -> Option<&'static str> {
    match name {
        "default" => Some(CHARSET_DEFAULT),
        "compact" => Some(CHARSET_COMPACT),
        "standard" => Some(CHARSET_STANDARD),
        "blocks" => Some(CHARSET_BLOCKS),
        "minimal" => Some(CHARSET_MINIMAL),
        _ => None,
    }
}

/// Ordered glyph set, emptiest first. Index 0 means "no glyph".
///
/// Carries the luminance quantizer derived from its length so the two can
/// never disagree.
///
/// # Example
/// ```
/// use af_core::charset::CharacterSet;
/// let set = CharacterSet::new(" ixzao*#MW&8%B@$").unwrap();
/// assert_eq!(set.glyph_for(0), None);
/// assert_eq!(set.glyph_for(200), Some('8'));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterSet {
    chars: Vec<char>,
    luminance: Quantizer,
}

impl CharacterSet {
    /// Build a set from a string ordered lightest→densest.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if the set has fewer than 2 or more than
    /// 257 characters, or repeats a character.
    pub fn new(charset: &str) -> Result<Self, CoreError> {
        let chars: Vec<char> = charset.chars().collect();
        let luminance = Quantizer::for_charset_len(chars.len())?;
        for (i, ch) in chars.iter().enumerate() {
            if chars[..i].contains(ch) {
                return Err(CoreError::Config(format!(
                    "caractère dupliqué dans le charset : {ch:?}"
                )));
            }
        }
        Ok(Self { chars, luminance })
    }

    /// Nombre de glyphes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Always false for a constructed set; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Glyphs in density order.
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Character at a density index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    /// Density index of a character.
    #[must_use]
    pub fn position(&self, ch: char) -> Option<usize> {
        self.chars.iter().position(|&c| c == ch)
    }

    /// Quantificateur de luminance (`256 / (len - 1)`).
    #[must_use]
    pub fn luminance_quantizer(&self) -> Quantizer {
        self.luminance
    }

    /// Density index for a gray value.
    #[inline(always)]
    #[must_use]
    pub fn index_for(&self, gray: u8) -> usize {
        usize::from(self.luminance.quantize(gray))
    }

    /// Glyph for a gray value, `None` for background-level luminance.
    #[inline]
    #[must_use]
    pub fn glyph_for(&self, gray: u8) -> Option<char> {
        match self.index_for(gray) {
            0 => None,
            idx => Some(self.chars[idx]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid_sets() {
        for name in ["default", "compact", "standard", "blocks", "minimal"] {
            let chars = preset(name).unwrap();
            assert!(CharacterSet::new(chars).is_ok(), "preset {name} invalide");
        }
    }

    #[test]
    fn density_index_is_monotonic() {
        let set = CharacterSet::new(CHARSET_DEFAULT).unwrap();
        let mut prev = 0usize;
        for v in 0..=255u8 {
            let idx = set.index_for(v);
            assert!(idx >= prev, "index non monotone à luminance {v}");
            assert!(idx < set.len());
            prev = idx;
        }
        assert_eq!(prev, 15);
    }

    #[test]
    fn gray_200_picks_twelfth_glyph() {
        let set = CharacterSet::new(CHARSET_DEFAULT).unwrap();
        assert_eq!(set.index_for(200), 11);
        assert_eq!(set.glyph_for(200), Some('8'));
    }

    #[test]
    fn dark_cells_have_no_glyph() {
        let set = CharacterSet::new(CHARSET_DEFAULT).unwrap();
        for v in 0..17u8 {
            assert_eq!(set.glyph_for(v), None);
        }
        assert_eq!(set.glyph_for(17), Some('i'));
    }

    #[test]
    fn two_glyph_set_never_emits() {
        let set = CharacterSet::new(" #").unwrap();
        assert!((0..=255u8).all(|v| set.glyph_for(v).is_none()));
    }

    #[test]
    fn rejects_bad_sets() {
        assert!(CharacterSet::new("").is_err());
        assert!(CharacterSet::new("#").is_err());
        assert!(CharacterSet::new(" ##").is_err());
    }
}
