use crate::charset::CharacterSet;
use crate::config::PipelineConfig;
use crate::error::CoreError;
use crate::quantize::{ColorLevels, Quantizer, check_palette_size};

/// Paramètres de conversion immuables, construits une fois au démarrage.
///
/// Partagés par référence entre la palette, le mapper et le compositor :
/// les largeurs de bucket ne peuvent donc pas diverger entre construction
/// et requête.
///
/// # Example
/// ```
/// use af_core::config::PipelineConfig;
/// use af_core::params::ConversionParams;
/// let params = ConversionParams::from_config(&PipelineConfig::default()).unwrap();
/// assert_eq!(params.grid_step(), 6);
/// assert_eq!(params.luminance().bucket_width(), 17);
/// assert_eq!(params.color().bucket_width(), 17);
/// ```
#[derive(Clone, Debug)]
pub struct ConversionParams {
    charset: CharacterSet,
    colors: ColorLevels,
    grid_step: u32,
}

impl ConversionParams {
    /// Assemble parameters from already-built parts.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if `grid_step` is zero or the palette
    /// would exceed [`crate::quantize::MAX_PALETTE_BITMAPS`].
    pub fn new(
        charset: CharacterSet,
        colors: ColorLevels,
        grid_step: u32,
    ) -> Result<Self, CoreError> {
        if grid_step == 0 {
            return Err(CoreError::Config("grid_step doit être ≥ 1".to_string()));
        }
        check_palette_size(charset.len(), colors.keys_per_channel())?;
        Ok(Self {
            charset,
            colors,
            grid_step,
        })
    }

    /// Validate `config` and derive every quantizer from it.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] on any invalid field.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let charset = CharacterSet::new(&config.character_set)?;
        let colors = ColorLevels::new(config.color_level_count)?;
        Self::new(charset, colors, config.grid_step())
    }

    /// Glyphes, du plus vide au plus dense.
    #[must_use]
    pub fn charset(&self) -> &CharacterSet {
        &self.charset
    }

    /// Color levels and their representatives.
    #[must_use]
    pub fn colors(&self) -> &ColorLevels {
        &self.colors
    }

    /// Luminance quantizer.
    #[must_use]
    pub fn luminance(&self) -> Quantizer {
        self.charset.luminance_quantizer()
    }

    /// Per-channel color quantizer.
    #[must_use]
    pub fn color(&self) -> Quantizer {
        self.colors.quantizer()
    }

    /// Pixel distance between sampled cells.
    #[must_use]
    pub fn grid_step(&self) -> u32 {
        self.grid_step
    }
}
