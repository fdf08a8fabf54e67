use crate::frame::{Bitmap, FramePair, RgbFrame};

/// Fournit les frames au pipeline, une par appel.
///
/// Implémenté par : `VideoSource`, `ImageSource`.
///
/// # Example
/// ```
/// use af_core::traits::FrameSource;
/// use af_core::frame::FramePair;
///
/// struct Empty;
/// impl FrameSource for Empty {
///     fn next_frame(&mut self) -> anyhow::Result<Option<&FramePair>> { Ok(None) }
///     fn dimensions(&self) -> (u32, u32) { (0, 0) }
/// }
/// ```
pub trait FrameSource {
    /// Acquiert la frame suivante.
    ///
    /// `Ok(None)` signale la fin du flux (pas une erreur). Le buffer
    /// retourné est emprunté jusqu'au prochain appel.
    ///
    /// # Errors
    /// Any acquisition failure; the caller treats it as terminal.
    fn next_frame(&mut self) -> anyhow::Result<Option<&FramePair>>;

    /// Dimensions fixes (width, height) de toutes les frames de la session.
    fn dimensions(&self) -> (u32, u32);

    /// Cadence nominale du flux, si connue (fps du conteneur vidéo).
    fn frame_rate(&self) -> Option<f64> {
        None
    }
}

/// Rend un caractère dans une couleur en bitmap de taille fixe.
///
/// CONTRAT : pas d'effet de bord. Appelé en parallèle pendant la
/// construction de la palette.
///
/// # Example
/// ```
/// use af_core::traits::GlyphRasterizer;
/// use af_core::frame::Bitmap;
///
/// struct Blank;
/// impl GlyphRasterizer for Blank {
///     fn render(&self, _ch: char, _color: (u8, u8, u8)) -> Bitmap { Bitmap::new(6, 12) }
///     fn glyph_size(&self) -> (u32, u32) { (6, 12) }
/// }
/// ```
pub trait GlyphRasterizer: Sync {
    /// Render `ch` in exactly `color`.
    fn render(&self, ch: char, color: (u8, u8, u8)) -> Bitmap;

    /// (width, height) of every bitmap this rasterizer returns.
    fn glyph_size(&self) -> (u32, u32);
}

/// Surface d'affichage : clear, blit, present.
pub trait DisplaySurface {
    /// Fill the whole surface with `color`.
    fn clear(&mut self, color: (u8, u8, u8));

    /// Composite `bitmap` with its top-left corner at (x, y). Later blits win.
    fn blit(&mut self, bitmap: &Bitmap, x: u32, y: u32);

    /// Show the composed frame.
    ///
    /// # Errors
    /// Presentation failures (terminal I/O, encoder pipe) end the run.
    fn present(&mut self) -> anyhow::Result<()>;
}

/// Destination d'une frame composée (terminal, encodeur, fichiers).
pub trait FrameSink {
    /// Consume one composed frame.
    ///
    /// # Errors
    /// Returns an error if the frame cannot be delivered.
    fn show(&mut self, frame: &RgbFrame) -> anyhow::Result<()>;
}
