//! Fakes partagés par les tests du crate.

use std::sync::atomic::{AtomicUsize, Ordering};

use af_core::charset::CharacterSet;
use af_core::frame::{Bitmap, FramePair, RgbFrame};
use af_core::params::ConversionParams;
use af_core::quantize::ColorLevels;
use af_core::traits::{DisplaySurface, FrameSource, GlyphRasterizer};

pub(crate) fn params(charset: &str, levels: u16, step: u32) -> ConversionParams {
    ConversionParams::new(
        CharacterSet::new(charset).unwrap(),
        ColorLevels::new(levels).unwrap(),
        step,
    )
    .unwrap()
}

/// Opaque block of the requested color; counts calls.
pub(crate) struct SolidRasterizer {
    width: u32,
    height: u32,
    calls: AtomicUsize,
}

impl SolidRasterizer {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl GlyphRasterizer for SolidRasterizer {
    fn render(&self, _ch: char, (r, g, b): (u8, u8, u8)) -> Bitmap {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let mut bitmap = Bitmap::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                bitmap.set_pixel(x, y, (r, g, b, 255));
            }
        }
        bitmap
    }

    fn glyph_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// 1×1 bitmap whose red channel stores the (ASCII) character.
pub(crate) struct MarkerRasterizer;

impl MarkerRasterizer {
    pub(crate) fn glyph_of(bitmap: &Bitmap) -> char {
        char::from(bitmap.pixel(0, 0).0)
    }
}

impl GlyphRasterizer for MarkerRasterizer {
    fn render(&self, ch: char, (_, g, b): (u8, u8, u8)) -> Bitmap {
        let mut bitmap = Bitmap::new(1, 1);
        bitmap.set_pixel(0, 0, (ch as u8, g, b, 255));
        bitmap
    }

    fn glyph_size(&self) -> (u32, u32) {
        (1, 1)
    }
}

/// Serves `remaining` copies of one frame, then end-of-stream.
pub(crate) struct ScriptedSource {
    frame: FramePair,
    remaining: usize,
    pub(crate) calls: usize,
}

impl ScriptedSource {
    pub(crate) fn new(rgb: RgbFrame, frames: usize) -> Self {
        Self {
            frame: FramePair::from_rgb(rgb),
            remaining: frames,
            calls: 0,
        }
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> anyhow::Result<Option<&FramePair>> {
        self.calls += 1;
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(&self.frame))
    }

    fn dimensions(&self) -> (u32, u32) {
        self.frame.dimensions()
    }
}

/// Records every surface call.
#[derive(Default)]
pub(crate) struct RecordingSurface {
    pub(crate) clears: usize,
    pub(crate) blits: Vec<(u32, u32)>,
    pub(crate) presents: usize,
    /// `presents` value at which `present` starts failing.
    pub(crate) fail_at: Option<usize>,
}

impl DisplaySurface for RecordingSurface {
    fn clear(&mut self, _color: (u8, u8, u8)) {
        self.clears += 1;
    }

    fn blit(&mut self, _bitmap: &Bitmap, x: u32, y: u32) {
        self.blits.push((x, y));
    }

    fn present(&mut self) -> anyhow::Result<()> {
        if self.fail_at == Some(self.presents) {
            anyhow::bail!("présentation impossible");
        }
        self.presents += 1;
        Ok(())
    }
}
