use af_core::frame::{Bitmap, RgbFrame};
use af_core::traits::{DisplaySurface, FrameSink};
use anyhow::Result;

/// Surface d'affichage logicielle : un framebuffer RGB24 composé en
/// mémoire, remis à un [`FrameSink`] à chaque `present`.
///
/// Les blits sont composités par alpha ; un bitmap qui déborde est
/// rogné, et le dernier blit l'emporte sur les pixels qui se recouvrent.
///
/// # Example
/// ```
/// use af_core::frame::{Bitmap, RgbFrame};
/// use af_core::traits::{DisplaySurface, FrameSink};
/// use af_render::canvas::Canvas;
///
/// struct Discard;
/// impl FrameSink for Discard {
///     fn show(&mut self, _frame: &RgbFrame) -> anyhow::Result<()> { Ok(()) }
/// }
///
/// let mut canvas = Canvas::new(4, 4, Discard);
/// canvas.clear((0, 0, 0));
/// let mut glyph = Bitmap::new(1, 1);
/// glyph.set_pixel(0, 0, (255, 0, 0, 255));
/// canvas.blit(&glyph, 2, 1);
/// assert_eq!(canvas.frame().pixel(2, 1), (255, 0, 0));
/// ```
pub struct Canvas<S> {
    frame: RgbFrame,
    sink: S,
}

impl<S: FrameSink> Canvas<S> {
    /// Canvas `width × height`, noir.
    #[must_use]
    pub fn new(width: u32, height: u32, sink: S) -> Self {
        Self {
            frame: RgbFrame::new(width, height),
            sink,
        }
    }

    /// Framebuffer en cours de composition.
    #[must_use]
    pub fn frame(&self) -> &RgbFrame {
        &self.frame
    }

    /// Consomme le canvas et rend le sink (pour finaliser un export).
    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// `src` sur `dst` avec une opacité `alpha` sur 255.
#[inline]
fn blend(src: u8, dst: u8, alpha: u8) -> u8 {
    let a = u16::from(alpha);
    ((u16::from(src) * a + u16::from(dst) * (255 - a) + 127) / 255) as u8
}

impl<S: FrameSink> DisplaySurface for Canvas<S> {
    fn clear(&mut self, color: (u8, u8, u8)) {
        self.frame.fill(color);
    }

    fn blit(&mut self, bitmap: &Bitmap, x: u32, y: u32) {
        if x >= self.frame.width || y >= self.frame.height {
            return;
        }
        let w = bitmap.width.min(self.frame.width - x);
        let h = bitmap.height.min(self.frame.height - y);

        for by in 0..h {
            let src_row = (by * bitmap.width) as usize * 4;
            let dst_row = ((y + by) * self.frame.width + x) as usize * 3;
            for bx in 0..w as usize {
                let s = &bitmap.data[src_row + bx * 4..src_row + bx * 4 + 4];
                let alpha = s[3];
                if alpha == 0 {
                    continue;
                }
                let d = &mut self.frame.data[dst_row + bx * 3..dst_row + bx * 3 + 3];
                if alpha == 255 {
                    d.copy_from_slice(&s[..3]);
                } else {
                    for (dc, &sc) in d.iter_mut().zip(&s[..3]) {
                        *dc = blend(sc, *dc, alpha);
                    }
                }
            }
        }
    }

    fn present(&mut self) -> Result<()> {
        self.sink.show(&self.frame)
    }
}
