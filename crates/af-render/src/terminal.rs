use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use af_core::frame::RgbFrame;
use af_core::traits::FrameSink;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;

/// Demi-bloc inférieur : le fond porte le pixel du haut, le premier plan
/// celui du bas.
const HALF_BLOCK: char = '\u{2584}';

/// Affiche les frames composées dans le terminal, en demi-blocs couleur.
///
/// Toute touche pressée lève `stop` ; la boucle s'arrête au tick suivant.
pub struct TerminalSink {
    terminal: DefaultTerminal,
    stop: Arc<AtomicBool>,
}

impl TerminalSink {
    /// Wrap an initialized terminal (see `ratatui::init`).
    #[must_use]
    pub fn new(terminal: DefaultTerminal, stop: Arc<AtomicBool>) -> Self {
        Self { terminal, stop }
    }

    fn drain_events(&self) -> Result<()> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                log::info!("Touche {:?} : arrêt demandé", key.code);
                self.stop.store(true, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl FrameSink for TerminalSink {
    fn show(&mut self, frame: &RgbFrame) -> Result<()> {
        self.terminal.draw(|f| {
            let area = f.area();
            render_canvas(f.buffer_mut(), area, frame);
        })?;
        self.drain_events()
    }
}

/// Taille en cellules d'une image `width × height` ajustée dans `area`,
/// ratio conservé (une cellule = 1 × 2 pixels).
///
/// # Example
/// ```
/// use af_render::terminal::fit_cells;
/// assert_eq!(fit_cells(640, 360, 80, 24), (80, 23));
/// assert_eq!(fit_cells(100, 100, 200, 50), (100, 50));
/// ```
#[must_use]
pub fn fit_cells(width: u32, height: u32, cols: u16, rows: u16) -> (u16, u16) {
    if width == 0 || height == 0 || cols == 0 || rows == 0 {
        return (0, 0);
    }
    let scale = (f64::from(cols) / f64::from(width)).min(f64::from(rows) * 2.0 / f64::from(height));
    let fit_cols = (f64::from(width) * scale).round().clamp(1.0, f64::from(cols)) as u16;
    let fit_rows = (f64::from(height) * scale / 2.0)
        .round()
        .clamp(1.0, f64::from(rows)) as u16;
    (fit_cols, fit_rows)
}

/// Écrit `frame` dans `buf`, redimensionnée au plus proche voisin et
/// ancrée en haut à gauche de `area`.
pub fn render_canvas(buf: &mut Buffer, area: Rect, frame: &RgbFrame) {
    let (cols, rows) = fit_cells(frame.width, frame.height, area.width, area.height);
    if cols == 0 || rows == 0 {
        return;
    }
    let px_rows = u32::from(rows) * 2;

    for cy in 0..rows {
        let top_y = u32::from(cy) * 2 * frame.height / px_rows;
        let bottom_y = (u32::from(cy) * 2 + 1) * frame.height / px_rows;
        for cx in 0..cols {
            let sx = u32::from(cx) * frame.width / u32::from(cols);
            let (tr, tg, tb) = frame.pixel(sx, top_y);
            let (br, bg, bb) = frame.pixel(sx, bottom_y);

            if let Some(cell) = buf.cell_mut((area.x + cx, area.y + cy)) {
                cell.set_char(HALF_BLOCK)
                    .set_fg(Color::Rgb(br, bg, bb))
                    .set_bg(Color::Rgb(tr, tg, tb));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halfblock_carries_both_rows() {
        let mut frame = RgbFrame::new(2, 2);
        frame.set_pixel(0, 0, (255, 0, 0));
        frame.set_pixel(0, 1, (0, 255, 0));
        frame.set_pixel(1, 0, (0, 0, 255));
        frame.set_pixel(1, 1, (9, 9, 9));

        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        render_canvas(&mut buf, area, &frame);

        let left = &buf[(0, 0)];
        assert_eq!(left.symbol(), "▄");
        assert_eq!(left.bg, Color::Rgb(255, 0, 0));
        assert_eq!(left.fg, Color::Rgb(0, 255, 0));
        let right = &buf[(1, 0)];
        assert_eq!(right.bg, Color::Rgb(0, 0, 255));
        assert_eq!(right.fg, Color::Rgb(9, 9, 9));
    }

    #[test]
    fn large_frame_is_downscaled_into_area() {
        let mut frame = RgbFrame::new(64, 32);
        frame.fill((1, 2, 3));
        let area = Rect::new(0, 0, 16, 20);
        let mut buf = Buffer::empty(area);
        render_canvas(&mut buf, area, &frame);

        assert_eq!(fit_cells(64, 32, 16, 20), (16, 4));
        assert_eq!(buf[(15, 3)].bg, Color::Rgb(1, 2, 3));
        // sous l'image : intact
        assert_eq!(buf[(0, 4)].symbol(), " ");
    }

    #[test]
    fn empty_area_draws_nothing() {
        let frame = RgbFrame::new(8, 8);
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        render_canvas(&mut buf, area, &frame);
        assert_eq!(fit_cells(8, 8, 0, 0), (0, 0));
    }
}
