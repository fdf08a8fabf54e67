use std::sync::atomic::{AtomicBool, Ordering};

use af_core::params::ConversionParams;
use af_core::traits::{DisplaySurface, FrameSource, GlyphRasterizer};
use anyhow::Result;

use crate::mapper::{FrameMapper, Placement};
use crate::palette::GlyphCache;

/// Raison de l'arrêt de la boucle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// La source a signalé la fin du flux.
    EndOfStream,
    /// Signal externe (Ctrl-C, touche, fermeture).
    Signal,
    /// Nombre maximal de frames atteint.
    FrameLimit,
}

/// État de la boucle. `Terminated` est le seul état terminal.
///
/// # Example
/// ```
/// use af_ascii::compositor::{LoopState, StopReason};
/// let state = LoopState::Terminated(StopReason::EndOfStream);
/// assert_ne!(state, LoopState::Running);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Consommation des frames et blits en cours.
    Running,
    /// Arrêt définitif.
    Terminated(StopReason),
}

/// Bilan d'une exécution de la boucle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames presented.
    pub frames: u64,
    /// Why the loop stopped.
    pub reason: StopReason,
}

/// Compositor : possède la palette et pilote un tick par frame.
///
/// Single-thread, synchrone : chaque tick acquiert, mappe, blitte et
/// présente avant le suivant. La palette n'est jamais modifiée après
/// construction.
pub struct Compositor {
    cache: GlyphCache,
    mapper: FrameMapper,
    background: (u8, u8, u8),
}

impl Compositor {
    /// Build the glyph cache for `params` and wrap it in a compositor.
    #[must_use]
    pub fn new<R: GlyphRasterizer + ?Sized>(
        params: &ConversionParams,
        rasterizer: &R,
        background: (u8, u8, u8),
    ) -> Self {
        Self::with_cache(
            GlyphCache::build(params, rasterizer),
            FrameMapper::new(params.grid_step()),
            background,
        )
    }

    /// Compositor over an already-built cache.
    #[must_use]
    pub fn with_cache(cache: GlyphCache, mapper: FrameMapper, background: (u8, u8, u8)) -> Self {
        Self {
            cache,
            mapper,
            background,
        }
    }

    /// One display tick: clear → acquire → map → blit → present.
    ///
    /// On end-of-stream the surface has been cleared but nothing is mapped
    /// or presented.
    ///
    /// # Errors
    /// Propagates frame-acquisition and presentation failures.
    pub fn tick<'a, S, D>(
        &'a self,
        source: &mut S,
        surface: &mut D,
        placements: &mut Vec<Placement<'a>>,
    ) -> Result<LoopState>
    where
        S: FrameSource + ?Sized,
        D: DisplaySurface + ?Sized,
    {
        surface.clear(self.background);

        let Some(frame) = source.next_frame()? else {
            return Ok(LoopState::Terminated(StopReason::EndOfStream));
        };

        self.mapper.map_into(frame, &self.cache, placements);
        for p in placements.iter() {
            surface.blit(p.bitmap, p.x, p.y);
        }

        surface.present()?;
        Ok(LoopState::Running)
    }

    /// Run ticks until end-of-stream, `stop` is raised, or `limit` frames
    /// were presented. `stop` and `limit` are checked between ticks only.
    ///
    /// `on_present` receives the running frame count after every present.
    ///
    /// # Errors
    /// Any tick error ends the run; there is no retry.
    pub fn run<S, D, F>(
        &self,
        source: &mut S,
        surface: &mut D,
        stop: &AtomicBool,
        limit: Option<u64>,
        mut on_present: F,
    ) -> Result<RunSummary>
    where
        S: FrameSource + ?Sized,
        D: DisplaySurface + ?Sized,
        F: FnMut(u64),
    {
        let (width, height) = source.dimensions();
        let mut placements = Vec::with_capacity(self.mapper.cell_bound(width, height));
        let mut frames = 0u64;

        let reason = loop {
            if stop.load(Ordering::Relaxed) {
                break StopReason::Signal;
            }
            if limit.is_some_and(|max| frames >= max) {
                break StopReason::FrameLimit;
            }
            match self.tick(source, surface, &mut placements)? {
                LoopState::Running => {
                    frames += 1;
                    on_present(frames);
                }
                LoopState::Terminated(reason) => break reason,
            }
        };

        log::info!("Boucle terminée : {reason:?} après {frames} frames");
        Ok(RunSummary { frames, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingSurface, ScriptedSource, SolidRasterizer, params};
    use af_core::frame::RgbFrame;

    fn white(width: u32, height: u32) -> RgbFrame {
        let mut rgb = RgbFrame::new(width, height);
        rgb.fill((255, 255, 255));
        rgb
    }

    fn compositor(step: u32) -> Compositor {
        let params = params(" ixzao*#MW&8%B@$", 4, step);
        Compositor::new(&params, &SolidRasterizer::new(1, 1), (0, 0, 0))
    }

    #[test]
    fn stops_on_fiftieth_acquisition() {
        let compositor = compositor(6);
        let mut source = ScriptedSource::new(white(12, 12), 49);
        let mut surface = RecordingSurface::default();
        let stop = AtomicBool::new(false);

        let summary = compositor
            .run(&mut source, &mut surface, &stop, None, |_| {})
            .unwrap();

        assert_eq!(summary.reason, StopReason::EndOfStream);
        assert_eq!(summary.frames, 49);
        assert_eq!(source.calls, 50);
        assert_eq!(surface.presents, 49);
        assert_eq!(surface.clears, 50);
        assert_eq!(surface.blits.len(), 49 * 4);
    }

    #[test]
    fn tick_blits_then_presents() {
        let compositor = compositor(6);
        let mut source = ScriptedSource::new(white(120, 90), 1);
        let mut surface = RecordingSurface::default();
        let mut placements = Vec::new();

        let state = compositor
            .tick(&mut source, &mut surface, &mut placements)
            .unwrap();
        assert_eq!(state, LoopState::Running);
        assert_eq!(surface.blits.len(), 300);
        assert_eq!(surface.presents, 1);

        let state = compositor
            .tick(&mut source, &mut surface, &mut placements)
            .unwrap();
        assert_eq!(state, LoopState::Terminated(StopReason::EndOfStream));
        assert_eq!(surface.presents, 1);
    }

    #[test]
    fn raised_stop_flag_terminates_before_next_tick() {
        let compositor = compositor(2);
        let mut source = ScriptedSource::new(white(4, 4), 1000);
        let mut surface = RecordingSurface::default();
        let stop = AtomicBool::new(false);

        let summary = compositor
            .run(&mut source, &mut surface, &stop, None, |n| {
                if n == 3 {
                    stop.store(true, Ordering::Relaxed);
                }
            })
            .unwrap();
        assert_eq!(summary.reason, StopReason::Signal);
        assert_eq!(summary.frames, 3);
        assert_eq!(source.calls, 3);
    }

    #[test]
    fn frame_limit_caps_run() {
        let compositor = compositor(2);
        let mut source = ScriptedSource::new(white(4, 4), 1000);
        let mut surface = RecordingSurface::default();
        let stop = AtomicBool::new(false);

        let summary = compositor
            .run(&mut source, &mut surface, &stop, Some(7), |_| {})
            .unwrap();
        assert_eq!(summary.reason, StopReason::FrameLimit);
        assert_eq!(summary.frames, 7);
        assert_eq!(surface.presents, 7);
    }

    #[test]
    fn presentation_error_ends_run() {
        let compositor = compositor(2);
        let mut source = ScriptedSource::new(white(4, 4), 10);
        let mut surface = RecordingSurface {
            fail_at: Some(2),
            ..RecordingSurface::default()
        };
        let stop = AtomicBool::new(false);

        let result = compositor.run(&mut source, &mut surface, &stop, None, |_| {});
        assert!(result.is_err());
        assert_eq!(surface.presents, 2);
        assert_eq!(source.calls, 3);
    }

    #[test]
    fn dark_source_presents_empty_frames() {
        let params = params(" #", 16, 3);
        let compositor = Compositor::new(&params, &SolidRasterizer::new(1, 1), (0, 0, 0));
        let mut source = ScriptedSource::new(white(30, 30), 5);
        let mut surface = RecordingSurface::default();
        let stop = AtomicBool::new(false);

        let summary = compositor
            .run(&mut source, &mut surface, &stop, None, |_| {})
            .unwrap();
        assert_eq!(summary.frames, 5);
        assert!(surface.blits.is_empty());
        assert_eq!(surface.presents, 5);
    }
}
