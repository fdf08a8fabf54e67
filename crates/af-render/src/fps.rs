use std::collections::VecDeque;
use std::time::Instant;

/// Compteur FPS par fenêtre glissante. Zéro allocation après init.
///
/// # Example
/// ```
/// use af_render::fps::FpsCounter;
/// let mut counter = FpsCounter::new(60);
/// counter.tick();
/// assert_eq!(counter.frames(), 1);
/// assert!(counter.fps() >= 0.0);
/// ```
pub struct FpsCounter {
    /// Timestamps des dernières N frames.
    timestamps: VecDeque<Instant>,
    /// Taille de la fenêtre (nombre de frames à moyenner).
    window: usize,
    fps: f64,
    frames: u64,
    /// Temps de la dernière frame en ms.
    pub frame_time_ms: f64,
}

impl FpsCounter {
    /// Create a new FPS counter with the given averaging window size.
    #[must_use]
    pub fn new(window: usize) -> Self {
        let window = window.max(2);
        Self {
            timestamps: VecDeque::with_capacity(window + 1),
            window,
            fps: 0.0,
            frames: 0,
            frame_time_ms: 0.0,
        }
    }

    /// Appeler une fois par frame, APRÈS la présentation.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    fn tick_at(&mut self, now: Instant) {
        self.frames += 1;
        if let Some(&last) = self.timestamps.back() {
            self.frame_time_ms = now.duration_since(last).as_secs_f64() * 1000.0;
        }
        self.timestamps.push_back(now);
        if self.timestamps.len() > self.window {
            self.timestamps.pop_front();
        }
        if let Some(&first) = self.timestamps.front()
            && self.timestamps.len() >= 2
        {
            let secs = now.duration_since(first).as_secs_f64();
            if secs > 0.0 {
                self.fps = (self.timestamps.len() - 1) as f64 / secs;
            }
        }
    }

    /// FPS moyen sur la fenêtre.
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Frames comptées depuis la création.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Vrai toutes les `interval` frames (jamais si `interval` vaut 0).
    ///
    /// # Example
    /// ```
    /// use af_render::fps::FpsCounter;
    /// let mut counter = FpsCounter::new(8);
    /// let due: Vec<bool> = (0..4).map(|_| { counter.tick(); counter.report_due(2) }).collect();
    /// assert_eq!(due, vec![false, true, false, true]);
    /// ```
    #[must_use]
    pub fn report_due(&self, interval: u32) -> bool {
        interval > 0 && self.frames > 0 && self.frames % u64::from(interval) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn steady_rate_is_measured() {
        let mut counter = FpsCounter::new(10);
        let start = Instant::now();
        for i in 0..30u64 {
            counter.tick_at(start + Duration::from_millis(i * 40));
        }
        assert!((counter.fps() - 25.0).abs() < 0.01);
        assert!((counter.frame_time_ms - 40.0).abs() < 0.01);
        assert_eq!(counter.frames(), 30);
    }

    #[test]
    fn single_tick_reports_zero() {
        let mut counter = FpsCounter::new(10);
        counter.tick();
        assert!(counter.fps().abs() < f64::EPSILON);
        assert!(!counter.report_due(0));
    }
}
