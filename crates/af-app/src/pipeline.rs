use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use af_ascii::compositor::RunSummary;
use af_core::charset;
use af_core::config::{PipelineConfig, load_config};
use af_core::error::CoreError;
use af_core::traits::FrameSource;
use af_export::rasterizer::{FontRasterizer, discover_font};
use af_render::fps::FpsCounter;
use anyhow::{Context, Result};

use crate::cli::Cli;

/// Extensions exportées en vidéo via ffmpeg.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov"];

/// Cadence d'export si la source n'en annonce pas.
const DEFAULT_EXPORT_FPS: u32 = 30;

/// Resolve config: file (or defaults), then CLI overrides, then validation.
///
/// # Errors
/// Fichier de config illisible, preset inconnu, ou valeur invalide.
pub fn resolve_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = if cli.config.exists() {
        load_config(&cli.config)?
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        PipelineConfig::default()
    };
    apply_overrides(&mut config, cli)?;
    config.validate()?;
    Ok(config)
}

/// Les options CLI l'emportent sur le fichier.
///
/// # Errors
/// Retourne une erreur si `--charset-preset` ne nomme aucun preset.
pub fn apply_overrides(config: &mut PipelineConfig, cli: &Cli) -> Result<()> {
    if let Some(ref source) = cli.source {
        config.source = Some(source.clone());
    }
    if let Some(size) = cli.font_size {
        config.font_size = size;
    }
    if let Some(ref font) = cli.font {
        config.font_path = Some(font.clone());
    }
    if let Some(levels) = cli.color_levels {
        config.color_level_count = levels;
    }
    if let Some(ref chars) = cli.charset {
        config.character_set.clone_from(chars);
    }
    if let Some(ref name) = cli.charset_preset {
        let chars = charset::preset(name).ok_or_else(|| {
            CoreError::Config(format!(
                "preset de charset inconnu : {name} (default, compact, standard, blocks, minimal)"
            ))
        })?;
        config.character_set = chars.to_string();
    }
    Ok(())
}

/// Destination des frames composées.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputKind {
    /// Affichage temps réel dans le terminal.
    Terminal,
    /// Fichier vidéo encodé par ffmpeg.
    Video(PathBuf),
    /// Dossier de PNG numérotés.
    PngSequence(PathBuf),
}

impl OutputKind {
    /// Classe `--output` par extension ; sans option, le terminal.
    #[must_use]
    pub fn from_arg(output: Option<&Path>) -> Self {
        let Some(path) = output else {
            return Self::Terminal;
        };
        let is_video = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|v| ext.eq_ignore_ascii_case(v)));
        if is_video {
            Self::Video(path.to_path_buf())
        } else {
            Self::PngSequence(path.to_path_buf())
        }
    }
}

/// Police configurée, sinon police système.
///
/// # Errors
/// Aucune police trouvée, ou fichier de police invalide.
pub fn load_rasterizer(config: &PipelineConfig) -> Result<FontRasterizer> {
    let path = match config.font_path.clone() {
        Some(path) => path,
        None => discover_font().ok_or_else(|| CoreError::FileNotFound {
            path: "police système bold sans-serif (utilisez --font)".to_string(),
        })?,
    };
    log::info!("Police : {} à {} px", path.display(), config.font_size);
    FontRasterizer::from_file(&path, config.font_size, config.antialias)
        .context("Chargement du rasteriseur de glyphes")
}

/// Cadence d'export : celle de la source, arrondie, sinon 30.
#[must_use]
pub fn export_fps(source: &dyn FrameSource) -> u32 {
    source
        .frame_rate()
        .filter(|fps| fps.is_finite() && *fps > 0.0)
        .map_or(DEFAULT_EXPORT_FPS, |fps| fps.round().clamp(1.0, 240.0) as u32)
}

/// Débit moyen : `frames / elapsed`, 0 si aucun temps ne s'est écoulé.
#[must_use]
pub fn average_fps(frames: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { frames as f64 / secs } else { 0.0 }
}

/// Journalise le FPS réalisé toutes les `interval` frames, puis le débit
/// moyen de toute la session.
pub struct FrameReporter {
    counter: FpsCounter,
    interval: u32,
    started: Instant,
}

impl FrameReporter {
    /// Reporter over a sliding window matching `interval` (at least 2 frames).
    ///
    /// The session clock starts here.
    #[must_use]
    pub fn new(interval: u32) -> Self {
        Self {
            counter: FpsCounter::new(interval.clamp(2, 600) as usize),
            interval,
            started: Instant::now(),
        }
    }

    /// Hook appelé après chaque frame présentée.
    pub fn on_present(&mut self, frames: u64) {
        self.counter.tick();
        if self.counter.report_due(self.interval) {
            log::info!(
                "{frames} frames, {:.1} fps ({:.1} ms/frame)",
                self.counter.fps(),
                self.counter.frame_time_ms
            );
        }
    }

    /// Bilan final : débit moyen depuis la création du reporter.
    pub fn finish(&self, summary: &RunSummary) {
        let elapsed = self.started.elapsed();
        log::info!(
            "Arrêt ({:?}) : {} frames en {:.1?}, {:.1} fps",
            summary.reason,
            summary.frames,
            elapsed,
            average_fps(summary.frames, elapsed)
        );
    }
}
