use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use af_ascii::compositor::Compositor;
use af_core::params::ConversionParams;
use af_export::{Mp4Muxer, PngSequence};
use af_render::canvas::Canvas;
use af_render::terminal::TerminalSink;
use af_source::{SourceSpec, open_source};
use anyhow::{Context, Result};
use clap::Parser;

pub mod cli;
pub mod pipeline;

use pipeline::{FrameReporter, OutputKind};

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Config : fichier, puis overrides CLI
    let config = pipeline::resolve_config(&cli)?;
    let source_arg = config
        .source
        .clone()
        .context("Aucune source. Utilisez --source ou [source] dans la config.")?;
    let spec = SourceSpec::parse(&source_arg)?;
    let params = ConversionParams::from_config(&config)?;
    log::info!(
        "Pas de grille {} px, {} glyphes, {} niveaux de couleur",
        params.grid_step(),
        params.charset().len(),
        params.colors().count()
    );

    // 4. Palette (une fois, avant la boucle)
    let rasterizer = pipeline::load_rasterizer(&config)?;
    let compositor = Compositor::new(&params, &rasterizer, config.background);

    // 5. Source
    let mut source = open_source(&spec, &config)?;
    let (width, height) = source.dimensions();

    // 6. Arrêt externe : Ctrl-C (et touches en mode terminal)
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .context("Installation du handler Ctrl-C")?;
    }

    // 7. Boucle principale
    let mut reporter = FrameReporter::new(config.report_interval);
    let summary = match OutputKind::from_arg(cli.output.as_deref()) {
        OutputKind::Terminal => {
            let terminal = ratatui::init();
            let mut canvas = Canvas::new(width, height, TerminalSink::new(terminal, Arc::clone(&stop)));
            let result = compositor.run(source.as_mut(), &mut canvas, &stop, cli.frames, |n| {
                reporter.on_present(n);
            });
            // Restaurer le terminal (TOUJOURS, même en cas d'erreur)
            ratatui::restore();
            result?
        }
        OutputKind::Video(path) => {
            let muxer = Mp4Muxer::new(&path, width, height, pipeline::export_fps(source.as_ref()))?;
            let mut canvas = Canvas::new(width, height, muxer);
            let summary = compositor.run(source.as_mut(), &mut canvas, &stop, cli.frames, |n| {
                reporter.on_present(n);
            })?;
            canvas.into_sink().finish()?;
            summary
        }
        OutputKind::PngSequence(dir) => {
            let mut canvas = Canvas::new(width, height, PngSequence::new(&dir)?);
            compositor.run(source.as_mut(), &mut canvas, &stop, cli.frames, |n| {
                reporter.on_present(n);
            })?
        }
    };

    reporter.finish(&summary);
    Ok(())
}
