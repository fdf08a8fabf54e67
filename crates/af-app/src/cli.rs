use std::path::PathBuf;

use clap::Parser;

/// glyphcast: rendu ASCII couleur temps réel d'une vidéo, d'une caméra
/// ou d'une image.
#[derive(Parser, Debug)]
#[command(name = "glyphcast", version, about, long_about = None)]
pub struct Cli {
    /// Source : chemin vidéo (tout format ffmpeg), image (PNG, JPEG, BMP,
    /// GIF), ou `camera[:N]`.
    #[arg(short, long)]
    pub source: Option<String>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Taille de police en pixels (pilote aussi le pas de grille).
    #[arg(long)]
    pub font_size: Option<u32>,

    /// Police TTF/OTF à utiliser.
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Niveaux de quantification par canal RGB (2..=256).
    #[arg(long)]
    pub color_levels: Option<u16>,

    /// Charset, du plus vide au plus dense.
    #[arg(long)]
    pub charset: Option<String>,

    /// Charset nommé : default, compact, standard, blocks, minimal.
    #[arg(long, conflicts_with = "charset")]
    pub charset_preset: Option<String>,

    /// Export au lieu du terminal : `.mp4`/`.mkv`/`.mov` (ffmpeg) ou dossier
    /// de PNG numérotés.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Arrêt après N frames présentées.
    #[arg(long)]
    pub frames: Option<u64>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}
