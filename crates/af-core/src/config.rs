use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Configuration de démarrage du pipeline.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine. Tout
/// changement de `color_level_count` ou de `character_set` impose de
/// reconstruire la palette.
///
/// # Example
/// ```
/// use af_core::config::PipelineConfig;
/// let config = PipelineConfig::default();
/// assert_eq!(config.color_level_count, 16);
/// assert_eq!(config.grid_step(), 6);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PipelineConfig {
    // === Source ===
    /// Chemin vidéo/image, ou `camera[:N]`.
    pub source: Option<String>,
    /// Largeur max du décodage vidéo (ratio conservé).
    pub max_width: u32,
    /// Hauteur max du décodage vidéo (ratio conservé).
    pub max_height: u32,

    // === Glyphes ===
    /// Taille de police en pixels. Pilote la taille des bitmaps et le pas de grille.
    pub font_size: u32,
    /// Police TTF/OTF. `None` = recherche d'une police système.
    pub font_path: Option<PathBuf>,
    /// Pas de grille = `font_size × grid_ratio`, tronqué.
    pub grid_ratio: f32,
    /// Rendu antialiasé des glyphes.
    pub antialias: bool,
    /// Charset du plus vide au plus dense. L'index 0 n'est jamais dessiné.
    pub character_set: String,

    // === Couleur ===
    /// Niveaux de quantification par canal RGB.
    pub color_level_count: u16,
    /// Couleur de fond appliquée à chaque tick.
    pub background: (u8, u8, u8),

    // === Observabilité ===
    /// Log du FPS réalisé toutes les N frames. 0 = désactivé.
    pub report_interval: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: None,
            max_width: 640,
            max_height: 360,
            font_size: 10,
            font_path: None,
            grid_ratio: 0.6,
            antialias: false,
            character_set: crate::charset::CHARSET_DEFAULT.to_string(),
            color_level_count: 16,
            background: (0, 0, 0),
            report_interval: 120,
        }
    }
}

impl PipelineConfig {
    /// Pixel distance between sampled cells.
    #[must_use]
    pub fn grid_step(&self) -> u32 {
        (self.font_size as f32 * self.grid_ratio) as u32
    }

    /// Check every field that the pipeline cannot repair on its own.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] describing the first invalid field.
    ///
    /// # Example
    /// ```
    /// use af_core::config::PipelineConfig;
    /// let mut config = PipelineConfig::default();
    /// assert!(config.validate().is_ok());
    /// config.font_size = 1;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.font_size == 0 {
            return Err(CoreError::Config("font_size doit être > 0".to_string()));
        }
        if !(self.grid_ratio.is_finite() && self.grid_ratio > 0.0) {
            return Err(CoreError::Config(format!(
                "grid_ratio invalide : {}",
                self.grid_ratio
            )));
        }
        if self.grid_step() == 0 {
            return Err(CoreError::Config(format!(
                "font_size={} × grid_ratio={} donne un pas de grille nul",
                self.font_size, self.grid_ratio
            )));
        }
        if !(2..=256).contains(&self.color_level_count) {
            return Err(CoreError::Config(format!(
                "color_level_count doit être dans 2..=256 (reçu {})",
                self.color_level_count
            )));
        }
        let len = self.character_set.chars().count();
        if !(2..=257).contains(&len) {
            return Err(CoreError::Config(format!(
                "character_set doit contenir entre 2 et 257 caractères (reçu {len})"
            )));
        }
        // Caractères dupliqués.
        crate::charset::CharacterSet::new(&self.character_set)?;
        let keys = crate::quantize::Quantizer::for_color_levels(self.color_level_count)?.bucket_count();
        crate::quantize::check_palette_size(len, keys)?;
        if self.max_width == 0 || self.max_height == 0 {
            return Err(CoreError::InvalidDimensions {
                width: self.max_width,
                height: self.max_height,
            });
        }
        Ok(())
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    source: Option<SourceSection>,
    glyphs: Option<GlyphSection>,
    color: Option<ColorSection>,
    display: Option<DisplaySection>,
}

#[derive(Deserialize)]
struct SourceSection {
    path: Option<String>,
    max_width: Option<u32>,
    max_height: Option<u32>,
}

#[derive(Deserialize)]
struct GlyphSection {
    font_size: Option<u32>,
    font_path: Option<PathBuf>,
    grid_ratio: Option<f32>,
    antialias: Option<bool>,
    character_set: Option<String>,
}

#[derive(Deserialize)]
struct ColorSection {
    levels: Option<u16>,
    background: Option<(u8, u8, u8)>,
}

#[derive(Deserialize)]
struct DisplaySection {
    report_interval: Option<u32>,
}

/// Parse un document TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the document is not valid TOML for this schema.
///
/// # Example
/// ```
/// use af_core::config::parse_config;
/// let config = parse_config("[color]\nlevels = 8\n").unwrap();
/// assert_eq!(config.color_level_count, 8);
/// assert_eq!(config.font_size, 10);
/// ```
pub fn parse_config(content: &str) -> Result<PipelineConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;
    let mut config = PipelineConfig::default();

    if let Some(s) = file.source {
        if let Some(v) = s.path {
            config.source = Some(v);
        }
        if let Some(v) = s.max_width {
            config.max_width = v;
        }
        if let Some(v) = s.max_height {
            config.max_height = v;
        }
    }
    if let Some(g) = file.glyphs {
        if let Some(v) = g.font_size {
            config.font_size = v;
        }
        if let Some(v) = g.font_path {
            config.font_path = Some(v);
        }
        if let Some(v) = g.grid_ratio {
            config.grid_ratio = v;
        }
        if let Some(v) = g.antialias {
            config.antialias = v;
        }
        if let Some(v) = g.character_set {
            config.character_set = v;
        }
    }
    if let Some(c) = file.color {
        if let Some(v) = c.levels {
            config.color_level_count = v;
        }
        if let Some(v) = c.background {
            config.background = v;
        }
    }
    if let Some(d) = file.display
        && let Some(v) = d.report_interval
    {
        config.report_interval = v;
    }

    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use af_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Config invalide : {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(parse_config("").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn sections_override_fields() {
        let doc = r#"
[source]
path = "lagtrain.mp4"
max_width = 320

[glyphs]
font_size = 20
character_set = " .#"
antialias = true

[color]
levels = 8
background = [10, 20, 30]

[display]
report_interval = 0
"#;
        let config = parse_config(doc).unwrap();
        assert_eq!(config.source.as_deref(), Some("lagtrain.mp4"));
        assert_eq!(config.max_width, 320);
        assert_eq!(config.max_height, 360);
        assert_eq!(config.font_size, 20);
        assert_eq!(config.grid_step(), 12);
        assert_eq!(config.character_set, " .#");
        assert!(config.antialias);
        assert_eq!(config.color_level_count, 8);
        assert_eq!(config.background, (10, 20, 30));
        assert_eq!(config.report_interval, 0);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(parse_config("[color\nlevels = 8").is_err());
        assert!(parse_config("[color]\nlevels = \"seize\"").is_err());
    }

    #[test]
    fn load_config_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[glyphs]\nfont_size = 14").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.font_size, 14);
        assert_eq!(config.grid_step(), 8);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/glyphcast.toml")).is_err());
    }

    #[test]
    fn validate_catches_bad_fields() {
        let bad = [
            PipelineConfig {
                font_size: 0,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                color_level_count: 300,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                character_set: "#".to_string(),
                ..PipelineConfig::default()
            },
            PipelineConfig {
                character_set: " ##".to_string(),
                ..PipelineConfig::default()
            },
            PipelineConfig {
                color_level_count: 256,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                color_level_count: 65,
                character_set: crate::charset::CHARSET_STANDARD.to_string(),
                ..PipelineConfig::default()
            },
            PipelineConfig {
                grid_ratio: f32::NAN,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                max_height: 0,
                ..PipelineConfig::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }
}
