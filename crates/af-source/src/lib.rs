/// Frame sources for glyphcast: ffmpeg-decoded video and cameras, still
/// images, and source-identifier parsing.
pub mod image;
pub mod video;

use std::path::{Path, PathBuf};

use af_core::config::PipelineConfig;
use af_core::error::CoreError;
use af_core::traits::FrameSource;
use anyhow::Result;

pub use crate::image::ImageSource;
pub use crate::video::{RawFrameStream, VideoInput, VideoSource};

/// Extensions servies par [`ImageSource`] ; tout le reste passe par ffmpeg.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

/// Source identifiée à partir de la chaîne utilisateur.
///
/// # Example
/// ```
/// use af_source::SourceSpec;
/// assert_eq!(SourceSpec::parse("camera:1").unwrap(), SourceSpec::Camera(1));
/// assert_eq!(SourceSpec::parse("a.PNG").unwrap(), SourceSpec::Image("a.PNG".into()));
/// assert_eq!(SourceSpec::parse("a.mkv").unwrap(), SourceSpec::Video("a.mkv".into()));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceSpec {
    /// Fichier vidéo décodé par ffmpeg.
    Video(PathBuf),
    /// Image fixe.
    Image(PathBuf),
    /// Caméra `/dev/videoN`.
    Camera(u32),
}

impl SourceSpec {
    /// `camera` / `camera:N`, sinon un chemin classé par extension.
    ///
    /// # Errors
    /// `Config` pour une chaîne vide, `UnsupportedSource` pour un index de
    /// caméra invalide.
    pub fn parse(spec: &str) -> Result<Self, CoreError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(CoreError::Config("source vide".to_string()));
        }
        if spec == "camera" {
            return Ok(Self::Camera(0));
        }
        if let Some(index) = spec.strip_prefix("camera:") {
            return index
                .parse()
                .map(Self::Camera)
                .map_err(|_| CoreError::UnsupportedSource {
                    source_id: spec.to_string(),
                });
        }

        let path = PathBuf::from(spec);
        if is_image(&path) {
            Ok(Self::Image(path))
        } else {
            Ok(Self::Video(path))
        }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn require_file(path: &Path) -> Result<(), CoreError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CoreError::FileNotFound {
            path: path.display().to_string(),
        })
    }
}

/// Ouvre la source décrite par `spec`, bornée par `max_width`/`max_height`.
///
/// # Errors
/// Fichier absent, source non supportée, ou échec de décodage.
pub fn open_source(spec: &SourceSpec, config: &PipelineConfig) -> Result<Box<dyn FrameSource>> {
    let (max_w, max_h) = (config.max_width, config.max_height);
    let source: Box<dyn FrameSource> = match spec {
        SourceSpec::Image(path) => {
            require_file(path)?;
            Box::new(ImageSource::open(path, max_w, max_h)?)
        }
        SourceSpec::Video(path) => {
            require_file(path)?;
            Box::new(VideoSource::open(&VideoInput::File(path.clone()), max_w, max_h)?)
        }
        SourceSpec::Camera(index) => {
            Box::new(VideoSource::open(&VideoInput::Camera(*index), max_w, max_h)?)
        }
    };
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_specs() {
        assert_eq!(SourceSpec::parse("camera").unwrap(), SourceSpec::Camera(0));
        assert_eq!(SourceSpec::parse(" camera:3 ").unwrap(), SourceSpec::Camera(3));
        assert!(matches!(
            SourceSpec::parse("camera:front"),
            Err(CoreError::UnsupportedSource { .. })
        ));
    }

    #[test]
    fn empty_spec_is_rejected() {
        assert!(matches!(SourceSpec::parse("  "), Err(CoreError::Config(_))));
    }

    #[test]
    fn extension_picks_source_kind() {
        assert!(matches!(SourceSpec::parse("x/y.jpeg").unwrap(), SourceSpec::Image(_)));
        assert!(matches!(SourceSpec::parse("x/y.mp4").unwrap(), SourceSpec::Video(_)));
        assert!(matches!(SourceSpec::parse("noext").unwrap(), SourceSpec::Video(_)));
    }

    #[test]
    fn missing_file_is_reported() {
        let spec = SourceSpec::parse("/nonexistent/clip.mp4").unwrap();
        let err = open_source(&spec, &PipelineConfig::default()).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::FileNotFound { .. })
        ));
    }

    #[test]
    fn opens_image_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.bmp");
        ::image::RgbImage::from_pixel(8, 6, ::image::Rgb([50, 60, 70]))
            .save(&path)
            .unwrap();
        let spec = SourceSpec::parse(path.to_str().unwrap()).unwrap();
        let mut source = open_source(&spec, &PipelineConfig::default()).unwrap();
        assert_eq!(source.dimensions(), (8, 6));
        assert!(source.next_frame().unwrap().is_some());
        assert_eq!(source.frame_rate(), None);
    }
}
