use std::path::{Path, PathBuf};

use af_core::frame::RgbFrame;
use af_core::traits::FrameSink;
use anyhow::{Context, Result};

/// Écrit chaque frame présentée en PNG numéroté (`frame_000000.png`, ...).
pub struct PngSequence {
    dir: PathBuf,
    index: u64,
}

impl PngSequence {
    /// Crée le dossier de sortie si besoin.
    ///
    /// # Errors
    /// Retourne une erreur si le dossier ne peut être créé.
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Impossible de créer {}", dir.display()))?;
        log::info!("Export PNG : {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            index: 0,
        })
    }

    /// Frames written so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.index
    }

    /// Chemin de la frame `index`.
    #[must_use]
    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{index:06}.png"))
    }
}

impl FrameSink for PngSequence {
    fn show(&mut self, frame: &RgbFrame) -> Result<()> {
        let path = self.frame_path(self.index);
        image::save_buffer(
            &path,
            &frame.data,
            frame.width,
            frame.height,
            image::ColorType::Rgb8,
        )
        .with_context(|| format!("Écriture PNG {}", path.display()))?;
        self.index += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_numbered_frames() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("seq");
        let mut sink = PngSequence::new(&out).unwrap();

        let mut frame = RgbFrame::new(8, 4);
        frame.fill((10, 20, 30));
        frame.set_pixel(7, 3, (255, 0, 0));
        sink.show(&frame).unwrap();
        sink.show(&frame).unwrap();

        assert_eq!(sink.frames(), 2);
        assert!(out.join("frame_000000.png").is_file());
        assert!(out.join("frame_000001.png").is_file());

        let back = image::open(out.join("frame_000001.png")).unwrap().to_rgb8();
        assert_eq!(back.dimensions(), (8, 4));
        assert_eq!(back.get_pixel(0, 0).0, [10, 20, 30]);
        assert_eq!(back.get_pixel(7, 3).0, [255, 0, 0]);
    }
}
