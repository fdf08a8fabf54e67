use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use af_core::frame::RgbFrame;
use af_core::traits::FrameSink;
use anyhow::{Context, Result};

/// Encode des frames RGB24 dans un fichier MP4 via un pipe ffmpeg.
pub struct Mp4Muxer {
    ffmpeg_child: Child,
    width: u32,
    height: u32,
    frames: u64,
}

impl Mp4Muxer {
    /// Crée un muxer vidéo `width × height` à `target_fps`.
    ///
    /// Sortie x264 en yuv420p (lisible partout) ; les dimensions impaires
    /// sont complétées d'un pixel.
    ///
    /// # Errors
    /// Retourne une erreur si ffmpeg n'est pas installé ou impossible à démarrer.
    pub fn new(output_path: &Path, width: u32, height: u32, target_fps: u32) -> Result<Self> {
        let path_str = output_path.to_str().context("Chemin invalide")?;

        let child = Command::new("ffmpeg")
            .args([
                "-y",
                "-f",
                "rawvideo",
                "-vcodec",
                "rawvideo",
                "-s",
                &format!("{width}x{height}"),
                "-pix_fmt",
                "rgb24",
                "-r",
                &target_fps.max(1).to_string(),
                "-i",
                "-",
                "-vf",
                "pad=ceil(iw/2)*2:ceil(ih/2)*2",
                "-c:v",
                "libx264",
                "-crf",
                "18",
                "-preset",
                "medium",
                "-pix_fmt",
                "yuv420p",
                "-hide_banner",
                "-loglevel",
                "error",
                path_str,
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context(
                "Échec de l'initialisation de l'encodeur vidéo ffmpeg. (Est-il dans PATH ?)",
            )?;

        log::info!(
            "Export MP4 : {} ({width}×{height} @ {target_fps} fps)",
            output_path.display()
        );
        Ok(Self {
            ffmpeg_child: child,
            width,
            height,
            frames: 0,
        })
    }

    /// Frames written so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Ajoute une frame au flux.
    ///
    /// # Errors
    /// Retourne une erreur si les dimensions diffèrent ou si l'écriture
    /// dans le pipe échoue.
    pub fn write_frame(&mut self, frame: &RgbFrame) -> Result<()> {
        if (frame.width, frame.height) != (self.width, self.height) {
            anyhow::bail!(
                "frame {}×{} pour un flux {}×{}",
                frame.width,
                frame.height,
                self.width,
                self.height
            );
        }
        let stdin = self
            .ffmpeg_child
            .stdin
            .as_mut()
            .context("pipe ffmpeg déjà fermé")?;
        stdin
            .write_all(&frame.data)
            .context("écriture dans le pipe ffmpeg")?;
        self.frames += 1;
        Ok(())
    }

    /// Ferme le flux et finalise l'exportation.
    ///
    /// # Errors
    /// Retourne une erreur si ffmpeg signale une erreur de terminaison.
    pub fn finish(mut self) -> Result<()> {
        drop(self.ffmpeg_child.stdin.take());

        let output = self.ffmpeg_child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("ffmpeg encoder error: {stderr}");
        }
        log::info!("Export MP4 terminé : {} frames", self.frames);
        Ok(())
    }
}

impl FrameSink for Mp4Muxer {
    fn show(&mut self, frame: &RgbFrame) -> Result<()> {
        self.write_frame(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn muxer_rejects_wrong_dimensions() {
        // ffmpeg absent : rien à vérifier.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        let Ok(mut muxer) = Mp4Muxer::new(&path, 64, 48, 30) else {
            return;
        };
        assert!(muxer.write_frame(&RgbFrame::new(32, 32)).is_err());
        assert_eq!(muxer.frames(), 0);
        let _ = muxer.finish();
    }

    #[test]
    fn muxer_encodes_frames_when_ffmpeg_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        let Ok(mut muxer) = Mp4Muxer::new(&path, 63, 47, 25) else {
            return;
        };
        let mut frame = RgbFrame::new(63, 47);
        frame.fill((200, 30, 90));
        let mut written = 0;
        for _ in 0..5 {
            if muxer.show(&frame).is_ok() {
                written += 1;
            }
        }
        if written == 5 && muxer.finish().is_ok() {
            assert!(path.is_file());
        }
    }
}
