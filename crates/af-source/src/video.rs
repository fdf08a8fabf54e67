// Décodage via ffmpeg en sous-processus (std::process::Command).
// Prérequis : `ffmpeg` et `ffprobe` accessibles dans PATH.
//
// Architecture :
//   - `probe_video`       : interroge ffprobe pour obtenir width/height/fps
//   - `fit_within`        : dimensions de sortie, ratio conservé
//   - `spawn_ffmpeg_pipe` : lance ffmpeg → flux raw RGB24 sur stdout
//   - `RawFrameStream`    : découpe le flux brut, une frame par appel
//   - `VideoSource`       : ffmpeg + RawFrameStream, synchrone

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};

use af_core::error::CoreError;
use af_core::frame::{FramePair, RgbFrame};
use af_core::traits::FrameSource;
use anyhow::{Context, Result};

/// Entrée décodable par ffmpeg.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoInput {
    /// Fichier vidéo (tout conteneur lu par ffmpeg).
    File(PathBuf),
    /// Caméra V4L2 `/dev/videoN`.
    Camera(u32),
}

impl VideoInput {
    /// Arguments ffmpeg/ffprobe désignant l'entrée (`-f v4l2 -i /dev/videoN`
    /// pour une caméra).
    ///
    /// # Errors
    /// `UnsupportedSource` pour une caméra hors Linux, ou un chemin non-UTF8.
    ///
    /// # Example
    /// ```
    /// use af_source::video::VideoInput;
    /// let args = VideoInput::File("clip.mp4".into()).input_args().unwrap();
    /// assert_eq!(args, vec!["-i", "clip.mp4"]);
    /// ```
    pub fn input_args(&self) -> Result<Vec<String>, CoreError> {
        match self {
            Self::File(path) => {
                let path_str = path.to_str().ok_or_else(|| CoreError::UnsupportedSource {
                    source_id: path.display().to_string(),
                })?;
                Ok(vec!["-i".to_string(), path_str.to_string()])
            }
            Self::Camera(index) => {
                if cfg!(target_os = "linux") {
                    Ok(vec![
                        "-f".to_string(),
                        "v4l2".to_string(),
                        "-i".to_string(),
                        format!("/dev/video{index}"),
                    ])
                } else {
                    Err(CoreError::UnsupportedSource {
                        source_id: format!("camera:{index}"),
                    })
                }
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Camera(index) => format!("/dev/video{index}"),
        }
    }
}

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    /// Largeur native.
    pub width: u32,
    /// Hauteur native.
    pub height: u32,
    /// Images par seconde (ex: 23.976, 24.0, 30.0, 60.0).
    pub fps: f64,
}

/// Interprète la sortie `key=value` de ffprobe.
///
/// # Errors
/// Retourne une erreur si aucun flux vidéo n'a été décrit.
///
/// # Example
/// ```
/// use af_source::video::parse_probe_output;
/// let info = parse_probe_output("width=1280\nheight=720\nr_frame_rate=30000/1001\n").unwrap();
/// assert_eq!((info.width, info.height), (1280, 720));
/// assert!((info.fps - 29.97).abs() < 0.01);
/// ```
pub fn parse_probe_output(text: &str) -> Result<VideoInfo> {
    let mut width: u32 = 0;
    let mut height: u32 = 0;
    let mut fps: f64 = 30.0;

    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            // Format: "24/1" ou "30000/1001"
            let mut parts = val.trim().splitn(2, '/');
            let num: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(30.0);
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            if den > 0.0 && num > 0.0 {
                fps = num / den;
            }
        }
    }

    if width == 0 || height == 0 {
        anyhow::bail!("aucun flux vidéo décrit par ffprobe");
    }
    Ok(VideoInfo { width, height, fps })
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable ou si l'entrée
/// ne contient aucun flux vidéo décodable.
pub fn probe_video(input: &VideoInput) -> Result<VideoInfo> {
    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-select_streams", "v:0"])
        .args([
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "default=noprint_wrappers=1",
        ])
        .args(input.input_args()?)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .context(
            "Impossible de lancer ffprobe. Vérifiez que ffprobe est installé et dans le PATH.",
        )?;

    let info = parse_probe_output(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("ffprobe : {}", input.describe()))?;
    log::info!(
        "probe_video: {}x{} @ {:.3}fps, {}",
        info.width,
        info.height,
        info.fps,
        input.describe()
    );
    Ok(info)
}

/// Dimensions de `width × height` réduites pour tenir dans
/// `max_width × max_height`, ratio conservé. Jamais agrandies.
///
/// # Example
/// ```
/// use af_source::video::fit_within;
/// assert_eq!(fit_within(1920, 1080, 640, 360), (640, 360));
/// assert_eq!(fit_within(1080, 1920, 640, 360), (203, 360));
/// assert_eq!(fit_within(320, 240, 640, 360), (320, 240));
/// ```
#[must_use]
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    let scale = (f64::from(max_width) / f64::from(width)).min(f64::from(max_height) / f64::from(height));
    let w = (f64::from(width) * scale).round().max(1.0) as u32;
    let h = (f64::from(height) * scale).round().max(1.0) as u32;
    (w.min(max_width), h.min(max_height))
}

/// Lance un processus `ffmpeg` qui écrit des frames RGB24 brutes sur stdout.
///
/// Chaque frame = `w × h × 3` bytes (row-major, sans padding).
/// `-an` supprime l'audio.
///
/// # Errors
/// Retourne une erreur si ffmpeg ne peut être lancé.
pub fn spawn_ffmpeg_pipe(input: &VideoInput, w: u32, h: u32) -> Result<Child> {
    let scale_filter = format!("scale={w}:{h}:flags=bilinear");

    let child = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error"])
        .args(input.input_args()?)
        .args([
            "-vf",
            &scale_filter,
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-an",
            "pipe:1",
        ])
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("Impossible de lancer ffmpeg. Est-il dans le PATH ?")?;

    log::debug!("ffmpeg spawné: {w}x{h}, {}", input.describe());
    Ok(child)
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// # Errors
/// Retourne `Ok(true)` si lu avec succès, `Ok(false)` sur EOF avant complétion,
/// `Err` sur erreur I/O fatale.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(false), // EOF
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// Découpe un flux RGB24 brut en frames `width × height`, une par appel.
///
/// Une lecture incomplète marque la fin du flux : tous les appels suivants
/// rendent `Ok(None)`. Le buffer de frame est réutilisé d'un appel à l'autre.
///
/// # Example
/// ```
/// use af_core::traits::FrameSource;
/// use af_source::video::RawFrameStream;
/// let bytes = [255u8; 2 * 2 * 3];
/// let mut stream = RawFrameStream::new(&bytes[..], 2, 2);
/// assert!(stream.next_frame().unwrap().is_some());
/// assert!(stream.next_frame().unwrap().is_none());
/// ```
pub struct RawFrameStream<R> {
    reader: R,
    frame: FramePair,
    frames_read: u64,
    finished: bool,
}

impl<R: Read> RawFrameStream<R> {
    /// Flux de frames `width × height` lues depuis `reader`.
    #[must_use]
    pub fn new(reader: R, width: u32, height: u32) -> Self {
        Self {
            reader,
            frame: FramePair::from_rgb(RgbFrame::new(width, height)),
            frames_read: 0,
            finished: false,
        }
    }

    /// Frames complètes lues jusqu'ici.
    #[must_use]
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }
}

impl<R: Read> FrameSource for RawFrameStream<R> {
    fn next_frame(&mut self) -> Result<Option<&FramePair>> {
        if self.finished {
            return Ok(None);
        }
        if read_exact_or_eof(&mut self.reader, &mut self.frame.rgb.data)? {
            self.frame.refresh_gray();
            self.frames_read += 1;
            Ok(Some(&self.frame))
        } else {
            log::info!("Flux vidéo : EOF après {} frames", self.frames_read);
            self.finished = true;
            Ok(None)
        }
    }

    fn dimensions(&self) -> (u32, u32) {
        self.frame.dimensions()
    }
}

/// Source vidéo synchrone : ffmpeg décode, [`RawFrameStream`] découpe sa
/// sortie. Le processus ffmpeg est tué et récupéré au drop.
pub struct VideoSource {
    child: Child,
    stream: RawFrameStream<ChildStdout>,
    fps: f64,
}

impl VideoSource {
    /// Sonde l'entrée puis démarre le décodage, réduit à
    /// `max_width × max_height` au plus.
    ///
    /// # Errors
    /// Échec de ffprobe/ffmpeg ou entrée sans flux vidéo.
    pub fn open(input: &VideoInput, max_width: u32, max_height: u32) -> Result<Self> {
        let info = probe_video(input)?;
        let (w, h) = fit_within(info.width, info.height, max_width, max_height);
        let mut child = spawn_ffmpeg_pipe(input, w, h)?;
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            anyhow::bail!("stdout ffmpeg indisponible");
        };

        log::info!("Source vidéo {w}x{h} (natif {}x{})", info.width, info.height);
        Ok(Self {
            child,
            stream: RawFrameStream::new(stdout, w, h),
            fps: info.fps,
        })
    }
}

impl FrameSource for VideoSource {
    fn next_frame(&mut self) -> Result<Option<&FramePair>> {
        self.stream.next_frame()
    }

    fn dimensions(&self) -> (u32, u32) {
        self.stream.dimensions()
    }

    fn frame_rate(&self) -> Option<f64> {
        Some(self.fps)
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_output_defaults_fps() {
        let info = parse_probe_output("width=640\nheight=480\n").unwrap();
        assert_eq!((info.width, info.height), (640, 480));
        assert!((info.fps - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn probe_output_without_stream_fails() {
        assert!(parse_probe_output("").is_err());
        assert!(parse_probe_output("width=0\nheight=10\n").is_err());
    }

    #[test]
    fn fit_keeps_within_caps() {
        for (w, h) in [(3840, 2160), (1000, 1000), (641, 361), (7, 5000)] {
            let (fw, fh) = fit_within(w, h, 640, 360);
            assert!(fw <= 640 && fh <= 360 && fw >= 1 && fh >= 1);
        }
        assert_eq!(fit_within(1000, 1000, 640, 360), (360, 360));
    }

    #[test]
    fn read_exact_reports_eof() {
        let data = [1u8, 2, 3, 4, 5];
        let mut reader = &data[..];
        let mut buf = [0u8; 3];
        assert!(read_exact_or_eof(&mut reader, &mut buf).unwrap());
        assert_eq!(buf, [1, 2, 3]);
        assert!(!read_exact_or_eof(&mut reader, &mut buf).unwrap());
    }

    #[test]
    fn short_read_ends_stream_for_good() {
        // 1,5 frame de 4×2 : la seconde est tronquée.
        let mut bytes = Vec::new();
        for i in 0..8u8 {
            bytes.extend_from_slice(&[i * 30, 100, 200]);
        }
        bytes.extend_from_slice(&[7u8; 12]);
        let mut stream = RawFrameStream::new(&bytes[..], 4, 2);
        assert_eq!(stream.dimensions(), (4, 2));

        let frame = stream.next_frame().unwrap().unwrap();
        assert_eq!(frame.rgb.pixel(3, 1), (210, 100, 200));
        assert_eq!(frame.gray.value(3, 1), af_core::frame::luma_bt601(210, 100, 200));

        assert!(stream.next_frame().unwrap().is_none());
        assert!(stream.next_frame().unwrap().is_none());
        assert_eq!(stream.frames_read(), 1);
    }

    #[test]
    fn empty_reader_is_immediate_end_of_stream() {
        let mut stream = RawFrameStream::new(std::io::empty(), 3, 3);
        assert!(stream.next_frame().unwrap().is_none());
        assert_eq!(stream.frames_read(), 0);
    }

    #[test]
    fn camera_args_use_v4l2() {
        let input = VideoInput::Camera(2);
        if cfg!(target_os = "linux") {
            assert_eq!(
                input.input_args().unwrap(),
                vec!["-f", "v4l2", "-i", "/dev/video2"]
            );
        } else {
            assert!(input.input_args().is_err());
        }
    }
}
