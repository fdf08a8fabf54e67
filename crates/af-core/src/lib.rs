/// Configuration, types, and shared structures for glyphcast.
///
/// This crate contains the quantizers, frame buffers, boundary traits and
/// configuration logic shared across the workspace.

pub mod charset;
pub mod config;
pub mod error;
pub mod frame;
pub mod params;
pub mod quantize;
pub mod traits;

pub use charset::CharacterSet;
pub use config::PipelineConfig;
pub use error::CoreError;
pub use frame::{Bitmap, FramePair, GrayFrame, RgbFrame};
pub use params::ConversionParams;
pub use quantize::{ColorKey, ColorLevels, Quantizer};
