/// Glyph rasterization and offline frame sinks (MP4, PNG sequence).
pub mod frames;
pub mod muxer;
pub mod rasterizer;

pub use frames::PngSequence;
pub use muxer::Mp4Muxer;
pub use rasterizer::{FontRasterizer, discover_font};
