/// Frame-to-glyph conversion engine for glyphcast.
///
/// Builds the glyph palette once, then maps each frame to glyph placements
/// and drives the compositor loop.
pub mod compositor;
pub mod mapper;
pub mod palette;

#[cfg(test)]
pub(crate) mod testing;

pub use compositor::{Compositor, LoopState, RunSummary, StopReason};
pub use mapper::{FrameMapper, Placement};
pub use palette::{GlyphCache, GlyphKey};
