/// Display surfaces for glyphcast: software canvas, terminal sink and
/// frame-rate tracking.
pub mod canvas;
pub mod fps;
pub mod terminal;

pub use canvas::Canvas;
pub use fps::FpsCounter;
pub use terminal::{TerminalSink, render_canvas};
