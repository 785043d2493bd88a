//! Rendering backend capability.
//!
//! The diagram engine never talks to a concrete graphics API. It draws through
//! the [`RenderBackend`] trait, which mirrors a 2D canvas context: a transform
//! stack, path construction, fill/stroke, text, and point-in-path queries.
//!
//! Two implementations ship with the crate:
//! - [`SoftwareBackend`] records draw calls and answers hit queries from
//!   flattened polygons. Deterministic, used for hit-testing and tests.
//! - `frontend::EguiCanvas` paints into an egui `Painter`.

pub mod outline;
pub mod path;
pub mod software;

pub use outline::{Outline, PathOp};
pub use path::PathBuilder;
pub use software::{DrawCommand, SoftwareBackend};

/// RGBA color.
pub type Color = [u8; 4];

/// Horizontal alignment of a text run relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

/// Drawing context consumed by the layout and interaction layers.
#[cfg_attr(test, mockall::automock)]
pub trait RenderBackend {
    /// Push the current transform.
    fn save(&mut self);
    /// Pop back to the last saved transform.
    fn restore(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, angle: f64);

    /// Discard the current path and start a new one.
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn bezier_curve_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64);
    /// Clockwise arc (in screen space) from `start` to `end`.
    fn arc(&mut self, cx: f64, cy: f64, radius: f64, start: f64, end: f64);
    fn close_path(&mut self);

    fn fill(&mut self, color: Color);
    fn stroke(&mut self, color: Color, width: f64);

    #[allow(clippy::too_many_arguments)]
    fn fill_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        anchor: TextAnchor,
        font_size: f64,
        color: Color,
    );

    /// Width of `text` at `font_size`.
    fn measure_text(&self, text: &str, font_size: f64) -> f64;

    /// Whether `(x, y)`, in canvas coordinates, lies inside the current path.
    fn is_point_in_path(&self, x: f64, y: f64) -> bool;
}
