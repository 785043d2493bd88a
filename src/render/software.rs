//! Software rendering backend.
//!
//! Records every fill, stroke and text call as a [`DrawCommand`] instead of
//! rasterizing. Hit queries run against the flattened current path, so hit
//! areas match exactly what would have been drawn.

use super::path::PathBuilder;
use super::{Color, RenderBackend, TextAnchor};
use crate::geometry::Position;

/// Average glyph advance as a fraction of the font size.
const GLYPH_ADVANCE: f64 = 0.6;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Fill {
        points: Vec<Position>,
        color: Color,
    },
    Stroke {
        points: Vec<Position>,
        color: Color,
        width: f64,
    },
    Text {
        text: String,
        at: Position,
        anchor: TextAnchor,
        font_size: f64,
        color: Color,
    },
}

#[derive(Debug, Default)]
pub struct SoftwareBackend {
    path: PathBuilder,
    commands: Vec<DrawCommand>,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw calls recorded so far.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.path.begin_path();
    }

    /// Text runs recorded so far, in draw order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    fn flattened(&self) -> Vec<Position> {
        self.path
            .subpaths()
            .iter()
            .flat_map(|s| s.points.iter().copied())
            .collect()
    }
}

impl RenderBackend for SoftwareBackend {
    fn save(&mut self) {
        self.path.save();
    }

    fn restore(&mut self) {
        self.path.restore();
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.path.translate(x, y);
    }

    fn rotate(&mut self, angle: f64) {
        self.path.rotate(angle);
    }

    fn begin_path(&mut self) {
        self.path.begin_path();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.path.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.path.line_to(x, y);
    }

    fn bezier_curve_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.path.bezier_curve_to(c1x, c1y, c2x, c2y, x, y);
    }

    fn arc(&mut self, cx: f64, cy: f64, radius: f64, start: f64, end: f64) {
        self.path.arc(cx, cy, radius, start, end);
    }

    fn close_path(&mut self) {
        self.path.close_path();
    }

    fn fill(&mut self, color: Color) {
        let points = self.flattened();
        self.commands.push(DrawCommand::Fill { points, color });
    }

    fn stroke(&mut self, color: Color, width: f64) {
        let points = self.flattened();
        self.commands.push(DrawCommand::Stroke {
            points,
            color,
            width,
        });
    }

    fn fill_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        anchor: TextAnchor,
        font_size: f64,
        color: Color,
    ) {
        let at = self.path.transform().apply(Position::new(x, y));
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            at,
            anchor,
            font_size,
            color,
        });
    }

    fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * GLYPH_ADVANCE
    }

    fn is_point_in_path(&self, x: f64, y: f64) -> bool {
        self.path.contains(Position::new(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_fill_and_text() {
        let mut backend = SoftwareBackend::new();
        backend.begin_path();
        backend.move_to(0.0, 0.0);
        backend.line_to(4.0, 0.0);
        backend.line_to(4.0, 4.0);
        backend.close_path();
        backend.fill([255, 0, 0, 255]);
        backend.save();
        backend.translate(10.0, 10.0);
        backend.fill_text("hi", 1.0, 1.0, TextAnchor::Start, 12.0, [0, 0, 0, 255]);
        backend.restore();

        assert_eq!(backend.commands().len(), 2);
        match &backend.commands()[1] {
            DrawCommand::Text { at, .. } => assert_eq!(*at, Position::new(11.0, 11.0)),
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(backend.texts().collect::<Vec<_>>(), vec!["hi"]);
    }

    #[test]
    fn test_measure_text_scales_with_length() {
        let backend = SoftwareBackend::new();
        let short = backend.measure_text("ab", 10.0);
        let long = backend.measure_text("abcd", 10.0);
        assert!((long - 2.0 * short).abs() < 1e-9);
    }
}
