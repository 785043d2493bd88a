//! egui rendering backend.
//!
//! Paths are flattened in diagram coordinates by the shared [`PathBuilder`],
//! then mapped to screen space (`origin + p * zoom`) when filled or stroked.
//! Point-in-path queries therefore take diagram coordinates, exactly like the
//! software backend.

use crate::geometry::Position;
use crate::render::path::PathBuilder;
use crate::render::{Color, RenderBackend, TextAnchor};
use egui::epaint::TextShape;
use egui::{Color32, FontId, Painter, Pos2, Shape, Stroke, Vec2};

pub struct EguiCanvas<'a> {
    painter: &'a Painter,
    origin: Pos2,
    zoom: f32,
    path: PathBuilder,
}

impl<'a> EguiCanvas<'a> {
    pub fn new(painter: &'a Painter, origin: Pos2, zoom: f32) -> Self {
        Self {
            painter,
            origin,
            zoom,
            path: PathBuilder::new(),
        }
    }

    pub fn to_screen(&self, p: Position) -> Pos2 {
        self.origin + Vec2::new(p.x as f32, p.y as f32) * self.zoom
    }

    /// Inverse of [`EguiCanvas::to_screen`].
    pub fn to_diagram(origin: Pos2, zoom: f32, screen: Pos2) -> Position {
        let local = (screen - origin) / zoom;
        Position::new(local.x as f64, local.y as f64)
    }

    fn screen_subpaths(&self) -> Vec<(Vec<Pos2>, bool)> {
        self.path
            .subpaths()
            .iter()
            .map(|s| {
                let points = s.points.iter().map(|p| self.to_screen(*p)).collect();
                (points, s.closed)
            })
            .collect()
    }
}

fn color32(c: Color) -> Color32 {
    Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3])
}

impl RenderBackend for EguiCanvas<'_> {
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
        // Every filled outline in a diagram is convex
        for (points, _) in self.screen_subpaths() {
            if points.len() >= 3 {
                self.painter
                    .add(Shape::convex_polygon(points, color32(color), Stroke::NONE));
            }
        }
    }

    fn stroke(&mut self, color: Color, width: f64) {
        let stroke = Stroke::new(width as f32 * self.zoom, color32(color));
        for (points, closed) in self.screen_subpaths() {
            if points.len() < 2 {
                continue;
            }
            if closed {
                self.painter.add(Shape::closed_line(points, stroke));
            } else {
                self.painter.add(Shape::line(points, stroke));
            }
        }
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
        let font = FontId::proportional(font_size as f32 * self.zoom);
        let galley = self
            .painter
            .layout_no_wrap(text.to_string(), font, color32(color));
        let size = galley.size();
        let lead = match anchor {
            TextAnchor::Start => 0.0,
            TextAnchor::Middle => -size.x / 2.0,
            TextAnchor::End => -size.x,
        };
        // Vertically centred on the anchor, shifted along the rotated baseline
        let angle = self.path.transform().rotation as f32;
        let offset = egui::emath::Rot2::from_angle(angle) * Vec2::new(lead, -size.y / 2.0);
        let at = self.to_screen(self.path.transform().apply(Position::new(x, y))) + offset;
        self.painter
            .add(TextShape::new(at, galley, color32(color)).with_angle(angle));
    }

    fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        let font = FontId::proportional(font_size as f32 * self.zoom);
        let galley = self
            .painter
            .layout_no_wrap(text.to_string(), font, Color32::WHITE);
        galley.size().x as f64 / self.zoom as f64
    }

    fn is_point_in_path(&self, x: f64, y: f64) -> bool {
        self.path.contains(Position::new(x, y))
    }
}
