//! Recorded vector outlines.
//!
//! Hit regions keep their shape as an [`Outline`]: a list of path operations in
//! canvas coordinates that can be replayed into any [`RenderBackend`], either
//! to draw the shape or to ask the backend whether a point falls inside it.

use super::RenderBackend;
use crate::geometry::{Position, Transform};
use std::f64::consts::TAU;

#[derive(Debug, Clone, PartialEq)]
pub enum PathOp {
    MoveTo(Position),
    LineTo(Position),
    CubicTo {
        c1: Position,
        c2: Position,
        to: Position,
    },
    Arc {
        center: Position,
        radius: f64,
        start: f64,
        end: f64,
    },
    Close,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    ops: Vec<PathOp>,
}

impl Outline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[PathOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn move_to(mut self, p: Position) -> Self {
        self.ops.push(PathOp::MoveTo(p));
        self
    }

    pub fn line_to(mut self, p: Position) -> Self {
        self.ops.push(PathOp::LineTo(p));
        self
    }

    pub fn cubic_to(mut self, c1: Position, c2: Position, to: Position) -> Self {
        self.ops.push(PathOp::CubicTo { c1, c2, to });
        self
    }

    pub fn arc(mut self, center: Position, radius: f64, start: f64, end: f64) -> Self {
        self.ops.push(PathOp::Arc {
            center,
            radius,
            start,
            end,
        });
        self
    }

    pub fn close(mut self) -> Self {
        self.ops.push(PathOp::Close);
        self
    }

    /// Full circle.
    pub fn circle(center: Position, radius: f64) -> Self {
        Self::new()
            .move_to(center.offset(0.0, radius))
            .arc(center, radius, 0.0, TAU)
            .close()
    }

    /// Axis-aligned rectangle centred on `center`.
    pub fn centered_rect(center: Position, half_width: f64, half_height: f64) -> Self {
        Self::polygon(&[
            Position::new(center.x - half_width, center.y - half_height),
            Position::new(center.x + half_width, center.y - half_height),
            Position::new(center.x + half_width, center.y + half_height),
            Position::new(center.x - half_width, center.y + half_height),
        ])
    }

    /// Rectangle with rounded corners centred on `center`.
    pub fn rounded_rect(center: Position, half_width: f64, half_height: f64, radius: f64) -> Self {
        use std::f64::consts::{FRAC_PI_2, PI};
        let r = radius.min(half_width).min(half_height);
        let (l, t) = (center.x - half_width, center.y - half_height);
        let (rt, b) = (center.x + half_width, center.y + half_height);
        Self::new()
            .move_to(Position::new(l + r, t))
            .line_to(Position::new(rt - r, t))
            .arc(Position::new(rt - r, t + r), r, -FRAC_PI_2, 0.0)
            .line_to(Position::new(rt, b - r))
            .arc(Position::new(rt - r, b - r), r, 0.0, FRAC_PI_2)
            .line_to(Position::new(l + r, b))
            .arc(Position::new(l + r, b - r), r, FRAC_PI_2, PI)
            .line_to(Position::new(l, t + r))
            .arc(Position::new(l + r, t + r), r, PI, PI + FRAC_PI_2)
            .close()
    }

    /// Closed polygon through `points`.
    pub fn polygon(points: &[Position]) -> Self {
        let mut outline = Self::new();
        let mut iter = points.iter();
        if let Some(first) = iter.next() {
            outline = outline.move_to(*first);
            for p in iter {
                outline = outline.line_to(*p);
            }
            outline = outline.close();
        }
        outline
    }

    /// The outline mapped through `transform`.
    pub fn transformed(&self, transform: &Transform) -> Self {
        let ops = self
            .ops
            .iter()
            .map(|op| match *op {
                PathOp::MoveTo(p) => PathOp::MoveTo(transform.apply(p)),
                PathOp::LineTo(p) => PathOp::LineTo(transform.apply(p)),
                PathOp::CubicTo { c1, c2, to } => PathOp::CubicTo {
                    c1: transform.apply(c1),
                    c2: transform.apply(c2),
                    to: transform.apply(to),
                },
                PathOp::Arc {
                    center,
                    radius,
                    start,
                    end,
                } => PathOp::Arc {
                    center: transform.apply(center),
                    radius,
                    start: start + transform.rotation,
                    end: end + transform.rotation,
                },
                PathOp::Close => PathOp::Close,
            })
            .collect();
        Self { ops }
    }

    /// Emit the outline as path operations. Does not begin or finish the path.
    pub fn replay<B: RenderBackend + ?Sized>(&self, backend: &mut B) {
        for op in &self.ops {
            match *op {
                PathOp::MoveTo(p) => backend.move_to(p.x, p.y),
                PathOp::LineTo(p) => backend.line_to(p.x, p.y),
                PathOp::CubicTo { c1, c2, to } => {
                    backend.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, to.x, to.y)
                }
                PathOp::Arc {
                    center,
                    radius,
                    start,
                    end,
                } => backend.arc(center.x, center.y, radius, start, end),
                PathOp::Close => backend.close_path(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_polygon_closes() {
        let outline = Outline::polygon(&[
            Position::new(0.0, 0.0),
            Position::new(1.0, 0.0),
            Position::new(0.0, 1.0),
        ]);
        assert_eq!(outline.ops().len(), 4);
        assert_eq!(outline.ops().last(), Some(&PathOp::Close));
    }

    #[test]
    fn test_transformed_rotates_arcs() {
        let outline = Outline::circle(Position::ZERO, 5.0);
        let moved = outline.transformed(&Transform::new(Position::new(10.0, 0.0), PI));
        match moved.ops()[1] {
            PathOp::Arc { center, start, .. } => {
                assert_eq!(center, Position::new(10.0, 0.0));
                assert!((start - PI).abs() < 1e-12);
            }
            ref other => panic!("unexpected op {:?}", other),
        }
    }
}
