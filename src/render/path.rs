//! Path flattening shared by the backends.
//!
//! Paths are flattened into polylines in canvas space as they are built, with
//! the current transform already applied. Containment uses the non-zero
//! winding rule, as a 2D canvas does by default.

use crate::geometry::{Position, Transform};
use std::f64::consts::TAU;

const CURVE_SEGMENTS: usize = 16;
const ARC_SEGMENTS_PER_TURN: f64 = 48.0;

#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    current: Transform,
    stack: Vec<Transform>,
    subpaths: Vec<Subpath>,
}

#[derive(Debug, Clone, Default)]
pub struct Subpath {
    pub points: Vec<Position>,
    pub closed: bool,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform(&self) -> &Transform {
        &self.current
    }

    pub fn save(&mut self) {
        self.stack.push(self.current);
    }

    pub fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.current = t;
        }
    }

    pub fn translate(&mut self, x: f64, y: f64) {
        self.current = self
            .current
            .then(&Transform::translate(Position::new(x, y)));
    }

    pub fn rotate(&mut self, angle: f64) {
        self.current = self.current.then(&Transform::new(Position::ZERO, angle));
    }

    pub fn begin_path(&mut self) {
        self.subpaths.clear();
    }

    pub fn subpaths(&self) -> &[Subpath] {
        &self.subpaths
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        let p = self.current.apply(Position::new(x, y));
        self.subpaths.push(Subpath {
            points: vec![p],
            closed: false,
        });
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        let p = self.current.apply(Position::new(x, y));
        self.push_point(p);
    }

    pub fn bezier_curve_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        let Some(start) = self.last_point() else {
            self.move_to(c1x, c1y);
            return self.bezier_curve_to(c1x, c1y, c2x, c2y, x, y);
        };
        let c1 = self.current.apply(Position::new(c1x, c1y));
        let c2 = self.current.apply(Position::new(c2x, c2y));
        let end = self.current.apply(Position::new(x, y));
        for i in 1..=CURVE_SEGMENTS {
            let t = i as f64 / CURVE_SEGMENTS as f64;
            self.push_point(cubic_point(start, c1, c2, end, t));
        }
    }

    pub fn arc(&mut self, cx: f64, cy: f64, radius: f64, start: f64, end: f64) {
        let mut sweep = end - start;
        if sweep < 0.0 {
            sweep = sweep.rem_euclid(TAU);
        }
        let sweep = sweep.min(TAU);
        let segments = ((sweep / TAU) * ARC_SEGMENTS_PER_TURN).ceil().max(1.0) as usize;
        for i in 0..=segments {
            let angle = start + sweep * (i as f64 / segments as f64);
            let local = Position::new(cx, cy).offset(angle, radius);
            let p = self.current.apply(local);
            self.push_point(p);
        }
    }

    pub fn close_path(&mut self) {
        if let Some(sub) = self.subpaths.last_mut() {
            sub.closed = true;
        }
    }

    /// Non-zero winding containment against every subpath, each implicitly closed.
    pub fn contains(&self, point: Position) -> bool {
        let mut winding = 0i32;
        for sub in &self.subpaths {
            let pts = &sub.points;
            if pts.len() < 3 {
                continue;
            }
            for i in 0..pts.len() {
                let a = pts[i];
                let b = pts[(i + 1) % pts.len()];
                if a.y <= point.y {
                    if b.y > point.y && is_left(a, b, point) > 0.0 {
                        winding += 1;
                    }
                } else if b.y <= point.y && is_left(a, b, point) < 0.0 {
                    winding -= 1;
                }
            }
        }
        winding != 0
    }

    fn last_point(&self) -> Option<Position> {
        self.subpaths.last().and_then(|s| s.points.last().copied())
    }

    fn push_point(&mut self, p: Position) {
        match self.subpaths.last_mut() {
            Some(sub) if !sub.closed => sub.points.push(p),
            _ => self.subpaths.push(Subpath {
                points: vec![p],
                closed: false,
            }),
        }
    }
}

fn is_left(a: Position, b: Position, p: Position) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y)
}

/// Point on a cubic Bézier curve at parameter `t`.
pub fn cubic_point(p0: Position, p1: Position, p2: Position, p3: Position, t: f64) -> Position {
    let mt = 1.0 - t;
    p0 * (mt * mt * mt) + p1 * (3.0 * mt * mt * t) + p2 * (3.0 * mt * t * t) + p3 * (t * t * t)
}

/// First derivative of a cubic Bézier curve at parameter `t`.
pub fn cubic_tangent(p0: Position, p1: Position, p2: Position, p3: Position, t: f64) -> Position {
    let mt = 1.0 - t;
    (p1 - p0) * (3.0 * mt * mt) + (p2 - p1) * (6.0 * mt * t) + (p3 - p2) * (3.0 * t * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn square(builder: &mut PathBuilder) {
        builder.begin_path();
        builder.move_to(0.0, 0.0);
        builder.line_to(10.0, 0.0);
        builder.line_to(10.0, 10.0);
        builder.line_to(0.0, 10.0);
        builder.close_path();
    }

    #[test]
    fn test_square_containment() {
        let mut builder = PathBuilder::new();
        square(&mut builder);
        assert!(builder.contains(Position::new(5.0, 5.0)));
        assert!(!builder.contains(Position::new(15.0, 5.0)));
        assert!(!builder.contains(Position::new(-1.0, -1.0)));
    }

    #[test]
    fn test_transform_applies_to_points() {
        let mut builder = PathBuilder::new();
        builder.save();
        builder.translate(100.0, 0.0);
        square(&mut builder);
        builder.restore();
        assert!(builder.contains(Position::new(105.0, 5.0)));
        assert!(!builder.contains(Position::new(5.0, 5.0)));
    }

    #[test]
    fn test_circle_arc_containment() {
        let mut builder = PathBuilder::new();
        builder.begin_path();
        builder.move_to(10.0, 0.0);
        builder.arc(0.0, 0.0, 10.0, 0.0, 2.0 * PI);
        builder.close_path();
        assert!(builder.contains(Position::new(0.0, 0.0)));
        assert!(builder.contains(Position::new(6.0, 6.0)));
        assert!(!builder.contains(Position::new(8.0, 8.0)));
    }

    #[test]
    fn test_cubic_endpoints() {
        let p0 = Position::new(0.0, 0.0);
        let p3 = Position::new(10.0, 0.0);
        let c = Position::new(5.0, 5.0);
        assert_eq!(cubic_point(p0, c, c, p3, 0.0), p0);
        assert_eq!(cubic_point(p0, c, c, p3, 1.0), p3);
    }
}
