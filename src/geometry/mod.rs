//! Geometry primitives for the diagram canvas.
//!
//! Canvas coordinates follow the usual screen convention: `x` grows to the
//! right and `y` grows downwards, so a positive angle turns clockwise on
//! screen. All angles are in radians.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::ops::{Add, Mul, Sub};

/// A point (or offset) on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ZERO: Position = Position { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle`.
    pub fn from_angle(angle: f64) -> Self {
        Self {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    /// Point at `distance` from `self` in direction `angle`.
    pub fn offset(self, angle: f64, distance: f64) -> Self {
        self + Self::from_angle(angle) * distance
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance_to(self, other: Position) -> f64 {
        (other - self).length()
    }

    /// Angle of the vector from `self` to `other`.
    pub fn angle_to(self, other: Position) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Angle of this position seen as a vector from the origin.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Rotate around the origin.
    pub fn rotated(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    pub fn lerp(self, other: Position, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Position {
    type Output = Position;

    fn mul(self, rhs: f64) -> Position {
        Position::new(self.x * rhs, self.y * rhs)
    }
}

/// A position together with the direction it faces.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientedPosition {
    pub position: Position,
    pub angle: f64,
}

impl OrientedPosition {
    pub const fn new(position: Position, angle: f64) -> Self {
        Self { position, angle }
    }

    /// Point `distance` ahead along the facing direction.
    pub fn ahead(&self, distance: f64) -> Position {
        self.position.offset(self.angle, distance)
    }
}

/// Translate-then-rotate transform, the only kind the canvas needs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub translation: Position,
    pub rotation: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Position::ZERO,
        rotation: 0.0,
    };

    pub const fn new(translation: Position, rotation: f64) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub const fn translate(translation: Position) -> Self {
        Self::new(translation, 0.0)
    }

    /// Map a point from local space into the parent space.
    pub fn apply(&self, local: Position) -> Position {
        local.rotated(self.rotation) + self.translation
    }

    /// Map a point from the parent space back into local space.
    pub fn invert(&self, world: Position) -> Position {
        (world - self.translation).rotated(-self.rotation)
    }

    /// `self` applied after `inner`.
    pub fn then(&self, inner: &Transform) -> Transform {
        Transform {
            translation: self.apply(inner.translation),
            rotation: self.rotation + inner.rotation,
        }
    }

    /// Push this transform onto a drawing context.
    pub fn apply_to<B: crate::render::RenderBackend + ?Sized>(&self, backend: &mut B) {
        backend.translate(self.translation.x, self.translation.y);
        if self.rotation != 0.0 {
            backend.rotate(self.rotation);
        }
    }
}

// ── Angle helpers ──

/// Constrain an angle into `[0, 2π)`.
pub fn constrain_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Signed shortest rotation from `from` to `to`, in `(-π, π]`.
pub fn angle_delta(from: f64, to: f64) -> f64 {
    let delta = constrain_angle(to - from);
    if delta > PI {
        delta - TAU
    } else {
        delta
    }
}

/// Unsigned circular distance between two angles, in `[0, π]`.
pub fn angle_distance(a: f64, b: f64) -> f64 {
    angle_delta(a, b).abs()
}

pub fn deg_to_rad(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

pub fn rad_to_deg(radians: f64) -> f64 {
    radians * 180.0 / PI
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_constrain_angle() {
        assert!((constrain_angle(-PI / 2.0) - 3.0 * PI / 2.0).abs() < EPS);
        assert!((constrain_angle(5.0 * PI) - PI).abs() < EPS);
        assert_eq!(constrain_angle(TAU), 0.0);
        assert_eq!(constrain_angle(-1e-18), 0.0);
    }

    #[test]
    fn test_angle_delta_wraps() {
        assert!((angle_delta(deg_to_rad(350.0), deg_to_rad(10.0)) - deg_to_rad(20.0)).abs() < EPS);
        assert!((angle_delta(deg_to_rad(10.0), deg_to_rad(350.0)) + deg_to_rad(20.0)).abs() < EPS);
        assert!((angle_distance(0.0, PI) - PI).abs() < EPS);
    }

    #[test]
    fn test_transform_round_trip() {
        let t = Transform::new(Position::new(10.0, 5.0), PI / 2.0);
        let p = t.apply(Position::new(1.0, 0.0));
        assert!((p.x - 10.0).abs() < EPS);
        assert!((p.y - 6.0).abs() < EPS);
        let back = t.invert(p);
        assert!((back.x - 1.0).abs() < EPS);
        assert!(back.y.abs() < EPS);
    }

    #[test]
    fn test_transform_composition() {
        let outer = Transform::translate(Position::new(100.0, 0.0));
        let inner = Transform::new(Position::new(0.0, 10.0), PI);
        let composed = outer.then(&inner);
        let p = composed.apply(Position::new(1.0, 0.0));
        let expected = outer.apply(inner.apply(Position::new(1.0, 0.0)));
        assert!(p.distance_to(expected) < EPS);
    }

    #[test]
    fn test_oriented_position_ahead() {
        let o = OrientedPosition::new(Position::new(1.0, 1.0), PI / 2.0);
        let p = o.ahead(2.0);
        assert!((p.x - 1.0).abs() < EPS);
        assert!((p.y - 3.0).abs() < EPS);
    }
}
