//! Step body shapes.
//!
//! Each step variant maps to a body shape. The shape answers the one question
//! connector and route layout needs: how far from the centre is the edge in a
//! given direction.

use crate::geometry::Position;
use crate::render::Outline;

pub const TERMINAL_RADIUS: f64 = 20.0;
pub const CALL_HALF_WIDTH: f64 = 60.0;
pub const CALL_HALF_HEIGHT: f64 = 22.0;
pub const CALL_CORNER_RADIUS: f64 = 8.0;
/// Extra margin around the body that still counts as "on the step" for drops.
pub const COLLISION_PADDING: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepShape {
    Circle { radius: f64 },
    RoundedRect { half_width: f64, half_height: f64 },
}

impl StepShape {
    /// Distance from the centre to the edge along `angle`.
    pub fn edge_distance(&self, angle: f64) -> f64 {
        match *self {
            StepShape::Circle { radius } => radius,
            StepShape::RoundedRect {
                half_width,
                half_height,
            } => {
                let (sin, cos) = angle.sin_cos();
                let tx = if cos.abs() < 1e-12 {
                    f64::INFINITY
                } else {
                    half_width / cos.abs()
                };
                let ty = if sin.abs() < 1e-12 {
                    f64::INFINITY
                } else {
                    half_height / sin.abs()
                };
                tx.min(ty)
            }
        }
    }

    /// Point on the edge along `angle`, for a body centred on `center`.
    pub fn edge_point(&self, center: Position, angle: f64) -> Position {
        center.offset(angle, self.edge_distance(angle))
    }

    pub fn outline(&self, center: Position) -> Outline {
        match *self {
            StepShape::Circle { radius } => Outline::circle(center, radius),
            StepShape::RoundedRect {
                half_width,
                half_height,
            } => Outline::rounded_rect(center, half_width, half_height, CALL_CORNER_RADIUS),
        }
    }

    /// The body grown by [`COLLISION_PADDING`].
    pub fn collision_outline(&self, center: Position) -> Outline {
        self.inflated(COLLISION_PADDING).outline(center)
    }

    pub fn inflated(&self, by: f64) -> StepShape {
        match *self {
            StepShape::Circle { radius } => StepShape::Circle { radius: radius + by },
            StepShape::RoundedRect {
                half_width,
                half_height,
            } => StepShape::RoundedRect {
                half_width: half_width + by,
                half_height: half_height + by,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    #[test]
    fn test_circle_edge_is_constant() {
        let shape = StepShape::Circle { radius: 20.0 };
        assert_eq!(shape.edge_distance(0.3), 20.0);
        assert_eq!(shape.edge_distance(PI), 20.0);
    }

    #[test]
    fn test_rect_edge_distance() {
        let shape = StepShape::RoundedRect {
            half_width: 60.0,
            half_height: 20.0,
        };
        assert!((shape.edge_distance(0.0) - 60.0).abs() < 1e-9);
        assert!((shape.edge_distance(FRAC_PI_2) - 20.0).abs() < 1e-9);
        assert!((shape.edge_distance(PI) - 60.0).abs() < 1e-9);
        // Diagonal hits the top edge first
        assert!((shape.edge_distance(FRAC_PI_4) - 20.0 * 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_inflated() {
        let shape = StepShape::Circle { radius: 20.0 }.inflated(5.0);
        assert_eq!(shape, StepShape::Circle { radius: 25.0 });
    }
}
