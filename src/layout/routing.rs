//! Return-path routing.
//!
//! A return path is drawn as a cubic Bézier between two oriented points on the
//! edges of its steps. The exit angle at each step is the angle towards the
//! other step, nudged out of any range reserved by a parameter connector.

use crate::geometry::{angle_distance, constrain_angle, deg_to_rad, OrientedPosition, Position, Transform};
use crate::layout::connector::AngleRange;
use crate::layout::shape::StepShape;
use crate::render::path::{cubic_point, cubic_tangent};
use crate::render::{Outline, TextAnchor};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Control-point distance as a fraction of the endpoint distance.
pub const CONTROL_DISTANCE_FACTOR: f64 = 0.4;
/// Upper bound on the control-point distance.
pub const MAX_CONTROL_DISTANCE: f64 = 120.0;
/// Control-point distance used for self loops.
pub const SELF_LOOP_CONTROL_DISTANCE: f64 = 90.0;
/// Preferred exit and re-entry angles for a self loop (up-right, up-left).
pub const SELF_LOOP_EXIT: f64 = -FRAC_PI_4;
pub const SELF_LOOP_ENTRY: f64 = -3.0 * FRAC_PI_4;

pub const ARROW_LENGTH: f64 = 12.0;
pub const ARROW_HALF_WIDTH: f64 = 6.0;
pub const DANGLING_HANDLE_RADIUS: f64 = 7.0;
pub const PATH_LABEL_FONT_SIZE: f64 = 11.0;
/// Distance of the label from the arrow along the curve, and above it.
pub const LABEL_LEAD: f64 = 10.0;
pub const LABEL_RISE: f64 = 4.0;

/// Preferred direction for a freshly created dangling path (straight down).
pub const FAN_OUT_BASE: f64 = FRAC_PI_2;
pub const FAN_OUT_STEP_DEGREES: f64 = 25.0;
pub const FAN_OUT_MIN_SEPARATION_DEGREES: f64 = 20.0;

/// The angle nearest `desired` that is not strictly inside any reserved range.
///
/// When `desired` is blocked the result snaps to whichever boundary of the
/// blocking range is closer. If that boundary lands in an overlapping range,
/// snapping continues in the same direction.
pub fn best_path_angle(ranges: &[AngleRange], desired: f64) -> f64 {
    let mut angle = constrain_angle(desired);
    let Some(first) = ranges.iter().find(|r| r.contains(angle)) else {
        return angle;
    };
    let downwards = first.nearer_lower(angle);
    angle = if downwards { first.lower() } else { first.upper() };
    for _ in 0..ranges.len() {
        match ranges.iter().find(|r| r.contains(angle)) {
            Some(r) => angle = if downwards { r.lower() } else { r.upper() },
            None => break,
        }
    }
    angle
}

/// Pick an exit angle for a new dangling path that stays clear of `used`.
pub fn fan_out_angle(ranges: &[AngleRange], used: &[f64]) -> f64 {
    let step = deg_to_rad(FAN_OUT_STEP_DEGREES);
    let separation = deg_to_rad(FAN_OUT_MIN_SEPARATION_DEGREES);
    let first = best_path_angle(ranges, FAN_OUT_BASE);
    let max_k = (PI / step).ceil() as i32;
    for k in 0..=max_k {
        for sign in [1.0, -1.0] {
            if k == 0 && sign < 0.0 {
                continue;
            }
            let candidate = best_path_angle(ranges, FAN_OUT_BASE + sign * k as f64 * step);
            if used.iter().all(|u| angle_distance(*u, candidate) >= separation) {
                return candidate;
            }
        }
    }
    first
}

/// One end of a route: a step body with its reserved ranges.
#[derive(Debug, Clone, Copy)]
pub struct RouteEnd<'a> {
    pub center: Position,
    pub shape: &'a StepShape,
    pub avoid: &'a [AngleRange],
}

impl RouteEnd<'_> {
    fn exit(&self, desired: f64) -> OrientedPosition {
        let angle = best_path_angle(self.avoid, desired);
        OrientedPosition::new(self.shape.edge_point(self.center, angle), angle)
    }
}

/// Routed geometry of a return path.
///
/// `end.angle` faces away from the destination, back along the curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteGeometry {
    pub start: OrientedPosition,
    pub end: OrientedPosition,
    pub control_distance: f64,
}

/// Where and how a path label is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPlacement {
    pub anchor_point: Position,
    pub rotation: f64,
    pub text_anchor: TextAnchor,
}

impl RouteGeometry {
    /// Route between two steps, or from a step to a free end at `from + end_offset`.
    pub fn between(from: RouteEnd<'_>, to: Option<RouteEnd<'_>>, end_offset: Position) -> Self {
        let target = match &to {
            Some(end) => end.center,
            None => from.center + end_offset,
        };
        let direct = from.center.angle_to(target);
        let start = from.exit(direct);
        let end = match &to {
            Some(end) => end.exit(direct + PI),
            None => OrientedPosition::new(target, constrain_angle(direct + PI)),
        };
        let control_distance = (start.position.distance_to(end.position)
            * CONTROL_DISTANCE_FACTOR)
            .min(MAX_CONTROL_DISTANCE);
        Self {
            start,
            end,
            control_distance,
        }
    }

    /// A path that leaves and re-enters the same step.
    pub fn self_loop(step: RouteEnd<'_>) -> Self {
        Self {
            start: step.exit(SELF_LOOP_EXIT),
            end: step.exit(SELF_LOOP_ENTRY),
            control_distance: SELF_LOOP_CONTROL_DISTANCE,
        }
    }

    pub fn control_points(&self) -> (Position, Position) {
        (
            self.start.ahead(self.control_distance),
            self.end.ahead(self.control_distance),
        )
    }

    pub fn point_at(&self, t: f64) -> Position {
        let (c1, c2) = self.control_points();
        cubic_point(self.start.position, c1, c2, self.end.position, t)
    }

    /// Direction of travel at `t`, in `(-π, π]`.
    pub fn tangent_angle_at(&self, t: f64) -> f64 {
        let (c1, c2) = self.control_points();
        let d = cubic_tangent(self.start.position, c1, c2, self.end.position, t);
        if d.length() < 1e-12 {
            self.start.position.angle_to(self.end.position)
        } else {
            d.angle()
        }
    }

    pub fn midpoint(&self) -> Position {
        self.point_at(0.5)
    }

    pub fn mid_tangent(&self) -> f64 {
        self.tangent_angle_at(0.5)
    }

    /// The curve as an open outline.
    pub fn curve_outline(&self) -> Outline {
        let (c1, c2) = self.control_points();
        Outline::new()
            .move_to(self.start.position)
            .cubic_to(c1, c2, self.end.position)
    }

    /// Arrowhead at the midpoint, pointing along the direction of travel.
    pub fn arrow_outline(&self) -> Outline {
        let local = Outline::polygon(&[
            Position::new(ARROW_LENGTH / 2.0, 0.0),
            Position::new(-ARROW_LENGTH / 2.0, -ARROW_HALF_WIDTH),
            Position::new(-ARROW_LENGTH / 2.0, ARROW_HALF_WIDTH),
        ]);
        local.transformed(&Transform::new(self.midpoint(), self.mid_tangent()))
    }

    /// Free-end handle for a dangling path.
    pub fn dangling_handle_outline(&self) -> Outline {
        Outline::circle(self.end.position, DANGLING_HANDLE_RADIUS)
    }

    /// Label placement next to the mid arrow, kept upright.
    ///
    /// Past ±90° the text is turned half a revolution and anchored at its
    /// end, so it still runs away from the arrow without reading upside-down.
    pub fn label_placement(&self) -> LabelPlacement {
        let tangent = self.mid_tangent();
        let (rotation, text_anchor) = if tangent.abs() > FRAC_PI_2 {
            let flipped = if tangent > 0.0 { tangent - PI } else { tangent + PI };
            (flipped, TextAnchor::End)
        } else {
            (tangent, TextAnchor::Start)
        };
        let lead = self.midpoint().offset(tangent, LABEL_LEAD);
        // "Up" relative to the upright text baseline
        let anchor_point = lead.offset(rotation - FRAC_PI_2, LABEL_RISE);
        LabelPlacement {
            anchor_point,
            rotation,
            text_anchor,
        }
    }

    /// Rectangle covering a label of `text_width`.
    pub fn label_outline(&self, text_width: f64) -> Outline {
        let placement = self.label_placement();
        let (left, right) = match placement.text_anchor {
            TextAnchor::Start => (0.0, text_width),
            TextAnchor::Middle => (-text_width / 2.0, text_width / 2.0),
            TextAnchor::End => (-text_width, 0.0),
        };
        let top = -PATH_LABEL_FONT_SIZE;
        let bottom = PATH_LABEL_FONT_SIZE * 0.3;
        Outline::polygon(&[
            Position::new(left, top),
            Position::new(right, top),
            Position::new(right, bottom),
            Position::new(left, bottom),
        ])
        .transformed(&Transform::new(placement.anchor_point, placement.rotation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::rad_to_deg;
    use crate::layout::connector::connector_angle_padding;

    const EPS: f64 = 1e-9;

    fn circle() -> StepShape {
        StepShape::Circle { radius: 20.0 }
    }

    #[test]
    fn test_best_angle_unblocked() {
        let ranges = [AngleRange::around(0.0, deg_to_rad(12.0))];
        assert!((best_path_angle(&ranges, FRAC_PI_2) - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_best_angle_snaps_to_nearer_boundary() {
        let ranges = [AngleRange::around(PI, deg_to_rad(12.0))];
        let low = best_path_angle(&ranges, PI - deg_to_rad(3.0));
        assert!((rad_to_deg(low) - 168.0).abs() < 1e-6);
        let high = best_path_angle(&ranges, PI + deg_to_rad(3.0));
        assert!((rad_to_deg(high) - 192.0).abs() < 1e-6);
        // Exact centre breaks towards the upper boundary
        let centre = best_path_angle(&ranges, PI);
        assert!((rad_to_deg(centre) - 192.0).abs() < 1e-6);
    }

    #[test]
    fn test_best_angle_across_wrap() {
        let ranges = [AngleRange::around(0.0, deg_to_rad(12.0))];
        let at_zero = best_path_angle(&ranges, 0.0);
        assert!((rad_to_deg(at_zero) - 12.0).abs() < 1e-6);
        let just_below = best_path_angle(&ranges, -deg_to_rad(1.0));
        assert!((rad_to_deg(just_below) - 348.0).abs() < 1e-6);
        let at_tau = best_path_angle(&ranges, std::f64::consts::TAU);
        assert!((rad_to_deg(at_tau) - 12.0).abs() < 1e-6);
    }

    #[test]
    fn test_best_angle_slides_through_overlaps() {
        let pad = connector_angle_padding();
        let ranges = [
            AngleRange::around(deg_to_rad(90.0), pad),
            AngleRange::around(deg_to_rad(90.0) + pad * 1.5, pad),
        ];
        let angle = best_path_angle(&ranges, deg_to_rad(92.0));
        assert!(ranges.iter().all(|r| !r.contains(angle)));
        assert!((angle - ranges[1].upper()).abs() < EPS);
    }

    #[test]
    fn test_route_between_steps_faces_each_other() {
        let shape = circle();
        let from = RouteEnd {
            center: Position::new(0.0, 0.0),
            shape: &shape,
            avoid: &[],
        };
        let to = RouteEnd {
            center: Position::new(200.0, 0.0),
            shape: &shape,
            avoid: &[],
        };
        let route = RouteGeometry::between(from, Some(to), Position::ZERO);
        assert!(route.start.position.distance_to(Position::new(20.0, 0.0)) < EPS);
        assert!(route.end.position.distance_to(Position::new(180.0, 0.0)) < EPS);
        assert!((route.end.angle - PI).abs() < EPS);
        assert!((route.control_distance - 160.0 * CONTROL_DISTANCE_FACTOR).abs() < EPS);
    }

    #[test]
    fn test_control_distance_is_capped() {
        let shape = circle();
        let from = RouteEnd {
            center: Position::ZERO,
            shape: &shape,
            avoid: &[],
        };
        let to = RouteEnd {
            center: Position::new(5000.0, 0.0),
            shape: &shape,
            avoid: &[],
        };
        let route = RouteGeometry::between(from, Some(to), Position::ZERO);
        assert_eq!(route.control_distance, MAX_CONTROL_DISTANCE);
    }

    #[test]
    fn test_dangling_end_keeps_raw_angle() {
        let shape = circle();
        let blocked = [AngleRange::around(PI, deg_to_rad(30.0))];
        let from = RouteEnd {
            center: Position::ZERO,
            shape: &shape,
            avoid: &[],
        };
        let route = RouteGeometry::between(from, None, Position::new(100.0, 0.0));
        assert_eq!(route.end.position, Position::new(100.0, 0.0));
        assert!((route.end.angle - PI).abs() < EPS);
        // A blocked range would have moved a concrete end, but not a dangling one
        assert!(blocked[0].contains(route.end.angle));
    }

    #[test]
    fn test_exit_avoids_connectors() {
        let shape = circle();
        let avoid = [AngleRange::around(0.0, deg_to_rad(12.0))];
        let from = RouteEnd {
            center: Position::ZERO,
            shape: &shape,
            avoid: &avoid,
        };
        let route = RouteGeometry::between(from, None, Position::new(100.0, 1.0));
        assert!(!avoid[0].contains(route.start.angle));
    }

    #[test]
    fn test_self_loop_uses_fixed_control_distance() {
        let shape = circle();
        let step = RouteEnd {
            center: Position::ZERO,
            shape: &shape,
            avoid: &[],
        };
        let route = RouteGeometry::self_loop(step);
        assert_eq!(route.control_distance, SELF_LOOP_CONTROL_DISTANCE);
        // Both ends sit above the step so the loop bows upwards
        assert!(route.start.position.y < 0.0 && route.end.position.y < 0.0);
        assert!(route.midpoint().y < -20.0);
    }

    #[test]
    fn test_label_flips_past_ninety_degrees() {
        let shape = circle();
        let a = RouteEnd {
            center: Position::ZERO,
            shape: &shape,
            avoid: &[],
        };
        let b = RouteEnd {
            center: Position::new(200.0, 0.0),
            shape: &shape,
            avoid: &[],
        };
        let rightwards = RouteGeometry::between(a, Some(b), Position::ZERO).label_placement();
        assert_eq!(rightwards.text_anchor, TextAnchor::Start);
        assert!(rightwards.rotation.abs() < EPS);

        let leftwards = RouteGeometry::between(b, Some(a), Position::ZERO).label_placement();
        assert_eq!(leftwards.text_anchor, TextAnchor::End);
        assert!(leftwards.rotation.abs() < EPS);
    }

    #[test]
    fn test_fan_out_avoids_used_angles() {
        let used = [FRAC_PI_2];
        let angle = fan_out_angle(&[], &used);
        assert!(angle_distance(angle, FRAC_PI_2) >= deg_to_rad(FAN_OUT_MIN_SEPARATION_DEGREES));
        assert!((fan_out_angle(&[], &[]) - FRAC_PI_2).abs() < EPS);
    }

    // Property-based tests using proptest
    use crate::layout::connector::connector_angles;
    use crate::model::id::Side;
    use proptest::prelude::*;

    fn reserved(inputs: usize, outputs: usize) -> Vec<AngleRange> {
        connector_angles(inputs, Side::Input)
            .into_iter()
            .chain(connector_angles(outputs, Side::Output))
            .map(|a| AngleRange::around(a, connector_angle_padding()))
            .collect()
    }

    proptest! {
        #[test]
        fn test_best_angle_never_inside_reserved_range(
            inputs in 0usize..10,
            outputs in 0usize..10,
            desired in -10.0f64..10.0,
        ) {
            let ranges = reserved(inputs, outputs);
            let angle = best_path_angle(&ranges, desired);

            // Property: the result is never strictly inside a reserved range
            for r in &ranges {
                prop_assert!(!r.contains(angle), "{} inside {:?}", angle, r);
            }

            // Property: unblocked angles pass through, blocked ones land on a boundary
            let wanted = constrain_angle(desired);
            if ranges.iter().any(|r| r.contains(wanted)) {
                let on_boundary = ranges.iter().any(|r| {
                    angle_distance(angle, r.lower()) < EPS || angle_distance(angle, r.upper()) < EPS
                });
                prop_assert!(on_boundary, "{} is not a boundary", angle);
            } else {
                prop_assert!(angle_distance(angle, wanted) < EPS);
            }
        }

        #[test]
        fn test_single_range_snaps_to_nearer_boundary(
            center in 0.0f64..6.28,
            half_width in 0.05f64..1.0,
            offset in -0.99f64..0.99,
        ) {
            let range = AngleRange::around(center, half_width);
            let desired = center + offset * half_width;
            prop_assume!(offset.abs() > 1e-6);
            let angle = best_path_angle(&[range], desired);
            let expected = if offset < 0.0 { range.lower() } else { range.upper() };
            prop_assert!(angle_distance(angle, expected) < EPS);
        }
    }
}
