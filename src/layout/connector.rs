//! Connector layout.
//!
//! Parameters are drawn as short stubs radiating from the step body. Outputs
//! fan out around angle 0 (right), inputs around π (left), with the total
//! spread taken from a fixed table keyed by the number of connectors. Inputs
//! are laid out in the reverse rotational direction so both columns read top
//! to bottom.
//!
//! Each connector angle is reserved (± [`CONNECTOR_ANGLE_PADDING`]) so return
//! paths never leave the step through a parameter stub.

use crate::geometry::{angle_delta, angle_distance, constrain_angle, deg_to_rad, Position};
use crate::layout::shape::StepShape;
use crate::model::field::Parameter;
use crate::model::id::{ParamId, Side};
use crate::render::{Outline, TextAnchor};
use std::f64::consts::PI;

/// Total angular spread in degrees for 1..=7 connectors; more are capped at the last entry.
pub const SPREAD_DEGREES: [f64; 7] = [0.0, 60.0, 90.0, 110.0, 120.0, 130.0, 140.0];

pub const STUB_LENGTH: f64 = 18.0;
pub const CONNECTOR_DOT_RADIUS: f64 = 4.0;
pub const CONNECTOR_HIT_RADIUS: f64 = 8.0;
pub const LABEL_GAP: f64 = 6.0;
/// Half-width of the angle range a connector reserves, in degrees.
pub const CONNECTOR_ANGLE_PADDING_DEGREES: f64 = 12.0;

/// Reserved half-width in radians.
pub fn connector_angle_padding() -> f64 {
    deg_to_rad(CONNECTOR_ANGLE_PADDING_DEGREES)
}

/// Total spread in radians for `n` connectors.
pub fn spread_for(n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let index = n.min(SPREAD_DEGREES.len()) - 1;
    deg_to_rad(SPREAD_DEGREES[index])
}

/// Angles, constrained to `[0, 2π)`, for `n` connectors on `side`.
pub fn connector_angles(n: usize, side: Side) -> Vec<f64> {
    let spread = spread_for(n);
    let step = if n > 1 { spread / (n - 1) as f64 } else { 0.0 };
    (0..n)
        .map(|i| {
            let offset = i as f64 * step;
            let angle = match side {
                Side::Output => -spread / 2.0 + offset,
                Side::Input => PI + spread / 2.0 - offset,
            };
            constrain_angle(angle)
        })
        .collect()
}

/// A circular range of forbidden angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleRange {
    pub center: f64,
    pub half_width: f64,
}

impl AngleRange {
    const EDGE_EPSILON: f64 = 1e-9;

    pub fn around(center: f64, half_width: f64) -> Self {
        Self {
            center: constrain_angle(center),
            half_width,
        }
    }

    /// Strictly inside; the boundaries themselves are allowed.
    pub fn contains(&self, angle: f64) -> bool {
        angle_distance(self.center, angle) < self.half_width - Self::EDGE_EPSILON
    }

    pub fn lower(&self) -> f64 {
        constrain_angle(self.center - self.half_width)
    }

    pub fn upper(&self) -> f64 {
        constrain_angle(self.center + self.half_width)
    }

    /// Whether `angle` is closer to the lower boundary. The exact centre goes up.
    pub fn nearer_lower(&self, angle: f64) -> bool {
        angle_delta(self.center, angle) < 0.0
    }
}

/// Cached geometry for one parameter's stub and label, relative to the step centre.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorDisplay {
    pub param: ParamId,
    pub side: Side,
    pub angle: f64,
    pub stub_start: Position,
    pub stub_end: Position,
    pub label_offset: Position,
    pub label_anchor: TextAnchor,
}

impl ConnectorDisplay {
    fn new(param: ParamId, side: Side, angle: f64, shape: &StepShape) -> Self {
        let edge = shape.edge_distance(angle);
        let stub_start = Position::ZERO.offset(angle, edge);
        let stub_end = Position::ZERO.offset(angle, edge + STUB_LENGTH);
        let label_offset = Position::ZERO.offset(angle, edge + STUB_LENGTH + LABEL_GAP);
        let label_anchor = if angle.cos() >= 0.0 {
            TextAnchor::Start
        } else {
            TextAnchor::End
        };
        Self {
            param,
            side,
            angle,
            stub_start,
            stub_end,
            label_offset,
            label_anchor,
        }
    }

    /// Clickable area around the stub end for a step centred on `center`.
    pub fn region_outline(&self, center: Position) -> Outline {
        Outline::circle(center + self.stub_end, CONNECTOR_HIT_RADIUS)
    }

    /// Label text. Expanded with the binding when the connector is highlighted.
    pub fn label(param: &Parameter, variable_name: Option<&str>, expanded: bool) -> String {
        if !expanded {
            return param.name().to_string();
        }
        match (variable_name, param.fixed_value()) {
            (Some(var), _) => format!("{} = {}", param.name(), var),
            (None, Some(value)) => format!("{} = \"{}\"", param.name(), value),
            (None, None) => param.name().to_string(),
        }
    }
}

/// Connector displays and reserved ranges for a step body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectorLayout {
    pub connectors: Vec<ConnectorDisplay>,
    pub avoid: Vec<AngleRange>,
}

impl ConnectorLayout {
    pub fn compute(shape: &StepShape, inputs: &[Parameter], outputs: &[Parameter]) -> Self {
        let padding = connector_angle_padding();
        let mut layout = ConnectorLayout::default();
        for (side, params) in [(Side::Input, inputs), (Side::Output, outputs)] {
            let angles = connector_angles(params.len(), side);
            for (param, angle) in params.iter().zip(angles) {
                layout
                    .connectors
                    .push(ConnectorDisplay::new(param.id, side, angle, shape));
                layout.avoid.push(AngleRange::around(angle, padding));
            }
        }
        layout
    }

    pub fn find(&self, param: ParamId) -> Option<&ConnectorDisplay> {
        self.connectors.iter().find(|c| c.param == param)
    }
}
