//! Geometric layout of steps, connectors and return paths.

pub mod connector;
pub mod routing;
pub mod shape;

pub use connector::{AngleRange, ConnectorDisplay, ConnectorLayout};
pub use routing::{best_path_angle, fan_out_angle, LabelPlacement, RouteEnd, RouteGeometry};
pub use shape::StepShape;
