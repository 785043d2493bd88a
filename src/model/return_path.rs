//! Return paths: control-flow edges between steps.
//!
//! A path leaves its owning step and either reaches another step (or the same
//! one) or dangles, in which case `end_offset` places its free end relative to
//! the owner. Routed geometry is memoized against the version counters of
//! both end steps and the path's own connection epoch.

use crate::geometry::Position;
use crate::layout::routing::RouteGeometry;
use crate::model::id::{PathId, StepId};

/// Label used for an unnamed path among named ones.
pub const DEFAULT_PATH_LABEL: &str = "default";

/// Everything a routed geometry depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteKey {
    pub from_version: u64,
    pub to_version: Option<u64>,
    pub epoch: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnPath {
    pub id: PathId,
    pub from: StepId,
    to: Option<StepId>,
    pub name: Option<String>,
    /// Sole path of its step.
    pub only_path: bool,
    /// Free-end position relative to the owning step while dangling.
    end_offset: Position,
    /// Another outgoing path of the same step carries the same label.
    pub duplicate_name: bool,
    epoch: u64,
    route: Option<(RouteKey, RouteGeometry)>,
}

impl ReturnPath {
    pub fn dangling(id: PathId, from: StepId, name: Option<String>, end_offset: Position) -> Self {
        Self {
            id,
            from,
            to: None,
            name,
            only_path: false,
            end_offset,
            duplicate_name: false,
            epoch: 0,
            route: None,
        }
    }

    pub fn to(&self) -> Option<StepId> {
        self.to
    }

    pub fn is_connected(&self) -> bool {
        self.to.is_some()
    }

    pub fn end_offset(&self) -> Position {
        self.end_offset
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Text shown next to the path, if any.
    pub fn display_label(&self, has_named_paths: bool) -> Option<&str> {
        match &self.name {
            Some(name) => Some(name.as_str()),
            None if has_named_paths && !self.only_path => Some(DEFAULT_PATH_LABEL),
            None => None,
        }
    }

    /// Geometry cached for `key`, if still current.
    pub fn cached_route(&self, key: &RouteKey) -> Option<&RouteGeometry> {
        match &self.route {
            Some((cached, geometry)) if cached == key => Some(geometry),
            _ => None,
        }
    }

    pub(crate) fn store_route(&mut self, key: RouteKey, geometry: RouteGeometry) {
        self.route = Some((key, geometry));
    }

    pub(crate) fn set_target(&mut self, to: Option<StepId>) {
        self.to = to;
        self.touch();
    }

    pub(crate) fn set_end_offset(&mut self, offset: Position) {
        self.end_offset = offset;
        self.touch();
    }

    fn touch(&mut self) {
        self.epoch += 1;
        self.route = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::OrientedPosition;

    #[test]
    fn test_display_label_rules() {
        let mut path = ReturnPath::dangling(PathId(0), StepId(1), None, Position::ZERO);
        assert_eq!(path.display_label(false), None);
        assert_eq!(path.display_label(true), Some(DEFAULT_PATH_LABEL));
        path.only_path = true;
        assert_eq!(path.display_label(true), None);
        path.name = Some("yes".to_string());
        assert_eq!(path.display_label(true), Some("yes"));
    }

    #[test]
    fn test_reconnect_invalidates_route() {
        let mut path = ReturnPath::dangling(PathId(0), StepId(1), None, Position::new(50.0, 0.0));
        let key = RouteKey {
            from_version: 1,
            to_version: None,
            epoch: path.epoch(),
        };
        let geometry = RouteGeometry {
            start: OrientedPosition::default(),
            end: OrientedPosition::default(),
            control_distance: 0.0,
        };
        path.store_route(key, geometry);
        assert!(path.cached_route(&key).is_some());

        path.set_target(Some(StepId(2)));
        assert!(path.is_connected());
        assert!(path.cached_route(&key).is_none());
        assert_eq!(path.epoch(), 1);
    }
}
