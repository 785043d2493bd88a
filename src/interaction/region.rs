//! Hit regions: clickable areas that match drawn geometry exactly.
//!
//! A region's outline is replayed into a [`RenderBackend`] and the backend's
//! own point-in-path query decides containment, so hit areas never drift
//! from what is on screen.

use crate::geometry::Position;
use crate::model::id::{ParamRef, PathRef, StepId};
use crate::render::outline::Outline;
use crate::render::RenderBackend;
use std::ops::BitOr;

/// Mouse cursor shown while hovering a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
    Grab,
    Text,
    NotAllowed,
}

/// What a region stands for. The editor interprets gestures on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionTarget {
    /// Fixed button creating a stop step.
    AddStopStep,
    /// Fixed drop zone removing steps and resetting paths.
    DeleteZone,
    StepBody(StepId),
    /// Padded footprint around a step body; accepts dropped paths.
    StepCollision(StepId),
    Connector(ParamRef),
    StopLabel(StepId),
    PathLabel(PathRef),
    PathArrow(PathRef),
    DanglingEnd(PathRef),
}

impl InteractionTarget {
    /// The step a drop on this target refers to, if any.
    pub fn step(&self) -> Option<StepId> {
        match self {
            InteractionTarget::StepBody(step)
            | InteractionTarget::StepCollision(step)
            | InteractionTarget::StopLabel(step) => Some(*step),
            InteractionTarget::Connector(param) => Some(param.step),
            _ => None,
        }
    }

    /// The return path a gesture on this target moves, if any.
    pub fn path(&self) -> Option<PathRef> {
        match self {
            InteractionTarget::PathLabel(path)
            | InteractionTarget::PathArrow(path)
            | InteractionTarget::DanglingEnd(path) => Some(*path),
            _ => None,
        }
    }
}

/// Set of pointer events a region reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventMask(u8);

impl EventMask {
    pub const NONE: EventMask = EventMask(0);
    pub const HOVER: EventMask = EventMask(1);
    pub const CLICK: EventMask = EventMask(1 << 1);
    pub const DOUBLE_CLICK: EventMask = EventMask(1 << 2);
    pub const DRAG: EventMask = EventMask(1 << 3);
    /// Receives the release of a gesture that started elsewhere.
    pub const DROP: EventMask = EventMask(1 << 4);

    pub const fn contains(self, other: EventMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: EventMask) -> EventMask {
        EventMask(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HitRegion {
    pub name: String,
    pub outline: Outline,
    pub cursor: Cursor,
    pub target: InteractionTarget,
    pub events: EventMask,
}

impl HitRegion {
    pub fn new(
        name: impl Into<String>,
        outline: Outline,
        cursor: Cursor,
        target: InteractionTarget,
        events: EventMask,
    ) -> Self {
        Self {
            name: name.into(),
            outline,
            cursor,
            target,
            events,
        }
    }

    /// Replay the outline and ask the backend whether `point` is inside.
    pub fn contains<B: RenderBackend + ?Sized>(&self, backend: &mut B, point: Position) -> bool {
        backend.save();
        backend.begin_path();
        self.outline.replay(backend);
        let inside = backend.is_point_in_path(point.x, point.y);
        backend.restore();
        inside
    }
}

/// First region (in priority order) under `point` that reacts to any of `wanted`.
pub fn hit_test<'a, B: RenderBackend + ?Sized>(
    regions: &'a [HitRegion],
    backend: &mut B,
    point: Position,
    wanted: EventMask,
) -> Option<&'a HitRegion> {
    regions
        .iter()
        .filter(|r| r.events.0 & wanted.0 != 0)
        .find(|r| r.contains(backend, point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::software::SoftwareBackend;
    use crate::render::MockRenderBackend;
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn square(target: InteractionTarget, events: EventMask) -> HitRegion {
        HitRegion::new(
            "square",
            Outline::centered_rect(Position::new(10.0, 10.0), 10.0, 10.0),
            Cursor::Pointer,
            target,
            events,
        )
    }

    #[test]
    fn test_contains_replays_into_backend() {
        let mut backend = MockRenderBackend::new();
        let mut seq = Sequence::new();
        backend
            .expect_save()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        backend
            .expect_begin_path()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        backend.expect_move_to().times(1).return_const(());
        backend.expect_line_to().times(3).return_const(());
        backend.expect_close_path().times(1).return_const(());
        backend
            .expect_is_point_in_path()
            .with(eq(5.0), eq(6.0))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(true);
        backend
            .expect_restore()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let region = square(InteractionTarget::AddStopStep, EventMask::CLICK);
        assert!(region.contains(&mut backend, Position::new(5.0, 6.0)));
    }

    #[test]
    fn test_hit_test_respects_priority_and_mask() {
        let mut backend = SoftwareBackend::new();
        let regions = vec![
            square(InteractionTarget::StepCollision(StepId(1)), EventMask::DROP),
            square(InteractionTarget::StepBody(StepId(1)), EventMask::CLICK | EventMask::DRAG),
            square(InteractionTarget::DeleteZone, EventMask::CLICK),
        ];
        let hit = hit_test(&regions, &mut backend, Position::new(10.0, 10.0), EventMask::CLICK)
            .unwrap();
        assert_eq!(hit.target, InteractionTarget::StepBody(StepId(1)));

        let drop = hit_test(&regions, &mut backend, Position::new(10.0, 10.0), EventMask::DROP)
            .unwrap();
        assert_eq!(drop.target, InteractionTarget::StepCollision(StepId(1)));

        assert!(hit_test(&regions, &mut backend, Position::new(50.0, 50.0), EventMask::CLICK).is_none());
    }

    #[test]
    fn test_event_mask() {
        let mask = EventMask::CLICK | EventMask::DRAG;
        assert!(mask.contains(EventMask::CLICK));
        assert!(!mask.contains(EventMask::DROP));
        assert!(EventMask::NONE.is_empty());
    }
}
