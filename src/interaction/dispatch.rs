//! Pointer dispatcher.
//!
//! Turns raw press/move/release events into gestures on hit regions. A press
//! captures the region under the pointer; moves past a small threshold turn
//! into drags of that region; the release goes back to the captured region and,
//! when the pointer ended up over a different region, to the topmost of those
//! as well. Whether that second region accepts drops is left to the receiver.

use super::region::{hit_test, Cursor, EventMask, HitRegion, InteractionTarget};
use crate::geometry::Position;
use crate::render::RenderBackend;
use tracing::debug;

/// Default double-click window in milliseconds.
pub const DEFAULT_DOUBLE_CLICK_MS: u64 = 400;
/// Pointer travel before a press becomes a drag.
pub const DRAG_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Press { pos: Position, time_ms: u64 },
    Move { pos: Position },
    Release { pos: Position },
}

/// A gesture routed to a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispatch {
    /// The region under a free pointer changed.
    Hover {
        target: Option<InteractionTarget>,
        cursor: Cursor,
    },
    Press {
        target: InteractionTarget,
        pos: Position,
    },
    DoubleClick {
        target: InteractionTarget,
        pos: Position,
    },
    Drag {
        target: InteractionTarget,
        pos: Position,
        delta: Position,
    },
    /// Delivered to the region that received the press.
    Release {
        target: InteractionTarget,
        pos: Position,
        dragged: bool,
    },
    /// Delivered to the topmost region under the pointer at release when
    /// it belongs to something other than the pressed region.
    Drop {
        source: InteractionTarget,
        over: InteractionTarget,
        pos: Position,
        /// The gesture passed the drag threshold.
        dragged: bool,
        /// `over` carries [`EventMask::DROP`].
        accepts: bool,
    },
}

#[derive(Debug, Clone, Copy)]
struct Capture {
    target: InteractionTarget,
    events: EventMask,
    origin: Position,
    last: Position,
    dragging: bool,
    /// The press completed a double click; its release is not a click.
    consumed: bool,
}

#[derive(Debug, Clone, Copy)]
struct LastPress {
    target: InteractionTarget,
    time_ms: u64,
}

#[derive(Debug)]
pub struct PointerDispatcher {
    double_click_ms: u64,
    capture: Option<Capture>,
    last_press: Option<LastPress>,
    hovered: Option<InteractionTarget>,
}

impl Default for PointerDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_DOUBLE_CLICK_MS)
    }
}

impl PointerDispatcher {
    pub fn new(double_click_ms: u64) -> Self {
        Self {
            double_click_ms,
            capture: None,
            last_press: None,
            hovered: None,
        }
    }

    pub fn is_captured(&self) -> bool {
        self.capture.is_some()
    }

    pub fn hovered(&self) -> Option<InteractionTarget> {
        self.hovered
    }

    /// Route one pointer event against `regions` (front to back).
    pub fn handle<B: RenderBackend + ?Sized>(
        &mut self,
        event: PointerEvent,
        regions: &[HitRegion],
        backend: &mut B,
    ) -> Vec<Dispatch> {
        match event {
            PointerEvent::Press { pos, time_ms } => self.press(pos, time_ms, regions, backend),
            PointerEvent::Move { pos } => self.moved(pos, regions, backend),
            PointerEvent::Release { pos } => self.release(pos, regions, backend),
        }
    }

    fn press<B: RenderBackend + ?Sized>(
        &mut self,
        pos: Position,
        time_ms: u64,
        regions: &[HitRegion],
        backend: &mut B,
    ) -> Vec<Dispatch> {
        // A press without a release in between restarts the gesture
        self.capture = None;
        let wanted = EventMask::CLICK | EventMask::DOUBLE_CLICK | EventMask::DRAG;
        let Some(region) = hit_test(regions, backend, pos, wanted) else {
            self.last_press = None;
            return Vec::new();
        };
        let target = region.target;

        let is_double = region.events.contains(EventMask::DOUBLE_CLICK)
            && self.last_press.is_some_and(|last| {
                last.target == target && time_ms.saturating_sub(last.time_ms) <= self.double_click_ms
            });
        self.last_press = if is_double {
            None
        } else {
            Some(LastPress { target, time_ms })
        };
        self.capture = Some(Capture {
            target,
            events: region.events,
            origin: pos,
            last: pos,
            dragging: false,
            consumed: is_double,
        });

        if is_double {
            debug!("Double click on {}", region.name);
            vec![Dispatch::DoubleClick { target, pos }]
        } else {
            vec![Dispatch::Press { target, pos }]
        }
    }

    fn moved<B: RenderBackend + ?Sized>(
        &mut self,
        pos: Position,
        regions: &[HitRegion],
        backend: &mut B,
    ) -> Vec<Dispatch> {
        let Some(capture) = self.capture.as_mut() else {
            let region = hit_test(regions, backend, pos, EventMask::HOVER);
            let target = region.map(|r| r.target);
            if target == self.hovered {
                return Vec::new();
            }
            self.hovered = target;
            return vec![Dispatch::Hover {
                target,
                cursor: region.map_or(Cursor::Default, |r| r.cursor),
            }];
        };

        if !capture.events.contains(EventMask::DRAG) {
            return Vec::new();
        }
        if !capture.dragging {
            if capture.origin.distance_to(pos) < DRAG_THRESHOLD {
                return Vec::new();
            }
            capture.dragging = true;
            // A drag never completes a double click
            self.last_press = None;
        }
        let delta = pos - capture.last;
        capture.last = pos;
        vec![Dispatch::Drag {
            target: capture.target,
            pos,
            delta,
        }]
    }

    fn release<B: RenderBackend + ?Sized>(
        &mut self,
        pos: Position,
        regions: &[HitRegion],
        backend: &mut B,
    ) -> Vec<Dispatch> {
        let Some(capture) = self.capture.take() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if !(capture.consumed && !capture.dragging) {
            out.push(Dispatch::Release {
                target: capture.target,
                pos,
                dragged: capture.dragging,
            });
        }
        // Regions of the captured subject travel with the pointer while dragged
        let over = regions
            .iter()
            .filter(|r| !same_subject(r.target, capture.target))
            .find(|r| r.contains(backend, pos));
        if let Some(over) = over {
            debug!("Released over {}", over.name);
            out.push(Dispatch::Drop {
                source: capture.target,
                over: over.target,
                pos,
                dragged: capture.dragging,
                accepts: over.events.contains(EventMask::DROP),
            });
        }
        out
    }
}

/// Whether two targets stand for the same step or the same path.
fn same_subject(a: InteractionTarget, b: InteractionTarget) -> bool {
    a == b
        || a.step().is_some_and(|step| b.step() == Some(step))
        || a.path().is_some_and(|path| b.path() == Some(path))
}
