//! Region collection and drawing for one user process.
//!
//! Regions are collected front to back: the fixed buttons, then paths (last
//! drawn first), then steps (topmost first). Drawing walks the same items in
//! the opposite order so that whatever is hit first is also painted last.

use super::region::{Cursor, EventMask, HitRegion, InteractionTarget};
use crate::error::Result;
use crate::geometry::Position;
use crate::graph::UserProcess;
use crate::layout::connector::{ConnectorDisplay, CONNECTOR_DOT_RADIUS};
use crate::layout::routing::PATH_LABEL_FONT_SIZE;
use crate::layout::shape::TERMINAL_RADIUS;
use crate::model::id::{ParamRef, PathRef, ProcessId, Side, VariableRef};
use crate::model::step::{Step, StepKind};
use crate::render::outline::Outline;
use crate::render::{Color, RenderBackend, TextAnchor};
use crate::workspace::Workspace;

pub const BUTTON_RADIUS: f64 = 16.0;
pub const BUTTON_MARGIN: f64 = 36.0;
pub const DELETE_ZONE_HALF_SIZE: f64 = 24.0;
pub const STEP_NAME_FONT_SIZE: f64 = 12.0;
pub const CONNECTOR_FONT_SIZE: f64 = 10.0;
/// Gap between a stop step's body and its path-name label.
pub const STOP_LABEL_GAP: f64 = 14.0;
/// Shown under a stop step that has not picked a path name yet.
pub const STOP_LABEL_PLACEHOLDER: &str = "(choose path)";

// ── Palette ─────────────────────────────────────────────────────────────

const BODY_FILL: Color = [250, 250, 250, 255];
const BODY_STROKE: Color = [60, 60, 60, 255];
const INVALID_STROKE: Color = [200, 40, 40, 255];
const TEXT: Color = [30, 30, 30, 255];
const PATH_STROKE: Color = [70, 70, 90, 255];
const DUPLICATE_STROKE: Color = [220, 130, 20, 255];
const HIGHLIGHT: Color = [40, 120, 220, 255];
const BUTTON_FILL: Color = [225, 235, 245, 255];
const DELETE_FILL: Color = [245, 220, 220, 255];
const UNKNOWN_TYPE: Color = [128, 128, 128, 255];

/// Centre of the add-stop-step button.
pub fn add_stop_center(_viewport: Position) -> Position {
    Position::new(BUTTON_MARGIN, BUTTON_MARGIN)
}

/// Centre of the delete zone, pinned to the bottom-right corner.
pub fn delete_zone_center(viewport: Position) -> Position {
    Position::new(viewport.x - BUTTON_MARGIN, viewport.y - BUTTON_MARGIN)
}

fn fixed_regions(viewport: Position) -> [HitRegion; 2] {
    [
        HitRegion::new(
            "add stop step",
            Outline::circle(add_stop_center(viewport), BUTTON_RADIUS),
            Cursor::Pointer,
            InteractionTarget::AddStopStep,
            EventMask::HOVER | EventMask::CLICK,
        ),
        HitRegion::new(
            "delete zone",
            Outline::centered_rect(
                delete_zone_center(viewport),
                DELETE_ZONE_HALF_SIZE,
                DELETE_ZONE_HALF_SIZE,
            ),
            Cursor::NotAllowed,
            InteractionTarget::DeleteZone,
            EventMask::HOVER | EventMask::DROP,
        ),
    ]
}

/// Whether paths leaving `step` are told apart by name.
fn step_has_named_paths(workspace: &Workspace, step: &Step) -> bool {
    step.governing_process()
        .and_then(|id| workspace.process(id))
        .is_some_and(|p| p.signature.has_named_paths())
}

fn step_title<'a>(workspace: &'a Workspace, step: &Step) -> &'a str {
    match &step.kind {
        StepKind::ProcessCall { process } => workspace.process_name(*process),
        kind => kind.display_name(),
    }
}

fn stop_label_text(step: &Step) -> &str {
    step.stop_path_name().unwrap_or(STOP_LABEL_PLACEHOLDER)
}

fn stop_label_center(step: &Step) -> Position {
    step.position() + Position::new(0.0, TERMINAL_RADIUS + STOP_LABEL_GAP)
}

fn stop_label_outline<B: RenderBackend + ?Sized>(backend: &B, step: &Step) -> Outline {
    let width = backend.measure_text(stop_label_text(step), PATH_LABEL_FONT_SIZE);
    Outline::centered_rect(stop_label_center(step), width / 2.0 + 4.0, PATH_LABEL_FONT_SIZE * 0.8)
}

/// Every interactive region of `process`, front to back.
pub fn collect_regions<B: RenderBackend + ?Sized>(
    workspace: &Workspace,
    process: ProcessId,
    backend: &B,
    viewport: Position,
) -> Result<Vec<HitRegion>> {
    let graph = workspace.graph(process)?;
    let parent_named = workspace
        .process(process)
        .is_some_and(|p| p.signature.has_named_paths());
    let mut regions: Vec<HitRegion> = fixed_regions(viewport).into_iter().collect();

    // Paths sit above steps; within them, later steps' paths are on top
    for step in graph.steps().iter().rev() {
        let named = step_has_named_paths(workspace, step);
        for path in step.return_paths.iter().rev() {
            let path_ref = PathRef {
                step: step.unique_id,
                path: path.id,
            };
            let Some(route) = graph.route(path_ref) else {
                continue;
            };
            if !path.is_connected() {
                regions.push(HitRegion::new(
                    format!("dangling end {}", path_ref.path),
                    route.dangling_handle_outline(),
                    Cursor::Grab,
                    InteractionTarget::DanglingEnd(path_ref),
                    EventMask::HOVER | EventMask::DRAG,
                ));
            }
            regions.push(HitRegion::new(
                format!("arrow {}", path_ref.path),
                route.arrow_outline(),
                Cursor::Grab,
                InteractionTarget::PathArrow(path_ref),
                EventMask::HOVER | EventMask::DRAG,
            ));
            if let Some(label) = path.display_label(named) {
                let width = backend.measure_text(label, PATH_LABEL_FONT_SIZE);
                regions.push(HitRegion::new(
                    format!("label {}", path_ref.path),
                    route.label_outline(width),
                    Cursor::Grab,
                    InteractionTarget::PathLabel(path_ref),
                    EventMask::HOVER | EventMask::DRAG,
                ));
            }
        }
    }

    for step in graph.steps().iter().rev() {
        let center = step.position();
        for connector in &step.layout().connectors {
            regions.push(HitRegion::new(
                format!("connector {}", connector.param),
                connector.region_outline(center),
                Cursor::Pointer,
                InteractionTarget::Connector(ParamRef {
                    step: step.unique_id,
                    param: connector.param,
                }),
                EventMask::HOVER | EventMask::CLICK | EventMask::DOUBLE_CLICK,
            ));
        }
        if matches!(step.kind, StepKind::Stop { .. }) && parent_named {
            regions.push(HitRegion::new(
                format!("stop label {}", step.unique_id),
                stop_label_outline(backend, step),
                Cursor::Text,
                InteractionTarget::StopLabel(step.unique_id),
                EventMask::HOVER | EventMask::CLICK | EventMask::DOUBLE_CLICK,
            ));
        }
        let shape = step.shape();
        regions.push(HitRegion::new(
            format!("step {}", step.unique_id),
            shape.outline(center),
            Cursor::Grab,
            InteractionTarget::StepBody(step.unique_id),
            EventMask::HOVER
                | EventMask::CLICK
                | EventMask::DOUBLE_CLICK
                | EventMask::DRAG
                | EventMask::DROP,
        ));
        regions.push(HitRegion::new(
            format!("footprint {}", step.unique_id),
            shape.collision_outline(center),
            Cursor::Default,
            InteractionTarget::StepCollision(step.unique_id),
            EventMask::DROP,
        ));
    }

    Ok(regions)
}

// ── Drawing ─────────────────────────────────────────────────────────────

fn paint<B: RenderBackend + ?Sized>(
    backend: &mut B,
    outline: &Outline,
    fill: Option<Color>,
    stroke: Option<(Color, f64)>,
) {
    backend.begin_path();
    outline.replay(backend);
    if let Some(color) = fill {
        backend.fill(color);
    }
    if let Some((color, width)) = stroke {
        backend.stroke(color, width);
    }
}

/// Presentation switches for [`draw_process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawOptions {
    /// Drawn with a heavier outline.
    pub hovered: Option<InteractionTarget>,
    /// Parameter names next to connectors. Highlighted ones are always shown.
    pub parameter_labels: bool,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            hovered: None,
            parameter_labels: true,
        }
    }
}

/// Paint `process` back to front.
pub fn draw_process<B: RenderBackend + ?Sized>(
    workspace: &Workspace,
    process: ProcessId,
    backend: &mut B,
    viewport: Position,
    options: DrawOptions,
) -> Result<()> {
    let hovered = options.hovered;
    let graph = workspace.graph(process)?;
    let parent_named = workspace
        .process(process)
        .is_some_and(|p| p.signature.has_named_paths());

    let steps = StepPaint {
        workspace,
        process,
        graph,
        parent_named,
        options,
    };
    for step in graph.steps() {
        steps.draw_step(step, backend);
    }

    for step in graph.steps() {
        let named = step_has_named_paths(workspace, step);
        for path in &step.return_paths {
            let path_ref = PathRef {
                step: step.unique_id,
                path: path.id,
            };
            let Some(route) = graph.route(path_ref) else {
                continue;
            };
            let color = if path.duplicate_name {
                DUPLICATE_STROKE
            } else {
                PATH_STROKE
            };
            let width = if hovered.and_then(|t| t.path()) == Some(path_ref) {
                2.5
            } else {
                1.5
            };
            paint(backend, &route.curve_outline(), None, Some((color, width)));
            paint(backend, &route.arrow_outline(), Some(color), None);
            if let Some(label) = path.display_label(named) {
                let placement = route.label_placement();
                backend.save();
                backend.translate(placement.anchor_point.x, placement.anchor_point.y);
                backend.rotate(placement.rotation);
                backend.fill_text(
                    label,
                    0.0,
                    0.0,
                    placement.text_anchor,
                    PATH_LABEL_FONT_SIZE,
                    color,
                );
                backend.restore();
            }
            if !path.is_connected() {
                paint(
                    backend,
                    &route.dangling_handle_outline(),
                    Some(BODY_FILL),
                    Some((INVALID_STROKE, 1.5)),
                );
            }
        }
    }

    let [add, delete] = fixed_regions(viewport);
    paint(backend, &add.outline, Some(BUTTON_FILL), Some((BODY_STROKE, 1.0)));
    let center = add_stop_center(viewport);
    backend.fill_text("+", center.x, center.y, TextAnchor::Middle, 18.0, TEXT);
    paint(backend, &delete.outline, Some(DELETE_FILL), Some((INVALID_STROKE, 1.0)));
    let center = delete_zone_center(viewport);
    backend.fill_text("×", center.x, center.y, TextAnchor::Middle, 18.0, INVALID_STROKE);
    Ok(())
}

/// State shared by every step painted in one [`draw_process`] pass.
struct StepPaint<'a> {
    workspace: &'a Workspace,
    process: ProcessId,
    graph: &'a UserProcess,
    /// The edited process declares named return paths.
    parent_named: bool,
    options: DrawOptions,
}

impl StepPaint<'_> {
    fn draw_step<B: RenderBackend + ?Sized>(&self, step: &Step, backend: &mut B) {
        let center = step.position();
        let stroke = if step.is_valid() {
            BODY_STROKE
        } else {
            INVALID_STROKE
        };
        let hovered = self.options.hovered == Some(InteractionTarget::StepBody(step.unique_id));
        let width = if hovered { 2.5 } else { 1.5 };
        paint(
            backend,
            &step.shape().outline(center),
            Some(BODY_FILL),
            Some((stroke, width)),
        );
        backend.fill_text(
            step_title(self.workspace, step),
            center.x,
            center.y,
            TextAnchor::Middle,
            STEP_NAME_FONT_SIZE,
            TEXT,
        );

        for connector in &step.layout().connectors {
            self.draw_connector(step, connector, backend);
        }

        if matches!(step.kind, StepKind::Stop { .. }) && self.parent_named {
            let at = stop_label_center(step);
            backend.fill_text(
                stop_label_text(step),
                at.x,
                at.y,
                TextAnchor::Middle,
                PATH_LABEL_FONT_SIZE,
                TEXT,
            );
        }
    }

    fn draw_connector<B: RenderBackend + ?Sized>(
        &self,
        step: &Step,
        connector: &ConnectorDisplay,
        backend: &mut B,
    ) {
        let Some((_, param)) = step.find_param(connector.param) else {
            return;
        };
        let center = step.position();
        let color = self
            .workspace
            .types
            .get(param.type_id())
            .map_or(UNKNOWN_TYPE, |t| t.color);

        let stub = Outline::new()
            .move_to(center + connector.stub_start)
            .line_to(center + connector.stub_end);
        paint(backend, &stub, None, Some((color, 2.0)));
        let dot = Outline::circle(center + connector.stub_end, CONNECTOR_DOT_RADIUS);
        // Unbound inputs are drawn hollow
        let filled = param.is_bound() || connector.side == Side::Output;
        paint(
            backend,
            &dot,
            Some(if filled { color } else { BODY_FILL }),
            Some((color, 1.5)),
        );

        let process = self.process;
        let highlighted = param.link().is_some_and(|variable| {
            self.workspace.highlighted() == Some(VariableRef { process, variable })
        });
        if !(self.options.parameter_labels || highlighted) {
            return;
        }
        let variable_name = param
            .link()
            .and_then(|v| self.graph.variable(v))
            .map(|v| v.name());
        let text = ConnectorDisplay::label(param, variable_name, highlighted);
        let at = center + connector.label_offset;
        backend.fill_text(
            &text,
            at.x,
            at.y,
            connector.label_anchor,
            CONNECTOR_FONT_SIZE,
            if highlighted { HIGHLIGHT } else { TEXT },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::region::hit_test;
    use crate::model::field::DataField;
    use crate::model::process::Signature;
    use crate::render::software::{DrawCommand, SoftwareBackend};

    const VIEWPORT: Position = Position::new(800.0, 600.0);

    struct Scene {
        ws: Workspace,
        main: ProcessId,
        start: crate::model::id::StepId,
        stop: crate::model::id::StepId,
    }

    fn scene() -> Scene {
        let mut ws = Workspace::new();
        let main = ws.create_user_process("Main", Signature::default()).unwrap();
        let stop = ws
            .add_step(main, StepKind::Stop { path_name: None }, Position::new(420.0, 160.0))
            .unwrap();
        let start = ws.graph(main).unwrap().start_step().unwrap().unique_id;
        let path = PathRef {
            step: start,
            path: ws.graph(main).unwrap().step(start).unwrap().return_paths[0].id,
        };
        ws.connect_path(main, path, stop).unwrap();
        ws.refresh_routes();
        Scene {
            ws,
            main,
            start,
            stop,
        }
    }

    #[test]
    fn test_regions_start_with_fixed_buttons() {
        let s = scene();
        let backend = SoftwareBackend::new();
        let regions = collect_regions(&s.ws, s.main, &backend, VIEWPORT).unwrap();
        assert_eq!(regions[0].target, InteractionTarget::AddStopStep);
        assert_eq!(regions[1].target, InteractionTarget::DeleteZone);
        // One arrow, no dangling end, no label; two bodies, two footprints
        assert_eq!(regions.len(), 2 + 1 + 4);
    }

    #[test]
    fn test_body_and_footprint_hits() {
        let s = scene();
        let mut backend = SoftwareBackend::new();
        let regions = collect_regions(&s.ws, s.main, &backend, VIEWPORT).unwrap();

        let body = hit_test(&regions, &mut backend, Position::new(420.0, 160.0), EventMask::CLICK)
            .unwrap();
        assert_eq!(body.target, InteractionTarget::StepBody(s.stop));

        let near = Position::new(420.0, 160.0 + TERMINAL_RADIUS + 5.0);
        assert!(hit_test(&regions, &mut backend, near, EventMask::CLICK).is_none());
        let drop = hit_test(&regions, &mut backend, near, EventMask::DROP).unwrap();
        assert_eq!(drop.target, InteractionTarget::StepCollision(s.stop));
    }

    #[test]
    fn test_arrow_hit_at_route_midpoint() {
        let s = scene();
        let mut backend = SoftwareBackend::new();
        let regions = collect_regions(&s.ws, s.main, &backend, VIEWPORT).unwrap();
        let graph = s.ws.graph(s.main).unwrap();
        let path = PathRef {
            step: s.start,
            path: graph.step(s.start).unwrap().return_paths[0].id,
        };
        let mid = graph.route(path).unwrap().midpoint();
        let hit = hit_test(&regions, &mut backend, mid, EventMask::DRAG).unwrap();
        assert_eq!(hit.target, InteractionTarget::PathArrow(path));
    }

    #[test]
    fn test_dangling_path_exposes_end_handle() {
        let mut s = scene();
        s.ws.remove_step(s.main, s.stop).unwrap();
        s.ws.refresh_routes();
        let backend = SoftwareBackend::new();
        let regions = collect_regions(&s.ws, s.main, &backend, VIEWPORT).unwrap();
        assert!(regions
            .iter()
            .any(|r| matches!(r.target, InteractionTarget::DanglingEnd(_))));
    }

    #[test]
    fn test_stop_label_only_with_named_paths() {
        let mut ws = Workspace::new();
        let sig = Signature::new(vec![], vec![], vec!["ok".to_string()]);
        let main = ws.create_user_process("Main", sig).unwrap();
        let stop = ws
            .add_step(main, StepKind::Stop { path_name: None }, Position::new(300.0, 300.0))
            .unwrap();
        let backend = SoftwareBackend::new();
        let regions = collect_regions(&ws, main, &backend, VIEWPORT).unwrap();
        assert!(regions
            .iter()
            .any(|r| r.target == InteractionTarget::StopLabel(stop)));

        let s = scene();
        let regions = collect_regions(&s.ws, s.main, &backend, VIEWPORT).unwrap();
        assert!(!regions
            .iter()
            .any(|r| matches!(r.target, InteractionTarget::StopLabel(_))));
    }

    #[test]
    fn test_draw_names_steps() {
        let s = scene();
        let mut backend = SoftwareBackend::new();
        draw_process(&s.ws, s.main, &mut backend, VIEWPORT, DrawOptions::default()).unwrap();
        let texts: Vec<_> = backend.texts().collect();
        assert!(texts.contains(&"Start"));
        assert!(texts.contains(&"Stop"));
    }

    #[test]
    fn test_hovered_step_drawn_heavier() {
        let s = scene();
        let heavy = |backend: &SoftwareBackend| {
            backend
                .commands()
                .iter()
                .filter(|c| matches!(c, DrawCommand::Stroke { width, .. } if *width == 2.5))
                .count()
        };
        let mut backend = SoftwareBackend::new();
        draw_process(&s.ws, s.main, &mut backend, VIEWPORT, DrawOptions::default()).unwrap();
        assert_eq!(heavy(&backend), 0);

        let hovered = DrawOptions {
            hovered: Some(InteractionTarget::StepBody(s.stop)),
            ..DrawOptions::default()
        };
        backend.clear();
        draw_process(&s.ws, s.main, &mut backend, VIEWPORT, hovered).unwrap();
        assert_eq!(heavy(&backend), 1);
    }

    #[test]
    fn test_highlight_expands_connector_label() {
        let mut ws = Workspace::new();
        let number = ws.types.add("Number", [0, 0, 255, 255], Some(r"\d+"), None).unwrap();
        let helper = ws
            .add_system_process(
                "Helper",
                Signature::new(vec![DataField::new("a", number)], vec![], vec![]),
            )
            .unwrap();
        let main = ws.create_user_process("Main", Signature::default()).unwrap();
        let call = ws
            .add_step(main, StepKind::ProcessCall { process: helper }, Position::new(300.0, 200.0))
            .unwrap();
        let x = ws.add_variable(main, DataField::new("x", number)).unwrap();
        let param = ParamRef {
            step: call,
            param: ws.graph(main).unwrap().step(call).unwrap().inputs[0].id,
        };
        ws.bind_variable(main, param, x).unwrap();
        ws.refresh_routes();

        let mut backend = SoftwareBackend::new();
        draw_process(&ws, main, &mut backend, VIEWPORT, DrawOptions::default()).unwrap();
        assert!(backend.texts().any(|t| t == "a"));
        assert!(backend.texts().any(|t| t == "Helper"));

        ws.highlight_variable(Some(VariableRef {
            process: main,
            variable: x,
        }));
        backend.clear();
        draw_process(&ws, main, &mut backend, VIEWPORT, DrawOptions::default()).unwrap();
        assert!(backend.texts().any(|t| t == "a = x"));

        let hidden = DrawOptions {
            parameter_labels: false,
            ..DrawOptions::default()
        };
        ws.highlight_variable(None);
        backend.clear();
        draw_process(&ws, main, &mut backend, VIEWPORT, hidden).unwrap();
        assert!(!backend.texts().any(|t| t == "a"));
    }
}
