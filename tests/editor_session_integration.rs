//! Integration tests for an interactive editing session
//!
//! Pointer events go through the [`Editor`] exactly as the canvas delivers
//! them; the resulting workspace is then saved and restored.

mod common;

use common::builders::{add_call, add_stop, number_types, SignatureBuilder};
use common::{param_ref, path_ref, start_of};
use procflow::frontend::demo_workspace;
use procflow::geometry::Position;
use procflow::interaction::scene::{add_stop_center, delete_zone_center};
use procflow::interaction::{Editor, Intent, PointerEvent};
use procflow::model::field::DataField;
use procflow::model::id::{ProcessId, Side, StepId};
use procflow::model::step::StepKind;
use procflow::{SoftwareBackend, Workspace, WorkspaceSnapshot};

const VIEWPORT: Position = Position::new(800.0, 600.0);

fn drag(editor: &mut Editor, from: Position, to: Position, time_ms: u64) {
    editor.pointer(PointerEvent::Press { pos: from, time_ms });
    editor.pointer(PointerEvent::Move {
        pos: from.lerp(to, 0.5),
    });
    editor.pointer(PointerEvent::Move { pos: to });
    editor.pointer(PointerEvent::Release { pos: to });
}

fn click(editor: &mut Editor, at: Position, time_ms: u64) -> Vec<Intent> {
    let mut intents = editor.pointer(PointerEvent::Press { pos: at, time_ms });
    intents.extend(editor.pointer(PointerEvent::Release { pos: at }));
    intents
}

struct Session {
    editor: Editor,
    helper: ProcessId,
    main: ProcessId,
    call: StepId,
}

/// A valid `Helper(a)` and a `Main` holding one unwired call to it.
fn session() -> Session {
    let mut t = number_types();
    let ws = &mut t.ws;
    let helper = ws
        .create_user_process("Helper", SignatureBuilder::new().input("a", t.number).build())
        .unwrap();
    let received = ws.add_variable(helper, DataField::new("received", t.number)).unwrap();
    let helper_start = start_of(ws, helper);
    ws.bind_variable(
        helper,
        param_ref(ws, helper, helper_start, Side::Output, "a"),
        received,
    )
    .unwrap();
    let helper_stop = add_stop(ws, helper, None, Position::new(320.0, 160.0));
    ws.connect_path(helper, path_ref(ws, helper, helper_start, None), helper_stop)
        .unwrap();

    let main = ws
        .create_user_process("Main", SignatureBuilder::new().build())
        .unwrap();
    let call = add_call(ws, main, helper, Position::new(320.0, 160.0));
    let x = ws.add_variable(main, DataField::new("x", t.number)).unwrap();
    ws.bind_variable(main, param_ref(ws, main, call, Side::Input, "a"), x)
        .unwrap();

    let mut editor = Editor::new(t.ws, 400, VIEWPORT);
    editor.open_process(main).unwrap();
    Session {
        editor,
        helper,
        main,
        call,
    }
}

fn route_midpoint(editor: &Editor, process: ProcessId, step: StepId) -> Position {
    let ws = editor.workspace();
    let path = path_ref(ws, process, step, None);
    ws.graph(process).unwrap().route(path).unwrap().midpoint()
}

fn new_stop(ws: &Workspace, process: ProcessId) -> StepId {
    ws.graph(process)
        .unwrap()
        .steps()
        .iter()
        .find(|s| matches!(s.kind, StepKind::Stop { .. }))
        .map(|s| s.unique_id)
        .unwrap()
}

#[test]
fn test_wire_process_with_pointer_gestures() {
    let mut s = session();
    assert!(!s.editor.workspace().is_valid());

    // Add a stop step from the fixed button
    assert!(click(&mut s.editor, add_stop_center(VIEWPORT), 0).is_empty());
    let stop = new_stop(s.editor.workspace(), s.main);

    // Start path onto the call, call path onto the stop
    let start = start_of(s.editor.workspace(), s.main);
    let from = route_midpoint(&s.editor, s.main, start);
    drag(&mut s.editor, from, Position::new(320.0, 160.0), 1000);
    let from = route_midpoint(&s.editor, s.main, s.call);
    let stop_at = s.editor.workspace().graph(s.main).unwrap().step(stop).unwrap().position();
    drag(&mut s.editor, from, stop_at, 2000);

    let ws = s.editor.workspace();
    let graph = ws.graph(s.main).unwrap();
    assert_eq!(graph.path(path_ref(ws, s.main, start, None)).unwrap().to(), Some(s.call));
    assert_eq!(graph.path(path_ref(ws, s.main, s.call, None)).unwrap().to(), Some(stop));
    assert!(ws.errors().is_empty());
    assert!(ws.is_valid(), "invalid: {:?}", ws.invalid_processes());

    // Double-clicking the call asks to open its process
    assert!(click(&mut s.editor, Position::new(320.0, 160.0), 5000).is_empty());
    assert_eq!(
        click(&mut s.editor, Position::new(320.0, 160.0), 5100),
        vec![Intent::OpenProcess(s.helper)]
    );
}

#[test]
fn test_dragging_call_to_delete_zone_invalidates_neighbours() {
    let mut s = session();
    let stop = s
        .editor
        .workspace_mut()
        .add_step(s.main, StepKind::Stop { path_name: None }, Position::new(520.0, 160.0))
        .unwrap();
    {
        let ws = s.editor.workspace_mut();
        let call_path = path_ref(ws, s.main, s.call, None);
        ws.connect_path(s.main, call_path, stop).unwrap();
    }
    s.editor.refresh();

    drag(
        &mut s.editor,
        Position::new(320.0, 160.0),
        delete_zone_center(VIEWPORT),
        0,
    );
    let graph = s.editor.workspace().graph(s.main).unwrap();
    assert!(graph.step(s.call).is_none());
    assert!(graph.step(stop).unwrap().incoming().is_empty());
    assert!(graph.find_variable("x").unwrap().links().is_empty());
}

#[test]
fn test_editor_draws_open_process() {
    let s = session();
    let mut backend = SoftwareBackend::new();
    s.editor.draw(&mut backend, true).unwrap();
    assert!(backend.texts().any(|t| t == "Helper"));
    assert!(backend.texts().any(|t| t == "a"));

    backend.clear();
    s.editor.draw(&mut backend, false).unwrap();
    assert!(backend.texts().any(|t| t == "Helper"));
    assert!(!backend.texts().any(|t| t == "a"));
}

#[test]
fn test_snapshot_round_trip_through_file() {
    let ws = demo_workspace().unwrap();
    assert!(ws.is_valid(), "demo invalid: {:?}", ws.invalid_processes());
    let snapshot = WorkspaceSnapshot::capture(&ws).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("workspace.json");
    snapshot.save(&path).unwrap();

    let restored = WorkspaceSnapshot::load(&path).unwrap().restore();
    assert!(restored.errors().is_empty(), "{:?}", restored.errors());
    assert!(restored.is_valid());
    let names = |ws: &Workspace| ws.processes().iter().map(|p| p.name.clone()).collect::<Vec<_>>();
    assert_eq!(names(&restored), names(&ws));
    assert_eq!(WorkspaceSnapshot::capture(&restored).unwrap(), snapshot);
}

#[test]
fn test_saving_refused_while_invalid() {
    let s = session();
    let err = WorkspaceSnapshot::capture(s.editor.workspace()).unwrap_err();
    assert!(err.to_string().contains("Main"), "{}", err);
}
