//! The editor window: menu, process sidebar, diagram canvas and dialogs.

use super::canvas::EguiCanvas;
use super::dialogs::{
    show_dialog, ParameterAction, ParameterContext, ParameterDialog, ParameterState,
    StopPathContext, StopPathDialog, StopPathState, VariableContext, VariableDialog,
    VariableState,
};
use super::status_bar::{render_status_bar, StatusBarContext};
use crate::config::{EditorConfig, WORKSPACE_FILE};
use crate::error::{EditorError, Result};
use crate::geometry::Position;
use crate::interaction::{Cursor, Editor, Intent, PointerEvent};
use crate::model::field::DataField;
use crate::model::id::{ParamId, ParamRef, PathRef, ProcessId, Side, StepId, TypeId, VariableRef};
use crate::model::process::Signature;
use crate::model::step::{Step, StepKind};
use crate::snapshot::WorkspaceSnapshot;
use crate::workspace::Workspace;
use egui::{Color32, CursorIcon, Ui};
use std::path::PathBuf;
use tracing::info;

/// Pending edits to the open process's signature.
#[derive(Debug, Default)]
struct SignatureForm {
    field_name: String,
    field_type: Option<TypeId>,
    field_side: Option<Side>,
    path_name: String,
}

pub struct EditorApp {
    editor: Editor,
    config: EditorConfig,
    workspace_path: Option<PathBuf>,
    last_error: Option<String>,
    last_pointer: Option<Position>,
    signature_form: SignatureForm,

    // === Dialogs ===
    parameter_open: bool,
    parameter_state: ParameterState,
    stop_path_open: bool,
    stop_path_state: StopPathState,
    variable_open: bool,
    variable_state: VariableState,
}

impl EditorApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: EditorConfig,
        workspace: Workspace,
        workspace_path: Option<PathBuf>,
    ) -> Self {
        let mut workspace = workspace;
        workspace.dangling_length = config.dangling_path_length;
        Self {
            editor: Editor::new(workspace, config.double_click_ms, config.canvas.viewport()),
            config,
            workspace_path,
            last_error: None,
            last_pointer: None,
            signature_form: SignatureForm::default(),
            parameter_open: false,
            parameter_state: ParameterState::default(),
            stop_path_open: false,
            stop_path_state: StopPathState::default(),
            variable_open: false,
            variable_state: VariableState::default(),
        }
    }

    fn report(&mut self, result: Result<()>) {
        if let Err(e) = result {
            self.last_error = Some(e.to_string());
        }
    }

    // ── Persistence ─────────────────────────────────────────────────────

    fn save_workspace(&mut self) -> Result<()> {
        let Some(path) = self.workspace_path.clone() else {
            return Ok(());
        };
        WorkspaceSnapshot::capture(self.editor.workspace())?.save(&path)?;
        info!("Saved workspace to {:?}", path);
        Ok(())
    }

    fn reload_workspace(&mut self) -> Result<()> {
        let Some(path) = self.workspace_path.clone() else {
            return Ok(());
        };
        let mut workspace = WorkspaceSnapshot::load(&path)?.restore();
        workspace.dangling_length = self.config.dangling_path_length;
        self.editor.replace_workspace(workspace);
        info!("Reloaded workspace from {:?}", path);
        Ok(())
    }

    fn new_process(&mut self) -> Result<()> {
        let workspace = self.editor.workspace_mut();
        let name = (1..)
            .map(|n| format!("Process {}", n))
            .find(|name| workspace.find_process(name).is_none())
            .unwrap_or_default();
        let id = workspace.create_user_process(&name, Signature::default())?;
        self.editor.open_process(id)
    }

    // ── Intents ─────────────────────────────────────────────────────────

    fn handle_intent(&mut self, intent: Intent) {
        let Some(process) = self.editor.current() else {
            return;
        };
        match intent {
            Intent::OpenProcess(id) => {
                let result = self.editor.open_process(id);
                self.report(result);
            }
            Intent::EditParameter(param) => {
                let binding = self
                    .editor
                    .workspace()
                    .graph(process)
                    .ok()
                    .and_then(|g| g.param(param))
                    .map(|(_, p)| (p.link(), p.fixed_value().map(str::to_string)));
                if let Some((link, fixed)) = binding {
                    self.parameter_state = ParameterState::for_param(param, link, fixed.as_deref());
                    self.parameter_open = true;
                }
            }
            Intent::EditStopPathName(step) => {
                let current = self
                    .editor
                    .workspace()
                    .graph(process)
                    .ok()
                    .and_then(|g| g.step(step))
                    .map(|s| s.stop_path_name().map(str::to_string));
                if let Some(current) = current {
                    self.stop_path_state = StopPathState::for_step(step, current.as_deref());
                    self.stop_path_open = true;
                }
            }
        }
    }

    fn apply_parameter(&mut self, process: ProcessId, action: ParameterAction) {
        let workspace = self.editor.workspace_mut();
        let result = match action {
            ParameterAction::Bind { param, variable } => {
                workspace.bind_variable(process, param, variable)
            }
            ParameterAction::SetFixed { param, value } => {
                workspace.set_fixed_value(process, param, &value)
            }
            ParameterAction::Clear(param) => workspace.clear_binding(process, param),
        };
        self.report(result);
        self.editor.refresh();
    }

    // ── Panels ──────────────────────────────────────────────────────────

    fn menu_bar(&mut self, ui: &mut Ui) {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Save Workspace").clicked() {
                    let result = self.save_workspace();
                    self.report(result);
                    ui.close();
                }
                if ui.button("Reload Workspace").clicked() {
                    let result = self.reload_workspace();
                    self.report(result);
                    ui.close();
                }
                ui.separator();
                if ui.button("Save Preferences").clicked() {
                    let result = self.config.save();
                    self.report(result);
                    ui.close();
                }
            });

            ui.menu_button("Process", |ui| {
                if ui.button("New Process").clicked() {
                    let result = self.new_process();
                    self.report(result);
                    ui.close();
                }
                ui.separator();
                let user: Vec<(ProcessId, String)> = self
                    .editor
                    .workspace()
                    .processes()
                    .iter()
                    .filter(|p| p.as_user().is_some())
                    .map(|p| (p.id, p.name.clone()))
                    .collect();
                for (id, name) in user {
                    let current = self.editor.current() == Some(id);
                    if ui.selectable_label(current, name).clicked() {
                        let result = self.editor.open_process(id);
                        self.report(result);
                        ui.close();
                    }
                }
            });

            ui.menu_button("Insert", |ui| {
                let callable: Vec<(ProcessId, String)> = self
                    .editor
                    .workspace()
                    .processes()
                    .iter()
                    .map(|p| (p.id, p.name.clone()))
                    .collect();
                for (id, name) in callable {
                    if ui.button(format!("Call {}", name)).clicked() {
                        self.insert_call(id);
                        ui.close();
                    }
                }
            });
        });
    }

    fn insert_call(&mut self, called: ProcessId) {
        let Some(process) = self.editor.current() else {
            return;
        };
        let viewport = self.editor.viewport();
        let at = Position::new(viewport.x / 2.0, viewport.y / 3.0);
        let result = self
            .editor
            .workspace_mut()
            .add_step(process, StepKind::ProcessCall { process: called }, at)
            .map(|_| ());
        self.report(result);
        self.editor.refresh();
    }

    fn side_panel(&mut self, ui: &mut Ui) {
        let Some(process) = self.editor.current() else {
            ui.label("No user process open");
            return;
        };

        ui.heading(self.editor.workspace().process_name(process).to_string());
        ui.separator();

        ui.label("Variables");
        let variables: Vec<_> = match self.editor.workspace().graph(process) {
            Ok(graph) => graph
                .variables()
                .iter()
                .map(|v| (v.id, v.name().to_string(), v.links().len()))
                .collect(),
            Err(_) => Vec::new(),
        };
        let highlighted = self.editor.workspace().highlighted();
        let mut remove = None;
        for (id, name, links) in variables {
            let variable = VariableRef {
                process,
                variable: id,
            };
            ui.horizontal(|ui| {
                let label = format!("{} ({} uses)", name, links);
                if ui
                    .selectable_label(highlighted == Some(variable), label)
                    .clicked()
                {
                    self.editor.workspace_mut().toggle_highlight(variable);
                }
                if ui.small_button("🗑").clicked() {
                    remove = Some(id);
                }
            });
        }
        if let Some(id) = remove {
            let result = self.editor.workspace_mut().remove_variable(process, id);
            self.report(result);
        }
        if ui.button("+ Add variable").clicked() {
            self.variable_open = true;
        }

        ui.separator();
        self.signature_panel(ui, process);
    }

    fn signature_panel(&mut self, ui: &mut Ui, process: ProcessId) {
        let Some(current) = self.editor.workspace().process(process) else {
            return;
        };
        let editable = current.is_signature_editable();
        let signature = current.signature.clone();
        let types: Vec<(TypeId, String)> = self
            .editor
            .workspace()
            .types
            .iter()
            .map(|t| (t.id, t.name.clone()))
            .collect();
        let type_name = |id: TypeId| {
            types
                .iter()
                .find(|(t, _)| *t == id)
                .map_or("?", |(_, n)| n.as_str())
        };

        ui.label("Signature");
        let mut edited: Option<Signature> = None;
        ui.add_enabled_ui(editable, |ui| {
            for (side, fields) in [(Side::Input, &signature.inputs), (Side::Output, &signature.outputs)] {
                for (index, field) in fields.iter().enumerate() {
                    ui.horizontal(|ui| {
                        let arrow = if side == Side::Input { "→" } else { "←" };
                        ui.label(format!("{} {} : {}", arrow, field.name, type_name(field.type_id)));
                        if ui.small_button("🗑").clicked() {
                            let mut next = signature.clone();
                            match side {
                                Side::Input => next.inputs.remove(index),
                                Side::Output => next.outputs.remove(index),
                            };
                            edited = Some(next);
                        }
                    });
                }
            }
            for (index, name) in signature.return_paths.iter().enumerate() {
                ui.horizontal(|ui| {
                    ui.label(format!("⤷ {}", name));
                    if ui.small_button("🗑").clicked() {
                        let mut next = signature.clone();
                        next.return_paths.remove(index);
                        edited = Some(next);
                    }
                });
            }

            let form = &mut self.signature_form;
            ui.horizontal(|ui| {
                ui.text_edit_singleline(&mut form.field_name);
                let selected = form.field_type.map_or("(type)", type_name);
                egui::ComboBox::from_id_salt("signature_field_type")
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        for (id, name) in &types {
                            ui.selectable_value(&mut form.field_type, Some(*id), name);
                        }
                    });
            });
            ui.horizontal(|ui| {
                for (side, label) in [(Side::Input, "Add input"), (Side::Output, "Add output")] {
                    if ui.button(label).clicked() {
                        form.field_side = Some(side);
                    }
                }
            });
            if let (Some(side), Some(type_id)) = (form.field_side.take(), form.field_type) {
                let mut next = signature.clone();
                let field = DataField::new(form.field_name.trim(), type_id);
                match side {
                    Side::Input => next.inputs.push(field),
                    Side::Output => next.outputs.push(field),
                }
                form.field_name.clear();
                edited = Some(next);
            }
            ui.horizontal(|ui| {
                ui.text_edit_singleline(&mut form.path_name);
                if ui.button("Add path").clicked() {
                    let mut next = signature.clone();
                    next.return_paths.push(form.path_name.trim().to_string());
                    form.path_name.clear();
                    edited = Some(next);
                }
            });
        });

        if let Some(next) = edited {
            let result = self
                .editor
                .workspace_mut()
                .set_signature(process, next)
                .map(|report| {
                    info!(
                        "Signature change touched {} steps",
                        report.changed_steps
                    );
                });
            self.report(result);
            self.editor.refresh();
        }
    }

    fn canvas(&mut self, ui: &mut Ui) {
        let zoom = self.config.canvas.zoom as f32;
        let size = ui.available_size();
        let (response, painter) = ui.allocate_painter(size, egui::Sense::click_and_drag());
        let rect = response.rect;
        let background = if self.config.ui_preferences.dark_mode {
            Color32::from_gray(40)
        } else {
            Color32::from_gray(235)
        };
        painter.rect_filled(rect, 0.0, background);
        let origin = rect.min;
        self.editor
            .set_viewport(EguiCanvas::to_diagram(origin, zoom, rect.max));

        let (latest, pressed, released, time) = ui.input(|i| {
            (
                i.pointer.latest_pos(),
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.time,
            )
        });
        let mut intents = Vec::new();
        if let Some(screen) = latest {
            let pos = EguiCanvas::to_diagram(origin, zoom, screen);
            let inside = rect.contains(screen);
            if pressed && inside {
                intents.extend(self.editor.pointer(PointerEvent::Press {
                    pos,
                    time_ms: (time * 1000.0) as u64,
                }));
            }
            if self.last_pointer != Some(pos) {
                self.last_pointer = Some(pos);
                intents.extend(self.editor.pointer(PointerEvent::Move { pos }));
            }
            if released {
                intents.extend(self.editor.pointer(PointerEvent::Release { pos }));
            }
        }

        let mut canvas = EguiCanvas::new(&painter, origin, zoom);
        let labels = self.config.ui_preferences.show_parameter_labels;
        if let Err(e) = self.editor.draw(&mut canvas, labels) {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                e.to_string(),
                egui::FontId::proportional(14.0),
                Color32::GRAY,
            );
        }
        if response.hovered() {
            ui.ctx().set_cursor_icon(cursor_icon(self.editor.cursor()));
        }

        for intent in intents {
            self.handle_intent(intent);
        }
    }

    fn dialogs(&mut self, ctx: &egui::Context) {
        let Some(process) = self.editor.current() else {
            return;
        };
        let workspace = self.editor.workspace();
        let Ok(graph) = workspace.graph(process) else {
            return;
        };

        let param = self
            .parameter_state
            .param
            .and_then(|p| graph.param(p));
        let parameter_action = match param {
            Some((side, param)) => show_dialog::<ParameterDialog>(
                ctx,
                &mut self.parameter_open,
                &mut self.parameter_state,
                ParameterContext {
                    name: param.name(),
                    side,
                    type_name: workspace.types.name_of(param.type_id()),
                    variables: graph
                        .variables()
                        .iter()
                        .map(|v| (v.id, v.name()))
                        .collect(),
                },
            ),
            None => {
                self.parameter_open = false;
                None
            }
        };

        let names = workspace
            .process(process)
            .map(|p| p.signature.return_paths.clone())
            .unwrap_or_default();
        let stop_action = show_dialog::<StopPathDialog>(
            ctx,
            &mut self.stop_path_open,
            &mut self.stop_path_state,
            StopPathContext { names: &names },
        );

        let variable_action = show_dialog::<VariableDialog>(
            ctx,
            &mut self.variable_open,
            &mut self.variable_state,
            VariableContext {
                types: workspace
                    .types
                    .iter()
                    .map(|t| (t.id, t.name.as_str()))
                    .collect(),
            },
        );

        if let Some(action) = parameter_action {
            self.apply_parameter(process, action);
        }
        if let Some(action) = stop_action {
            let result = self
                .editor
                .workspace_mut()
                .set_stop_path_name(process, action.step, action.name);
            self.report(result);
        }
        if let Some(action) = variable_action {
            let mut field = DataField::new(action.name, action.type_id);
            field.initial_value = action.initial_value;
            let result = self
                .editor
                .workspace_mut()
                .add_variable(process, field)
                .map(|_| ());
            self.report(result);
        }
    }

    fn drain_errors(&mut self) {
        if let Some(error) = self.editor.workspace_mut().take_errors().pop() {
            self.last_error = Some(error);
        }
    }
}

fn cursor_icon(cursor: Cursor) -> CursorIcon {
    match cursor {
        Cursor::Default => CursorIcon::Default,
        Cursor::Pointer => CursorIcon::PointingHand,
        Cursor::Grab => CursorIcon::Grab,
        Cursor::Text => CursorIcon::Text,
        Cursor::NotAllowed => CursorIcon::NotAllowed,
    }
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| self.menu_bar(ui));

        self.drain_errors();
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            let workspace = self.editor.workspace();
            let invalid = workspace.invalid_processes();
            let highlighted = workspace.highlighted().and_then(|h| {
                workspace
                    .graph(h.process)
                    .ok()
                    .and_then(|g| g.variable(h.variable))
                    .map(|v| v.name())
            });
            render_status_bar(
                ui,
                &StatusBarContext {
                    process_name: self.editor.current().map(|p| workspace.process_name(p)),
                    invalid_processes: &invalid,
                    highlighted,
                    last_error: self.last_error.as_deref(),
                },
            );
        });

        egui::SidePanel::left("process_panel")
            .default_width(240.0)
            .show(ctx, |ui| self.side_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.canvas(ui));

        self.dialogs(ctx);
    }
}

/// A small workspace to start from when nothing has been saved yet.
pub fn demo_workspace() -> Result<Workspace> {
    let mut ws = Workspace::new();
    let text = ws.types.add("Text", [90, 160, 90, 255], Some(".*"), None)?;
    let number = ws
        .types
        .add("Number", [70, 120, 200, 255], Some(r"-?\d+(\.\d+)?"), Some(text))?;

    let print = ws.add_system_process(
        "Print",
        Signature::new(vec![DataField::new("message", text)], vec![], vec![]),
    )?;
    let check = ws.create_user_process(
        "Check",
        Signature::new(
            vec![DataField::new("value", number)],
            vec![],
            vec!["ok".to_string(), "fail".to_string()],
        ),
    )?;
    let ok = ws.add_step(
        check,
        StepKind::Stop {
            path_name: Some("ok".to_string()),
        },
        Position::new(380.0, 160.0),
    )?;
    let check_start = start_of(&ws, check)?;
    connect_named(&mut ws, check, check_start, None, ok)?;
    let received = ws.add_variable(check, DataField::new("received", number))?;
    let graph = ws.graph(check)?;
    if let Some(param) = param_named(graph.step(check_start), Side::Output, "value") {
        ws.bind_variable(check, ParamRef { step: check_start, param }, received)?;
    }

    let main = ws.create_user_process("Main", Signature::default())?;
    let count = ws.add_variable(main, DataField::new("count", number))?;
    let call = ws.add_step(main, StepKind::ProcessCall { process: check }, Position::new(340.0, 160.0))?;
    let log = ws.add_step(main, StepKind::ProcessCall { process: print }, Position::new(340.0, 360.0))?;
    let done = ws.add_step(main, StepKind::Stop { path_name: None }, Position::new(620.0, 260.0))?;

    let main_start = start_of(&ws, main)?;
    connect_named(&mut ws, main, main_start, None, call)?;
    connect_named(&mut ws, main, call, Some("ok"), done)?;
    connect_named(&mut ws, main, call, Some("fail"), log)?;
    connect_named(&mut ws, main, log, None, done)?;

    let graph = ws.graph(main)?;
    let value = param_named(graph.step(call), Side::Input, "value");
    let message = param_named(graph.step(log), Side::Input, "message");
    if let Some(param) = value {
        ws.bind_variable(main, ParamRef { step: call, param }, count)?;
    }
    if let Some(param) = message {
        ws.set_fixed_value(main, ParamRef { step: log, param }, "check failed")?;
    }
    info!("Built demo workspace with {} processes", ws.processes().len());
    Ok(ws)
}

fn start_of(ws: &Workspace, process: ProcessId) -> Result<StepId> {
    ws.graph(process)?
        .start_step()
        .map(|s| s.unique_id)
        .ok_or_else(|| EditorError::UnknownStep(format!("start of {}", process)))
}

fn param_named(step: Option<&Step>, side: Side, name: &str) -> Option<ParamId> {
    step?.find_param_by_name(side, name).map(|p| p.id)
}

/// Connect the path of `from` called `name` (or its only path) to `to`.
fn connect_named(
    ws: &mut Workspace,
    process: ProcessId,
    from: StepId,
    name: Option<&str>,
    to: StepId,
) -> Result<()> {
    let path = ws
        .graph(process)?
        .step(from)
        .and_then(|s| s.return_paths.iter().find(|p| p.name.as_deref() == name))
        .map(|p| p.id)
        .ok_or_else(|| EditorError::UnknownPath(name.unwrap_or("default").to_string()))?;
    ws.connect_path(process, PathRef { step: from, path }, to)
}

/// Default location of the saved workspace.
pub fn default_workspace_path() -> Option<PathBuf> {
    crate::config::app_data_dir().map(|dir| dir.join(WORKSPACE_FILE))
}
