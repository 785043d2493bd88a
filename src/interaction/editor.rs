//! Process editor: applies pointer gestures to the workspace.
//!
//! Every dispatched gesture goes through [`Editor::apply`], a single match
//! over `(gesture, target)`. Edits that fail land in the workspace error sink
//! and leave the graph as it was. Requests the editor cannot satisfy on its
//! own (opening another process, editing a binding, choosing a stop path
//! name) come back to the host as [`Intent`]s.

use super::dispatch::{Dispatch, PointerDispatcher, PointerEvent};
use super::region::{Cursor, HitRegion, InteractionTarget};
use super::scene::{collect_regions, draw_process, DrawOptions};
use crate::error::{EditorError, Result};
use crate::geometry::Position;
use crate::model::id::{ParamRef, PathRef, ProcessId, StepId, VariableRef};
use crate::model::step::StepKind;
use crate::render::software::SoftwareBackend;
use crate::render::RenderBackend;
use crate::workspace::Workspace;
use tracing::debug;

/// Requests handed back to the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    OpenProcess(ProcessId),
    EditParameter(ParamRef),
    EditStopPathName(StepId),
}

#[derive(Debug)]
pub struct Editor {
    workspace: Workspace,
    current: Option<ProcessId>,
    dispatcher: PointerDispatcher,
    /// Hit queries run against flattened outlines.
    backend: SoftwareBackend,
    viewport: Position,
    hovered: Option<InteractionTarget>,
    cursor: Cursor,
    /// Step centre relative to the pointer while dragging a step.
    grab_offset: Position,
}

impl Editor {
    pub fn new(workspace: Workspace, double_click_ms: u64, viewport: Position) -> Self {
        let mut editor = Self {
            workspace,
            current: None,
            dispatcher: PointerDispatcher::new(double_click_ms),
            backend: SoftwareBackend::new(),
            viewport,
            hovered: None,
            cursor: Cursor::Default,
            grab_offset: Position::ZERO,
        };
        editor.current = editor.first_user_process();
        editor.workspace.refresh_routes();
        editor
    }

    fn first_user_process(&self) -> Option<ProcessId> {
        self.workspace
            .processes()
            .iter()
            .find(|p| p.as_user().is_some())
            .map(|p| p.id)
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Direct access for form edits. Call [`Editor::refresh`] afterwards.
    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    /// Swap in another workspace, e.g. after loading a file.
    pub fn replace_workspace(&mut self, workspace: Workspace) {
        self.workspace = workspace;
        self.current = self.first_user_process();
        self.hovered = None;
        self.cursor = Cursor::Default;
        self.refresh();
    }

    pub fn current(&self) -> Option<ProcessId> {
        self.current
    }

    pub fn open_process(&mut self, process: ProcessId) -> Result<()> {
        self.workspace.graph(process)?;
        debug!("Opening process '{}'", self.workspace.process_name(process));
        self.current = Some(process);
        self.hovered = None;
        self.workspace.highlight_variable(None);
        self.refresh();
        Ok(())
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn hovered(&self) -> Option<InteractionTarget> {
        self.hovered
    }

    pub fn viewport(&self) -> Position {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Position) {
        self.viewport = viewport;
    }

    /// Bring cached routes up to date after edits made outside the editor.
    pub fn refresh(&mut self) {
        self.workspace.refresh_routes();
    }

    /// Interactive regions of the open process, front to back.
    pub fn regions(&self) -> Result<Vec<HitRegion>> {
        let process = self.current_process()?;
        collect_regions(&self.workspace, process, &self.backend, self.viewport)
    }

    pub fn draw<B: RenderBackend + ?Sized>(&self, backend: &mut B, parameter_labels: bool) -> Result<()> {
        let process = self.current_process()?;
        let options = DrawOptions {
            hovered: self.hovered,
            parameter_labels,
        };
        draw_process(&self.workspace, process, backend, self.viewport, options)
    }

    fn current_process(&self) -> Result<ProcessId> {
        self.current
            .ok_or_else(|| EditorError::UnknownProcess("no process open".to_string()))
    }

    /// Feed one pointer event through the dispatcher and apply the result.
    pub fn pointer(&mut self, event: PointerEvent) -> Vec<Intent> {
        let regions = match self.regions() {
            Ok(regions) => regions,
            Err(_) => return Vec::new(),
        };
        let dispatches = self.dispatcher.handle(event, &regions, &mut self.backend);
        dispatches
            .into_iter()
            .filter_map(|dispatch| self.apply(dispatch))
            .collect()
    }

    /// Apply one gesture to the open process.
    pub fn apply(&mut self, dispatch: Dispatch) -> Option<Intent> {
        let process = self.current?;
        let outcome = match dispatch {
            Dispatch::Hover { target, cursor } => {
                self.hovered = target;
                self.cursor = cursor;
                return None;
            }
            Dispatch::Press {
                target: InteractionTarget::StepBody(step),
                pos,
            } => self.grab_step(process, step, pos).map(|_| None),
            Dispatch::Press { .. } => Ok(None),
            Dispatch::Drag { target, pos, .. } => self.drag(process, target, pos).map(|_| None),
            Dispatch::Release {
                target,
                dragged: false,
                ..
            } => self.click(process, target),
            Dispatch::Release { .. } => Ok(None),
            Dispatch::Drop {
                source,
                over,
                dragged: true,
                accepts: true,
                ..
            } => self.drop_onto(process, source, over).map(|_| None),
            // A click that slipped onto a neighbour, or a region taking no drops
            Dispatch::Drop { .. } => Ok(None),
            Dispatch::DoubleClick { target, .. } => Ok(self.double_click(process, target)),
        };
        match outcome {
            Ok(intent) => {
                self.workspace.refresh_routes();
                intent
            }
            Err(e) => {
                self.workspace.report_error(e.to_string());
                None
            }
        }
    }

    // ── Gestures ────────────────────────────────────────────────────────

    fn grab_step(&mut self, process: ProcessId, step: StepId, pos: Position) -> Result<()> {
        let center = self
            .workspace
            .graph(process)?
            .step(step)
            .ok_or_else(|| EditorError::UnknownStep(step.to_string()))?
            .position();
        self.grab_offset = center - pos;
        self.workspace.raise_step(process, step)
    }

    fn drag(&mut self, process: ProcessId, target: InteractionTarget, pos: Position) -> Result<()> {
        match target {
            InteractionTarget::StepBody(step) => {
                self.workspace.move_step(process, step, pos + self.grab_offset)
            }
            InteractionTarget::PathArrow(path)
            | InteractionTarget::PathLabel(path)
            | InteractionTarget::DanglingEnd(path) => self.drag_path_end(process, path, pos),
            _ => Ok(()),
        }
    }

    /// Pull the end of a path to `pos`, detaching it first if connected.
    fn drag_path_end(&mut self, process: ProcessId, path: PathRef, pos: Position) -> Result<()> {
        let graph = self.workspace.graph(process)?;
        let owner = graph
            .step(path.step)
            .ok_or_else(|| EditorError::UnknownStep(path.step.to_string()))?
            .position();
        let connected = graph
            .path(path)
            .ok_or_else(|| EditorError::UnknownPath(path.path.to_string()))?
            .is_connected();
        let offset = pos - owner;
        if connected {
            self.workspace.disconnect_path(process, path, offset)
        } else {
            self.workspace.set_path_end_offset(process, path, offset)
        }
    }

    fn drop_onto(
        &mut self,
        process: ProcessId,
        dragged: InteractionTarget,
        over: InteractionTarget,
    ) -> Result<()> {
        match (dragged, over) {
            (InteractionTarget::StepBody(step), InteractionTarget::DeleteZone) => {
                self.delete_step(process, step)
            }
            (dragged, InteractionTarget::DeleteZone) => match dragged.path() {
                Some(path) => self.reset_path(process, path),
                None => Ok(()),
            },
            (dragged, over) => match (dragged.path(), over.step()) {
                (Some(path), Some(step)) => self.workspace.connect_path(process, path, step),
                _ => Ok(()),
            },
        }
    }

    fn delete_step(&mut self, process: ProcessId, step: StepId) -> Result<()> {
        let kind = &self
            .workspace
            .graph(process)?
            .step(step)
            .ok_or_else(|| EditorError::UnknownStep(step.to_string()))?
            .kind;
        if matches!(kind, StepKind::Start) {
            return Err(EditorError::InvalidDropTarget(
                "The start step cannot be deleted".to_string(),
            ));
        }
        self.workspace.remove_step(process, step)
    }

    /// Put a path back to its default dangling position.
    fn reset_path(&mut self, process: ProcessId, path: PathRef) -> Result<()> {
        let graph = self.workspace.graph(process)?;
        let owner = graph
            .step(path.step)
            .ok_or_else(|| EditorError::UnknownStep(path.step.to_string()))?
            .position();
        let route = graph
            .route(path)
            .ok_or_else(|| EditorError::UnknownPath(path.path.to_string()))?;
        let offset = route.start.position - owner
            + Position::from_angle(route.start.angle) * self.workspace.dangling_length;
        self.workspace.disconnect_path(process, path, offset)
    }

    fn click(&mut self, process: ProcessId, target: InteractionTarget) -> Result<Option<Intent>> {
        match target {
            InteractionTarget::Connector(param) => {
                let link = self
                    .workspace
                    .graph(process)?
                    .param(param)
                    .and_then(|(_, p)| p.link());
                match link {
                    Some(variable) => self
                        .workspace
                        .toggle_highlight(VariableRef { process, variable }),
                    None => self.workspace.highlight_variable(None),
                }
                Ok(None)
            }
            InteractionTarget::AddStopStep => {
                let at = Position::new(self.viewport.x / 2.0, self.viewport.y / 2.0);
                self.workspace
                    .add_step(process, StepKind::Stop { path_name: None }, at)?;
                Ok(None)
            }
            InteractionTarget::StopLabel(step) => Ok(Some(Intent::EditStopPathName(step))),
            _ => Ok(None),
        }
    }

    fn double_click(&self, process: ProcessId, target: InteractionTarget) -> Option<Intent> {
        match target {
            InteractionTarget::StepBody(step) => {
                let called = self.workspace.graph(process).ok()?.step(step)?.governing_process()?;
                self.workspace
                    .process(called)
                    .and_then(|p| p.as_user())
                    .map(|_| Intent::OpenProcess(called))
            }
            InteractionTarget::Connector(param) => Some(Intent::EditParameter(param)),
            InteractionTarget::StopLabel(step) => Some(Intent::EditStopPathName(step)),
            _ => None,
        }
    }
}
