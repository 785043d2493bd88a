//! The workspace document: every type and process being edited.
//!
//! All editing goes through an explicit `Workspace` value. Graph edits are
//! forwarded to the owning [`UserProcess`] and the process is re-validated
//! afterwards, so `is_valid()` is always current. Structural problems found
//! while loading are collected in the error sink rather than returned.

use crate::error::{EditorError, Result};
use crate::geometry::Position;
use crate::graph::{UserProcess, DEFAULT_DANGLING_LENGTH};
use crate::model::data_type::TypeRegistry;
use crate::model::field::DataField;
use crate::model::id::{ParamRef, PathRef, ProcessId, StepId, VariableId, VariableRef};
use crate::model::process::{Process, ProcessKind, Signature};
use crate::model::step::StepKind;
use crate::propagate::{self, PropagationReport};
use std::collections::HashMap;
use tracing::{info, warn};

/// Where the start step of a newly created process is placed.
pub const START_STEP_POSITION: Position = Position::new(120.0, 160.0);

#[derive(Debug, Clone)]
pub struct Workspace {
    pub types: TypeRegistry,
    processes: Vec<Process>,
    next_process_id: u32,
    highlighted: Option<VariableRef>,
    errors: Vec<String>,
    /// Length of dangling paths created by the editor.
    pub dangling_length: f64,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            types: TypeRegistry::new(),
            processes: Vec::new(),
            next_process_id: 0,
            highlighted: None,
            errors: Vec::new(),
            dangling_length: DEFAULT_DANGLING_LENGTH,
        }
    }

    // ── Processes ───────────────────────────────────────────────────────

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub(crate) fn processes_mut(&mut self) -> &mut [Process] {
        &mut self.processes
    }

    pub fn process(&self, id: ProcessId) -> Option<&Process> {
        self.processes.iter().find(|p| p.id == id)
    }

    pub fn find_process(&self, name: &str) -> Option<&Process> {
        self.processes.iter().find(|p| p.name == name)
    }

    pub fn process_name(&self, id: ProcessId) -> &str {
        self.process(id).map(|p| p.name.as_str()).unwrap_or("?")
    }

    /// Graph of a user process.
    pub fn graph(&self, id: ProcessId) -> Result<&UserProcess> {
        let process = self
            .process(id)
            .ok_or_else(|| EditorError::UnknownProcess(id.to_string()))?;
        process
            .as_user()
            .ok_or_else(|| EditorError::NotEditable(process.name.clone()))
    }

    fn check_process_name(&self, name: &str, existing: Option<ProcessId>) -> Result<()> {
        if name.trim().is_empty() {
            return Err(EditorError::MissingField("process name".to_string()));
        }
        if self
            .processes
            .iter()
            .any(|p| p.name == name && Some(p.id) != existing)
        {
            return Err(EditorError::DuplicateName {
                kind: "process",
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn push_process(&mut self, build: impl FnOnce(ProcessId) -> Process) -> ProcessId {
        let id = ProcessId(self.next_process_id);
        self.next_process_id += 1;
        self.processes.push(build(id));
        id
    }

    pub fn add_system_process(&mut self, name: &str, signature: Signature) -> Result<ProcessId> {
        self.check_process_name(name, None)?;
        signature.check(&self.types)?;
        Ok(self.push_process(|id| Process::system(id, name, signature)))
    }

    /// Register a user process with an empty graph.
    pub fn add_user_process(
        &mut self,
        name: &str,
        signature: Signature,
        fixed_signature: bool,
    ) -> Result<ProcessId> {
        self.check_process_name(name, None)?;
        signature.check(&self.types)?;
        let id = self.push_process(|id| Process::user(id, name, signature, fixed_signature));
        self.validate_process(id);
        Ok(id)
    }

    /// Register a user process and give it a start step.
    pub fn create_user_process(&mut self, name: &str, signature: Signature) -> Result<ProcessId> {
        let id = self.add_user_process(name, signature, false)?;
        self.add_step(id, StepKind::Start, START_STEP_POSITION)?;
        Ok(id)
    }

    pub fn rename_process(&mut self, id: ProcessId, name: &str) -> Result<()> {
        self.check_process_name(name, Some(id))?;
        let process = self
            .processes
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| EditorError::UnknownProcess(id.to_string()))?;
        if !process.is_editable() {
            return Err(EditorError::NotEditable(process.name.clone()));
        }
        process.name = name.to_string();
        Ok(())
    }

    /// Replace a user process's signature and propagate the change.
    pub fn set_signature(&mut self, id: ProcessId, signature: Signature) -> Result<PropagationReport> {
        let process = self
            .process(id)
            .ok_or_else(|| EditorError::UnknownProcess(id.to_string()))?;
        if !process.is_signature_editable() {
            return Err(EditorError::NotEditable(process.name.clone()));
        }
        signature.check(&self.types)?;
        // Initial values do not reach steps, so such edits skip propagation
        let same_shape = process.signature.matches(&signature);
        if let Some(process) = self.processes.iter_mut().find(|p| p.id == id) {
            process.signature = signature;
        }
        if same_shape {
            return Ok(PropagationReport::unchanged(id));
        }
        propagate::propagate(self, id)
    }

    /// Pure form of propagation: a copy of this workspace with `id`'s
    /// current signature pushed to every dependent step.
    pub fn propagated(&self, id: ProcessId) -> Result<(Workspace, PropagationReport)> {
        let mut next = self.clone();
        let report = propagate::propagate(&mut next, id)?;
        Ok((next, report))
    }

    /// Remove a process and every step in any process that calls it.
    ///
    /// Calling steps go first, so a failure part way never leaves a call to
    /// a process that is gone.
    pub fn remove_process(&mut self, id: ProcessId) -> Result<Process> {
        if self.process(id).is_none() {
            return Err(EditorError::UnknownProcess(id.to_string()));
        }

        let mut affected = Vec::new();
        let mut removed_steps = 0;
        for other in self.processes.iter_mut().filter(|p| p.id != id) {
            let other_id = other.id;
            let Some(graph) = other.as_user_mut() else {
                continue;
            };
            let callers: Vec<StepId> = graph.steps_calling(id).map(|s| s.unique_id).collect();
            for step in &callers {
                graph.remove_step(*step)?;
            }
            if !callers.is_empty() {
                removed_steps += callers.len();
                affected.push(other_id);
            }
        }

        let index = self
            .processes
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| EditorError::UnknownProcess(id.to_string()))?;
        let process = self.processes.remove(index);
        if self.highlighted.is_some_and(|h| h.process == id) {
            self.highlighted = None;
        }
        for other in &affected {
            self.validate_process(*other);
        }
        info!(
            "Removed process '{}' and {} calling steps in {} processes",
            process.name,
            removed_steps,
            affected.len()
        );
        Ok(process)
    }

    // ── Graph edits ─────────────────────────────────────────────────────

    /// Graph of a user process together with the types and its own
    /// signature. Callers must re-validate afterwards.
    pub(crate) fn graph_parts_mut(
        &mut self,
        id: ProcessId,
    ) -> Option<(&mut UserProcess, &TypeRegistry, &Signature)> {
        let process = self.processes.iter_mut().find(|p| p.id == id)?;
        let Process {
            signature, kind, ..
        } = process;
        match kind {
            ProcessKind::User(graph) => Some((graph, &self.types, &*signature)),
            ProcessKind::System => None,
        }
    }

    /// Run `edit` on a user process's graph, then re-validate it.
    fn edit<T>(
        &mut self,
        id: ProcessId,
        edit: impl FnOnce(&mut UserProcess, &TypeRegistry, &Signature) -> Result<T>,
    ) -> Result<T> {
        let process = self
            .processes
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| EditorError::UnknownProcess(id.to_string()))?;
        let Process {
            name,
            signature,
            kind,
            ..
        } = process;
        let graph = match kind {
            ProcessKind::User(graph) => graph,
            ProcessKind::System => return Err(EditorError::NotEditable(name.clone())),
        };
        let result = edit(graph, &self.types, signature)?;
        self.validate_process(id);
        Ok(result)
    }

    pub fn add_step(&mut self, process: ProcessId, kind: StepKind, position: Position) -> Result<StepId> {
        let governing = match &kind {
            StepKind::ProcessCall { process: called } => Some(
                self.process(*called)
                    .ok_or_else(|| EditorError::UnknownProcess(called.to_string()))?
                    .signature
                    .clone(),
            ),
            _ => None,
        };
        let dangling_length = self.dangling_length;
        self.edit(process, |graph, _, parent| {
            graph.add_step(kind, position, parent, governing.as_ref(), dangling_length)
        })
    }

    pub fn remove_step(&mut self, process: ProcessId, step: StepId) -> Result<()> {
        self.edit(process, |graph, _, _| graph.remove_step(step).map(|_| ()))
    }

    pub fn move_step(&mut self, process: ProcessId, step: StepId, position: Position) -> Result<()> {
        self.edit(process, |graph, _, _| graph.move_step(step, position))
    }

    pub fn raise_step(&mut self, process: ProcessId, step: StepId) -> Result<()> {
        self.edit(process, |graph, _, _| graph.raise_step(step))
    }

    pub fn set_stop_path_name(
        &mut self,
        process: ProcessId,
        step: StepId,
        name: Option<String>,
    ) -> Result<()> {
        self.edit(process, |graph, _, parent| {
            graph.set_stop_path_name(step, name, parent)
        })
    }

    pub fn add_variable(&mut self, process: ProcessId, field: DataField) -> Result<VariableId> {
        self.edit(process, |graph, types, _| graph.add_variable(field, types))
    }

    pub fn update_variable(
        &mut self,
        process: ProcessId,
        variable: VariableId,
        field: DataField,
    ) -> Result<()> {
        self.edit(process, |graph, types, _| {
            graph.update_variable(variable, field, types)
        })
    }

    pub fn remove_variable(&mut self, process: ProcessId, variable: VariableId) -> Result<()> {
        self.edit(process, |graph, _, _| graph.remove_variable(variable).map(|_| ()))?;
        let removed = VariableRef { process, variable };
        if self.highlighted == Some(removed) {
            self.highlighted = None;
        }
        Ok(())
    }

    pub fn bind_variable(
        &mut self,
        process: ProcessId,
        param: ParamRef,
        variable: VariableId,
    ) -> Result<()> {
        self.edit(process, |graph, types, _| {
            graph.bind_variable(param, variable, types)
        })
    }

    pub fn set_fixed_value(&mut self, process: ProcessId, param: ParamRef, value: &str) -> Result<()> {
        self.edit(process, |graph, types, _| {
            graph.set_fixed_value(param, value, types)
        })
    }

    pub fn clear_binding(&mut self, process: ProcessId, param: ParamRef) -> Result<()> {
        self.edit(process, |graph, _, _| graph.clear_binding(param))
    }

    pub fn connect_path(&mut self, process: ProcessId, path: PathRef, target: StepId) -> Result<()> {
        self.edit(process, |graph, _, _| graph.connect_path(path, target))
    }

    pub fn disconnect_path(
        &mut self,
        process: ProcessId,
        path: PathRef,
        end_offset: Position,
    ) -> Result<()> {
        self.edit(process, |graph, _, _| graph.disconnect_path(path, end_offset))
    }

    pub fn set_path_end_offset(
        &mut self,
        process: ProcessId,
        path: PathRef,
        end_offset: Position,
    ) -> Result<()> {
        self.edit(process, |graph, _, _| {
            graph.set_path_end_offset(path, end_offset)
        })
    }

    /// Recompute stale routes in every user process.
    pub fn refresh_routes(&mut self) -> usize {
        self.processes
            .iter_mut()
            .filter_map(Process::as_user_mut)
            .map(UserProcess::refresh_routes)
            .sum()
    }

    // ── Validation ──────────────────────────────────────────────────────

    fn named_paths(&self) -> HashMap<ProcessId, bool> {
        self.processes
            .iter()
            .map(|p| (p.id, p.signature.has_named_paths()))
            .collect()
    }

    /// Re-validate one process. System processes are always valid.
    pub fn validate_process(&mut self, id: ProcessId) -> bool {
        let named = self.named_paths();
        let Some(process) = self.processes.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        let Process {
            signature, kind, ..
        } = process;
        match kind {
            ProcessKind::User(graph) => {
                graph.validate(signature, &|p| named.get(&p).copied().unwrap_or(false))
            }
            ProcessKind::System => true,
        }
    }

    /// Re-validate every process.
    pub fn validate(&mut self) -> bool {
        let ids: Vec<ProcessId> = self.processes.iter().map(|p| p.id).collect();
        ids.into_iter()
            .fold(true, |valid, id| self.validate_process(id) && valid)
    }

    pub fn is_valid(&self) -> bool {
        self.processes.iter().all(Process::is_valid)
    }

    /// Names of the user processes that currently fail validation.
    pub fn invalid_processes(&self) -> Vec<String> {
        self.processes
            .iter()
            .filter(|p| !p.is_valid())
            .map(|p| p.name.clone())
            .collect()
    }

    // ── Highlight ───────────────────────────────────────────────────────

    pub fn highlighted(&self) -> Option<VariableRef> {
        self.highlighted
    }

    pub fn highlight_variable(&mut self, variable: Option<VariableRef>) {
        self.highlighted = variable;
    }

    /// Highlight `variable`, or clear the highlight if it is already shown.
    pub fn toggle_highlight(&mut self, variable: VariableRef) {
        self.highlighted = if self.highlighted == Some(variable) {
            None
        } else {
            Some(variable)
        };
    }

    // ── Error sink ──────────────────────────────────────────────────────

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn report_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.errors.push(message);
    }

    pub fn take_errors(&mut self) -> Vec<String> {
        std::mem::take(&mut self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::id::{Side, TypeId};

    fn workspace() -> (Workspace, TypeId) {
        let mut ws = Workspace::new();
        let number = ws.types.add("Number", [0; 4], Some(r"\d+"), None).unwrap();
        (ws, number)
    }

    #[test]
    fn test_process_names_unique() {
        let (mut ws, _) = workspace();
        ws.add_system_process("Print", Signature::default()).unwrap();
        assert!(matches!(
            ws.add_user_process("Print", Signature::default(), false),
            Err(EditorError::DuplicateName { .. })
        ));
        assert!(matches!(
            ws.add_user_process("", Signature::default(), false),
            Err(EditorError::MissingField(_))
        ));
    }

    #[test]
    fn test_system_process_not_editable() {
        let (mut ws, _) = workspace();
        let print = ws.add_system_process("Print", Signature::default()).unwrap();
        assert!(matches!(
            ws.add_step(print, StepKind::Start, Position::ZERO),
            Err(EditorError::NotEditable(_))
        ));
        assert!(matches!(
            ws.set_signature(print, Signature::default()),
            Err(EditorError::NotEditable(_))
        ));
    }

    #[test]
    fn test_fixed_signature_refused() {
        let (mut ws, number) = workspace();
        let main = ws.add_user_process("Main", Signature::default(), true).unwrap();
        let sig = Signature::new(vec![DataField::new("a", number)], vec![], vec![]);
        assert!(matches!(
            ws.set_signature(main, sig),
            Err(EditorError::NotEditable(_))
        ));
    }

    #[test]
    fn test_new_process_has_start_step() {
        let (mut ws, number) = workspace();
        let sig = Signature::new(vec![DataField::new("n", number)], vec![], vec![]);
        let id = ws.create_user_process("Count", sig).unwrap();
        let start = ws.graph(id).unwrap().start_step().unwrap();
        assert_eq!(start.outputs.len(), 1);
        assert_eq!(start.outputs[0].name(), "n");
        // The start output is unlinked and the path dangles
        assert!(!ws.process(id).unwrap().is_valid());
    }

    #[test]
    fn test_edits_revalidate() {
        let (mut ws, _) = workspace();
        let main = ws.create_user_process("Main", Signature::default()).unwrap();
        assert!(!ws.is_valid());
        let stop = ws
            .add_step(main, StepKind::Stop { path_name: None }, Position::new(300.0, 160.0))
            .unwrap();
        let start = ws.graph(main).unwrap().start_step().unwrap();
        let path = PathRef {
            step: start.unique_id,
            path: start.return_paths[0].id,
        };
        ws.connect_path(main, path, stop).unwrap();
        assert!(ws.is_valid());
        assert!(ws.invalid_processes().is_empty());
    }

    #[test]
    fn test_initial_value_edit_is_stored() {
        let (mut ws, number) = workspace();
        let sig = Signature::new(vec![DataField::new("a", number)], vec![], vec![]);
        let main = ws.create_user_process("Main", sig).unwrap();

        let mut next = ws.process(main).unwrap().signature.clone();
        next.inputs[0].initial_value = Some("5".to_string());
        let report = ws.set_signature(main, next).unwrap();
        assert!(report.is_empty());
        assert!(report.changed_processes.is_empty());
        assert_eq!(
            ws.process(main).unwrap().signature.inputs[0].initial_value.as_deref(),
            Some("5")
        );
    }

    #[test]
    fn test_remove_process_clears_every_caller() {
        let (mut ws, _) = workspace();
        let helper = ws.create_user_process("Helper", Signature::default()).unwrap();
        let main = ws.create_user_process("Main", Signature::default()).unwrap();
        let other = ws.create_user_process("Other", Signature::default()).unwrap();
        let call = StepKind::ProcessCall { process: helper };
        ws.add_step(helper, call.clone(), Position::new(300.0, 160.0)).unwrap();
        ws.add_step(main, call.clone(), Position::new(300.0, 160.0)).unwrap();
        ws.add_step(main, call.clone(), Position::new(300.0, 360.0)).unwrap();
        ws.add_step(other, call, Position::new(300.0, 160.0)).unwrap();

        assert!(matches!(
            ws.remove_process(ProcessId(99)),
            Err(EditorError::UnknownProcess(_))
        ));
        assert_eq!(ws.processes().len(), 3);

        let removed = ws.remove_process(helper).unwrap();
        assert_eq!(removed.id, helper);
        assert!(ws.process(helper).is_none());
        for id in [main, other] {
            let graph = ws.graph(id).unwrap();
            assert_eq!(graph.steps_calling(helper).count(), 0);
            // Only the start step is left
            assert_eq!(graph.steps().len(), 1);
        }
    }

    #[test]
    fn test_highlight_toggle_and_clear() {
        let (mut ws, number) = workspace();
        let main = ws.create_user_process("Main", Signature::default()).unwrap();
        let x = ws.add_variable(main, DataField::new("x", number)).unwrap();
        let var = VariableRef {
            process: main,
            variable: x,
        };
        ws.toggle_highlight(var);
        assert_eq!(ws.highlighted(), Some(var));
        ws.toggle_highlight(var);
        assert_eq!(ws.highlighted(), None);

        ws.highlight_variable(Some(var));
        ws.remove_variable(main, x).unwrap();
        assert_eq!(ws.highlighted(), None);
    }

    #[test]
    fn test_rejected_edit_leaves_graph_untouched() {
        let (mut ws, number) = workspace();
        let add = ws
            .add_system_process(
                "Add",
                Signature::new(vec![DataField::new("a", number)], vec![], vec![]),
            )
            .unwrap();
        let main = ws.create_user_process("Main", Signature::default()).unwrap();
        let call = ws
            .add_step(main, StepKind::ProcessCall { process: add }, Position::new(300.0, 0.0))
            .unwrap();
        let a = ParamRef {
            step: call,
            param: ws.graph(main).unwrap().step(call).unwrap().params(Side::Input)[0].id,
        };
        assert!(ws.set_fixed_value(main, a, "x").is_err());
        let (_, param) = ws.graph(main).unwrap().param(a).unwrap();
        assert!(!param.is_bound());
    }

    #[test]
    fn test_error_sink() {
        let (mut ws, _) = workspace();
        ws.report_error("Unknown type 'Text'");
        assert_eq!(ws.errors().len(), 1);
        assert_eq!(ws.take_errors(), vec!["Unknown type 'Text'".to_string()]);
        assert!(ws.errors().is_empty());
    }
}
