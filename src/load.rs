//! Load path: rebuild a workspace from records.
//!
//! Loading is best effort. Each problem (duplicate name, unresolved type,
//! process or step reference, bad literal) is reported to the workspace error
//! sink and only the offending entity is skipped. The order is fixed:
//!
//! 1. every type, parents before children
//! 2. every process signature, so steps can copy the signature they call
//! 3. per user process: variables and steps, noting each stored step ID
//! 4. per user process: bindings and return-path targets, once all of its
//!    steps exist

use crate::error::{EditorError, Result};
use crate::graph::UserProcess;
use crate::model::data_type::TypeRegistry;
use crate::model::field::DataField;
use crate::model::id::{ParamRef, PathRef, ProcessId, StepId, TypeId, VariableId};
use crate::model::process::Signature;
use crate::model::step::StepKind;
use crate::snapshot::{
    BindingRecord, BindingValue, FieldRecord, PathRecord, ProcessRecord, SignatureRecord,
    StepRecord, StepVariant, TypeRecord, WorkspaceSnapshot,
};
use crate::workspace::Workspace;
use tracing::{debug, info};

/// Builds a workspace one record at a time.
#[derive(Debug, Default)]
pub struct WorkspaceLoader {
    workspace: Workspace,
}

impl WorkspaceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a whole snapshot in the required order.
    pub fn load(snapshot: &WorkspaceSnapshot) -> Workspace {
        let mut loader = Self::new();
        for record in &snapshot.types {
            loader.add_type(record);
        }
        let loaded: Vec<(ProcessId, &ProcessRecord)> = snapshot
            .processes
            .iter()
            .filter_map(|record| loader.add_process(record).map(|id| (id, record)))
            .collect();
        for (id, record) in loaded {
            if record.system {
                continue;
            }
            if let Some(mut process) = loader.process(id) {
                for variable in &record.variables {
                    process.add_variable(variable);
                }
                for step in &record.steps {
                    process.add_step(step);
                }
                process.finish();
            }
        }
        loader.finish()
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn add_type(&mut self, record: &TypeRecord) -> Option<TypeId> {
        let parent = match &record.parent {
            Some(name) => match self.workspace.types.find_by_name(name) {
                Some(id) => Some(id),
                None => {
                    self.workspace.report_error(format!(
                        "Type '{}': unknown parent type '{}'",
                        record.name, name
                    ));
                    return None;
                }
            },
            None => None,
        };
        let added = self.workspace.types.add(
            &record.name,
            record.color,
            record.pattern.as_deref(),
            parent,
        );
        self.report(added, || format!("Type '{}'", record.name))
    }

    /// Register a process signature. User processes get an empty graph that
    /// [`ProcessLoader`] fills later.
    pub fn add_process(&mut self, record: &ProcessRecord) -> Option<ProcessId> {
        let signature = resolve_signature(&self.workspace, &record.signature);
        let added = signature.and_then(|signature| {
            if record.system {
                self.workspace.add_system_process(&record.name, signature)
            } else {
                self.workspace
                    .add_user_process(&record.name, signature, record.fixed_signature)
            }
        });
        self.report(added, || format!("Process '{}'", record.name))
    }

    /// Start loading the graph of a user process.
    pub fn process(&mut self, id: ProcessId) -> Option<ProcessLoader<'_>> {
        self.workspace.graph(id).ok()?;
        Some(ProcessLoader {
            workspace: &mut self.workspace,
            process: id,
            pending: Vec::new(),
        })
    }

    /// Validate everything and hand the workspace over.
    pub fn finish(mut self) -> Workspace {
        self.workspace.validate();
        info!(
            "Loaded {} types and {} processes ({} problems)",
            self.workspace.types.len(),
            self.workspace.processes().len(),
            self.workspace.errors().len()
        );
        self.workspace
    }

    fn report<T>(&mut self, result: Result<T>, context: impl FnOnce() -> String) -> Option<T> {
        report_to(&mut self.workspace, result, context)
    }
}

fn report_to<T>(
    workspace: &mut Workspace,
    result: Result<T>,
    context: impl FnOnce() -> String,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            workspace.report_error(format!("{}: {}", context(), e));
            None
        }
    }
}

fn resolve_field(workspace: &Workspace, record: &FieldRecord) -> Result<DataField> {
    let type_id = workspace
        .types
        .find_by_name(&record.type_name)
        .ok_or_else(|| EditorError::UnknownType(record.type_name.clone()))?;
    Ok(DataField {
        name: record.name.clone(),
        type_id,
        initial_value: record.initial_value.clone(),
    })
}

fn resolve_signature(workspace: &Workspace, record: &SignatureRecord) -> Result<Signature> {
    let fields = |records: &[FieldRecord]| -> Result<Vec<DataField>> {
        records.iter().map(|r| resolve_field(workspace, r)).collect()
    };
    Ok(Signature::new(
        fields(&record.inputs)?,
        fields(&record.outputs)?,
        record.return_paths.clone(),
    ))
}

/// Loads the graph of one user process in two passes.
pub struct ProcessLoader<'a> {
    workspace: &'a mut Workspace,
    process: ProcessId,
    pending: Vec<(StepId, Vec<BindingRecord>, Vec<PathRecord>)>,
}

impl ProcessLoader<'_> {
    fn context(&self) -> String {
        format!("Process '{}'", self.workspace.process_name(self.process))
    }

    pub fn add_variable(&mut self, record: &FieldRecord) -> Option<VariableId> {
        let context = format!("{}, variable '{}'", self.context(), record.name);
        let result = resolve_field(self.workspace, record).and_then(|field| {
            let (graph, types, _) = self.graph()?;
            graph.add_variable(field, types)
        });
        report_to(self.workspace, result, || context)
    }

    /// First pass: construct the step; its bindings and paths wait for
    /// [`ProcessLoader::finish`].
    pub fn add_step(&mut self, record: &StepRecord) -> Option<StepId> {
        let context = format!("{}, step {}", self.context(), record.id);
        let kind = match &record.variant {
            StepVariant::Start => Ok(StepKind::Start),
            StepVariant::Stop { path_name } => Ok(StepKind::Stop {
                path_name: path_name.clone(),
            }),
            StepVariant::ProcessCall { process } => self
                .workspace
                .find_process(process)
                .map(|p| StepKind::ProcessCall { process: p.id })
                .ok_or_else(|| EditorError::UnknownProcess(process.clone())),
        };
        let governing = match &kind {
            Ok(StepKind::ProcessCall { process }) => self
                .workspace
                .process(*process)
                .map(|p| p.signature.clone()),
            _ => None,
        };
        let dangling_length = self.workspace.dangling_length;
        let result = kind.and_then(|kind| {
            let (graph, _, parent) = self.graph()?;
            graph.insert_step(
                record.id,
                kind,
                record.position,
                parent,
                governing.as_ref(),
                dangling_length,
            )
        });
        report_to(self.workspace, result, || context)?;
        self.pending
            .push((record.id, record.bindings.clone(), record.paths.clone()));
        Some(record.id)
    }

    /// Second pass: resolve bindings and return-path targets.
    pub fn finish(mut self) {
        let pending = std::mem::take(&mut self.pending);
        for (step, bindings, paths) in pending {
            for binding in &bindings {
                let context = format!(
                    "{}, step {}, parameter '{}'",
                    self.context(),
                    step,
                    binding.parameter
                );
                let result = self.apply_binding(step, binding);
                report_to(self.workspace, result, || context);
            }
            self.apply_paths(step, &paths);
        }
        self.workspace.validate_process(self.process);
        debug!("Finished loading process {}", self.process);
    }

    fn graph(&mut self) -> Result<(&mut UserProcess, &TypeRegistry, &Signature)> {
        let process = self.process;
        self.workspace
            .graph_parts_mut(process)
            .ok_or_else(|| EditorError::NotEditable(process.to_string()))
    }

    fn apply_binding(&mut self, step: StepId, binding: &BindingRecord) -> Result<()> {
        let (graph, types, _) = self.graph()?;
        let param = graph
            .step(step)
            .and_then(|s| s.find_param_by_name(binding.side, &binding.parameter))
            .map(|p| ParamRef { step, param: p.id })
            .ok_or_else(|| EditorError::UnknownParameter(binding.parameter.clone()))?;
        match &binding.value {
            BindingValue::Fixed(value) => graph.set_fixed_value(param, value, types),
            BindingValue::Variable(name) => {
                let variable = graph
                    .find_variable(name)
                    .map(|v| v.id)
                    .ok_or_else(|| EditorError::UnknownVariable(name.clone()))?;
                graph.bind_variable(param, variable, types)
            }
        }
    }

    fn apply_paths(&mut self, step: StepId, records: &[PathRecord]) {
        let mut claimed = Vec::new();
        for record in records {
            let context = format!(
                "{}, step {}, return path '{}'",
                self.context(),
                step,
                record.name.as_deref().unwrap_or("")
            );
            let result = self.graph().and_then(|(graph, _, _)| {
                let path = graph
                    .step(step)
                    .and_then(|s| {
                        s.return_paths
                            .iter()
                            .find(|p| p.name == record.name && !claimed.contains(&p.id))
                    })
                    .map(|p| PathRef { step, path: p.id })
                    .ok_or_else(|| {
                        EditorError::UnknownPath(record.name.clone().unwrap_or_default())
                    })?;
                claimed.push(path.path);
                match (record.target, record.end_offset) {
                    (Some(target), _) => graph.connect_path(path, target),
                    (None, Some(offset)) => graph.set_path_end_offset(path, offset),
                    (None, None) => Ok(()),
                }
            });
            report_to(self.workspace, result, || context);
        }
    }
}
