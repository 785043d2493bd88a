//! Steps: the nodes of a user process graph.
//!
//! Three variants share one struct and differ by [`StepKind`]:
//! - **Start** exposes the parent process's inputs as its outputs.
//! - **Stop** takes the parent process's outputs as its inputs and chooses
//!   which of the parent's return paths it ends on.
//! - **ProcessCall** invokes a governing process and copies its signature.
//!
//! Parameters are independent copies of the signature fields, so each step
//! owns its own bindings.

use crate::geometry::Position;
use crate::layout::connector::ConnectorLayout;
use crate::layout::routing::best_path_angle;
use crate::layout::shape::{StepShape, CALL_HALF_HEIGHT, CALL_HALF_WIDTH, TERMINAL_RADIUS};
use crate::model::field::Parameter;
use crate::model::id::{ParamId, PathId, PathRef, ProcessId, Side, StepId};
use crate::model::process::Signature;
use crate::model::return_path::ReturnPath;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    Start,
    Stop {
        /// Return path of the parent process this stop ends on.
        path_name: Option<String>,
    },
    ProcessCall {
        process: ProcessId,
    },
}

impl StepKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            StepKind::Start => "Start",
            StepKind::Stop { .. } => "Stop",
            StepKind::ProcessCall { .. } => "Process",
        }
    }

    pub fn governing_process(&self) -> Option<ProcessId> {
        match self {
            StepKind::ProcessCall { process } => Some(*process),
            _ => None,
        }
    }

    pub fn shape(&self) -> StepShape {
        match self {
            StepKind::Start | StepKind::Stop { .. } => StepShape::Circle {
                radius: TERMINAL_RADIUS,
            },
            StepKind::ProcessCall { .. } => StepShape::RoundedRect {
                half_width: CALL_HALF_WIDTH,
                half_height: CALL_HALF_HEIGHT,
            },
        }
    }

    /// Whether return paths may be dropped onto a step of this kind.
    pub fn accepts_incoming(&self) -> bool {
        !matches!(self, StepKind::Start)
    }
}

#[derive(Debug, Clone)]
pub struct Step {
    pub unique_id: StepId,
    pub kind: StepKind,
    position: Position,
    pub inputs: Vec<Parameter>,
    pub outputs: Vec<Parameter>,
    pub return_paths: Vec<ReturnPath>,
    incoming: Vec<PathRef>,
    valid: bool,
    /// Bumped whenever the position or connector layout changes.
    version: u64,
    layout: ConnectorLayout,
}

impl Step {
    pub fn new(
        unique_id: StepId,
        kind: StepKind,
        position: Position,
        inputs: Vec<Parameter>,
        outputs: Vec<Parameter>,
    ) -> Self {
        let mut step = Self {
            unique_id,
            kind,
            position,
            inputs,
            outputs,
            return_paths: Vec::new(),
            incoming: Vec::new(),
            valid: false,
            version: 0,
            layout: ConnectorLayout::default(),
        };
        step.relayout();
        step
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn shape(&self) -> StepShape {
        self.kind.shape()
    }

    pub fn layout(&self) -> &ConnectorLayout {
        &self.layout
    }

    /// Paths owned by other steps (or this one) that end here.
    pub fn incoming(&self) -> &[PathRef] {
        &self.incoming
    }

    pub fn governing_process(&self) -> Option<ProcessId> {
        self.kind.governing_process()
    }

    pub fn stop_path_name(&self) -> Option<&str> {
        match &self.kind {
            StepKind::Stop { path_name } => path_name.as_deref(),
            _ => None,
        }
    }

    pub fn params(&self, side: Side) -> &[Parameter] {
        match side {
            Side::Input => &self.inputs,
            Side::Output => &self.outputs,
        }
    }

    pub(crate) fn params_mut(&mut self, side: Side) -> &mut Vec<Parameter> {
        match side {
            Side::Input => &mut self.inputs,
            Side::Output => &mut self.outputs,
        }
    }

    pub fn find_param(&self, id: ParamId) -> Option<(Side, &Parameter)> {
        self.inputs
            .iter()
            .find(|p| p.id == id)
            .map(|p| (Side::Input, p))
            .or_else(|| {
                self.outputs
                    .iter()
                    .find(|p| p.id == id)
                    .map(|p| (Side::Output, p))
            })
    }

    pub(crate) fn find_param_mut(&mut self, id: ParamId) -> Option<(Side, &mut Parameter)> {
        if let Some(p) = self.inputs.iter_mut().find(|p| p.id == id) {
            return Some((Side::Input, p));
        }
        self.outputs
            .iter_mut()
            .find(|p| p.id == id)
            .map(|p| (Side::Output, p))
    }

    pub fn find_param_by_name(&self, side: Side, name: &str) -> Option<&Parameter> {
        self.params(side).iter().find(|p| p.name() == name)
    }

    pub fn path(&self, id: PathId) -> Option<&ReturnPath> {
        self.return_paths.iter().find(|p| p.id == id)
    }

    pub(crate) fn path_mut(&mut self, id: PathId) -> Option<&mut ReturnPath> {
        self.return_paths.iter_mut().find(|p| p.id == id)
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
        self.version += 1;
    }

    pub(crate) fn add_incoming(&mut self, path: PathRef) {
        if !self.incoming.contains(&path) {
            self.incoming.push(path);
        }
    }

    pub(crate) fn remove_incoming(&mut self, path: PathRef) {
        self.incoming.retain(|p| *p != path);
    }

    pub(crate) fn take_incoming(&mut self) -> Vec<PathRef> {
        std::mem::take(&mut self.incoming)
    }

    pub(crate) fn set_stop_path_name(&mut self, name: Option<String>) {
        if let StepKind::Stop { path_name } = &mut self.kind {
            *path_name = name;
        }
    }

    /// Recompute connector displays and reserved angles.
    pub fn relayout(&mut self) {
        self.layout = ConnectorLayout::compute(&self.shape(), &self.inputs, &self.outputs);
        self.version += 1;
    }

    /// Nearest exit angle to `desired` that avoids every connector.
    pub fn best_path_angle(&self, desired: f64) -> f64 {
        best_path_angle(&self.layout.avoid, desired)
    }

    /// Mark outgoing paths whose label repeats another outgoing path's label.
    pub fn refresh_duplicate_names(&mut self, has_named_paths: bool) {
        let mut counts: HashMap<Option<String>, usize> = HashMap::new();
        for path in &self.return_paths {
            let label = path.display_label(has_named_paths).map(str::to_string);
            *counts.entry(label).or_default() += 1;
        }
        for path in &mut self.return_paths {
            let label = path.display_label(has_named_paths).map(str::to_string);
            path.duplicate_name = label.is_some() && counts.get(&label).copied().unwrap_or(0) > 1;
        }
    }

    /// Local validation.
    ///
    /// `parent` is the signature of the process containing this step; only
    /// stop steps consult it. `has_named_paths` describes the governing
    /// process and feeds the duplicate-label warning.
    pub fn validate(&mut self, parent: &Signature, has_named_paths: bool) -> bool {
        self.refresh_duplicate_names(has_named_paths);
        let inputs_bound = self.inputs.iter().all(Parameter::is_bound);
        let outputs_linked = self.outputs.iter().all(|p| p.link().is_some());
        let paths_connected = self.return_paths.iter().all(ReturnPath::is_connected);
        let stop_ok = match &self.kind {
            StepKind::Stop { path_name } => match path_name {
                None => parent.return_paths.is_empty(),
                Some(name) => parent.return_paths.iter().any(|p| p == name),
            },
            _ => true,
        };
        self.valid = inputs_bound && outputs_linked && paths_connected && stop_ok;
        self.valid
    }
}
