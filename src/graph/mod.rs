//! The step graph of a user process.
//!
//! `UserProcess` owns its steps and variables in flat `Vec`s and refers
//! between them with arena IDs. Every mutation that touches a two-sided
//! relation goes through one method here so both sides stay in sync:
//!
//! ```text
//! Parameter.link ──────────► Variable
//!        ▲                      │
//!        └──── Variable.links ◄─┘
//!
//! ReturnPath.to ───────────► Step
//!        ▲                      │
//!        └──── Step.incoming ◄──┘
//! ```
//!
//! Steps are kept in draw order: the last step is topmost.

use crate::error::{EditorError, Result};
use crate::geometry::Position;
use crate::layout::routing::{fan_out_angle, RouteEnd, RouteGeometry};
use crate::model::data_type::TypeRegistry;
use crate::model::field::{DataField, Parameter, Variable};
use crate::model::id::{
    ParamId, ParamRef, PathId, PathRef, ProcessId, Side, StepId, TypeId, VariableId,
};
use crate::model::process::Signature;
use crate::model::return_path::{ReturnPath, RouteKey};
use crate::model::step::{Step, StepKind};
use tracing::debug;

/// Length of a freshly created dangling path.
pub const DEFAULT_DANGLING_LENGTH: f64 = 80.0;

/// Graph state of an editable process.
#[derive(Debug, Clone)]
pub struct UserProcess {
    steps: Vec<Step>,
    variables: Vec<Variable>,
    fixed_signature: bool,
    next_step_id: u32,
    next_param_id: u32,
    next_path_id: u32,
    next_variable_id: u32,
    valid: bool,
}

impl UserProcess {
    pub fn new(fixed_signature: bool) -> Self {
        Self {
            steps: Vec::new(),
            variables: Vec::new(),
            fixed_signature,
            next_step_id: 0,
            next_param_id: 0,
            next_path_id: 0,
            next_variable_id: 0,
            valid: false,
        }
    }

    pub fn fixed_signature(&self) -> bool {
        self.fixed_signature
    }

    /// Result of the last [`UserProcess::validate`].
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    // ── Lookup ──────────────────────────────────────────────────────────

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.steps.iter().find(|s| s.unique_id == id)
    }

    pub(crate) fn step_mut(&mut self, id: StepId) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.unique_id == id)
    }

    fn step_index(&self, id: StepId) -> Result<usize> {
        self.steps
            .iter()
            .position(|s| s.unique_id == id)
            .ok_or_else(|| EditorError::UnknownStep(id.to_string()))
    }

    pub fn variable(&self, id: VariableId) -> Option<&Variable> {
        self.variables.iter().find(|v| v.id == id)
    }

    fn variable_mut(&mut self, id: VariableId) -> Option<&mut Variable> {
        self.variables.iter_mut().find(|v| v.id == id)
    }

    pub fn find_variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name() == name)
    }

    pub fn param(&self, param: ParamRef) -> Option<(Side, &Parameter)> {
        self.step(param.step)?.find_param(param.param)
    }

    pub fn path(&self, path: PathRef) -> Option<&ReturnPath> {
        self.step(path.step)?.path(path.path)
    }

    /// Steps whose governing process is `process`.
    pub fn steps_calling(&self, process: ProcessId) -> impl Iterator<Item = &Step> + '_ {
        self.steps
            .iter()
            .filter(move |s| s.governing_process() == Some(process))
    }

    pub fn start_step(&self) -> Option<&Step> {
        self.steps.iter().find(|s| matches!(s.kind, StepKind::Start))
    }

    // ── ID allocation ───────────────────────────────────────────────────

    pub fn allocate_step_id(&mut self) -> Result<StepId> {
        let id = StepId(self.next_step_id);
        self.next_step_id = self
            .next_step_id
            .checked_add(1)
            .ok_or(EditorError::IdsExhausted("step"))?;
        Ok(id)
    }

    /// Record an ID read from storage so fresh IDs never collide with it.
    ///
    /// The last representable ID is refused: nothing could be allocated
    /// after it.
    pub fn note_used_step_id(&mut self, id: StepId) -> Result<()> {
        let next = id.0.checked_add(1).ok_or(EditorError::IdsExhausted("step"))?;
        self.next_step_id = self.next_step_id.max(next);
        Ok(())
    }

    fn allocate_param_id(&mut self) -> ParamId {
        let id = ParamId(self.next_param_id);
        self.next_param_id += 1;
        id
    }

    fn allocate_path_id(&mut self) -> PathId {
        let id = PathId(self.next_path_id);
        self.next_path_id += 1;
        id
    }

    fn allocate_variable_id(&mut self) -> VariableId {
        let id = VariableId(self.next_variable_id);
        self.next_variable_id += 1;
        id
    }

    fn params_for(&mut self, fields: &[DataField]) -> Vec<Parameter> {
        fields
            .iter()
            .map(|field| Parameter::from_signature(self.allocate_param_id(), field))
            .collect()
    }

    // ── Steps ───────────────────────────────────────────────────────────

    /// Add a step with a fresh ID.
    ///
    /// `parent` is the signature of this process; `governing` is the
    /// signature of the called process for process-call steps.
    pub fn add_step(
        &mut self,
        kind: StepKind,
        position: Position,
        parent: &Signature,
        governing: Option<&Signature>,
        dangling_length: f64,
    ) -> Result<StepId> {
        let id = self.allocate_step_id()?;
        self.insert_step(id, kind, position, parent, governing, dangling_length)?;
        Ok(id)
    }

    /// Add a step under an ID read from storage.
    pub fn insert_step(
        &mut self,
        id: StepId,
        kind: StepKind,
        position: Position,
        parent: &Signature,
        governing: Option<&Signature>,
        dangling_length: f64,
    ) -> Result<()> {
        if self.step(id).is_some() {
            return Err(EditorError::DuplicateName {
                kind: "step",
                name: id.to_string(),
            });
        }
        self.note_used_step_id(id)?;

        let empty = Signature::default();
        let (input_fields, output_fields, path_keys) = match &kind {
            StepKind::Start => (&empty.inputs, &parent.inputs, vec![None]),
            StepKind::Stop { .. } => (&parent.outputs, &empty.outputs, Vec::new()),
            StepKind::ProcessCall { process } => {
                let governing =
                    governing.ok_or_else(|| EditorError::UnknownProcess(process.to_string()))?;
                (&governing.inputs, &governing.outputs, governing.path_keys())
            }
        };
        let inputs = self.params_for(input_fields);
        let outputs = self.params_for(output_fields);
        self.steps
            .push(Step::new(id, kind, position, inputs, outputs));
        self.reconcile_paths(id, &path_keys, dangling_length)?;
        debug!("Added step {} at ({:.0}, {:.0})", id, position.x, position.y);
        Ok(())
    }

    /// Remove a step and cut every relation that points at it.
    ///
    /// Paths from other steps that ended here are left dangling where the
    /// step used to be.
    pub fn remove_step(&mut self, id: StepId) -> Result<Step> {
        let index = self.step_index(id)?;
        let mut step = self.steps.remove(index);
        let position = step.position();

        for incoming in step.take_incoming() {
            if incoming.step == id {
                continue;
            }
            if let Some(owner) = self.step_mut(incoming.step) {
                let offset = position - owner.position();
                if let Some(path) = owner.path_mut(incoming.path) {
                    path.set_target(None);
                    path.set_end_offset(offset);
                }
            }
        }

        for path in &step.return_paths {
            if let Some(target) = path.to().filter(|t| *t != id) {
                if let Some(target) = self.step_mut(target) {
                    target.remove_incoming(PathRef {
                        step: id,
                        path: path.id,
                    });
                }
            }
        }

        for param in step.inputs.iter().chain(step.outputs.iter()) {
            if let Some(variable) = param.link().and_then(|v| self.variable_mut(v)) {
                variable.remove_link(ParamRef {
                    step: id,
                    param: param.id,
                });
            }
        }

        debug!("Removed step {}", id);
        Ok(step)
    }

    pub fn move_step(&mut self, id: StepId, position: Position) -> Result<()> {
        let index = self.step_index(id)?;
        self.steps[index].set_position(position);
        Ok(())
    }

    /// Move a step to the top of the draw order.
    pub fn raise_step(&mut self, id: StepId) -> Result<()> {
        let index = self.step_index(id)?;
        let step = self.steps.remove(index);
        self.steps.push(step);
        Ok(())
    }

    /// Choose which return path of this process a stop step ends on.
    pub fn set_stop_path_name(
        &mut self,
        id: StepId,
        name: Option<String>,
        parent: &Signature,
    ) -> Result<()> {
        if let Some(name) = &name {
            if !parent.return_paths.contains(name) {
                return Err(EditorError::UnknownPath(name.clone()));
            }
        }
        let index = self.step_index(id)?;
        if !matches!(self.steps[index].kind, StepKind::Stop { .. }) {
            return Err(EditorError::UnknownStep(format!("{} is not a stop step", id)));
        }
        self.steps[index].set_stop_path_name(name);
        Ok(())
    }

    // ── Variables ───────────────────────────────────────────────────────

    pub fn add_variable(&mut self, field: DataField, types: &TypeRegistry) -> Result<VariableId> {
        self.check_variable_field(&field, None, types)?;
        let id = self.allocate_variable_id();
        self.variables.push(Variable::new(id, field));
        Ok(id)
    }

    /// Replace a variable's name, type or initial value.
    ///
    /// A type change is refused while any bound parameter would no longer
    /// accept it.
    pub fn update_variable(
        &mut self,
        id: VariableId,
        field: DataField,
        types: &TypeRegistry,
    ) -> Result<()> {
        self.check_variable_field(&field, Some(id), types)?;
        let variable = self
            .variable(id)
            .ok_or_else(|| EditorError::UnknownVariable(id.to_string()))?;
        if variable.type_id() != field.type_id {
            for link in variable.links() {
                if let Some((side, param)) = self.param(*link) {
                    if !Self::compatible(types, side, param.type_id(), field.type_id) {
                        return Err(EditorError::TypeMismatch {
                            parameter: param.name().to_string(),
                            variable: field.name.clone(),
                        });
                    }
                }
            }
        }
        if let Some(variable) = self.variable_mut(id) {
            variable.field = field;
        }
        Ok(())
    }

    pub fn rename_variable(&mut self, id: VariableId, name: &str, types: &TypeRegistry) -> Result<()> {
        let mut field = self
            .variable(id)
            .ok_or_else(|| EditorError::UnknownVariable(id.to_string()))?
            .field
            .clone();
        field.name = name.to_string();
        self.update_variable(id, field, types)
    }

    /// Remove a variable and unbind every parameter linked to it.
    pub fn remove_variable(&mut self, id: VariableId) -> Result<Variable> {
        let index = self
            .variables
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| EditorError::UnknownVariable(id.to_string()))?;
        let mut variable = self.variables.remove(index);
        for link in variable.take_links() {
            if let Some((_, param)) = self
                .step_mut(link.step)
                .and_then(|s| s.find_param_mut(link.param))
            {
                param.set_link(None);
            }
        }
        Ok(variable)
    }

    fn check_variable_field(
        &self,
        field: &DataField,
        existing: Option<VariableId>,
        types: &TypeRegistry,
    ) -> Result<()> {
        if field.name.trim().is_empty() {
            return Err(EditorError::MissingField("variable name".to_string()));
        }
        let data_type = types
            .get(field.type_id)
            .ok_or_else(|| EditorError::UnknownType(field.type_id.to_string()))?;
        if self
            .variables
            .iter()
            .any(|v| v.name() == field.name && Some(v.id) != existing)
        {
            return Err(EditorError::DuplicateName {
                kind: "variable",
                name: field.name.clone(),
            });
        }
        if let Some(value) = &field.initial_value {
            if !data_type.is_valid(value) {
                return Err(EditorError::InvalidFixedValue {
                    type_name: data_type.name.clone(),
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    // ── Bindings ────────────────────────────────────────────────────────

    /// Inputs read a variable of the same or a more derived type; outputs
    /// write into a variable of the same or a more general type.
    fn compatible(
        types: &TypeRegistry,
        side: Side,
        param_type: TypeId,
        variable_type: TypeId,
    ) -> bool {
        match side {
            Side::Input => types.is_assignable(param_type, variable_type),
            Side::Output => types.is_assignable(variable_type, param_type),
        }
    }

    /// Bind a parameter to a variable, replacing any literal or previous link.
    pub fn bind_variable(
        &mut self,
        param: ParamRef,
        variable: VariableId,
        types: &TypeRegistry,
    ) -> Result<()> {
        let (side, current) = self
            .param(param)
            .ok_or_else(|| EditorError::UnknownParameter(param.param.to_string()))?;
        let target = self
            .variable(variable)
            .ok_or_else(|| EditorError::UnknownVariable(variable.to_string()))?;
        if !Self::compatible(types, side, current.type_id(), target.type_id()) {
            return Err(EditorError::TypeMismatch {
                parameter: current.name().to_string(),
                variable: target.name().to_string(),
            });
        }
        let previous = current.link();

        if let Some(old) = previous.and_then(|v| self.variable_mut(v)) {
            old.remove_link(param);
        }
        if let Some((_, p)) = self
            .step_mut(param.step)
            .and_then(|s| s.find_param_mut(param.param))
        {
            p.set_link(Some(variable));
        }
        if let Some(v) = self.variable_mut(variable) {
            v.add_link(param);
        }
        Ok(())
    }

    /// Give an input parameter a literal, replacing any link.
    pub fn set_fixed_value(
        &mut self,
        param: ParamRef,
        value: &str,
        types: &TypeRegistry,
    ) -> Result<()> {
        let (side, current) = self
            .param(param)
            .ok_or_else(|| EditorError::UnknownParameter(param.param.to_string()))?;
        if side == Side::Output {
            return Err(EditorError::FixedOutput(current.name().to_string()));
        }
        if !types.is_valid_value(current.type_id(), value) {
            return Err(EditorError::InvalidFixedValue {
                type_name: types.name_of(current.type_id()).to_string(),
                value: value.to_string(),
            });
        }
        let previous = current.link();
        if let Some(old) = previous.and_then(|v| self.variable_mut(v)) {
            old.remove_link(param);
        }
        if let Some((_, p)) = self
            .step_mut(param.step)
            .and_then(|s| s.find_param_mut(param.param))
        {
            p.set_fixed_value(Some(value.to_string()));
        }
        Ok(())
    }

    /// Drop both the literal and the link.
    pub fn clear_binding(&mut self, param: ParamRef) -> Result<()> {
        let (_, current) = self
            .param(param)
            .ok_or_else(|| EditorError::UnknownParameter(param.param.to_string()))?;
        if let Some(old) = current.link().and_then(|v| self.variable_mut(v)) {
            old.remove_link(param);
        }
        if let Some((_, p)) = self
            .step_mut(param.step)
            .and_then(|s| s.find_param_mut(param.param))
        {
            p.set_link(None);
            p.set_fixed_value(None);
        }
        Ok(())
    }

    // ── Return paths ────────────────────────────────────────────────────

    /// Point a return path at `target`. Start steps refuse incoming paths.
    pub fn connect_path(&mut self, path: PathRef, target: StepId) -> Result<()> {
        let to = self
            .step(target)
            .ok_or_else(|| EditorError::UnknownStep(target.to_string()))?;
        if !to.kind.accepts_incoming() {
            return Err(EditorError::InvalidDropTarget(format!(
                "{} step {} does not accept return paths",
                to.kind.display_name(),
                target
            )));
        }
        let previous = self
            .path(path)
            .ok_or_else(|| EditorError::UnknownPath(path.path.to_string()))?
            .to();
        if let Some(old) = previous.and_then(|t| self.step_mut(t)) {
            old.remove_incoming(path);
        }
        if let Some(p) = self.step_mut(path.step).and_then(|s| s.path_mut(path.path)) {
            p.set_target(Some(target));
        }
        if let Some(to) = self.step_mut(target) {
            to.add_incoming(path);
        }
        Ok(())
    }

    /// Detach a return path, leaving its free end at `end_offset` from its owner.
    pub fn disconnect_path(&mut self, path: PathRef, end_offset: Position) -> Result<()> {
        let previous = self
            .path(path)
            .ok_or_else(|| EditorError::UnknownPath(path.path.to_string()))?
            .to();
        if let Some(old) = previous.and_then(|t| self.step_mut(t)) {
            old.remove_incoming(path);
        }
        if let Some(p) = self.step_mut(path.step).and_then(|s| s.path_mut(path.path)) {
            p.set_target(None);
            p.set_end_offset(end_offset);
        }
        Ok(())
    }

    /// Move the free end of a dangling path.
    pub fn set_path_end_offset(&mut self, path: PathRef, end_offset: Position) -> Result<()> {
        let p = self
            .step_mut(path.step)
            .and_then(|s| s.path_mut(path.path))
            .ok_or_else(|| EditorError::UnknownPath(path.path.to_string()))?;
        p.set_end_offset(end_offset);
        Ok(())
    }

    // ── Signature reconciliation ────────────────────────────────────────

    /// Match one side of a step against `fields` by name and type.
    ///
    /// Matching parameters keep their binding; the rest are dropped and
    /// unlinked; missing ones are added unbound. Returns whether anything
    /// changed.
    pub(crate) fn reconcile_params(
        &mut self,
        step: StepId,
        side: Side,
        fields: &[DataField],
    ) -> Result<bool> {
        let index = self.step_index(step)?;
        let old = self.steps[index].params(side).to_vec();
        let mut kept = vec![false; old.len()];
        let mut next = Vec::with_capacity(fields.len());

        for field in fields {
            let matching = old.iter().enumerate().position(|(i, p)| {
                !kept[i] && p.name() == field.name && p.type_id() == field.type_id
            });
            match matching {
                Some(i) => {
                    kept[i] = true;
                    next.push(old[i].clone());
                }
                None => next.push(Parameter::from_signature(self.allocate_param_id(), field)),
            }
        }

        for (param, _) in old.iter().zip(&kept).filter(|(_, kept)| !**kept) {
            if let Some(variable) = param.link().and_then(|v| self.variable_mut(v)) {
                variable.remove_link(ParamRef {
                    step,
                    param: param.id,
                });
            }
        }

        let changed = !old.iter().map(|p| p.id).eq(next.iter().map(|p| p.id));
        *self.steps[index].params_mut(side) = next;
        Ok(changed)
    }

    /// Match a step's outgoing paths against `keys` by name.
    ///
    /// New paths start dangling, fanned out away from the kept ones.
    pub(crate) fn reconcile_paths(
        &mut self,
        step: StepId,
        keys: &[Option<String>],
        dangling_length: f64,
    ) -> Result<bool> {
        let index = self.step_index(step)?;
        let old = self.steps[index].return_paths.clone();
        let mut kept = vec![false; old.len()];
        let mut next = Vec::with_capacity(keys.len());
        let mut used_angles = Vec::new();
        let mut missing = Vec::new();

        for key in keys {
            let matching = old
                .iter()
                .enumerate()
                .position(|(i, p)| !kept[i] && &p.name == key);
            match matching {
                Some(i) => {
                    kept[i] = true;
                    if let Some(route) = self.route(PathRef {
                        step,
                        path: old[i].id,
                    }) {
                        used_angles.push(route.start.angle);
                    }
                    next.push(Some(old[i].clone()));
                }
                None => {
                    missing.push((next.len(), key.clone()));
                    next.push(None);
                }
            }
        }

        for (slot, name) in missing {
            let angle = fan_out_angle(&self.steps[index].layout().avoid, &used_angles);
            used_angles.push(angle);
            let offset = Position::from_angle(angle) * dangling_length;
            let id = self.allocate_path_id();
            next[slot] = Some(ReturnPath::dangling(id, step, name, offset));
        }

        for (path, _) in old.iter().zip(&kept).filter(|(_, kept)| !**kept) {
            if let Some(target) = path.to() {
                if let Some(target) = self.step_mut(target) {
                    target.remove_incoming(PathRef {
                        step,
                        path: path.id,
                    });
                }
            }
        }

        let mut next: Vec<ReturnPath> = next.into_iter().flatten().collect();
        let only = next.len() == 1;
        for path in &mut next {
            path.only_path = only;
        }
        let changed = !old.iter().map(|p| p.id).eq(next.iter().map(|p| p.id));
        self.steps[index].return_paths = next;
        Ok(changed)
    }

    /// Re-derive one step's parameters and paths from its source signature.
    pub(crate) fn reconcile_step(
        &mut self,
        step: StepId,
        parent: &Signature,
        governing: Option<&Signature>,
        dangling_length: f64,
    ) -> Result<bool> {
        let kind = self
            .step(step)
            .ok_or_else(|| EditorError::UnknownStep(step.to_string()))?
            .kind
            .clone();
        let mut changed = false;
        match &kind {
            StepKind::Start => {
                changed |= self.reconcile_params(step, Side::Output, &parent.inputs)?;
            }
            StepKind::Stop { path_name } => {
                changed |= self.reconcile_params(step, Side::Input, &parent.outputs)?;
                let orphaned = path_name
                    .as_ref()
                    .is_some_and(|name| !parent.return_paths.contains(name));
                if orphaned {
                    if let Some(s) = self.step_mut(step) {
                        s.set_stop_path_name(None);
                    }
                    changed = true;
                }
            }
            StepKind::ProcessCall { process } => {
                let governing =
                    governing.ok_or_else(|| EditorError::UnknownProcess(process.to_string()))?;
                changed |= self.reconcile_params(step, Side::Input, &governing.inputs)?;
                changed |= self.reconcile_params(step, Side::Output, &governing.outputs)?;
            }
        }
        if let Some(s) = self.step_mut(step) {
            s.relayout();
        }
        if let StepKind::ProcessCall { .. } = kind {
            if let Some(governing) = governing {
                changed |= self.reconcile_paths(step, &governing.path_keys(), dangling_length)?;
            }
        }
        Ok(changed)
    }

    // ── Routing ─────────────────────────────────────────────────────────

    fn route_key(&self, from: &Step, path: &ReturnPath) -> RouteKey {
        RouteKey {
            from_version: from.version(),
            to_version: path
                .to()
                .and_then(|t| self.step(t))
                .map(|t| t.version()),
            epoch: path.epoch(),
        }
    }

    fn compute_route(&self, from: &Step, path: &ReturnPath) -> RouteGeometry {
        let from_shape = from.shape();
        let from_end = RouteEnd {
            center: from.position(),
            shape: &from_shape,
            avoid: &from.layout().avoid,
        };
        match path.to().and_then(|t| self.step(t)) {
            Some(to) if to.unique_id == from.unique_id => RouteGeometry::self_loop(from_end),
            Some(to) => {
                let to_shape = to.shape();
                let to_end = RouteEnd {
                    center: to.position(),
                    shape: &to_shape,
                    avoid: &to.layout().avoid,
                };
                RouteGeometry::between(from_end, Some(to_end), path.end_offset())
            }
            None => RouteGeometry::between(from_end, None, path.end_offset()),
        }
    }

    /// Current geometry of a path, from the cache when still valid.
    pub fn route(&self, path: PathRef) -> Option<RouteGeometry> {
        let from = self.step(path.step)?;
        let p = from.path(path.path)?;
        let key = self.route_key(from, p);
        Some(
            p.cached_route(&key)
                .copied()
                .unwrap_or_else(|| self.compute_route(from, p)),
        )
    }

    /// Recompute every stale cached route.
    pub fn refresh_routes(&mut self) -> usize {
        let mut stale = Vec::new();
        for step in &self.steps {
            for path in &step.return_paths {
                let key = self.route_key(step, path);
                if path.cached_route(&key).is_none() {
                    stale.push((step.unique_id, path.id, key, self.compute_route(step, path)));
                }
            }
        }
        let count = stale.len();
        for (step, path, key, geometry) in stale {
            if let Some(p) = self.step_mut(step).and_then(|s| s.path_mut(path)) {
                p.store_route(key, geometry);
            }
        }
        if count > 0 {
            debug!("Recomputed {} return-path routes", count);
        }
        count
    }

    // ── Validation ──────────────────────────────────────────────────────

    /// Validate every step; the process is valid iff all of them are.
    ///
    /// `named_paths` reports whether a governing process declares return-path
    /// names.
    pub fn validate(&mut self, parent: &Signature, named_paths: &dyn Fn(ProcessId) -> bool) -> bool {
        let mut valid = true;
        for step in &mut self.steps {
            let named = step.governing_process().map(named_paths).unwrap_or(false);
            valid &= step.validate(parent, named);
        }
        self.valid = valid;
        valid
    }
}
