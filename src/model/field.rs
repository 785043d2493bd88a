//! Data fields: step parameters and process variables.
//!
//! A parameter reads either a fixed literal or a variable, never both. A
//! variable keeps back-references to every parameter bound to it. The two
//! sides are only ever updated together by `UserProcess::bind_variable` and
//! friends, so `param.link == Some(v)` holds exactly when `v.links` contains
//! the parameter.

use crate::model::id::{ParamId, ParamRef, TypeId, VariableId};
use serde::{Deserialize, Serialize};

/// Name, type and optional initial literal shared by parameters and variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataField {
    pub name: String,
    pub type_id: TypeId,
    #[serde(default)]
    pub initial_value: Option<String>,
}

impl DataField {
    pub fn new(name: impl Into<String>, type_id: TypeId) -> Self {
        Self {
            name: name.into(),
            type_id,
            initial_value: None,
        }
    }

    /// Same name and type.
    pub fn same_shape(&self, other: &DataField) -> bool {
        self.name == other.name && self.type_id == other.type_id
    }
}

/// A step-local copy of one signature field plus its binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub id: ParamId,
    pub field: DataField,
    link: Option<VariableId>,
}

impl Parameter {
    /// An unbound parameter shaped like `field`.
    pub fn from_signature(id: ParamId, field: &DataField) -> Self {
        Self {
            id,
            field: DataField::new(field.name.clone(), field.type_id),
            link: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }

    pub fn type_id(&self) -> TypeId {
        self.field.type_id
    }

    pub fn link(&self) -> Option<VariableId> {
        self.link
    }

    pub fn fixed_value(&self) -> Option<&str> {
        self.field.initial_value.as_deref()
    }

    /// Bound to a variable or holding a literal.
    pub fn is_bound(&self) -> bool {
        self.link.is_some() || self.field.initial_value.is_some()
    }

    // Only the owning process may touch the link, so both sides move together.
    pub(crate) fn set_link(&mut self, link: Option<VariableId>) {
        if link.is_some() {
            self.field.initial_value = None;
        }
        self.link = link;
    }

    pub(crate) fn set_fixed_value(&mut self, value: Option<String>) {
        if value.is_some() {
            self.link = None;
        }
        self.field.initial_value = value;
    }
}

/// A process-local variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub id: VariableId,
    pub field: DataField,
    links: Vec<ParamRef>,
}

impl Variable {
    pub fn new(id: VariableId, field: DataField) -> Self {
        Self {
            id,
            field,
            links: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }

    pub fn type_id(&self) -> TypeId {
        self.field.type_id
    }

    /// Every parameter currently bound to this variable.
    pub fn links(&self) -> &[ParamRef] {
        &self.links
    }

    pub(crate) fn add_link(&mut self, param: ParamRef) {
        if !self.links.contains(&param) {
            self.links.push(param);
        }
    }

    pub(crate) fn remove_link(&mut self, param: ParamRef) {
        self.links.retain(|p| *p != param);
    }

    pub(crate) fn take_links(&mut self) -> Vec<ParamRef> {
        std::mem::take(&mut self.links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::id::StepId;

    #[test]
    fn test_parameter_value_and_link_are_exclusive() {
        let field = DataField::new("a", TypeId(0));
        let mut p = Parameter::from_signature(ParamId(1), &field);
        assert!(!p.is_bound());

        p.set_fixed_value(Some("2".to_string()));
        assert_eq!(p.fixed_value(), Some("2"));
        p.set_link(Some(VariableId(3)));
        assert_eq!(p.fixed_value(), None);
        assert_eq!(p.link(), Some(VariableId(3)));

        p.set_fixed_value(Some("4".to_string()));
        assert_eq!(p.link(), None);
        assert!(p.is_bound());
    }

    #[test]
    fn test_signature_copy_drops_initial_value() {
        let mut field = DataField::new("a", TypeId(0));
        field.initial_value = Some("7".to_string());
        let p = Parameter::from_signature(ParamId(0), &field);
        assert_eq!(p.fixed_value(), None);
        assert!(p.field.same_shape(&field));
    }

    #[test]
    fn test_variable_links_deduplicate() {
        let mut v = Variable::new(VariableId(0), DataField::new("x", TypeId(0)));
        let r = ParamRef {
            step: StepId(1),
            param: ParamId(2),
        };
        v.add_link(r);
        v.add_link(r);
        assert_eq!(v.links().len(), 1);
        v.remove_link(r);
        assert!(v.links().is_empty());
    }
}
