//! Process definitions.
//!
//! Every process exposes a signature: ordered inputs, ordered outputs and an
//! ordered list of return-path names. System processes are opaque and never
//! change after creation; user processes own a step graph and may have their
//! signature edited, which triggers propagation to every step that calls them.

use crate::error::{EditorError, Result};
use crate::graph::UserProcess;
use crate::model::data_type::TypeRegistry;
use crate::model::field::DataField;
use crate::model::id::ProcessId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The external contract of a process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub inputs: Vec<DataField>,
    pub outputs: Vec<DataField>,
    pub return_paths: Vec<String>,
}

impl Signature {
    pub fn new(inputs: Vec<DataField>, outputs: Vec<DataField>, return_paths: Vec<String>) -> Self {
        Self {
            inputs,
            outputs,
            return_paths,
        }
    }

    /// Positional equality over field names and types and path names.
    ///
    /// Initial values are not part of the contract and are ignored.
    pub fn matches(&self, other: &Signature) -> bool {
        fn fields_match(a: &[DataField], b: &[DataField]) -> bool {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_shape(y))
        }
        fields_match(&self.inputs, &other.inputs)
            && fields_match(&self.outputs, &other.outputs)
            && self.return_paths == other.return_paths
    }

    /// Return-path keys a calling step must carry: one per declared name, or a
    /// single unnamed path when none are declared.
    pub fn path_keys(&self) -> Vec<Option<String>> {
        if self.return_paths.is_empty() {
            vec![None]
        } else {
            self.return_paths.iter().cloned().map(Some).collect()
        }
    }

    pub fn has_named_paths(&self) -> bool {
        !self.return_paths.is_empty()
    }

    /// Reject empty or duplicate names and unresolved types.
    pub fn check(&self, types: &TypeRegistry) -> Result<()> {
        check_fields(&self.inputs, "input", types)?;
        check_fields(&self.outputs, "output", types)?;
        let mut seen = HashSet::new();
        for name in &self.return_paths {
            if name.trim().is_empty() {
                return Err(EditorError::MissingField("return path name".to_string()));
            }
            if !seen.insert(name.as_str()) {
                return Err(EditorError::DuplicateName {
                    kind: "return path",
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }
}

fn check_fields(fields: &[DataField], kind: &'static str, types: &TypeRegistry) -> Result<()> {
    let mut seen = HashSet::new();
    for field in fields {
        if field.name.trim().is_empty() {
            return Err(EditorError::MissingField(format!("{} name", kind)));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(EditorError::DuplicateName {
                kind,
                name: field.name.clone(),
            });
        }
        if types.get(field.type_id).is_none() {
            return Err(EditorError::UnknownType(format!(
                "{} (for {} '{}')",
                field.type_id, kind, field.name
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub enum ProcessKind {
    /// Opaque built-in process.
    System,
    /// Editable process with its own step graph.
    User(UserProcess),
}

#[derive(Debug, Clone)]
pub struct Process {
    pub id: ProcessId,
    pub name: String,
    pub signature: Signature,
    pub kind: ProcessKind,
}

impl Process {
    pub fn system(id: ProcessId, name: impl Into<String>, signature: Signature) -> Self {
        Self {
            id,
            name: name.into(),
            signature,
            kind: ProcessKind::System,
        }
    }

    pub fn user(
        id: ProcessId,
        name: impl Into<String>,
        signature: Signature,
        fixed_signature: bool,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            signature,
            kind: ProcessKind::User(UserProcess::new(fixed_signature)),
        }
    }

    pub fn is_editable(&self) -> bool {
        matches!(self.kind, ProcessKind::User(_))
    }

    /// Whether the user may change this process's signature.
    pub fn is_signature_editable(&self) -> bool {
        match &self.kind {
            ProcessKind::User(user) => !user.fixed_signature(),
            ProcessKind::System => false,
        }
    }

    pub fn as_user(&self) -> Option<&UserProcess> {
        match &self.kind {
            ProcessKind::User(user) => Some(user),
            ProcessKind::System => None,
        }
    }

    pub fn as_user_mut(&mut self) -> Option<&mut UserProcess> {
        match &mut self.kind {
            ProcessKind::User(user) => Some(user),
            ProcessKind::System => None,
        }
    }

    /// System processes are always valid.
    pub fn is_valid(&self) -> bool {
        self.as_user().map(|u| u.is_valid()).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::id::TypeId;

    fn number_registry() -> (TypeRegistry, TypeId) {
        let mut types = TypeRegistry::new();
        let number = types.add("Number", [0; 4], Some(r"\d+"), None).unwrap();
        (types, number)
    }

    #[test]
    fn test_signature_matches_is_positional() {
        let (_, n) = number_registry();
        let a = Signature::new(
            vec![DataField::new("a", n), DataField::new("b", n)],
            vec![DataField::new("sum", n)],
            vec![],
        );
        let mut b = a.clone();
        assert!(a.matches(&b));

        b.inputs.swap(0, 1);
        assert!(!a.matches(&b));

        let mut c = a.clone();
        c.inputs[0].initial_value = Some("1".to_string());
        assert!(a.matches(&c));

        let mut d = a.clone();
        d.return_paths.push("done".to_string());
        assert!(!a.matches(&d));
    }

    #[test]
    fn test_path_keys() {
        let sig = Signature::default();
        assert_eq!(sig.path_keys(), vec![None]);
        let named = Signature::new(vec![], vec![], vec!["yes".into(), "no".into()]);
        assert_eq!(
            named.path_keys(),
            vec![Some("yes".to_string()), Some("no".to_string())]
        );
    }

    #[test]
    fn test_check_rejects_duplicates() {
        let (types, n) = number_registry();
        let sig = Signature::new(
            vec![DataField::new("a", n), DataField::new("a", n)],
            vec![],
            vec![],
        );
        assert!(matches!(
            sig.check(&types),
            Err(EditorError::DuplicateName { kind: "input", .. })
        ));

        let paths = Signature::new(vec![], vec![], vec!["x".into(), "x".into()]);
        assert!(paths.check(&types).is_err());

        let unknown = Signature::new(vec![DataField::new("a", TypeId(9))], vec![], vec![]);
        assert!(matches!(
            unknown.check(&types),
            Err(EditorError::UnknownType(_))
        ));
    }

    #[test]
    fn test_system_process_not_editable() {
        let p = Process::system(ProcessId(0), "Print", Signature::default());
        assert!(!p.is_editable());
        assert!(!p.is_signature_editable());
        assert!(p.is_valid());

        let fixed = Process::user(ProcessId(1), "Wrapper", Signature::default(), true);
        assert!(fixed.is_editable());
        assert!(!fixed.is_signature_editable());
    }
}
