//! Test data builders for creating test workspaces

use procflow::geometry::Position;
use procflow::model::field::DataField;
use procflow::model::id::{ProcessId, StepId, TypeId};
use procflow::model::process::Signature;
use procflow::model::step::StepKind;
use procflow::Workspace;

/// Workspace with a `Number` type derived from `Text`.
pub struct Types {
    pub ws: Workspace,
    pub text: TypeId,
    pub number: TypeId,
}

pub fn number_types() -> Types {
    let mut ws = Workspace::new();
    let text = ws.types.add("Text", [0, 160, 0, 255], Some(".*"), None).unwrap();
    let number = ws
        .types
        .add("Number", [0, 0, 255, 255], Some(r"-?\d+(\.\d+)?"), Some(text))
        .unwrap();
    Types { ws, text, number }
}

/// Builder for process signatures
#[derive(Default)]
pub struct SignatureBuilder {
    inputs: Vec<DataField>,
    outputs: Vec<DataField>,
    paths: Vec<String>,
}

impl SignatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, name: &str, type_id: TypeId) -> Self {
        self.inputs.push(DataField::new(name, type_id));
        self
    }

    pub fn output(mut self, name: &str, type_id: TypeId) -> Self {
        self.outputs.push(DataField::new(name, type_id));
        self
    }

    pub fn path(mut self, name: &str) -> Self {
        self.paths.push(name.to_string());
        self
    }

    pub fn build(self) -> Signature {
        Signature::new(self.inputs, self.outputs, self.paths)
    }
}

/// Add a call to `callee` inside `process`.
pub fn add_call(ws: &mut Workspace, process: ProcessId, callee: ProcessId, at: Position) -> StepId {
    ws.add_step(process, StepKind::ProcessCall { process: callee }, at)
        .unwrap()
}

pub fn add_stop(ws: &mut Workspace, process: ProcessId, path_name: Option<&str>, at: Position) -> StepId {
    ws.add_step(
        process,
        StepKind::Stop {
            path_name: path_name.map(str::to_string),
        },
        at,
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_builder() {
        let t = number_types();
        let sig = SignatureBuilder::new()
            .input("a", t.number)
            .output("sum", t.number)
            .path("ok")
            .build();
        assert_eq!(sig.inputs[0].name, "a");
        assert_eq!(sig.outputs[0].type_id, t.number);
        assert_eq!(sig.return_paths, vec!["ok".to_string()]);
    }
}
