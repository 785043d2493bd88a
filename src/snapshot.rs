//! Save path: a serializable image of a workspace.
//!
//! Types and processes are referenced by name, steps by their stored ID, so
//! a snapshot does not depend on the arena IDs of the workspace that produced
//! it. Taking a snapshot is refused while any user process is invalid.
//!
//! # Example
//!
//! ```ignore
//! let snapshot = WorkspaceSnapshot::capture(&workspace)?;
//! snapshot.save("flows.json")?;
//!
//! let restored = WorkspaceSnapshot::load("flows.json")?.restore();
//! ```

use crate::error::{EditorError, Result, ResultExt};
use crate::geometry::Position;
use crate::load::WorkspaceLoader;
use crate::model::field::{DataField, Parameter};
use crate::model::id::{Side, StepId, VariableId};
use crate::model::process::{Process, ProcessKind, Signature};
use crate::model::step::{Step, StepKind};
use crate::render::Color;
use crate::workspace::Workspace;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeRecord {
    pub name: String,
    #[serde(default = "default_type_color")]
    pub color: Color,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
}

fn default_type_color() -> Color {
    [128, 128, 128, 255]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub initial_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    #[serde(default)]
    pub inputs: Vec<FieldRecord>,
    #[serde(default)]
    pub outputs: Vec<FieldRecord>,
    #[serde(default)]
    pub return_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant")]
pub enum StepVariant {
    Start,
    Stop {
        #[serde(default)]
        path_name: Option<String>,
    },
    ProcessCall {
        /// Name of the governing process.
        process: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingValue {
    Fixed(String),
    Variable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingRecord {
    pub side: Side,
    pub parameter: String,
    pub value: BindingValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub target: Option<StepId>,
    /// Free-end offset of a dangling path.
    #[serde(default)]
    pub end_offset: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub id: StepId,
    #[serde(flatten)]
    pub variant: StepVariant,
    pub position: Position,
    #[serde(default)]
    pub bindings: Vec<BindingRecord>,
    #[serde(default)]
    pub paths: Vec<PathRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub name: String,
    /// Opaque built-in process with no graph.
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub fixed_signature: bool,
    #[serde(default)]
    pub signature: SignatureRecord,
    #[serde(default)]
    pub variables: Vec<FieldRecord>,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

/// A complete, name-addressed image of a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    /// Format version for future migration support
    #[serde(default = "default_snapshot_version")]
    pub version: u32,
    #[serde(default)]
    pub types: Vec<TypeRecord>,
    #[serde(default)]
    pub processes: Vec<ProcessRecord>,
}

fn default_snapshot_version() -> u32 {
    1
}

impl WorkspaceSnapshot {
    /// Enumerate everything needed to rebuild `workspace`.
    pub fn capture(workspace: &Workspace) -> Result<Self> {
        let invalid = workspace.invalid_processes();
        if !invalid.is_empty() {
            warn!("Refusing to save: invalid processes {:?}", invalid);
            return Err(EditorError::InvalidProcesses(invalid));
        }

        let types = workspace
            .types
            .iter()
            .map(|t| TypeRecord {
                name: t.name.clone(),
                color: t.color,
                pattern: t.pattern().map(str::to_string),
                parent: t.parent.map(|p| workspace.types.name_of(p).to_string()),
            })
            .collect();
        let processes = workspace
            .processes()
            .iter()
            .map(|p| capture_process(workspace, p))
            .collect();

        Ok(Self {
            version: default_snapshot_version(),
            types,
            processes,
        })
    }

    /// Rebuild a workspace; problems land in its error sink.
    pub fn restore(&self) -> Workspace {
        WorkspaceLoader::load(self)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write {:?}", path))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        Self::from_json(&content).with_context(|| format!("Failed to parse {:?}", path))
    }
}

fn field_record(workspace: &Workspace, field: &DataField) -> FieldRecord {
    FieldRecord {
        name: field.name.clone(),
        type_name: workspace.types.name_of(field.type_id).to_string(),
        initial_value: field.initial_value.clone(),
    }
}

pub(crate) fn signature_record(workspace: &Workspace, signature: &Signature) -> SignatureRecord {
    SignatureRecord {
        inputs: signature
            .inputs
            .iter()
            .map(|f| field_record(workspace, f))
            .collect(),
        outputs: signature
            .outputs
            .iter()
            .map(|f| field_record(workspace, f))
            .collect(),
        return_paths: signature.return_paths.clone(),
    }
}

fn capture_process(workspace: &Workspace, process: &Process) -> ProcessRecord {
    let mut record = ProcessRecord {
        name: process.name.clone(),
        system: true,
        fixed_signature: false,
        signature: signature_record(workspace, &process.signature),
        variables: Vec::new(),
        steps: Vec::new(),
    };
    if let ProcessKind::User(graph) = &process.kind {
        record.system = false;
        record.fixed_signature = graph.fixed_signature();
        record.variables = graph
            .variables()
            .iter()
            .map(|v| field_record(workspace, &v.field))
            .collect();
        record.steps = graph
            .steps()
            .iter()
            .map(|step| {
                let variable_name = |id| graph.variable(id).map(|v| v.name().to_string());
                capture_step(workspace, step, &variable_name)
            })
            .collect();
    }
    record
}

fn capture_step(
    workspace: &Workspace,
    step: &Step,
    variable_name: &dyn Fn(VariableId) -> Option<String>,
) -> StepRecord {
    let variant = match &step.kind {
        StepKind::Start => StepVariant::Start,
        StepKind::Stop { path_name } => StepVariant::Stop {
            path_name: path_name.clone(),
        },
        StepKind::ProcessCall { process } => StepVariant::ProcessCall {
            process: workspace.process_name(*process).to_string(),
        },
    };

    let binding = |side: Side, param: &Parameter| {
        let value = match (param.link(), param.fixed_value()) {
            (Some(link), _) => BindingValue::Variable(variable_name(link)?),
            (None, Some(value)) => BindingValue::Fixed(value.to_string()),
            (None, None) => return None,
        };
        Some(BindingRecord {
            side,
            parameter: param.name().to_string(),
            value,
        })
    };
    let bindings = step
        .inputs
        .iter()
        .filter_map(|p| binding(Side::Input, p))
        .chain(step.outputs.iter().filter_map(|p| binding(Side::Output, p)))
        .collect();

    let paths = step
        .return_paths
        .iter()
        .map(|p| PathRecord {
            name: p.name.clone(),
            target: p.to(),
            end_offset: (!p.is_connected()).then(|| p.end_offset()),
        })
        .collect();

    StepRecord {
        id: step.unique_id,
        variant,
        position: step.position(),
        bindings,
        paths,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::id::PathRef;
    use tempfile::tempdir;

    fn valid_workspace() -> Workspace {
        let mut ws = Workspace::new();
        ws.types.add("Number", [10, 20, 30, 255], Some(r"\d+"), None).unwrap();
        let main = ws.create_user_process("Main", Signature::default()).unwrap();
        let stop = ws
            .add_step(main, StepKind::Stop { path_name: None }, Position::new(320.0, 160.0))
            .unwrap();
        let start = ws.graph(main).unwrap().start_step().unwrap();
        let path = PathRef {
            step: start.unique_id,
            path: start.return_paths[0].id,
        };
        ws.connect_path(main, path, stop).unwrap();
        ws
    }

    #[test]
    fn test_capture_refused_while_invalid() {
        let mut ws = Workspace::new();
        ws.create_user_process("Broken", Signature::default()).unwrap();
        let err = WorkspaceSnapshot::capture(&ws).unwrap_err();
        assert!(matches!(err, EditorError::InvalidProcesses(ref names) if names == &["Broken"]));
    }

    #[test]
    fn test_capture_enumerates_steps() {
        let ws = valid_workspace();
        let snapshot = WorkspaceSnapshot::capture(&ws).unwrap();
        assert_eq!(snapshot.types[0].name, "Number");
        let main = &snapshot.processes[0];
        assert!(!main.system);
        assert_eq!(main.steps.len(), 2);
        assert_eq!(main.steps[0].variant, StepVariant::Start);
        assert_eq!(main.steps[0].paths[0].target, Some(main.steps[1].id));
        assert_eq!(main.steps[0].paths[0].end_offset, None);
    }

    #[test]
    fn test_json_uses_names() {
        let ws = valid_workspace();
        let json = WorkspaceSnapshot::capture(&ws).unwrap().to_json().unwrap();
        assert!(json.contains("\"variant\": \"Stop\""));
        assert!(json.contains("\"name\": \"Main\""));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("flows.json");
        let snapshot = WorkspaceSnapshot::capture(&valid_workspace()).unwrap();
        snapshot.save(&path).unwrap();
        let loaded = WorkspaceSnapshot::load(&path).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_load_reports_bad_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = WorkspaceSnapshot::load(&path).unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = WorkspaceSnapshot::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to read"), "{}", err);
        assert!(err.to_string().contains("missing.json"), "{}", err);
        assert!(matches!(
            err,
            EditorError::WithContext { source, .. } if matches!(*source, EditorError::Io(_))
        ));
    }
}
