//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use procflow::model::id::{ParamRef, PathRef, ProcessId, Side, StepId};
use procflow::Workspace;

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Parameter of `step` with the given name.
pub fn param_ref(ws: &Workspace, process: ProcessId, step: StepId, side: Side, name: &str) -> ParamRef {
    let param = ws
        .graph(process)
        .unwrap()
        .step(step)
        .unwrap()
        .find_param_by_name(side, name)
        .unwrap_or_else(|| panic!("no {:?} parameter named {}", side, name))
        .id;
    ParamRef { step, param }
}

/// Outgoing path of `step` with the given name (`None` for the only path).
pub fn path_ref(ws: &Workspace, process: ProcessId, step: StepId, name: Option<&str>) -> PathRef {
    let path = ws
        .graph(process)
        .unwrap()
        .step(step)
        .unwrap()
        .return_paths
        .iter()
        .find(|p| p.name.as_deref() == name)
        .unwrap_or_else(|| panic!("no path named {:?}", name))
        .id;
    PathRef { step, path }
}

pub fn start_of(ws: &Workspace, process: ProcessId) -> StepId {
    ws.graph(process).unwrap().start_step().unwrap().unique_id
}

pub fn step_count(ws: &Workspace, process: ProcessId) -> usize {
    ws.graph(process).unwrap().steps().len()
}
