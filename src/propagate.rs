//! Signature-change propagation.
//!
//! When a process's signature changes, every step whose parameters or paths
//! derive from it is reconciled against the new signature:
//!
//! 1. start and stop steps inside the edited process re-derive from its own
//!    signature, and a stop step ending on a removed path name loses it
//! 2. every process-call step governed by the edited process, in any user
//!    process, keeps parameters matching by name and type, drops the rest
//!    with their variable back-links, and gains the new ones unbound; paths
//!    are matched by name the same way, new ones starting dangling
//!
//! All re-derivation finishes before any process is re-validated.

use crate::error::{EditorError, Result};
use crate::model::id::{ProcessId, StepId};
use crate::model::process::Signature;
use crate::model::step::StepKind;
use crate::workspace::Workspace;
use tracing::{debug, info};

/// What a propagation pass touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationReport {
    pub edited: ProcessId,
    /// User processes with at least one step changed, in workspace order.
    pub changed_processes: Vec<ProcessId>,
    pub changed_steps: usize,
}

impl PropagationReport {
    pub fn unchanged(edited: ProcessId) -> Self {
        Self {
            edited,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changed_steps == 0
    }
}

/// Push `edited`'s current signature into every dependent step.
pub fn propagate(workspace: &mut Workspace, edited: ProcessId) -> Result<PropagationReport> {
    let signature = workspace
        .process(edited)
        .ok_or_else(|| EditorError::UnknownProcess(edited.to_string()))?
        .signature
        .clone();
    let dangling_length = workspace.dangling_length;
    let mut report = PropagationReport::unchanged(edited);

    for process in workspace.processes_mut() {
        let process_id = process.id;
        let parent = process.signature.clone();
        let Some(graph) = process.as_user_mut() else {
            continue;
        };

        let dependents: Vec<(StepId, bool)> = graph
            .steps()
            .iter()
            .filter_map(|step| match &step.kind {
                StepKind::Start | StepKind::Stop { .. } if process_id == edited => {
                    Some((step.unique_id, false))
                }
                StepKind::ProcessCall { process } if *process == edited => {
                    Some((step.unique_id, true))
                }
                _ => None,
            })
            .collect();

        let mut changed_here = 0;
        for (step, is_call) in dependents {
            let governing: Option<&Signature> = is_call.then_some(&signature);
            if graph.reconcile_step(step, &parent, governing, dangling_length)? {
                debug!("Reconciled step {} in process {}", step, process_id);
                changed_here += 1;
            }
        }
        if changed_here > 0 {
            report.changed_steps += changed_here;
            report.changed_processes.push(process_id);
        }
    }

    // Validation only after every step has been re-derived
    let mut to_validate = report.changed_processes.clone();
    if !to_validate.contains(&edited) {
        to_validate.push(edited);
    }
    for id in to_validate {
        workspace.validate_process(id);
    }

    info!(
        "Propagated signature of '{}': {} steps changed in {} processes",
        workspace.process_name(edited),
        report.changed_steps,
        report.changed_processes.len()
    );
    Ok(report)
}
