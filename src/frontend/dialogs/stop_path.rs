//! Stop-step path name dialog

use super::{Dialog, DialogAction, DialogState};
use crate::model::id::StepId;
use egui::Ui;

#[derive(Debug, Default)]
pub struct StopPathState {
    pub step: Option<StepId>,
    pub choice: Option<String>,
}

impl DialogState for StopPathState {}

impl StopPathState {
    pub fn for_step(step: StepId, current: Option<&str>) -> Self {
        Self {
            step: Some(step),
            choice: current.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StopPathAction {
    pub step: StepId,
    pub name: Option<String>,
}

pub struct StopPathContext<'a> {
    /// Return path names declared by the open process.
    pub names: &'a [String],
}

pub struct StopPathDialog;

impl Dialog for StopPathDialog {
    type State = StopPathState;
    type Action = StopPathAction;
    type Context<'a> = StopPathContext<'a>;

    fn title(_state: &Self::State) -> &'static str {
        "Return Path"
    }

    fn render(
        state: &mut Self::State,
        ctx: Self::Context<'_>,
        ui: &mut Ui,
    ) -> DialogAction<Self::Action> {
        let Some(step) = state.step else {
            return DialogAction::Close;
        };

        ui.label("This stop step ends the process on:");
        for name in ctx.names {
            ui.radio_value(&mut state.choice, Some(name.clone()), name);
        }

        let mut action = DialogAction::None;
        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("Apply").clicked() {
                action = DialogAction::CloseWithAction(StopPathAction {
                    step,
                    name: state.choice.clone(),
                });
            }
            if ui.button("Cancel").clicked() {
                action = DialogAction::Close;
            }
        });
        action
    }
}
