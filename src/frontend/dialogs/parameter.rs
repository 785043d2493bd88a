//! Parameter binding dialog
//!
//! Binds a step parameter to a variable of the open process, or gives an
//! input parameter a fixed literal value.

use super::{Dialog, DialogAction, DialogState};
use crate::model::id::{ParamRef, Side, VariableId};
use egui::{Color32, Ui};

#[derive(Debug, Default)]
pub struct ParameterState {
    pub param: Option<ParamRef>,
    pub variable: Option<VariableId>,
    pub fixed_value: String,
}

impl DialogState for ParameterState {}

impl ParameterState {
    /// Prefill from the parameter's current binding.
    pub fn for_param(param: ParamRef, variable: Option<VariableId>, fixed: Option<&str>) -> Self {
        Self {
            param: Some(param),
            variable,
            fixed_value: fixed.unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ParameterAction {
    Bind { param: ParamRef, variable: VariableId },
    SetFixed { param: ParamRef, value: String },
    Clear(ParamRef),
}

pub struct ParameterContext<'a> {
    pub name: &'a str,
    pub side: Side,
    pub type_name: &'a str,
    /// Variables of the open process, in declaration order.
    pub variables: Vec<(VariableId, &'a str)>,
}

pub struct ParameterDialog;

impl Dialog for ParameterDialog {
    type State = ParameterState;
    type Action = ParameterAction;
    type Context<'a> = ParameterContext<'a>;

    fn title(_state: &Self::State) -> &'static str {
        "Edit Parameter"
    }

    fn render(
        state: &mut Self::State,
        ctx: Self::Context<'_>,
        ui: &mut Ui,
    ) -> DialogAction<Self::Action> {
        let Some(param) = state.param else {
            return DialogAction::Close;
        };

        ui.label(format!("{} : {}", ctx.name, ctx.type_name));
        ui.separator();

        let selected = state
            .variable
            .and_then(|id| ctx.variables.iter().find(|(v, _)| *v == id))
            .map_or("(none)", |(_, name)| *name);
        egui::ComboBox::from_label("Variable")
            .selected_text(selected)
            .show_ui(ui, |ui| {
                for (id, name) in &ctx.variables {
                    ui.selectable_value(&mut state.variable, Some(*id), *name);
                }
            });

        let mut action = DialogAction::None;
        if ctx.side == Side::Input {
            ui.horizontal(|ui| {
                ui.label("Fixed value:");
                ui.text_edit_singleline(&mut state.fixed_value);
            });
        } else {
            ui.colored_label(Color32::GRAY, "Outputs can only write to variables");
        }

        ui.separator();
        ui.horizontal(|ui| {
            if let Some(variable) = state.variable {
                if ui.button("Bind").clicked() {
                    action = DialogAction::CloseWithAction(ParameterAction::Bind { param, variable });
                }
            }
            if ctx.side == Side::Input && ui.button("Set value").clicked() {
                action = DialogAction::CloseWithAction(ParameterAction::SetFixed {
                    param,
                    value: state.fixed_value.clone(),
                });
            }
            if ui.button("Clear").clicked() {
                action = DialogAction::CloseWithAction(ParameterAction::Clear(param));
            }
            if ui.button("Cancel").clicked() {
                action = DialogAction::Close;
            }
        });
        action
    }
}
