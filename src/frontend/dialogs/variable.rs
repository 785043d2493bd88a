//! New-variable dialog

use super::{Dialog, DialogAction, DialogState};
use crate::model::id::TypeId;
use egui::Ui;

#[derive(Debug, Default)]
pub struct VariableState {
    pub name: String,
    pub type_id: Option<TypeId>,
    pub initial_value: String,
}

impl DialogState for VariableState {}

#[derive(Debug, Clone)]
pub struct VariableAction {
    pub name: String,
    pub type_id: TypeId,
    pub initial_value: Option<String>,
}

pub struct VariableContext<'a> {
    pub types: Vec<(TypeId, &'a str)>,
}

pub struct VariableDialog;

impl Dialog for VariableDialog {
    type State = VariableState;
    type Action = VariableAction;
    type Context<'a> = VariableContext<'a>;

    fn title(_state: &Self::State) -> &'static str {
        "New Variable"
    }

    fn render(
        state: &mut Self::State,
        ctx: Self::Context<'_>,
        ui: &mut Ui,
    ) -> DialogAction<Self::Action> {
        egui::Grid::new("new_variable_grid")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label("Name:");
                ui.text_edit_singleline(&mut state.name);
                ui.end_row();

                ui.label("Type:");
                let selected = state
                    .type_id
                    .and_then(|id| ctx.types.iter().find(|(t, _)| *t == id))
                    .map_or("(choose)", |(_, name)| *name);
                egui::ComboBox::from_id_salt("new_variable_type")
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        for (id, name) in &ctx.types {
                            ui.selectable_value(&mut state.type_id, Some(*id), *name);
                        }
                    });
                ui.end_row();

                ui.label("Initial value:");
                ui.text_edit_singleline(&mut state.initial_value);
                ui.end_row();
            });

        let mut action = DialogAction::None;
        ui.separator();
        ui.horizontal(|ui| {
            let ready = !state.name.trim().is_empty() && state.type_id.is_some();
            if ui.add_enabled(ready, egui::Button::new("Add")).clicked() {
                if let Some(type_id) = state.type_id {
                    let initial = state.initial_value.trim();
                    action = DialogAction::CloseWithAction(VariableAction {
                        name: state.name.trim().to_string(),
                        type_id,
                        initial_value: (!initial.is_empty()).then(|| initial.to_string()),
                    });
                }
            }
            if ui.button("Cancel").clicked() {
                action = DialogAction::Close;
            }
        });
        action
    }
}
