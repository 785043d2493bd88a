//! Dialog trait system for the editor's forms
//!
//! Each dialog implements [`Dialog`], encapsulating its state, actions, and
//! rendering. The host opens a dialog in response to an editor intent and
//! applies the action it returns to the workspace.

mod parameter;
mod stop_path;
mod variable;

pub use parameter::{ParameterAction, ParameterContext, ParameterDialog, ParameterState};
pub use stop_path::{StopPathAction, StopPathContext, StopPathDialog, StopPathState};
pub use variable::{VariableAction, VariableContext, VariableDialog, VariableState};

use egui::{Align2, Context, Ui};

/// Actions that a dialog can return after rendering
#[derive(Debug, Clone, Default)]
pub enum DialogAction<A> {
    /// Keep the dialog open, no action needed
    #[default]
    None,
    /// Close the dialog without performing any action
    Close,
    /// Close the dialog and perform the specified action
    CloseWithAction(A),
}

/// Trait for dialog state management
pub trait DialogState: Default {
    /// Reset the dialog state to its default values
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Dialog windows open centred on the editor.
const DIALOG_WIDTH: f32 = 320.0;

/// A modal form bound to one editor intent.
pub trait Dialog {
    type State: DialogState;
    type Action;
    /// Workspace data the dialog reads while rendering
    type Context<'a>;

    fn title(state: &Self::State) -> &'static str;

    fn width() -> f32 {
        DIALOG_WIDTH
    }

    fn render(
        state: &mut Self::State,
        ctx: Self::Context<'_>,
        ui: &mut Ui,
    ) -> DialogAction<Self::Action>;
}

/// Show `D` while `is_open`; a finished dialog is closed and its state reset.
pub fn show_dialog<D: Dialog>(
    ctx: &Context,
    is_open: &mut bool,
    state: &mut D::State,
    dialog_ctx: D::Context<'_>,
) -> Option<D::Action> {
    if !*is_open {
        return None;
    }

    let mut outcome = DialogAction::None;
    egui::Window::new(D::title(state))
        .collapsible(false)
        .resizable(false)
        .default_width(D::width())
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| outcome = D::render(state, dialog_ctx, ui));

    match outcome {
        DialogAction::None => None,
        DialogAction::Close => {
            *is_open = false;
            state.reset();
            None
        }
        DialogAction::CloseWithAction(action) => {
            *is_open = false;
            state.reset();
            Some(action)
        }
    }
}
