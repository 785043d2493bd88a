//! Status bar panel: bottom bar showing validity, highlight and the last error.

use egui::{Color32, RichText, Ui};

/// Context needed to render the status bar.
pub struct StatusBarContext<'a> {
    pub process_name: Option<&'a str>,
    pub invalid_processes: &'a [String],
    pub highlighted: Option<&'a str>,
    pub last_error: Option<&'a str>,
}

/// Render the status bar.
pub fn render_status_bar(ui: &mut Ui, ctx: &StatusBarContext<'_>) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        // === Validity dot ===
        let (color, text) = if ctx.invalid_processes.is_empty() {
            (Color32::GREEN, "All processes valid".to_string())
        } else {
            (
                Color32::RED,
                format!("Invalid: {}", ctx.invalid_processes.join(", ")),
            )
        };
        ui.colored_label(color, "●");
        ui.label(RichText::new(text).small());

        ui.separator();

        if let Some(name) = ctx.process_name {
            ui.label(RichText::new(format!("Editing: {}", name)).small());
            ui.separator();
        }

        if let Some(variable) = ctx.highlighted {
            ui.colored_label(
                Color32::LIGHT_BLUE,
                RichText::new(format!("Highlight: {}", variable)).small(),
            );
            ui.separator();
        }

        // === Last error ===
        if let Some(error) = ctx.last_error {
            ui.colored_label(Color32::LIGHT_RED, RichText::new(error).small());
        }
    });
}
