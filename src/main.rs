//! Flow-process editor - Main Entry Point

use procflow::{
    config::EditorConfig,
    frontend::{default_workspace_path, demo_workspace, EditorApp},
    Workspace, WorkspaceSnapshot,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,procflow=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting flow-process editor");

    let config = EditorConfig::load_or_default();
    let workspace_path = default_workspace_path();

    // Restore the saved workspace, or start from the demo
    let saved = workspace_path.as_ref().filter(|path| path.exists());
    let workspace = match saved {
        Some(path) => {
            tracing::info!("Restoring workspace from {:?}", path);
            match WorkspaceSnapshot::load(path) {
                Ok(snapshot) => snapshot.restore(),
                Err(e) => {
                    tracing::warn!("Failed to load workspace: {}", e);
                    Workspace::new()
                }
            }
        }
        None => demo_workspace().unwrap_or_else(|e| {
            tracing::warn!("Failed to build demo workspace: {}", e);
            Workspace::new()
        }),
    };

    let dark_mode = config.ui_preferences.dark_mode;
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([
                config.canvas.width as f32 + 280.0,
                config.canvas.height as f32 + 60.0,
            ])
            .with_title("procflow"),
        ..Default::default()
    };

    eframe::run_native(
        "procflow",
        native_options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(if dark_mode {
                egui::Visuals::dark()
            } else {
                egui::Visuals::light()
            });
            Ok(Box::new(EditorApp::new(cc, config, workspace, workspace_path)))
        }),
    )
}
