//! Frontend module for egui UI
//!
//! Hosts the [`Editor`](crate::interaction::Editor) inside an eframe window.
//! Pointer input on the canvas is converted to diagram coordinates and fed to
//! the editor; the editor paints back through [`EguiCanvas`].
//!
//! # Main Types
//!
//! - [`EditorApp`] - Main application state implementing [`eframe::App`]
//! - [`EguiCanvas`] - [`RenderBackend`](crate::render::RenderBackend) over an egui painter
//!
//! # Submodules
//!
//! - `dialogs` - Parameter, stop path and variable forms
//! - `status_bar` - Validity and last error

pub mod app;
pub mod canvas;
pub mod dialogs;
mod status_bar;

pub use app::{default_workspace_path, demo_workspace, EditorApp};
pub use canvas::EguiCanvas;
