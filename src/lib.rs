//! # procflow: Visual Flow-Process Editor
//!
//! Programs are drawn as diagrams of *processes*. Each user process is a
//! graph of steps (start, stop and calls to other processes) joined by
//! return paths, with typed parameters bound to process variables or to
//! fixed values.
//!
//! ## Architecture
//!
//! - **Model**: Types, processes, steps, parameters and return paths in arenas
//! - **Layout**: Connector fans, return-path routing and label placement
//! - **Workspace**: Edit operations, validation and signature propagation
//! - **Interaction**: Hit regions, pointer dispatch and the [`Editor`] controller
//! - **Frontend**: eframe/egui host with an egui [`RenderBackend`]
//!
//! ## Configuration
//!
//! Editor preferences and the saved workspace live in the platform data
//! directory under `dev.hxyulin.procflow`:
//!
//! - **Linux**: `~/.local/share/dev.hxyulin.procflow/`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.procflow/`
//! - **Windows**: `%APPDATA%\dev.hxyulin.procflow\`
//!
//! ## Example
//!
//! ```ignore
//! use procflow::{model::Signature, Workspace, WorkspaceSnapshot};
//!
//! let mut workspace = Workspace::new();
//! let main = workspace.create_user_process("Main", Signature::default())?;
//! workspace.refresh_routes();
//!
//! WorkspaceSnapshot::capture(&workspace)?.save("workspace.json")?;
//! ```

pub mod config;
pub mod error;
pub mod frontend;
pub mod geometry;
pub mod graph;
pub mod interaction;
pub mod layout;
pub mod load;
pub mod model;
pub mod propagate;
pub mod render;
pub mod snapshot;
pub mod workspace;

// Re-export commonly used types
pub use config::EditorConfig;
pub use error::{EditorError, Result};
pub use frontend::EditorApp;
pub use geometry::{OrientedPosition, Position};
pub use graph::UserProcess;
pub use interaction::{Editor, Intent, PointerEvent};
pub use propagate::{propagate, PropagationReport};
pub use render::{RenderBackend, SoftwareBackend};
pub use snapshot::WorkspaceSnapshot;
pub use workspace::Workspace;
