//! Editor configuration
//!
//! Preferences that persist across sessions: gesture timing, the length of
//! freshly created dangling paths, canvas size and a few display toggles.
//!
//! # App Data Location
//!
//! The configuration is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.hxyulin.procflow/`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.procflow/`
//! - **Windows**: `%APPDATA%\dev.hxyulin.procflow\`
//!
//! # Example
//!
//! ```ignore
//! use procflow::config::EditorConfig;
//!
//! let mut config = EditorConfig::load_or_default();
//! config.double_click_ms = 300;
//! config.save()?;
//! ```

use crate::error::{EditorError, Result, ResultExt};
use crate::geometry::Position;
use crate::interaction::dispatch::DEFAULT_DOUBLE_CLICK_MS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.hxyulin.procflow";

/// Editor configuration filename
pub const CONFIG_FILE: &str = "editor_config.json";

/// Workspace snapshot filename
pub const WORKSPACE_FILE: &str = "workspace.json";

/// Default length of a newly created dangling return path
pub const DEFAULT_DANGLING_PATH_LENGTH: f64 = crate::graph::DEFAULT_DANGLING_LENGTH;

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        EditorError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).context("Failed to create app data directory")?;
    }

    Ok(dir)
}

/// Get the path to the editor configuration file
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Editor Config ====================

/// Persistent editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Version for future migration support
    #[serde(default = "default_config_version")]
    pub version: u32,

    /// Maximum gap between two presses on the same region for a double click
    #[serde(default = "default_double_click_ms")]
    pub double_click_ms: u64,

    /// Distance from the step centre to the free end of a new dangling path
    #[serde(default = "default_dangling_path_length")]
    pub dangling_path_length: f64,

    #[serde(default)]
    pub canvas: CanvasSettings,

    #[serde(default)]
    pub ui_preferences: UiPreferences,
}

fn default_config_version() -> u32 {
    1
}

fn default_double_click_ms() -> u64 {
    DEFAULT_DOUBLE_CLICK_MS
}

fn default_dangling_path_length() -> f64 {
    DEFAULT_DANGLING_PATH_LENGTH
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            version: 1,
            double_click_ms: DEFAULT_DOUBLE_CLICK_MS,
            dangling_path_length: DEFAULT_DANGLING_PATH_LENGTH,
            canvas: CanvasSettings::default(),
            ui_preferences: UiPreferences::default(),
        }
    }
}

impl EditorConfig {
    /// Load the configuration from the default location
    pub fn load() -> Result<Self> {
        let path = config_path().ok_or_else(|| {
            EditorError::Config("Could not determine config path".to_string())
        })?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load the configuration, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load editor config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Load the configuration from an explicit file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read editor config")?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse editor config")?;
        config.validated()
    }

    /// Save the configuration to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        self.save_to(dir.join(CONFIG_FILE))
    }

    /// Save the configuration to an explicit file
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize editor config")?;

        std::fs::write(path.as_ref(), content).context("Failed to write editor config")
    }

    fn validated(self) -> Result<Self> {
        if !(self.dangling_path_length.is_finite() && self.dangling_path_length > 0.0) {
            return Err(EditorError::Config(format!(
                "dangling_path_length must be positive, got {}",
                self.dangling_path_length
            )));
        }
        if !(self.canvas.zoom.is_finite() && self.canvas.zoom > 0.0) {
            return Err(EditorError::Config(format!(
                "canvas zoom must be positive, got {}",
                self.canvas.zoom
            )));
        }
        Ok(self)
    }
}

/// Size and zoom of the drawing area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasSettings {
    #[serde(default = "default_canvas_width")]
    pub width: f64,

    #[serde(default = "default_canvas_height")]
    pub height: f64,

    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

fn default_canvas_width() -> f64 {
    1024.0
}

fn default_canvas_height() -> f64 {
    720.0
}

fn default_zoom() -> f64 {
    1.0
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: default_canvas_width(),
            height: default_canvas_height(),
            zoom: default_zoom(),
        }
    }
}

impl CanvasSettings {
    /// Canvas extent in diagram coordinates
    pub fn viewport(&self) -> Position {
        Position::new(self.width / self.zoom, self.height / self.zoom)
    }
}

/// UI preferences that persist across sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiPreferences {
    /// Enable dark mode
    #[serde(default = "default_true")]
    pub dark_mode: bool,

    /// Draw parameter names next to connectors
    #[serde(default = "default_true")]
    pub show_parameter_labels: bool,
}

fn default_true() -> bool {
    true
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            dark_mode: true,
            show_parameter_labels: true,
        }
    }
}
