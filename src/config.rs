use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::loader::ImageRef;

/// Tunables for the editor core. Every field has a default, so a config
/// file only needs the keys it wants to override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Used for the watermark label and the export file name
    pub product_name: String,
    /// Floor for overlay width and height, in display units
    pub min_overlay_size: f32,
    /// Longest side of a freshly placed overlay
    pub max_initial_size: f32,
    /// Natural size assumed for catalog items with a missing or bogus size
    pub fallback_overlay_size: f32,
    pub handle_radius: f32,
    pub rotate_control_offset: f32,
    pub rotate_control_radius: f32,
    /// Scales continuous rotation to make it less twitchy
    pub rotation_damping: f32,
    /// Degrees added by a plain click on the rotate control
    pub rotation_step: f32,
    /// Degrees added by the toolbar rotate button
    pub quarter_turn: f32,
    /// Pointer travel below this still counts as a click
    pub click_tolerance: f32,
    pub undo_limit: usize,
    pub zoom: ZoomConfig,
    pub watermark: WatermarkConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            product_name: "CoralScape".to_owned(),
            min_overlay_size: 20.0,
            max_initial_size: 150.0,
            fallback_overlay_size: 100.0,
            handle_radius: 8.0,
            rotate_control_offset: 30.0,
            rotate_control_radius: 12.0,
            rotation_damping: 0.3,
            rotation_step: 10.0,
            quarter_turn: 90.0,
            click_tolerance: 3.0,
            undo_limit: 20,
            zoom: ZoomConfig::default(),
            watermark: WatermarkConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Parse a config from JSON text
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config file; missing keys fall back to defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min: f32,
    pub max: f32,
    /// Factor applied by one zoom-in / zoom-out step
    pub step: f32,
    /// Upper bound for typed zoom entries, in percent
    pub max_entry_percent: u32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 0.1,
            max: 3.0,
            step: 1.2,
            max_entry_percent: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    /// Logo drawn in the bottom-right corner; the text label is used without it
    pub logo: Option<ImageRef>,
    /// Font for the text label
    pub font_path: Option<PathBuf>,
    /// Watermark width as a fraction of the output width
    pub width_fraction: f32,
    pub opacity: f32,
    /// Distance from the right and bottom edges, in output pixels
    pub margin: u32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            logo: None,
            font_path: None,
            width_fraction: 0.2,
            opacity: 0.8,
            margin: 20,
        }
    }
}
