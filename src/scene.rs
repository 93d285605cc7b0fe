use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::canvas::{BaseImage, CanvasState};
use crate::config::EditorConfig;
use crate::error::SceneError;
use crate::loader::ImageRef;
use crate::overlay::{Overlay, OverlayPatch, OverlaySource};

/// A composition described as data, for headless export.
///
/// Overlay geometry is in display space, like in the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneManifest {
    pub base_image: ImageRef,
    pub natural_width: u32,
    pub natural_height: u32,
    /// Size the base image was displayed at; omitted means natural size
    #[serde(default)]
    pub display_width: Option<f32>,
    #[serde(default)]
    pub display_height: Option<f32>,
    #[serde(default)]
    pub overlays: Vec<SceneOverlay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneOverlay {
    #[serde(default)]
    pub name: String,
    /// Catalog item this came from, if any
    #[serde(default)]
    pub item_id: Option<String>,
    pub image: ImageRef,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default = "full_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub flip_h: bool,
    #[serde(default)]
    pub flip_v: bool,
    /// Defaults to the overlay's position in the list
    #[serde(default)]
    pub layer: Option<usize>,
}

fn full_opacity() -> f32 {
    1.0
}

impl SceneManifest {
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Build the canvas this manifest describes. Values out of range are
    /// clamped the same way editor input is.
    pub fn to_canvas(&self, config: &EditorConfig) -> CanvasState {
        let mut canvas = CanvasState::new();
        canvas.set_base_image(BaseImage::new(
            self.base_image.clone(),
            self.natural_width,
            self.natural_height,
        ));
        if let (Some(width), Some(height)) = (self.display_width, self.display_height) {
            canvas.set_display_size(Vec2::new(width, height));
        }

        for (index, entry) in self.overlays.iter().enumerate() {
            let source = match &entry.item_id {
                Some(item_id) => OverlaySource::Catalog {
                    item_id: item_id.clone(),
                },
                None => OverlaySource::Custom,
            };
            let mut overlay = Overlay::new(
                source,
                entry.name.clone(),
                entry.image.clone(),
                Pos2::new(entry.x, entry.y),
                Vec2::new(entry.width, entry.height),
                entry.layer.unwrap_or(index),
                config.min_overlay_size,
            );
            let patch = OverlayPatch {
                opacity: Some(entry.opacity),
                rotation: Some(entry.rotation),
                flip_h: Some(entry.flip_h),
                flip_v: Some(entry.flip_v),
                ..Default::default()
            };
            overlay.apply(&patch, config.min_overlay_size);
            canvas.insert_overlay(overlay);
        }
        canvas.select(None);
        canvas
    }
}
