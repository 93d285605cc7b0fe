use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};

use crate::config::ZoomConfig;
use crate::error::InputError;

/// Zoom and pan of the workspace.
///
/// Screen positions relate to design (display-space) positions through
/// `screen = design * zoom + pan`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    zoom: f32,
    pan: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
        }
    }
}

impl Viewport {
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    /// Panning only has an effect when zoomed in
    pub fn can_pan(&self) -> bool {
        self.zoom > 1.0
    }

    pub fn is_identity(&self) -> bool {
        self.zoom == 1.0 && self.pan == Vec2::ZERO
    }

    /// Set the zoom factor. Coming back to 100% or below from a zoomed-in
    /// state drops the pan offset. Returns false for unusable values.
    pub fn set_zoom(&mut self, zoom: f32) -> bool {
        if !zoom.is_finite() || zoom <= 0.0 {
            return false;
        }
        if self.zoom > 1.0 && zoom <= 1.0 {
            self.pan = Vec2::ZERO;
        }
        self.zoom = zoom;
        true
    }

    pub fn set_pan(&mut self, pan: Vec2) -> bool {
        if !(pan.x.is_finite() && pan.y.is_finite()) {
            return false;
        }
        self.pan = pan;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn screen_to_design(&self, screen: Pos2) -> Pos2 {
        ((screen.to_vec2() - self.pan) / self.zoom).to_pos2()
    }

    pub fn design_to_screen(&self, design: Pos2) -> Pos2 {
        (design.to_vec2() * self.zoom + self.pan).to_pos2()
    }
}

/// One zoom-in step, kept within the configured range
pub fn zoom_in(zoom: f32, config: &ZoomConfig) -> f32 {
    (zoom * config.step).clamp(config.min, config.max)
}

/// One zoom-out step, kept within the configured range
pub fn zoom_out(zoom: f32, config: &ZoomConfig) -> f32 {
    (zoom / config.step).clamp(config.min, config.max)
}

/// Parse a typed zoom percentage such as `"150"` or `"150%"`
pub fn parse_zoom_entry(text: &str, config: &ZoomConfig) -> Result<f32, InputError> {
    let trimmed = text.trim().trim_end_matches('%').trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| InputError::InvalidZoomEntry(text.to_owned()))?;
    if value <= 0 || value > i64::from(config.max_entry_percent) {
        return Err(InputError::ZoomOutOfRange {
            value,
            max: config.max_entry_percent,
        });
    }
    Ok(value as f32 / 100.0)
}
