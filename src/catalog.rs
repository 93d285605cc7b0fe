use egui::Vec2;
use serde::{Deserialize, Serialize};

use crate::loader::ImageRef;

/// An entry of the externally supplied specimen catalog.
///
/// The catalog comes from a spreadsheet, so sizes may be zero, negative or
/// missing; `natural_size` never trusts them blindly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub full_image_url: ImageRef,
    pub thumbnail_url: ImageRef,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
}

impl CatalogItem {
    /// Natural size, with unusable dimensions replaced by `fallback`
    pub fn natural_size(&self, fallback: f32) -> Vec2 {
        let usable = |v: f32| v.is_finite() && v > 0.0;
        match (usable(self.width), usable(self.height)) {
            (true, true) => Vec2::new(self.width, self.height),
            (true, false) => Vec2::new(self.width, self.width),
            (false, true) => Vec2::new(self.height, self.height),
            (false, false) => Vec2::splat(fallback),
        }
    }
}

/// Scale a natural size down so its longest side fits `max_side`,
/// keeping the aspect ratio. Never scales up.
pub fn fit_within(natural: Vec2, max_side: f32) -> Vec2 {
    let longest = natural.x.max(natural.y);
    if longest <= 0.0 {
        return natural;
    }
    let scale = (max_side / longest).min(1.0);
    natural * scale
}
