//! The layer model: base photo, placed overlays, selection and view.

pub mod viewport;

use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogItem, fit_within};
use crate::config::EditorConfig;
use crate::geometry::Frame;
use crate::loader::ImageRef;
use crate::overlay::{Overlay, OverlayId, OverlayPatch, OverlaySource};

pub use viewport::{Viewport, parse_zoom_entry, zoom_in, zoom_out};

/// The user's photo everything is composed onto
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseImage {
    pub image: ImageRef,
    pub natural_width: u32,
    pub natural_height: u32,
}

impl BaseImage {
    pub fn new(image: ImageRef, natural_width: u32, natural_height: u32) -> Self {
        Self {
            image,
            natural_width,
            natural_height,
        }
    }

    pub fn natural_frame(&self) -> Frame {
        Frame::from_pixels(self.natural_width, self.natural_height)
    }
}

/// Where a new overlay goes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Top-left corner at this display-space point (drag and drop)
    At(Pos2),
    /// Centered on the displayed base image (click to add)
    Centered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasState {
    base_image: Option<BaseImage>,
    /// Size the base image is currently drawn at, as reported by the view
    display_size: Option<Vec2>,
    overlays: Vec<Overlay>,
    selected: Option<OverlayId>,
    viewport: Viewport,
}

impl CanvasState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_image(&self) -> Option<&BaseImage> {
        self.base_image.as_ref()
    }

    /// Replace the base photo. The new photo starts unpanned and waits for
    /// the view to report its displayed size.
    pub fn set_base_image(&mut self, base: BaseImage) {
        self.base_image = Some(base);
        self.display_size = None;
        self.viewport.set_pan(Vec2::ZERO);
    }

    pub fn display_size(&self) -> Option<Vec2> {
        self.display_size
    }

    pub fn set_display_size(&mut self, size: Vec2) -> bool {
        let usable = size.x.is_finite() && size.y.is_finite() && size.x > 0.0 && size.y > 0.0;
        if !usable || self.display_size == Some(size) {
            return false;
        }
        self.display_size = Some(size);
        true
    }

    /// The display-space frame overlays live in. Falls back to the natural
    /// size until the view has reported one.
    pub fn display_frame(&self) -> Frame {
        match (self.display_size, &self.base_image) {
            (Some(size), _) => Frame::new(size.x, size.y),
            (None, Some(base)) => base.natural_frame(),
            (None, None) => Frame::new(0.0, 0.0),
        }
    }

    pub fn display_rect(&self) -> Rect {
        Rect::from_min_size(Pos2::ZERO, self.display_frame().size())
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub(crate) fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Overlays in insertion order
    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn overlay(&self, id: OverlayId) -> Option<&Overlay> {
        self.overlays.iter().find(|overlay| overlay.id() == id)
    }

    pub fn contains(&self, id: OverlayId) -> bool {
        self.overlay(id).is_some()
    }

    pub fn selected_id(&self) -> Option<OverlayId> {
        self.selected
    }

    pub fn selected_overlay(&self) -> Option<&Overlay> {
        self.selected.and_then(|id| self.overlay(id))
    }

    /// Build a new overlay on top of the stack without inserting it.
    ///
    /// The natural size is scaled down to fit `max_initial_size`; centered
    /// placement puts it in the middle of the displayed base image.
    pub fn build_overlay(
        &self,
        source: OverlaySource,
        name: impl Into<String>,
        image: ImageRef,
        natural_size: Vec2,
        placement: Placement,
        config: &EditorConfig,
    ) -> Overlay {
        let size = fit_within(natural_size, config.max_initial_size);
        let position = match placement {
            Placement::At(point) => point,
            Placement::Centered => self.display_frame().center() - size / 2.0,
        };
        Overlay::new(
            source,
            name,
            image,
            position,
            size,
            self.overlays.len(),
            config.min_overlay_size,
        )
    }

    pub fn build_catalog_overlay(
        &self,
        item: &CatalogItem,
        placement: Placement,
        config: &EditorConfig,
    ) -> Overlay {
        self.build_overlay(
            OverlaySource::Catalog {
                item_id: item.id.clone(),
            },
            item.name.clone(),
            item.full_image_url.clone(),
            item.natural_size(config.fallback_overlay_size),
            placement,
            config,
        )
    }

    /// Append an overlay and select it
    pub fn insert_overlay(&mut self, overlay: Overlay) -> OverlayId {
        let id = overlay.id();
        self.overlays.push(overlay);
        self.selected = Some(id);
        id
    }

    /// Merge a patch into an overlay. Unknown ids are ignored.
    pub fn update_overlay(&mut self, id: OverlayId, patch: &OverlayPatch, min_size: f32) -> bool {
        self.overlays
            .iter_mut()
            .find(|overlay| overlay.id() == id)
            .is_some_and(|overlay| overlay.apply(patch, min_size))
    }

    /// Swap in a whole overlay snapshot with the same id
    pub fn replace_overlay(&mut self, snapshot: Overlay) -> bool {
        match self.overlays.iter_mut().find(|o| o.id() == snapshot.id()) {
            Some(slot) if *slot != snapshot => {
                *slot = snapshot;
                true
            }
            _ => false,
        }
    }

    /// Remove an overlay, clearing the selection if it pointed at it
    pub fn remove_overlay(&mut self, id: OverlayId) -> Option<Overlay> {
        let index = self.overlays.iter().position(|o| o.id() == id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some(self.overlays.remove(index))
    }

    /// Select an existing overlay or clear the selection
    pub fn select(&mut self, id: Option<OverlayId>) -> bool {
        if let Some(id) = id {
            if !self.contains(id) {
                return false;
            }
        }
        if self.selected == id {
            return false;
        }
        self.selected = id;
        true
    }

    /// Step an overlay's layer index up or down by one.
    ///
    /// Layer indices can repeat after deletions. Equal indices draw in
    /// insertion order, so the moved overlay is also repositioned in the
    /// list to land above (or below) any overlay it now ties with.
    /// Steps past `0..overlays.len()` are ignored.
    pub fn move_layer(&mut self, id: OverlayId, direction: LayerDirection) -> Option<usize> {
        let index = self.overlays.iter().position(|o| o.id() == id)?;
        let max_layer = self.overlays.len() - 1;
        let current = self.overlays[index].layer();
        let target = match direction {
            LayerDirection::Up if current < max_layer => current + 1,
            LayerDirection::Up => return None,
            LayerDirection::Down => current.checked_sub(1)?,
        };

        let mut overlay = self.overlays.remove(index);
        overlay.apply(&OverlayPatch::layer(target), 0.0);
        let insert_at = match direction {
            LayerDirection::Up => self
                .overlays
                .iter()
                .rposition(|o| o.layer() <= target)
                .map_or(0, |i| i + 1),
            LayerDirection::Down => self
                .overlays
                .iter()
                .position(|o| o.layer() >= target)
                .unwrap_or(self.overlays.len()),
        };
        self.overlays.insert(insert_at, overlay);
        Some(target)
    }

    /// Overlays in paint order: lowest layer first, ties by insertion order
    pub fn layers_back_to_front(&self) -> Vec<&Overlay> {
        let mut ordered: Vec<&Overlay> = self.overlays.iter().collect();
        ordered.sort_by_key(|overlay| overlay.layer());
        ordered
    }

    /// Overlays in hit-test order: the one drawn last comes first
    pub fn layers_front_to_back(&self) -> Vec<&Overlay> {
        let mut ordered = self.layers_back_to_front();
        ordered.reverse();
        ordered
    }

    /// Put back the view used for export: 100% and no pan
    pub(crate) fn reset_view(&mut self) -> bool {
        if self.viewport.is_identity() {
            return false;
        }
        self.viewport.reset();
        true
    }
}
