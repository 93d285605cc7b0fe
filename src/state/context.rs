//! The editor controller.
//!
//! `EditorContext` owns the canvas model, the undo history, the gesture
//! state machine and the event bus. Every change goes through `dispatch`,
//! which applies a `CanvasAction`, records its undo entry and broadcasts
//! its events. Pointer positions are given in screen space and mapped to
//! display space through the viewport.
use egui::{Pos2, Rect, Vec2};
use std::mem;

use crate::canvas::{
    BaseImage, CanvasState, LayerDirection, Placement, parse_zoom_entry, zoom_in, zoom_out,
};
use crate::catalog::CatalogItem;
use crate::command::{CanvasAction, UndoAction, UndoHistory};
use crate::config::EditorConfig;
use crate::error::{InputError, StateTransitionError};
use crate::event::{EditorEvent, EventBus, GestureOutcome};
use crate::geometry::{Corner, HitTarget, hit_test, rotate_control_center};
use crate::loader::{ImageRef, inspect_upload};
use crate::overlay::{Overlay, OverlayId, OverlayPatch, OverlaySource};

use super::interaction::{GestureKind, InteractionState, angle_of, wrap_delta};

#[derive(Debug)]
pub struct EditorContext {
    config: EditorConfig,
    canvas: CanvasState,
    history: UndoHistory,
    state: InteractionState,
    event_bus: EventBus,
}

impl Default for EditorContext {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorContext {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            history: UndoHistory::new(config.undo_limit),
            config,
            canvas: CanvasState::new(),
            state: InteractionState::Idle,
            event_bus: EventBus::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn canvas(&self) -> &CanvasState {
        &self.canvas
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Apply an action to the canvas. Returns true if anything changed.
    pub fn dispatch(&mut self, action: CanvasAction) -> bool {
        let name = action.name();
        let applied = action.apply(&mut self.canvas, &self.config);
        if !applied.changed {
            log::trace!("{name}: no change");
            return false;
        }
        log::debug!("{name}");
        if let Some(undo) = applied.undo {
            self.history.record(undo);
        }
        for event in applied.events {
            self.event_bus.emit(event);
        }
        true
    }

    /// Replace the whole canvas, e.g. with one built from a scene file.
    /// Any running gesture is dropped and the undo history starts over.
    pub fn load_canvas(&mut self, canvas: CanvasState) {
        self.state = InteractionState::Idle;
        self.history.clear();
        self.canvas = canvas;
        self.event_bus.emit(EditorEvent::BaseImageChanged);
    }

    // ---- base image and placement ----

    pub fn set_base_image(&mut self, base: BaseImage) {
        log::info!(
            "Base image {} ({}x{})",
            base.image,
            base.natural_width,
            base.natural_height
        );
        self.dispatch(CanvasAction::SetBaseImage(base));
    }

    /// Accept an uploaded photo as the new base image
    pub fn upload_base_image(
        &mut self,
        file_name: &str,
        image: ImageRef,
        bytes: &[u8],
    ) -> Result<(), InputError> {
        let info = inspect_upload(file_name, bytes)?;
        self.set_base_image(BaseImage::new(image, info.width, info.height));
        Ok(())
    }

    /// Record the size the base image is currently drawn at
    pub fn set_display_size(&mut self, size: Vec2) -> bool {
        self.dispatch(CanvasAction::SetDisplaySize(size))
    }

    /// Place a catalog specimen on top of the stack and select it
    pub fn place_catalog_item(&mut self, item: &CatalogItem, placement: Placement) -> OverlayId {
        let overlay = self.canvas.build_catalog_overlay(item, placement, &self.config);
        self.add_overlay(overlay)
    }

    /// Place a user-uploaded picture as an overlay
    pub fn place_custom_image(
        &mut self,
        file_name: &str,
        image: ImageRef,
        bytes: &[u8],
        placement: Placement,
    ) -> Result<OverlayId, InputError> {
        let info = inspect_upload(file_name, bytes)?;
        let overlay = self.canvas.build_overlay(
            OverlaySource::Custom,
            file_name,
            image,
            Vec2::new(info.width as f32, info.height as f32),
            placement,
            &self.config,
        );
        Ok(self.add_overlay(overlay))
    }

    fn add_overlay(&mut self, overlay: Overlay) -> OverlayId {
        let id = overlay.id();
        log::debug!("Placing {} as {id}", overlay.name());
        self.dispatch(CanvasAction::AddOverlay(overlay));
        id
    }

    // ---- overlay edits ----

    pub fn select(&mut self, id: Option<OverlayId>) -> bool {
        self.dispatch(CanvasAction::Select(id))
    }

    pub fn update_overlay(&mut self, id: OverlayId, patch: OverlayPatch, kind: GestureKind) -> bool {
        self.dispatch(CanvasAction::UpdateOverlay { id, patch, kind })
    }

    /// Toolbar rotate: a quarter turn clockwise
    pub fn rotate_quarter_turn(&mut self, id: OverlayId) -> bool {
        let Some(rotation) = self.canvas.overlay(id).map(|o| o.rotation()) else {
            return false;
        };
        let patch = OverlayPatch::rotation(rotation + self.config.quarter_turn);
        self.update_overlay(id, patch, GestureKind::InstantEdit)
    }

    pub fn toggle_flip_horizontal(&mut self, id: OverlayId) -> bool {
        let Some(overlay) = self.canvas.overlay(id) else {
            return false;
        };
        let patch = OverlayPatch::flips(!overlay.flip_h(), overlay.flip_v());
        self.update_overlay(id, patch, GestureKind::InstantEdit)
    }

    pub fn toggle_flip_vertical(&mut self, id: OverlayId) -> bool {
        let Some(overlay) = self.canvas.overlay(id) else {
            return false;
        };
        let patch = OverlayPatch::flips(overlay.flip_h(), !overlay.flip_v());
        self.update_overlay(id, patch, GestureKind::InstantEdit)
    }

    pub fn delete_overlay(&mut self, id: OverlayId) -> bool {
        if self.state.overlay_id() == Some(id) {
            self.finish_gesture(true);
        }
        self.dispatch(CanvasAction::DeleteOverlay(id))
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.canvas.selected_id() {
            Some(id) => self.delete_overlay(id),
            None => false,
        }
    }

    pub fn move_layer(&mut self, id: OverlayId, direction: LayerDirection) -> bool {
        self.dispatch(CanvasAction::MoveLayer { id, direction })
    }

    // ---- view ----

    pub fn zoom_in(&mut self) -> bool {
        let zoom = zoom_in(self.canvas.viewport().zoom(), &self.config.zoom);
        self.dispatch(CanvasAction::SetZoom(zoom))
    }

    pub fn zoom_out(&mut self) -> bool {
        let zoom = zoom_out(self.canvas.viewport().zoom(), &self.config.zoom);
        self.dispatch(CanvasAction::SetZoom(zoom))
    }

    pub fn set_zoom(&mut self, zoom: f32) -> bool {
        self.dispatch(CanvasAction::SetZoom(zoom))
    }

    /// Apply a typed zoom percentage; invalid entries leave the zoom alone
    pub fn set_zoom_entry(&mut self, text: &str) -> Result<bool, InputError> {
        let zoom = parse_zoom_entry(text, &self.config.zoom)?;
        Ok(self.dispatch(CanvasAction::SetZoom(zoom)))
    }

    pub fn set_pan(&mut self, pan: Vec2) -> bool {
        self.dispatch(CanvasAction::SetPan(pan))
    }

    /// Back to 100% and no pan, committing any running gesture first
    pub fn reset_view(&mut self) -> bool {
        if !self.state.is_idle() {
            self.finish_gesture(true);
        }
        self.dispatch(CanvasAction::ResetView)
    }

    // ---- undo ----

    /// Revert the newest undo entry. Ignored while a gesture is running.
    pub fn undo(&mut self) -> bool {
        if !self.state.is_idle() {
            log::debug!("Undo ignored during {}", self.state.name());
            return false;
        }
        match self.history.undo(&mut self.canvas) {
            Some(action) => {
                self.event_bus.emit(EditorEvent::UndoApplied {
                    action: action.label(),
                    overlay: action.overlay_id(),
                });
                true
            }
            None => false,
        }
    }

    // ---- pointer gestures ----

    /// Start a gesture at a screen position, based on what is under it
    pub fn pointer_down(&mut self, screen: Pos2) -> Result<(), StateTransitionError> {
        if !self.state.is_idle() {
            return Err(StateTransitionError::GestureInProgress {
                active: self.state.name(),
                requested: "pointer-down",
            });
        }

        let pos = self.canvas.viewport().screen_to_design(screen);
        let next = match hit_test(&self.canvas, pos, &self.config) {
            HitTarget::ResizeHandle { id, corner } => self.resize_state(id, corner, pos),
            HitTarget::RotateControl(id) => self.rotate_state(id, pos),
            HitTarget::Overlay(id) => {
                self.select(Some(id));
                self.canvas.overlay(id).map(|overlay| InteractionState::Dragging {
                    id,
                    grab_offset: pos - overlay.position(),
                    snapshot: overlay.clone(),
                })
            }
            HitTarget::BaseImage if self.canvas.viewport().can_pan() => {
                let pan = self.canvas.viewport().pan();
                Some(InteractionState::Panning {
                    anchor: screen.to_vec2() - pan,
                    start_pan: pan,
                })
            }
            HitTarget::BaseImage | HitTarget::Empty => {
                self.select(None);
                None
            }
        };

        match next {
            Some(next) => self.begin_gesture(next),
            None => Ok(()),
        }
    }

    fn resize_state(&self, id: OverlayId, corner: Corner, pos: Pos2) -> Option<InteractionState> {
        let overlay = self.canvas.overlay(id)?;
        Some(InteractionState::Resizing {
            id,
            corner,
            start_pointer: pos,
            start_rect: overlay.rect(),
            aspect: overlay.aspect_ratio(),
            snapshot: overlay.clone(),
        })
    }

    fn rotate_state(&self, id: OverlayId, pos: Pos2) -> Option<InteractionState> {
        let overlay = self.canvas.overlay(id)?;
        let control_center = rotate_control_center(overlay, &self.config);
        Some(InteractionState::Rotating {
            id,
            control_center,
            start_pointer: pos,
            last_angle: angle_of(pos - control_center),
            travel: 0.0,
            moved: false,
            snapshot: overlay.clone(),
        })
    }

    fn begin_gesture(&mut self, next: InteractionState) -> Result<(), StateTransitionError> {
        self.state.check_transition(&next)?;
        if let Some(kind) = next.kind() {
            log::debug!("Gesture {} started", kind.as_str());
            self.event_bus.emit(EditorEvent::GestureStarted {
                kind,
                overlay: next.overlay_id(),
            });
        }
        self.state = next;
        Ok(())
    }

    /// Advance the running gesture. Moves while idle are ignored.
    pub fn pointer_move(&mut self, screen: Pos2) {
        let pos = self.canvas.viewport().screen_to_design(screen);
        let tolerance = self.config.click_tolerance;
        let damping = self.config.rotation_damping;
        let min_size = self.config.min_overlay_size;

        let action = match &mut self.state {
            InteractionState::Idle => None,
            InteractionState::Dragging { id, grab_offset, .. } => Some(CanvasAction::UpdateOverlay {
                id: *id,
                patch: OverlayPatch::position(pos - *grab_offset),
                kind: GestureKind::Drag,
            }),
            InteractionState::Resizing {
                id,
                corner,
                start_pointer,
                start_rect,
                aspect,
                ..
            } => {
                let rect = resized_rect(*start_rect, *corner, pos - *start_pointer, *aspect, min_size);
                Some(CanvasAction::UpdateOverlay {
                    id: *id,
                    patch: OverlayPatch::rect(rect),
                    kind: GestureKind::Resize,
                })
            }
            InteractionState::Rotating {
                id,
                control_center,
                start_pointer,
                last_angle,
                travel,
                moved,
                snapshot,
            } => {
                let angle = angle_of(pos - *control_center);
                *travel += wrap_delta(angle - *last_angle);
                *last_angle = angle;
                if !*moved && pos.distance(*start_pointer) > tolerance {
                    *moved = true;
                }
                if *moved {
                    let rotation = snapshot.rotation() + *travel * damping;
                    Some(CanvasAction::UpdateOverlay {
                        id: *id,
                        patch: OverlayPatch::rotation(rotation),
                        kind: GestureKind::Rotate,
                    })
                } else {
                    None
                }
            }
            InteractionState::Panning { anchor, .. } => Some(CanvasAction::SetPan(screen.to_vec2() - *anchor)),
        };

        if let Some(action) = action {
            self.dispatch(action);
        }
    }

    /// Finish the running gesture
    pub fn pointer_up(&mut self, screen: Pos2) {
        self.pointer_move(screen);
        if let InteractionState::Rotating {
            id,
            moved: false,
            snapshot,
            ..
        } = &self.state
        {
            // a click on the control steps the rotation
            let patch = OverlayPatch::rotation(snapshot.rotation() + self.config.rotation_step);
            let id = *id;
            self.update_overlay(id, patch, GestureKind::Rotate);
        }
        self.finish_gesture(true);
    }

    /// The pointer left the workspace; treated like a release
    pub fn pointer_leave(&mut self) {
        self.finish_gesture(true);
    }

    /// Abort the running gesture and put everything back
    pub fn cancel_gesture(&mut self) {
        self.finish_gesture(false);
    }

    fn finish_gesture(&mut self, commit: bool) {
        let state = mem::take(&mut self.state);
        let Some(kind) = state.kind() else {
            return;
        };
        let overlay = state.overlay_id();

        let outcome = match state {
            InteractionState::Idle => return,
            InteractionState::Panning { start_pan, .. } => {
                if commit {
                    GestureOutcome::Unchanged
                } else {
                    self.dispatch(CanvasAction::SetPan(start_pan));
                    GestureOutcome::Cancelled
                }
            }
            InteractionState::Dragging { snapshot, .. }
            | InteractionState::Resizing { snapshot, .. }
            | InteractionState::Rotating { snapshot, .. } => {
                let changed = self
                    .canvas
                    .overlay(snapshot.id())
                    .is_some_and(|current| *current != snapshot);
                match (changed, commit) {
                    (false, _) => GestureOutcome::Unchanged,
                    (true, true) => {
                        self.history.record(UndoAction::UpdateOverlay(snapshot));
                        GestureOutcome::Committed
                    }
                    (true, false) => {
                        self.dispatch(CanvasAction::RestoreOverlay(snapshot));
                        GestureOutcome::Cancelled
                    }
                }
            }
        };

        log::debug!("Gesture {} ended: {outcome:?}", kind.as_str());
        self.event_bus.emit(EditorEvent::GestureEnded {
            kind,
            overlay,
            outcome,
        });
    }
}

/// New bounds for a corner drag.
///
/// The corner opposite the dragged one stays put. Width follows the
/// pointer's horizontal travel and height follows from the aspect ratio;
/// both stay at or above `min_size`.
pub fn resized_rect(start: Rect, corner: Corner, delta: Vec2, aspect: f32, min_size: f32) -> Rect {
    let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
    let dx = if corner.is_left() { -delta.x } else { delta.x };

    let mut width = (start.width() + dx).max(min_size);
    let mut height = width / aspect;
    if height < min_size {
        height = min_size;
        width = height * aspect;
    }

    let x = if corner.is_left() { start.max.x - width } else { start.min.x };
    let y = if corner.is_top() { start.max.y - height } else { start.min.y };
    Rect::from_min_size(Pos2::new(x, y), Vec2::new(width, height))
}
