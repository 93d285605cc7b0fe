use egui::Vec2;

use crate::canvas::{BaseImage, CanvasState, LayerDirection};
use crate::config::EditorConfig;
use crate::event::EditorEvent;
use crate::overlay::{Overlay, OverlayId, OverlayPatch};
use crate::state::GestureKind;

use super::UndoAction;

/// Every mutation of the canvas model, as a value.
///
/// `apply` is the only place the model changes; it reports what changed,
/// what the undo stack should receive and which events to broadcast.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasAction {
    AddOverlay(Overlay),
    UpdateOverlay {
        id: OverlayId,
        patch: OverlayPatch,
        kind: GestureKind,
    },
    /// Put a whole overlay state back, e.g. when a gesture is cancelled
    RestoreOverlay(Overlay),
    DeleteOverlay(OverlayId),
    MoveLayer {
        id: OverlayId,
        direction: LayerDirection,
    },
    Select(Option<OverlayId>),
    SetZoom(f32),
    SetPan(Vec2),
    ResetView,
    SetBaseImage(BaseImage),
    SetDisplaySize(Vec2),
}

/// Outcome of applying an action
#[derive(Debug, Default)]
pub struct Applied {
    pub changed: bool,
    pub undo: Option<UndoAction>,
    pub events: Vec<EditorEvent>,
}

impl Applied {
    fn unchanged() -> Self {
        Self::default()
    }

    fn changed(events: Vec<EditorEvent>) -> Self {
        Self {
            changed: true,
            undo: None,
            events,
        }
    }

    fn with_undo(mut self, undo: UndoAction) -> Self {
        self.undo = Some(undo);
        self
    }
}

impl CanvasAction {
    pub fn name(&self) -> &'static str {
        match self {
            CanvasAction::AddOverlay(_) => "add-overlay",
            CanvasAction::UpdateOverlay { .. } => "update-overlay",
            CanvasAction::RestoreOverlay(_) => "restore-overlay",
            CanvasAction::DeleteOverlay(_) => "delete-overlay",
            CanvasAction::MoveLayer { .. } => "move-layer",
            CanvasAction::Select(_) => "select",
            CanvasAction::SetZoom(_) => "set-zoom",
            CanvasAction::SetPan(_) => "set-pan",
            CanvasAction::ResetView => "reset-view",
            CanvasAction::SetBaseImage(_) => "set-base-image",
            CanvasAction::SetDisplaySize(_) => "set-display-size",
        }
    }

    pub fn apply(self, canvas: &mut CanvasState, config: &EditorConfig) -> Applied {
        match self {
            CanvasAction::AddOverlay(overlay) => {
                let previous = canvas.selected_id();
                let id = canvas.insert_overlay(overlay);
                let mut events = vec![EditorEvent::OverlayAdded(id)];
                if previous != Some(id) {
                    events.push(EditorEvent::SelectionChanged(Some(id)));
                }
                Applied::changed(events).with_undo(UndoAction::AddOverlay(id))
            }

            CanvasAction::UpdateOverlay { id, patch, kind } => {
                let Some(before) = canvas.overlay(id).cloned() else {
                    return Applied::unchanged();
                };
                if !canvas.update_overlay(id, &patch, config.min_overlay_size) {
                    return Applied::unchanged();
                }
                let applied = Applied::changed(vec![EditorEvent::OverlayUpdated(id)]);
                if kind.is_continuous() {
                    // recorded once, when the gesture ends
                    applied
                } else {
                    applied.with_undo(UndoAction::UpdateOverlay(before))
                }
            }

            CanvasAction::RestoreOverlay(snapshot) => {
                let id = snapshot.id();
                if canvas.replace_overlay(snapshot) {
                    Applied::changed(vec![EditorEvent::OverlayUpdated(id)])
                } else {
                    Applied::unchanged()
                }
            }

            CanvasAction::DeleteOverlay(id) => {
                let was_selected = canvas.selected_id() == Some(id);
                let Some(removed) = canvas.remove_overlay(id) else {
                    return Applied::unchanged();
                };
                let mut events = vec![EditorEvent::OverlayRemoved(id)];
                if was_selected {
                    events.push(EditorEvent::SelectionChanged(None));
                }
                Applied::changed(events).with_undo(UndoAction::DeleteOverlay(removed))
            }

            CanvasAction::MoveLayer { id, direction } => {
                let Some(before) = canvas.overlay(id).cloned() else {
                    return Applied::unchanged();
                };
                match canvas.move_layer(id, direction) {
                    Some(_) => Applied::changed(vec![EditorEvent::OverlayUpdated(id)])
                        .with_undo(UndoAction::UpdateOverlay(before)),
                    None => Applied::unchanged(),
                }
            }

            CanvasAction::Select(id) => {
                if canvas.select(id) {
                    Applied::changed(vec![EditorEvent::SelectionChanged(id)])
                } else {
                    Applied::unchanged()
                }
            }

            CanvasAction::SetZoom(zoom) => {
                let max = config.zoom.max_entry_percent as f32 / 100.0;
                let before = *canvas.viewport();
                if !canvas.viewport_mut().set_zoom(zoom.min(max)) || *canvas.viewport() == before {
                    return Applied::unchanged();
                }
                Applied::changed(vec![view_changed(canvas)])
            }

            CanvasAction::SetPan(pan) => {
                let before = canvas.viewport().pan();
                if !canvas.viewport_mut().set_pan(pan) || canvas.viewport().pan() == before {
                    return Applied::unchanged();
                }
                Applied::changed(vec![view_changed(canvas)])
            }

            CanvasAction::ResetView => {
                if canvas.reset_view() {
                    Applied::changed(vec![view_changed(canvas)])
                } else {
                    Applied::unchanged()
                }
            }

            CanvasAction::SetBaseImage(base) => {
                let pan_before = canvas.viewport().pan();
                canvas.set_base_image(base);
                let mut events = vec![EditorEvent::BaseImageChanged];
                if pan_before != canvas.viewport().pan() {
                    events.push(view_changed(canvas));
                }
                Applied::changed(events)
            }

            CanvasAction::SetDisplaySize(size) => {
                if canvas.set_display_size(size) {
                    Applied::changed(Vec::new())
                } else {
                    Applied::unchanged()
                }
            }
        }
    }
}

fn view_changed(canvas: &CanvasState) -> EditorEvent {
    EditorEvent::ViewChanged {
        zoom: canvas.viewport().zoom(),
        pan: canvas.viewport().pan(),
    }
}
