use std::collections::VecDeque;

use crate::canvas::CanvasState;
use crate::overlay::{Overlay, OverlayId};

/// One undoable step, holding what is needed to reverse it
#[derive(Debug, Clone, PartialEq)]
pub enum UndoAction {
    /// An overlay was added; undo removes it
    AddOverlay(OverlayId),
    /// An overlay was deleted; undo puts this copy back
    DeleteOverlay(Overlay),
    /// An overlay was edited; undo restores this earlier state
    UpdateOverlay(Overlay),
}

impl UndoAction {
    pub fn overlay_id(&self) -> OverlayId {
        match self {
            UndoAction::AddOverlay(id) => *id,
            UndoAction::DeleteOverlay(overlay) | UndoAction::UpdateOverlay(overlay) => overlay.id(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UndoAction::AddOverlay(_) => "add",
            UndoAction::DeleteOverlay(_) => "delete",
            UndoAction::UpdateOverlay(_) => "update",
        }
    }

    /// Apply the inverse of this action to the canvas
    pub fn revert(self, canvas: &mut CanvasState) -> bool {
        match self {
            UndoAction::AddOverlay(id) => canvas.remove_overlay(id).is_some(),
            UndoAction::DeleteOverlay(overlay) => {
                if canvas.contains(overlay.id()) {
                    return false;
                }
                let id = canvas.insert_overlay(overlay);
                canvas.select(Some(id));
                true
            }
            UndoAction::UpdateOverlay(snapshot) => canvas.replace_overlay(snapshot),
        }
    }
}

/// Bounded stack of undo entries; the oldest entry falls off the bottom
#[derive(Debug, Clone)]
pub struct UndoHistory {
    stack: VecDeque<UndoAction>,
    limit: usize,
}

impl UndoHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            stack: VecDeque::with_capacity(limit),
            limit: limit.max(1),
        }
    }

    /// Push an entry. An entry equal to the current top is dropped.
    pub fn record(&mut self, action: UndoAction) -> bool {
        if self.stack.back() == Some(&action) {
            return false;
        }
        if self.stack.len() == self.limit {
            self.stack.pop_front();
        }
        log::trace!("undo entry: {} {}", action.label(), action.overlay_id());
        self.stack.push_back(action);
        true
    }

    /// Pop the newest entry and revert it. Returns the reverted entry.
    pub fn undo(&mut self, canvas: &mut CanvasState) -> Option<UndoAction> {
        let action = self.stack.pop_back()?;
        if !action.clone().revert(canvas) {
            log::debug!("undo {} {} had nothing to revert", action.label(), action.overlay_id());
        }
        Some(action)
    }

    pub fn can_undo(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BaseImage, Placement};
    use crate::config::EditorConfig;
    use crate::loader::ImageRef;
    use crate::overlay::{OverlayPatch, OverlaySource};
    use egui::{Pos2, Vec2};

    fn canvas_with_overlay() -> (CanvasState, OverlayId) {
        let mut canvas = CanvasState::new();
        canvas.set_base_image(BaseImage::new(ImageRef::new("tank.jpg"), 800, 600));
        let overlay = canvas.build_overlay(
            OverlaySource::Custom,
            "frag",
            ImageRef::new("frag.png"),
            Vec2::new(50.0, 50.0),
            Placement::At(Pos2::new(5.0, 5.0)),
            &EditorConfig::default(),
        );
        let id = canvas.insert_overlay(overlay);
        (canvas, id)
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let (mut canvas, id) = canvas_with_overlay();
        let mut history = UndoHistory::new(20);
        for step in 0..25 {
            let before = canvas.overlay(id).cloned().unwrap();
            let x = 10.0 * (step + 1) as f32;
            canvas.update_overlay(id, &OverlayPatch::position(Pos2::new(x, 5.0)), 20.0);
            history.record(UndoAction::UpdateOverlay(before));
        }
        assert_eq!(history.len(), 20);

        while history.undo(&mut canvas).is_some() {}
        // The five oldest entries are gone, so x stops at step 5's value
        assert_eq!(canvas.overlay(id).map(|o| o.position().x), Some(50.0));
    }

    #[test]
    fn test_identical_top_entry_is_dropped() {
        let (canvas, id) = canvas_with_overlay();
        let snapshot = canvas.overlay(id).cloned().unwrap();
        let mut history = UndoHistory::new(20);
        assert!(history.record(UndoAction::UpdateOverlay(snapshot.clone())));
        assert!(!history.record(UndoAction::UpdateOverlay(snapshot)));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_undo_add_and_delete() {
        let (mut canvas, id) = canvas_with_overlay();
        let mut history = UndoHistory::new(20);
        history.record(UndoAction::AddOverlay(id));
        history.undo(&mut canvas);
        assert!(canvas.overlays().is_empty());
        assert_eq!(canvas.selected_id(), None);

        let (mut canvas, id) = canvas_with_overlay();
        let removed = canvas.remove_overlay(id).unwrap();
        history.record(UndoAction::DeleteOverlay(removed));
        history.undo(&mut canvas);
        assert!(canvas.contains(id));
        assert_eq!(canvas.selected_id(), Some(id));
    }

    #[test]
    fn test_undo_add_keeps_other_selection() {
        let (mut canvas, first) = canvas_with_overlay();
        let second = canvas.build_overlay(
            OverlaySource::Custom,
            "zoa",
            ImageRef::new("zoa.png"),
            Vec2::new(40.0, 40.0),
            Placement::At(Pos2::new(200.0, 200.0)),
            &EditorConfig::default(),
        );
        let second = canvas.insert_overlay(second);
        let mut history = UndoHistory::new(20);
        history.record(UndoAction::AddOverlay(first));
        history.record(UndoAction::AddOverlay(OverlayId::new()));

        // already gone: nothing changes
        history.undo(&mut canvas);
        assert_eq!(canvas.overlays().len(), 2);
        assert_eq!(canvas.selected_id(), Some(second));

        history.undo(&mut canvas);
        assert!(!canvas.contains(first));
        assert_eq!(canvas.selected_id(), Some(second));
    }

    #[test]
    fn test_undo_delete_does_not_duplicate() {
        let (mut canvas, id) = canvas_with_overlay();
        let copy = canvas.overlay(id).cloned().unwrap();
        let mut history = UndoHistory::new(20);
        history.record(UndoAction::DeleteOverlay(copy));
        history.undo(&mut canvas);
        assert_eq!(canvas.overlays().len(), 1);
    }

    #[test]
    fn test_undo_update_of_missing_overlay_is_noop() {
        let (mut canvas, id) = canvas_with_overlay();
        let snapshot = canvas.remove_overlay(id).unwrap();
        let mut history = UndoHistory::new(20);
        history.record(UndoAction::UpdateOverlay(snapshot));
        assert!(history.undo(&mut canvas).is_some());
        assert!(canvas.overlays().is_empty());
        assert!(!history.can_undo());
    }
}
