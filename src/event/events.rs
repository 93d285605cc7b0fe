use egui::Vec2;

use crate::overlay::OverlayId;
use crate::state::GestureKind;

/// How a gesture finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// The overlay changed and an undo entry was recorded
    Committed,
    /// Ended without changing anything
    Unchanged,
    /// Reverted to the state at gesture start
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    GestureStarted {
        kind: GestureKind,
        overlay: Option<OverlayId>,
    },
    GestureEnded {
        kind: GestureKind,
        overlay: Option<OverlayId>,
        outcome: GestureOutcome,
    },
    OverlayAdded(OverlayId),
    OverlayUpdated(OverlayId),
    OverlayRemoved(OverlayId),
    SelectionChanged(Option<OverlayId>),
    ViewChanged {
        zoom: f32,
        pan: Vec2,
    },
    BaseImageChanged,
    UndoApplied {
        action: &'static str,
        overlay: OverlayId,
    },
}
