//! The pointer-gesture state machine.
//!
//! At most one gesture runs at a time. Every gesture starts from and ends
//! in `Idle`:
//!
//! ```text
//!            pointer down on overlay body   ┌──────────┐
//!          ┌───────────────────────────────►│ Dragging ├──┐
//!          │  on a corner handle            ├──────────┤  │
//! ┌──────┐ ├───────────────────────────────►│ Resizing ├──┤ up / leave / cancel
//! │ Idle │ │  on the rotate control         ├──────────┤  ├──────────► Idle
//! └──────┘ ├───────────────────────────────►│ Rotating ├──┤
//!          │  on the base image, zoom > 1   ├──────────┤  │
//!          └───────────────────────────────►│ Panning  ├──┘
//!                                           └──────────┘
//! ```
//!
//! Overlay gestures carry a snapshot of the overlay from gesture start; it
//! becomes the undo entry on commit and the restore point on cancel.
use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::StateTransitionError;
use crate::geometry::Corner;
use crate::overlay::{Overlay, OverlayId};

/// What produced an overlay update. Decides when the undo entry is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureKind {
    Drag,
    Resize,
    Rotate,
    Pan,
    /// Toolbar buttons, numeric fields, keyboard: one update, one entry
    InstantEdit,
}

impl GestureKind {
    /// Continuous gestures record a single entry when they end
    pub fn is_continuous(&self) -> bool {
        !matches!(self, GestureKind::InstantEdit)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GestureKind::Drag => "drag",
            GestureKind::Resize => "resize",
            GestureKind::Rotate => "rotate",
            GestureKind::Pan => "pan",
            GestureKind::InstantEdit => "instant-edit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Dragging {
        id: OverlayId,
        /// Pointer position relative to the overlay's top-left corner
        grab_offset: Vec2,
        snapshot: Overlay,
    },
    Resizing {
        id: OverlayId,
        corner: Corner,
        start_pointer: Pos2,
        start_rect: Rect,
        aspect: f32,
        snapshot: Overlay,
    },
    Rotating {
        id: OverlayId,
        control_center: Pos2,
        start_pointer: Pos2,
        /// Pointer angle around the control at the previous move, degrees
        last_angle: f32,
        /// Unwrapped pointer travel since gesture start, degrees
        travel: f32,
        moved: bool,
        snapshot: Overlay,
    },
    Panning {
        /// Screen-space pointer minus pan at gesture start
        anchor: Vec2,
        start_pan: Vec2,
    },
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    pub fn kind(&self) -> Option<GestureKind> {
        match self {
            InteractionState::Idle => None,
            InteractionState::Dragging { .. } => Some(GestureKind::Drag),
            InteractionState::Resizing { .. } => Some(GestureKind::Resize),
            InteractionState::Rotating { .. } => Some(GestureKind::Rotate),
            InteractionState::Panning { .. } => Some(GestureKind::Pan),
        }
    }

    /// The overlay this gesture is acting on
    pub fn overlay_id(&self) -> Option<OverlayId> {
        match self {
            InteractionState::Dragging { id, .. }
            | InteractionState::Resizing { id, .. }
            | InteractionState::Rotating { id, .. } => Some(*id),
            InteractionState::Idle | InteractionState::Panning { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().map_or("idle", |kind| kind.as_str())
    }

    /// Gestures only start from idle, and every gesture may return to idle
    pub fn can_transition_to(&self, next: &InteractionState) -> bool {
        self.is_idle() || next.is_idle()
    }

    /// Validate a transition without performing it
    pub fn check_transition(&self, next: &InteractionState) -> Result<(), StateTransitionError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(StateTransitionError::GestureInProgress {
                active: self.name(),
                requested: next.name(),
            })
        }
    }
}

/// Signed angle of `v` in degrees, clockwise from +x with y pointing down
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x).to_degrees()
}

/// Fold an angle difference into (-180, 180]
pub fn wrap_delta(degrees: f32) -> f32 {
    let folded = degrees % 360.0;
    if folded > 180.0 {
        folded - 360.0
    } else if folded <= -180.0 {
        folded + 360.0
    } else {
        folded
    }
}
