use egui::{Pos2, Rect};
use serde::{Deserialize, Serialize};

use crate::canvas::CanvasState;
use crate::config::EditorConfig;
use crate::overlay::{Overlay, OverlayId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn position(&self, rect: Rect) -> Pos2 {
        match self {
            Corner::TopLeft => rect.left_top(),
            Corner::TopRight => rect.right_top(),
            Corner::BottomLeft => rect.left_bottom(),
            Corner::BottomRight => rect.right_bottom(),
        }
    }

    pub fn is_left(&self) -> bool {
        matches!(self, Corner::TopLeft | Corner::BottomLeft)
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Corner::TopLeft | Corner::TopRight)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Corner::TopLeft => "top-left",
            Corner::TopRight => "top-right",
            Corner::BottomLeft => "bottom-left",
            Corner::BottomRight => "bottom-right",
        }
    }
}

/// What sits under the pointer, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    ResizeHandle { id: OverlayId, corner: Corner },
    RotateControl(OverlayId),
    Overlay(OverlayId),
    BaseImage,
    Empty,
}

/// Center of the rotate control, floating above the overlay's top edge
pub fn rotate_control_center(overlay: &Overlay, config: &EditorConfig) -> Pos2 {
    let rect = overlay.rect();
    Pos2::new(rect.center().x, rect.min.y - config.rotate_control_offset)
}

/// Find what a display-space point hits.
///
/// Handles only exist on the selected overlay and take precedence over any
/// overlay body. Bodies are tested front to back.
pub fn hit_test(canvas: &CanvasState, pos: Pos2, config: &EditorConfig) -> HitTarget {
    if let Some(selected) = canvas.selected_overlay() {
        let rect = selected.rect();
        for corner in Corner::ALL {
            if pos.distance(corner.position(rect)) <= config.handle_radius {
                return HitTarget::ResizeHandle {
                    id: selected.id(),
                    corner,
                };
            }
        }
        if pos.distance(rotate_control_center(selected, config)) <= config.rotate_control_radius {
            return HitTarget::RotateControl(selected.id());
        }
    }

    if let Some(overlay) = canvas
        .layers_front_to_back()
        .into_iter()
        .find(|overlay| overlay.rect().contains(pos))
    {
        return HitTarget::Overlay(overlay.id());
    }

    if canvas.base_image().is_some() && canvas.display_rect().contains(pos) {
        HitTarget::BaseImage
    } else {
        HitTarget::Empty
    }
}
