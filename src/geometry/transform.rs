use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Width and height of a rectangular coordinate frame whose origin is its
/// top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub width: f32,
    pub height: f32,
}

impl Frame {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f32, height as f32)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Pos2 {
        Pos2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }
}

/// Per-axis scale that takes lengths in `source` to lengths in `target`.
///
/// An axis where the source has no usable extent maps 1:1.
pub fn scale_between(source: Frame, target: Frame) -> Vec2 {
    let axis = |from: f32, to: f32| {
        if from.is_finite() && from > 0.0 && to.is_finite() {
            to / from
        } else {
            1.0
        }
    };
    Vec2::new(axis(source.width, target.width), axis(source.height, target.height))
}

/// Linearly rescale a point from one frame to another
pub fn map_point(point: Pos2, source: Frame, target: Frame) -> Pos2 {
    let scale = scale_between(source, target);
    Pos2::new(point.x * scale.x, point.y * scale.y)
}

/// Rescale a whole rectangle; position goes through `map_point`, size
/// through the same per-axis ratio.
pub fn map_rect(rect: Rect, source: Frame, target: Frame) -> Rect {
    let scale = scale_between(source, target);
    Rect::from_min_size(
        map_point(rect.min, source, target),
        Vec2::new(rect.width() * scale.x, rect.height() * scale.y),
    )
}

/// Fold any angle in degrees into [0, 360)
pub fn normalize_rotation(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let folded = ((degrees % 360.0) + 360.0) % 360.0;
    // 360 - epsilon can round up to exactly 360 in f32
    if folded >= 360.0 { 0.0 } else { folded }
}

/// Drawing transform for an image drawn centered on the origin.
///
/// Composition order is translate(center), then rotate (clockwise, y down),
/// then scale(±1, ±1) for the flips. A local point `p` measured from the
/// image center lands at `center + R * S * p`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenteredTransform {
    center: Pos2,
    cos: f32,
    sin: f32,
    flip: Vec2,
}

impl CenteredTransform {
    pub fn new(center: Pos2, rotation_degrees: f32, flip_h: bool, flip_v: bool) -> Self {
        let (sin, cos) = normalize_rotation(rotation_degrees).to_radians().sin_cos();
        Self {
            center,
            cos,
            sin,
            flip: Vec2::new(
                if flip_h { -1.0 } else { 1.0 },
                if flip_v { -1.0 } else { 1.0 },
            ),
        }
    }

    pub fn center(&self) -> Pos2 {
        self.center
    }

    /// Local (center-relative, unrotated) point to world space
    pub fn apply(&self, local: Vec2) -> Pos2 {
        let scaled = Vec2::new(local.x * self.flip.x, local.y * self.flip.y);
        let rotated = Vec2::new(
            scaled.x * self.cos - scaled.y * self.sin,
            scaled.x * self.sin + scaled.y * self.cos,
        );
        self.center + rotated
    }

    /// World point back to local space; exact inverse of `apply`
    pub fn invert(&self, world: Pos2) -> Vec2 {
        let d = world - self.center;
        let unrotated = Vec2::new(d.x * self.cos + d.y * self.sin, -d.x * self.sin + d.y * self.cos);
        Vec2::new(unrotated.x * self.flip.x, unrotated.y * self.flip.y)
    }

    /// Axis-aligned bounds of a `size` image drawn through this transform
    pub fn bounds(&self, size: Vec2) -> Rect {
        let half = size / 2.0;
        let corners = [
            Vec2::new(-half.x, -half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
        ];
        let mut rect = Rect::NOTHING;
        for corner in corners {
            rect.extend_with(self.apply(corner));
        }
        rect
    }
}
