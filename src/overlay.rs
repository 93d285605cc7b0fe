use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::geometry::normalize_rotation;
use crate::loader::ImageRef;

/// Stable identity of a placed overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OverlayId(Uuid);

impl OverlayId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OverlayId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlay-{}", self.0)
    }
}

/// Where an overlay's picture came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlaySource {
    Catalog { item_id: String },
    Custom,
}

/// One placed specimen image.
///
/// Geometry is in the base image's display space. Fields are private so
/// that every mutation goes through `apply`, which keeps size above the
/// floor, opacity in [0, 1], rotation in [0, 360) and position non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    id: OverlayId,
    source: OverlaySource,
    name: String,
    image: ImageRef,
    position: Pos2,
    size: Vec2,
    opacity: f32,
    rotation: f32,
    flip_h: bool,
    flip_v: bool,
    layer: usize,
}

impl Overlay {
    /// Create an upright, fully opaque overlay
    pub fn new(
        source: OverlaySource,
        name: impl Into<String>,
        image: ImageRef,
        position: Pos2,
        size: Vec2,
        layer: usize,
        min_size: f32,
    ) -> Self {
        Self {
            id: OverlayId::new(),
            source,
            name: name.into(),
            image,
            position,
            size,
            opacity: 1.0,
            rotation: 0.0,
            flip_h: false,
            flip_v: false,
            layer,
        }
        .sanitized(min_size)
    }

    /// Re-establish the field invariants, e.g. after deserializing
    pub fn sanitized(mut self, min_size: f32) -> Self {
        let finite_or = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };
        self.position = Pos2::new(
            finite_or(self.position.x, 0.0).max(0.0),
            finite_or(self.position.y, 0.0).max(0.0),
        );
        self.size = Vec2::new(
            finite_or(self.size.x, min_size).max(min_size),
            finite_or(self.size.y, min_size).max(min_size),
        );
        self.opacity = finite_or(self.opacity, 1.0).clamp(0.0, 1.0);
        self.rotation = normalize_rotation(self.rotation);
        self
    }

    pub fn id(&self) -> OverlayId {
        self.id
    }

    pub fn source(&self) -> &OverlaySource {
        &self.source
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    pub fn position(&self) -> Pos2 {
        self.position
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn flip_h(&self) -> bool {
        self.flip_h
    }

    pub fn flip_v(&self) -> bool {
        self.flip_v
    }

    pub fn layer(&self) -> usize {
        self.layer
    }

    /// Unrotated bounds in display space
    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.position, self.size)
    }

    pub fn center(&self) -> Pos2 {
        self.rect().center()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.size.x / self.size.y
    }

    /// Merge a patch into this overlay, clamping as needed.
    ///
    /// Non-finite numbers in the patch are ignored. Returns true if any
    /// field actually changed.
    pub fn apply(&mut self, patch: &OverlayPatch, min_size: f32) -> bool {
        let before = self.clone();
        let finite = |v: Option<f32>| v.filter(|v| v.is_finite());

        if let Some(x) = finite(patch.x) {
            self.position.x = x.max(0.0);
        }
        if let Some(y) = finite(patch.y) {
            self.position.y = y.max(0.0);
        }
        if let Some(width) = finite(patch.width) {
            self.size.x = width.max(min_size);
        }
        if let Some(height) = finite(patch.height) {
            self.size.y = height.max(min_size);
        }
        if let Some(opacity) = finite(patch.opacity) {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(rotation) = finite(patch.rotation) {
            self.rotation = normalize_rotation(rotation);
        }
        if let Some(flip_h) = patch.flip_h {
            self.flip_h = flip_h;
        }
        if let Some(flip_v) = patch.flip_v {
            self.flip_v = flip_v;
        }
        if let Some(layer) = patch.layer {
            self.layer = layer;
        }

        *self != before
    }
}

/// Partial update for an overlay; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub opacity: Option<f32>,
    pub rotation: Option<f32>,
    pub flip_h: Option<bool>,
    pub flip_v: Option<bool>,
    pub layer: Option<usize>,
}

impl OverlayPatch {
    pub fn position(position: Pos2) -> Self {
        Self {
            x: Some(position.x),
            y: Some(position.y),
            ..Default::default()
        }
    }

    pub fn size(size: Vec2) -> Self {
        Self {
            width: Some(size.x),
            height: Some(size.y),
            ..Default::default()
        }
    }

    pub fn rect(rect: Rect) -> Self {
        Self {
            x: Some(rect.min.x),
            y: Some(rect.min.y),
            width: Some(rect.width()),
            height: Some(rect.height()),
            ..Default::default()
        }
    }

    pub fn opacity(opacity: f32) -> Self {
        Self {
            opacity: Some(opacity),
            ..Default::default()
        }
    }

    pub fn rotation(rotation: f32) -> Self {
        Self {
            rotation: Some(rotation),
            ..Default::default()
        }
    }

    pub fn flips(flip_h: bool, flip_v: bool) -> Self {
        Self {
            flip_h: Some(flip_h),
            flip_v: Some(flip_v),
            ..Default::default()
        }
    }

    pub fn layer(layer: usize) -> Self {
        Self {
            layer: Some(layer),
            ..Default::default()
        }
    }
}
