use egui::{Pos2, Rect, Vec2};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::geometry::CenteredTransform;

/// How to draw one image onto the output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawParams {
    /// Center of the drawn image, in output pixels
    pub center: Pos2,
    /// Drawn size before rotation, in output pixels
    pub size: Vec2,
    pub rotation: f32,
    pub flip_h: bool,
    pub flip_v: bool,
    pub opacity: f32,
}

impl DrawParams {
    /// Upright, unflipped placement filling `rect`
    pub fn upright(rect: Rect, opacity: f32) -> Self {
        Self {
            center: rect.center(),
            size: rect.size(),
            rotation: 0.0,
            flip_h: false,
            flip_v: false,
            opacity,
        }
    }
}

/// Source-over blend of a straight-alpha pixel onto another
pub fn blend_over(base: Rgba<u8>, top: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let top_a = (top[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    if top_a <= 0.0 {
        return base;
    }
    if top_a >= 1.0 {
        return top;
    }

    let base_a = base[3] as f32 / 255.0;
    let out_a = top_a + base_a * (1.0 - top_a);
    let mut out = [0u8; 4];
    for c in 0..3 {
        let top_c = top[c] as f32 / 255.0;
        let base_c = base[c] as f32 / 255.0;
        let v = (top_c * top_a + base_c * base_a * (1.0 - top_a)) / out_a;
        out[c] = (v * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

/// Bilinear interpolation; coordinates past the edge reuse the edge pixel
pub fn bilinear_sample(img: &RgbaImage, x: f32, y: f32) -> Rgba<u8> {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;
    let max_x = img.width() as i32 - 1;
    let max_y = img.height() as i32 - 1;

    let sample = |sx: i32, sy: i32| -> [f32; 4] {
        let p = img.get_pixel(sx.clamp(0, max_x) as u32, sy.clamp(0, max_y) as u32);
        [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32]
    };

    let tl = sample(x0, y0);
    let tr = sample(x0 + 1, y0);
    let bl = sample(x0, y0 + 1);
    let br = sample(x0 + 1, y0 + 1);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = lerp(tl[c], tr[c], fx);
        let bot = lerp(bl[c], br[c], fx);
        out[c] = lerp(top, bot, fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

/// Draw `src` onto `dst` through a centered rotate/flip transform.
///
/// A source larger than the drawn size is shrunk to it first; a smaller
/// one is sampled as is. Only output pixels inside both `dst` and the
/// transformed bounds are visited.
pub fn draw_image(dst: &mut RgbaImage, src: &RgbaImage, params: &DrawParams) {
    let size = params.size;
    let usable = size.x.is_finite() && size.y.is_finite() && size.x >= 0.5 && size.y >= 0.5;
    if !usable || params.opacity <= 0.0 || src.width() == 0 || src.height() == 0 {
        return;
    }

    let sample_w = (size.x.round().max(1.0) as u32).min(src.width());
    let sample_h = (size.y.round().max(1.0) as u32).min(src.height());
    let shrunk;
    let source = if src.dimensions() == (sample_w, sample_h) {
        src
    } else {
        shrunk = imageops::resize(src, sample_w, sample_h, FilterType::Triangle);
        &shrunk
    };
    let scale = Vec2::new(sample_w as f32 / size.x, sample_h as f32 / size.y);
    let half = size / 2.0;

    let transform = CenteredTransform::new(
        params.center,
        params.rotation,
        params.flip_h,
        params.flip_v,
    );
    let bounds = transform.bounds(size);
    let x_start = bounds.min.x.floor().max(0.0) as u32;
    let y_start = bounds.min.y.floor().max(0.0) as u32;
    let x_end = (bounds.max.x.ceil().max(0.0) as u32).min(dst.width());
    let y_end = (bounds.max.y.ceil().max(0.0) as u32).min(dst.height());

    for py in y_start..y_end {
        for px in x_start..x_end {
            let local = transform.invert(Pos2::new(px as f32 + 0.5, py as f32 + 0.5));
            if local.x < -half.x || local.x >= half.x || local.y < -half.y || local.y >= half.y {
                continue;
            }
            let u = (local.x + half.x) * scale.x - 0.5;
            let v = (local.y + half.y) * scale.y - 0.5;
            let top = bilinear_sample(source, u, v);
            let base = *dst.get_pixel(px, py);
            dst.put_pixel(px, py, blend_over(base, top, params.opacity));
        }
    }
}

/// Fill a rectangle with a color at the given opacity
pub fn fill_rect(dst: &mut RgbaImage, rect: Rect, color: Rgba<u8>, opacity: f32) {
    let x_start = rect.min.x.round().max(0.0) as u32;
    let y_start = rect.min.y.round().max(0.0) as u32;
    let x_end = (rect.max.x.round().max(0.0) as u32).min(dst.width());
    let y_end = (rect.max.y.round().max(0.0) as u32).min(dst.height());
    for py in y_start..y_end {
        for px in x_start..x_end {
            let base = *dst.get_pixel(px, py);
            dst.put_pixel(px, py, blend_over(base, color, opacity));
        }
    }
}
