use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use egui::{Pos2, Rect, Vec2};
use image::{Rgba, RgbaImage};
use std::path::Path;

use crate::config::WatermarkConfig;

use super::raster::{DrawParams, blend_over, draw_image, fill_rect};

const PLATE_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const LABEL_COLOR: Rgba<u8> = Rgba([16, 52, 84, 255]);
/// Height of the text plate relative to its width
const PLATE_ASPECT: f32 = 0.25;

/// What gets stamped in the bottom-right corner of an export
pub enum Watermark<'a> {
    Logo(&'a RgbaImage),
    Label {
        text: &'a str,
        font: Option<&'a FontArc>,
    },
}

/// Load a TTF/OTF font, logging instead of failing
pub fn load_font(path: &Path) -> Option<FontArc> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::warn!("Could not read watermark font {}: {err}", path.display());
            return None;
        }
    };
    match FontArc::try_from_vec(bytes) {
        Ok(font) => Some(font),
        Err(err) => {
            log::warn!("Invalid watermark font {}: {err}", path.display());
            None
        }
    }
}

/// The proportional font bundled with egui, used when no font is configured
pub fn bundled_font() -> Option<FontArc> {
    let definitions = egui::FontDefinitions::default();
    let name = definitions
        .families
        .get(&egui::FontFamily::Proportional)?
        .first()?;
    let data = definitions.font_data.get(name)?;
    match FontArc::try_from_vec(data.font.to_vec()) {
        Ok(font) => Some(font),
        Err(err) => {
            log::warn!("Bundled font {name} is unusable: {err}");
            None
        }
    }
}

/// Bottom-right box of the given width, `margin` pixels in from both edges
pub fn watermark_rect(output: (u32, u32), size: Vec2, margin: u32) -> Rect {
    let (width, height) = output;
    let min = Pos2::new(
        width as f32 - margin as f32 - size.x,
        height as f32 - margin as f32 - size.y,
    );
    Rect::from_min_size(min, size)
}

/// Stamp the watermark onto a finished composition
pub fn draw_watermark(dst: &mut RgbaImage, watermark: &Watermark<'_>, config: &WatermarkConfig) {
    let target_width = (dst.width() as f32 * config.width_fraction).round().max(1.0);

    match watermark {
        Watermark::Logo(logo) => {
            if logo.width() == 0 || logo.height() == 0 {
                return;
            }
            let height = target_width * logo.height() as f32 / logo.width() as f32;
            let rect = watermark_rect(dst.dimensions(), Vec2::new(target_width, height), config.margin);
            draw_image(dst, logo, &DrawParams::upright(rect, config.opacity));
        }
        Watermark::Label { text, font } => {
            let size = Vec2::new(target_width, (target_width * PLATE_ASPECT).round().max(1.0));
            let rect = watermark_rect(dst.dimensions(), size, config.margin);
            fill_rect(dst, rect, PLATE_COLOR, config.opacity);
            match font {
                Some(font) => draw_label(dst, rect, text, font, config.opacity),
                None => log::warn!("No watermark font available; drawing the plate only"),
            }
        }
    }
}

fn line_width(font: &FontArc, scale: PxScale, text: &str) -> f32 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0;
    let mut prev = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width
}

/// Draw `text` centered in `plate`, shrunk to fit its width
fn draw_label(dst: &mut RgbaImage, plate: Rect, text: &str, font: &FontArc, opacity: f32) {
    let padding = plate.height() * 0.15;
    let mut scale = PxScale::from(plate.height() * 0.6);
    let available = plate.width() - 2.0 * padding;
    let natural = line_width(font, scale, text);
    if natural > available && natural > 0.0 {
        let shrink = available / natural;
        scale = PxScale::from(scale.y * shrink);
    }

    let scaled = font.as_scaled(scale);
    let width = line_width(font, scale, text);
    let text_height = scaled.ascent() - scaled.descent();
    let mut cursor_x = plate.center().x - width / 2.0;
    let baseline = plate.center().y - text_height / 2.0 + scaled.ascent();

    let (out_w, out_h) = dst.dimensions();
    let mut prev = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = prev {
            cursor_x += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scale, point(cursor_x, baseline));
        cursor_x += scaled.h_advance(id);
        prev = Some(id);

        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let x = bounds.min.x as i64 + gx as i64;
            let y = bounds.min.y as i64 + gy as i64;
            if x < 0 || y < 0 || x >= out_w as i64 || y >= out_h as i64 {
                return;
            }
            let (x, y) = (x as u32, y as u32);
            let base = *dst.get_pixel(x, y);
            dst.put_pixel(x, y, blend_over(base, LABEL_COLOR, coverage * opacity));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watermark_rect_is_bottom_right() {
        let rect = watermark_rect((1000, 800), Vec2::new(200.0, 50.0), 20);
        assert_eq!(rect.min, Pos2::new(780.0, 730.0));
        assert_eq!(rect.max, Pos2::new(980.0, 780.0));
    }

    #[test]
    fn test_logo_watermark_scales_to_width_fraction() {
        let mut dst = RgbaImage::from_pixel(500, 400, Rgba([0, 0, 0, 255]));
        let logo = RgbaImage::from_pixel(50, 25, Rgba([255, 255, 255, 255]));
        draw_watermark(&mut dst, &Watermark::Logo(&logo), &WatermarkConfig::default());

        // 100x50 logo ending 20px from the right and bottom edges
        assert_eq!(*dst.get_pixel(380, 330), Rgba([204, 204, 204, 255]));
        assert_eq!(*dst.get_pixel(479, 379), Rgba([204, 204, 204, 255]));
        assert_eq!(*dst.get_pixel(379, 330), Rgba([0, 0, 0, 255]));
        assert_eq!(*dst.get_pixel(480, 379), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_label_without_font_draws_plate() {
        let mut dst = RgbaImage::from_pixel(400, 300, Rgba([0, 0, 0, 255]));
        let watermark = Watermark::Label {
            text: "CoralScape",
            font: None,
        };
        draw_watermark(&mut dst, &watermark, &WatermarkConfig::default());
        // 80x20 plate
        assert_eq!(*dst.get_pixel(300, 260), Rgba([204, 204, 204, 255]));
        assert_eq!(*dst.get_pixel(299, 260), Rgba([0, 0, 0, 255]));
        assert_eq!(*dst.get_pixel(300, 259), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_label_draws_text_inside_plate() {
        let font = bundled_font().unwrap();
        let mut dst = RgbaImage::from_pixel(1000, 800, Rgba([0, 0, 0, 255]));
        let watermark = Watermark::Label {
            text: "CoralScape",
            font: Some(&font),
        };
        draw_watermark(&mut dst, &watermark, &WatermarkConfig::default());

        let plate = Rgba([204, 204, 204, 255]);
        let mut glyph_pixels = 0;
        for y in 730..780 {
            for x in 780..980 {
                if *dst.get_pixel(x, y) != plate {
                    glyph_pixels += 1;
                }
            }
        }
        assert!(glyph_pixels > 100);
        assert_eq!(*dst.get_pixel(782, 732), plate);
        assert_eq!(*dst.get_pixel(779, 755), Rgba([0, 0, 0, 255]));
        assert_eq!(*dst.get_pixel(880, 781), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_missing_font_file() {
        assert!(load_font(Path::new("/nonexistent/coralscape.ttf")).is_none());
    }
}
