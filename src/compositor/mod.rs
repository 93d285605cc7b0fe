//! Flattens a canvas into a full-resolution RGBA image.
//!
//! Overlay geometry lives in display space; the output is drawn at the base
//! image's natural size, so every rectangle is rescaled by the ratio of
//! the two before drawing.

pub mod raster;
pub mod watermark;

use ab_glyph::FontArc;
use futures::future::join_all;
use image::RgbaImage;

use crate::canvas::CanvasState;
use crate::config::EditorConfig;
use crate::error::ExportError;
use crate::geometry::{Frame, map_rect};
use crate::loader::ImageLoader;
use crate::overlay::{Overlay, OverlayId};

pub use raster::{DrawParams, blend_over, draw_image};
pub use watermark::{Watermark, bundled_font, draw_watermark, load_font};

/// A finished composition
#[derive(Debug, Clone)]
pub struct Composition {
    pub image: RgbaImage,
    /// Overlays left out because their image failed to load
    pub skipped: Vec<OverlayId>,
}

pub struct Compositor<L> {
    loader: L,
    config: EditorConfig,
    font: Option<FontArc>,
}

impl<L> std::fmt::Debug for Compositor<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("config", &self.config)
            .field("font", &self.font.is_some())
            .finish()
    }
}

impl<L: ImageLoader> Compositor<L> {
    pub fn new(loader: L, config: EditorConfig) -> Self {
        let font = config
            .watermark
            .font_path
            .as_deref()
            .and_then(load_font)
            .or_else(bundled_font);
        Self {
            loader,
            config,
            font,
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Draw the base image, every overlay in layer order and the watermark.
    ///
    /// All images load concurrently and every load is awaited before
    /// drawing starts. A base image failure aborts; an overlay failure only
    /// drops that overlay.
    pub async fn compose(&self, canvas: &CanvasState) -> Result<Composition, ExportError> {
        let base = canvas.base_image().ok_or(ExportError::NoBaseImage)?;
        let overlays = canvas.layers_back_to_front();
        let logo_ref = self.config.watermark.logo.as_ref();

        let (base_pixels, overlay_pixels, logo) = futures::join!(
            self.loader.load(&base.image),
            join_all(overlays.iter().map(|overlay| self.loader.load(overlay.image()))),
            async {
                match logo_ref {
                    Some(logo) => Some(self.loader.load(logo).await),
                    None => None,
                }
            }
        );

        let mut output = base_pixels.map_err(ExportError::BaseImage)?;
        let (width, height) = output.dimensions();
        if (width, height) != (base.natural_width, base.natural_height) {
            log::warn!(
                "Base image {} decoded as {width}x{height}, expected {}x{}",
                base.image,
                base.natural_width,
                base.natural_height
            );
        }

        let display = canvas.display_frame();
        let natural = Frame::from_pixels(width, height);
        log::debug!(
            "Composing {} overlays onto {width}x{height} (display {}x{})",
            overlays.len(),
            display.width,
            display.height
        );

        let mut skipped = Vec::new();
        for (overlay, pixels) in overlays.iter().zip(overlay_pixels) {
            match pixels {
                Ok(pixels) => draw_overlay(&mut output, &pixels, overlay, display, natural),
                Err(err) => {
                    log::warn!("Skipping {} ({}): {err}", overlay.id(), overlay.name());
                    skipped.push(overlay.id());
                }
            }
        }

        let logo = match logo {
            Some(Ok(pixels)) => Some(pixels),
            Some(Err(err)) => {
                log::warn!("Watermark logo unavailable, using text label: {err}");
                None
            }
            None => None,
        };
        let watermark = match &logo {
            Some(pixels) => Watermark::Logo(pixels),
            None => Watermark::Label {
                text: &self.config.product_name,
                font: self.font.as_ref(),
            },
        };
        draw_watermark(&mut output, &watermark, &self.config.watermark);

        Ok(Composition {
            image: output,
            skipped,
        })
    }
}

fn draw_overlay(
    output: &mut RgbaImage,
    pixels: &RgbaImage,
    overlay: &Overlay,
    display: Frame,
    natural: Frame,
) {
    let rect = map_rect(overlay.rect(), display, natural);
    let params = DrawParams {
        center: rect.center(),
        size: rect.size(),
        rotation: overlay.rotation(),
        flip_h: overlay.flip_h(),
        flip_v: overlay.flip_v(),
        opacity: overlay.opacity(),
    };
    draw_image(output, pixels, &params);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BaseImage, Placement};
    use crate::loader::{ImageRef, MemoryImageLoader};
    use crate::overlay::{OverlayPatch, OverlaySource};
    use egui::{Pos2, Vec2};
    use futures::executor::block_on;
    use image::Rgba;

    const SAND: Rgba<u8> = Rgba([200, 180, 120, 255]);
    const CORAL: Rgba<u8> = Rgba([250, 90, 60, 255]);

    fn config() -> EditorConfig {
        let mut config = EditorConfig::default();
        config.watermark.opacity = 0.0;
        config
    }

    fn canvas_with(loader: &MemoryImageLoader, overlay_image: &str) -> CanvasState {
        loader.insert_image(ImageRef::new("base"), RgbaImage::from_pixel(200, 100, SAND));
        let mut canvas = CanvasState::new();
        canvas.set_base_image(BaseImage::new(ImageRef::new("base"), 200, 100));
        canvas.set_display_size(Vec2::new(100.0, 50.0));
        let overlay = canvas.build_overlay(
            OverlaySource::Custom,
            "coral",
            ImageRef::new(overlay_image),
            Vec2::new(20.0, 20.0),
            Placement::At(Pos2::new(20.0, 10.0)),
            &config(),
        );
        canvas.insert_overlay(overlay);
        canvas
    }

    #[test]
    fn test_overlay_scaled_to_natural_resolution() {
        let loader = MemoryImageLoader::new();
        loader.insert_image(ImageRef::new("coral"), RgbaImage::from_pixel(10, 10, CORAL));
        let canvas = canvas_with(&loader, "coral");

        let compositor = Compositor::new(loader, config());
        let composition = block_on(compositor.compose(&canvas)).unwrap();
        let image = composition.image;

        assert_eq!(image.dimensions(), (200, 100));
        // (20, 10) 20x20 in display space is (40, 20) 40x40 in the output
        assert_eq!(*image.get_pixel(40, 20), CORAL);
        assert_eq!(*image.get_pixel(79, 59), CORAL);
        assert_eq!(*image.get_pixel(39, 20), SAND);
        assert_eq!(*image.get_pixel(80, 59), SAND);
        assert!(composition.skipped.is_empty());
    }

    #[test]
    fn test_oversized_overlay_is_clipped_to_output() {
        let loader = MemoryImageLoader::new();
        loader.insert_image(ImageRef::new("coral"), RgbaImage::from_pixel(10, 10, CORAL));
        let mut canvas = canvas_with(&loader, "coral");
        let id = canvas.overlays()[0].id();
        canvas.update_overlay(id, &OverlayPatch::size(Vec2::splat(40000.0)), 20.0);

        let compositor = Compositor::new(loader, config());
        let image = block_on(compositor.compose(&canvas)).unwrap().image;
        assert_eq!(image.dimensions(), (200, 100));
        assert_eq!(*image.get_pixel(40, 20), CORAL);
        assert_eq!(*image.get_pixel(199, 99), CORAL);
        assert_eq!(*image.get_pixel(39, 19), SAND);
    }

    #[test]
    fn test_failed_overlay_is_skipped() {
        let loader = MemoryImageLoader::new();
        let canvas = canvas_with(&loader, "missing");
        let id = canvas.overlays()[0].id();

        let compositor = Compositor::new(loader, config());
        let composition = block_on(compositor.compose(&canvas)).unwrap();
        assert_eq!(composition.skipped, vec![id]);
        assert_eq!(*composition.image.get_pixel(45, 25), SAND);
    }

    #[test]
    fn test_missing_base_image() {
        let compositor = Compositor::new(MemoryImageLoader::new(), config());
        let result = block_on(compositor.compose(&CanvasState::new()));
        assert!(matches!(result, Err(ExportError::NoBaseImage)));

        let mut canvas = CanvasState::new();
        canvas.set_base_image(BaseImage::new(ImageRef::new("gone"), 10, 10));
        let result = block_on(compositor.compose(&canvas));
        assert!(matches!(result, Err(ExportError::BaseImage(_))));
    }
}
