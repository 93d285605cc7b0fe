use coralscape::canvas::{BaseImage, Placement};
use coralscape::catalog::CatalogItem;
use coralscape::compositor::Compositor;
use coralscape::config::EditorConfig;
use coralscape::error::ExportError;
use coralscape::export::{DirectorySink, Exporter, MemorySink};
use coralscape::loader::{ImageRef, MemoryImageLoader};
use coralscape::overlay::OverlayId;
use coralscape::state::EditorContext;
use egui::{Pos2, Vec2};
use futures::executor::block_on;
use image::{Rgba, RgbaImage};

const SAND: Rgba<u8> = Rgba([200, 180, 120, 255]);
const CORAL: Rgba<u8> = Rgba([250, 90, 60, 255]);

fn loader() -> MemoryImageLoader {
    let loader = MemoryImageLoader::new();
    loader.insert_image(ImageRef::new("tank"), RgbaImage::from_pixel(1000, 800, SAND));
    loader.insert_image(ImageRef::new("torch"), RgbaImage::from_pixel(150, 150, CORAL));
    loader
}

fn exporter() -> Exporter<MemoryImageLoader> {
    Exporter::new(Compositor::new(loader(), EditorConfig::default()))
}

fn item(image: &str) -> CatalogItem {
    CatalogItem {
        id: image.to_owned(),
        name: image.to_owned(),
        full_image_url: ImageRef::new(image),
        thumbnail_url: ImageRef::new(format!("{image}-thumb")),
        width: 150.0,
        height: 150.0,
    }
}

// 1000x800 photo shown at 500x400
fn context() -> EditorContext {
    let mut ctx = EditorContext::default();
    ctx.set_base_image(BaseImage::new(ImageRef::new("tank"), 1000, 800));
    ctx.set_display_size(Vec2::new(500.0, 400.0));
    ctx
}

fn decode(png: &[u8]) -> RgbaImage {
    image::load_from_memory(png).unwrap().to_rgba8()
}

// pixels of the watermark plate that the product name darkened
fn label_pixels(image: &RgbaImage, plate: Rgba<u8>) -> usize {
    (730..780)
        .flat_map(|y| (780..980).map(move |x| (x, y)))
        .filter(|&(x, y)| *image.get_pixel(x, y) != plate)
        .count()
}

#[test]
fn test_overlay_lands_at_natural_resolution() {
    let mut ctx = context();
    ctx.place_catalog_item(&item("torch"), Placement::At(Pos2::new(100.0, 50.0)));

    let exporter = exporter();
    let mut sink = MemorySink::new();
    let artifact = block_on(exporter.export(&mut ctx, &mut sink)).unwrap();

    assert_eq!((artifact.width, artifact.height), (1000, 800));
    assert!(artifact.skipped.is_empty());
    assert!(artifact.file_name.starts_with("coralscape-design-"));
    assert!(artifact.file_name.ends_with(".png"));

    let (name, png) = &sink.files()[0];
    assert_eq!(name, &artifact.file_name);
    let image = decode(png);
    // (100, 50) 150x150 on screen is (200, 100) 300x300 in the file
    assert_eq!(*image.get_pixel(200, 100), CORAL);
    assert_eq!(*image.get_pixel(499, 399), CORAL);
    assert_eq!(*image.get_pixel(199, 100), SAND);
    assert_eq!(*image.get_pixel(500, 399), SAND);
}

#[test]
fn test_zero_overlays_still_watermarked() {
    let mut ctx = context();
    let exporter = exporter();
    let mut sink = MemorySink::new();
    block_on(exporter.export(&mut ctx, &mut sink)).unwrap();

    let image = decode(&sink.files()[0].1);
    assert_eq!(*image.get_pixel(10, 10), SAND);
    // 200x50 plate, 20px in from the bottom-right corner, at 0.8 opacity
    let plate = Rgba([244, 240, 228, 255]);
    assert_eq!(*image.get_pixel(782, 732), plate);
    assert_eq!(*image.get_pixel(985, 750), SAND);
    assert!(label_pixels(&image, plate) > 100);
}

#[test]
fn test_watermark_drawn_over_overlays() {
    let mut ctx = context();
    // covers (700, 500)..(1000, 800) in the file, plate included
    ctx.place_catalog_item(&item("torch"), Placement::At(Pos2::new(350.0, 250.0)));

    let exporter = exporter();
    let mut sink = MemorySink::new();
    block_on(exporter.export(&mut ctx, &mut sink)).unwrap();

    let image = decode(&sink.files()[0].1);
    assert_eq!(*image.get_pixel(990, 790), CORAL);
    // white at 0.8 over coral, not over sand
    let plate = Rgba([254, 222, 216, 255]);
    assert_eq!(*image.get_pixel(782, 732), plate);
    assert_eq!(*image.get_pixel(978, 778), plate);
    assert!(label_pixels(&image, plate) > 100);
}

#[test]
fn test_no_base_image_fails_without_output() {
    let mut ctx = EditorContext::default();
    let exporter = exporter();
    let mut sink = MemorySink::new();

    let result = block_on(exporter.export(&mut ctx, &mut sink));
    assert!(matches!(result, Err(ExportError::NoBaseImage)));
    assert!(sink.files().is_empty());
    assert!(exporter.last_error().is_some());
    assert!(!exporter.is_exporting());
}

#[test]
fn test_exports_are_deterministic() {
    let mut ctx = context();
    let id = ctx.place_catalog_item(&item("torch"), Placement::Centered);
    ctx.rotate_quarter_turn(id);
    ctx.toggle_flip_horizontal(id);

    let exporter = exporter();
    let mut sink = MemorySink::new();
    block_on(exporter.export(&mut ctx, &mut sink)).unwrap();
    block_on(exporter.export(&mut ctx, &mut sink)).unwrap();

    let files = sink.files();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].1, files[1].1);
}

#[test]
fn test_second_export_while_busy() {
    let mut ctx = context();
    ctx.set_zoom(2.0);
    ctx.set_pan(Vec2::new(-120.0, -40.0));

    let exporter = exporter();
    let job = exporter.begin(&mut ctx).unwrap();
    assert!(exporter.is_exporting());
    assert_eq!(ctx.canvas().viewport().zoom(), 1.0);
    assert_eq!(ctx.canvas().viewport().pan(), Vec2::ZERO);

    assert!(matches!(exporter.begin(&mut ctx), Err(ExportError::Busy)));

    let mut sink = MemorySink::new();
    block_on(exporter.run(job, &mut sink)).unwrap();
    assert!(!exporter.is_exporting());
    assert!(exporter.begin(&mut ctx).is_ok());
}

#[test]
fn test_broken_overlay_is_skipped() {
    let mut ctx = context();
    ctx.place_catalog_item(&item("torch"), Placement::At(Pos2::new(0.0, 0.0)));
    let missing: OverlayId = ctx.place_catalog_item(&item("lost"), Placement::At(Pos2::new(300.0, 200.0)));

    let exporter = exporter();
    let mut sink = MemorySink::new();
    let artifact = block_on(exporter.export(&mut ctx, &mut sink)).unwrap();
    assert_eq!(artifact.skipped, vec![missing]);

    let image = decode(&sink.files()[0].1);
    assert_eq!(*image.get_pixel(10, 10), CORAL);
    assert_eq!(*image.get_pixel(650, 450), SAND);
}

#[test]
fn test_directory_sink_writes_file() {
    let dir = std::env::temp_dir().join(format!("coralscape-export-{}", std::process::id()));
    let mut ctx = context();
    let exporter = exporter();
    let mut sink = DirectorySink::new(&dir);

    let artifact = block_on(exporter.export(&mut ctx, &mut sink)).unwrap();
    let written = std::fs::read(dir.join(&artifact.file_name)).unwrap();
    assert_eq!(decode(&written).dimensions(), (1000, 800));

    std::fs::remove_dir_all(&dir).unwrap();
}
