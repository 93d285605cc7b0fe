use coralscape::canvas::{BaseImage, LayerDirection, Placement};
use coralscape::catalog::CatalogItem;
use coralscape::error::InputError;
use coralscape::input::{FocusTarget, InputHandler, route_event};
use coralscape::loader::ImageRef;
use coralscape::overlay::OverlayPatch;
use coralscape::state::{EditorContext, GestureKind};
use egui::{Key, Modifiers, PointerButton, Pos2, Vec2};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

fn item(id: &str, width: f32, height: f32) -> CatalogItem {
    CatalogItem {
        id: id.to_owned(),
        name: id.to_owned(),
        full_image_url: ImageRef::new(format!("{id}.png")),
        thumbnail_url: ImageRef::new(format!("{id}-thumb.png")),
        width,
        height,
    }
}

fn context() -> EditorContext {
    let mut ctx = EditorContext::default();
    ctx.set_base_image(BaseImage::new(ImageRef::new("tank.jpg"), 1000, 800));
    ctx.set_display_size(Vec2::new(500.0, 400.0));
    ctx
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbaImage::from_pixel(width, height, Rgba([10, 120, 200, 255]))
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn button(pos: Pos2, pressed: bool, modifiers: Modifiers) -> egui::Event {
    egui::Event::PointerButton {
        pos,
        button: PointerButton::Primary,
        pressed,
        modifiers,
    }
}

fn key(key: Key, modifiers: Modifiers) -> egui::Event {
    egui::Event::Key {
        key,
        physical_key: None,
        pressed: true,
        repeat: false,
        modifiers,
    }
}

#[test]
fn test_catalog_item_scaled_and_centered() {
    let mut ctx = context();
    let id = ctx.place_catalog_item(&item("acropora", 600.0, 300.0), Placement::Centered);

    let overlay = ctx.canvas().overlay(id).unwrap();
    assert_eq!(overlay.size(), Vec2::new(150.0, 75.0));
    assert_eq!(overlay.center(), Pos2::new(250.0, 200.0));
    assert_eq!(ctx.canvas().selected_id(), Some(id));
    assert_eq!(ctx.history().len(), 1);
}

#[test]
fn test_custom_upload() {
    let mut ctx = context();
    let id = ctx
        .place_custom_image(
            "my-frag.png",
            ImageRef::new("uploads/my-frag.png"),
            &png(400, 200),
            Placement::At(Pos2::new(10.0, 10.0)),
        )
        .unwrap();
    assert_eq!(ctx.canvas().overlay(id).unwrap().size(), Vec2::new(150.0, 75.0));

    let err = ctx
        .place_custom_image(
            "notes.txt",
            ImageRef::new("uploads/notes.txt"),
            b"not an image",
            Placement::Centered,
        )
        .unwrap_err();
    assert_eq!(err, InputError::UnsupportedFile("notes.txt".to_owned()));
    assert_eq!(ctx.canvas().overlays().len(), 1);
}

#[test]
fn test_uploaded_base_image_size() {
    let mut ctx = EditorContext::default();
    ctx.upload_base_image("tank.png", ImageRef::new("tank.png"), &png(64, 48))
        .unwrap();
    let base = ctx.canvas().base_image().unwrap();
    assert_eq!((base.natural_width, base.natural_height), (64, 48));
}

#[test]
fn test_undo_keeps_latest_twenty() {
    let mut ctx = context();
    let id = ctx.place_catalog_item(&item("zoa", 100.0, 100.0), Placement::At(Pos2::ZERO));
    for x in 1..=25 {
        let patch = OverlayPatch::position(Pos2::new(x as f32, 0.0));
        assert!(ctx.update_overlay(id, patch, GestureKind::InstantEdit));
    }
    assert_eq!(ctx.history().len(), 20);

    while ctx.undo() {}
    // the placement and the first five moves fell off the end
    let overlay = ctx.canvas().overlay(id).unwrap();
    assert_eq!(overlay.position(), Pos2::new(5.0, 0.0));
}

#[test]
fn test_delete_then_undo_restores() {
    let mut ctx = context();
    let id = ctx.place_catalog_item(&item("torch", 150.0, 150.0), Placement::Centered);
    ctx.rotate_quarter_turn(id);

    assert!(ctx.delete_selected());
    assert!(!ctx.canvas().contains(id));
    assert_eq!(ctx.canvas().selected_id(), None);

    assert!(ctx.undo());
    let overlay = ctx.canvas().overlay(id).unwrap();
    assert_eq!(overlay.rotation(), 90.0);
    assert_eq!(ctx.canvas().selected_id(), Some(id));
}

#[test]
fn test_move_layer_up() {
    let mut ctx = context();
    let a = ctx.place_catalog_item(&item("a", 50.0, 50.0), Placement::Centered);
    let b = ctx.place_catalog_item(&item("b", 50.0, 50.0), Placement::Centered);
    let c = ctx.place_catalog_item(&item("c", 50.0, 50.0), Placement::Centered);

    assert!(ctx.move_layer(b, LayerDirection::Up));
    assert_eq!(ctx.canvas().overlay(b).unwrap().layer(), 2);
    let order: Vec<_> = ctx
        .canvas()
        .layers_front_to_back()
        .iter()
        .map(|overlay| overlay.id())
        .collect();
    assert_eq!(order, vec![b, c, a]);
}

#[test]
fn test_zoom_back_to_one_resets_pan() {
    let mut ctx = context();
    assert!(ctx.zoom_in());
    assert!((ctx.canvas().viewport().zoom() - 1.2).abs() < 1e-5);
    assert!(ctx.set_pan(Vec2::new(30.0, -12.0)));

    ctx.zoom_out();
    assert!((ctx.canvas().viewport().zoom() - 1.0).abs() < 1e-5);
    assert_eq!(ctx.canvas().viewport().pan(), Vec2::ZERO);
}

#[test]
fn test_zoom_entry() {
    let mut ctx = context();
    assert_eq!(ctx.set_zoom_entry("150%"), Ok(true));
    assert!((ctx.canvas().viewport().zoom() - 1.5).abs() < 1e-5);
    assert!(ctx.set_zoom_entry("900").is_err());
    assert!(ctx.set_zoom_entry("big").is_err());
    assert!((ctx.canvas().viewport().zoom() - 1.5).abs() < 1e-5);
}

#[test]
fn test_drag_and_undo_through_input() {
    let mut ctx = context();
    let id = ctx.place_catalog_item(&item("torch", 150.0, 150.0), Placement::At(Pos2::new(100.0, 50.0)));
    let mut input = InputHandler::new();

    let frame = [
        button(Pos2::new(150.0, 100.0), true, Modifiers::NONE),
        egui::Event::PointerMoved(Pos2::new(180.0, 120.0)),
        egui::Event::PointerMoved(Pos2::new(200.0, 130.0)),
        button(Pos2::new(200.0, 130.0), false, Modifiers::NONE),
    ];
    for event in input.process_events(&frame) {
        route_event(&event, &mut ctx, FocusTarget::Canvas);
    }
    assert!(ctx.state().is_idle());
    assert_eq!(ctx.canvas().overlay(id).unwrap().position(), Pos2::new(150.0, 80.0));

    // shortcuts stay out of text fields
    for event in input.process_events(&[key(Key::Z, Modifiers::COMMAND)]) {
        assert!(!route_event(&event, &mut ctx, FocusTarget::TextField));
    }
    assert_eq!(ctx.canvas().overlay(id).unwrap().position(), Pos2::new(150.0, 80.0));

    for event in input.process_events(&[key(Key::Z, Modifiers::COMMAND)]) {
        route_event(&event, &mut ctx, FocusTarget::Canvas);
    }
    assert_eq!(ctx.canvas().overlay(id).unwrap().position(), Pos2::new(100.0, 50.0));

    for event in input.process_events(&[key(Key::Delete, Modifiers::NONE)]) {
        assert!(route_event(&event, &mut ctx, FocusTarget::Canvas));
    }
    assert!(!ctx.canvas().contains(id));
}

#[test]
fn test_focus_loss_cancels_drag() {
    let mut ctx = context();
    let id = ctx.place_catalog_item(&item("torch", 150.0, 150.0), Placement::At(Pos2::new(100.0, 50.0)));
    let mut input = InputHandler::new();

    let frame = [
        button(Pos2::new(150.0, 100.0), true, Modifiers::NONE),
        egui::Event::PointerMoved(Pos2::new(250.0, 200.0)),
        egui::Event::WindowFocused(false),
    ];
    for event in input.process_events(&frame) {
        route_event(&event, &mut ctx, FocusTarget::Canvas);
    }
    assert!(ctx.state().is_idle());
    assert_eq!(ctx.canvas().overlay(id).unwrap().position(), Pos2::new(100.0, 50.0));
    assert_eq!(ctx.history().len(), 1);
}
