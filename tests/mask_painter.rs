// Freehand mask painter behaviour against real encoded source images
use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use img_master::canvas::{ClientPoint, DisplayBox, MaskBuffer, MaskPainter, PainterState, PointerInput};
use img_master::image_handler::{ImageConfig, SourceImage};
use proptest::prelude::*;

fn png_source(width: u32, height: u32) -> SourceImage {
    let img = RgbaImage::from_pixel(width, height, Rgba([120, 80, 40, 255]));
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, ImageFormat::Png)
        .expect("failed to encode test image");
    SourceImage::from_upload(cursor.into_inner(), Some("image/png"), &ImageConfig::default())
        .expect("upload rejected")
}

fn mouse(x: f64, y: f64) -> PointerInput {
    PointerInput::Mouse(ClientPoint::new(x, y))
}

fn decode_mask(bytes: &[u8]) -> image::GrayImage {
    image::load_from_memory(bytes)
        .expect("mask should decode")
        .to_luma8()
}

proptest! {
    #[test]
    fn fresh_buffer_is_black_at_native_resolution(width in 1u32..256, height in 1u32..256) {
        let buffer = MaskBuffer::new(width, height);

        prop_assert_eq!(buffer.dimensions(), (width, height));
        prop_assert!(buffer.pixels().pixels().all(|p| p.0[0] == 0));
        prop_assert!(buffer.brush_width() >= 20.0);
    }
}

#[test]
fn release_without_movement_exports_black_mask() {
    let source = png_source(1000, 500);
    let display = DisplayBox::new(0.0, 0.0, 500.0, 250.0);

    let mut painter = MaskPainter::new();
    painter.attach(&source);
    painter.press(Some(&display), &mouse(250.0, 125.0));
    let mask = painter
        .release()
        .expect("export failed")
        .expect("a mask should be exported");

    assert_eq!(mask.dimensions(), (1000, 500));
    let pixels = decode_mask(mask.payload().bytes());
    assert_eq!(pixels.dimensions(), (1000, 500));
    assert!(pixels.pixels().all(|p| p.0[0] == 0));
}

#[test]
fn scaled_display_stroke_lands_in_backing_pixels() {
    let source = png_source(400, 200);
    // 画板缩小一半显示，页面偏移 (10, 20)
    let display = DisplayBox::new(10.0, 20.0, 200.0, 100.0);

    let mut painter = MaskPainter::new();
    painter.attach(&source);
    painter.press(Some(&display), &mouse(10.0, 70.0));
    painter.move_to(Some(&display), &mouse(210.0, 70.0));
    let mask = painter
        .release()
        .expect("export failed")
        .expect("a mask should be exported");

    let pixels = decode_mask(mask.payload().bytes());
    // 笔画沿 y = 100 横穿整幅图
    assert_eq!(pixels.get_pixel(200, 100).0[0], 255);
    assert_eq!(pixels.get_pixel(0, 100).0[0], 255);
    assert_eq!(pixels.get_pixel(200, 0).0[0], 0);
    assert_eq!(pixels.get_pixel(200, 199).0[0], 0);
    assert!(pixels.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
}

#[test]
fn duplicate_release_is_ignored() {
    let source = png_source(64, 64);
    let display = DisplayBox::new(0.0, 0.0, 64.0, 64.0);

    let mut painter = MaskPainter::new();
    painter.attach(&source);
    painter.press(Some(&display), &touch(&[(5.0, 5.0), (60.0, 60.0)]));
    assert!(matches!(painter.state(), PainterState::Drawing { .. }));

    assert!(painter.release().expect("export failed").is_some());
    assert!(painter.release().expect("second release failed").is_none());
    assert_eq!(painter.state(), PainterState::Idle);
}

#[test]
fn events_without_mounted_surface_are_no_ops() {
    let source = png_source(32, 32);
    let mut painter = MaskPainter::new();

    // 未绑定原图
    painter.press(Some(&DisplayBox::new(0.0, 0.0, 32.0, 32.0)), &mouse(1.0, 1.0));
    assert_eq!(painter.state(), PainterState::Idle);

    // 已绑定但画板未挂载
    painter.attach(&source);
    painter.press(None, &mouse(1.0, 1.0));
    assert_eq!(painter.state(), PainterState::Idle);
    assert!(painter.release().expect("release failed").is_none());
}

fn touch(points: &[(f64, f64)]) -> PointerInput {
    PointerInput::Touch(points.iter().map(|&(x, y)| ClientPoint::new(x, y)).collect())
}
