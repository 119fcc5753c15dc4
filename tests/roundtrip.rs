use image::imageops;
use image::{Rgb, RgbaImage};
use proptest::prelude::*;
use qrtint::compositor::{render, RenderOptions, StyleSpec};
use qrtint::palette::ColorPalette;
use qrtint::qrcode::{encode, QrCodeEcc};

const URL: &str = "http://qr.example.com/qr/3f2b9c4e-8a71-4d2e-b5a0-1c9e7f6d2a10";

/// Reads the single QR code in `image` with an independent decoder.
fn decode(image: &RgbaImage) -> Result<String, String> {
    let luma = imageops::grayscale(image);
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        luma.width() as usize,
        luma.height() as usize,
        |x, y| luma.get_pixel(x as u32, y as u32)[0],
    );
    let grids = prepared.detect_grids();
    let grid = grids.first().ok_or("no QR code found")?;
    let (_, content) = grid.decode().map_err(|e| format!("{e:?}"))?;
    Ok(content)
}

fn render_style(data: &str, version: u8, ecl: QrCodeEcc, palette: &ColorPalette, style: StyleSpec) -> RgbaImage {
    let qr = encode(data, version, ecl).unwrap();
    render(&qr, palette, &RenderOptions::default(), style, None).unwrap()
}

#[test]
fn classic_render_decodes_to_input() {
    let img = render_style(URL, 6, QrCodeEcc::High, &ColorPalette::fallback(), StyleSpec::Classic);
    assert_eq!(decode(&img).as_deref(), Ok(URL));
}

#[test]
fn gradient_render_decodes_to_input() {
    let palette = ColorPalette::new(vec![Rgb([200, 30, 30]), Rgb([255, 255, 255])]).unwrap();
    let img = render_style(URL, 6, QrCodeEcc::High, &palette, StyleSpec::Gradient);
    assert_eq!(decode(&img).as_deref(), Ok(URL));
}

#[test]
fn every_level_decodes() {
    for ecl in [QrCodeEcc::Low, QrCodeEcc::Medium, QrCodeEcc::Quartile, QrCodeEcc::High] {
        let img = render_style("http://host/qr/levels", 3, ecl, &ColorPalette::fallback(), StyleSpec::Classic);
        assert_eq!(decode(&img).as_deref(), Ok("http://host/qr/levels"), "{ecl:?}");
    }
}

#[test]
fn default_canvas_is_490_pixels() {
    let img = render_style("http://host/qr/abc123", 6, QrCodeEcc::High, &ColorPalette::fallback(), StyleSpec::Classic);
    assert_eq!(img.dimensions(), (490, 490));
}

#[test]
fn long_data_grows_the_version() {
    let data = "a".repeat(110);
    let qr = encode(&data, 6, QrCodeEcc::High).unwrap();
    assert_eq!(qr.version().value(), 10);
    assert_eq!(qr.error_correction_level(), QrCodeEcc::High);
    let img = render(&qr, &ColorPalette::fallback(), &RenderOptions::default(), StyleSpec::Classic, None).unwrap();
    assert_eq!(decode(&img), Ok(data));
}

#[test]
fn numeric_and_alphanumeric_payloads_decode() {
    for data in ["0123456789012", "HTTP://HOST/QR/ABC-123"] {
        let img = render_style(data, 1, QrCodeEcc::Medium, &ColorPalette::fallback(), StyleSpec::Classic);
        assert_eq!(decode(&img).as_deref(), Ok(data));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn encoding_is_deterministic(data in "[ -~]{0,58}") {
        let a = encode(&data, 6, QrCodeEcc::High).unwrap();
        let b = encode(&data, 6, QrCodeEcc::High).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn classic_render_round_trips(data in "[ -~]{1,58}") {
        let qr = encode(&data, 6, QrCodeEcc::High).unwrap();
        prop_assert_eq!(qr.version().value(), 6);
        let img = render(&qr, &ColorPalette::fallback(), &RenderOptions::default(), StyleSpec::Classic, None).unwrap();
        prop_assert_eq!(decode(&img), Ok(data));
    }
}
