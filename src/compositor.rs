//! Raster composition of a QR matrix in one of the supported styles.
//!
//! Every function here takes its inputs by reference and returns a fresh
//! image buffer; nothing is modified in place.

use std::fmt;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgb, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{CompositionError, UnknownStyle};
use crate::palette::ColorPalette;
use crate::qrcode::QrMatrix;

/// Output unit of the compositor: an RGBA raster.
pub type RasterImage = RgbaImage;

/// Largest canvas side, in pixels, the compositor will allocate.
pub const MAX_CANVAS_SIDE: u32 = 16_384;

/// Opacity of the gradient layer, out of 255.
pub const GRADIENT_ALPHA: u8 = 50;

/// The closed set of renderable styles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleSpec {
    /// Palette-coloured modules, nothing else.
    Classic,
    /// Classic plus a translucent top-to-bottom tint from the fill colour to white.
    Gradient,
    /// Classic with the logo pasted in a centred disk.
    Logo,
}

impl StyleSpec {
    pub const ALL: [StyleSpec; 3] = [StyleSpec::Classic, StyleSpec::Gradient, StyleSpec::Logo];

    pub fn as_str(self) -> &'static str {
        match self {
            StyleSpec::Classic => "classic",
            StyleSpec::Gradient => "gradient",
            StyleSpec::Logo => "logo",
        }
    }
}

impl fmt::Display for StyleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StyleSpec {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StyleSpec::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStyle(s.to_string()))
    }
}

/// A decoded logo image.
#[derive(Clone, Debug)]
pub struct LogoAsset {
    image: RgbaImage,
}

impl LogoAsset {
    /// Decodes PNG, JPEG or any other format the `image` crate knows.
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        Ok(Self {
            image: image::load_from_memory(bytes)?.to_rgba8(),
        })
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Geometry shared by all styles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    /// Quiet zone width, in modules.
    pub border: u32,
    /// Side of one module, in pixels.
    pub module_size: u32,
    /// Logo side as a fraction of the canvas width.
    pub logo_size_factor: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            border: 4,
            module_size: 10,
            logo_size_factor: 0.25,
        }
    }
}

impl RenderOptions {
    /// Canvas side in pixels for a symbol of `size` modules.
    ///
    /// Fails with [`CompositionError::CanvasTooLarge`] when the side would
    /// exceed [`MAX_CANVAS_SIDE`] or overflow.
    pub fn canvas_size(&self, size: i32) -> Result<u32, CompositionError> {
        u32::try_from(size)
            .ok()
            .and_then(|size| self.border.checked_mul(2)?.checked_add(size))
            .and_then(|modules| modules.checked_mul(self.module_size))
            .filter(|&side| side <= MAX_CANVAS_SIDE)
            .ok_or(CompositionError::CanvasTooLarge { max: MAX_CANVAS_SIDE })
    }
}

/// Renders `matrix` in `style`.
///
/// The logo is only read by [`StyleSpec::Logo`], which fails with
/// [`CompositionError::MissingLogo`] when none is given. The overlay is not
/// checked for scannability; a large logo or a low-contrast palette can
/// produce a code that readers reject.
pub fn render(
    matrix: &QrMatrix,
    palette: &ColorPalette,
    options: &RenderOptions,
    style: StyleSpec,
    logo: Option<&LogoAsset>,
) -> Result<RasterImage, CompositionError> {
    match style {
        StyleSpec::Classic => render_classic(matrix, palette, options),
        StyleSpec::Gradient => {
            let base = render_classic(matrix, palette, options)?;
            Ok(apply_gradient(&base, palette.fill()))
        }
        StyleSpec::Logo => {
            let logo = logo.ok_or(CompositionError::MissingLogo)?;
            let base = render_classic(matrix, palette, options)?;
            overlay_logo(&base, logo, options.logo_size_factor)
        }
    }
}

/// Draws each module as a `module_size` square of the fill (dark) or back
/// (light) colour, inside a `border`-module quiet zone of the back colour.
pub fn render_classic(
    matrix: &QrMatrix,
    palette: &ColorPalette,
    options: &RenderOptions,
) -> Result<RasterImage, CompositionError> {
    if options.module_size == 0 {
        return Err(CompositionError::InvalidModuleSize);
    }
    let fill = opaque(palette.fill());
    let back = opaque(palette.back());
    let border = options.border as i32;
    let side = options.canvas_size(matrix.size())?;

    let mut img = RgbaImage::new(side, side);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let qr_x = (x / options.module_size) as i32 - border;
        let qr_y = (y / options.module_size) as i32 - border;
        *pixel = if matrix.get_module(qr_x, qr_y) { fill } else { back };
    }
    Ok(img)
}

/// Tint colour of row `y`: `start` interpolated towards white, truncated.
pub fn gradient_row_color(start: Rgb<u8>, y: u32, height: u32) -> Rgb<u8> {
    let height = u64::from(height.max(1));
    let lerp = |c: u8| {
        let c = u64::from(c);
        (c + (255 - c) * u64::from(y) / height) as u8
    };
    let Rgb([r, g, b]) = start;
    Rgb([lerp(r), lerp(g), lerp(b)])
}

/// Source-over blend of `overlay` at `alpha` onto an opaque `base` channel.
pub fn blend_channel(base: u8, overlay: u8, alpha: u8) -> u8 {
    let a = u32::from(alpha);
    ((u32::from(base) * (255 - a) + u32::from(overlay) * a + 127) / 255) as u8
}

/// Composites a top-to-bottom gradient from `start` to white at
/// [`GRADIENT_ALPHA`] over `base`. The result stays fully opaque.
pub fn apply_gradient(base: &RasterImage, start: Rgb<u8>) -> RasterImage {
    let height = base.height();
    let rows: Vec<Rgb<u8>> = (0..height).map(|y| gradient_row_color(start, y, height)).collect();

    let mut out = base.clone();
    for (_, y, pixel) in out.enumerate_pixels_mut() {
        let Rgb(tint) = rows[y as usize];
        let Rgba([r, g, b, _]) = *pixel;
        *pixel = Rgba([
            blend_channel(r, tint[0], GRADIENT_ALPHA),
            blend_channel(g, tint[1], GRADIENT_ALPHA),
            blend_channel(b, tint[2], GRADIENT_ALPHA),
            255,
        ]);
    }
    out
}

/// Opaque disk inscribed in a `side` square: 255 where a pixel centre lies
/// in the disk, 0 elsewhere.
pub fn circular_mask(side: u32) -> GrayImage {
    let radius = f64::from(side) / 2.0;
    GrayImage::from_fn(side, side, |x, y| {
        let dx = f64::from(x) + 0.5 - radius;
        let dy = f64::from(y) + 0.5 - radius;
        if dx * dx + dy * dy <= radius * radius {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Side of the logo square on a canvas `canvas_width` pixels wide.
pub fn logo_side(canvas_width: u32, factor: f32) -> u32 {
    ((canvas_width as f32 * factor) as u32).min(canvas_width)
}

/// Resizes the logo to `factor` of the canvas width with Lanczos resampling
/// and pastes it at the centre through a circular mask. Pixels outside the
/// disk keep the base image; pixels inside take the logo's RGBA as is.
pub fn overlay_logo(
    base: &RasterImage,
    logo: &LogoAsset,
    factor: f32,
) -> Result<RasterImage, CompositionError> {
    let (width, height) = base.dimensions();
    let side = logo_side(width, factor).min(height);
    if side == 0 {
        return Err(CompositionError::LogoTooSmall { canvas: width });
    }
    let resized = imageops::resize(logo.image(), side, side, FilterType::Lanczos3);
    let mask = circular_mask(side);
    let (ox, oy) = ((width - side) / 2, (height - side) / 2);

    let mut out = base.clone();
    for (x, y, &Luma([m])) in mask.enumerate_pixels() {
        if m == 255 {
            out.put_pixel(ox + x, oy + y, *resized.get_pixel(x, y));
        }
    }
    Ok(out)
}

fn opaque(color: Rgb<u8>) -> Rgba<u8> {
    let Rgb([r, g, b]) = color;
    Rgba([r, g, b, 255])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qrcode::{encode, QrCodeEcc};

    fn red_white() -> ColorPalette {
        ColorPalette::new(vec![Rgb([200, 0, 0]), Rgb([255, 255, 255])]).unwrap()
    }

    #[test]
    fn test_style_parse_and_display() {
        assert_eq!("classic".parse::<StyleSpec>(), Ok(StyleSpec::Classic));
        assert_eq!("Gradient".parse::<StyleSpec>(), Ok(StyleSpec::Gradient));
        assert_eq!(" logo ".parse::<StyleSpec>(), Ok(StyleSpec::Logo));
        assert_eq!("neon".parse::<StyleSpec>(), Err(UnknownStyle("neon".to_string())));
        assert_eq!(StyleSpec::Gradient.to_string(), "gradient");
    }

    #[test]
    fn test_canvas_size_version_6() {
        let qr = encode("http://host/qr/abc123", 6, QrCodeEcc::High).unwrap();
        let img = render(&qr, &red_white(), &RenderOptions::default(), StyleSpec::Classic, None).unwrap();
        assert_eq!(img.dimensions(), (490, 490));
    }

    #[test]
    fn test_classic_colours_and_quiet_zone() {
        let qr = encode("quiet", 1, QrCodeEcc::Low).unwrap();
        let options = RenderOptions {
            border: 2,
            module_size: 3,
            ..RenderOptions::default()
        };
        let img = render_classic(&qr, &red_white(), &options).unwrap();
        assert_eq!(img.width(), (21 + 4) * 3);
        // Quiet zone
        assert_eq!(*img.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*img.get_pixel(5, 70), Rgba([255, 255, 255, 255]));
        // Top-left finder corner is dark and starts after the border
        assert_eq!(*img.get_pixel(6, 6), Rgba([200, 0, 0, 255]));
        assert_eq!(*img.get_pixel(8, 8), Rgba([200, 0, 0, 255]));
    }

    #[test]
    fn test_zero_module_size_rejected() {
        let qr = encode("x", 1, QrCodeEcc::Low).unwrap();
        let options = RenderOptions {
            module_size: 0,
            ..RenderOptions::default()
        };
        assert_eq!(
            render(&qr, &red_white(), &options, StyleSpec::Classic, None),
            Err(CompositionError::InvalidModuleSize)
        );
    }

    #[test]
    fn test_oversized_canvas_rejected() {
        let qr = encode("x", 1, QrCodeEcc::Low).unwrap();
        let overflowing = RenderOptions {
            border: u32::MAX / 2 + 1,
            module_size: 1,
            ..RenderOptions::default()
        };
        assert_eq!(
            render(&qr, &red_white(), &overflowing, StyleSpec::Classic, None),
            Err(CompositionError::CanvasTooLarge { max: MAX_CANVAS_SIDE })
        );
        let huge = RenderOptions {
            module_size: 100_000,
            ..RenderOptions::default()
        };
        assert!(huge.canvas_size(21).is_err());
        assert!(RenderOptions { module_size: u32::MAX, ..huge }.canvas_size(21).is_err());
        assert_eq!(RenderOptions::default().canvas_size(41), Ok(490));
    }

    #[test]
    fn test_gradient_row_color() {
        let start = Rgb([200, 0, 0]);
        assert_eq!(gradient_row_color(start, 0, 490), start);
        // 200 + 55 * 245 / 490 = 227.5 -> 227; 0 + 255 * 245 / 490 = 127.5 -> 127
        assert_eq!(gradient_row_color(start, 245, 490), Rgb([227, 127, 127]));
        assert_eq!(gradient_row_color(start, 489, 490), Rgb([254, 254, 254]));
    }

    #[test]
    fn test_blend_channel() {
        assert_eq!(blend_channel(200, 200, GRADIENT_ALPHA), 200);
        // 200 * 205 + 255 * 50 = 53750 -> 210.8
        assert_eq!(blend_channel(200, 255, GRADIENT_ALPHA), 211);
        assert_eq!(blend_channel(0, 255, GRADIENT_ALPHA), 50);
        assert_eq!(blend_channel(255, 0, GRADIENT_ALPHA), 205);
        assert_eq!(blend_channel(17, 99, 0), 17);
        assert_eq!(blend_channel(17, 99, 255), 99);
    }

    #[test]
    fn test_gradient_endpoints() {
        let qr = encode("gradient", 2, QrCodeEcc::Medium).unwrap();
        let palette = red_white();
        let options = RenderOptions::default();
        let classic = render_classic(&qr, &palette, &options).unwrap();
        let img = render(&qr, &palette, &options, StyleSpec::Gradient, None).unwrap();
        let h = img.height();

        // Quiet zone pixel at the top: white under a (200, 0, 0) tint
        assert_eq!(*img.get_pixel(0, 0), Rgba([244, 205, 205, 255]));
        // And at the bottom: white under a (254, 254, 254) tint
        assert_eq!(*img.get_pixel(0, h - 1), Rgba([255, 255, 255, 255]));

        // Every pixel matches the per-row formula
        for (x, y, pixel) in img.enumerate_pixels() {
            let tint = gradient_row_color(palette.fill(), y, h);
            let base = classic.get_pixel(x, y);
            for c in 0..3 {
                assert_eq!(pixel[c], blend_channel(base[c], tint[c], GRADIENT_ALPHA));
            }
            assert_eq!(pixel[3], 255);
        }
    }

    #[test]
    fn test_logo_requires_asset() {
        let qr = encode("x", 1, QrCodeEcc::High).unwrap();
        let result = render(&qr, &red_white(), &RenderOptions::default(), StyleSpec::Logo, None);
        assert_eq!(result, Err(CompositionError::MissingLogo));
    }

    #[test]
    fn test_circular_mask_shape() {
        let mask = circular_mask(10);
        assert_eq!(mask.get_pixel(5, 5).0, [255]);
        assert_eq!(mask.get_pixel(0, 5).0, [255]);
        assert_eq!(mask.get_pixel(0, 0).0, [0]);
        assert_eq!(mask.get_pixel(9, 9).0, [0]);
    }

    #[test]
    fn test_logo_side() {
        assert_eq!(logo_side(490, 0.25), 122);
        assert_eq!(logo_side(3, 0.25), 0);
        assert_eq!(logo_side(100, 4.0), 100);
    }

    #[test]
    fn test_logo_too_small() {
        let base = RgbaImage::new(3, 3);
        let logo = LogoAsset::from_image(RgbaImage::new(5, 5));
        assert_eq!(
            overlay_logo(&base, &logo, 0.25),
            Err(CompositionError::LogoTooSmall { canvas: 3 })
        );
    }

    #[test]
    fn test_logo_decode_rejects_garbage() {
        assert!(LogoAsset::decode(b"nope").is_err());
    }
}
