//! Dominant colour extraction from a reference image.
//!
//! Extraction never fails. When an image is unreadable, empty, or has no
//! usable pixels, callers get the two-entry fallback palette (black, white).

use std::collections::HashSet;

use image::{Rgb, Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::error::CompositionError;

pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Ordered colours, most dominant first. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorPalette(Vec<Rgb<u8>>);

impl ColorPalette {
    /// Returns `None` for an empty list.
    pub fn new(colors: Vec<Rgb<u8>>) -> Option<Self> {
        if colors.is_empty() {
            None
        } else {
            Some(Self(colors))
        }
    }

    /// `{#000000, #FFFFFF}`.
    pub fn fallback() -> Self {
        Self(vec![BLACK, WHITE])
    }

    pub fn colors(&self) -> &[Rgb<u8>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Colour of dark modules: the most dominant entry.
    pub fn fill(&self) -> Rgb<u8> {
        self.0[0]
    }

    /// Colour of light modules and the quiet zone: the second entry, or white
    /// for a single-colour palette.
    pub fn back(&self) -> Rgb<u8> {
        self.0.get(1).copied().unwrap_or(WHITE)
    }

    /// Replaces the fill and/or back entry. Overriding the back colour of a
    /// single-entry palette appends it.
    #[must_use]
    pub fn with_overrides(mut self, fill: Option<Rgb<u8>>, back: Option<Rgb<u8>>) -> Self {
        if let Some(fill) = fill {
            self.0[0] = fill;
        }
        if let Some(back) = back {
            if self.0.len() > 1 {
                self.0[1] = back;
            } else {
                self.0.push(back);
            }
        }
        self
    }

    /// `#rrggbb` strings in palette order.
    pub fn to_hex(&self) -> Vec<String> {
        self.0.iter().copied().map(to_hex).collect()
    }
}

/// Formats a colour as lowercase `#rrggbb`.
pub fn to_hex(color: Rgb<u8>) -> String {
    let Rgb([r, g, b]) = color;
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Parses `#rrggbb` or `#rgb`; the `#` is optional.
pub fn parse_hex_color(s: &str) -> Result<Rgb<u8>, CompositionError> {
    let invalid = || CompositionError::InvalidColor(s.to_string());
    let hex = s.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
    match hex.len() {
        6 => Ok(Rgb([channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?])),
        3 => {
            let mut out = [0u8; 3];
            for (slot, i) in out.iter_mut().zip(0..3) {
                *slot = channel(&hex[i..=i])? * 0x11;
            }
            Ok(Rgb(out))
        }
        _ => Err(invalid()),
    }
}

/// Resolves an optional colour string, falling back to `default` when it
/// does not parse.
pub fn resolve_color(spec: Option<&str>, default: Rgb<u8>) -> Option<Rgb<u8>> {
    let spec = spec?;
    match parse_hex_color(spec) {
        Ok(color) => Some(color),
        Err(error) => {
            warn!(%error, fallback = %to_hex(default), "using fallback colour");
            Some(default)
        }
    }
}

/// Capability for turning an image into a palette of at most `k` colours.
pub trait PaletteExtractor {
    fn extract(&self, image: &RgbaImage, k: usize) -> ColorPalette;
}

/// Always returns [`ColorPalette::fallback`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Fallback;

impl PaletteExtractor for Fallback {
    fn extract(&self, _image: &RgbaImage, _k: usize) -> ColorPalette {
        ColorPalette::fallback()
    }
}

/// Modified median-cut quantizer (MMCQ) from `color_thief`, ranked by how
/// many sampled pixels each colour stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MedianCut {
    /// Sample every `quality`-th pixel, 1 to 10. 1 is exact, higher is faster.
    pub quality: u8,
}

impl Default for MedianCut {
    fn default() -> Self {
        Self { quality: 10 }
    }
}

const ALPHA_THRESHOLD: u8 = 125;
const WHITE_THRESHOLD: u8 = 250;

/// Opaque, not near-white: the pixels the quantizer itself keeps.
fn is_usable(&Rgba([r, g, b, a]): &Rgba<u8>) -> bool {
    a >= ALPHA_THRESHOLD && !(r > WHITE_THRESHOLD && g > WHITE_THRESHOLD && b > WHITE_THRESHOLD)
}

fn mean(samples: &[[u8; 3]]) -> Rgb<u8> {
    let count = samples.len().max(1) as u64;
    let mut out = [0u8; 3];
    for (c, slot) in out.iter_mut().enumerate() {
        let sum: u64 = samples.iter().map(|sample| u64::from(sample[c])).sum();
        *slot = ((sum + count / 2) / count) as u8;
    }
    Rgb(out)
}

fn distance(a: [u8; 3], b: Rgb<u8>) -> u32 {
    a.iter()
        .zip(b.0.iter())
        .map(|(&x, &y)| u32::from(x.abs_diff(y)).pow(2))
        .sum()
}

impl MedianCut {
    fn step(&self) -> usize {
        usize::from(self.quality.clamp(1, 10))
    }

    /// Sampled pixels the quantizer would look at.
    fn samples(&self, image: &RgbaImage) -> Vec<[u8; 3]> {
        image
            .pixels()
            .step_by(self.step())
            .filter(|pixel| is_usable(pixel))
            .map(|&Rgba([r, g, b, _])| [r, g, b])
            .collect()
    }

    /// Orders `candidates` by the number of samples nearest to each, most
    /// first, and drops colours no sample maps to.
    fn rank(samples: &[[u8; 3]], candidates: Vec<Rgb<u8>>) -> Vec<Rgb<u8>> {
        let mut counts = vec![0usize; candidates.len()];
        for &sample in samples {
            let nearest = candidates
                .iter()
                .enumerate()
                .min_by_key(|&(_, color)| distance(sample, *color))
                .map(|(i, _)| i);
            if let Some(i) = nearest {
                counts[i] += 1;
            }
        }
        let mut ranked: Vec<(usize, Rgb<u8>)> = counts
            .into_iter()
            .zip(candidates)
            .filter(|&(count, _)| count > 0)
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));
        ranked.into_iter().map(|(_, color)| color).collect()
    }
}

impl PaletteExtractor for MedianCut {
    fn extract(&self, image: &RgbaImage, k: usize) -> ColorPalette {
        let samples = self.samples(image);
        if samples.is_empty() {
            debug!(
                width = image.width(),
                height = image.height(),
                "no usable pixels, using fallback palette"
            );
            return ColorPalette::fallback();
        }

        let bins: HashSet<[u8; 3]> = samples
            .iter()
            .map(|&[r, g, b]| [r >> 3, g >> 3, b >> 3])
            .collect();
        // A single bin leaves nothing to split: the image is one colour.
        if bins.len() == 1 {
            return ColorPalette(vec![mean(&samples)]);
        }
        let max_colors = u8::try_from(k.min(bins.len()).clamp(2, 255)).unwrap_or(u8::MAX);
        let quantized = match color_thief::get_palette(
            image.as_raw(),
            color_thief::ColorFormat::Rgba,
            self.quality.clamp(1, 10),
            max_colors,
        ) {
            Ok(colors) => colors,
            Err(error) => {
                warn!(error = ?error, "quantization failed, using fallback palette");
                return ColorPalette::fallback();
            }
        };

        let candidates: Vec<Rgb<u8>> = quantized.iter().map(|c| Rgb([c.r, c.g, c.b])).collect();
        let mut colors = Self::rank(&samples, candidates);
        colors.truncate(k.max(1));
        ColorPalette::new(colors).unwrap_or_else(ColorPalette::fallback)
    }
}

/// Which extractor a generator uses, chosen at configuration time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtractorKind {
    #[default]
    MedianCut,
    Fallback,
}

impl ExtractorKind {
    pub fn build(self) -> Box<dyn PaletteExtractor + Send + Sync> {
        match self {
            ExtractorKind::MedianCut => Box::new(MedianCut::default()),
            ExtractorKind::Fallback => Box::new(Fallback),
        }
    }
}

/// Decodes `bytes` and extracts a palette, falling back on any decode error.
pub fn extract_from_bytes(extractor: &dyn PaletteExtractor, bytes: &[u8], k: usize) -> ColorPalette {
    if bytes.is_empty() {
        warn!("empty image data, using fallback palette");
        return ColorPalette::fallback();
    }
    match image::load_from_memory(bytes) {
        Ok(decoded) => extractor.extract(&decoded.to_rgba8(), k),
        Err(error) => {
            warn!(%error, "could not decode image, using fallback palette");
            ColorPalette::fallback()
        }
    }
}
