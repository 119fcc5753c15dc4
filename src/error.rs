//! Error types for the styled QR engine.
//!
//! Failures are split by where they happen. Encoding failures abort a whole
//! request, while composition and output failures only knock out the style
//! that produced them.

use std::path::PathBuf;

use thiserror::Error;

use crate::qrcode::QrCodeEcc;

/// The data could not be turned into a QR symbol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// No version between the preferred one and the maximum holds the data.
    ///
    /// Ways to handle this:
    ///
    /// - Lower the error correction level if it was above `Low`.
    /// - Shorten the data, or keep it inside a denser character set
    ///   (digits only, or the uppercase alphanumeric set).
    #[error(
        "data too long: needs {required_bits} bits, version {max_version} at level {ecl:?} holds {capacity_bits}"
    )]
    DataTooLong {
        required_bits: usize,
        capacity_bits: usize,
        max_version: u8,
        ecl: QrCodeEcc,
    },

    /// The requested version lies outside 1..=40.
    #[error("QR version {0} is out of range (expected 1..=40)")]
    InvalidVersion(u8),
}

/// A single style could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    /// The logo style was requested without a decodable logo.
    #[error("logo style requires a decodable logo image")]
    MissingLogo,

    /// A colour string was not `#rgb` or `#rrggbb`.
    #[error("invalid colour string: {0:?}")]
    InvalidColor(String),

    #[error("module size must be at least 1 pixel")]
    InvalidModuleSize,

    /// Border and module size ask for a canvas larger than `max` pixels.
    #[error("canvas would exceed {max}px per side")]
    CanvasTooLarge { max: u32 },

    /// The logo side truncated to zero pixels for this canvas.
    #[error("logo area is empty on a {canvas}px canvas")]
    LogoTooSmall { canvas: u32 },
}

/// A rendered image could not be persisted.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create output directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Why one requested style produced no file.
#[derive(Debug, Error)]
pub enum StyleError {
    #[error(transparent)]
    Composition(#[from] CompositionError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// A style name outside `classic`, `gradient`, `logo`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown style {0:?} (expected classic, gradient or logo)")]
pub struct UnknownStyle(pub String);

/// Generator settings that can never produce an image.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Version(#[from] EncodingError),

    #[error("module size must be at least 1 pixel")]
    ModuleSize,

    /// Even a version 40 symbol must fit the largest canvas.
    #[error(transparent)]
    Canvas(#[from] CompositionError),

    #[error("logo size factor must be in (0, 1], got {0}")]
    LogoFactor(f32),

    #[error("palette size must be at least 1")]
    PaletteSize,
}
