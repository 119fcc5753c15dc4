//! # qrtint
//!
//! Styled QR code synthesis. Given the URL a code should point at, a
//! reference logo and a list of styles, `qrtint` encodes the URL into a QR
//! symbol, derives a colour palette from the logo and writes one PNG per
//! style.
//!
//! ## Features
//!
//! - QR Code Model 2 encoder: versions 1 to 40, levels L/M/Q/H, numeric,
//!   alphanumeric and byte segments, automatic mask selection.
//! - Dominant colour extraction by median cut, with a black/white fallback
//!   whenever the logo is unusable.
//! - Three styles: `classic`, `gradient` (translucent tint from the fill
//!   colour to white) and `logo` (logo pasted in a centred disk).
//! - Per-style failure isolation: one broken style never blocks the others.
//!
//! ## Example
//!
//! Render a classic code in memory:
//!
//! ```rust
//! use qrtint::compositor::{render, RenderOptions, StyleSpec};
//! use qrtint::palette::ColorPalette;
//! use qrtint::qrcode::{encode, QrCodeEcc};
//!
//! let qr = encode("http://host/qr/abc123", 6, QrCodeEcc::High).unwrap();
//! let img = render(
//!     &qr,
//!     &ColorPalette::fallback(),
//!     &RenderOptions::default(),
//!     StyleSpec::Classic,
//!     None,
//! )
//! .unwrap();
//! assert_eq!(img.dimensions(), (490, 490));
//! ```
//!
//! Generate every style to disk:
//!
//! ```rust,no_run
//! use qrtint::{Generator, GeneratorConfig, StyleSpec};
//!
//! let logo = std::fs::read("logo.png").unwrap();
//! let generator = Generator::new(GeneratorConfig::default()).unwrap();
//! let report = generator
//!     .generate("http://host/qr/abc123", Some(&logo), &StyleSpec::ALL)
//!     .unwrap();
//! for file in &report.files {
//!     println!("{}: {}", file.style, file.path);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`qrcode`]: QR symbol encoding.
//! - [`palette`]: dominant colour extraction.
//! - [`compositor`]: style rendering.
//! - [`writer`]: PNG output with unique names.
//! - [`generator`]: the per-request pipeline tying them together.

pub mod compositor;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod palette;
pub mod qrcode;
pub mod writer;

pub use compositor::{LogoAsset, RasterImage, RenderOptions, StyleSpec};
pub use config::GeneratorConfig;
pub use error::{CompositionError, ConfigError, EncodingError, OutputError, StyleError};
pub use generator::{landing_page_url, GeneratedFile, GenerationReport, Generator};
pub use palette::{ColorPalette, PaletteExtractor};
pub use qrcode::{encode, QrCodeEcc, QrMatrix};
