//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use qrtint::palette::ExtractorKind;
use qrtint::{QrCodeEcc, StyleSpec};

#[derive(Parser)]
#[command(name = "qrtint", version, about = "Styled QR code generator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More output (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Errors only.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[arg(long, value_enum, default_value_t = LogFormatArg::Pretty, global = true)]
    pub log_format: LogFormatArg,
}

#[derive(Subcommand)]
pub enum Command {
    /// Encode a URL and write one image per style.
    Generate(GenerateArgs),
    /// Print the palette extracted from an image.
    Palette(PaletteArgs),
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Logo image (PNG, JPEG, ...).
    #[arg(long)]
    pub logo: PathBuf,

    /// Exact data to encode.
    #[arg(long, conflicts_with_all = ["host", "id"], required_unless_present = "host")]
    pub data: Option<String>,

    /// Public host; the code then encodes `{host}/qr/{id}`.
    #[arg(long)]
    pub host: Option<String>,

    /// Landing page identifier. A random UUID when omitted.
    #[arg(long, requires = "host")]
    pub id: Option<String>,

    /// Styles to render; may be repeated.
    #[arg(long = "style", value_enum, default_values_t = [StyleArg::Classic, StyleArg::Gradient, StyleArg::Logo])]
    pub styles: Vec<StyleArg>,

    /// Output root directory.
    #[arg(long, default_value = qrtint::writer::DEFAULT_OUTPUT_ROOT)]
    pub out: PathBuf,

    /// Subdirectory under the root; returned paths are relative to the root.
    #[arg(long, default_value = qrtint::writer::DEFAULT_QR_SUBDIR)]
    pub subdir: String,

    /// Minimum QR version; raised automatically when the data needs it.
    #[arg(long = "qr-version", default_value_t = 6, value_parser = clap::value_parser!(u8).range(1..=40))]
    pub qr_version: u8,

    #[arg(long, value_enum, default_value_t = EclArg::H)]
    pub ecl: EclArg,

    /// Quiet zone, in modules.
    #[arg(long, default_value_t = 4)]
    pub border: u32,

    /// Pixels per module.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub module_size: u32,

    /// Logo width as a fraction of the canvas.
    #[arg(long, default_value_t = 0.25)]
    pub logo_factor: f32,

    /// Colours to extract from the logo.
    #[arg(short = 'k', long, default_value_t = 3)]
    pub colors: usize,

    /// Fill colour override (#rrggbb).
    #[arg(long)]
    pub fill: Option<String>,

    /// Background colour override (#rrggbb).
    #[arg(long)]
    pub back: Option<String>,

    /// Skip quantization and use the black/white palette.
    #[arg(long)]
    pub no_quantize: bool,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct PaletteArgs {
    pub image: PathBuf,

    #[arg(short = 'k', long, default_value_t = 3)]
    pub colors: usize,

    #[arg(long)]
    pub no_quantize: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StyleArg {
    Classic,
    Gradient,
    Logo,
}

impl From<StyleArg> for StyleSpec {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Classic => StyleSpec::Classic,
            StyleArg::Gradient => StyleSpec::Gradient,
            StyleArg::Logo => StyleSpec::Logo,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EclArg {
    L,
    M,
    Q,
    H,
}

impl From<EclArg> for QrCodeEcc {
    fn from(arg: EclArg) -> Self {
        match arg {
            EclArg::L => QrCodeEcc::Low,
            EclArg::M => QrCodeEcc::Medium,
            EclArg::Q => QrCodeEcc::Quartile,
            EclArg::H => QrCodeEcc::High,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

/// Extractor selected by the `--no-quantize` flag.
pub fn extractor_kind(no_quantize: bool) -> ExtractorKind {
    if no_quantize {
        ExtractorKind::Fallback
    } else {
        ExtractorKind::MedianCut
    }
}
