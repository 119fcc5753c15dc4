use std::fs;
use std::io::Write;

use anyhow::{Context, Result};
use tracing::info;
use uuid::Uuid;

use qrtint::palette::{self, ColorPalette};
use qrtint::{landing_page_url, GenerationReport, Generator, GeneratorConfig, StyleSpec};

use crate::cli::{extractor_kind, GenerateArgs, PaletteArgs};

pub fn run_generate(args: &GenerateArgs) -> Result<GenerationReport> {
    let logo = fs::read(&args.logo)
        .with_context(|| format!("read logo {}", args.logo.display()))?;
    let data_url = data_url(args)?;
    let generator = Generator::new(config_from_args(args)).context("invalid generator settings")?;

    let styles: Vec<StyleSpec> = args.styles.iter().copied().map(StyleSpec::from).collect();
    info!(url = %data_url, "generating QR codes");
    let report = generator
        .generate(&data_url, Some(&logo), &styles)
        .with_context(|| format!("encode {data_url}"))?;
    Ok(report)
}

/// The URL to encode: `--data` verbatim, or the landing page under `--host`.
pub fn data_url(args: &GenerateArgs) -> Result<String> {
    match (&args.data, &args.host) {
        (Some(data), _) => Ok(data.clone()),
        (None, Some(host)) => {
            let id = args
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            Ok(landing_page_url(host, &id))
        }
        (None, None) => anyhow::bail!("either --data or --host is required"),
    }
}

pub fn config_from_args(args: &GenerateArgs) -> GeneratorConfig {
    GeneratorConfig::default()
        .with_version(args.qr_version)
        .with_ecl(args.ecl.into())
        .with_border(args.border)
        .with_module_size(args.module_size)
        .with_logo_size_factor(args.logo_factor)
        .with_palette_size(args.colors)
        .with_extractor(extractor_kind(args.no_quantize))
        .with_output(&args.out, args.subdir.as_str())
        .with_colors(args.fill.clone(), args.back.clone())
}

/// Exit status for a finished request: 1 when no style was written.
pub fn exit_code(report: &GenerationReport) -> i32 {
    if report.is_success() {
        0
    } else {
        1
    }
}

/// Writes the summary as JSON, or one `style<TAB>path` line per file.
pub fn write_report(out: &mut impl Write, report: &GenerationReport, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, &report.summary()).context("serialize summary")?;
        writeln!(out)?;
        return Ok(());
    }
    for file in &report.files {
        writeln!(out, "{}\t{}", file.style, file.path)?;
    }
    Ok(())
}

pub fn print_report(report: &GenerationReport, json: bool) -> Result<()> {
    write_report(&mut std::io::stdout().lock(), report, json)?;
    for failure in &report.failures {
        eprintln!("{}\tfailed: {}", failure.style, failure.error);
    }
    Ok(())
}

pub fn run_palette(args: &PaletteArgs) -> Result<ColorPalette> {
    let bytes = fs::read(&args.image)
        .with_context(|| format!("read image {}", args.image.display()))?;
    let extractor = extractor_kind(args.no_quantize).build();
    Ok(palette::extract_from_bytes(extractor.as_ref(), &bytes, args.colors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;
    use image::{ImageFormat, Rgba, RgbaImage};
    use qrtint::palette::ExtractorKind;
    use qrtint::QrCodeEcc;
    use std::path::Path;
    use tempfile::TempDir;

    fn generate_args(argv: &[&str]) -> GenerateArgs {
        let cli = Cli::try_parse_from(["qrtint", "generate"].into_iter().chain(argv.iter().copied())).unwrap();
        match cli.command {
            Command::Generate(args) => args,
            Command::Palette(_) => panic!("expected generate"),
        }
    }

    fn write_logo(dir: &Path, color: [u8; 4]) -> String {
        let path = dir.join("logo.png");
        RgbaImage::from_pixel(60, 60, Rgba(color))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_data_url_from_data_or_host() {
        let args = generate_args(&["--logo", "l.png", "--data", "http://x/y"]);
        assert_eq!(data_url(&args).unwrap(), "http://x/y");

        let args = generate_args(&["--logo", "l.png", "--host", "https://h.example/", "--id", "abc"]);
        assert_eq!(data_url(&args).unwrap(), "https://h.example/qr/abc");

        let args = generate_args(&["--logo", "l.png", "--host", "http://h"]);
        let url = data_url(&args).unwrap();
        let id = url.strip_prefix("http://h/qr/").unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn test_data_and_host_are_exclusive() {
        let parse = |argv: &[&str]| Cli::try_parse_from(["qrtint", "generate"].into_iter().chain(argv.iter().copied()));
        assert!(parse(&["--logo", "l.png", "--data", "a", "--host", "h"]).is_err());
        assert!(parse(&["--logo", "l.png"]).is_err());
        assert!(parse(&["--logo", "l.png", "--data", "a", "--id", "x"]).is_err());
        assert!(parse(&["--logo", "l.png", "--data", "a", "--qr-version", "41"]).is_err());
        assert!(parse(&["--logo", "l.png", "--data", "a", "--module-size", "0"]).is_err());
    }

    #[test]
    fn test_flags_map_onto_config() {
        let args = generate_args(&[
            "--logo", "l.png", "--data", "a", "--qr-version", "2", "--ecl", "q", "--border", "1",
            "--module-size", "3", "--logo-factor", "0.2", "-k", "5", "--no-quantize", "--out",
            "/tmp/codes", "--subdir", "png", "--fill", "#ff0000",
        ]);
        let config = config_from_args(&args);
        assert_eq!(config.preferred_version, 2);
        assert_eq!(config.ecl, QrCodeEcc::Quartile);
        assert_eq!(config.render.border, 1);
        assert_eq!(config.render.module_size, 3);
        assert_eq!(config.render.logo_size_factor, 0.2);
        assert_eq!(config.palette_size, 5);
        assert_eq!(config.extractor, ExtractorKind::Fallback);
        assert_eq!(config.output_root, Path::new("/tmp/codes"));
        assert_eq!(config.output_subdir, "png");
        assert_eq!(config.fill_color.as_deref(), Some("#ff0000"));
        assert_eq!(config.back_color, None);
    }

    #[test]
    fn test_defaults_match_library() {
        let args = generate_args(&["--logo", "l.png", "--data", "a"]);
        assert_eq!(config_from_args(&args), GeneratorConfig::default());
        assert_eq!(args.styles.len(), 3);
    }

    #[test]
    fn test_run_generate_writes_every_style() {
        let dir = TempDir::new().unwrap();
        let logo = write_logo(dir.path(), [0, 0, 200, 255]);
        let out = dir.path().to_string_lossy().into_owned();
        let args = generate_args(&["--logo", &logo, "--host", "http://h", "--id", "1", "--out", &out]);

        let report = run_generate(&args).unwrap();
        assert_eq!(report.files.len(), 3);
        assert_eq!(exit_code(&report), 0);
        for file in &report.files {
            assert!(dir.path().join(&file.path).is_file());
        }

        let mut text = Vec::new();
        write_report(&mut text, &report, false).unwrap();
        let text = String::from_utf8(text).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("classic\tqrcodes/classic_"));
    }

    #[test]
    fn test_nothing_generated_exits_with_failure() {
        let dir = TempDir::new().unwrap();
        let logo = dir.path().join("logo.png");
        fs::write(&logo, b"not an image").unwrap();
        let logo = logo.to_string_lossy().into_owned();
        let out = dir.path().to_string_lossy().into_owned();
        let args = generate_args(&["--logo", &logo, "--data", "a", "--style", "logo", "--out", &out]);

        let report = run_generate(&args).unwrap();
        assert_eq!(exit_code(&report), 1);

        let mut json = Vec::new();
        write_report(&mut json, &report, true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["success"], false);
        assert!(value["message"].is_string());
    }

    #[test]
    fn test_missing_logo_file_is_an_error() {
        let args = generate_args(&["--logo", "/nonexistent/logo.png", "--data", "a"]);
        let err = run_generate(&args).unwrap_err();
        assert!(format!("{err:#}").contains("read logo"));
    }

    #[test]
    fn test_run_palette() {
        let dir = TempDir::new().unwrap();
        let logo = write_logo(dir.path(), [0, 128, 0, 255]);
        let cli = Cli::try_parse_from(["qrtint", "palette", logo.as_str()]).unwrap();
        let Command::Palette(args) = cli.command else {
            panic!("expected palette");
        };
        assert_eq!(run_palette(&args).unwrap().to_hex(), vec!["#008000"]);

        let cli = Cli::try_parse_from(["qrtint", "palette", logo.as_str(), "--no-quantize"]).unwrap();
        let Command::Palette(args) = cli.command else {
            panic!("expected palette");
        };
        assert_eq!(run_palette(&args).unwrap(), ColorPalette::fallback());
    }
}
