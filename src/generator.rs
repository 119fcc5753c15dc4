//! Per-request orchestration: encode once, then render and write each
//! requested style in isolation.

use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};

use crate::compositor::{self, LogoAsset, StyleSpec};
use crate::config::GeneratorConfig;
use crate::error::{ConfigError, EncodingError, StyleError};
use crate::palette::{self, ColorPalette, PaletteExtractor, BLACK, WHITE};
use crate::qrcode::{self, QrMatrix};
use crate::writer::OutputWriter;

/// Builds the landing page URL a code points at: `{host}/qr/{id}`.
pub fn landing_page_url(public_host: &str, unique_id: &str) -> String {
    format!("{}/qr/{}", public_host.trim_end_matches('/'), unique_id)
}

/// One written file, ready to be stored next to the caller's record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    pub style: StyleSpec,
    pub path: String,
}

/// A style that produced nothing, and why.
#[derive(Debug)]
pub struct StyleFailure {
    pub style: StyleSpec,
    pub error: StyleError,
}

/// Outcome of one [`Generator::generate`] call.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub files: Vec<GeneratedFile>,
    pub failures: Vec<StyleFailure>,
}

/// JSON shape handed back to web callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    pub success: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub qr_paths: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GenerationReport {
    /// At least one style was written. An empty report means the request
    /// as a whole failed.
    pub fn is_success(&self) -> bool {
        !self.files.is_empty()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.files.iter().map(|file| file.path.as_str()).collect()
    }

    pub fn summary(&self) -> GenerationSummary {
        if self.is_success() {
            GenerationSummary {
                success: true,
                qr_paths: self.files.iter().map(|file| file.path.clone()).collect(),
                message: None,
            }
        } else {
            GenerationSummary {
                success: false,
                qr_paths: Vec::new(),
                message: Some(
                    "Could not generate any QR codes. Please check the server logs for detailed errors."
                        .to_string(),
                ),
            }
        }
    }
}

/// The styled QR engine.
pub struct Generator {
    config: GeneratorConfig,
    extractor: Box<dyn PaletteExtractor + Send + Sync>,
    writer: OutputWriter,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            extractor: config.extractor.build(),
            writer: OutputWriter::new(config.output_root.clone(), config.output_subdir.clone()),
            config,
        })
    }

    /// Encodes `data_url` and writes one image per distinct style.
    ///
    /// An encoding failure aborts the call. Anything that goes wrong for a
    /// single style is logged and recorded in the report while the other
    /// styles carry on. Undecodable logo bytes leave the logo absent: the
    /// palette falls back and the logo style fails with `MissingLogo`.
    pub fn generate(
        &self,
        data_url: &str,
        logo_bytes: Option<&[u8]>,
        styles: &[StyleSpec],
    ) -> Result<GenerationReport, EncodingError> {
        let span = info_span!("generate", url = data_url, styles = styles.len());
        let _enter = span.enter();

        let matrix = qrcode::encode(data_url, self.config.preferred_version, self.config.ecl)?;
        debug!(
            version = matrix.version().value(),
            ecl = ?matrix.error_correction_level(),
            mask = matrix.mask().value(),
            dark_modules = matrix.dark_count(),
            "encoded QR matrix"
        );

        let logo = logo_bytes.and_then(|bytes| match LogoAsset::decode(bytes) {
            Ok(logo) => Some(logo),
            Err(error) => {
                warn!(%error, "logo could not be decoded");
                None
            }
        });
        let palette = self.palette_for(logo.as_ref());
        debug!(palette = ?palette.to_hex(), "resolved palette");

        let mut report = GenerationReport::default();
        let mut seen: Vec<StyleSpec> = Vec::with_capacity(styles.len());
        for &style in styles {
            if seen.contains(&style) {
                continue;
            }
            seen.push(style);
            match self.generate_style(&matrix, &palette, style, logo.as_ref()) {
                Ok(path) => {
                    info!(%style, %path, "generated QR code");
                    report.files.push(GeneratedFile { style, path });
                }
                Err(err) => {
                    error!(%style, error = %err, "failed to generate QR code");
                    report.failures.push(StyleFailure { style, error: err });
                }
            }
        }

        if !report.is_success() {
            warn!("no styles were generated");
        }
        Ok(report)
    }

    /// Renders and writes a single style.
    pub fn generate_style(
        &self,
        matrix: &QrMatrix,
        palette: &ColorPalette,
        style: StyleSpec,
        logo: Option<&LogoAsset>,
    ) -> Result<String, StyleError> {
        let image = compositor::render(matrix, palette, &self.config.render, style, logo)?;
        Ok(self.writer.write(&image, style)?)
    }

    /// Palette from the logo (or the fallback without one), with any
    /// configured colour overrides applied.
    pub fn palette_for(&self, logo: Option<&LogoAsset>) -> ColorPalette {
        let extracted = match logo {
            Some(logo) => self.extractor.extract(logo.image(), self.config.palette_size),
            None => ColorPalette::fallback(),
        };
        let fill = palette::resolve_color(self.config.fill_color.as_deref(), BLACK);
        let back = palette::resolve_color(self.config.back_color.as_deref(), WHITE);
        extracted.with_overrides(fill, back)
    }
}
