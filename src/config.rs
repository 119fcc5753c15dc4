//! Generator configuration.

use std::path::PathBuf;

use crate::compositor::RenderOptions;
use crate::error::ConfigError;
use crate::palette::ExtractorKind;
use crate::qrcode::{QrCodeEcc, Version};
use crate::writer::{DEFAULT_OUTPUT_ROOT, DEFAULT_QR_SUBDIR};

/// Settings for one [`Generator`](crate::generator::Generator).
///
/// Defaults reproduce the stock look: version 6 at level H, 10 px modules,
/// a 4-module border, a three-colour palette and a logo a quarter of the
/// canvas wide.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Smallest version to try; grown only when the data needs it.
    pub preferred_version: u8,
    pub ecl: QrCodeEcc,
    pub render: RenderOptions,
    /// Colours requested from the extractor.
    pub palette_size: usize,
    pub extractor: ExtractorKind,
    pub output_root: PathBuf,
    pub output_subdir: String,
    /// Fill colour override, `#rrggbb`. Falls back to black if malformed.
    pub fill_color: Option<String>,
    /// Back colour override, `#rrggbb`. Falls back to white if malformed.
    pub back_color: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            preferred_version: 6,
            ecl: QrCodeEcc::High,
            render: RenderOptions::default(),
            palette_size: 3,
            extractor: ExtractorKind::default(),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            output_subdir: DEFAULT_QR_SUBDIR.to_string(),
            fill_color: None,
            back_color: None,
        }
    }
}

impl GeneratorConfig {
    #[must_use]
    pub fn with_version(mut self, version: u8) -> Self {
        self.preferred_version = version;
        self
    }

    #[must_use]
    pub fn with_ecl(mut self, ecl: QrCodeEcc) -> Self {
        self.ecl = ecl;
        self
    }

    #[must_use]
    pub fn with_border(mut self, border: u32) -> Self {
        self.render.border = border;
        self
    }

    #[must_use]
    pub fn with_module_size(mut self, module_size: u32) -> Self {
        self.render.module_size = module_size;
        self
    }

    #[must_use]
    pub fn with_logo_size_factor(mut self, factor: f32) -> Self {
        self.render.logo_size_factor = factor;
        self
    }

    #[must_use]
    pub fn with_palette_size(mut self, k: usize) -> Self {
        self.palette_size = k;
        self
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: ExtractorKind) -> Self {
        self.extractor = extractor;
        self
    }

    /// Output goes to `root/subdir`; returned paths start with `subdir`.
    #[must_use]
    pub fn with_output(mut self, root: impl Into<PathBuf>, subdir: impl Into<String>) -> Self {
        self.output_root = root.into();
        self.output_subdir = subdir.into();
        self
    }

    #[must_use]
    pub fn with_colors(mut self, fill: Option<String>, back: Option<String>) -> Self {
        self.fill_color = fill;
        self.back_color = back;
        self
    }

    /// Rejects settings that could never render.
    ///
    /// Colour overrides are not checked here: a malformed one falls back at
    /// render time instead of failing the request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Version::try_from(self.preferred_version)?;
        if self.render.module_size == 0 {
            return Err(ConfigError::ModuleSize);
        }
        self.render.canvas_size(Version::MAX.size() as i32)?;
        let factor = self.render.logo_size_factor;
        if factor.is_nan() || factor <= 0.0 || factor > 1.0 {
            return Err(ConfigError::LogoFactor(factor));
        }
        if self.palette_size == 0 {
            return Err(ConfigError::PaletteSize);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::MAX_CANVAS_SIDE;
    use crate::error::{CompositionError, EncodingError};

    #[test]
    fn test_defaults_are_valid() {
        let config = GeneratorConfig::default();
        assert_eq!(config.preferred_version, 6);
        assert_eq!(config.ecl, QrCodeEcc::High);
        assert_eq!(config.render.border, 4);
        assert_eq!(config.render.module_size, 10);
        assert_eq!(config.palette_size, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = GeneratorConfig::default()
            .with_version(2)
            .with_ecl(QrCodeEcc::Low)
            .with_border(1)
            .with_module_size(3)
            .with_output("/tmp/out", "codes")
            .with_colors(Some("#ff0000".into()), None);
        assert_eq!(config.preferred_version, 2);
        assert_eq!(config.render.module_size, 3);
        assert_eq!(config.output_subdir, "codes");
        assert_eq!(config.fill_color.as_deref(), Some("#ff0000"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert_eq!(
            GeneratorConfig::default().with_version(0).validate(),
            Err(ConfigError::Version(EncodingError::InvalidVersion(0)))
        );
        assert_eq!(
            GeneratorConfig::default().with_module_size(0).validate(),
            Err(ConfigError::ModuleSize)
        );
        assert_eq!(
            GeneratorConfig::default().with_logo_size_factor(1.5).validate(),
            Err(ConfigError::LogoFactor(1.5))
        );
        assert!(GeneratorConfig::default().with_logo_size_factor(f32::NAN).validate().is_err());
        assert_eq!(
            GeneratorConfig::default().with_border(u32::MAX / 2 + 1).validate(),
            Err(ConfigError::Canvas(CompositionError::CanvasTooLarge { max: MAX_CANVAS_SIDE }))
        );
        assert!(GeneratorConfig::default().with_module_size(1_000).validate().is_err());
        // Largest module size that still fits a version 40 symbol with the default border
        assert!(GeneratorConfig::default().with_module_size(88).validate().is_ok());
        assert_eq!(
            GeneratorConfig::default().with_palette_size(0).validate(),
            Err(ConfigError::PaletteSize)
        );
    }

    #[test]
    fn test_malformed_colours_pass_validation() {
        let config = GeneratorConfig::default().with_colors(Some("#nothex".into()), None);
        assert!(config.validate().is_ok());
    }
}
