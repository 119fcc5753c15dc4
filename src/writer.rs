//! Persisting rendered images under collision-resistant names.

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use image::ImageFormat;
use tracing::debug;
use uuid::Uuid;

use crate::compositor::{RasterImage, StyleSpec};
use crate::error::OutputError;

pub const DEFAULT_OUTPUT_ROOT: &str = "static";
pub const DEFAULT_QR_SUBDIR: &str = "qrcodes";

/// Writes PNG files to `root/subdir` and hands back `subdir/<file>` paths.
///
/// Names combine the style, the current Unix second and eight random hex
/// digits, so concurrent writers never need to coordinate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputWriter {
    root: PathBuf,
    subdir: String,
}

impl Default for OutputWriter {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_ROOT, DEFAULT_QR_SUBDIR)
    }
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>, subdir: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            subdir: subdir.into().trim_matches('/').to_string(),
        }
    }

    /// Directory the files land in.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.subdir)
    }

    /// Saves `image` as PNG and returns its path relative to the root,
    /// always with `/` separators.
    pub fn write(&self, image: &RasterImage, style: StyleSpec) -> Result<String, OutputError> {
        let dir = self.output_dir();
        fs::create_dir_all(&dir).map_err(|source| OutputError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let filename = unique_filename(style.as_str(), SystemTime::now());
        let full_path = dir.join(&filename);
        image
            .save_with_format(&full_path, ImageFormat::Png)
            .map_err(|source| OutputError::WriteFailed {
                path: full_path.clone(),
                source,
            })?;
        debug!(path = %full_path.display(), %style, "wrote QR image");

        Ok(if self.subdir.is_empty() {
            filename
        } else {
            format!("{}/{}", self.subdir, filename)
        })
    }
}

/// `{style}_{unix_seconds}_{8 hex}.png`.
pub fn unique_filename(style: &str, now: SystemTime) -> String {
    let secs = now
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);
    let id = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}.png", style, secs, &id[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_unique_filename_pattern() {
        let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let name = unique_filename("gradient", now);
        let stem = name.strip_suffix(".png").unwrap();
        let parts: Vec<&str> = stem.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "gradient");
        assert_eq!(parts[1], "1700000000");
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_same_second_names_differ() {
        let now = SystemTime::now();
        assert_ne!(unique_filename("logo", now), unique_filename("logo", now));
    }

    #[test]
    fn test_write_creates_directory_and_png() {
        let dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(dir.path(), "qrcodes/");
        let image = RasterImage::from_pixel(12, 12, Rgba([1, 2, 3, 255]));

        let relative = writer.write(&image, StyleSpec::Classic).unwrap();
        assert!(relative.starts_with("qrcodes/classic_"));
        assert!(relative.ends_with(".png"));

        let stored = image::open(dir.path().join(&relative)).unwrap().to_rgba8();
        assert_eq!(stored, image);
    }

    #[test]
    fn test_write_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        // A regular file where the output directory should be
        let blocker = dir.path().join("qrcodes");
        fs::write(&blocker, b"").unwrap();
        let writer = OutputWriter::new(dir.path(), "qrcodes");
        let image = RasterImage::new(2, 2);

        let err = writer.write(&image, StyleSpec::Logo).unwrap_err();
        assert!(matches!(err, OutputError::CreateDir { .. }));
    }
}
