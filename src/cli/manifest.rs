//! Batch manifest loading.
//!
//! A manifest is a JSON array of raw images:
//!
//! ```json
//! [{"id": "img-001", "height": 64, "width": 64, "channels": 3, "pixels": "<base64>"}]
//! ```
//!
//! `id` is optional; images without one are keyed by a digest of their pixels.

use std::fs;
use std::path::Path;

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use crate::candidate::CandidateImage;

/// One image in a batch manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub height: usize,
    pub width: usize,
    pub channels: usize,
    /// Row-major, channel-interleaved bytes, base64 encoded.
    pub pixels: String,
}

impl ManifestEntry {
    pub fn from_image(image: &CandidateImage) -> Self {
        let bytes: Vec<u8> = image.pixels().iter().copied().collect();
        Self {
            id: Some(image.id().to_string()),
            height: image.height(),
            width: image.width(),
            channels: image.channels(),
            pixels: BASE64.encode(bytes),
        }
    }

    pub fn into_image(self) -> anyhow::Result<CandidateImage> {
        let label = self.id.clone().unwrap_or_else(|| "<unnamed>".to_string());
        let data = BASE64
            .decode(self.pixels.as_bytes())
            .with_context(|| format!("Image {} has invalid base64 pixels", label))?;
        CandidateImage::from_raw(self.id, self.height, self.width, self.channels, data)
            .with_context(|| format!("Image {} is malformed", label))
    }
}

/// Parses manifest JSON into candidate images, in manifest order.
pub fn parse_manifest(content: &str) -> anyhow::Result<Vec<CandidateImage>> {
    let entries: Vec<ManifestEntry> =
        serde_json::from_str(content).context("Manifest is not a JSON array of images")?;
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            entry
                .into_image()
                .with_context(|| format!("Manifest entry {}", i))
        })
        .collect()
}

/// Reads and parses a manifest file.
pub fn load_manifest(path: impl AsRef<Path>) -> anyhow::Result<Vec<CandidateImage>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    parse_manifest(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_entry_round_trips_pixels() {
        let image = CandidateImage::with_id("a", Array3::from_shape_fn((2, 3, 3), |(y, x, c)| {
            (y * 9 + x * 3 + c) as u8
        }));
        let restored = ManifestEntry::from_image(&image)
            .into_image()
            .expect("valid entry");

        assert_eq!(restored.id(), image.id());
        assert_eq!(restored.pixels(), image.pixels());
    }

    #[test]
    fn test_missing_id_uses_content_digest() {
        let json = format!(
            r#"[{{"height": 1, "width": 2, "channels": 1, "pixels": "{}"}}]"#,
            BASE64.encode([10u8, 20])
        );
        let images = parse_manifest(&json).expect("valid manifest");
        assert_eq!(images.len(), 1);
        assert!(!images[0].id().as_str().is_empty());
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let json = format!(
            r#"[{{"id": "bad", "height": 4, "width": 4, "channels": 3, "pixels": "{}"}}]"#,
            BASE64.encode([0u8; 5])
        );
        let err = parse_manifest(&json).expect_err("shape mismatch");
        assert!(format!("{:#}", err).contains("bad"));
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        let json = r#"[{"id": "x", "height": 1, "width": 1, "channels": 1, "pixels": "!!"}]"#;
        assert!(parse_manifest(json).is_err());
    }

    #[test]
    fn test_load_manifest_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("batch.json");
        let entry = ManifestEntry::from_image(&CandidateImage::with_id(
            "f",
            Array3::from_elem((2, 2, 1), 7),
        ));
        fs::write(&path, serde_json::to_string(&vec![entry]).expect("json")).expect("write");

        let images = load_manifest(&path).expect("load");
        assert_eq!(images[0].id().as_str(), "f");
    }
}
